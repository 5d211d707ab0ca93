//! Name class constraints

use super::document_element;
use crate::error::Result;
use crate::namespaces::XMLNS_NAMESPACE;
use crate::tree::{Kind, NodeId, Tree};

/// Check `except` content of `anyName`/`nsName` and attribute names
pub fn run(tree: &mut Tree) -> Result<()> {
    let root = document_element(tree)?;
    for id in tree.descendants(root) {
        match tree.kind(id) {
            Kind::Except => check_except(tree, id)?,
            Kind::Attribute => check_attribute_name(tree, id)?,
            _ => {}
        }
    }
    Ok(())
}

fn check_except(tree: &Tree, except: NodeId) -> Result<()> {
    let forbidden: &[Kind] = match tree.parent(except).map(|p| tree.kind(p)) {
        Some(Kind::AnyName) => &[Kind::AnyName],
        Some(Kind::NsName) => &[Kind::AnyName, Kind::NsName],
        _ => return Ok(()),
    };
    for id in tree.descendants(except) {
        let kind = tree.kind(id);
        if forbidden.contains(&kind) {
            return Err(tree.malformed(
                id,
                format!("{} is not allowed in this except", kind),
            ));
        }
    }
    Ok(())
}

fn check_attribute_name(tree: &Tree, attribute: NodeId) -> Result<()> {
    let Some(name_class) = tree.first_element_child(attribute) else {
        return Ok(());
    };
    for id in tree.descendants(name_class) {
        let kind = tree.kind(id);
        if !matches!(kind, Kind::Name | Kind::NsName) {
            continue;
        }
        let ns = tree.attribute(id, "ns").unwrap_or("");
        if is_xmlns_namespace(ns) {
            return Err(tree.malformed(id, "attribute names cannot be in the xmlns namespace"));
        }
        if kind == Kind::Name && ns.is_empty() && tree.text(id) == "xmlns" {
            return Err(tree.malformed(id, "attribute cannot be named xmlns"));
        }
    }
    Ok(())
}

fn is_xmlns_namespace(ns: &str) -> bool {
    ns.trim_end_matches('/') == XMLNS_NAMESPACE.trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{rng, run_to};
    use super::super::Step;
    use crate::error::Error;

    #[test]
    fn test_any_name_in_any_name_except() {
        let xml = rng(r#"<element><anyName><except><anyName/></except></anyName><empty/></element>"#);
        let err = run_to(&xml, Step::Constraints).unwrap_err();
        assert!(matches!(err, Error::MalformedGrammar(_)));
    }

    #[test]
    fn test_ns_name_in_ns_name_except() {
        let xml = rng(r#"<element><nsName ns="urn:a"><except><nsName/></except></nsName><empty/></element>"#);
        assert!(run_to(&xml, Step::Constraints).is_err());
    }

    #[test]
    fn test_ns_name_in_any_name_except_is_allowed() {
        let xml = rng(r#"<element><anyName><except><nsName ns="urn:a"/></except></anyName><empty/></element>"#);
        assert!(run_to(&xml, Step::Constraints).is_ok());
    }

    #[test]
    fn test_xmlns_attribute() {
        let xml = rng(r#"<element name="a"><attribute name="xmlns"/></element>"#);
        let err = run_to(&xml, Step::Constraints).unwrap_err();
        assert!(err.to_string().contains("xmlns"));

        let xml = rng(r#"<element name="a"><attribute name="x" ns="http://www.w3.org/2000/xmlns"/></element>"#);
        assert!(run_to(&xml, Step::Constraints).is_err());
    }
}
