//! `datatypeLibrary` and `type` attributes
//!
//! `data` and `value` elements receive the `datatypeLibrary` of their nearest
//! ancestor (the empty string if there is none). The attribute is then
//! removed everywhere else. A `value` without `type` becomes a `token` from
//! the built-in library.

use super::document_element;
use crate::error::Result;
use crate::tree::{Kind, NodeId, Tree};
use url::Url;

const ATTRIBUTE: &str = "datatypeLibrary";

/// Run the pass over the whole tree
pub fn run(tree: &mut Tree) -> Result<()> {
    let root = document_element(tree)?;
    let nodes = tree.descendants(root);

    for &id in &nodes {
        if let Some(library) = tree.attribute(id, ATTRIBUTE) {
            check_library(tree, id, library)?;
        }
    }

    // Resolve while every ancestor still carries its attribute
    let mut resolved = Vec::new();
    for &id in &nodes {
        if matches!(tree.kind(id), Kind::Data | Kind::Value) {
            resolved.push((id, inherited_library(tree, id)));
        }
    }

    for &id in &nodes {
        tree.remove_attribute(id, ATTRIBUTE);
    }

    for (id, library) in resolved {
        if tree.kind(id) == Kind::Value && tree.attribute(id, "type").is_none() {
            tree.set_attribute(id, "type", "token");
            tree.set_attribute(id, ATTRIBUTE, "");
        } else {
            tree.set_attribute(id, ATTRIBUTE, library);
        }
    }
    Ok(())
}

fn inherited_library(tree: &Tree, id: NodeId) -> String {
    std::iter::once(id)
        .chain(tree.ancestors(id))
        .find_map(|node| tree.attribute(node, ATTRIBUTE))
        .unwrap_or("")
        .to_string()
}

/// The library must be empty or an absolute URI without a fragment
fn check_library(tree: &Tree, id: NodeId, library: &str) -> Result<()> {
    if library.is_empty() {
        return Ok(());
    }
    match Url::parse(library) {
        Ok(url) if url.fragment().is_none() => Ok(()),
        _ => Err(tree.malformed(
            id,
            format!("datatypeLibrary '{}' is not an absolute URI", library),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{compact, rng, run_to};
    use super::super::Step;

    const XSD: &str = "http://www.w3.org/2001/XMLSchema-datatypes";

    #[test]
    fn test_library_is_inherited() {
        let xml = rng(&format!(
            r#"<element name="a" datatypeLibrary="{XSD}"><group><data type="int"/><data type="x" datatypeLibrary=""/></group></element>"#
        ));
        let tree = run_to(&xml, Step::DatatypeLibrary).unwrap();
        assert_eq!(
            compact(&tree),
            format!(
                r#"<element name="a"><group><data type="int" datatypeLibrary="{XSD}"/><data type="x" datatypeLibrary=""/></group></element>"#
            )
        );
    }

    #[test]
    fn test_value_defaults_to_token() {
        let xml = rng(&format!(
            r#"<element name="a" datatypeLibrary="{XSD}"><value>x</value></element>"#
        ));
        let tree = run_to(&xml, Step::DatatypeLibrary).unwrap();
        assert_eq!(
            compact(&tree),
            r#"<element name="a"><value type="token" datatypeLibrary="">x</value></element>"#
        );
    }

    #[test]
    fn test_relative_library_is_rejected() {
        let xml = rng(r#"<element name="a"><data type="int" datatypeLibrary="types"/></element>"#);
        assert!(run_to(&xml, Step::DatatypeLibrary).is_err());
    }
}
