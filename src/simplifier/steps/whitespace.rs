//! Name trimming
//!
//! Whitespace-only text was already dropped by the parser. This pass trims
//! `name`, `type` and `combine` attribute values and the content of `name`
//! elements, then checks the syntax of the trimmed names.

use super::document_element;
use crate::error::Result;
use crate::names::{validate_ncname, validate_qname};
use crate::tree::{Kind, Tree};

const TRIMMED_ATTRIBUTES: [&str; 3] = ["name", "type", "combine"];

/// Run the pass over the whole tree
pub fn run(tree: &mut Tree) -> Result<()> {
    let root = document_element(tree)?;
    for id in tree.descendants(root) {
        for attribute in TRIMMED_ATTRIBUTES {
            if let Some(value) = tree.attribute(id, attribute) {
                let trimmed = trim(value);
                if trimmed.len() != value.len() {
                    let trimmed = trimmed.to_string();
                    tree.set_attribute(id, attribute, trimmed);
                }
            }
        }

        match tree.kind(id) {
            Kind::Name => {
                let text = trim(&tree.text(id)).to_string();
                validate_qname(&text)?;
                tree.set_text(id, text);
            }
            Kind::Define | Kind::Ref | Kind::ParentRef => {
                validate_ncname(tree.required_attribute(id, "name")?)?;
            }
            Kind::Element | Kind::Attribute => {
                if let Some(name) = tree.attribute(id, "name") {
                    validate_qname(name)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn trim(value: &str) -> &str {
    value.trim_matches(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{compact, rng, run_to};
    use super::super::Step;
    use crate::error::Error;

    #[test]
    fn test_trims_names() {
        let xml = rng(r#"<element name=" doc "><attribute combine="&#10;choice "><name> x </name><text/></attribute></element>"#);
        let tree = run_to(&xml, Step::Whitespace).unwrap();
        assert_eq!(
            compact(&tree),
            r#"<element name="doc"><attribute combine="choice"><name>x</name><text/></attribute></element>"#
        );
    }

    #[test]
    fn test_rejects_bad_define_name() {
        let xml = rng(r#"<grammar><define name="1bad"><empty/></define></grammar>"#);
        let err = run_to(&xml, Step::Whitespace).unwrap_err();
        assert!(matches!(err, Error::Name(_)));
    }

    #[test]
    fn test_ref_requires_name() {
        let xml = rng(r#"<grammar><start><ref/></start></grammar>"#);
        let err = run_to(&xml, Step::Whitespace).unwrap_err();
        assert!(matches!(err, Error::MalformedGrammar(_)));
    }
}
