//! `empty` normalization

use super::document_element;
use crate::error::Result;
use crate::tree::{Kind, NodeId, Tree};

/// Run the pass over the whole tree
pub fn run(tree: &mut Tree) -> Result<()> {
    let root = document_element(tree)?;
    visit(tree, root);
    Ok(())
}

fn visit(tree: &mut Tree, id: NodeId) {
    if tree.kind(id).is_opaque() {
        return;
    }
    for child in tree.element_children(id) {
        visit(tree, child);
    }

    let children = tree.element_children(id);
    let empties: Vec<bool> = children.iter().map(|&c| tree.kind(c) == Kind::Empty).collect();
    match (tree.kind(id), children.as_slice(), empties.as_slice()) {
        (Kind::Choice, &[left, _], &[true, true]) => tree.replace_with(id, left),
        (Kind::Choice, &[_, right], &[false, true]) => tree.insert(id, 0, right),
        (Kind::Group | Kind::Interleave, &[_, right], &[true, _]) => tree.replace_with(id, right),
        (Kind::Group | Kind::Interleave, &[left, _], &[false, true]) => tree.replace_with(id, left),
        (Kind::OneOrMore, &[only], &[true]) => tree.replace_with(id, only),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{compact, rng, run_to};
    use super::super::Step;

    fn body(tree_xml: &str) -> String {
        tree_xml
            .trim_start_matches("<grammar><start>")
            .trim_end_matches("</start></grammar>")
            .to_string()
    }

    #[test]
    fn test_choice_puts_empty_first() {
        let xml = rng(r#"<element name="a"><optional><text/></optional></element>"#);
        let tree = run_to(&xml, Step::Empty).unwrap();
        assert!(compact(&tree).contains("<choice><empty/><text/></choice>"));
    }

    #[test]
    fn test_collapses() {
        let xml = rng(r#"<choice><empty/><group><empty/><oneOrMore><empty/></oneOrMore></group></choice>"#);
        let tree = run_to(&xml, Step::Empty).unwrap();
        assert_eq!(body(&compact(&tree)), "<empty/>");
    }

    #[test]
    fn test_interleave_with_empty() {
        let xml = rng(r#"<interleave><text/><empty/></interleave>"#);
        let tree = run_to(&xml, Step::Empty).unwrap();
        assert_eq!(body(&compact(&tree)), "<text/>");
    }
}
