//! Child count normalization
//!
//! After this pass `choice`, `group` and `interleave` have exactly two
//! children, every other pattern container has exactly one pattern child and
//! `attribute` always has content.

use super::document_element;
use crate::error::Result;
use crate::tree::{Kind, NodeId, Tree};

/// Run the pass over the whole tree
pub fn run(tree: &mut Tree) -> Result<()> {
    let root = document_element(tree)?;
    // Reverse preorder visits children before their parent
    for id in tree.descendants(root).into_iter().rev() {
        match tree.kind(id) {
            Kind::Define
            | Kind::OneOrMore
            | Kind::ZeroOrMore
            | Kind::Optional
            | Kind::List
            | Kind::Mixed => wrap_content(tree, id, 0, Kind::Group)?,
            Kind::Element => wrap_content(tree, id, 1, Kind::Group)?,
            Kind::Except => wrap_content(tree, id, 0, Kind::Choice)?,
            Kind::Attribute => {
                if tree.element_count(id) == 1 {
                    let text = tree.create(Kind::Text);
                    tree.append(id, text);
                }
            }
            Kind::Choice | Kind::Group | Kind::Interleave => binarize(tree, id)?,
            _ => {}
        }
    }
    Ok(())
}

/// Wrap the element children of `id` after the first `skip` in a single `kind`
fn wrap_content(tree: &mut Tree, id: NodeId, skip: usize, kind: Kind) -> Result<()> {
    let children = tree.element_children(id);
    let content = children.len().saturating_sub(skip);
    if content == 0 {
        return Err(tree.malformed(id, "missing pattern content"));
    }
    if content == 1 {
        return Ok(());
    }

    let wrapper = tree.create(kind);
    for &child in &children[skip..] {
        tree.append(wrapper, child);
    }
    tree.append(id, wrapper);
    binarize(tree, wrapper)
}

/// Unwrap a single child or fold more than two children to the left
fn binarize(tree: &mut Tree, id: NodeId) -> Result<()> {
    let children = tree.element_children(id);
    match children.len() {
        0 => Err(tree.malformed(id, "missing pattern content")),
        1 => {
            tree.replace_with(id, children[0]);
            Ok(())
        }
        2 => Ok(()),
        n => {
            let kind = tree.kind(id);
            let mut folded = children[0];
            for &next in &children[1..n - 1] {
                let pair = tree.create(kind);
                tree.append(pair, folded);
                tree.append(pair, next);
                folded = pair;
            }
            tree.insert(id, 0, folded);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{compact, rng, run_to};
    use super::super::Step;

    #[test]
    fn test_choice_is_folded_left() {
        let xml = rng(r#"<element name="a"><choice><text/><empty/><notAllowed/></choice></element>"#);
        let tree = run_to(&xml, Step::Arity).unwrap();
        assert_eq!(
            compact(&tree),
            r#"<element><name ns="">a</name><choice><choice><text/><empty/></choice><notAllowed/></choice></element>"#
        );
    }

    #[test]
    fn test_single_child_group_is_unwrapped() {
        let xml = rng(r#"<element name="a"><group><text/></group></element>"#);
        let tree = run_to(&xml, Step::Arity).unwrap();
        assert_eq!(compact(&tree), r#"<element><name ns="">a</name><text/></element>"#);
    }

    #[test]
    fn test_element_content_is_grouped() {
        let xml = rng(r#"<element name="a"><empty/><text/><attribute name="b"/></element>"#);
        let tree = run_to(&xml, Step::Arity).unwrap();
        assert_eq!(
            compact(&tree),
            r#"<element><name ns="">a</name><group><group><empty/><text/></group><attribute><name ns="">b</name><text/></attribute></group></element>"#
        );
    }

    #[test]
    fn test_except_becomes_choice() {
        let xml = rng(r#"<element><anyName><except><name>a</name><name>b</name></except></anyName><empty/></element>"#);
        let tree = run_to(&xml, Step::Arity).unwrap();
        assert_eq!(
            compact(&tree),
            r#"<element><anyName><except><choice><name ns="">a</name><name ns="">b</name></choice></except></anyName><empty/></element>"#
        );
    }

    #[test]
    fn test_empty_group_is_rejected() {
        let xml = rng(r#"<element name="a"><group/></element>"#);
        assert!(run_to(&xml, Step::Arity).is_err());
    }
}
