//! `notAllowed` propagation
//!
//! Children are rewritten before their parent, so a `notAllowed` produced
//! deep in a pattern bubbles up as far as the rules allow in one walk. Once
//! done, defines that became unreachable are pruned.

use super::document_element;
use super::refs::prune_from_start;
use crate::error::Result;
use crate::tree::{Kind, NodeId, Tree};

/// How a construct reacts to `notAllowed` children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    /// Keep whichever operand is allowed
    Choice,
    /// Any `notAllowed` operand makes the whole pattern `notAllowed`
    AllOrNothing,
    /// An `except` of `notAllowed` excludes nothing
    Except,
}

impl Rule {
    fn of(kind: Kind) -> Option<Rule> {
        match kind {
            Kind::Choice => Some(Rule::Choice),
            Kind::Attribute | Kind::List | Kind::Group | Kind::Interleave | Kind::OneOrMore => {
                Some(Rule::AllOrNothing)
            }
            Kind::Except => Some(Rule::Except),
            _ => None,
        }
    }
}

/// Run the pass over the whole tree
pub fn run(tree: &mut Tree) -> Result<()> {
    let root = document_element(tree)?;
    visit(tree, root)?;
    prune_from_start(tree);
    Ok(())
}

fn visit(tree: &mut Tree, id: NodeId) -> Result<()> {
    if tree.kind(id).is_opaque() {
        return Ok(());
    }
    for child in tree.element_children(id) {
        visit(tree, child)?;
    }

    let children = tree.element_children(id);
    if children.is_empty() {
        return Ok(());
    }
    let Some(rule) = Rule::of(tree.kind(id)) else {
        return Ok(());
    };
    let disallowed: Vec<bool> = children
        .iter()
        .map(|&c| tree.kind(c) == Kind::NotAllowed)
        .collect();

    match rule {
        Rule::Choice => {
            let [left, right] = children[..] else {
                return Err(tree.malformed(
                    id,
                    format!("choice must have exactly 2 children, found {}", children.len()),
                ));
            };
            match (disallowed[0], disallowed[1]) {
                (true, true) => {
                    let replacement = tree.create(Kind::NotAllowed);
                    tree.replace_with(id, replacement);
                }
                (true, false) => tree.replace_with(id, right),
                (false, true) => tree.replace_with(id, left),
                (false, false) => {}
            }
        }
        Rule::AllOrNothing => {
            if disallowed.contains(&true) {
                let replacement = tree.create(Kind::NotAllowed);
                tree.replace_with(id, replacement);
            }
        }
        Rule::Except => {
            if disallowed.contains(&true) {
                tree.remove(id);
            }
        }
    }
    Ok(())
}
