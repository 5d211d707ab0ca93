//! Shorthand patterns
//!
//! - `mixed p` becomes `interleave(p, text)`
//! - `optional p` becomes `choice(p, empty)`
//! - `zeroOrMore p` becomes `choice(oneOrMore p, empty)`

use super::document_element;
use crate::error::Result;
use crate::tree::{Kind, Tree};

/// Run the pass over the whole tree
pub fn run(tree: &mut Tree) -> Result<()> {
    let root = document_element(tree)?;
    for id in tree.descendants(root) {
        match tree.kind(id) {
            Kind::Mixed => {
                tree.set_kind(id, Kind::Interleave);
                let text = tree.create(Kind::Text);
                tree.append(id, text);
            }
            Kind::Optional => {
                tree.set_kind(id, Kind::Choice);
                let empty = tree.create(Kind::Empty);
                tree.append(id, empty);
            }
            Kind::ZeroOrMore => {
                tree.set_kind(id, Kind::Choice);
                let repeat = tree.create(Kind::OneOrMore);
                tree.move_children(id, repeat);
                tree.append(id, repeat);
                let empty = tree.create(Kind::Empty);
                tree.append(id, empty);
            }
            _ => {}
        }
    }
    Ok(())
}
