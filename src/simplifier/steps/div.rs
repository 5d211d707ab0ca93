//! `div` flattening

use super::document_element;
use crate::error::Result;
use crate::tree::{Kind, Tree};

/// Replace every `div` by its children
pub fn run(tree: &mut Tree) -> Result<()> {
    let root = document_element(tree)?;
    if tree.kind(root) == Kind::Div {
        return Err(tree.malformed(root, "div cannot be the document element"));
    }
    // Innermost first, so each unwrap splices already flattened content
    for id in tree.descendants(root).into_iter().rev() {
        if tree.kind(id) == Kind::Div {
            tree.unwrap_node(id);
        }
    }
    Ok(())
}
