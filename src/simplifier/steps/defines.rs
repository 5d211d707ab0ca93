//! `define` and `ref` normalization
//!
//! Afterwards every `define` holds exactly one `element`, every `element`
//! sits directly in a `define`, and every `ref` points at such a define.

use super::refs::{prune_from_start, top_defines, top_start};
use super::document_element;
use crate::error::Result;
use crate::limits::Limits;
use crate::tree::{Kind, NodeId, Tree};
use indexmap::{IndexMap, IndexSet};

/// Run the pass over the whole tree; fails once expansion grows the tree
/// past [`Limits::max_grammar_nodes`]
pub fn run(tree: &mut Tree, limits: &Limits) -> Result<()> {
    let grammar = document_element(tree)?;
    prune_from_start(tree);
    extract_elements(tree, grammar);

    let defines = top_defines(tree);
    let mut inline: IndexMap<String, NodeId> = IndexMap::new();
    for (name, &define) in &defines {
        let content = tree
            .first_element_child(define)
            .ok_or_else(|| tree.malformed(define, "missing pattern content"))?;
        if tree.kind(content) != Kind::Element {
            inline.insert(name.clone(), content);
        }
    }

    let mut roots: Vec<NodeId> = top_start(tree).into_iter().collect();
    roots.extend(
        defines
            .iter()
            .filter(|(name, _)| !inline.contains_key(*name))
            .filter_map(|(_, &define)| tree.first_element_child(define)),
    );
    for root in roots {
        let mut stack = Vec::new();
        expand(tree, root, &inline, &mut stack, limits)?;
    }

    for name in inline.keys() {
        if let Some(&define) = defines.get(name) {
            tree.remove(define);
        }
    }
    prune_from_start(tree);
    Ok(())
}

/// Move every `element` that is not the content of a `define` into a new
/// `define` and reference it
fn extract_elements(tree: &mut Tree, grammar: NodeId) {
    let mut taken: IndexSet<String> = top_defines(tree).into_keys().collect();
    for id in tree.descendants(grammar) {
        if tree.kind(id) != Kind::Element {
            continue;
        }
        if tree.parent(id).map(|p| tree.kind(p)) == Some(Kind::Define) {
            continue;
        }

        let name = fresh_name(tree, id, &taken);
        taken.insert(name.clone());
        let reference = tree.create_named(Kind::Ref, &name);
        tree.replace_with(id, reference);
        let define = tree.create_named(Kind::Define, &name);
        tree.append(define, id);
        tree.append(grammar, define);
    }
}

/// Unused define name derived from the element's name
fn fresh_name(tree: &Tree, element: NodeId, taken: &IndexSet<String>) -> String {
    let base = match tree.first_element_child(element) {
        Some(class) if tree.kind(class) == Kind::Name => format!("{}-element", tree.text(class)),
        _ => "element".to_string(),
    };
    if !taken.contains(&base) {
        return base;
    }
    (1..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or(base)
}

/// Replace refs below `id` to non-element defines with a copy of their content
fn expand(
    tree: &mut Tree,
    id: NodeId,
    inline: &IndexMap<String, NodeId>,
    stack: &mut Vec<String>,
    limits: &Limits,
) -> Result<()> {
    if tree.kind(id) == Kind::Ref {
        let Some(name) = tree.attribute(id, "name").map(str::to_string) else {
            return Ok(());
        };
        let Some(&content) = inline.get(&name) else {
            return Ok(());
        };
        if stack.contains(&name) {
            return Err(tree.malformed(
                id,
                format!("recursive reference to '{}' without an intervening element", name),
            ));
        }
        let copy = tree.deep_copy(content);
        limits.check_grammar_nodes(tree.node_count())?;
        tree.replace_with(id, copy);
        stack.push(name);
        let result = expand(tree, copy, inline, stack, limits);
        stack.pop();
        return result;
    }
    if tree.kind(id).is_opaque() {
        return Ok(());
    }
    for child in tree.element_children(id) {
        expand(tree, child, inline, stack, limits)?;
    }
    Ok(())
}
