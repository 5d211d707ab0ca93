//! `combine` merging
//!
//! Within one grammar, all `start` components and all `define` components
//! sharing a name are merged into the first of them. At most one of a set may
//! omit `combine`, and the others must agree on `choice` or `interleave`.

use super::document_element;
use crate::error::Result;
use crate::tree::{Kind, NodeId, Tree};
use indexmap::IndexMap;

/// Run the pass over every grammar
pub fn run(tree: &mut Tree) -> Result<()> {
    let root = document_element(tree)?;
    let grammars: Vec<NodeId> = tree
        .descendants(root)
        .into_iter()
        .filter(|&id| tree.kind(id) == Kind::Grammar)
        .collect();
    for grammar in grammars {
        combine_grammar(tree, grammar)?;
    }
    Ok(())
}

fn combine_grammar(tree: &mut Tree, grammar: NodeId) -> Result<()> {
    let mut starts = Vec::new();
    let mut defines: IndexMap<String, Vec<NodeId>> = IndexMap::new();
    for child in tree.element_children(grammar) {
        match tree.kind(child) {
            Kind::Start => starts.push(child),
            Kind::Define => {
                let name = tree.required_attribute(child, "name")?.to_string();
                defines.entry(name).or_default().push(child);
            }
            _ => {}
        }
    }

    if !starts.is_empty() {
        merge(tree, &starts)?;
    }
    for components in defines.values() {
        merge(tree, components)?;
    }
    Ok(())
}

/// Merge the content of `components` into the first one
fn merge(tree: &mut Tree, components: &[NodeId]) -> Result<()> {
    let method = combine_method(tree, components)?;
    let first = components[0];
    tree.remove_attribute(first, "combine");
    let Some(kind) = method else {
        return Ok(());
    };

    let mut merged = content(tree, first)?;
    for &other in &components[1..] {
        let next = content(tree, other)?;
        let pair = tree.create(kind);
        tree.append(pair, merged);
        tree.append(pair, next);
        merged = pair;
        tree.remove(other);
    }
    tree.append(first, merged);
    Ok(())
}

/// The combining pattern kind, `None` for a lone component
fn combine_method(tree: &Tree, components: &[NodeId]) -> Result<Option<Kind>> {
    let mut method: Option<&str> = None;
    let mut bare = Vec::new();
    for &component in components {
        match tree.attribute(component, "combine") {
            None => bare.push(component),
            Some(value @ ("choice" | "interleave")) => match method {
                Some(existing) if existing != value => {
                    return Err(tree.malformed(
                        component,
                        format!("conflicting combine methods '{}' and '{}'", existing, value),
                    ));
                }
                _ => method = Some(value),
            },
            Some(other) => {
                return Err(tree.malformed(
                    component,
                    format!("invalid combine method '{}'", other),
                ));
            }
        }
    }

    if bare.len() > 1 {
        return Err(tree.malformed(
            bare[1],
            "more than one definition without a combine attribute",
        ));
    }
    if components.len() == 1 {
        return Ok(None);
    }
    Ok(Some(match method {
        Some("interleave") => Kind::Interleave,
        _ => Kind::Choice,
    }))
}

fn content(tree: &Tree, component: NodeId) -> Result<NodeId> {
    tree.first_element_child(component)
        .ok_or_else(|| tree.malformed(component, "missing pattern content"))
}
