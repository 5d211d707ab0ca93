//! Grammar flattening
//!
//! Leaves a single top-level `grammar` whose first child is its only `start`,
//! followed by every `define` of the schema under a unique name. `parentRef`
//! becomes `ref` and nested grammars are replaced by their `start` content.

use super::document_element;
use crate::error::Result;
use crate::tree::{Kind, NodeId, Tree};
use indexmap::{IndexMap, IndexSet};

/// Run the pass over the whole tree
pub fn run(tree: &mut Tree) -> Result<()> {
    let top = wrap_root(tree)?;

    let grammars: Vec<NodeId> = tree
        .descendants(top)
        .into_iter()
        .filter(|&id| tree.kind(id) == Kind::Grammar)
        .collect();
    let renames = unique_names(tree, &grammars)?;
    resolve_references(tree, top, &renames)?;
    rename_defines(tree, &renames);

    for &grammar in grammars.iter().rev() {
        if grammar != top {
            inline_grammar(tree, top, grammar)?;
        }
    }

    let starts: Vec<NodeId> = tree
        .element_children(top)
        .into_iter()
        .filter(|&c| tree.kind(c) == Kind::Start)
        .collect();
    match starts.as_slice() {
        [start] => {
            tree.insert(top, 0, *start);
            Ok(())
        }
        [] => Err(tree.malformed(top, "grammar has no start")),
        [_, extra, ..] => Err(tree.malformed(*extra, "grammar has more than one start")),
    }
}

/// Make sure the document element is a `grammar`, wrapping it in
/// `grammar/start` otherwise
fn wrap_root(tree: &mut Tree) -> Result<NodeId> {
    let root = document_element(tree)?;
    if tree.kind(root) == Kind::Grammar {
        return Ok(root);
    }
    let grammar = tree.create(Kind::Grammar);
    tree.replace_with(root, grammar);
    let start = tree.create(Kind::Start);
    tree.append(grammar, start);
    tree.append(start, root);
    Ok(grammar)
}

/// For each grammar, the new name of each of its defines
fn unique_names(
    tree: &Tree,
    grammars: &[NodeId],
) -> Result<IndexMap<NodeId, IndexMap<String, String>>> {
    let mut taken = IndexSet::new();
    for &grammar in grammars {
        for define in defines_of(tree, grammar) {
            taken.insert(tree.required_attribute(define, "name")?.to_string());
        }
    }

    let mut assigned: IndexSet<String> = IndexSet::new();
    let mut renames = IndexMap::new();
    for &grammar in grammars {
        let mut names = IndexMap::new();
        for define in defines_of(tree, grammar) {
            let name = tree.required_attribute(define, "name")?;
            if names.contains_key(name) {
                continue;
            }
            let unique = if assigned.contains(name) {
                (1..)
                    .map(|n| format!("{}-{}", name, n))
                    .find(|candidate| !taken.contains(candidate) && !assigned.contains(candidate))
                    .unwrap_or_else(|| name.to_string())
            } else {
                name.to_string()
            };
            assigned.insert(unique.clone());
            names.insert(name.to_string(), unique);
        }
        renames.insert(grammar, names);
    }
    Ok(renames)
}

/// Point every `ref` and `parentRef` at the new name of its define
fn resolve_references(
    tree: &mut Tree,
    top: NodeId,
    renames: &IndexMap<NodeId, IndexMap<String, String>>,
) -> Result<()> {
    let mut resolved = Vec::new();
    for id in tree.descendants(top) {
        let kind = tree.kind(id);
        let skip = match kind {
            Kind::Ref => 0,
            Kind::ParentRef => 1,
            _ => continue,
        };
        let name = tree.required_attribute(id, "name")?;
        let grammar = tree
            .ancestors(id)
            .filter(|&a| tree.kind(a) == Kind::Grammar)
            .nth(skip)
            .ok_or_else(|| tree.malformed(id, format!("{} has no enclosing grammar", kind)))?;
        let target = renames
            .get(&grammar)
            .and_then(|names| names.get(name))
            .ok_or_else(|| tree.malformed(id, format!("reference to undefined pattern '{}'", name)))?;
        resolved.push((id, target.clone()));
    }

    for (id, name) in resolved {
        tree.set_kind(id, Kind::Ref);
        tree.set_attribute(id, "name", name);
    }
    Ok(())
}

fn rename_defines(tree: &mut Tree, renames: &IndexMap<NodeId, IndexMap<String, String>>) {
    for (&grammar, names) in renames {
        for define in defines_of(tree, grammar) {
            let renamed = tree
                .attribute(define, "name")
                .and_then(|name| names.get(name))
                .cloned();
            if let Some(renamed) = renamed {
                tree.set_attribute(define, "name", renamed);
            }
        }
    }
}

/// Move the defines of a nested grammar to the top and replace it with its
/// start content
fn inline_grammar(tree: &mut Tree, top: NodeId, grammar: NodeId) -> Result<()> {
    let mut start = None;
    for child in tree.element_children(grammar) {
        match tree.kind(child) {
            Kind::Define => tree.append(top, child),
            Kind::Start => start = Some(child),
            _ => {}
        }
    }
    let start = start.ok_or_else(|| tree.malformed(grammar, "nested grammar has no start"))?;
    let content = tree
        .first_element_child(start)
        .ok_or_else(|| tree.malformed(start, "missing pattern content"))?;
    tree.replace_with(grammar, content);
    Ok(())
}

fn defines_of(tree: &Tree, grammar: NodeId) -> Vec<NodeId> {
    tree.element_children(grammar)
        .into_iter()
        .filter(|&c| tree.kind(c) == Kind::Define)
        .collect()
}
