//! Reference collection and define pruning

use crate::tree::{Kind, NodeId, Tree};
use indexmap::{IndexMap, IndexSet};

/// Names of every `ref` reachable from `from`, following `ref` to `define`
/// edges transitively through the defines of the top grammar.
pub fn collect_references(tree: &Tree, from: NodeId) -> IndexSet<String> {
    let defines = top_defines(tree);
    let mut referenced = IndexSet::new();
    let mut stack = vec![from];

    while let Some(id) = stack.pop() {
        let kind = tree.kind(id);
        if kind == Kind::Ref {
            let Some(name) = tree.attribute(id, "name") else {
                continue;
            };
            if referenced.insert(name.to_string()) {
                if let Some(&define) = defines.get(name) {
                    stack.push(define);
                }
            }
            continue;
        }
        if kind.is_opaque() && id != from {
            continue;
        }
        stack.extend(tree.element_children(id).into_iter().rev());
    }
    referenced
}

/// Remove every `define` of the top grammar whose name is not in `referenced`
pub fn remove_unreferenced_defs(tree: &mut Tree, referenced: &IndexSet<String>) {
    let Some(grammar) = tree.root() else {
        return;
    };
    for child in tree.element_children(grammar) {
        if tree.kind(child) != Kind::Define {
            continue;
        }
        let used = tree
            .attribute(child, "name")
            .is_some_and(|name| referenced.contains(name));
        if !used {
            tree.remove(child);
        }
    }
}

/// Defines of the top grammar by name
pub(crate) fn top_defines(tree: &Tree) -> IndexMap<String, NodeId> {
    let Some(grammar) = tree.root() else {
        return IndexMap::new();
    };
    tree.element_children(grammar)
        .into_iter()
        .filter(|&c| tree.kind(c) == Kind::Define)
        .filter_map(|c| tree.attribute(c, "name").map(|n| (n.to_string(), c)))
        .collect()
}

/// The single `start` of the top grammar
pub(crate) fn top_start(tree: &Tree) -> Option<NodeId> {
    let grammar = tree.root()?;
    tree.element_children(grammar)
        .into_iter()
        .find(|&c| tree.kind(c) == Kind::Start)
}

/// Prune every define unreachable from the top `start`
pub(crate) fn prune_from_start(tree: &mut Tree) {
    let referenced = match top_start(tree) {
        Some(start) => collect_references(tree, start),
        None => IndexSet::new(),
    };
    remove_unreferenced_defs(tree, &referenced);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::parse_str;

    const SCHEMA: &str = r#"<grammar xmlns="http://relaxng.org/ns/structure/1.0">
        <start><ref name="a"/></start>
        <define name="a"><element><name ns="">a</name><ref name="b"/></element></define>
        <define name="b"><choice><ref name="a"/><empty/></choice></define>
        <define name="foo"><element><name ns="">foo</name><empty/></element></define>
    </grammar>"#;

    #[test]
    fn test_collects_transitively() {
        let tree = parse_str(SCHEMA, None).unwrap();
        let start = top_start(&tree).unwrap();
        let refs = collect_references(&tree, start);
        assert_eq!(refs.into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_prunes_unreferenced() {
        let mut tree = parse_str(SCHEMA, None).unwrap();
        prune_from_start(&mut tree);
        let names: Vec<_> = top_defines(&tree).into_keys().collect();
        assert_eq!(names, vec!["a", "b"]);

        // Every remaining define is reachable and every reachable ref is defined
        let refs = collect_references(&tree, top_start(&tree).unwrap());
        let defines = top_defines(&tree);
        assert!(refs.iter().all(|r| defines.contains_key(r)));
        assert!(defines.keys().all(|d| refs.contains(d)));
    }

    #[test]
    fn test_does_not_enter_opaque_nodes() {
        let xml = r#"<grammar xmlns="http://relaxng.org/ns/structure/1.0">
            <start><value>ref</value></start>
        </grammar>"#;
        let tree = parse_str(xml, None).unwrap();
        assert!(collect_references(&tree, top_start(&tree).unwrap()).is_empty());
    }
}
