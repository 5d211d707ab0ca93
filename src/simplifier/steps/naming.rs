//! Name classes: `name` attributes, `ns` inheritance and QName resolution

use super::document_element;
use crate::error::Result;
use crate::names::split_qname;
use crate::namespaces::is_declaration;
use crate::tree::{Kind, NodeId, Tree};

/// Turn the `name` attribute of `element` and `attribute` into a `name` child.
///
/// An `attribute` without `ns` puts its name in no namespace.
pub fn name_attributes(tree: &mut Tree) -> Result<()> {
    let root = document_element(tree)?;
    for id in tree.descendants(root) {
        let kind = tree.kind(id);
        if !matches!(kind, Kind::Element | Kind::Attribute) {
            continue;
        }
        let Some(name) = tree.remove_attribute(id, "name") else {
            continue;
        };

        let name_class = tree.create(Kind::Name);
        tree.append_text(name_class, name);
        if kind == Kind::Attribute && tree.attribute(id, "ns").is_none() {
            tree.set_attribute(name_class, "ns", "");
        }
        tree.insert(id, 0, name_class);
    }
    Ok(())
}

/// Give `name`, `nsName` and `value` the `ns` in scope and drop it elsewhere
pub fn ns_attributes(tree: &mut Tree) -> Result<()> {
    let root = document_element(tree)?;
    let nodes = tree.descendants(root);

    let mut resolved = Vec::new();
    for &id in &nodes {
        if matches!(tree.kind(id), Kind::Name | Kind::NsName | Kind::Value)
            && tree.attribute(id, "ns").is_none()
        {
            let ns = tree
                .ancestors(id)
                .find_map(|a| tree.attribute(a, "ns"))
                .unwrap_or("")
                .to_string();
            resolved.push((id, ns));
        }
    }
    for (id, ns) in resolved {
        tree.set_attribute(id, "ns", ns);
    }

    for &id in &nodes {
        if !matches!(tree.kind(id), Kind::Name | Kind::NsName | Kind::Value) {
            tree.remove_attribute(id, "ns");
        }
    }
    Ok(())
}

/// Resolve prefixed `name` content to `ns` plus local name.
///
/// Once prefixes are resolved, namespace declarations and `xml:base` are only
/// kept on `value` elements, which carry the prefixed declarations of their
/// own document from parsing. The default namespace never applies to those.
pub fn qnames(tree: &mut Tree) -> Result<()> {
    let root = document_element(tree)?;
    let nodes = tree.descendants(root);

    for &id in &nodes {
        if tree.kind(id) == Kind::Name {
            resolve_name(tree, id)?;
        }
    }

    for &id in &nodes {
        let kind = tree.kind(id);
        let doomed: Vec<String> = tree
            .attributes(id)
            .keys()
            .filter(|key| {
                if kind == Kind::Value {
                    key.as_str() == "xmlns" || key.as_str() == "xml:base"
                } else {
                    is_declaration(key) || key.as_str() == "xml:base"
                }
            })
            .cloned()
            .collect();
        for key in doomed {
            tree.remove_attribute(id, &key);
        }
    }
    Ok(())
}

fn resolve_name(tree: &mut Tree, id: NodeId) -> Result<()> {
    let text = tree.text(id);
    let (Some(prefix), local) = split_qname(&text) else {
        return Ok(());
    };
    let namespace = tree
        .lookup_namespace(id, Some(prefix))
        .ok_or_else(|| tree.malformed(id, format!("undeclared namespace prefix '{}'", prefix)))?;
    let local = local.to_string();
    tree.set_attribute(id, "ns", namespace);
    tree.set_text(id, local);
    Ok(())
}
