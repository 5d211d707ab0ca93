//! Grammar tree serialization
//!
//! Writes a [`Tree`] back out as RelaxNG XML. Elements are written without a
//! prefix under a default namespace declaration for the RelaxNG structure
//! namespace; the tree's own default namespace declarations are dropped since
//! they never affect RelaxNG name resolution.

use crate::error::{Error, Result};
use crate::namespaces::RELAXNG_NAMESPACE;
use crate::tree::{Child, NodeId, Tree};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// Serialize the whole tree
pub fn to_xml(tree: &Tree) -> Result<String> {
    let root = tree
        .root()
        .ok_or_else(|| Error::IncompleteParse("tree has no document element".to_string()))?;
    node_to_xml(tree, root, true)
}

/// Serialize the subtree rooted at `id`
pub fn node_to_xml(tree: &Tree, id: NodeId, indent: bool) -> Result<String> {
    let mut writer = if indent {
        Writer::new_with_indent(Vec::new(), b' ', 2)
    } else {
        Writer::new(Vec::new())
    };
    write_node(&mut writer, tree, id, true)?;
    String::from_utf8(writer.into_inner())
        .map_err(|e| Error::Xml(format!("Serialized grammar is not UTF-8: {}", e)))
}

fn write_node(writer: &mut Writer<Vec<u8>>, tree: &Tree, id: NodeId, top: bool) -> Result<()> {
    let name = tree.local_name(id);
    let mut start = BytesStart::new(name);
    if top {
        start.push_attribute(("xmlns", RELAXNG_NAMESPACE));
    }
    for (key, value) in tree.attributes(id) {
        if key != "xmlns" {
            start.push_attribute((key.as_str(), value.as_str()));
        }
    }

    let children = tree.children(id);
    if children.is_empty() {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    for child in children {
        match child {
            Child::Element(child) => write_node(writer, tree, *child, false)?,
            Child::Text(text) => emit(writer, Event::Text(BytesText::new(text)))?,
        }
    }
    emit(writer, Event::End(BytesEnd::new(name)))
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::Xml(format!("Failed to write grammar: {}", e)))
}
