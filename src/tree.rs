//! Grammar element tree
//!
//! The tree is stored in an arena owned by [`Tree`]; nodes are addressed by
//! [`NodeId`] handles. Ownership runs strictly top-down through each node's
//! `children` list. The `parent` link is a plain handle used for lookups and
//! in-place replacement and never keeps anything alive.
//!
//! Nodes that are removed from the tree stay in the arena, unreachable, until
//! the [`Tree`] is dropped. A tree lives for exactly one simplification run.

use crate::error::{Error, MalformedGrammarError};
use crate::namespaces::{declaration_attribute, XML_NAMESPACE};
use indexmap::IndexMap;
use once_cell::unsync::OnceCell;
use std::cell::Cell;
use std::fmt;

/// Handle of a node in a [`Tree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// RelaxNG construct kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Wrapper above the document element; never appears in XML
    Document,
    Grammar,
    Start,
    Define,
    Ref,
    ParentRef,
    ExternalRef,
    Include,
    Div,
    Element,
    Attribute,
    Group,
    Interleave,
    Choice,
    Optional,
    ZeroOrMore,
    OneOrMore,
    List,
    Mixed,
    Empty,
    Text,
    NotAllowed,
    Data,
    Value,
    Param,
    Except,
    Name,
    AnyName,
    NsName,
}

impl Kind {
    /// Map a RelaxNG element local name to its kind
    pub fn from_local_name(name: &str) -> Option<Kind> {
        let kind = match name {
            "grammar" => Kind::Grammar,
            "start" => Kind::Start,
            "define" => Kind::Define,
            "ref" => Kind::Ref,
            "parentRef" => Kind::ParentRef,
            "externalRef" => Kind::ExternalRef,
            "include" => Kind::Include,
            "div" => Kind::Div,
            "element" => Kind::Element,
            "attribute" => Kind::Attribute,
            "group" => Kind::Group,
            "interleave" => Kind::Interleave,
            "choice" => Kind::Choice,
            "optional" => Kind::Optional,
            "zeroOrMore" => Kind::ZeroOrMore,
            "oneOrMore" => Kind::OneOrMore,
            "list" => Kind::List,
            "mixed" => Kind::Mixed,
            "empty" => Kind::Empty,
            "text" => Kind::Text,
            "notAllowed" => Kind::NotAllowed,
            "data" => Kind::Data,
            "value" => Kind::Value,
            "param" => Kind::Param,
            "except" => Kind::Except,
            "name" => Kind::Name,
            "anyName" => Kind::AnyName,
            "nsName" => Kind::NsName,
            _ => return None,
        };
        Some(kind)
    }

    /// The RelaxNG element local name
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Document => "#document",
            Kind::Grammar => "grammar",
            Kind::Start => "start",
            Kind::Define => "define",
            Kind::Ref => "ref",
            Kind::ParentRef => "parentRef",
            Kind::ExternalRef => "externalRef",
            Kind::Include => "include",
            Kind::Div => "div",
            Kind::Element => "element",
            Kind::Attribute => "attribute",
            Kind::Group => "group",
            Kind::Interleave => "interleave",
            Kind::Choice => "choice",
            Kind::Optional => "optional",
            Kind::ZeroOrMore => "zeroOrMore",
            Kind::OneOrMore => "oneOrMore",
            Kind::List => "list",
            Kind::Mixed => "mixed",
            Kind::Empty => "empty",
            Kind::Text => "text",
            Kind::NotAllowed => "notAllowed",
            Kind::Data => "data",
            Kind::Value => "value",
            Kind::Param => "param",
            Kind::Except => "except",
            Kind::Name => "name",
            Kind::AnyName => "anyName",
            Kind::NsName => "nsName",
        }
    }

    /// Constructs whose content never holds `ref` or `notAllowed`.
    ///
    /// Walks looking for either stop at these nodes. `ref` is a leaf here.
    pub fn is_opaque(&self) -> bool {
        matches!(
            self,
            Kind::Name
                | Kind::AnyName
                | Kind::NsName
                | Kind::Param
                | Kind::Empty
                | Kind::Text
                | Kind::Value
                | Kind::NotAllowed
                | Kind::Ref
        )
    }

    /// Text content of these constructs is significant
    pub fn keeps_whitespace(&self) -> bool {
        matches!(self, Kind::Param | Kind::Value)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry in a node's children list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    /// Element child
    Element(NodeId),
    /// Text content
    Text(String),
}

impl Child {
    /// The element handle, if this is an element child
    pub fn as_element(&self) -> Option<NodeId> {
        match self {
            Child::Element(id) => Some(*id),
            Child::Text(_) => None,
        }
    }
}

#[derive(Debug)]
struct Node {
    kind: Kind,
    attributes: IndexMap<String, String>,
    children: Vec<Child>,
    parent: Option<NodeId>,
    path: OnceCell<String>,
}

impl Node {
    fn new(kind: Kind) -> Self {
        Self {
            kind,
            attributes: IndexMap::new(),
            children: Vec::new(),
            parent: None,
            path: OnceCell::new(),
        }
    }
}

/// Arena-backed grammar tree
#[derive(Debug)]
pub struct Tree {
    nodes: Vec<Node>,
    document: NodeId,
    // Set once any path has been memoized
    paths_cached: Cell<bool>,
}

impl Tree {
    /// Create an empty tree holding only the document wrapper
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(Kind::Document)],
            document: NodeId(0),
            paths_cached: Cell::new(false),
        }
    }

    /// The document wrapper node
    pub fn document(&self) -> NodeId {
        self.document
    }

    /// The document element, if one has been attached
    pub fn root(&self) -> Option<NodeId> {
        self.first_element_child(self.document)
    }

    /// Create a detached node
    pub fn create(&mut self, kind: Kind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(kind));
        id
    }

    /// Create a detached node carrying a `name` attribute
    pub fn create_named(&mut self, kind: Kind, name: &str) -> NodeId {
        let id = self.create(kind);
        self.set_attribute(id, "name", name);
        id
    }

    /// Number of nodes ever created in this tree, detached ones included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Construct kind of a node
    pub fn kind(&self, id: NodeId) -> Kind {
        self.nodes[id.0].kind
    }

    /// Local name of a node
    pub fn local_name(&self, id: NodeId) -> &'static str {
        self.kind(id).as_str()
    }

    /// Change the construct kind of a node in place
    pub fn set_kind(&mut self, id: NodeId, kind: Kind) {
        self.forget_paths();
        self.nodes[id.0].kind = kind;
    }

    /// Parent of a node; `None` for detached nodes and the document wrapper
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Iterate over the ancestors of a node, nearest first
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    /// Whether `id` is still attached below the document wrapper
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.document || self.ancestors(id).any(|a| a == self.document)
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    /// Get an attribute value
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id.0].attributes.get(name).map(|s| s.as_str())
    }

    /// Get a required attribute value, failing with a malformed grammar error
    pub fn required_attribute(&self, id: NodeId, name: &str) -> Result<&str, Error> {
        self.attribute(id, name)
            .ok_or_else(|| self.malformed(id, format!("missing required attribute '{}'", name)))
    }

    /// All attributes of a node, in document order
    pub fn attributes(&self, id: NodeId) -> &IndexMap<String, String> {
        &self.nodes[id.0].attributes
    }

    /// Set an attribute value
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if name == "name" {
            self.forget_paths();
        }
        self.nodes[id.0]
            .attributes
            .insert(name.to_string(), value.into());
    }

    /// Remove an attribute, returning its value
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        if name == "name" {
            self.forget_paths();
        }
        self.nodes[id.0].attributes.shift_remove(name)
    }

    // ------------------------------------------------------------------
    // Children
    // ------------------------------------------------------------------

    /// Children list of a node
    pub fn children(&self, id: NodeId) -> &[Child] {
        &self.nodes[id.0].children
    }

    /// Snapshot of the element children of a node
    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes[id.0]
            .children
            .iter()
            .filter_map(Child::as_element)
            .collect()
    }

    /// First element child
    pub fn first_element_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].children.iter().find_map(Child::as_element)
    }

    /// Number of element children
    pub fn element_count(&self, id: NodeId) -> usize {
        self.nodes[id.0]
            .children
            .iter()
            .filter(|c| c.as_element().is_some())
            .count()
    }

    /// Concatenated text content of a node's direct text children
    pub fn text(&self, id: NodeId) -> String {
        self.nodes[id.0]
            .children
            .iter()
            .filter_map(|c| match c {
                Child::Text(s) => Some(s.as_str()),
                Child::Element(_) => None,
            })
            .collect()
    }

    /// Replace all text children with a single text entry
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        self.forget_paths();
        let children = &mut self.nodes[id.0].children;
        children.retain(|c| matches!(c, Child::Element(_)));
        children.push(Child::Text(text.into()));
    }

    /// Append text content
    pub fn append_text(&mut self, parent: NodeId, text: impl Into<String>) {
        self.forget_paths();
        self.nodes[parent.0].children.push(Child::Text(text.into()));
    }

    /// Append `child` as the last child of `parent`, detaching it first
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(Child::Element(child));
    }

    /// Insert `child` at position `index` of `parent`'s children list
    pub fn insert(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, Child::Element(child));
    }

    /// Position of a node in its parent's children list
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.nodes[parent.0]
            .children
            .iter()
            .position(|c| *c == Child::Element(id))
    }

    /// Remove a node from its parent
    pub fn remove(&mut self, id: NodeId) {
        self.detach(id);
    }

    /// Put `replacement` where `old` is, detaching both from their current places first
    pub fn replace_with(&mut self, old: NodeId, replacement: NodeId) {
        if old == replacement {
            return;
        }
        self.forget_paths();
        self.detach(replacement);
        let Some(parent) = self.parent(old) else {
            return;
        };
        let Some(index) = self.index_in_parent(old) else {
            return;
        };
        self.nodes[parent.0].children[index] = Child::Element(replacement);
        self.nodes[replacement.0].parent = Some(parent);
        self.nodes[old.0].parent = None;
    }

    /// Move all children of `from` (elements and text) to the end of `to`
    pub fn move_children(&mut self, from: NodeId, to: NodeId) {
        self.forget_paths();
        let children = std::mem::take(&mut self.nodes[from.0].children);
        for child in children {
            match child {
                Child::Element(id) => {
                    self.nodes[id.0].parent = Some(to);
                    self.nodes[to.0].children.push(Child::Element(id));
                }
                Child::Text(text) => self.nodes[to.0].children.push(Child::Text(text)),
            }
        }
    }

    /// Replace `node` by its own children, in order
    pub fn unwrap_node(&mut self, node: NodeId) {
        self.forget_paths();
        let Some(parent) = self.parent(node) else {
            return;
        };
        let Some(index) = self.index_in_parent(node) else {
            return;
        };
        let children = std::mem::take(&mut self.nodes[node.0].children);
        for child in &children {
            if let Child::Element(id) = child {
                self.nodes[id.0].parent = Some(parent);
            }
        }
        self.nodes[parent.0].children.splice(index..=index, children);
        self.nodes[node.0].parent = None;
    }

    fn detach(&mut self, id: NodeId) {
        self.forget_paths();
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0]
                .children
                .retain(|c| *c != Child::Element(id));
        }
    }

    // ------------------------------------------------------------------
    // Traversal and copying
    // ------------------------------------------------------------------

    /// Element descendants of `id` in document order, `id` included
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            let children = self.element_children(next);
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Copy the subtree rooted at `id` into a new detached subtree
    pub fn deep_copy(&mut self, id: NodeId) -> NodeId {
        let copy = self.create(self.kind(id));
        self.nodes[copy.0].attributes = self.nodes[id.0].attributes.clone();
        for child in self.nodes[id.0].children.clone() {
            match child {
                Child::Element(child) => {
                    let child_copy = self.deep_copy(child);
                    self.append(copy, child_copy);
                }
                Child::Text(text) => self.append_text(copy, text),
            }
        }
        copy
    }

    /// Copy the subtree rooted at `id` of another tree into this one
    pub fn import(&mut self, other: &Tree, id: NodeId) -> NodeId {
        let copy = self.create(other.kind(id));
        self.nodes[copy.0].attributes = other.nodes[id.0].attributes.clone();
        for child in &other.nodes[id.0].children {
            match child {
                Child::Element(child) => {
                    let child_copy = self.import(other, *child);
                    self.append(copy, child_copy);
                }
                Child::Text(text) => self.append_text(copy, text.clone()),
            }
        }
        copy
    }

    // ------------------------------------------------------------------
    // Namespaces and diagnostics
    // ------------------------------------------------------------------

    /// Resolve a namespace prefix (`None` for the default namespace) in scope at `id`
    pub fn lookup_namespace(&self, id: NodeId, prefix: Option<&str>) -> Option<String> {
        if prefix == Some("xml") {
            return Some(XML_NAMESPACE.to_string());
        }
        let attribute = declaration_attribute(prefix);
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find_map(|node| self.attribute(node, &attribute))
            .map(str::to_string)
    }

    /// Nearest `xml:base` in scope at `id`
    pub fn base_uri(&self, id: NodeId) -> Option<&str> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find_map(|node| self.attribute(node, "xml:base"))
    }

    /// Diagnostic path of a node, computed once and memoized.
    ///
    /// The parent's path is computed first. Any edit that can change a path
    /// drops every memoized path.
    pub fn path(&self, id: NodeId) -> &str {
        self.paths_cached.set(true);
        self.nodes[id.0].path.get_or_init(|| {
            let node = &self.nodes[id.0];
            if node.kind == Kind::Document {
                return String::new();
            }
            let prefix = match node.parent {
                Some(parent) => self.path(parent).to_string(),
                None => String::new(),
            };
            let name = node.attributes.get("name").cloned().or_else(|| {
                node.children
                    .iter()
                    .filter_map(Child::as_element)
                    .find(|&c| self.kind(c) == Kind::Name)
                    .map(|c| self.text(c).trim().to_string())
            });
            match name {
                Some(name) => format!("{}/{}[@name='{}']", prefix, node.kind, name),
                None => format!("{}/{}", prefix, node.kind),
            }
        })
    }

    fn forget_paths(&mut self) {
        if self.paths_cached.replace(false) {
            for node in &mut self.nodes {
                node.path.take();
            }
        }
    }

    /// Build a malformed grammar error pointing at `id`
    pub fn malformed(&self, id: NodeId, message: impl Into<String>) -> Error {
        Error::MalformedGrammar(
            MalformedGrammarError::new(message)
                .with_construct(self.local_name(id))
                .with_path(self.path(id)),
        )
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}
