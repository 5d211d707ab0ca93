//! Grammar tree builder
//!
//! [`TreeBuilder`] consumes SAX-style events (open tag, close tag, text) and
//! builds a [`Tree`]. Only elements in the RelaxNG structure namespace are
//! accepted. Whitespace-only text is dropped here, except inside `param` and
//! `value` where text is significant and kept verbatim.
//!
//! The events usually come from [`crate::reader`], which tokenizes schema
//! text with quick-xml.

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::namespaces::RELAXNG_NAMESPACE;
use crate::tree::{Kind, NodeId, Tree};

/// Builds a grammar tree from parse events
#[derive(Debug)]
pub struct TreeBuilder {
    tree: Tree,
    stack: Vec<NodeId>,
    limits: Limits,
}

impl TreeBuilder {
    /// Create a builder with default limits
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    /// Create a builder with the given limits
    pub fn with_limits(limits: Limits) -> Self {
        Self {
            tree: Tree::new(),
            stack: Vec::new(),
            limits,
        }
    }

    /// Handle an open tag.
    ///
    /// `attributes` are `(name, value)` pairs in document order.
    pub fn start_element<'a, I>(&mut self, namespace: &str, local_name: &str, attributes: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        if namespace != RELAXNG_NAMESPACE {
            return Err(Error::Namespace {
                namespace: namespace.to_string(),
                local_name: local_name.to_string(),
            });
        }
        let kind = Kind::from_local_name(local_name).ok_or_else(|| {
            Error::malformed(format!("unknown RelaxNG element '{}'", local_name))
        })?;
        self.limits.check_tree_depth(self.stack.len() + 1)?;

        let element = self.tree.create(kind);
        for (name, value) in attributes {
            self.tree.set_attribute(element, name, value);
        }

        let parent = match self.stack.last() {
            Some(&top) => top,
            None => {
                if self.tree.root().is_some() {
                    return Err(Error::Xml("more than one document element".to_string()));
                }
                self.tree.document()
            }
        };
        self.tree.append(parent, element);
        self.stack.push(element);
        Ok(())
    }

    /// Handle a close tag
    pub fn end_element(&mut self) -> Result<()> {
        self.stack
            .pop()
            .map(|_| ())
            .ok_or_else(|| Error::Xml("close tag without matching open tag".to_string()))
    }

    /// Handle character data
    pub fn text(&mut self, text: &str) {
        let Some(&top) = self.stack.last() else {
            return;
        };
        if self.tree.kind(top).keeps_whitespace() || !is_whitespace(text) {
            self.tree.append_text(top, text);
        }
    }

    /// The document element, once it has been closed
    pub fn root(&self) -> Result<NodeId> {
        let root = self
            .tree
            .root()
            .ok_or_else(|| Error::IncompleteParse("no element has been parsed".to_string()))?;
        if let Some(&open) = self.stack.last() {
            return Err(Error::IncompleteParse(format!(
                "element '{}' is still open",
                self.tree.local_name(open)
            )));
        }
        Ok(root)
    }

    /// Finish parsing and return the tree
    pub fn finish(self) -> Result<Tree> {
        self.root()?;
        Ok(self.tree)
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// XML whitespace: space, tab, carriage return, line feed
pub fn is_whitespace(text: &str) -> bool {
    text.chars().all(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
}
