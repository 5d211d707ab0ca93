//! Structural checks of simplified grammars
//!
//! [`check`] verifies that a tree is in simplified form and that none of the
//! prohibited paths of RELAX NG section 7.1 occur. It reports every finding
//! rather than stopping at the first.

use crate::tree::{Kind, NodeId, Tree};
use indexmap::IndexSet;
use std::fmt;

/// One structural problem in a simplified grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Path of the offending element
    pub path: String,
    /// What is wrong
    pub message: String,
}

impl Finding {
    fn new(tree: &Tree, id: NodeId, message: impl Into<String>) -> Self {
        Self {
            path: tree.path(id).to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Ancestors that restrict what may appear below them
#[derive(Debug, Default, Clone, Copy)]
struct Context {
    attribute: bool,
    one_or_more: bool,
    one_or_more_group: bool,
    list: bool,
    data_except: bool,
    start: bool,
}

impl Context {
    fn prohibits(&self, kind: Kind) -> Option<&'static str> {
        use Kind::*;
        if self.attribute && matches!(kind, Attribute | Ref) {
            return Some("attribute");
        }
        if self.one_or_more_group && kind == Attribute {
            return Some("group or interleave inside oneOrMore");
        }
        if self.list && matches!(kind, List | Ref | Attribute | Text | Interleave) {
            return Some("list");
        }
        if self.data_except
            && matches!(
                kind,
                Attribute | Ref | Text | List | Group | Interleave | OneOrMore | Empty
            )
        {
            return Some("data/except");
        }
        if self.start
            && matches!(
                kind,
                Attribute | Data | Value | Text | List | Group | Interleave | OneOrMore | Empty
            )
        {
            return Some("start");
        }
        None
    }
}

/// Check a simplified grammar, returning every finding
pub fn check(tree: &Tree) -> Vec<Finding> {
    let mut findings = Vec::new();
    let Some(grammar) = tree.root() else {
        return vec![Finding {
            path: String::new(),
            message: "tree has no document element".to_string(),
        }];
    };
    if tree.kind(grammar) != Kind::Grammar {
        findings.push(Finding::new(tree, grammar, "document element is not a grammar"));
        return findings;
    }

    let children = tree.element_children(grammar);
    let mut defined = IndexSet::new();
    let mut starts = 0;
    for (index, &child) in children.iter().enumerate() {
        match tree.kind(child) {
            Kind::Start => {
                starts += 1;
                if index != 0 {
                    findings.push(Finding::new(tree, child, "start must be the first child of grammar"));
                }
                let start = Context {
                    start: true,
                    ..Context::default()
                };
                for pattern in tree.element_children(child) {
                    walk(tree, pattern, start, &mut findings);
                }
            }
            Kind::Define => {
                if let Some(name) = tree.attribute(child, "name") {
                    defined.insert(name.to_string());
                }
                let content = tree.element_children(child);
                match content.as_slice() {
                    [element] if tree.kind(*element) == Kind::Element => {
                        check_element(tree, *element, &mut findings);
                    }
                    _ => findings.push(Finding::new(tree, child, "define must contain exactly one element")),
                }
            }
            other => findings.push(Finding::new(
                tree,
                child,
                format!("{} is not allowed in a simplified grammar", other),
            )),
        }
    }
    if starts != 1 {
        findings.push(Finding::new(
            tree,
            grammar,
            format!("grammar must have exactly one start, found {}", starts),
        ));
    }

    for id in tree.descendants(grammar) {
        match tree.kind(id) {
            Kind::Ref => {
                let name = tree.attribute(id, "name").unwrap_or("");
                if !defined.contains(name) {
                    findings.push(Finding::new(tree, id, format!("no define named '{}'", name)));
                }
            }
            Kind::Choice | Kind::Group | Kind::Interleave => {
                let count = tree.element_count(id);
                if count != 2 {
                    findings.push(Finding::new(
                        tree,
                        id,
                        format!("{} must have exactly 2 children, found {}", tree.kind(id), count),
                    ));
                }
            }
            _ => {}
        }
    }
    findings
}

fn check_element(tree: &Tree, element: NodeId, findings: &mut Vec<Finding>) {
    // The name class comes first and is not a pattern
    for pattern in tree.element_children(element).into_iter().skip(1) {
        walk(tree, pattern, Context::default(), findings);
    }
}

fn walk(tree: &Tree, id: NodeId, context: Context, findings: &mut Vec<Finding>) {
    let kind = tree.kind(id);
    if let Some(ancestor) = context.prohibits(kind) {
        findings.push(Finding::new(
            tree,
            id,
            format!("{} is not allowed inside {}", kind, ancestor),
        ));
    }

    let mut inner = context;
    let mut skip = 0;
    match kind {
        Kind::Element | Kind::Ref => return,
        Kind::Attribute => {
            inner.attribute = true;
            skip = 1;
        }
        Kind::OneOrMore => inner.one_or_more = true,
        Kind::Group | Kind::Interleave if context.one_or_more => inner.one_or_more_group = true,
        Kind::List => inner.list = true,
        Kind::Except if tree.parent(id).map(|p| tree.kind(p)) == Some(Kind::Data) => {
            inner.data_except = true;
        }
        _ => {}
    }
    for child in tree.element_children(id).into_iter().skip(skip) {
        walk(tree, child, inner, findings);
    }
}
