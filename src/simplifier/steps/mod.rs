//! Simplification passes
//!
//! Each pass rewrites the tree in place and eliminates one class of RelaxNG
//! construct. The passes must run in the order of [`Step::ALL`]: later passes
//! rely on the shape guaranteed by earlier ones (for instance `not_allowed`
//! expects every `choice` to be binary, which `arity` establishes).

pub mod arity;
pub mod combine;
pub mod constraints;
pub mod datatype;
pub mod defines;
pub mod div;
pub mod empty;
pub mod grammar;
pub mod includes;
pub mod naming;
pub mod not_allowed;
pub mod refs;
pub mod sugar;
pub mod whitespace;

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::loaders::ResourceLoader;
use crate::tree::Tree;
use url::Url;

/// State shared by the passes of one simplification run
pub struct StepContext<'a> {
    /// Loader for `externalRef` and `include` targets
    pub loader: &'a dyn ResourceLoader,
    /// Limits applied to loaded documents
    pub limits: &'a Limits,
    /// Every URL loaded so far, once each, in first-load order
    pub loaded: Vec<Url>,
    /// URLs currently being loaded, outermost first
    pub open: Vec<Url>,
}

impl<'a> StepContext<'a> {
    /// Create a context for one run
    pub fn new(loader: &'a dyn ResourceLoader, limits: &'a Limits) -> Self {
        Self {
            loader,
            limits,
            loaded: Vec::new(),
            open: Vec::new(),
        }
    }

    /// Mark `url` as being loaded; fails on reference loops and excessive nesting
    pub fn enter(&mut self, url: &Url) -> Result<()> {
        if self.open.contains(url) {
            return Err(Error::malformed(format!(
                "schema {} references itself through externalRef or include",
                url
            )));
        }
        self.limits.check_include_depth(self.open.len())?;
        self.open.push(url.clone());
        if !self.loaded.contains(url) {
            self.loaded.push(url.clone());
        }
        Ok(())
    }

    /// Leave the document entered last
    pub fn leave(&mut self) {
        self.open.pop();
    }
}

/// One simplification pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Trim names and validate name syntax
    Whitespace,
    /// Resolve inherited `datatypeLibrary`, default `value` types
    DatatypeLibrary,
    /// Replace `externalRef` by the referenced pattern
    ExternalRefs,
    /// Replace `include` by the included grammar
    Includes,
    /// Turn `name` attributes into `name` elements
    NameAttribute,
    /// Propagate `ns` attributes
    NsAttribute,
    /// Resolve prefixed names
    QNames,
    /// Flatten `div`
    Divs,
    /// Binarize and wrap children
    Arity,
    /// Desugar `mixed`, `optional` and `zeroOrMore`
    Sugar,
    /// Check name class constraints
    Constraints,
    /// Merge `combine`d definitions
    Combine,
    /// Flatten nested grammars
    Grammar,
    /// Normalize `define` and `ref`
    Defines,
    /// Propagate `notAllowed`
    NotAllowed,
    /// Normalize `empty`
    Empty,
}

impl Step {
    /// All passes in pipeline order
    pub const ALL: [Step; 16] = [
        Step::Whitespace,
        Step::DatatypeLibrary,
        Step::ExternalRefs,
        Step::Includes,
        Step::NameAttribute,
        Step::NsAttribute,
        Step::QNames,
        Step::Divs,
        Step::Arity,
        Step::Sugar,
        Step::Constraints,
        Step::Combine,
        Step::Grammar,
        Step::Defines,
        Step::NotAllowed,
        Step::Empty,
    ];

    /// Short name used in timings and diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Step::Whitespace => "whitespace",
            Step::DatatypeLibrary => "datatype-library",
            Step::ExternalRefs => "external-refs",
            Step::Includes => "includes",
            Step::NameAttribute => "name-attribute",
            Step::NsAttribute => "ns-attribute",
            Step::QNames => "qnames",
            Step::Divs => "divs",
            Step::Arity => "arity",
            Step::Sugar => "sugar",
            Step::Constraints => "constraints",
            Step::Combine => "combine",
            Step::Grammar => "grammar",
            Step::Defines => "defines",
            Step::NotAllowed => "not-allowed",
            Step::Empty => "empty",
        }
    }

    /// Run this pass over `tree`
    pub fn run(&self, tree: &mut Tree, ctx: &mut StepContext<'_>) -> Result<()> {
        match self {
            Step::Whitespace => whitespace::run(tree),
            Step::DatatypeLibrary => datatype::run(tree),
            Step::ExternalRefs => includes::resolve_external_refs(tree, ctx),
            Step::Includes => includes::resolve_includes(tree, ctx),
            Step::NameAttribute => naming::name_attributes(tree),
            Step::NsAttribute => naming::ns_attributes(tree),
            Step::QNames => naming::qnames(tree),
            Step::Divs => div::run(tree),
            Step::Arity => arity::run(tree),
            Step::Sugar => sugar::run(tree),
            Step::Constraints => constraints::run(tree),
            Step::Combine => combine::run(tree),
            Step::Grammar => grammar::run(tree),
            Step::Defines => defines::run(tree, ctx.limits),
            Step::NotAllowed => not_allowed::run(tree),
            Step::Empty => empty::run(tree),
        }
    }
}

/// Run every pass up to and including `last`
pub fn run_until(tree: &mut Tree, ctx: &mut StepContext<'_>, last: Step) -> Result<()> {
    for step in Step::ALL {
        step.run(tree, ctx)?;
        if step == last {
            break;
        }
    }
    Ok(())
}

/// The document element of a tree, failing on an empty tree
pub(crate) fn document_element(tree: &Tree) -> Result<crate::tree::NodeId> {
    tree.root()
        .ok_or_else(|| Error::IncompleteParse("tree has no document element".to_string()))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::loaders::MemoryLoader;
    use crate::reader::parse_str;
    use crate::writer::node_to_xml;

    /// URL the test schemas are parsed under
    pub const BASE: &str = "memory:/schemas/main.rng";

    /// Parse `xml` and run every pass up to and including `last`
    pub fn run_to(xml: &str, last: Step) -> Result<Tree> {
        run_to_with(xml, last, &MemoryLoader::new())
    }

    /// Same as [`run_to`] with extra resources available
    pub fn run_to_with(xml: &str, last: Step, loader: &MemoryLoader) -> Result<Tree> {
        let base = Url::parse(BASE).unwrap();
        let limits = Limits::default();
        let mut ctx = StepContext::new(loader, &limits);
        ctx.enter(&base)?;
        let mut tree = parse_str(xml, Some(&base))?;
        run_until(&mut tree, &mut ctx, last)?;
        Ok(tree)
    }

    /// Compact XML of the document element without namespace and base attributes
    pub fn compact(tree: &Tree) -> String {
        let xml = node_to_xml(tree, tree.root().unwrap(), false).unwrap();
        xml.replacen(" xmlns=\"http://relaxng.org/ns/structure/1.0\"", "", 1)
            .replace(&format!(" xml:base=\"{}\"", BASE), "")
    }

    /// Add the RelaxNG namespace declaration to the document element of `body`
    pub fn rng(body: &str) -> String {
        let end = body[1..]
            .find(|c: char| c == ' ' || c == '/' || c == '>')
            .map(|i| i + 1)
            .unwrap_or(body.len());
        format!(
            "{} xmlns=\"http://relaxng.org/ns/structure/1.0\"{}",
            &body[..end],
            &body[end..]
        )
    }
}
