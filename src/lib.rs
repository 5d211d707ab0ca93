//! # rngsimplify
//!
//! A RelaxNG grammar simplifier: turns RelaxNG XML schemas into the simplified
//! form defined in section 4 of the RELAX NG specification and checks the
//! result against the restrictions of section 7.
//!
//! ## Features
//!
//! - Arena-backed grammar tree with structural editing
//! - `externalRef` and `include` resolution through pluggable loaders
//! - The full simplification pipeline, pass by pass
//! - Structural validation of simplified grammars
//! - External simplifier and validator processes (XSLT processors, Jing)
//!
//! ## Example
//!
//! ```rust,no_run
//! use rngsimplify::loaders::FileLoader;
//! use rngsimplify::simplifier::{InternalSimplifier, Simplifier, SimplifierOptions};
//! use rngsimplify::{locations, writer};
//!
//! let options = SimplifierOptions::new().with_validate(true);
//! let simplifier = InternalSimplifier::new(options, FileLoader::new())?;
//! let result = simplifier.simplify(&locations::to_url("schema.rng")?)?;
//! println!("{}", writer::to_xml(&result.tree)?);
//! # Ok::<(), rngsimplify::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;

// Names and locations
pub mod names;
pub mod namespaces;
pub mod locations;

// Grammar tree
pub mod tree;
pub mod parser;
pub mod reader;
pub mod writer;

// Resource loading and external processes
pub mod loaders;
pub mod process;

// Simplification and validation
pub mod simplifier;
pub mod validation;
pub mod validators;

// Re-exports for convenience
pub use error::{Error, Result};
pub use namespaces::{RELAXNG_NAMESPACE, XMLNS_NAMESPACE, XML_NAMESPACE};
pub use simplifier::{make_simplifier, SimplificationResult, Simplifier, SimplifierOptions};
pub use tree::{Kind, NodeId, Tree};

/// Version of the rngsimplify library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
