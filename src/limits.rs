//! Limits and constraints for schema simplification
//!
//! This module defines limits that keep a simplification run bounded:
//! oversized schema files, runaway `externalRef`/`include` chains and
//! pathologically deep grammars are rejected instead of exhausting resources.

use crate::error::{Error, Result};

/// Global limits configuration
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum size of a single schema resource in bytes
    pub max_schema_size: usize,

    /// Maximum nesting of `externalRef`/`include` loads
    pub max_include_depth: usize,

    /// Maximum element nesting depth of a parsed grammar
    pub max_tree_depth: usize,

    /// Maximum number of nodes a grammar may grow to while refs are expanded
    pub max_grammar_nodes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_schema_size: 100 * 1024 * 1024, // 100 MB
            max_include_depth: 100,
            max_tree_depth: 1000,
            max_grammar_nodes: 1_000_000,
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_schema_size: 10 * 1024 * 1024, // 10 MB
            max_include_depth: 20,
            max_tree_depth: 100,
            max_grammar_nodes: 100_000,
        }
    }

    /// Create permissive limits (less restrictive, use with caution)
    pub fn permissive() -> Self {
        Self {
            max_schema_size: 1024 * 1024 * 1024, // 1 GB
            max_include_depth: 1000,
            max_tree_depth: 10000,
            max_grammar_nodes: 100_000_000,
        }
    }

    /// Check if a schema resource size is within limits
    pub fn check_schema_size(&self, size: usize) -> Result<()> {
        if size > self.max_schema_size {
            Err(Error::LimitExceeded(format!(
                "Schema size {} bytes exceeds maximum {} bytes",
                size, self.max_schema_size
            )))
        } else {
            Ok(())
        }
    }

    /// Check if the include/externalRef nesting is within limits
    pub fn check_include_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_include_depth {
            Err(Error::LimitExceeded(format!(
                "Include depth {} exceeds maximum {}",
                depth, self.max_include_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check if the number of grammar nodes is within limits
    pub fn check_grammar_nodes(&self, count: usize) -> Result<()> {
        if count > self.max_grammar_nodes {
            Err(Error::LimitExceeded(format!(
                "Grammar grew to {} nodes, exceeding maximum {}",
                count, self.max_grammar_nodes
            )))
        } else {
            Ok(())
        }
    }

    /// Check if the element nesting depth is within limits
    pub fn check_tree_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_tree_depth {
            Err(Error::LimitExceeded(format!(
                "Grammar depth {} exceeds maximum {}",
                depth, self.max_tree_depth
            )))
        } else {
            Ok(())
        }
    }
}
