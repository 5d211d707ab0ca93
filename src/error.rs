//! Error types for rngsimplify
//!
//! This module defines all error types used throughout the library.
//! Every error is fatal for the simplification run that raised it; nothing in
//! the pipeline recovers locally or substitutes a default.

use std::fmt;
use thiserror::Error;

/// Result type alias using rngsimplify Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for rngsimplify operations
#[derive(Error, Debug)]
pub enum Error {
    /// An element used a namespace other than the RelaxNG structure namespace
    #[error("namespace error: element '{local_name}' is in namespace '{namespace}'")]
    Namespace {
        /// Namespace URI found on the element (empty for no namespace)
        namespace: String,
        /// Local name of the offending element
        local_name: String,
    },

    /// The parsed root was requested before parsing produced one
    #[error("incomplete parse: {0}")]
    IncompleteParse(String),

    /// A pass found a tree shape violating its preconditions
    #[error("malformed grammar: {0}")]
    MalformedGrammar(#[from] MalformedGrammarError),

    /// A resource could not be acquired
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    /// Structural validation found the simplified grammar invalid
    #[error("schema validation error: {0}")]
    SchemaValidation(#[from] SchemaValidationError),

    /// The chosen strategy does not provide a requested capability
    #[error("unsupported option: {0}")]
    UnsupportedOption(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// Name error (invalid NCName or QName)
    #[error("name error: {0}")]
    Name(String),

    /// An external command exited unsuccessfully
    #[error("external command '{program}' failed: {message}")]
    Process {
        /// Program that was run
        program: String,
        /// Exit status and scrubbed stderr
        message: String,
    },

    /// XML tokenizing error
    #[error("XML error: {0}")]
    Xml(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing error
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Shorthand for a malformed grammar error without location context
    pub fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedGrammar(MalformedGrammarError::new(message))
    }
}

/// Structural precondition violation found by a simplification pass
#[derive(Debug, Clone)]
pub struct MalformedGrammarError {
    /// Error message
    pub message: String,
    /// Construct kind of the offending element
    pub construct: Option<String>,
    /// Diagnostic path of the offending element
    pub path: Option<String>,
}

impl MalformedGrammarError {
    /// Create a new malformed grammar error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            construct: None,
            path: None,
        }
    }

    /// Set the construct kind
    pub fn with_construct(mut self, construct: impl Into<String>) -> Self {
        self.construct = Some(construct.into());
        self
    }

    /// Set the element path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl fmt::Display for MalformedGrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref construct) = self.construct {
            write!(f, " (in '{}')", construct)?;
        }

        if let Some(ref path) = self.path {
            write!(f, " at {}", path)?;
        }

        Ok(())
    }
}

impl std::error::Error for MalformedGrammarError {}

/// Resource acquisition failure
#[derive(Error, Debug)]
pub enum LoadError {
    /// The loader does not handle this URL scheme
    #[error("unsupported URL scheme '{scheme}' for {url}")]
    UnsupportedScheme {
        /// Scheme of the rejected URL
        scheme: String,
        /// The rejected URL
        url: String,
    },

    /// File URLs must not carry a fragment
    #[error("file URL must not have a fragment: {0}")]
    Fragment(String),

    /// Reading a local file failed
    #[error("failed to read '{url}': {source}")]
    File {
        /// The URL being read
        url: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Network retrieval failed or is unavailable
    #[error("failed to fetch '{url}': {reason}")]
    Network {
        /// The URL being fetched
        url: String,
        /// Reason given by the transport
        reason: String,
    },

    /// No resource is registered under this URL
    #[error("resource not found: {0}")]
    NotFound(String),
}

/// Structural validation failure of a simplified grammar
#[derive(Debug, Clone)]
pub struct SchemaValidationError {
    /// Error message
    pub message: String,
    /// Full diagnostic text
    pub details: Option<String>,
    /// Whether the details are part of the displayed message
    pub verbose: bool,
}

impl SchemaValidationError {
    /// Create a new schema validation error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: None,
            verbose: false,
        }
    }

    /// Attach the full diagnostic text
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Include the details in the displayed message.
    ///
    /// In verbose mode the details are also written to stderr right away.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        if verbose {
            if let Some(ref details) = self.details {
                eprintln!("{}", details);
            }
        }
        self
    }
}

impl fmt::Display for SchemaValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        match (&self.details, self.verbose) {
            (Some(details), true) => write!(f, "\n\n{}", details),
            (Some(_), false) => write!(f, " (rerun with verbose output for details)"),
            (None, _) => Ok(()),
        }
    }
}

impl std::error::Error for SchemaValidationError {}
