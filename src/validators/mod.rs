//! Schema validators
//!
//! A [`SchemaValidator`] checks that a RelaxNG schema is correct. Validators
//! are looked up by name in a process-wide registry, which starts out with the
//! built-in `internal` and `jing` validators.

pub mod internal;
pub mod jing;

pub use internal::InternalValidator;
pub use jing::JingValidator;

use crate::error::{Error, Result};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use std::sync::RwLock;
use url::Url;

/// Options shared by all validators
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidatorOptions {
    /// Include full diagnostics in errors and print them to stderr
    pub verbose: bool,
}

/// Outcome of a successful validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaValidationResult {
    /// Informational output of the validator
    pub messages: Vec<String>,
}

/// Checks RelaxNG schemas
pub trait SchemaValidator {
    /// Registered name
    fn name(&self) -> &'static str;

    /// Validate the schema at `location`
    fn validate(&self, location: &Url) -> Result<SchemaValidationResult>;
}

/// Constructor stored in the registry
pub type ValidatorFactory = fn(ValidatorOptions) -> Box<dyn SchemaValidator + Send + Sync>;

static REGISTRY: Lazy<RwLock<IndexMap<String, ValidatorFactory>>> = Lazy::new(|| {
    let mut validators: IndexMap<String, ValidatorFactory> = IndexMap::new();
    validators.insert("internal".to_string(), |options| {
        Box::new(InternalValidator::new(options))
    });
    validators.insert("jing".to_string(), |options| Box::new(JingValidator::new(options)));
    RwLock::new(validators)
});

/// Register `factory` under `name`, replacing any validator of that name
pub fn register_validator(name: &str, factory: ValidatorFactory) {
    let mut registry = REGISTRY.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    registry.insert(name.to_string(), factory);
}

/// Build the validator registered under `name`
pub fn make_validator(name: &str, options: ValidatorOptions) -> Result<Box<dyn SchemaValidator + Send + Sync>> {
    let registry = REGISTRY.read().unwrap_or_else(|poisoned| poisoned.into_inner());
    let factory = registry.get(name).ok_or_else(|| {
        Error::UnsupportedOption(format!(
            "unknown validator '{}' (expected one of: {})",
            name,
            registry.keys().cloned().collect::<Vec<_>>().join(", ")
        ))
    })?;
    Ok(factory(options))
}

/// Names of all registered validators, in registration order
pub fn validator_names() -> Vec<String> {
    let registry = REGISTRY.read().unwrap_or_else(|poisoned| poisoned.into_inner());
    registry.keys().cloned().collect()
}
