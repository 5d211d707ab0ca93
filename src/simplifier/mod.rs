//! Grammar simplification
//!
//! A [`Simplifier`] loads a schema, parses it and threads the tree through
//! the passes of [`steps`] until it reaches simplified form. Two strategies
//! exist:
//!
//! - [`InternalSimplifier`] runs the passes in process and supports
//!   validation of the result and manifest creation.
//! - [`ExternalSimplifier`] pipes the serialized tree through an external
//!   command once per pass and supports neither.
//!
//! What a strategy supports is declared through [`Capabilities`] and checked
//! when the strategy is constructed, before any I/O happens.

pub mod external;
pub mod internal;
pub mod steps;

pub use external::{ExternalSimplifier, ExternalSimplifierConfig, ExternalStep};
pub use internal::InternalSimplifier;
pub use steps::Step;

use crate::error::{Error, Result};
use crate::loaders::ResourceLoader;
use crate::tree::Tree;
use serde::{Serialize, Serializer};
use std::time::{Duration, Instant};
use url::Url;

/// Options of a simplification run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimplifierOptions {
    /// Check the simplified grammar structurally
    pub validate: bool,
    /// Record every loaded resource
    pub create_manifest: bool,
    /// Report progress on stderr
    pub verbose: bool,
    /// Time each pass; implies `verbose`
    pub timing: bool,
}

impl SimplifierOptions {
    /// Create default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable validation
    pub fn with_validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Enable or disable the manifest
    pub fn with_manifest(mut self, create_manifest: bool) -> Self {
        self.create_manifest = create_manifest;
        self
    }

    /// Enable or disable verbose output
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Enable or disable pass timing; enabling it also enables verbose output
    pub fn with_timing(mut self, timing: bool) -> Self {
        self.timing = timing;
        if timing {
            self.verbose = true;
        }
        self
    }

    /// Whether progress is reported
    pub fn is_verbose(&self) -> bool {
        self.verbose || self.timing
    }
}

/// Wall-clock time spent in one pass
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    /// Pass name
    pub step: String,
    /// Elapsed time
    #[serde(rename = "millis", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_nanos() as f64 / 1_000_000.0)
}

/// A resource read during simplification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    /// Absolute URL of the resource
    pub url: String,
}

/// Outcome of a successful simplification
#[derive(Debug)]
pub struct SimplificationResult {
    /// The simplified grammar
    pub tree: Tree,
    /// Loaded resources in load order; empty unless requested
    pub manifest: Vec<ManifestEntry>,
    /// Per pass timings; empty unless requested
    pub timings: Vec<StepTiming>,
    /// Non-fatal remarks
    pub warnings: Vec<String>,
}

/// A simplification strategy
pub trait Simplifier {
    /// Name the strategy is registered under
    fn name(&self) -> &'static str;

    /// Simplify the schema at `location`
    fn simplify(&self, location: &Url) -> Result<SimplificationResult>;
}

/// Options a strategy can honor
pub trait Capabilities {
    /// Supports validating the simplified grammar
    const VALIDATE: bool;
    /// Supports recording loaded resources
    const CREATE_MANIFEST: bool;
}

/// Reject options the strategy `C` does not support
pub fn check_options<C: Capabilities>(name: &str, options: &SimplifierOptions) -> Result<()> {
    if options.validate && !C::VALIDATE {
        return Err(Error::UnsupportedOption(format!(
            "the {} simplifier cannot validate",
            name
        )));
    }
    if options.create_manifest && !C::CREATE_MANIFEST {
        return Err(Error::UnsupportedOption(format!(
            "the {} simplifier cannot create a manifest",
            name
        )));
    }
    Ok(())
}

/// Names accepted by [`make_simplifier`]
pub const SIMPLIFIER_NAMES: [&str; 2] = ["internal", "external"];

/// Build a strategy by name
pub fn make_simplifier<L>(name: &str, options: SimplifierOptions, loader: L) -> Result<Box<dyn Simplifier>>
where
    L: ResourceLoader + 'static,
{
    match name {
        "internal" => Ok(Box::new(InternalSimplifier::new(options, loader)?)),
        "external" => Ok(Box::new(ExternalSimplifier::new(
            options,
            loader,
            ExternalSimplifierConfig::default(),
        )?)),
        other => Err(Error::UnsupportedOption(format!(
            "unknown simplifier '{}' (expected one of: {})",
            other,
            SIMPLIFIER_NAMES.join(", ")
        ))),
    }
}

/// Run `f`, recording its duration under `step` when timing is on
pub(crate) fn timed<T>(
    options: &SimplifierOptions,
    step: &str,
    timings: &mut Vec<StepTiming>,
    f: impl FnOnce() -> Result<T>,
) -> Result<T> {
    if options.is_verbose() {
        eprintln!("Running {}...", step);
    }
    let started = Instant::now();
    let value = f()?;
    if options.timing {
        let duration = started.elapsed();
        eprintln!("  {}: {:.3} ms", step, duration.as_secs_f64() * 1000.0);
        timings.push(StepTiming {
            step: step.to_string(),
            duration,
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loaders::MemoryLoader;

    #[test]
    fn test_timing_forces_verbose() {
        let options = SimplifierOptions::new().with_timing(true);
        assert!(options.verbose);
        assert!(options.is_verbose());
        assert!(!SimplifierOptions::new().is_verbose());
    }

    #[test]
    fn test_make_simplifier_by_name() {
        let internal = make_simplifier("internal", SimplifierOptions::new(), MemoryLoader::new()).unwrap();
        assert_eq!(internal.name(), "internal");
        let external = make_simplifier("external", SimplifierOptions::new(), MemoryLoader::new()).unwrap();
        assert_eq!(external.name(), "external");
        assert!(matches!(
            make_simplifier("bogus", SimplifierOptions::new(), MemoryLoader::new()),
            Err(Error::UnsupportedOption(_))
        ));
    }

    #[test]
    fn test_external_rejects_validate_before_io() {
        let options = SimplifierOptions::new().with_validate(true);
        let err = make_simplifier("external", options, MemoryLoader::new()).err().unwrap();
        assert!(matches!(err, Error::UnsupportedOption(_)));

        let options = SimplifierOptions::new().with_manifest(true);
        assert!(make_simplifier("external", options, MemoryLoader::new()).is_err());
    }

    #[test]
    fn test_timing_serializes_as_millis() {
        let timing = StepTiming {
            step: "arity".to_string(),
            duration: Duration::from_millis(2),
        };
        let json = serde_json::to_value(&timing).unwrap();
        assert_eq!(json["step"], "arity");
        assert_eq!(json["millis"], 2.0);
    }
}
