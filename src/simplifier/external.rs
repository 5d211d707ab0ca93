//! Simplification through an external command
//!
//! The tree is serialized, piped through one command invocation per step and
//! parsed back from the command's standard output. The usual setup is an XSLT
//! processor with one stylesheet per simplification step.

use super::{check_options, timed, Capabilities, SimplificationResult, Simplifier, SimplifierOptions};
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::loaders::ResourceLoader;
use crate::locations::display;
use crate::process::{run_piped, scrub_stderr};
use crate::reader::parse_with_limits;
use crate::simplifier::steps::Step;
use crate::writer::to_xml;
use std::path::Path;
use url::Url;

/// One invocation of the external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalStep {
    /// Name used in timings and diagnostics
    pub name: String,
    /// Arguments passed to the command
    pub args: Vec<String>,
}

/// Command and steps of an [`ExternalSimplifier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalSimplifierConfig {
    /// Program to run
    pub program: String,
    /// Steps in order
    pub steps: Vec<ExternalStep>,
}

impl ExternalSimplifierConfig {
    /// Run `xsltproc` with `<dir>/<step>.xsl` for every simplification step,
    /// reading the grammar from standard input
    pub fn xsltproc(stylesheets: impl AsRef<Path>) -> Self {
        let dir = stylesheets.as_ref();
        let steps = Step::ALL
            .iter()
            .map(|step| ExternalStep {
                name: step.name().to_string(),
                args: vec![
                    dir.join(format!("{}.xsl", step.name())).display().to_string(),
                    "-".to_string(),
                ],
            })
            .collect();
        Self {
            program: "xsltproc".to_string(),
            steps,
        }
    }
}

impl Default for ExternalSimplifierConfig {
    fn default() -> Self {
        Self::xsltproc("xsl")
    }
}

/// Pipes the grammar through an external command per step
#[derive(Debug)]
pub struct ExternalSimplifier<L> {
    options: SimplifierOptions,
    loader: L,
    config: ExternalSimplifierConfig,
    limits: Limits,
}

impl<L> Capabilities for ExternalSimplifier<L> {
    const VALIDATE: bool = false;
    const CREATE_MANIFEST: bool = false;
}

impl<L: ResourceLoader> ExternalSimplifier<L> {
    /// Create the strategy; fails on unsupported options or an empty step list
    pub fn new(options: SimplifierOptions, loader: L, config: ExternalSimplifierConfig) -> Result<Self> {
        check_options::<Self>("external", &options)?;
        if config.steps.is_empty() {
            return Err(Error::UnsupportedOption(
                "the external simplifier needs at least one step".to_string(),
            ));
        }
        Ok(Self {
            options,
            loader,
            config,
            limits: Limits::default(),
        })
    }

    /// Set the limits applied while parsing
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    fn run_step(&self, step: &ExternalStep, input: &str) -> Result<String> {
        let output = run_piped(&self.config.program, &step.args, input)?;
        if !output.status.success() {
            return Err(Error::Process {
                program: self.config.program.clone(),
                message: format!(
                    "step {} exited with {}: {}",
                    step.name,
                    output.status,
                    scrub_stderr(&output.stderr)
                ),
            });
        }
        if self.options.is_verbose() && !output.stderr.trim().is_empty() {
            eprintln!("{}", scrub_stderr(&output.stderr));
        }
        Ok(output.stdout)
    }
}

impl<L: ResourceLoader> Simplifier for ExternalSimplifier<L> {
    fn name(&self) -> &'static str {
        "external"
    }

    fn simplify(&self, location: &Url) -> Result<SimplificationResult> {
        let options = &self.options;
        let mut timings = Vec::new();

        if options.is_verbose() {
            eprintln!("Simplifying {} with {}", display(location), self.config.program);
        }
        let resource = timed(options, "load", &mut timings, || self.loader.load(location))?;
        let mut tree = timed(options, "parse", &mut timings, || {
            parse_with_limits(resource.text(), Some(location), &self.limits)
        })?;

        for step in &self.config.steps {
            tree = timed(options, &step.name, &mut timings, || {
                let input = to_xml(&tree)?;
                let output = self.run_step(step, &input)?;
                parse_with_limits(&output, Some(location), &self.limits)
            })?;
        }

        Ok(SimplificationResult {
            tree,
            manifest: Vec::new(),
            timings,
            warnings: Vec::new(),
        })
    }
}
