//! Validation with the Jing command-line tool

use super::{SchemaValidationResult, SchemaValidator, ValidatorOptions};
use crate::error::{LoadError, Result, SchemaValidationError};
use crate::process::{run_piped, scrub_stderr};
use url::Url;

/// Runs `jing <schema>` on local schemas
#[derive(Debug, Clone)]
pub struct JingValidator {
    options: ValidatorOptions,
    program: String,
}

impl JingValidator {
    /// Create the validator using the `jing` found on `PATH`
    pub fn new(options: ValidatorOptions) -> Self {
        Self {
            options,
            program: "jing".to_string(),
        }
    }

    /// Use another program or path for Jing
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

impl SchemaValidator for JingValidator {
    fn name(&self) -> &'static str {
        "jing"
    }

    fn validate(&self, location: &Url) -> Result<SchemaValidationResult> {
        if location.scheme() != "file" {
            return Err(LoadError::UnsupportedScheme {
                scheme: location.scheme().to_string(),
                url: location.to_string(),
            }
            .into());
        }
        let path = location.to_file_path().map_err(|_| LoadError::UnsupportedScheme {
            scheme: location.scheme().to_string(),
            url: location.to_string(),
        })?;

        let args = vec![path.display().to_string()];
        let output = run_piped(&self.program, &args, "")?;
        // Jing reports schema errors on stdout and its own failures on stderr
        let diagnostics = scrub_stderr(&format!("{}\n{}", output.stdout, output.stderr));

        if !output.status.success() {
            return Err(SchemaValidationError::new(format!(
                "{} rejected {}",
                self.program,
                path.display()
            ))
            .with_details(diagnostics)
            .verbose(self.options.verbose)
            .into());
        }
        Ok(SchemaValidationResult {
            messages: diagnostics.lines().map(str::to_string).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_rejects_remote_before_spawning() {
        let validator = JingValidator::new(ValidatorOptions::default())
            .with_program("definitely-not-a-real-program-7f3a");
        let url = Url::parse("http://example.com/schema.rng").unwrap();
        let err = validator.validate(&url).unwrap_err();
        assert!(matches!(err, Error::Load(LoadError::UnsupportedScheme { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_status_decides() {
        let url = Url::parse("file:///tmp/schema.rng").unwrap();

        let passing = JingValidator::new(ValidatorOptions::default()).with_program("true");
        assert!(passing.validate(&url).unwrap().messages.is_empty());

        let failing = JingValidator::new(ValidatorOptions::default()).with_program("false");
        let err = failing.validate(&url).unwrap_err();
        assert!(matches!(err, Error::SchemaValidation(_)));
    }
}
