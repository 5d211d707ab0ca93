//! Validation through the in-process simplifier

use super::{SchemaValidationResult, SchemaValidator, ValidatorOptions};
use crate::error::{Error, Result, SchemaValidationError};
use crate::limits::Limits;
use crate::loaders::FileLoader;
use crate::simplifier::{InternalSimplifier, Simplifier, SimplifierOptions};
use url::Url;

/// Simplifies the schema with validation enabled
#[derive(Debug, Clone, Default)]
pub struct InternalValidator {
    options: ValidatorOptions,
    limits: Limits,
}

impl InternalValidator {
    /// Create the validator
    pub fn new(options: ValidatorOptions) -> Self {
        Self {
            options,
            limits: Limits::default(),
        }
    }

    /// Set the limits used while loading
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }
}

impl SchemaValidator for InternalValidator {
    fn name(&self) -> &'static str {
        "internal"
    }

    fn validate(&self, location: &Url) -> Result<SchemaValidationResult> {
        let options = SimplifierOptions::new()
            .with_validate(true)
            .with_verbose(self.options.verbose);
        let loader = FileLoader::new().with_limits(self.limits.clone());
        let simplifier = InternalSimplifier::new(options, loader)?.with_limits(self.limits.clone());

        match simplifier.simplify(location) {
            Ok(result) => Ok(SchemaValidationResult {
                messages: result.warnings,
            }),
            Err(Error::MalformedGrammar(e)) => Err(SchemaValidationError::new(format!(
                "{} is not a valid RelaxNG schema",
                location
            ))
            .with_details(e.to_string())
            .verbose(self.options.verbose)
            .into()),
            Err(Error::Name(message)) | Err(Error::Xml(message)) => {
                Err(SchemaValidationError::new(format!(
                    "{} is not a valid RelaxNG schema",
                    location
                ))
                .with_details(message)
                .verbose(self.options.verbose)
                .into())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn schema(text: &str) -> (NamedTempFile, Url) {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", text).unwrap();
        let url = Url::from_file_path(file.path()).unwrap();
        (file, url)
    }

    #[test]
    fn test_valid_schema() {
        let (_file, url) = schema(
            r#"<element name="doc" xmlns="http://relaxng.org/ns/structure/1.0"><text/></element>"#,
        );
        let validator = InternalValidator::new(ValidatorOptions::default());
        assert!(validator.validate(&url).is_ok());
    }

    #[test]
    fn test_invalid_schema_hides_details() {
        let (_file, url) = schema(
            r#"<grammar xmlns="http://relaxng.org/ns/structure/1.0"><start><ref name="nope"/></start></grammar>"#,
        );
        let err = InternalValidator::new(ValidatorOptions::default())
            .validate(&url)
            .unwrap_err();
        assert!(matches!(err, Error::SchemaValidation(_)));
        assert!(err.to_string().contains("rerun with verbose output"));
    }

    #[test]
    fn test_invalid_schema_verbose() {
        let (_file, url) = schema(
            r#"<grammar xmlns="http://relaxng.org/ns/structure/1.0"><start><ref name="nope"/></start></grammar>"#,
        );
        let err = InternalValidator::new(ValidatorOptions { verbose: true })
            .validate(&url)
            .unwrap_err();
        assert!(err.to_string().contains("undefined pattern 'nope'"));
    }

    #[test]
    fn test_prohibited_path_is_reported() {
        let (_file, url) = schema(
            r#"<element name="doc" xmlns="http://relaxng.org/ns/structure/1.0"><attribute name="a"><attribute name="b"/></attribute></element>"#,
        );
        let err = InternalValidator::new(ValidatorOptions { verbose: true })
            .validate(&url)
            .unwrap_err();
        assert!(err.to_string().contains("attribute is not allowed inside attribute"));
    }
}
