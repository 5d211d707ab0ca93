//! In-process simplification

use super::steps::{document_element, Step, StepContext};
use super::{
    check_options, timed, Capabilities, ManifestEntry, SimplificationResult, Simplifier,
    SimplifierOptions,
};
use crate::error::{Result, SchemaValidationError};
use crate::limits::Limits;
use crate::loaders::ResourceLoader;
use crate::locations::display;
use crate::reader::parse_with_limits;
use crate::validation;
use url::Url;

/// Runs every pass in process
#[derive(Debug)]
pub struct InternalSimplifier<L> {
    options: SimplifierOptions,
    loader: L,
    limits: Limits,
}

impl<L> Capabilities for InternalSimplifier<L> {
    const VALIDATE: bool = true;
    const CREATE_MANIFEST: bool = true;
}

impl<L: ResourceLoader> InternalSimplifier<L> {
    /// Create the strategy
    pub fn new(options: SimplifierOptions, loader: L) -> Result<Self> {
        check_options::<Self>("internal", &options)?;
        Ok(Self {
            options,
            loader,
            limits: Limits::default(),
        })
    }

    /// Set the limits applied while loading and parsing
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Options in effect
    pub fn options(&self) -> &SimplifierOptions {
        &self.options
    }
}

impl<L: ResourceLoader> Simplifier for InternalSimplifier<L> {
    fn name(&self) -> &'static str {
        "internal"
    }

    fn simplify(&self, location: &Url) -> Result<SimplificationResult> {
        let options = &self.options;
        let mut timings = Vec::new();
        let mut ctx = StepContext::new(&self.loader, &self.limits);

        if options.is_verbose() {
            eprintln!("Simplifying {}", display(location));
        }
        ctx.enter(location)?;
        let resource = timed(options, "load", &mut timings, || self.loader.load(location))?;
        let mut tree = timed(options, "parse", &mut timings, || {
            parse_with_limits(resource.text(), Some(location), &self.limits)
        })?;

        for step in Step::ALL {
            timed(options, step.name(), &mut timings, || step.run(&mut tree, &mut ctx))?;
        }
        ctx.leave();

        if options.validate {
            let findings = validation::check(&tree);
            if !findings.is_empty() {
                let details = findings
                    .iter()
                    .map(|f| f.to_string())
                    .collect::<Vec<_>>()
                    .join("\n");
                return Err(SchemaValidationError::new(format!(
                    "{} is not a valid simplified grammar ({} problems)",
                    display(location),
                    findings.len()
                ))
                .with_details(details)
                .verbose(options.is_verbose())
                .into());
            }
        }

        let mut warnings = Vec::new();
        let root = document_element(&tree)?;
        if tree.element_count(root) == 1 {
            warnings.push("grammar defines no elements".to_string());
        }

        let manifest = if options.create_manifest {
            ctx.loaded
                .iter()
                .map(|url| ManifestEntry {
                    url: url.to_string(),
                })
                .collect()
        } else {
            Vec::new()
        };

        Ok(SimplificationResult {
            tree,
            manifest,
            timings,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::loaders::MemoryLoader;
    use crate::writer::node_to_xml;

    const MAIN: &str = "memory:/main.rng";

    fn loader() -> MemoryLoader {
        MemoryLoader::new()
            .with_resource(
                MAIN,
                r#"<grammar xmlns="http://relaxng.org/ns/structure/1.0">
                    <start><element name="doc"><ref name="body"/></element></start>
                    <define name="body"><externalRef href="body.rng"/></define>
                </grammar>"#,
            )
            .with_resource(
                "memory:/body.rng",
                r#"<zeroOrMore xmlns="http://relaxng.org/ns/structure/1.0"><element name="p"><text/></element></zeroOrMore>"#,
            )
    }

    #[test]
    fn test_simplify_with_manifest_and_timing() {
        let options = SimplifierOptions::new()
            .with_manifest(true)
            .with_validate(true)
            .with_timing(true);
        let simplifier = InternalSimplifier::new(options, loader()).unwrap();
        let result = simplifier.simplify(&Url::parse(MAIN).unwrap()).unwrap();

        let urls: Vec<_> = result.manifest.iter().map(|m| m.url.as_str()).collect();
        assert_eq!(urls, vec![MAIN, "memory:/body.rng"]);
        assert_eq!(result.timings.len(), Step::ALL.len() + 2);
        assert_eq!(result.timings[0].step, "load");
        assert!(result.warnings.is_empty());

        let root = result.tree.root().unwrap();
        let xml = node_to_xml(&result.tree, root, false).unwrap();
        assert!(xml.starts_with(r#"<grammar xmlns="http://relaxng.org/ns/structure/1.0"><start><ref name="doc-element"/></start>"#), "{}", xml);
        assert!(xml.contains(r#"<choice><empty/><oneOrMore><ref name="p-element"/></oneOrMore></choice>"#), "{}", xml);
    }

    #[test]
    fn test_no_manifest_unless_requested() {
        let simplifier = InternalSimplifier::new(SimplifierOptions::new(), loader()).unwrap();
        let result = simplifier.simplify(&Url::parse(MAIN).unwrap()).unwrap();
        assert!(result.manifest.is_empty());
        assert!(result.timings.is_empty());
    }

    #[test]
    fn test_errors_propagate() {
        let loader = MemoryLoader::new().with_resource(
            MAIN,
            r#"<grammar xmlns="http://relaxng.org/ns/structure/1.0"><start><ref name="nope"/></start></grammar>"#,
        );
        let simplifier = InternalSimplifier::new(SimplifierOptions::new(), loader).unwrap();
        let err = simplifier.simplify(&Url::parse(MAIN).unwrap()).unwrap_err();
        assert!(matches!(err, Error::MalformedGrammar(_)));
    }

    #[test]
    fn test_not_allowed_start_warns() {
        let loader = MemoryLoader::new().with_resource(
            MAIN,
            r#"<choice xmlns="http://relaxng.org/ns/structure/1.0"><notAllowed/><notAllowed/></choice>"#,
        );
        let simplifier = InternalSimplifier::new(SimplifierOptions::new(), loader).unwrap();
        let result = simplifier.simplify(&Url::parse(MAIN).unwrap()).unwrap();
        assert_eq!(result.warnings, vec!["grammar defines no elements"]);
    }
}
