//! Command-line interface for rngsimplify

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use rngsimplify::loaders::FileLoader;
#[cfg(feature = "cli")]
use rngsimplify::locations::{display, to_url};
#[cfg(feature = "cli")]
use rngsimplify::simplifier::{
    make_simplifier, ExternalSimplifier, ExternalSimplifierConfig, SimplificationResult,
    Simplifier, SimplifierOptions,
};
#[cfg(feature = "cli")]
use rngsimplify::validators::{make_validator, validator_names, ValidatorOptions};
#[cfg(feature = "cli")]
use rngsimplify::writer::to_xml;

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "rngsimplify")]
#[command(author, version, about = "RelaxNG grammar simplification tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Simplify a RelaxNG schema and print the simplified grammar
    Simplify {
        /// Path or URL of the RelaxNG schema
        #[arg(value_name = "SCHEMA")]
        schema: String,

        /// Simplifier: internal or external
        #[arg(short, long, default_value = "internal")]
        simplifier: String,

        /// Directory holding one XSLT stylesheet per step (external simplifier)
        #[arg(long, value_name = "DIR")]
        stylesheets: Option<PathBuf>,

        /// Check the simplified grammar
        #[arg(long)]
        validate: bool,

        /// List every loaded resource
        #[arg(long)]
        manifest: bool,

        /// Time every pass (implies --verbose)
        #[arg(long)]
        timing: bool,

        /// Report progress on stderr
        #[arg(short, long)]
        verbose: bool,

        /// Output manifest, timings and warnings as JSON instead of the grammar
        #[arg(short, long)]
        json: bool,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check that a RelaxNG schema is correct
    Validate {
        /// Path or URL of the RelaxNG schema
        #[arg(value_name = "SCHEMA")]
        schema: String,

        /// Validator to use
        #[arg(long, default_value = "internal")]
        validator: String,

        /// Print full diagnostics
        #[arg(short, long)]
        verbose: bool,
    },
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Simplify {
            schema,
            simplifier,
            stylesheets,
            validate,
            manifest,
            timing,
            verbose,
            json,
            output,
        } => {
            let options = SimplifierOptions::new()
                .with_validate(validate)
                .with_manifest(manifest)
                .with_verbose(verbose)
                .with_timing(timing);
            cmd_simplify(schema, simplifier, stylesheets, options, json, output)
        }
        Commands::Validate {
            schema,
            validator,
            verbose,
        } => cmd_validate(schema, validator, verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn cmd_simplify(
    schema: String,
    simplifier_name: String,
    stylesheets: Option<PathBuf>,
    options: SimplifierOptions,
    json_output: bool,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let location = to_url(&schema)?;

    let simplifier: Box<dyn Simplifier> = match (simplifier_name.as_str(), stylesheets) {
        ("external", Some(dir)) => Box::new(ExternalSimplifier::new(
            options,
            FileLoader::new(),
            ExternalSimplifierConfig::xsltproc(dir),
        )?),
        (name, _) => make_simplifier(name, options, FileLoader::new())?,
    };
    let result = simplifier.simplify(&location)?;

    let text = if json_output {
        result_json(&result)?
    } else {
        to_xml(&result.tree)?
    };

    for warning in &result.warnings {
        eprintln!("Warning: {}", warning);
    }

    // Write output
    if let Some(output_path) = output {
        fs::write(output_path, &text)?;
    } else {
        println!("{}", text);
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn result_json(result: &SimplificationResult) -> Result<String, Box<dyn std::error::Error>> {
    let json = serde_json::json!({
        "manifest": result.manifest,
        "timings": result.timings,
        "warnings": result.warnings,
        "grammar": to_xml(&result.tree)?,
    });
    Ok(serde_json::to_string_pretty(&json)?)
}

#[cfg(feature = "cli")]
fn cmd_validate(schema: String, validator: String, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let location = to_url(&schema)?;
    let validator = make_validator(&validator, ValidatorOptions { verbose }).map_err(|e| {
        format!("{}; registered validators: {}", e, validator_names().join(", "))
    })?;

    let result = validator.validate(&location)?;
    println!("✓ {} is valid", display(&location));
    for message in &result.messages {
        println!("  - {}", message);
    }
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
