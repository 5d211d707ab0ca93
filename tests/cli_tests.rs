//! CLI integration tests
//!
//! These tests verify the CLI commands work correctly by running the binary.

#![cfg(feature = "cli")]

use std::path::PathBuf;
use std::process::Command;

fn rngsimplify_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_rngsimplify"))
}

fn fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path.to_str().unwrap().to_string()
}

// ============================================================================
// Simplify Command Tests
// ============================================================================

#[test]
fn test_cli_simplify_basic() {
    let output = Command::new(rngsimplify_bin())
        .args(["simplify", &fixture("addressbook.rng")])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "simplify should succeed");
    assert!(stdout.starts_with("<grammar xmlns=\"http://relaxng.org/ns/structure/1.0\">"));
    assert!(stdout.contains("<ref name=\"addressBook-element\"/>"));
    assert!(!stdout.contains("include"));
}

#[test]
fn test_cli_simplify_json_output() {
    let output = Command::new(rngsimplify_bin())
        .args(["simplify", "--json", "--manifest", "--timing", &fixture("addressbook.rng")])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "simplify --json should succeed");
    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("output should be JSON");

    let manifest = json["manifest"].as_array().unwrap();
    assert_eq!(manifest.len(), 3);
    assert!(manifest[1]["url"].as_str().unwrap().ends_with("card.rng"));
    assert!(!json["timings"].as_array().unwrap().is_empty());
    assert!(json["grammar"].as_str().unwrap().contains("card-element"));

    // Timing implies verbose progress on stderr
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.is_empty());
}

#[test]
fn test_cli_simplify_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("simple.rng");

    let output = Command::new(rngsimplify_bin())
        .args(["simplify", &fixture("card.rng"), "-o", out.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    let written = std::fs::read_to_string(&out).unwrap();
    assert!(written.contains("<name ns=\"urn:cards\">card</name>"));
}

#[test]
fn test_cli_simplify_validate_failure() {
    let output = Command::new(rngsimplify_bin())
        .args(["simplify", "--validate", &fixture("nested_attribute.rng")])
        .output()
        .expect("Failed to execute command");

    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("Error:"));
}

#[test]
fn test_cli_external_rejects_validate() {
    let output = Command::new(rngsimplify_bin())
        .args(["simplify", "--simplifier", "external", "--validate", &fixture("card.rng")])
        .output()
        .expect("Failed to execute command");

    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("external"), "{}", stderr);
}

#[test]
fn test_cli_unknown_simplifier() {
    let output = Command::new(rngsimplify_bin())
        .args(["simplify", "--simplifier", "magic", &fixture("card.rng")])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
}

// ============================================================================
// Validate Command Tests
// ============================================================================

#[test]
fn test_cli_validate_valid() {
    let output = Command::new(rngsimplify_bin())
        .args(["validate", &fixture("addressbook.rng")])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("is valid"));
}

#[test]
fn test_cli_validate_loop() {
    let output = Command::new(rngsimplify_bin())
        .args(["validate", "--verbose", &fixture("loop.rng")])
        .output()
        .expect("Failed to execute command");

    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("references itself"), "{}", stderr);
}

#[test]
fn test_cli_validate_unknown_validator() {
    let output = Command::new(rngsimplify_bin())
        .args(["validate", "--validator", "magic", &fixture("card.rng")])
        .output()
        .expect("Failed to execute command");

    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("registered validators: internal, jing"), "{}", stderr);
}
