//! End-to-end value extraction against a real cargo toolchain.
//!
//! These tests build and run an actual bridge crate, so they need cargo on
//! the machine (and registry access for serde_json). When cargo is missing
//! they skip instead of failing, which keeps the suite runnable in
//! stripped-down environments.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;

use cumulo_cli::config::ScanConfig;
use cumulo_cli::extractor::{self, BridgeTarget};
use cumulo_cli::pipeline;

fn cargo_available() -> bool {
    which::which("cargo").is_ok()
}

/// A self-contained package whose declarations return plain strings, so the
/// bridge can serialize them without the package pulling in serde itself.
fn fixture_package() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "Cargo.toml",
        r#"[package]
name = "fixture-stack"
version = "0.1.0"
edition = "2021"

[workspace]
"#,
    );
    write(
        dir.path(),
        "src/lib.rs",
        r#"pub mod naming;

pub type Output = String;

pub fn stack_name() -> Output {
    "demo".to_string()
}
"#,
    );
    write(
        dir.path(),
        "src/naming.rs",
        r#"pub type Parameter = String;

pub fn env_name() -> Parameter {
    "dev".to_string()
}
"#,
    );
    dir
}

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

#[tokio::test]
async fn test_extract_values_runs_the_bridge_program() {
    if !cargo_available() {
        eprintln!("cargo not found; skipping extraction test");
        return;
    }

    let dir = fixture_package();
    let graph = pipeline::discover(
        &[dir.path().to_path_buf()],
        true,
        &ScanConfig::default(),
    )
    .unwrap();
    assert!(!graph.has_errors());

    // Targets come out of discovery, module paths included, so a
    // declaration living below the crate root exercises the full dispatch
    // path through the generated program.
    let targets: Vec<BridgeTarget> = graph.declarations().map(BridgeTarget::from).collect();
    assert_eq!(targets.len(), 2);

    let values =
        extractor::extract_values(dir.path(), &targets, Some(Duration::from_secs(300)))
            .await
            .unwrap();

    assert_eq!(values["stack_name"], json!("demo"));
    assert_eq!(values["env_name"], json!("dev"));
}

#[tokio::test]
async fn test_extraction_build_failure_surfaces_compiler_output() {
    if !cargo_available() {
        eprintln!("cargo not found; skipping extraction test");
        return;
    }

    let dir = fixture_package();
    // Ask for a declaration the package does not define; the bridge fails
    // to compile and the rustc diagnostics come back in the error.
    let targets = vec![BridgeTarget {
        name: "missing_bucket".to_string(),
        module_path: Vec::new(),
    }];

    let err = extractor::extract_values(dir.path(), &targets, Some(Duration::from_secs(300)))
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("bridge program did not compile"), "unexpected error: {message}");
}
