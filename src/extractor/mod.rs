//! Dynamic value extraction.
//!
//! Static analysis tells us which declarations exist and how they refer to
//! each other, but not what their initializers evaluate to. This module
//! closes that gap: it generates a bridge crate that calls every requested
//! declaration, compiles and runs it with cargo, and parses one JSON object
//! off stdout. Extraction is atomic - either every requested name comes
//! back with a value or the whole step fails.

pub mod bridge;
pub mod command_builder;
pub mod toolchain;
pub mod workspace;

use anyhow::Result;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::core::CumuloError;
pub use bridge::BridgeTarget;
use command_builder::CargoCommand;
use workspace::BridgeWorkspace;

/// Compile and run a bridge program against the package at `target_dir`,
/// returning the JSON value of every declaration in `targets`.
///
/// `timeout` bounds each cargo invocation separately (build and run);
/// `None` removes the bound.
pub async fn extract_values(
    target_dir: &Path,
    targets: &[BridgeTarget],
    timeout: Option<Duration>,
) -> Result<BTreeMap<String, Value>> {
    if targets.is_empty() {
        return Ok(BTreeMap::new());
    }

    let package = bridge::target_package_name(target_dir)?;
    let krate = bridge::crate_ident(&package);
    debug!(target: "extract", "Extracting {} declaration(s) from package '{package}'", targets.len());

    let manifest =
        bridge::generate_manifest(&package, &BridgeWorkspace::dependency_path(target_dir)?)?;
    let main_source = bridge::generate_main(&krate, targets)?;
    let workspace = BridgeWorkspace::create(target_dir, &manifest, &main_source)?;

    build_bridge(workspace.path(), timeout).await?;
    let stdout = run_bridge(workspace.path(), timeout).await?;

    let values = parse_output(&stdout)?;
    check_complete(&values, targets)?;

    info!(target: "extract", "Extracted {} value(s)", values.len());
    Ok(values)
}

async fn build_bridge(workspace: &Path, timeout: Option<Duration>) -> Result<()> {
    CargoCommand::build()
        .current_dir(workspace)
        .with_timeout(timeout)
        .execute_success()
        .await
        .map_err(|e| match e.downcast::<CumuloError>() {
            Ok(CumuloError::CargoCommandError { stderr, .. }) => {
                CumuloError::ExtractionBuildFailed { stderr }.into()
            }
            Ok(other) => other.into(),
            Err(other) => other,
        })
}

async fn run_bridge(workspace: &Path, timeout: Option<Duration>) -> Result<String> {
    let output = CargoCommand::run()
        .current_dir(workspace)
        .with_timeout(timeout)
        .execute()
        .await
        .map_err(|e| match e.downcast::<CumuloError>() {
            Ok(CumuloError::CargoCommandError { stderr, .. }) => {
                CumuloError::ExtractionRuntimeFailed {
                    reason: "bridge program exited with an error".to_string(),
                    stderr,
                }
                .into()
            }
            Ok(other) => other.into(),
            Err(other) => other,
        })?;
    Ok(output.stdout)
}

/// Parse the bridge program's stdout into a name-to-value map.
fn parse_output(stdout: &str) -> Result<BTreeMap<String, Value>> {
    let parsed: Value =
        serde_json::from_str(stdout.trim()).map_err(|e| CumuloError::ExtractionRuntimeFailed {
            reason: format!("bridge program produced invalid JSON: {e}"),
            stderr: String::new(),
        })?;

    match parsed {
        Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(CumuloError::ExtractionRuntimeFailed {
            reason: format!("bridge program produced a JSON {} instead of an object", json_kind(&other)),
            stderr: String::new(),
        }
        .into()),
    }
}

/// Extraction is all-or-nothing: every requested name must be present.
fn check_complete(values: &BTreeMap<String, Value>, targets: &[BridgeTarget]) -> Result<()> {
    let missing: Vec<&str> = targets
        .iter()
        .filter(|target| !values.contains_key(&target.name))
        .map(|target| target.name.as_str())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(CumuloError::ExtractionRuntimeFailed {
            reason: format!("bridge output is missing declaration(s): {}", missing.join(", ")),
            stderr: String::new(),
        }
        .into())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
