//! Pipeline orchestration.
//!
//! Stage order is fixed: scan, extract references, validate, resolve
//! attributes, extract values, assemble. The static stages (everything up
//! to validation) are grouped into [`discover`] so the read-only commands
//! (`list`, `graph`) can stop there; [`compile`] takes a clean graph
//! through the remaining dynamic stages.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::assembler::{self, Document};
use crate::config::ScanConfig;
use crate::extractor;
use crate::graph::{DeclarationGraph, extract::extract_references, resolve, validate};
use crate::scanner::scan_package;

/// Run the static stages: scan the sources, record references, validate
/// them. The returned graph carries all discovery diagnostics; callers
/// decide whether to report and stop or to proceed.
pub fn discover(roots: &[PathBuf], recursive: bool, config: &ScanConfig) -> Result<DeclarationGraph> {
    let scan = scan_package(roots, recursive)?;
    let mut graph = DeclarationGraph::from_scan(scan);
    extract_references(&mut graph, config);
    validate::validate_references(&mut graph);
    debug!(
        target: "scan",
        "Discovered {} declaration(s), {} edge(s), {} diagnostic(s)",
        graph.len(),
        graph.edges.len(),
        graph.diagnostics.len()
    );
    Ok(graph)
}

/// Run the dynamic stages against a diagnostics-free graph: resolve
/// attribute references, extract values through the bridge program, and
/// assemble the document.
pub async fn compile(
    graph: &DeclarationGraph,
    target_dir: &Path,
    config: &ScanConfig,
    timeout: Option<Duration>,
    description: Option<String>,
) -> Result<Document> {
    let resolved = resolve::resolve_all(graph);
    let targets: Vec<extractor::BridgeTarget> =
        graph.declarations().map(extractor::BridgeTarget::from).collect();
    let values = extractor::extract_values(target_dir, &targets, timeout).await?;
    assembler::assemble(graph, &resolved, values, config, description)
}
