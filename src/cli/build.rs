//! The `build` command: run the full compilation pipeline.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::config::ScanConfig;
use crate::{extractor, pipeline};

/// Template output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON.
    Json,
    /// YAML.
    Yaml,
}

/// Compile a package into a template document.
#[derive(Args)]
pub struct BuildCommand {
    /// Path to the target package (directory containing Cargo.toml)
    path: PathBuf,

    /// Only scan the top level of src/, ignoring subdirectories
    #[arg(long)]
    flat: bool,

    /// Write the document to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Template description embedded in the document
    #[arg(short, long)]
    description: Option<String>,

    /// Per-cargo-invocation timeout in seconds (0 disables the bound)
    #[arg(long, default_value_t = extractor::command_builder::DEFAULT_TIMEOUT.as_secs())]
    extraction_timeout: u64,
}

impl BuildCommand {
    /// Run discovery, extraction, and assembly, then serialize the result.
    pub async fn execute(self) -> Result<()> {
        let config = ScanConfig::default();
        let graph = pipeline::discover(std::slice::from_ref(&self.path), !self.flat, &config)?;
        super::report_diagnostics(&graph)?;

        if graph.is_empty() {
            anyhow::bail!(
                "no declarations found in {} - declarations are public zero-argument \
                 functions with a typed return",
                self.path.display()
            );
        }

        let timeout = match self.extraction_timeout {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        let document =
            pipeline::compile(&graph, &self.path, &config, timeout, self.description).await?;

        let rendered = match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&document)
                .context("Failed to serialize document as JSON")?,
            OutputFormat::Yaml => {
                serde_yaml::to_string(&document).context("Failed to serialize document as YAML")?
            }
        };

        match self.output {
            Some(path) => {
                std::fs::write(&path, rendered)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Template written to {}", path.display());
            }
            None => println!("{rendered}"),
        }
        Ok(())
    }
}
