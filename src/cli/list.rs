//! The `list` command: show discovered declarations.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use crate::config::ScanConfig;
use crate::pipeline;

/// List the declarations discovered in a package.
#[derive(Args)]
pub struct ListCommand {
    /// Path to the target package
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Only scan the top level of src/, ignoring subdirectories
    #[arg(long)]
    flat: bool,
}

impl ListCommand {
    /// Discover declarations and print them as a table.
    pub fn execute(self) -> Result<()> {
        let config = ScanConfig::default();
        let graph = pipeline::discover(std::slice::from_ref(&self.path), !self.flat, &config)?;
        super::report_diagnostics(&graph)?;

        if graph.is_empty() {
            println!("No declarations found in {}", self.path.display());
            return Ok(());
        }

        println!("{} declaration(s):\n", graph.len());
        for decl in graph.declarations() {
            println!(
                "  {} {:<10} {:<28} {}",
                decl.name.bold(),
                decl.kind.as_str().cyan(),
                decl.type_path.join("::"),
                decl.location.to_string().dimmed()
            );
        }
        Ok(())
    }
}
