//! The `graph` command: dependency edges and cycle report.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use petgraph::algo::tarjan_scc;
use std::path::PathBuf;

use crate::config::ScanConfig;
use crate::pipeline;

/// Show dependency edges and report cycles.
#[derive(Args)]
pub struct GraphCommand {
    /// Path to the target package
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Only scan the top level of src/, ignoring subdirectories
    #[arg(long)]
    flat: bool,
}

impl GraphCommand {
    /// Discover declarations and print the edge list plus a cycle report.
    pub fn execute(self) -> Result<()> {
        let config = ScanConfig::default();
        let graph = pipeline::discover(std::slice::from_ref(&self.path), !self.flat, &config)?;
        super::report_diagnostics(&graph)?;

        if graph.edges.is_empty() {
            println!("No dependency edges in {}", self.path.display());
            return Ok(());
        }

        println!("{} edge(s):\n", graph.edges.len());
        for edge in &graph.edges {
            match &edge.path {
                Some(path) if !path.is_empty() => {
                    println!("  {} -> {}  ({})", edge.from.bold(), edge.to, path.to_string().dimmed());
                }
                _ => println!("  {} -> {}", edge.from.bold(), edge.to),
            }
        }

        let view = graph.petgraph_view();
        let cycles: Vec<Vec<&str>> = tarjan_scc(&view)
            .into_iter()
            .filter(|scc| scc.len() > 1 || (scc.len() == 1 && view.contains_edge(scc[0], scc[0])))
            .collect();

        if cycles.is_empty() {
            println!("\n{}", "No cycles.".green());
        } else {
            println!();
            for cycle in &cycles {
                println!("{} {}", "cycle:".red().bold(), cycle.join(" -> "));
            }
        }
        Ok(())
    }
}
