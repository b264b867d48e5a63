//! Command-line interface for cumulo.
//!
//! Each subcommand is a struct with an async `execute` method; this module
//! holds the top-level parser, the shared verbosity flags, and logging
//! initialization.

pub mod build;
pub mod graph;
pub mod list;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Compile Rust declaration packages into infrastructure templates.
#[derive(Parser)]
#[command(name = "cumulo", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase logging verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a package into a template document
    Build(build::BuildCommand),
    /// List the declarations discovered in a package
    List(list::ListCommand),
    /// Show dependency edges and report cycles
    Graph(graph::GraphCommand),
}

impl Cli {
    /// Parse arguments from the process environment.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Initialize tracing from the verbosity flags.
    ///
    /// `RUST_LOG` wins over the flags when set, so targeted filters like
    /// `RUST_LOG=cargo=trace` keep working.
    pub fn init_logging(&self) {
        let default_level = if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "debug",
                _ => "trace",
            }
        };

        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    /// Dispatch to the selected subcommand.
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Build(cmd) => cmd.execute().await,
            Commands::List(cmd) => cmd.execute(),
            Commands::Graph(cmd) => cmd.execute(),
        }
    }
}

/// Print accumulated discovery diagnostics through the friendly-error
/// formatter and fail.
pub(crate) fn report_diagnostics(graph: &crate::graph::DeclarationGraph) -> Result<()> {
    use crate::core::user_friendly_error;

    if !graph.has_errors() && !graph.failed {
        return Ok(());
    }
    let count = graph.diagnostics.len();
    for diagnostic in &graph.diagnostics {
        user_friendly_error(anyhow::Error::from(diagnostic.clone())).display();
        eprintln!();
    }
    anyhow::bail!("discovery failed with {count} error(s)")
}
