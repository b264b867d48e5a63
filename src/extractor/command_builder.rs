//! Type-safe cargo command builder for consistent subprocess execution.
//!
//! Provides a fluent API for building and executing cargo commands against
//! bridge workspaces, with captured output, bounded waits, and consistent
//! error mapping. User-declared initializers run with full trust inside the
//! bridge program, so every execution carries a timeout - a hung
//! declaration fails the extraction step instead of hanging the pipeline.

use anyhow::{Context, Result};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use super::toolchain::find_cargo;
use crate::core::CumuloError;

/// Default bound on a single cargo invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Builder for cargo invocations with captured output and a bounded wait.
///
/// ```rust,no_run
/// use cumulo_cli::extractor::command_builder::CargoCommand;
///
/// # async fn example() -> anyhow::Result<()> {
/// let output = CargoCommand::build()
///     .current_dir("/tmp/bridge-workspace")
///     .execute()
///     .await?;
/// println!("{}", output.stdout);
/// # Ok(())
/// # }
/// ```
pub struct CargoCommand {
    /// Arguments passed to cargo (e.g. ["build", "--quiet"]).
    args: Vec<String>,

    /// Working directory for the invocation (the bridge workspace root).
    current_dir: Option<std::path::PathBuf>,

    /// Environment variables to set for the cargo process.
    env_vars: Vec<(String, String)>,

    /// Maximum duration to wait for completion (None = no bound).
    timeout_duration: Option<Duration>,
}

impl Default for CargoCommand {
    fn default() -> Self {
        Self {
            args: Vec::new(),
            current_dir: None,
            env_vars: Vec::new(),
            timeout_duration: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl CargoCommand {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a `cargo build` command.
    pub fn build() -> Self {
        Self::new().args(["build", "--quiet"])
    }

    /// Create a `cargo run` command.
    pub fn run() -> Self {
        Self::new().args(["run", "--quiet"])
    }

    /// Set the working directory for the invocation.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add an environment variable for the cargo process.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }

    /// Set a custom timeout (None removes the bound entirely).
    pub const fn with_timeout(mut self, duration: Option<Duration>) -> Self {
        self.timeout_duration = duration;
        self
    }

    /// Execute the command and return the captured output.
    ///
    /// Non-zero exit codes map to [`CumuloError::CargoCommandError`]; a
    /// missing binary maps to [`CumuloError::ToolchainNotFound`]; an
    /// exceeded timeout maps to a command error naming the budget.
    pub async fn execute(self) -> Result<CargoOutput> {
        let start = std::time::Instant::now();
        let cargo = find_cargo();
        let mut cmd = Command::new(&cargo);
        cmd.args(&self.args);

        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.env_vars {
            cmd.env(key, value);
        }

        tracing::debug!(
            target: "cargo",
            "Executing command: {} {}",
            cargo.display(),
            self.args.join(" ")
        );

        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let operation = self.args.first().cloned().unwrap_or_else(|| "cargo".to_string());
        let output_future = cmd.output();

        let output = if let Some(duration) = self.timeout_duration {
            match timeout(duration, output_future).await {
                Ok(result) => map_spawn_error(result, &operation, &self.args)?,
                Err(_) => {
                    tracing::warn!(
                        target: "cargo",
                        "Command timed out after {} seconds: cargo {}",
                        duration.as_secs(),
                        self.args.join(" ")
                    );
                    return Err(CumuloError::CargoCommandError {
                        operation,
                        stderr: format!(
                            "cargo command timed out after {} seconds. Declaration \
                             initializers run as ordinary code during extraction and must \
                             terminate; raise --extraction-timeout if the package genuinely \
                             needs longer",
                            duration.as_secs()
                        ),
                    }
                    .into());
                }
            }
        } else {
            map_spawn_error(output_future.await, &operation, &self.args)?
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            tracing::debug!(
                target: "cargo",
                "Command failed with exit code {:?}: {}",
                output.status.code(),
                stderr.trim()
            );
            return Err(CumuloError::CargoCommandError {
                operation,
                stderr: if stderr.is_empty() { stdout } else { stderr },
            }
            .into());
        }

        let elapsed = start.elapsed();
        if elapsed.as_secs() > 1 {
            tracing::info!(
                target: "cargo::perf",
                "cargo {} took {:.2}s",
                operation,
                elapsed.as_secs_f64()
            );
        }

        Ok(CargoOutput {
            stdout,
            stderr,
        })
    }

    /// Execute and check for success, discarding output.
    pub async fn execute_success(self) -> Result<()> {
        self.execute().await?;
        Ok(())
    }
}

fn map_spawn_error(
    result: std::io::Result<std::process::Output>,
    operation: &str,
    args: &[String],
) -> Result<std::process::Output> {
    match result {
        Ok(output) => Ok(output),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(CumuloError::ToolchainNotFound.into())
        }
        Err(e) => Err(e).with_context(|| {
            format!("Failed to execute cargo {} ({})", args.join(" "), operation)
        }),
    }
}

/// Captured output from a cargo command.
pub struct CargoOutput {
    /// Standard output from the command.
    pub stdout: String,
    /// Standard error output from the command.
    pub stderr: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder_basic() {
        let cmd = CargoCommand::new().arg("build").arg("--quiet");
        assert_eq!(cmd.args, vec!["build", "--quiet"]);
    }

    #[test]
    fn test_build_and_run_presets() {
        assert_eq!(CargoCommand::build().args, vec!["build", "--quiet"]);
        assert_eq!(CargoCommand::run().args, vec!["run", "--quiet"]);
    }

    #[test]
    fn test_command_builder_with_dir() {
        let cmd = CargoCommand::build().current_dir("/tmp/bridge");
        assert_eq!(cmd.current_dir, Some(std::path::PathBuf::from("/tmp/bridge")));
    }

    #[test]
    fn test_default_timeout_is_bounded() {
        let cmd = CargoCommand::new();
        assert_eq!(cmd.timeout_duration, Some(DEFAULT_TIMEOUT));
    }

    #[test]
    fn test_timeout_override() {
        let cmd = CargoCommand::new().with_timeout(Some(Duration::from_secs(10)));
        assert_eq!(cmd.timeout_duration, Some(Duration::from_secs(10)));
    }
}
