//! Bridge workspace placement.
//!
//! The generated bridge crate normally lives in an isolated temporary
//! directory with an absolute path dependency back onto the target package.
//! Packages with vendored dependencies break that layout: their
//! `.cargo/config.toml` source replacement only applies inside the package
//! tree, so the bridge must be nested under the target itself. Nested
//! workspaces get a unique name per run so concurrent compilations of the
//! same package never collide.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// Where the bridge crate was materialized.
pub enum BridgeWorkspace {
    /// Temporary directory outside the target tree. Cleaned up on drop by
    /// [`TempDir`].
    Isolated(TempDir),
    /// Unique subdirectory inside the target tree, used when the target
    /// vendors its dependencies. Removed on drop.
    Nested(PathBuf),
}

impl BridgeWorkspace {
    /// Create a workspace appropriate for `target_dir` and write the bridge
    /// crate's sources into it.
    pub fn create(target_dir: &Path, manifest: &str, main_source: &str) -> Result<Self> {
        let workspace = if is_vendored(target_dir) {
            let dir = target_dir.join(format!(".cumulo-bridge-{}", uuid::Uuid::new_v4().simple()));
            debug!(
                target: "extract",
                "Target vendors dependencies; nesting bridge workspace at {}",
                dir.display()
            );
            std::fs::create_dir(&dir)
                .with_context(|| format!("Failed to create bridge workspace at {}", dir.display()))?;
            Self::Nested(dir)
        } else {
            let dir = tempfile::Builder::new()
                .prefix("cumulo-bridge-")
                .tempdir()
                .context("Failed to create temporary bridge workspace")?;
            debug!(target: "extract", "Bridge workspace at {}", dir.path().display());
            Self::Isolated(dir)
        };

        let root = workspace.path();
        std::fs::create_dir_all(root.join("src"))?;
        std::fs::write(root.join("Cargo.toml"), manifest)?;
        std::fs::write(root.join("src").join("main.rs"), main_source)?;
        Ok(workspace)
    }

    /// Root directory of the bridge crate.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Isolated(dir) => dir.path(),
            Self::Nested(dir) => dir,
        }
    }

    /// The path-dependency string pointing from the bridge crate back to
    /// the target package.
    pub fn dependency_path(target_dir: &Path) -> Result<String> {
        if is_vendored(target_dir) {
            // Nested directly under the target.
            return Ok("..".to_string());
        }
        let absolute = target_dir.canonicalize().with_context(|| {
            format!("Failed to resolve target package path {}", target_dir.display())
        })?;
        Ok(absolute.display().to_string())
    }
}

impl Drop for BridgeWorkspace {
    fn drop(&mut self) {
        if let Self::Nested(dir) = self {
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                debug!(target: "extract", "Failed to clean up bridge workspace {}: {e}", dir.display());
            }
        }
    }
}

/// A target is considered vendored when it carries a `vendor/` directory
/// alongside a cargo config that would redirect its sources.
fn is_vendored(target_dir: &Path) -> bool {
    target_dir.join("vendor").is_dir()
        && (target_dir.join(".cargo/config.toml").is_file()
            || target_dir.join(".cargo/config").is_file())
}
