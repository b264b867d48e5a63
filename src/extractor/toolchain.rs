//! Cargo toolchain discovery.
//!
//! Value extraction shells out to cargo, so the binary has to be located
//! before a bridge workspace is worth building. Lookup order: the process
//! PATH, then the standard installation directories, then the bare command
//! name - in the last case execution itself produces the clear
//! [`ToolchainNotFound`](crate::core::CumuloError::ToolchainNotFound) error.

use std::path::PathBuf;
use tracing::{debug, warn};

/// Well-known cargo locations checked when PATH lookup fails.
fn fallback_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".cargo").join("bin").join(cargo_binary_name()));
    }
    candidates.push(PathBuf::from("/usr/local/bin").join(cargo_binary_name()));
    candidates.push(PathBuf::from("/usr/local/cargo/bin").join(cargo_binary_name()));
    candidates.push(PathBuf::from("/opt/homebrew/bin").join(cargo_binary_name()));
    candidates
}

const fn cargo_binary_name() -> &'static str {
    if cfg!(windows) { "cargo.exe" } else { "cargo" }
}

/// Locate the cargo binary to run bridge programs with.
///
/// Never fails: when nothing is found the bare name is returned and the
/// spawn failure is mapped to a toolchain error with installation guidance.
#[must_use]
pub fn find_cargo() -> PathBuf {
    if let Ok(path) = which::which("cargo") {
        debug!(target: "cargo", "Using cargo from PATH: {}", path.display());
        return path;
    }

    for candidate in fallback_candidates() {
        if candidate.is_file() {
            debug!(target: "cargo", "Using cargo from fallback location: {}", candidate.display());
            return candidate;
        }
    }

    warn!(target: "cargo", "cargo not found in PATH or known locations; trying bare command name");
    PathBuf::from(cargo_binary_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_cargo_returns_something_runnable_or_bare() {
        // Either a concrete path was found or the bare name fallback; both
        // end in the platform binary name.
        let cargo = find_cargo();
        assert_eq!(
            cargo.file_name().and_then(|n| n.to_str()),
            Some(cargo_binary_name())
        );
    }

    #[test]
    fn test_fallback_candidates_include_cargo_home() {
        if dirs::home_dir().is_some() {
            let candidates = fallback_candidates();
            assert!(candidates.iter().any(|c| c.to_string_lossy().contains(".cargo")));
        }
    }
}
