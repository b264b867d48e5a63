//! Error handling for cumulo
//!
//! The error system is built around two types:
//! - [`CumuloError`] - enumerated error types for every failure mode in the
//!   compilation pipeline, from source discovery through value extraction
//! - [`ErrorContext`] - wrapper that adds user-friendly messages and
//!   actionable suggestions for CLI display
//!
//! # Error Categories
//!
//! - **Discovery**: [`CumuloError::ParseError`],
//!   [`CumuloError::DuplicateDeclaration`], [`CumuloError::UndefinedReference`]
//! - **Extraction**: [`CumuloError::ToolchainNotFound`],
//!   [`CumuloError::CargoCommandError`], [`CumuloError::ExtractionBuildFailed`],
//!   [`CumuloError::ExtractionRuntimeFailed`]
//! - **Assembly**: [`CumuloError::AssemblyError`]
//!
//! # Propagation Policy
//!
//! Discovery-time errors (parse failures, duplicate names, undefined
//! references) are *accumulated* on the declaration graph so callers can
//! report all of them at once. Extraction and assembly errors are fail-fast:
//! the first error aborts the step, and extraction never returns a partial
//! value set.
//!
//! Use [`user_friendly_error`] to convert any error into a display-ready
//! format with contextual suggestions.

use colored::Colorize;
use std::fmt;
use thiserror::Error;

use super::location::SourceLocation;

/// The main error type for cumulo operations.
///
/// Each variant carries enough context (file locations, declaration names,
/// subprocess output) to produce an actionable message without re-running
/// the pipeline.
#[derive(Error, Debug)]
pub enum CumuloError {
    /// A source file could not be parsed.
    ///
    /// Fatal to that file only; sibling files are still scanned, but the
    /// overall discovery result is marked failed.
    #[error("Syntax error in {location}: {reason}")]
    ParseError {
        /// Where parsing failed.
        location: SourceLocation,
        /// The parser's own message.
        reason: String,
    },

    /// Two declarations share a name within one package scope.
    ///
    /// One error is recorded per extra occurrence, citing the first
    /// definition's location.
    #[error("Duplicate declaration '{name}' at {location} (first defined at {first_defined})")]
    DuplicateDeclaration {
        /// The duplicated declaration name.
        name: String,
        /// Location of the extra occurrence.
        location: SourceLocation,
        /// Location of the first definition.
        first_defined: SourceLocation,
    },

    /// A recorded dependency edge points at a name with no matching
    /// declaration anywhere in the package scope.
    #[error("Undefined reference to '{name}' in declaration '{owner}' at {location}")]
    UndefinedReference {
        /// The unresolved name.
        name: String,
        /// The declaration whose initializer contains the reference.
        owner: String,
        /// Location of the owning declaration.
        location: SourceLocation,
        /// Closest existing declaration name, if any is similar enough.
        suggestion: Option<String>,
    },

    /// The cargo binary could not be located on this host.
    #[error("cargo is not installed or not found in PATH")]
    ToolchainNotFound,

    /// A cargo invocation returned a non-zero exit code.
    #[error("Cargo operation failed: {operation}")]
    CargoCommandError {
        /// The cargo subcommand that failed (e.g. "build", "run").
        operation: String,
        /// Captured standard error from the command.
        stderr: String,
    },

    /// The generated bridge program (or the target package it links against)
    /// failed to compile. Fatal to the whole extraction step.
    #[error("Value extraction failed: bridge program did not compile")]
    ExtractionBuildFailed {
        /// Full compiler diagnostics.
        stderr: String,
    },

    /// The bridge program compiled but errored, panicked, timed out, or
    /// produced incomplete output. Fatal to the whole extraction step.
    #[error("Value extraction failed at runtime: {reason}")]
    ExtractionRuntimeFailed {
        /// What went wrong.
        reason: String,
        /// Captured standard error, when available.
        stderr: String,
    },

    /// The target package's Cargo.toml could not be read or understood.
    #[error("Invalid target manifest at {path}: {reason}")]
    TargetManifestError {
        /// Path to the manifest that failed.
        path: String,
        /// Specific reason for the failure.
        reason: String,
    },

    /// An internal consistency violation during template assembly: a
    /// reference recorded by static analysis has no matching position in the
    /// extracted value. Indicates a pipeline bug, not a user mistake.
    #[error("Template assembly error: {detail}")]
    AssemblyError {
        /// Description of the inconsistency.
        detail: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

impl Clone for CumuloError {
    fn clone(&self) -> Self {
        match self {
            Self::ParseError {
                location,
                reason,
            } => Self::ParseError {
                location: location.clone(),
                reason: reason.clone(),
            },
            Self::DuplicateDeclaration {
                name,
                location,
                first_defined,
            } => Self::DuplicateDeclaration {
                name: name.clone(),
                location: location.clone(),
                first_defined: first_defined.clone(),
            },
            Self::UndefinedReference {
                name,
                owner,
                location,
                suggestion,
            } => Self::UndefinedReference {
                name: name.clone(),
                owner: owner.clone(),
                location: location.clone(),
                suggestion: suggestion.clone(),
            },
            Self::ToolchainNotFound => Self::ToolchainNotFound,
            Self::CargoCommandError {
                operation,
                stderr,
            } => Self::CargoCommandError {
                operation: operation.clone(),
                stderr: stderr.clone(),
            },
            Self::ExtractionBuildFailed {
                stderr,
            } => Self::ExtractionBuildFailed {
                stderr: stderr.clone(),
            },
            Self::ExtractionRuntimeFailed {
                reason,
                stderr,
            } => Self::ExtractionRuntimeFailed {
                reason: reason.clone(),
                stderr: stderr.clone(),
            },
            Self::TargetManifestError {
                path,
                reason,
            } => Self::TargetManifestError {
                path: path.clone(),
                reason: reason.clone(),
            },
            Self::AssemblyError {
                detail,
            } => Self::AssemblyError {
                detail: detail.clone(),
            },
            // io::Error does not implement Clone, convert to Other
            Self::IoError(e) => Self::Other {
                message: format!("IO error: {e}"),
            },
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// Error context wrapper that provides user-friendly error information.
///
/// Wraps a [`CumuloError`] and adds optional suggestions and details. This
/// is the primary way cumulo presents errors to CLI users: the error itself
/// in red, details in yellow, suggestion in green.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error.
    pub error: CumuloError,
    /// Optional suggestion for resolving the error.
    pub suggestion: Option<String>,
    /// Optional additional details about the error.
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: CumuloError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add an actionable suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining why the error occurred.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable
/// suggestions.
///
/// Recognizes [`CumuloError`] variants and common IO failures; anything else
/// falls through to a generic context that preserves the full error chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(cumulo_error) = error.downcast_ref::<CumuloError>() {
        return create_error_context(cumulo_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(CumuloError::Other {
                    message: format!("Permission denied: {io_error}"),
                })
                .with_suggestion("Check file ownership, or run with elevated permissions")
                .with_details(
                    "cumulo needs read access to the target package and write access \
                     to its workspace directory",
                );
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(CumuloError::Other {
                    message: format!("File not found: {io_error}"),
                })
                .with_suggestion("Check that the package path exists and is spelled correctly");
            }
            _ => {}
        }
    }

    // Generic error - include the full error chain for better diagnostics
    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(CumuloError::Other {
        message,
    })
}

/// Create an [`ErrorContext`] with tailored suggestions for specific errors.
fn create_error_context(error: CumuloError) -> ErrorContext {
    match &error {
        CumuloError::ToolchainNotFound => ErrorContext::new(CumuloError::ToolchainNotFound)
            .with_suggestion(
                "Install Rust from https://rustup.rs/ or your package manager, and make sure \
                 'cargo' is in your PATH",
            )
            .with_details(
                "cumulo compiles and runs a small bridge program against your package to read \
                 declaration values, so a working cargo installation is required on this host",
            ),

        CumuloError::ParseError { location, .. } => ErrorContext::new(error.clone())
            .with_suggestion(format!(
                "Fix the syntax error in {} - run 'cargo check' in the package for the \
                 compiler's full diagnostics",
                location.file.display()
            )),

        CumuloError::UndefinedReference { name, suggestion, .. } => {
            let mut ctx = ErrorContext::new(error.clone()).with_details(
                "Every name referenced from a declaration initializer must resolve to another \
                 declaration in the same package scope, an intrinsic function, or a local helper",
            );
            ctx = if let Some(alt) = suggestion {
                ctx.with_suggestion(format!("Did you mean '{alt}'?"))
            } else {
                ctx.with_suggestion(format!(
                    "Declare '{name}' in the package, or add it to the intrinsic allow-list if \
                     it is a helper function"
                ))
            };
            ctx
        }

        CumuloError::DuplicateDeclaration { name, .. } => ErrorContext::new(error.clone())
            .with_suggestion(format!(
                "Rename one of the '{name}' declarations - logical names must be unique across \
                 all files of a package"
            )),

        CumuloError::ExtractionBuildFailed { stderr } => {
            ErrorContext::new(error.clone())
                .with_suggestion(
                    "Run 'cargo build' in the target package to reproduce the failure directly",
                )
                .with_details(stderr.clone())
        }

        CumuloError::ExtractionRuntimeFailed { stderr, .. } => {
            let ctx = ErrorContext::new(error.clone()).with_suggestion(
                "Declaration initializers run as ordinary Rust code during extraction; check \
                 them for panics, missing environment, or unbounded loops",
            );
            if stderr.is_empty() {
                ctx
            } else {
                ctx.with_details(stderr.clone())
            }
        }

        CumuloError::AssemblyError { .. } => ErrorContext::new(error.clone())
            .with_suggestion("This is a cumulo bug - please report it with the package source")
            .with_details(
                "Static analysis recorded a reference position that does not exist in the \
                 extracted runtime value",
            ),

        _ => ErrorContext::new(error.clone()),
    }
}
