//! Core types shared across the compilation pipeline.
//!
//! This module provides the error taxonomy ([`CumuloError`], [`ErrorContext`])
//! and the source-location type attached to every declaration and diagnostic.

pub mod error;
pub mod location;

pub use error::{CumuloError, ErrorContext, user_friendly_error};
pub use location::SourceLocation;
