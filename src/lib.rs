//! # cumulo
//!
//! Compile Rust declaration packages into infrastructure templates.
//!
//! A declaration is a public zero-argument function returning a typed
//! resource, parameter, output, mapping, or condition value. cumulo scans
//! a package's sources for such functions, records how their initializers
//! reference each other, validates and resolves those references, evaluates
//! the declarations through a generated bridge program, and assembles the
//! results into a single template document.
//!
//! ## Pipeline
//!
//! 1. [`scanner`] - parse sources, classify declarations by return type
//! 2. [`graph`] - reference extraction, validation, attribute resolution
//! 3. [`extractor`] - bridge program generation and execution via cargo
//! 4. [`assembler`] - intrinsic substitution and document construction
//!
//! [`pipeline`] composes the stages; [`cli`] exposes them as the `build`,
//! `list`, and `graph` commands.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assembler;
pub mod cli;
pub mod config;
pub mod core;
pub mod extractor;
pub mod graph;
pub mod pipeline;
pub mod scanner;
