//! Unit test suite.
//!
//! Cross-module behaviors that need more than one pipeline stage but no
//! subprocess: discovery over multi-file fixtures, bridge codegen output,
//! and assembly against injected values.

mod assembly;
mod bridge_codegen;
mod discovery;
