//! Binary-level CLI tests and end-to-end extraction.
//!
//! The CLI scenarios run the compiled `cumulo` binary against throwaway
//! packages on disk and stop before any cargo subprocess. The extraction
//! scenarios do spawn cargo, skipping when no toolchain is installed.

mod cli;
mod extraction;
