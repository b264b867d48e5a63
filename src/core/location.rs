//! Source locations attached to declarations and diagnostics.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// A position in a scanned source file.
///
/// Every declaration and every discovery-time diagnostic carries one of
/// these so errors can point back at the exact definition site. Lines and
/// columns are 1-based, matching rustc's own diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    /// File the item was found in.
    pub file: PathBuf,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number.
    pub column: usize,
}

impl SourceLocation {
    /// Build a location from a file path and a `proc-macro2` span.
    ///
    /// Span line/column information is available because the
    /// `span-locations` feature is enabled; proc-macro2 reports 0-based
    /// columns, which are shifted to 1-based here.
    pub fn from_span(file: &Path, span: proc_macro2::Span) -> Self {
        let start = span.start();
        Self {
            file: file.to_path_buf(),
            line: start.line,
            column: start.column + 1,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_format() {
        let loc = SourceLocation {
            file: PathBuf::from("src/stack.rs"),
            line: 42,
            column: 5,
        };
        assert_eq!(loc.to_string(), "src/stack.rs:42:5");
    }

    #[test]
    fn test_from_span_is_one_based() {
        // Parse a tiny item and check the ident span maps to line 1.
        let file: syn::File = syn::parse_str("fn first() {}").unwrap();
        let syn::Item::Fn(item) = &file.items[0] else {
            panic!("expected fn item");
        };
        let loc = SourceLocation::from_span(Path::new("lib.rs"), item.sig.ident.span());
        assert_eq!(loc.line, 1);
        assert!(loc.column >= 1);
    }
}
