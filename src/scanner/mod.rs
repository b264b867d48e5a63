//! Source discovery for declaration packages.
//!
//! The scanner walks one or more crate roots, parses every Rust source file
//! with `syn`, and produces [`Declaration`] records for each public
//! zero-parameter function whose return type names a template entity. It
//! also records the names of local helper functions (private, parameterized,
//! or returning a plain unqualified type) so the reference extractor can
//! avoid flagging them as cross-declaration references.
//!
//! Parse failures are fatal to the offending file only: sibling files are
//! still processed and the failure is recorded as a diagnostic, but the
//! overall scan result is marked failed so callers never hand a partial
//! graph to the extraction step. Duplicate declaration names produce one
//! diagnostic per extra occurrence, citing the first definition's location.

pub mod expr;

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::core::{CumuloError, SourceLocation};
use expr::Expr;

/// The template section a declaration belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum DeclarationKind {
    /// An infrastructure resource (`s3::Bucket`, `iam::Role`, ...).
    Resource,
    /// A template input parameter.
    Parameter,
    /// A template output.
    Output,
    /// A lookup mapping.
    Mapping,
    /// A named condition.
    Condition,
}

impl DeclarationKind {
    /// Classify a return type by its path segments.
    ///
    /// Single-segment kind names map to their section; any other qualified
    /// path is a resource. Single-segment names that are not kinds return
    /// `None` - those functions are local helpers, not declarations.
    #[must_use]
    pub fn classify(type_path: &[String]) -> Option<Self> {
        match type_path {
            [single] => match single.as_str() {
                "Parameter" => Some(Self::Parameter),
                "Output" => Some(Self::Output),
                "Mapping" => Some(Self::Mapping),
                "Condition" => Some(Self::Condition),
                _ => None,
            },
            [] => None,
            _ => match type_path.last().map(String::as_str) {
                Some("Parameter") => Some(Self::Parameter),
                Some("Output") => Some(Self::Output),
                Some("Mapping") => Some(Self::Mapping),
                Some("Condition") => Some(Self::Condition),
                _ => Some(Self::Resource),
            },
        }
    }

    /// Human-readable kind name, as shown by `cumulo list`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Resource => "resource",
            Self::Parameter => "parameter",
            Self::Output => "output",
            Self::Mapping => "mapping",
            Self::Condition => "condition",
        }
    }
}

/// One named, typed value discovered in the target package.
#[derive(Debug, Clone)]
pub struct Declaration {
    /// Function identifier; unique per package scope.
    pub name: String,
    /// Module segments from the crate root to the declaring module: the
    /// source file's path relative to `src/` plus any inline modules. The
    /// bridge program needs this to call the function by its full path.
    pub module_path: Vec<String>,
    /// Which template section the declaration belongs to.
    pub kind: DeclarationKind,
    /// Return type path segments (e.g. `["s3", "Bucket"]`).
    pub type_path: Vec<String>,
    /// Definition site.
    pub location: SourceLocation,
    /// Lowered trailing expression of the function body.
    pub initializer: Expr,
    /// Other expressions in the body (let bindings etc.), scanned for
    /// references without field-path tracking.
    pub support_exprs: Vec<Expr>,
}

/// Result of scanning a package scope.
#[derive(Debug, Default)]
pub struct PackageScan {
    /// Declarations in discovery order (files sorted, then source order).
    pub declarations: Vec<Declaration>,
    /// Names of local helper functions, used by the reference extractor.
    pub local_helpers: BTreeSet<String>,
    /// Accumulated parse and duplicate-name diagnostics.
    pub diagnostics: Vec<CumuloError>,
    /// True when any file failed to parse; blocks extraction.
    pub failed: bool,
}

/// Scan one or more package roots for declarations.
///
/// Each root is either a crate directory (its `src/` is scanned) or a plain
/// directory of source files. With `recursive` set, subdirectories are
/// included; otherwise only the top level of each scanned directory.
pub fn scan_package(roots: &[PathBuf], recursive: bool) -> Result<PackageScan> {
    let mut scan = PackageScan::default();

    let mut files: Vec<(PathBuf, Vec<String>)> = Vec::new();
    for root in roots {
        collect_source_files(root, recursive, &mut files)
            .with_context(|| format!("Failed to scan package root {}", root.display()))?;
    }
    files.sort();
    files.dedup_by(|a, b| a.0 == b.0);

    debug!(target: "scan", "Scanning {} source files", files.len());

    for (file, module_path) in &files {
        scan_file(file, module_path, &mut scan);
    }

    detect_duplicates(&mut scan);
    Ok(scan)
}

fn collect_source_files(
    root: &Path,
    recursive: bool,
    out: &mut Vec<(PathBuf, Vec<String>)>,
) -> Result<()> {
    let dir = if root.join("src").is_dir() {
        root.join("src")
    } else {
        root.to_path_buf()
    };

    let max_depth = if recursive { usize::MAX } else { 1 };
    for entry in WalkDir::new(&dir).max_depth(max_depth).into_iter().filter_entry(|e| {
        let name = e.file_name().to_string_lossy();
        // Skip build output, hidden directories, and bridge workspaces left
        // behind by an interrupted extraction.
        !(e.file_type().is_dir()
            && (name == "target" || name.starts_with('.') || name.starts_with("cumulo-bridge")))
    }) {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|ext| ext.to_str()) == Some("rs")
        {
            let module_path = file_module_path(&dir, entry.path());
            out.push((entry.path().to_path_buf(), module_path));
        }
    }
    Ok(())
}

/// Module segments a source file contributes relative to the crate root:
/// `src/buckets.rs` -> `["buckets"]`, `src/net/mod.rs` -> `["net"]`,
/// `src/lib.rs` -> `[]`.
fn file_module_path(scan_dir: &Path, file: &Path) -> Vec<String> {
    let rel = file.strip_prefix(scan_dir).unwrap_or(file);
    let mut segments: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    let Some(file_name) = segments.pop() else {
        return Vec::new();
    };
    let stem = file_name.trim_end_matches(".rs");
    if !matches!(stem, "lib" | "main" | "mod") {
        segments.push(stem.to_string());
    }
    segments
}

fn scan_file(path: &Path, module_path: &[String], scan: &mut PackageScan) {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            scan.diagnostics.push(CumuloError::ParseError {
                location: SourceLocation {
                    file: path.to_path_buf(),
                    line: 0,
                    column: 0,
                },
                reason: e.to_string(),
            });
            scan.failed = true;
            return;
        }
    };

    let ast = match syn::parse_file(&source) {
        Ok(ast) => ast,
        Err(e) => {
            let start = e.span().start();
            scan.diagnostics.push(CumuloError::ParseError {
                location: SourceLocation {
                    file: path.to_path_buf(),
                    line: start.line,
                    column: start.column + 1,
                },
                reason: e.to_string(),
            });
            scan.failed = true;
            return;
        }
    };

    scan_items(path, module_path, &ast.items, scan);
}

fn scan_items(path: &Path, module_path: &[String], items: &[syn::Item], scan: &mut PackageScan) {
    for item in items {
        match item {
            syn::Item::Fn(func) => scan_fn(path, module_path, func, scan),
            // Inline modules can hold declarations too.
            syn::Item::Mod(module) => {
                if let Some((_, items)) = &module.content {
                    let mut nested = module_path.to_vec();
                    nested.push(module.ident.to_string());
                    scan_items(path, &nested, items, scan);
                }
            }
            _ => {}
        }
    }
}

fn scan_fn(path: &Path, module_path: &[String], func: &syn::ItemFn, scan: &mut PackageScan) {
    let name = func.sig.ident.to_string();

    let is_public = matches!(func.vis, syn::Visibility::Public(_));
    let is_nullary = func.sig.inputs.is_empty() && func.sig.generics.params.is_empty();
    let type_path = return_type_path(&func.sig.output);

    let kind = if is_public && is_nullary {
        type_path.as_deref().and_then(DeclarationKind::classify)
    } else {
        None
    };

    let Some(kind) = kind else {
        scan.local_helpers.insert(name);
        return;
    };

    let location = SourceLocation::from_span(path, func.sig.ident.span());
    let (initializer, support_exprs) = expr::lower_body(&func.block);

    debug!(target: "scan", "Found {} declaration '{}' at {}", kind.as_str(), name, location);

    scan.declarations.push(Declaration {
        name,
        module_path: module_path.to_vec(),
        kind,
        type_path: type_path.unwrap_or_default(),
        location,
        initializer,
        support_exprs,
    });
}

fn return_type_path(output: &syn::ReturnType) -> Option<Vec<String>> {
    let syn::ReturnType::Type(_, ty) = output else {
        return None;
    };
    let syn::Type::Path(type_path) = &**ty else {
        return None;
    };
    Some(type_path.path.segments.iter().map(|s| s.ident.to_string()).collect())
}

/// Record one [`CumuloError::DuplicateDeclaration`] per extra occurrence of
/// a name, keeping the first definition in the scan result.
fn detect_duplicates(scan: &mut PackageScan) {
    let mut first_seen: Vec<(String, SourceLocation)> = Vec::new();
    let mut kept = Vec::with_capacity(scan.declarations.len());

    for decl in scan.declarations.drain(..) {
        match first_seen.iter().find(|(name, _)| *name == decl.name) {
            Some((_, first)) => scan.diagnostics.push(CumuloError::DuplicateDeclaration {
                name: decl.name.clone(),
                location: decl.location.clone(),
                first_defined: first.clone(),
            }),
            None => {
                first_seen.push((decl.name.clone(), decl.location.clone()));
                kept.push(decl);
            }
        }
    }

    scan.declarations = kept;
}
