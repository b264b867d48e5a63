//! The declaration graph: the contract object between pipeline stages.
//!
//! [`DeclarationGraph`] aggregates the scanner's declarations with the
//! dependency edges and attribute usages found by the reference extractor,
//! plus all accumulated discovery diagnostics. It is rebuilt from scratch on
//! every invocation; nothing persists between pipeline runs.

pub mod extract;
pub mod resolve;
pub mod validate;

use petgraph::graphmap::DiGraphMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::core::{CumuloError, SourceLocation};
use crate::scanner::{Declaration, PackageScan};

/// One step of a field path: a map key or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PathSeg {
    /// Struct-literal field name, as written in source (snake_case).
    Key(String),
    /// Sequence element position.
    Index(usize),
}

/// Where inside a declaration's initializer a reference was found.
///
/// Only positions reachable through struct-literal fields and sequence
/// elements get a path - those are the positions that map one-to-one onto
/// the serialized runtime value and can therefore be substituted by the
/// assembler.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FieldPath(pub Vec<PathSeg>);

impl FieldPath {
    /// Extend this path with a struct field.
    #[must_use]
    pub fn with_key(&self, key: &str) -> Self {
        let mut segs = self.0.clone();
        segs.push(PathSeg::Key(key.to_string()));
        Self(segs)
    }

    /// Extend this path with a sequence index.
    #[must_use]
    pub fn with_index(&self, index: usize) -> Self {
        let mut segs = self.0.clone();
        segs.push(PathSeg::Index(index));
        Self(segs)
    }

    /// Prepend `prefix`, used when resolving attribute chains through
    /// intermediate declarations.
    #[must_use]
    pub fn prefixed_with(&self, prefix: &Self) -> Self {
        let mut segs = prefix.0.clone();
        segs.extend(self.0.iter().cloned());
        Self(segs)
    }

    /// Whether the path is empty (the reference covers the whole value).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            match seg {
                PathSeg::Key(key) => {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{key}")?;
                }
                PathSeg::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// A recorded "this initializer references that declaration" relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    /// Declaration whose initializer holds the reference.
    pub from: String,
    /// Referenced name (validated against the graph later).
    pub to: String,
    /// Substitutable position, when the reference sits in mapped structure.
    pub path: Option<FieldPath>,
    /// Source position of the reference itself.
    pub location: SourceLocation,
}

/// A recorded "attribute `attribute` of `referenced` appears at `path`
/// inside `owner`'s initializer" relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrRefUsage {
    /// Declaration whose initializer holds the attribute reference.
    pub owner: String,
    /// The declaration whose attribute is referenced.
    pub referenced: String,
    /// Attribute name as written in source (snake_case method name).
    pub attribute: String,
    /// Position of the reference inside the owner's value.
    pub path: FieldPath,
}

/// Aggregate name-to-declaration map plus recorded reference relationships
/// and accumulated discovery diagnostics.
#[derive(Debug, Default)]
pub struct DeclarationGraph {
    declarations: BTreeMap<String, Declaration>,
    /// All dependency edges, in discovery order.
    pub edges: Vec<DependencyEdge>,
    /// All attribute usages, in discovery order.
    pub attr_refs: Vec<AttrRefUsage>,
    /// Parse, duplicate, and undefined-reference diagnostics.
    pub diagnostics: Vec<CumuloError>,
    /// True when discovery failed hard (parse errors); blocks extraction.
    pub failed: bool,
    /// Local helper names carried over from the scanner.
    pub local_helpers: std::collections::BTreeSet<String>,
}

impl DeclarationGraph {
    /// Build the graph from a completed package scan.
    #[must_use]
    pub fn from_scan(scan: PackageScan) -> Self {
        let mut graph = Self {
            failed: scan.failed,
            diagnostics: scan.diagnostics,
            local_helpers: scan.local_helpers,
            ..Self::default()
        };
        for decl in scan.declarations {
            graph.declarations.insert(decl.name.clone(), decl);
        }
        graph
    }

    /// Look up a declaration by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Declaration> {
        self.declarations.get(name)
    }

    /// Whether a declaration with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.declarations.contains_key(name)
    }

    /// All declarations, sorted by name.
    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.values()
    }

    /// All declaration names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.declarations.keys().map(String::as_str)
    }

    /// Number of declarations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// Whether the graph holds no declarations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Edges whose origin is `name` and that carry a substitutable path.
    ///
    /// These are the VarRef indirections the attribute resolver chains
    /// through.
    pub fn pathed_edges_from<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a DependencyEdge> {
        self.edges.iter().filter(move |e| e.from == name && e.path.is_some())
    }

    /// Attribute usages recorded directly on `name`.
    pub fn attr_refs_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a AttrRefUsage> {
        self.attr_refs.iter().filter(move |u| u.owner == name)
    }

    /// Petgraph view over the validated edges, for the `graph` command's
    /// cycle report and edge listing.
    #[must_use]
    pub fn petgraph_view(&self) -> DiGraphMap<&str, ()> {
        let mut view = DiGraphMap::new();
        for name in self.declarations.keys() {
            view.add_node(name.as_str());
        }
        for edge in &self.edges {
            if self.contains(&edge.to) && self.contains(&edge.from) {
                view.add_edge(edge.from.as_str(), edge.to.as_str(), ());
            }
        }
        view
    }

    /// Whether any diagnostic has been recorded.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}
