//! Reference extraction from lowered initializer expressions.
//!
//! Walks every declaration's initializer and records each sub-expression
//! that denotes a reference to another declaration, distinguishing
//! whole-value references ([`DependencyEdge`]) from attribute references
//! ([`AttrRefUsage`]).
//!
//! The walk carries the current field path: struct-literal fields and
//! sequence elements extend it, because those positions map one-to-one onto
//! the serialized runtime value. Call arguments and opaque children clear
//! it - a reference found there is still recorded (and validated), but
//! cannot be substituted positionally by the assembler.
//!
//! Classification is deliberately heuristic: it trades false positives on
//! unusual helper shapes for recall of real cross-declaration references,
//! and the validator turns the unresolved remainder into user-visible
//! undefined-reference errors.

use std::path::Path;
use tracing::trace;

use super::{AttrRefUsage, DeclarationGraph, DependencyEdge, FieldPath};
use crate::config::ScanConfig;
use crate::core::SourceLocation;
use crate::scanner::expr::{Expr, ExprSpan};

/// Walk every declaration in the graph and record its references.
pub fn extract_references(graph: &mut DeclarationGraph, config: &ScanConfig) {
    let mut edges = Vec::new();
    let mut attr_refs = Vec::new();

    for decl in graph.declarations() {
        let mut walker = Walker {
            graph,
            config,
            owner: &decl.name,
            file: &decl.location.file,
            edges: &mut edges,
            attr_refs: &mut attr_refs,
        };
        walker.visit(&decl.initializer, Some(FieldPath::default()));
        for support in &decl.support_exprs {
            walker.visit(support, None);
        }
    }

    trace!(target: "scan", "Recorded {} edges, {} attribute usages", edges.len(), attr_refs.len());
    graph.edges = edges;
    graph.attr_refs = attr_refs;
}

struct Walker<'a> {
    graph: &'a DeclarationGraph,
    config: &'a ScanConfig,
    owner: &'a str,
    file: &'a Path,
    edges: &'a mut Vec<DependencyEdge>,
    attr_refs: &'a mut Vec<AttrRefUsage>,
}

impl Walker<'_> {
    fn visit(&mut self, expr: &Expr, path: Option<FieldPath>) {
        match expr {
            Expr::Lit(_) => {}

            Expr::Composite {
                fields,
                ..
            } => {
                // The type path itself is a type reference; only the field
                // values matter.
                for (field, value) in fields {
                    self.visit(value, path.as_ref().map(|p| p.with_key(field)));
                }
            }

            Expr::Sequence(elems) => {
                for (i, elem) in elems.iter().enumerate() {
                    self.visit(elem, path.as_ref().map(|p| p.with_index(i)));
                }
            }

            Expr::Call {
                path: callee,
                args,
                span,
            } => {
                self.classify_call(callee, *span, path);
                for arg in args {
                    self.visit(arg, None);
                }
            }

            Expr::Access {
                base,
                attr,
                args,
            } => {
                // `known_decl().attr()` is an attribute reference when the
                // accessor takes no arguments; anything else is an ordinary
                // method call whose receiver still needs scanning.
                let attr_target = if args.is_empty() {
                    base.as_bare_call().filter(|name| self.graph.contains(name)).zip(base.span())
                } else {
                    None
                };
                if let Some((name, span)) = attr_target {
                    match &path {
                        Some(p) => self.attr_refs.push(AttrRefUsage {
                            owner: self.owner.to_string(),
                            referenced: name.to_string(),
                            attribute: attr.clone(),
                            path: p.clone(),
                        }),
                        // Not substitutable, but the target name still gets
                        // validated.
                        None => {
                            let location = self.location_of(span);
                            self.edges.push(DependencyEdge {
                                from: self.owner.to_string(),
                                to: name.to_string(),
                                path: None,
                                location,
                            });
                        }
                    }
                    return;
                }
                self.visit(base, None);
                for arg in args {
                    self.visit(arg, None);
                }
            }

            Expr::Name {
                path: segments,
                span,
            } => {
                // Multi-segment names are qualified type or const references.
                if let [single] = segments.as_slice() {
                    self.classify_bare_name(single, *span, path);
                }
            }

            Expr::Wrapper(inner) => self.visit(inner, path),
            Expr::Index(base) => self.visit(base, None),

            Expr::Opaque(children) => {
                for child in children {
                    self.visit(child, None);
                }
            }
        }
    }

    fn classify_call(&mut self, callee: &[String], span: ExprSpan, path: Option<FieldPath>) {
        let [name] = callee else {
            // Qualified calls (`s3::bucket()`, `Tag::new()`) are type-scoped
            // constructors, not declaration references.
            return;
        };

        if self.graph.contains(name) {
            let location = self.location_of(span);
            self.edges.push(DependencyEdge {
                from: self.owner.to_string(),
                to: name.clone(),
                path,
                location,
            });
            return;
        }

        if self.config.is_intrinsic(name)
            || self.config.is_host_constructor(name)
            || self.graph.local_helpers.contains(name)
        {
            return;
        }

        // Unknown bare call: tentatively a declaration reference. The
        // validator reports it if nothing in the package scope matches.
        let location = self.location_of(span);
        self.edges.push(DependencyEdge {
            from: self.owner.to_string(),
            to: name.clone(),
            path,
            location,
        });
    }

    fn classify_bare_name(&mut self, name: &str, span: ExprSpan, path: Option<FieldPath>) {
        if self.graph.contains(name) {
            let location = self.location_of(span);
            self.edges.push(DependencyEdge {
                from: self.owner.to_string(),
                to: name.to_string(),
                path,
                location,
            });
            return;
        }

        // Bare lowercase names are local bindings; uppercase ones look like
        // constants or unit structs and are worth validating unless they are
        // allow-listed or host constructors (`None`, `Ok`).
        let looks_referential = name.chars().next().is_some_and(char::is_uppercase);
        if looks_referential
            && !self.config.is_intrinsic(name)
            && !self.config.is_host_constructor(name)
        {
            let location = self.location_of(span);
            self.edges.push(DependencyEdge {
                from: self.owner.to_string(),
                to: name.to_string(),
                path,
                location,
            });
        }
    }

    fn location_of(&self, span: ExprSpan) -> SourceLocation {
        SourceLocation {
            file: self.file.to_path_buf(),
            line: span.line,
            column: span.column,
        }
    }
}
