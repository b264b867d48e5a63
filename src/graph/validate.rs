//! Dependency edge validation.
//!
//! Confirms every recorded edge target exists somewhere in the package
//! scope. All violations are collected before returning - a package with
//! five typos gets five errors in one run, each with a closest-match
//! suggestion when an existing declaration name is similar enough.

use tracing::debug;

use super::DeclarationGraph;
use crate::core::CumuloError;

/// Minimum Jaro-Winkler similarity for a "did you mean" suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Validate every dependency edge against the graph, appending one
/// [`CumuloError::UndefinedReference`] per unresolved edge.
///
/// Returns the number of violations found.
pub fn validate_references(graph: &mut DeclarationGraph) -> usize {
    let mut violations = Vec::new();

    for edge in &graph.edges {
        if graph.contains(&edge.to) {
            continue;
        }

        violations.push(CumuloError::UndefinedReference {
            name: edge.to.clone(),
            owner: edge.from.clone(),
            location: edge.location.clone(),
            suggestion: closest_name(graph, &edge.to),
        });
    }

    let count = violations.len();
    if count > 0 {
        debug!(target: "scan", "{count} undefined reference(s)");
    }
    graph.diagnostics.extend(violations);
    count
}

/// Best fuzzy match among existing declaration names, if any clears the
/// similarity threshold.
fn closest_name(graph: &DeclarationGraph, unknown: &str) -> Option<String> {
    graph
        .names()
        .map(|name| (name, strsim::jaro_winkler(name, unknown)))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(name, _)| name.to_string())
}
