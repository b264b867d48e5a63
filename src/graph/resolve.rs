//! Attribute reference resolution through indirection chains.
//!
//! A declaration's attribute marker may not sit directly in its own
//! initializer: `output_value.value = handler` where `handler.role` carries
//! the actual `execution_role().arn()` reference. Resolution chains through
//! such whole-value indirections (VarRefs) and returns the innermost
//! concrete (declaration, attribute) pairs with field paths rebased onto
//! the starting declaration.
//!
//! A visited set keyed by declaration name makes the traversal cycle-safe:
//! revisiting a name already on the current resolution path terminates that
//! branch with no results instead of recursing unboundedly. Resolution is a
//! pure read of the graph, so running it twice yields identical results.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use super::{AttrRefUsage, DeclarationGraph};

/// Resolve the attribute references reachable from `name`, rebasing field
/// paths onto `name`'s own value.
#[must_use]
pub fn resolve_attr_refs(graph: &DeclarationGraph, name: &str) -> Vec<AttrRefUsage> {
    let mut visiting = BTreeSet::new();
    resolve_inner(graph, name, &mut visiting)
        .into_iter()
        .map(|mut usage| {
            usage.owner = name.to_string();
            usage
        })
        .collect()
}

/// Resolve attribute references for every declaration in the graph.
#[must_use]
pub fn resolve_all(graph: &DeclarationGraph) -> BTreeMap<String, Vec<AttrRefUsage>> {
    graph
        .names()
        .map(|name| (name.to_string(), resolve_attr_refs(graph, name)))
        .collect()
}

fn resolve_inner(
    graph: &DeclarationGraph,
    name: &str,
    visiting: &mut BTreeSet<String>,
) -> Vec<AttrRefUsage> {
    if !visiting.insert(name.to_string()) {
        // Already on the current path: cycle, terminate this branch.
        return Vec::new();
    }

    let direct: Vec<AttrRefUsage> = graph.attr_refs_of(name).cloned().collect();
    let result = if direct.is_empty() {
        // No direct attribute references; chain through whole-value
        // indirections and rebase the returned paths.
        let mut chained = Vec::new();
        for edge in graph.pathed_edges_from(name) {
            if !graph.contains(&edge.to) {
                continue;
            }
            let Some(prefix) = &edge.path else {
                continue;
            };
            for mut usage in resolve_inner(graph, &edge.to, visiting) {
                usage.path = usage.path.prefixed_with(prefix);
                chained.push(usage);
            }
        }
        chained
    } else {
        direct
    };

    visiting.remove(name);
    result
}
