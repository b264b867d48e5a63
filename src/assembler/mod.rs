//! Template assembly.
//!
//! Joins the three earlier products - the declaration graph, the resolved
//! attribute references, and the extracted runtime values - into the final
//! infrastructure document. The extracted values are plain serialized data;
//! this is where the recorded field paths are overwritten with `Ref` and
//! `Fn::GetAtt` intrinsics so cross-declaration links survive into the
//! template instead of being baked in as stale literals.

use anyhow::Result;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use tracing::debug;

use crate::config::ScanConfig;
use crate::core::CumuloError;
use crate::graph::{AttrRefUsage, DeclarationGraph, FieldPath, PathSeg};
use crate::scanner::DeclarationKind;

/// The assembled infrastructure document.
///
/// Field order here is serialization order; empty sections are omitted
/// entirely rather than rendered as `{}`.
#[derive(Debug, Default, Serialize)]
pub struct Document {
    /// Optional template description.
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Parameter declarations.
    #[serde(rename = "Parameters", skip_serializing_if = "Map::is_empty")]
    pub parameters: Map<String, Value>,
    /// Mapping declarations.
    #[serde(rename = "Mappings", skip_serializing_if = "Map::is_empty")]
    pub mappings: Map<String, Value>,
    /// Condition declarations.
    #[serde(rename = "Conditions", skip_serializing_if = "Map::is_empty")]
    pub conditions: Map<String, Value>,
    /// Resource declarations, each `{"Type": ..., "Properties": ...}`.
    #[serde(rename = "Resources", skip_serializing_if = "Map::is_empty")]
    pub resources: Map<String, Value>,
    /// Output declarations.
    #[serde(rename = "Outputs", skip_serializing_if = "Map::is_empty")]
    pub outputs: Map<String, Value>,
}

impl Document {
    fn section_mut(&mut self, kind: DeclarationKind) -> &mut Map<String, Value> {
        match kind {
            DeclarationKind::Parameter => &mut self.parameters,
            DeclarationKind::Mapping => &mut self.mappings,
            DeclarationKind::Condition => &mut self.conditions,
            DeclarationKind::Resource => &mut self.resources,
            DeclarationKind::Output => &mut self.outputs,
        }
    }
}

/// Assemble the final document from the graph, the resolved attribute
/// references per declaration, and the extracted values.
///
/// When an attribute reference sits inside a structure that is itself a
/// whole-value reference, the enclosing `Ref` wins: the attribute
/// substitution at the longer path is written first and then overwritten
/// when the shorter path is replaced. The producing declaration carries the
/// `Fn::GetAtt` in its own entry, so nothing is lost.
pub fn assemble(
    graph: &DeclarationGraph,
    resolved: &BTreeMap<String, Vec<AttrRefUsage>>,
    mut values: BTreeMap<String, Value>,
    config: &ScanConfig,
    description: Option<String>,
) -> Result<Document> {
    let mut document = Document {
        description,
        ..Document::default()
    };

    for decl in graph.declarations() {
        let mut value = values.remove(&decl.name).ok_or_else(|| CumuloError::AssemblyError {
            detail: format!("no extracted value for declaration '{}'", decl.name),
        })?;

        substitute_references(graph, resolved, decl.name.as_str(), &mut value)?;

        let entry = match decl.kind {
            DeclarationKind::Resource => json!({
                "Type": wire_type(&decl.type_path, config)?,
                "Properties": value,
            }),
            _ => value,
        };

        let logical_id = pascal_case(&decl.name);
        debug!(target: "assemble", "{} -> {}::{logical_id}", decl.name, decl.kind.as_str());
        document.section_mut(decl.kind).insert(logical_id, entry);
    }

    Ok(document)
}

/// Overwrite recorded reference positions inside one extracted value.
///
/// Attribute references go first so that a whole-value reference at a
/// shorter path can still replace the enclosing structure afterwards.
/// Chained attribute paths may legitimately vanish when an intermediate
/// declaration's position is itself replaced by a `Ref`, so only usages
/// recorded directly on this declaration are held to the strict
/// path-must-exist rule.
fn substitute_references(
    graph: &DeclarationGraph,
    resolved: &BTreeMap<String, Vec<AttrRefUsage>>,
    name: &str,
    value: &mut Value,
) -> Result<()> {
    // Resolution returns either the declaration's own usages or ones
    // chained through indirections, never a mix.
    let strict = graph.attr_refs_of(name).next().is_some();
    if let Some(usages) = resolved.get(name) {
        for usage in usages {
            let replacement = json!({
                "Fn::GetAtt": [pascal_case(&usage.referenced), pascal_case(&usage.attribute)]
            });
            let placed = set_at_path(value, &usage.path, replacement)?;
            if !placed && strict {
                return Err(CumuloError::AssemblyError {
                    detail: format!(
                        "attribute reference path '{}' not found in extracted value of '{name}'",
                        usage.path
                    ),
                }
                .into());
            }
        }
    }

    for edge in graph.pathed_edges_from(name) {
        if !graph.contains(&edge.to) {
            continue;
        }
        let Some(path) = &edge.path else { continue };
        let replacement = json!({ "Ref": pascal_case(&edge.to) });
        if !set_at_path(value, path, replacement)? {
            return Err(CumuloError::AssemblyError {
                detail: format!(
                    "reference path '{path}' not found in extracted value of '{name}'"
                ),
            }
            .into());
        }
    }

    Ok(())
}

/// Write `replacement` at `path` inside `value`, translating snake_case
/// keys to the PascalCase spelling the serialized value uses.
///
/// Returns whether the full path existed. An empty path is rejected: a
/// whole-value overwrite would discard the extracted value entirely, which
/// only ever indicates an upstream extraction bug.
fn set_at_path(value: &mut Value, path: &FieldPath, replacement: Value) -> Result<bool> {
    if path.is_empty() {
        return Err(CumuloError::AssemblyError {
            detail: "empty substitution path".to_string(),
        }
        .into());
    }

    let mut cursor = value;
    for (i, seg) in path.0.iter().enumerate() {
        let last = i == path.0.len() - 1;
        match seg {
            PathSeg::Key(key) => {
                let Value::Object(map) = cursor else {
                    return Ok(false);
                };
                let pascal = pascal_case(key);
                // Generated types usually rename to PascalCase, but plain
                // serde structs keep the source spelling.
                let spelled = if map.contains_key(&pascal) {
                    pascal
                } else if map.contains_key(key) {
                    key.clone()
                } else {
                    return Ok(false);
                };
                if last {
                    map.insert(spelled, replacement);
                    return Ok(true);
                }
                cursor = map.get_mut(&spelled).ok_or_else(|| CumuloError::AssemblyError {
                    detail: format!("substitution cursor lost at '{spelled}'"),
                })?;
            }
            PathSeg::Index(index) => {
                let Value::Array(items) = cursor else {
                    return Ok(false);
                };
                let Some(slot) = items.get_mut(*index) else {
                    return Ok(false);
                };
                if last {
                    *slot = replacement;
                    return Ok(true);
                }
                cursor = slot;
            }
        }
    }
    Ok(false)
}

/// Wire resource type for a declaration's return type path, e.g.
/// `s3::Bucket` -> `AWS::S3::Bucket`.
fn wire_type(type_path: &[String], config: &ScanConfig) -> Result<String> {
    if type_path.len() < 2 {
        return Err(CumuloError::AssemblyError {
            detail: format!(
                "resource type path '{}' has no service module segment",
                type_path.join("::")
            ),
        }
        .into());
    }
    let module = &type_path[type_path.len() - 2];
    let type_name = &type_path[type_path.len() - 1];
    Ok(format!("AWS::{}::{type_name}", config.service_name(module)))
}

/// snake_case to PascalCase: `execution_role` -> `ExecutionRole`.
#[must_use]
pub fn pascal_case(snake: &str) -> String {
    snake
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}
