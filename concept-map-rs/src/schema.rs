//! Concept map schema validation
//!
//! Upstream text is parsed as JSON, checked against a Draft 7 JSON Schema
//! describing the concept map, and only then converted into typed values.
//! Every schema violation is reported, not just the first.

use jsonschema::{Draft, JSONSchema};
use lazy_static::lazy_static;
use serde_json::{json, Value};

use error_handling_rs::Violation;

use crate::error::ResponseError;
use crate::model::ConceptMap;

lazy_static! {
    /// Schema for a concept map returned by the upstream model
    pub static ref CONCEPT_MAP_SCHEMA: JSONSchema = {
        let schema = json!({
            "type": "object",
            "required": ["target", "prerequisites"],
            "properties": {
                "target": {
                    "type": "string",
                    "minLength": 1
                },
                "prerequisites": {
                    "type": "array",
                    "minItems": 1,
                    "items": {
                        "type": "object",
                        "required": ["id", "name", "description", "level"],
                        "properties": {
                            "id": {
                                "type": "integer",
                                "minimum": 1
                            },
                            "name": {
                                "type": "string",
                                "minLength": 1
                            },
                            "description": {
                                "type": "string",
                                "minLength": 1
                            },
                            "prerequisites": {
                                "type": "array",
                                "items": { "type": "integer" }
                            },
                            "level": {
                                "enum": ["foundational", "intermediate", "advanced"]
                            }
                        }
                    }
                }
            }
        });

        JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&schema)
            .expect("Invalid concept map schema")
    };
}

/// Checks a parsed value against the concept map schema
pub fn check_schema(value: &Value) -> Result<(), Vec<Violation>> {
    CONCEPT_MAP_SCHEMA.validate(value).map_err(|errors| {
        errors
            .map(|e| Violation::new(e.instance_path.to_string(), e.to_string()))
            .collect()
    })
}

/// Parses and validates sanitized upstream text
///
/// Unknown fields are ignored. Cross-references between nodes are not
/// checked here; see [`crate::integrity::check_integrity`].
pub fn validate(candidate: &str) -> Result<ConceptMap, ResponseError> {
    let mut value: Value = serde_json::from_str(candidate).map_err(ResponseError::Parse)?;

    check_schema(&value).map_err(ResponseError::Schema)?;
    normalize_ids(&mut value).map_err(ResponseError::Schema)?;

    serde_json::from_value(value)
        .map_err(|e| ResponseError::Schema(vec![Violation::new("", e.to_string())]))
}

/// Rewrites node ids and references to unsigned integers in place
///
/// The schema's `integer` admits integral floats such as `1.0`, as well as
/// negative and very large values. Floats are narrowed; anything that does
/// not fit a `u64` is reported at its own path.
fn normalize_ids(value: &mut Value) -> Result<(), Vec<Violation>> {
    let mut violations = Vec::new();
    let Some(nodes) = value.get_mut("prerequisites").and_then(Value::as_array_mut) else {
        return Ok(());
    };

    for (i, node) in nodes.iter_mut().enumerate() {
        if let Some(id) = node.get_mut("id") {
            normalize_id(id, format!("/prerequisites/{}/id", i), &mut violations);
        }
        if let Some(refs) = node.get_mut("prerequisites").and_then(Value::as_array_mut) {
            for (j, reference) in refs.iter_mut().enumerate() {
                let path = format!("/prerequisites/{}/prerequisites/{}", i, j);
                normalize_id(reference, path, &mut violations);
            }
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

fn normalize_id(slot: &mut Value, path: String, violations: &mut Vec<Violation>) {
    let Value::Number(number) = slot else {
        return;
    };
    match as_node_id(number) {
        Some(id) => *slot = Value::from(id),
        None => violations.push(Violation::new(
            path,
            format!("{} is not a valid node id", number),
        )),
    }
}

/// 2^64, the first float above `u64::MAX`
const U64_BOUND: f64 = 18_446_744_073_709_551_616.0;

fn as_node_id(number: &serde_json::Number) -> Option<u64> {
    if let Some(id) = number.as_u64() {
        return Some(id);
    }
    let float = number.as_f64()?;
    if float.fract() == 0.0 && (0.0..U64_BOUND).contains(&float) {
        Some(float as u64)
    } else {
        None
    }
}
