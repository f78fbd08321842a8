//! Identifier extraction.
//!
//! Walks `entry[*].changes[*]` and collects `value.id` from every change
//! whose `field` matches the configured discriminator. Absent keys mean
//! there is nothing to extract; keys holding the wrong JSON type abort
//! extraction.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::info;

/// Payload shape that extraction cannot walk.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("expected `{0}` to be an object")]
    NotAnObject(&'static str),

    #[error("expected `{0}` to be an array")]
    NotAnArray(&'static str),

    #[error("unsupported id of type {0}")]
    InvalidId(&'static str),
}

/// Collect identifiers in traversal order. Duplicates are kept.
pub fn extract_ids(payload: &Value, field: &str) -> Result<Vec<String>, ExtractionError> {
    let root = payload
        .as_object()
        .ok_or(ExtractionError::NotAnObject("payload"))?;

    let mut ids = Vec::new();

    for entry in array_at(root, "entry")? {
        let entry = entry
            .as_object()
            .ok_or(ExtractionError::NotAnObject("entry"))?;

        for change in array_at(entry, "changes")? {
            let change = change
                .as_object()
                .ok_or(ExtractionError::NotAnObject("change"))?;

            if change.get("field").and_then(Value::as_str) != Some(field) {
                continue;
            }

            let value = match change.get("value") {
                Some(v) => v.as_object().ok_or(ExtractionError::NotAnObject("value"))?,
                None => continue,
            };

            if let Some(id) = value.get("id") {
                if let Some(id) = identifier(id)? {
                    ids.push(id);
                }
            }
        }
    }

    info!(field = %field, count = ids.len(), ids = ?ids, "ids_extracted");

    Ok(ids)
}

/// Array under `key`, or an empty slice when the key is absent.
fn array_at<'a>(
    object: &'a Map<String, Value>,
    key: &'static str,
) -> Result<&'a [Value], ExtractionError> {
    match object.get(key) {
        Some(v) => v
            .as_array()
            .map(Vec::as_slice)
            .ok_or(ExtractionError::NotAnArray(key)),
        None => Ok(&[][..]),
    }
}

/// Render an `id` value. Empty-ish values carry no identifier.
fn identifier(id: &Value) -> Result<Option<String>, ExtractionError> {
    match id {
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) if n.as_f64() == Some(0.0) => Ok(None),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Null | Value::Bool(false) => Ok(None),
        Value::Bool(true) => Err(ExtractionError::InvalidId("bool")),
        Value::Array(_) => Err(ExtractionError::InvalidId("array")),
        Value::Object(_) => Err(ExtractionError::InvalidId("object")),
    }
}
