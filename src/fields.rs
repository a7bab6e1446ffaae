//! Dot-path lookup and value comparison over decoded JSON bodies.

use serde_json::Value;
use thiserror::Error;

/// Why a dot-path failed to resolve.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldLookupError {
    /// A path segment landed on a non-object level (array, scalar, null).
    #[error("segment {segment:?}: not an object")]
    NotAnObject { segment: String },

    /// The object level exists but the field does not.
    #[error("segment {segment:?}: missing field")]
    MissingField { segment: String },
}

/// Resolve a dot-notation path (e.g. "customer.email") by descending
/// object-typed nesting. Every segment requires the current level to be a
/// JSON object.
pub fn lookup_dot_path<'a>(body: &'a Value, path: &str) -> Result<&'a Value, FieldLookupError> {
    let mut current = body;
    for segment in path.split('.') {
        let object = current.as_object().ok_or_else(|| FieldLookupError::NotAnObject {
            segment: segment.to_string(),
        })?;
        current = object.get(segment).ok_or_else(|| FieldLookupError::MissingField {
            segment: segment.to_string(),
        })?;
    }
    Ok(current)
}

/// Compare an actual body value against an expected scalar.
///
/// Numbers compare numerically (integer/float-compatible), strings and bools
/// by native equality. Any other type pairing falls back to formatted-string
/// equality.
pub fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(e)) => match (a.as_f64(), e.as_f64()) {
            (Some(a), Some(e)) => a == e,
            _ => a == e,
        },
        (Value::String(a), Value::String(e)) => a == e,
        (Value::Bool(a), Value::Bool(e)) => a == e,
        _ => render_scalar(actual) == render_scalar(expected),
    }
}

/// Render a value the way it appears in canonical signatures: strings keep
/// their raw content (no quotes), everything else uses its JSON text.
pub fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
