//! Payload helpers

use serde_json::{Map, Value};

/// Field name to JSON value, in authoritative field order
pub type Payload = Map<String, Value>;

/// Fields that are never diffed nor sent as edits: type discriminators,
/// identity and link anchors
pub const EXCLUDED_FIELDS: [&str; 6] = ["eClass", "type", "id", "semanticUri", "source", "target"];

/// Whether a field may carry a local edit
pub fn is_editable(field: &str) -> bool {
    !EXCLUDED_FIELDS.contains(&field)
}

/// Restore native types for values that travel string-encoded
///
/// `"true"`/`"false"` become booleans and a string made only of an optionally
/// signed run of digits becomes an integer. Everything else is left alone.
pub fn coerce_scalar(value: Value) -> Value {
    let Value::String(s) = &value else {
        return value;
    };
    match s.as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    let digits = s.strip_prefix('-').unwrap_or(s);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(n) = s.parse::<i64>() {
            return Value::from(n);
        }
    }
    value
}

/// Remove a field without disturbing the order of the remaining fields
pub fn remove_ordered(payload: &mut Payload, field: &str) -> Option<Value> {
    payload.shift_remove(field)
}

/// View a JSON value as a payload
pub fn as_payload(value: &Value) -> Option<&Payload> {
    value.as_object()
}
