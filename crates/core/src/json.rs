//! Lenient readers for incoming JSON.
//!
//! Malformed input never rejects a payload: a value of the wrong type or out of range reads as
//! absent, and the rest of the payload is still applied.

use serde_json::{Map, Value};

/// Non-blank text; numbers are rendered as text, everything else is absent.
pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A boolean given as `true`/`false`, `1`/`0`, or the strings `"true"`, `"yes"`, `"1"` and
/// their negations.
pub fn flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// A whole number given as a JSON integer, an integral float, or numeric text.
pub fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Non-blank strings from an array (a single string counts as a one-element list).
/// Objects in the array contribute their `id`.
pub fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Object(obj) => obj.get("id").and_then(text),
                other => text(other),
            })
            .collect(),
        other => text(other).into_iter().collect(),
    }
}

pub fn object(value: &Value) -> Option<&Map<String, Value>> {
    value.as_object()
}

/// Text of `key` in an object.
pub fn text_at(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(text)
}
