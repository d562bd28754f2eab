//! Dot-path access over JSON documents.
//!
//! Paths such as `form1_part_a.proposed_capacity` address nested objects.
//! Lookups never fail: a segment that is missing, or that traverses a
//! non-object value, resolves to `None`.

use serde_json::{Map, Value};

/// Resolve a dot-path, treating `null` and `""` as absent.
pub fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    is_present(current).then_some(current)
}

/// Write `value` at `path`, creating intermediate objects as needed.
///
/// An intermediate segment holding a non-object value is replaced by an
/// empty object.
pub fn insert(root: &mut Map<String, Value>, path: &str, value: Value) {
    let mut segments: Vec<&str> = path.split('.').collect();
    let Some(last) = segments.pop() else {
        return;
    };

    let mut current = root;
    for segment in segments {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = match slot {
            Value::Object(map) => map,
            _ => return,
        };
    }
    current.insert(last.to_string(), value);
}

/// `null` and blank strings count as absent everywhere in the pipeline.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

/// Numeric view of a JSON value.
///
/// Numbers map directly, numeric strings are parsed, and `{value, unit}`
/// pairs unwrap to their `value`. Everything else is `None`.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        Value::Object(map) => map.get("value").and_then(as_number),
        _ => None,
    }
}
