//! NOBACKUP panel exclusion
//!
//! Any object whose `description` contains the marker token is dropped
//! from its containing sequence at export time. Applied to dashboard
//! payloads after folder-reference rewriting.

use serde_json::Value;

/// Reserved marker token. Putting this anywhere in a panel's description
/// excludes the panel (or row) from exported snapshots.
pub const EXCLUDE_MARKER: &str = "NOBACKUP";

/// Returns true iff `value` is an object with a non-null description
/// containing the marker.
pub fn is_excluded(value: &Value) -> bool {
    value
        .get("description")
        .and_then(Value::as_str)
        .is_some_and(|text| text.contains(EXCLUDE_MARKER))
}

/// Rebuilds the tree with excluded sequence elements dropped.
/// Objects are recursed into; scalars pass through.
pub fn strip_excluded(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .filter(|item| !is_excluded(item))
                .map(strip_excluded)
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, strip_excluded(value)))
                .collect(),
        ),
        scalar => scalar,
    }
}
