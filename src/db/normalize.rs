//! Result normalization.
//!
//! Rows leave the driver as JSON maps. Before they reach a caller the result
//! is cut to the row cap and every integer a JSON consumer could not hold
//! exactly (beyond ±(2^53 − 1)) is rewritten as its decimal string. The walk
//! is recursive so composite values (JSON columns) are covered too.

use crate::models::Row;
use serde_json::Value as JsonValue;

/// Largest integer an IEEE-754 double represents exactly.
pub const MAX_SAFE_INTEGER: u64 = 9_007_199_254_740_991;

/// Rows after capping.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRows {
    pub rows: Vec<Row>,
    /// The input held more rows than the cap.
    pub truncated: bool,
}

/// Truncate `rows` to `cap` entries and make every value transport safe.
pub fn normalize(rows: Vec<Row>, cap: usize) -> NormalizedRows {
    let truncated = rows.len() > cap;
    let rows = rows
        .into_iter()
        .take(cap)
        .map(|row| {
            row.into_iter()
                .map(|(column, value)| (column, normalize_value(value)))
                .collect()
        })
        .collect();

    NormalizedRows { rows, truncated }
}

/// Convert out-of-range integers to strings, recursing into arrays and objects.
pub fn normalize_value(value: JsonValue) -> JsonValue {
    match value {
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                if i.unsigned_abs() > MAX_SAFE_INTEGER {
                    return JsonValue::String(i.to_string());
                }
            } else if let Some(u) = n.as_u64() {
                if u > MAX_SAFE_INTEGER {
                    return JsonValue::String(u.to_string());
                }
            }
            JsonValue::Number(n)
        }
        JsonValue::Array(items) => {
            JsonValue::Array(items.into_iter().map(normalize_value).collect())
        }
        JsonValue::Object(map) => JsonValue::Object(
            map.into_iter()
                .map(|(k, v)| (k, normalize_value(v)))
                .collect(),
        ),
        other => other,
    }
}
