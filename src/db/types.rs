//! MySQL column decoding.
//!
//! Type conversion uses a two-phase approach:
//! 1. `TypeCategory` classifies the reported column type into a logical category
//! 2. A per-category decoder extracts the value as JSON
//!
//! A value that cannot be decoded by its category decoder is never dropped:
//! it falls back to the raw column bytes rendered as text. Legacy servers
//! routinely hold values (zero dates, out-of-range TIME) that strict decoders
//! reject.

use crate::models::{ColumnMetadata, Row as JsonRow};
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySqlRow, MySqlTypeInfo, MySqlValueRef};
use sqlx::{Column, Decode, Row, Type, TypeInfo, ValueRef};

/// Logical category for MySQL column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Boolean,
    Text,
    Binary,
    Json,
    Date,
    DateTime,
    Timestamp,
    Time,
}

/// Classify a MySQL type name into a logical category.
pub fn categorize_type(type_name: &str) -> TypeCategory {
    let lower = type_name.to_lowercase();

    // Decimal first: "numeric" would otherwise be caught by nothing useful
    if lower.contains("decimal") || lower.contains("numeric") {
        return TypeCategory::Decimal;
    }

    // sqlx reports TINYINT(1) as BOOLEAN
    if lower == "bool" || lower == "boolean" {
        return TypeCategory::Boolean;
    }

    if lower.contains("int") || lower == "bit" || lower == "year" {
        return TypeCategory::Integer;
    }

    if lower.contains("float") || lower.contains("double") || lower == "real" {
        return TypeCategory::Float;
    }

    if lower == "json" {
        return TypeCategory::Json;
    }

    if lower.contains("blob") || lower.contains("binary") || lower == "geometry" {
        return TypeCategory::Binary;
    }

    match lower.as_str() {
        "date" => TypeCategory::Date,
        "datetime" => TypeCategory::DateTime,
        "timestamp" => TypeCategory::Timestamp,
        "time" => TypeCategory::Time,
        // varchar, char, text, enum, set and anything unrecognised
        _ => TypeCategory::Text,
    }
}

/// Wrapper type for raw DECIMAL values as strings.
/// This preserves the exact server representation.
#[derive(Debug)]
pub struct RawDecimal(pub String);

impl Type<sqlx::MySql> for RawDecimal {
    fn type_info() -> MySqlTypeInfo {
        <String as Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        let name = ty.name().to_lowercase();
        name.contains("decimal") || name.contains("numeric")
    }
}

impl<'r> Decode<'r, sqlx::MySql> for RawDecimal {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::MySql>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

/// Render binary data as text when it is valid UTF-8, base64 otherwise.
pub fn decode_binary_value(bytes: &[u8]) -> JsonValue {
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    match std::str::from_utf8(bytes) {
        Ok(s) => JsonValue::String(s.to_string()),
        Err(_) => JsonValue::String(STANDARD.encode(bytes)),
    }
}

/// Trait for converting database rows to JSON maps.
pub trait RowToJson {
    fn to_json_map(&self) -> JsonRow;
    fn column_metadata(&self) -> Vec<ColumnMetadata>;
}

impl RowToJson for MySqlRow {
    fn to_json_map(&self) -> JsonRow {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let category = categorize_type(col.type_info().name());
                (col.name().to_string(), decode_column(self, idx, category))
            })
            .collect()
    }

    fn column_metadata(&self) -> Vec<ColumnMetadata> {
        self.columns()
            .iter()
            .map(|col| ColumnMetadata::new(col.name(), col.type_info().name()))
            .collect()
    }
}

fn is_null(row: &MySqlRow, idx: usize) -> bool {
    row.try_get_raw(idx).map(|v| v.is_null()).unwrap_or(true)
}

fn decode_column(row: &MySqlRow, idx: usize, category: TypeCategory) -> JsonValue {
    if is_null(row, idx) {
        return JsonValue::Null;
    }

    let decoded = match category {
        TypeCategory::Decimal => decode_decimal(row, idx),
        TypeCategory::Integer => decode_integer(row, idx),
        TypeCategory::Boolean => decode_boolean(row, idx),
        TypeCategory::Float => decode_float(row, idx),
        TypeCategory::Binary => decode_binary_col(row, idx),
        TypeCategory::Json => decode_json(row, idx),
        TypeCategory::Date => row
            .try_get::<chrono::NaiveDate, _>(idx)
            .ok()
            .map(|d| JsonValue::String(d.format("%Y-%m-%d").to_string())),
        TypeCategory::DateTime => row
            .try_get::<chrono::NaiveDateTime, _>(idx)
            .ok()
            .map(|d| JsonValue::String(d.format("%Y-%m-%d %H:%M:%S%.f").to_string())),
        TypeCategory::Timestamp => row
            .try_get::<chrono::DateTime<chrono::Utc>, _>(idx)
            .ok()
            .map(|d| JsonValue::String(d.to_rfc3339())),
        TypeCategory::Time => row
            .try_get::<chrono::NaiveTime, _>(idx)
            .ok()
            .map(|t| JsonValue::String(t.format("%H:%M:%S%.f").to_string())),
        TypeCategory::Text => row.try_get::<String, _>(idx).ok().map(JsonValue::String),
    };

    decoded.unwrap_or_else(|| decode_fallback(row, idx))
}

fn decode_decimal(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
    row.try_get::<RawDecimal, _>(idx)
        .ok()
        .map(|v| JsonValue::String(v.0))
}

fn decode_integer(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
    // Signed first, then unsigned; BIGINT UNSIGNED only fits u64
    if let Ok(v) = row.try_get::<i8, _>(idx) {
        return Some(v.into());
    }
    if let Ok(v) = row.try_get::<i16, _>(idx) {
        return Some(v.into());
    }
    if let Ok(v) = row.try_get::<i32, _>(idx) {
        return Some(v.into());
    }
    if let Ok(v) = row.try_get::<i64, _>(idx) {
        return Some(v.into());
    }
    if let Ok(v) = row.try_get::<u8, _>(idx) {
        return Some(v.into());
    }
    if let Ok(v) = row.try_get::<u16, _>(idx) {
        return Some(v.into());
    }
    if let Ok(v) = row.try_get::<u32, _>(idx) {
        return Some(v.into());
    }
    if let Ok(v) = row.try_get::<u64, _>(idx) {
        return Some(v.into());
    }
    None
}

fn decode_boolean(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
    row.try_get::<bool, _>(idx).ok().map(JsonValue::Bool)
}

fn float_value(v: f64) -> JsonValue {
    serde_json::Number::from_f64(v)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(v.to_string()))
}

fn decode_float(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
    if let Ok(v) = row.try_get::<f64, _>(idx) {
        return Some(float_value(v));
    }
    if let Ok(v) = row.try_get::<f32, _>(idx) {
        return Some(float_value(v as f64));
    }
    None
}

fn decode_binary_col(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
    row.try_get::<Vec<u8>, _>(idx)
        .ok()
        .map(|v| decode_binary_value(&v))
}

fn decode_json(row: &MySqlRow, idx: usize) -> Option<JsonValue> {
    row.try_get::<JsonValue, _>(idx).ok()
}

/// Raw column bytes as lossy UTF-8, skipping the type compatibility check.
fn decode_fallback(row: &MySqlRow, idx: usize) -> JsonValue {
    match row.try_get_unchecked::<Vec<u8>, _>(idx) {
        Ok(bytes) => {
            tracing::debug!(column = idx, "Decoded column via raw byte fallback");
            JsonValue::String(String::from_utf8_lossy(&bytes).into_owned())
        }
        Err(e) => {
            tracing::error!(column = idx, error = %e, "Failed to decode column");
            JsonValue::Null
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_integers() {
        for name in ["INT", "BIGINT", "TINYINT", "SMALLINT UNSIGNED", "BIGINT UNSIGNED", "BIT", "YEAR"]
        {
            assert_eq!(categorize_type(name), TypeCategory::Integer, "{name}");
        }
    }

    #[test]
    fn test_categorize_boolean_and_decimal() {
        assert_eq!(categorize_type("BOOLEAN"), TypeCategory::Boolean);
        assert_eq!(categorize_type("DECIMAL"), TypeCategory::Decimal);
        assert_eq!(categorize_type("NUMERIC"), TypeCategory::Decimal);
    }

    #[test]
    fn test_categorize_temporal() {
        assert_eq!(categorize_type("DATE"), TypeCategory::Date);
        assert_eq!(categorize_type("DATETIME"), TypeCategory::DateTime);
        assert_eq!(categorize_type("TIMESTAMP"), TypeCategory::Timestamp);
        assert_eq!(categorize_type("TIME"), TypeCategory::Time);
    }

    #[test]
    fn test_categorize_binary_and_text() {
        assert_eq!(categorize_type("BLOB"), TypeCategory::Binary);
        assert_eq!(categorize_type("VARBINARY"), TypeCategory::Binary);
        assert_eq!(categorize_type("VARCHAR"), TypeCategory::Text);
        assert_eq!(categorize_type("ENUM"), TypeCategory::Text);
        assert_eq!(categorize_type("DOUBLE"), TypeCategory::Float);
    }

    #[test]
    fn test_decode_binary_value_with_valid_utf8() {
        assert_eq!(
            decode_binary_value(b"hello world"),
            JsonValue::String("hello world".to_string())
        );
    }

    #[test]
    fn test_decode_binary_value_with_invalid_utf8() {
        let bytes: &[u8] = &[0xFF, 0xFE, 0x00, 0x01];
        assert_eq!(
            decode_binary_value(bytes),
            JsonValue::String("//4AAQ==".to_string())
        );
    }

    #[test]
    fn test_float_value_non_finite() {
        assert_eq!(float_value(f64::INFINITY), JsonValue::String("inf".to_string()));
        assert_eq!(float_value(1.5), serde_json::json!(1.5));
    }
}
