//! Query-related data models.
//!
//! This module defines the request that enters the gateway pipeline and the
//! normalized result that leaves it.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A positional bind parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryParam {
    /// NULL value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (stored as i64 for maximum range)
    Int(i64),
    /// Unsigned integer above `i64::MAX`
    UInt(u64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
}

impl QueryParam {
    /// Check if this parameter is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the type name of this parameter for debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Float(_) => "float",
            Self::String(_) => "string",
        }
    }
}

/// One invocation of the pipeline: SQL text, positional parameters and an
/// optional database override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub sql: String,
    #[serde(default)]
    pub params: Vec<QueryParam>,
    #[serde(default)]
    pub database: Option<String>,
}

impl QueryRequest {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
            database: None,
        }
    }

    /// Add a parameter to this query.
    pub fn with_param(mut self, param: QueryParam) -> Self {
        self.params.push(param);
        self
    }

    /// Run against `database` instead of the configured default.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub name: String,
    /// Type name as reported by the server (e.g., "BIGINT UNSIGNED", "VARCHAR")
    pub type_name: String,
}

impl ColumnMetadata {
    /// Create new column metadata.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// A decoded row: column name to transport-safe value.
pub type Row = serde_json::Map<String, JsonValue>;

/// Normalized output of one successful pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<ColumnMetadata>,
    pub rows: Vec<Row>,
    pub row_count: usize,
    /// True when the server produced more rows than the configured cap.
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_affected: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_insert_id: Option<u64>,
    /// Features used by the query that the target server generation lacks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub execution_time_ms: u64,
}

impl QueryResult {
    /// Check if the result is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.rows_affected.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_param_types() {
        assert!(QueryParam::Null.is_null());
        assert!(!QueryParam::Bool(true).is_null());
        assert_eq!(QueryParam::Int(42).type_name(), "int");
        assert_eq!(
            QueryParam::String("hello".to_string()).type_name(),
            "string"
        );
    }

    #[test]
    fn test_query_param_untagged_deserialize() {
        let params: Vec<QueryParam> =
            serde_json::from_str(r#"[null, true, 7, 2.5, "x"]"#).unwrap();
        assert_eq!(
            params,
            vec![
                QueryParam::Null,
                QueryParam::Bool(true),
                QueryParam::Int(7),
                QueryParam::Float(2.5),
                QueryParam::String("x".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_request_builder() {
        let req = QueryRequest::new("SELECT * FROM users WHERE id = ?")
            .with_param(QueryParam::Int(1))
            .with_database("crm");
        assert_eq!(req.params.len(), 1);
        assert_eq!(req.database.as_deref(), Some("crm"));
    }

    #[test]
    fn test_query_result_serialization_skips_empty_fields() {
        let result = QueryResult {
            columns: vec![ColumnMetadata::new("id", "INT")],
            rows: Vec::new(),
            row_count: 0,
            truncated: false,
            rows_affected: None,
            last_insert_id: None,
            warnings: Vec::new(),
            execution_time_ms: 3,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("warnings").is_none());
        assert!(json.get("rows_affected").is_none());
        assert!(result.is_empty());
    }
}
