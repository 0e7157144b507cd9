//! Query execution tool.
//!
//! This module implements the `execute_query` MCP tool. Reads always run;
//! INSERT, UPDATE and DELETE run only when their write flag is enabled.

use crate::db::SessionBackend;
use crate::error::DbResult;
use crate::models::{ColumnMetadata, QueryParam, QueryRequest, QueryResult};
use crate::tools::gateway::QueryGateway;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::info;

/// Input for the execute_query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExecuteQueryInput {
    /// A single SQL statement. SELECT, SHOW, DESCRIBE and EXPLAIN always run; INSERT/UPDATE/DELETE only when enabled.
    pub query: String,
    /// Database to run against. Defaults to MYSQL_DATABASE.
    #[serde(default)]
    pub database: Option<String>,
    /// Positional parameters for `?` placeholders in the query
    #[serde(default)]
    pub params: Vec<QueryParamInput>,
}

/// Input parameter that can be various JSON types.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum QueryParamInput {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Unsigned integer too large for i64
    UInt(u64),
    /// Float value
    Float(f64),
    /// String value
    String(String),
}

impl From<QueryParamInput> for QueryParam {
    fn from(input: QueryParamInput) -> Self {
        match input {
            QueryParamInput::Null => QueryParam::Null,
            QueryParamInput::Bool(v) => QueryParam::Bool(v),
            QueryParamInput::Int(v) => QueryParam::Int(v),
            QueryParamInput::UInt(v) => QueryParam::UInt(v),
            QueryParamInput::Float(v) => QueryParam::Float(v),
            QueryParamInput::String(v) => QueryParam::String(v),
        }
    }
}

impl From<ExecuteQueryInput> for QueryRequest {
    fn from(input: ExecuteQueryInput) -> Self {
        Self {
            sql: input.query,
            params: input.params.into_iter().map(Into::into).collect(),
            database: input.database,
        }
    }
}

/// Output from the execute_query tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ExecuteQueryOutput {
    /// Column metadata (name, server type). Empty when no rows came back.
    pub columns: Vec<ColumnMetadataOutput>,
    /// Result rows as column-to-value maps. Integers beyond ±(2^53-1) are strings.
    pub rows: Vec<serde_json::Map<String, JsonValue>>,
    /// Number of rows returned
    pub row_count: usize,
    /// True if the server produced more rows than MYSQL_ROW_LIMIT
    pub truncated: bool,
    /// Rows changed by an INSERT, UPDATE or DELETE
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_affected: Option<u64>,
    /// AUTO_INCREMENT value generated by an INSERT
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_insert_id: Option<u64>,
    /// Constructs the target server may not support
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Query execution time in milliseconds
    pub execution_time_ms: u64,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ColumnMetadataOutput {
    pub name: String,
    pub type_name: String,
}

impl From<ColumnMetadata> for ColumnMetadataOutput {
    fn from(meta: ColumnMetadata) -> Self {
        Self {
            name: meta.name,
            type_name: meta.type_name,
        }
    }
}

impl From<QueryResult> for ExecuteQueryOutput {
    fn from(result: QueryResult) -> Self {
        Self {
            columns: result.columns.into_iter().map(Into::into).collect(),
            rows: result.rows,
            row_count: result.row_count,
            truncated: result.truncated,
            rows_affected: result.rows_affected,
            last_insert_id: result.last_insert_id,
            warnings: result.warnings,
            execution_time_ms: result.execution_time_ms,
        }
    }
}

/// Handler for the execute_query tool.
pub struct QueryToolHandler<B: SessionBackend> {
    gateway: QueryGateway<B>,
}

impl<B: SessionBackend> QueryToolHandler<B> {
    pub fn new(gateway: QueryGateway<B>) -> Self {
        Self { gateway }
    }

    /// Handle the execute_query tool call.
    pub async fn execute_query(&self, input: ExecuteQueryInput) -> DbResult<ExecuteQueryOutput> {
        let request = QueryRequest::from(input);
        let result = self.gateway.run(&request).await?;

        info!(
            database = ?request.database,
            row_count = result.row_count,
            truncated = result.truncated,
            rows_affected = ?result.rows_affected,
            execution_time_ms = result.execution_time_ms,
            "Query executed"
        );

        Ok(result.into())
    }
}
