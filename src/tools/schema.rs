//! Schema introspection tools.
//!
//! This module implements the `list_databases`, `list_tables` and
//! `describe_table` MCP tools. Each one is a fixed statement sent through the
//! same gateway as `execute_query`.

use crate::db::SessionBackend;
use crate::error::DbResult;
use crate::models::ColumnDescriptor;
use crate::tools::gateway::QueryGateway;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Output for the list_databases tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListDatabasesOutput {
    pub databases: Vec<String>,
    pub count: usize,
    /// True if the server listed more databases than MYSQL_ROW_LIMIT
    pub truncated: bool,
}

/// Input for the list_tables tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListTablesInput {
    /// Database name. Defaults to MYSQL_DATABASE; required when that is not set.
    #[serde(default)]
    pub database: Option<String>,
}

/// Output from the list_tables tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListTablesOutput {
    /// Table names in server order
    pub tables: Vec<String>,
    /// Number of tables returned
    pub count: usize,
    /// True if the database has more tables than MYSQL_ROW_LIMIT
    pub truncated: bool,
}

/// Input for the describe_table tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DescribeTableInput {
    /// Table name (letters, digits, `_`, `$` and `-`, at most 64 characters)
    pub table: String,
    /// Database name. Defaults to MYSQL_DATABASE; required when that is not set.
    #[serde(default)]
    pub database: Option<String>,
}

/// Output from the describe_table tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct DescribeTableOutput {
    pub table: String,
    pub columns: Vec<ColumnOutput>,
    /// True if the table has more columns than MYSQL_ROW_LIMIT
    pub truncated: bool,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ColumnOutput {
    pub name: String,
    /// Full column type, e.g. `varchar(30)` or `bigint(20) unsigned`
    pub data_type: String,
    pub nullable: bool,
    /// "primary", "unique", "multiple" or "none"
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub extra: String,
}

impl From<ColumnDescriptor> for ColumnOutput {
    fn from(col: ColumnDescriptor) -> Self {
        Self {
            name: col.name,
            data_type: col.data_type,
            nullable: col.nullable,
            key: col.key.as_str().to_string(),
            default_value: col.default_value,
            extra: col.extra,
        }
    }
}

/// Handler for schema introspection tools.
pub struct SchemaToolHandler<B: SessionBackend> {
    gateway: QueryGateway<B>,
}

impl<B: SessionBackend> SchemaToolHandler<B> {
    pub fn new(gateway: QueryGateway<B>) -> Self {
        Self { gateway }
    }

    /// Handle the list_databases tool call.
    pub async fn list_databases(&self) -> DbResult<ListDatabasesOutput> {
        let listing = self.gateway.list_databases().await?;
        info!(
            count = listing.items.len(),
            truncated = listing.truncated,
            "Listed databases"
        );

        Ok(ListDatabasesOutput {
            count: listing.items.len(),
            databases: listing.items,
            truncated: listing.truncated,
        })
    }

    /// Handle the list_tables tool call.
    pub async fn list_tables(&self, input: ListTablesInput) -> DbResult<ListTablesOutput> {
        let listing = self.gateway.list_tables(input.database.as_deref()).await?;
        info!(
            database = ?input.database,
            count = listing.items.len(),
            truncated = listing.truncated,
            "Listed tables"
        );

        Ok(ListTablesOutput {
            count: listing.items.len(),
            tables: listing.items,
            truncated: listing.truncated,
        })
    }

    /// Handle the describe_table tool call.
    pub async fn describe_table(
        &self,
        input: DescribeTableInput,
    ) -> DbResult<DescribeTableOutput> {
        let listing = self
            .gateway
            .describe_table(input.database.as_deref(), &input.table)
            .await?;
        info!(
            database = ?input.database,
            table = %input.table,
            columns = listing.items.len(),
            "Described table"
        );

        Ok(DescribeTableOutput {
            table: input.table.trim().to_string(),
            columns: listing.items.into_iter().map(Into::into).collect(),
            truncated: listing.truncated,
        })
    }
}
