//! MCP tool implementations and the query pipeline behind them.
//!
//! - `classifier`: lexical statement classification
//! - `admission`: allow/deny decisions from a classification and the write flags
//! - `identifier`: validation and quoting of database and table names
//! - `gateway`: the classify, admit, execute, normalize pipeline
//! - `query`: the `execute_query` tool
//! - `schema`: the `list_databases`, `list_tables` and `describe_table` tools

pub mod admission;
pub mod classifier;
pub mod gateway;
pub mod identifier;
pub mod query;
pub mod schema;

pub use admission::{AccessPolicy, CompatibilityPolicy, Decision, DenialReason, decide};
pub use classifier::{Verdict, classify};
pub use gateway::QueryGateway;
pub use query::{ExecuteQueryInput, ExecuteQueryOutput, QueryToolHandler};
pub use schema::{
    DescribeTableInput, DescribeTableOutput, ListDatabasesOutput, ListTablesInput, ListTablesOutput,
    SchemaToolHandler,
};
