//! Data models shared by the pipeline and the tool layer.

pub mod query;
pub mod schema;

// Re-export commonly used types
pub use query::{ColumnMetadata, QueryParam, QueryRequest, QueryResult, Row};
pub use schema::{ColumnDescriptor, KeyRole, Listing};
