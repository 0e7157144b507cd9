//! Legacy MySQL MCP Server Library
//!
//! This library exposes a MySQL 5.x server to MCP (Model Context Protocol)
//! clients through four tools, with every statement passing a lexical
//! classifier and a read-mostly admission policy before it reaches the server.

pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod transport;

pub use config::{Config, Settings};
pub use error::{DbError, DbResult, ErrorCategory};
pub use mcp::GatewayService;
pub use tools::QueryGateway;
