//! MCP server integration module.
//!
//! This module exposes the query gateway as MCP tools using the rmcp framework.

pub mod service;

pub use service::GatewayService;
