//! MCP service implementation using rmcp.
//!
//! This module defines the GatewayService struct with the four MySQL tools
//! exposed via the MCP protocol using the rmcp framework's macros.

use crate::db::MySqlBackend;
use crate::tools::gateway::QueryGateway;
use crate::tools::query::{ExecuteQueryInput, ExecuteQueryOutput, QueryToolHandler};
use crate::tools::schema::{
    DescribeTableInput, DescribeTableOutput, ListDatabasesOutput, ListTablesInput,
    ListTablesOutput, SchemaToolHandler,
};
use rmcp::Json;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};

#[derive(Clone)]
pub struct GatewayService {
    /// Shared query pipeline for all tools
    gateway: QueryGateway<MySqlBackend>,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl GatewayService {
    pub fn new(gateway: QueryGateway<MySqlBackend>) -> Self {
        Self {
            gateway,
            tool_router: Self::tool_router(),
        }
    }

    pub fn gateway(&self) -> &QueryGateway<MySqlBackend> {
        &self.gateway
    }

    fn instructions(&self) -> String {
        let policy = self.gateway.policy();
        let writes = policy.enabled_writes();
        let write_line = if writes.is_empty() {
            "- Writes: disabled (read-only)".to_string()
        } else {
            format!("- Writes: {} enabled", writes.join(", "))
        };
        let database_line = match self.gateway.connections().default_database() {
            Some(db) => format!("- Default database: `{}`", db),
            None => {
                "- No default database: pass `database` to list_tables and describe_table"
                    .to_string()
            }
        };

        format!(
            "Tools for a legacy MySQL 5.x server.\n\
            \n\
            ## Policy\n\
            - SELECT, SHOW, DESCRIBE and EXPLAIN always run\n\
            {write_line}\n\
            - One statement per call; DDL, GRANT, LOCK, transactions and procedure calls are refused\n\
            - At most {limit} rows are returned; `truncated` marks a cut result\n\
            {database_line}\n\
            \n\
            ## Compatibility\n\
            JSON functions, window functions and extended full-text search are reported as warnings.\n\
            Integers beyond ±(2^53-1) are returned as strings.",
            limit = self.gateway.row_limit(),
        )
    }
}

#[tool_router]
impl GatewayService {
    #[tool(description = "List all databases visible to the configured MySQL account.")]
    async fn list_databases(&self) -> Result<Json<ListDatabasesOutput>, McpError> {
        let handler = SchemaToolHandler::new(self.gateway.clone());
        handler
            .list_databases()
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(
        description = "List the tables of a database.\nUses the default database when `database` is omitted."
    )]
    async fn list_tables(
        &self,
        Parameters(input): Parameters<ListTablesInput>,
    ) -> Result<Json<ListTablesOutput>, McpError> {
        let handler = SchemaToolHandler::new(self.gateway.clone());
        handler
            .list_tables(input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(
        description = "Describe the columns of a table: name, type, nullability, key role, default and extra.\nUses the default database when `database` is omitted."
    )]
    async fn describe_table(
        &self,
        Parameters(input): Parameters<DescribeTableInput>,
    ) -> Result<Json<DescribeTableOutput>, McpError> {
        let handler = SchemaToolHandler::new(self.gateway.clone());
        handler
            .describe_table(input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(
        description = "Execute a single SQL statement and return rows with column metadata.\nSELECT, SHOW, DESCRIBE and EXPLAIN are always allowed; INSERT, UPDATE and DELETE only when enabled by the server.\nSupports positional `?` parameters.\nQueries using features missing from MySQL 5.x carry `warnings`."
    )]
    async fn execute_query(
        &self,
        Parameters(input): Parameters<ExecuteQueryInput>,
    ) -> Result<Json<ExecuteQueryOutput>, McpError> {
        let handler = QueryToolHandler::new(self.gateway.clone());
        handler
            .execute_query(input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }
}

#[tool_handler]
impl ServerHandler for GatewayService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "legacy-mysql-mcp-server".to_owned(),
                title: Some("Legacy MySQL MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(self.instructions()),
        }
    }
}
