//! Stdio transport for the MCP server.
//!
//! This transport uses standard input/output for communication,
//! which is the standard mode for CLI-based MCP integrations. Logs go to
//! stderr so stdout carries only protocol messages.

use crate::error::{DbError, DbResult};
use crate::mcp::GatewayService;
use crate::transport::{Transport, wait_for_signal};
use rmcp::{ServiceExt, transport::stdio};
use tracing::{info, warn};

/// Stdio transport implementation.
pub struct StdioTransport {
    service: GatewayService,
}

impl StdioTransport {
    pub fn new(service: GatewayService) -> Self {
        Self { service }
    }
}

impl Transport for StdioTransport {
    async fn run(&self) -> DbResult<()> {
        info!("Starting MCP server with stdio transport");

        let running_service = self
            .service
            .clone()
            .serve(stdio())
            .await
            .map_err(|e| DbError::internal(format!("Failed to start stdio transport: {}", e)))?;

        let shutdown_requested = tokio::select! {
            result = running_service.waiting() => {
                match result {
                    Ok(_quit_reason) => info!("Stdio transport completed normally"),
                    Err(e) => {
                        warn!(error = %e, "Stdio transport error");
                        self.service.gateway().shutdown().await;
                        return Err(DbError::internal(format!("Stdio transport error: {}", e)));
                    }
                }
                false
            }
            _ = wait_for_signal() => {
                info!("Shutdown signal received (send again to force exit)");
                true
            }
        };

        if shutdown_requested {
            tokio::spawn(async {
                wait_for_signal().await;
                warn!("Received second signal, forcing immediate exit");
                std::process::exit(1);
            });
        }

        info!("Closing database connections");
        self.service.gateway().shutdown().await;

        if shutdown_requested {
            // A blocking stdin read cannot be interrupted by select!.
            info!("Exiting process");
            std::process::exit(0);
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdio"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::MySqlBackend;
    use crate::tools::QueryGateway;

    #[test]
    fn test_stdio_transport_creation() {
        let settings = Config {
            host: Some("localhost".to_string()),
            user: Some("root".to_string()),
            password: Some(String::new()),
            ..Config::default()
        }
        .resolve()
        .unwrap();
        let gateway = QueryGateway::from_settings(MySqlBackend::new(&settings), &settings);
        let transport = StdioTransport::new(GatewayService::new(gateway));
        assert_eq!(transport.name(), "stdio");
    }
}
