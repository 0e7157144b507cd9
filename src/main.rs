//! Legacy MySQL MCP Server - Main entry point.

use clap::Parser;
use legacy_mysql_mcp::config::{Config, TransportMode};
use legacy_mysql_mcp::db::MySqlBackend;
use legacy_mysql_mcp::mcp::GatewayService;
use legacy_mysql_mcp::tools::QueryGateway;
use legacy_mysql_mcp::transport::{HttpTransport, StdioTransport, Transport};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
///
/// Logs always go to stderr: with the stdio transport, stdout is the protocol
/// channel.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();

    init_tracing(&config);

    let settings = match config.resolve() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            eprintln!("Required: MYSQL_HOST, MYSQL_USER and MYSQL_PASSWORD (may be empty).");
            eprintln!();
            eprintln!("Example:");
            eprintln!("  MYSQL_HOST=db.internal MYSQL_USER=reporter MYSQL_PASSWORD=secret \\");
            eprintln!("  MYSQL_DATABASE=shop legacy-mysql-mcp-server");
            std::process::exit(1);
        }
    };

    info!(
        transport = %config.transport,
        "Starting Legacy MySQL MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );
    info!(?settings, "Resolved configuration");

    // The pool is created by the first tool call, not here.
    let gateway = QueryGateway::from_settings(MySqlBackend::new(&settings), &settings);
    let service = GatewayService::new(gateway);

    let result = match config.transport {
        TransportMode::Stdio => {
            info!("Using stdio transport");
            let transport = StdioTransport::new(service);
            transport.run().await
        }
        TransportMode::Http => {
            info!(
                bind = %config.http_bind_addr(),
                endpoint = %config.mcp_endpoint,
                "Using HTTP transport"
            );
            let transport = HttpTransport::new(
                service,
                &config.http_host,
                config.http_port,
                &config.mcp_endpoint,
            );
            transport.run().await
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
