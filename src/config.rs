//! Configuration handling for the gateway.
//!
//! Every option is available both as a CLI flag and as an environment variable.
//! [`Config`] is the raw parsed form; [`Config::resolve`] validates it into the
//! immutable [`Settings`] value that the rest of the process reads.

use crate::error::{DbError, DbResult};
use crate::tools::admission::{AccessPolicy, CompatibilityPolicy};
use crate::tools::identifier::validate_identifier;
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, ValueEnum};
use std::time::Duration;

pub const DEFAULT_MYSQL_PORT: u16 = 3306;
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_ROW_LIMIT: usize = 1000;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;

pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_MCP_ENDPOINT: &str = "/";

/// Transport mode for the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransportMode {
    /// Standard input/output (for CLI integration)
    #[default]
    Stdio,
    /// Streamable HTTP (for web clients)
    Http,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

/// Command line and environment configuration.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "legacy-mysql-mcp-server",
    about = "MCP gateway for legacy MySQL servers with a read-mostly query policy",
    version,
    author
)]
pub struct Config {
    /// MySQL server host (required)
    #[arg(long = "host", env = "MYSQL_HOST")]
    pub host: Option<String>,

    /// MySQL server port
    #[arg(long = "port", default_value_t = DEFAULT_MYSQL_PORT, env = "MYSQL_PORT")]
    pub port: u16,

    /// MySQL user (required)
    #[arg(long = "user", env = "MYSQL_USER")]
    pub user: Option<String>,

    /// MySQL password (required, may be empty)
    #[arg(long = "password", env = "MYSQL_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Default database selected on every session
    #[arg(long = "database", env = "MYSQL_DATABASE")]
    pub database: Option<String>,

    /// Permit INSERT statements
    #[arg(
        long,
        env = "MYSQL_ALLOW_INSERT",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub allow_insert: bool,

    /// Permit UPDATE statements
    #[arg(
        long,
        env = "MYSQL_ALLOW_UPDATE",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub allow_update: bool,

    /// Permit DELETE statements
    #[arg(
        long,
        env = "MYSQL_ALLOW_DELETE",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub allow_delete: bool,

    /// Connection acquire/establish timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS, env = "MYSQL_TIMEOUT_MS")]
    pub timeout_ms: u64,

    /// Maximum rows returned per query
    #[arg(long, default_value_t = DEFAULT_ROW_LIMIT, env = "MYSQL_ROW_LIMIT")]
    pub row_limit: usize,

    /// Log every SQL statement at info level
    #[arg(
        long,
        env = "MYSQL_DEBUG_SQL",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub debug_sql: bool,

    /// Upper bound on concurrently open sessions
    #[arg(long, default_value_t = DEFAULT_MAX_CONNECTIONS, env = "MYSQL_MAX_CONNECTIONS")]
    pub max_connections: u32,

    /// What to do with queries using features the server lacks (warn or deny)
    #[arg(long, value_enum, default_value = "warn", env = "MYSQL_COMPAT_POLICY")]
    pub compat_policy: CompatibilityPolicy,

    /// Transport mode (stdio or http)
    #[arg(
        short,
        long,
        value_enum,
        default_value = "stdio",
        env = "MCP_TRANSPORT"
    )]
    pub transport: TransportMode,

    /// HTTP host to bind to (only used with http transport)
    #[arg(long, default_value = DEFAULT_HTTP_HOST, env = "MCP_HTTP_HOST")]
    pub http_host: String,

    /// HTTP port to bind to (only used with http transport)
    #[arg(long, default_value_t = DEFAULT_HTTP_PORT, env = "MCP_HTTP_PORT")]
    pub http_port: u16,

    /// MCP endpoint path (only used with http transport)
    #[arg(long, default_value = DEFAULT_MCP_ENDPOINT, env = "MCP_ENDPOINT")]
    pub mcp_endpoint: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "MCP_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "MCP_JSON_LOGS")]
    pub json_logs: bool,
}

/// Validated, immutable settings shared by every pipeline stage.
#[derive(Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: Option<String>,
    pub access: AccessPolicy,
    pub timeout: Duration,
    pub row_limit: usize,
    pub max_connections: u32,
    pub debug_sql: bool,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .field("access", &self.access)
            .field("timeout", &self.timeout)
            .field("row_limit", &self.row_limit)
            .field("max_connections", &self.max_connections)
            .field("debug_sql", &self.debug_sql)
            .finish()
    }
}

fn required(value: &Option<String>, name: &str) -> DbResult<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(DbError::configuration(format!(
            "{name} is required but was not set"
        ))),
    }
}

impl Config {
    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            host: None,
            port: DEFAULT_MYSQL_PORT,
            user: None,
            password: None,
            database: None,
            allow_insert: false,
            allow_update: false,
            allow_delete: false,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            row_limit: DEFAULT_ROW_LIMIT,
            debug_sql: false,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            compat_policy: CompatibilityPolicy::Warn,
            transport: TransportMode::Stdio,
            http_host: DEFAULT_HTTP_HOST.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            mcp_endpoint: DEFAULT_MCP_ENDPOINT.to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    /// Validate the parsed options into [`Settings`].
    ///
    /// Host and user must be non-blank. The password must be present but may be
    /// empty, since MySQL accounts without a password are legal.
    pub fn resolve(&self) -> DbResult<Settings> {
        let host = required(&self.host, "MYSQL_HOST")?;
        let user = required(&self.user, "MYSQL_USER")?;
        let password = self
            .password
            .clone()
            .ok_or_else(|| DbError::configuration("MYSQL_PASSWORD is required but was not set"))?;

        if self.row_limit == 0 {
            return Err(DbError::configuration(
                "MYSQL_ROW_LIMIT must be greater than 0",
            ));
        }
        if self.timeout_ms == 0 {
            return Err(DbError::configuration(
                "MYSQL_TIMEOUT_MS must be greater than 0",
            ));
        }
        if self.max_connections == 0 {
            return Err(DbError::configuration(
                "MYSQL_MAX_CONNECTIONS must be greater than 0",
            ));
        }

        let database = self
            .database
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(|d| {
                validate_identifier(d)
                    .map(str::to_string)
                    .map_err(|e| DbError::configuration(format!("MYSQL_DATABASE is invalid: {}", e)))
            })
            .transpose()?;

        Ok(Settings {
            host,
            port: self.port,
            user,
            password,
            database,
            access: AccessPolicy {
                allow_insert: self.allow_insert,
                allow_update: self.allow_update,
                allow_delete: self.allow_delete,
                compatibility: self.compat_policy,
            },
            timeout: Duration::from_millis(self.timeout_ms),
            row_limit: self.row_limit,
            max_connections: self.max_connections,
            debug_sql: self.debug_sql,
        })
    }

    /// Get the HTTP bind address.
    pub fn http_bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    fn complete() -> Config {
        Config {
            host: Some("db.internal".to_string()),
            user: Some("reporter".to_string()),
            password: Some("secret".to_string()),
            ..Config::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 3306);
        assert_eq!(config.timeout_ms, 10_000);
        assert_eq!(config.row_limit, 1000);
        assert!(!config.allow_insert && !config.allow_update && !config.allow_delete);
        assert_eq!(config.transport, TransportMode::Stdio);
    }

    #[test]
    fn test_resolve_complete() {
        let settings = complete().resolve().unwrap();
        assert_eq!(settings.host, "db.internal");
        assert_eq!(settings.timeout, Duration::from_millis(10_000));
        assert_eq!(settings.database, None);
        assert!(!settings.access.allow_insert);
        assert_eq!(settings.access.compatibility, CompatibilityPolicy::Warn);
    }

    #[test]
    fn test_missing_credentials_are_configuration_errors() {
        for config in [
            Config {
                host: None,
                ..complete()
            },
            Config {
                user: Some("   ".to_string()),
                ..complete()
            },
            Config {
                password: None,
                ..complete()
            },
        ] {
            let err = config.resolve().unwrap_err();
            assert_eq!(err.category(), ErrorCategory::Configuration);
        }
    }

    #[test]
    fn test_empty_password_is_allowed() {
        let config = Config {
            password: Some(String::new()),
            ..complete()
        };
        assert!(config.resolve().is_ok());
    }

    #[test]
    fn test_zero_limits_rejected() {
        assert!(Config { row_limit: 0, ..complete() }.resolve().is_err());
        assert!(Config { timeout_ms: 0, ..complete() }.resolve().is_err());
        assert!(
            Config {
                max_connections: 0,
                ..complete()
            }
            .resolve()
            .is_err()
        );
    }

    #[test]
    fn test_blank_database_means_none() {
        let config = Config {
            database: Some("  ".to_string()),
            ..complete()
        };
        assert_eq!(config.resolve().unwrap().database, None);
    }

    #[test]
    fn test_malformed_database_is_configuration_error() {
        let too_long = "d".repeat(65);
        for database in ["bad db`x", "shop; DROP", too_long.as_str()] {
            let err = Config {
                database: Some(database.to_string()),
                ..complete()
            }
            .resolve()
            .unwrap_err();
            assert_eq!(err.category(), ErrorCategory::Configuration, "{database:?}");
            assert!(err.to_string().contains("MYSQL_DATABASE"));
        }

        let settings = Config {
            database: Some(" shop ".to_string()),
            ..complete()
        }
        .resolve()
        .unwrap();
        assert_eq!(settings.database.as_deref(), Some("shop"));
    }

    #[test]
    fn test_cli_flags_parse() {
        let config = Config::try_parse_from([
            "legacy-mysql-mcp-server",
            "--host",
            "10.0.0.5",
            "--user",
            "app",
            "--password",
            "pw",
            "--allow-insert",
            "--allow-delete",
            "yes",
            "--row-limit",
            "50",
            "--compat-policy",
            "deny",
        ])
        .unwrap();
        let settings = config.resolve().unwrap();
        assert!(settings.access.allow_insert);
        assert!(!settings.access.allow_update);
        assert!(settings.access.allow_delete);
        assert_eq!(settings.row_limit, 50);
        assert_eq!(settings.access.compatibility, CompatibilityPolicy::Deny);
    }

    #[test]
    fn test_debug_redacts_password() {
        let settings = complete().resolve().unwrap();
        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn test_http_bind_addr() {
        let config = Config {
            http_host: "0.0.0.0".to_string(),
            http_port: 3000,
            ..Config::default()
        };
        assert_eq!(config.http_bind_addr(), "0.0.0.0:3000");
    }
}
