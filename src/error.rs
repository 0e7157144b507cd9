//! Error types for the gateway.
//!
//! Every failure the pipeline can produce is a [`DbError`]. Callers that only
//! care about the coarse taxonomy use [`DbError::category`]; the MCP layer
//! converts errors into `rmcp::ErrorData` with a category tag and, where one is
//! known, a suggestion for the caller.

use crate::tools::admission::DenialReason;
use thiserror::Error;

/// Caller-facing error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A required setting is absent or malformed. Fatal at startup.
    Configuration,
    /// The admission policy refused the query. Recoverable by the caller.
    QueryDenied,
    /// The tool input itself was unusable (bad identifier, wrong parameter shape).
    InvalidInput,
    /// The server or driver failed a permitted query.
    ExecutionFailed,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration_error",
            Self::QueryDenied => "query_denied",
            Self::InvalidInput => "invalid_input",
            Self::ExecutionFailed => "execution_failed",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Query denied: {reason}")]
    QueryDenied { reason: DenialReason },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Execution failed: {message}")]
    Execution {
        message: String,
        /// MySQL SQLSTATE, e.g. "42S02" for an unknown table
        sql_state: Option<String>,
        suggestion: String,
    },

    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Timeout: {operation}")]
    Timeout { operation: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a policy denial.
    pub fn denied(reason: DenialReason) -> Self {
        Self::QueryDenied { reason }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an execution error with optional SQL state.
    pub fn execution(
        message: impl Into<String>,
        sql_state: Option<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Execution {
            message: message.into(),
            sql_state,
            suggestion: suggestion.into(),
        }
    }

    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Map this error onto the caller-facing taxonomy.
    ///
    /// Connectivity loss, pool timeouts and decode failures all happen after
    /// admission, so they surface as execution failures.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::QueryDenied { .. } => ErrorCategory::QueryDenied,
            Self::InvalidInput { .. } => ErrorCategory::InvalidInput,
            Self::Execution { .. }
            | Self::Connection { .. }
            | Self::Timeout { .. }
            | Self::Internal { .. } => ErrorCategory::ExecutionFailed,
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            Self::Execution { suggestion, .. } => Some(suggestion),
            Self::QueryDenied { .. } => {
                Some("Rewrite the query as a single permitted statement and retry")
            }
            Self::Timeout { .. } => Some(
                "All pooled connections are busy or the server is unreachable; retry later",
            ),
            _ => None,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Timeout { .. })
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => DbError::connection(
                msg.to_string(),
                "Check MYSQL_HOST, MYSQL_PORT and the credentials",
            ),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                DbError::execution(
                    db_err.message(),
                    code,
                    "Check the SQL syntax and referenced objects",
                )
            }
            sqlx::Error::RowNotFound => DbError::execution(
                "No rows returned",
                None,
                "Verify the query conditions match existing data",
            ),
            sqlx::Error::PoolTimedOut => DbError::timeout("connection pool acquire"),
            sqlx::Error::PoolClosed => {
                DbError::connection("Connection pool is closed", "The server is shutting down")
            }
            sqlx::Error::Io(io_err) => DbError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => DbError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => DbError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnNotFound(col) => DbError::execution(
                format!("Column not found: {}", col),
                None,
                "Check the referenced column names",
            ),
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => DbError::internal(format!(
                "Column index {} out of bounds (len: {})",
                index, len
            )),
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => DbError::internal(format!("Decode error: {}", source)),
            sqlx::Error::WorkerCrashed => DbError::internal("Database worker crashed"),
            _ => DbError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Result type alias for gateway operations.
pub type DbResult<T> = Result<T, DbError>;

fn error_data(category: ErrorCategory, suggestion: Option<&str>) -> Option<serde_json::Value> {
    let mut data = serde_json::json!({ "category": category.as_str() });
    if let Some(s) = suggestion {
        data["suggestion"] = serde_json::Value::String(s.to_string());
    }
    Some(data)
}

/// Convert DbError to MCP ErrorData.
///
/// Denials, bad input and server-side SQL errors are the caller's to fix and map
/// to `invalid_params`; connectivity and internal failures map to `internal_error`.
impl From<DbError> for rmcp::ErrorData {
    fn from(err: DbError) -> Self {
        let data = error_data(err.category(), err.suggestion());
        match &err {
            DbError::QueryDenied { .. } | DbError::InvalidInput { .. } => {
                rmcp::ErrorData::invalid_params(err.to_string(), data)
            }
            DbError::Execution {
                message, sql_state, ..
            } => {
                let msg = match sql_state {
                    Some(code) => format!("Execution failed: {} (SQLSTATE: {})", message, code),
                    None => format!("Execution failed: {}", message),
                };
                rmcp::ErrorData::invalid_params(msg, data)
            }
            DbError::Configuration { .. }
            | DbError::Connection { .. }
            | DbError::Timeout { .. }
            | DbError::Internal { .. } => rmcp::ErrorData::internal_error(err.to_string(), data),
        }
    }
}
