//! MySQL identifier validation and quoting.
//!
//! Table and database names supplied by callers are never interpolated raw.
//! They must match a conservative character set and are then wrapped in
//! backticks.

use crate::error::{DbError, DbResult};
use once_cell::sync::Lazy;
use regex::Regex;

/// MySQL limit for database and table names.
pub const MAX_IDENTIFIER_LENGTH: usize = 64;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_$-]+$")
        .unwrap_or_else(|e| panic!("Internal error: invalid identifier pattern: {}", e))
});

/// Validate a database or table name.
pub fn validate_identifier(identifier: &str) -> DbResult<&str> {
    if identifier.is_empty() {
        return Err(DbError::invalid_input("Identifier cannot be empty"));
    }

    if identifier.chars().count() > MAX_IDENTIFIER_LENGTH {
        return Err(DbError::invalid_input(format!(
            "Identifier exceeds maximum length of {} characters",
            MAX_IDENTIFIER_LENGTH
        )));
    }

    if !IDENTIFIER.is_match(identifier) {
        return Err(DbError::invalid_input(format!(
            "Identifier '{}' may only contain letters, digits, '_', '$' and '-'",
            identifier
        )));
    }

    Ok(identifier)
}

/// Validate and backtick-quote an identifier.
///
/// ```
/// use legacy_mysql_mcp::tools::identifier::quote_identifier;
///
/// assert_eq!(quote_identifier("orders").unwrap(), "`orders`");
/// assert!(quote_identifier("orders`; DROP TABLE x").is_err());
/// ```
pub fn quote_identifier(identifier: &str) -> DbResult<String> {
    validate_identifier(identifier).map(|id| format!("`{}`", id))
}
