//! Schema-related data models.

use serde::{Deserialize, Serialize};

/// The key role MySQL reports for a column in `DESCRIBE` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyRole {
    /// `PRI`
    Primary,
    /// `UNI`
    Unique,
    /// `MUL`: first column of a non-unique index
    Multiple,
    /// Empty
    None,
}

impl KeyRole {
    pub fn from_mysql(key: &str) -> Self {
        match key.trim().to_ascii_uppercase().as_str() {
            "PRI" => Self::Primary,
            "UNI" => Self::Unique,
            "MUL" => Self::Multiple,
            _ => Self::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Unique => "unique",
            Self::Multiple => "multiple",
            Self::None => "none",
        }
    }
}

/// Items read from an enumeration statement.
///
/// `truncated` is set when the server had more rows than the row cap allowed.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub truncated: bool,
}

/// One column of a described table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Full type (e.g., `varchar(30)`, `bigint(20) unsigned`)
    pub data_type: String,
    pub nullable: bool,
    pub key: KeyRole,
    /// Default as reported by the server; `None` means no default (or NULL).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// e.g. `auto_increment`, `on update CURRENT_TIMESTAMP`
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub extra: String,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable,
            key: KeyRole::None,
            default_value: None,
            extra: String::new(),
        }
    }

    pub fn with_key(mut self, key: KeyRole) -> Self {
        self.key = key;
        self
    }

    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = extra.into();
        self
    }
}
