//! Schema enumeration statements and their result extractors.
//!
//! Enumeration runs fixed statements through the normal query pipeline, so
//! the extractors here read normalized rows rather than driver rows.

use crate::error::{DbError, DbResult};
use crate::models::{ColumnDescriptor, KeyRole, QueryResult, Row};
use crate::tools::identifier::quote_identifier;
use serde_json::Value as JsonValue;

pub const LIST_DATABASES_SQL: &str = "SHOW DATABASES";
pub const LIST_TABLES_SQL: &str = "SHOW TABLES";

/// `DESCRIBE` for a validated, backtick-quoted table name.
pub fn describe_table_sql(table: &str) -> DbResult<String> {
    Ok(format!("DESCRIBE {}", quote_identifier(table)?))
}

/// Render a scalar cell as text. Null stays absent.
fn cell_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Values of the first column, in row order.
///
/// `SHOW DATABASES` names its column `Database` and `SHOW TABLES` names it
/// `Tables_in_<db>`, so the column is located by position.
pub fn first_column_strings(result: &QueryResult) -> Vec<String> {
    let Some(first) = result.columns.first() else {
        return Vec::new();
    };
    result
        .rows
        .iter()
        .filter_map(|row| row.get(&first.name).and_then(cell_text))
        .collect()
}

fn field<'a>(row: &'a Row, name: &str) -> Option<&'a JsonValue> {
    row.get(name)
        .or_else(|| row.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v))
}

/// Parse `DESCRIBE` output (Field, Type, Null, Key, Default, Extra).
pub fn column_descriptors(result: &QueryResult) -> DbResult<Vec<ColumnDescriptor>> {
    result
        .rows
        .iter()
        .map(|row| {
            let name = field(row, "Field").and_then(cell_text).ok_or_else(|| {
                DbError::internal("DESCRIBE output is missing the Field column")
            })?;
            let data_type = field(row, "Type").and_then(cell_text).unwrap_or_default();
            let nullable = field(row, "Null")
                .and_then(cell_text)
                .is_some_and(|n| n.eq_ignore_ascii_case("YES"));

            let mut column = ColumnDescriptor::new(name, data_type, nullable).with_key(
                KeyRole::from_mysql(&field(row, "Key").and_then(cell_text).unwrap_or_default()),
            );
            if let Some(default) = field(row, "Default").and_then(cell_text) {
                column = column.with_default(default);
            }
            if let Some(extra) = field(row, "Extra").and_then(cell_text) {
                column = column.with_extra(extra);
            }
            Ok(column)
        })
        .collect()
}
