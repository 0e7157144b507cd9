//! Statement execution on a single MySQL session.
//!
//! Row fetching is bounded by streaming: only `limit` rows are pulled from the
//! server stream, so the caller can fetch cap + 1 rows and detect truncation
//! without materialising huge results. Statements have no per-query timeout;
//! MySQL 5.x has no server-side statement timeout to back one.

use crate::db::params::bind_all;
use crate::error::{DbError, DbResult};
use crate::models::QueryParam;
use futures_util::StreamExt;
use sqlx::mysql::{MySqlConnection, MySqlRow};
use sqlx::Executor;
use tracing::debug;

/// Fetch at most `limit` rows.
///
/// Without parameters the text protocol is used, which every legacy server
/// accepts for every statement kind. With parameters a one-shot prepared
/// statement carries the positional binds.
pub async fn fetch_rows(
    conn: &mut MySqlConnection,
    sql: &str,
    params: &[QueryParam],
    limit: usize,
) -> DbResult<Vec<MySqlRow>> {
    debug!(params = params.len(), limit, "Fetching rows");

    let results = if params.is_empty() {
        (&mut *conn).fetch(sql).take(limit).collect::<Vec<_>>().await
    } else {
        bind_all(sql, params)
            .fetch(&mut *conn)
            .take(limit)
            .collect::<Vec<_>>()
            .await
    };

    collect_rows(results)
}

/// Execute a write and return (rows affected, last insert id).
pub async fn execute_write(
    conn: &mut MySqlConnection,
    sql: &str,
    params: &[QueryParam],
) -> DbResult<(u64, u64)> {
    debug!(params = params.len(), "Executing write");

    let result = if params.is_empty() {
        (&mut *conn).execute(sql).await?
    } else {
        bind_all(sql, params).execute(&mut *conn).await?
    };

    Ok((result.rows_affected(), result.last_insert_id()))
}

fn collect_rows<R>(results: Vec<Result<R, sqlx::Error>>) -> DbResult<Vec<R>> {
    let mut rows = Vec::with_capacity(results.len());
    for result in results {
        rows.push(result.map_err(DbError::from)?);
    }
    Ok(rows)
}
