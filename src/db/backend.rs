//! The session backend seam.
//!
//! [`SessionBackend`] is everything the connection manager needs from a
//! driver: build a pool, check sessions out, select a database, run one
//! statement, and give sessions back (or throw them away). The production
//! implementation is [`crate::db::mysql::MySqlBackend`]; tests plug in an
//! in-memory double to observe session identity.

use crate::error::DbResult;
use crate::models::{ColumnMetadata, QueryParam, Row};
use std::future::Future;

/// How a statement's outcome is collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    /// Stream rows, stopping after `limit` of them.
    Fetch { limit: usize },
    /// Collect the affected row count and last insert id.
    Write,
}

/// One statement ready for the driver. `sql` is the caller's original text.
#[derive(Debug, Clone, Copy)]
pub struct Statement<'a> {
    pub sql: &'a str,
    pub params: &'a [QueryParam],
    pub mode: ExecMode,
}

impl<'a> Statement<'a> {
    pub fn fetch(sql: &'a str, params: &'a [QueryParam], limit: usize) -> Self {
        Self {
            sql,
            params,
            mode: ExecMode::Fetch { limit },
        }
    }

    pub fn write(sql: &'a str, params: &'a [QueryParam]) -> Self {
        Self {
            sql,
            params,
            mode: ExecMode::Write,
        }
    }
}

/// Decoded driver output, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResult {
    pub columns: Vec<ColumnMetadata>,
    pub rows: Vec<Row>,
    pub rows_affected: Option<u64>,
    pub last_insert_id: Option<u64>,
}

/// Driver operations behind the connection manager.
///
/// A `Session` is exclusively owned by whoever holds it. Handing it to
/// `release` returns it for reuse; `discard` must guarantee it is never
/// handed out again.
pub trait SessionBackend: Send + Sync + 'static {
    type Pool: Send + Sync + 'static;
    type Session: Send;

    /// Create the pool. Called at most once per successful initialisation.
    fn connect(&self) -> impl Future<Output = DbResult<Self::Pool>> + Send;

    /// Check out a session, waiting while the pool is at capacity.
    fn acquire(&self, pool: &Self::Pool) -> impl Future<Output = DbResult<Self::Session>> + Send;

    /// Make `database` the session's active database. The name is already validated.
    fn select_database(
        &self,
        session: &mut Self::Session,
        database: &str,
    ) -> impl Future<Output = DbResult<()>> + Send;

    fn run(
        &self,
        session: &mut Self::Session,
        statement: &Statement<'_>,
    ) -> impl Future<Output = DbResult<RawResult>> + Send;

    fn release(&self, session: Self::Session) -> impl Future<Output = ()> + Send;

    fn discard(&self, session: Self::Session) -> impl Future<Output = ()> + Send;

    fn close(&self, pool: &Self::Pool) -> impl Future<Output = ()> + Send;
}
