//! MySQL backend over `sqlx`.
//!
//! Sessions are pooled `PoolConnection<MySql>` values. Every connection is
//! tuned for the 5.x server line when the pool is created:
//!
//! - `utf8mb4` character set
//! - no prepared-statement cache
//! - strict SQL mode appended to the server's session `sql_mode`
//! - `||` keeps its server meaning (no `PIPES_AS_CONCAT`)
//! - only the pool acquire has a timeout; statements run unbounded

use crate::config::{DEFAULT_IDLE_TIMEOUT_SECS, Settings};
use crate::db::backend::{ExecMode, RawResult, SessionBackend, Statement};
use crate::db::executor;
use crate::db::types::RowToJson;
use crate::error::{DbError, DbResult};
use crate::tools::identifier::quote_identifier;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::pool::PoolConnection;
use sqlx::{Executor, MySql, MySqlPool};
use std::time::Duration;
use tracing::{debug, info, warn};

const STRICT_MODE_SQL: &str = "SET SESSION sql_mode = TRIM(BOTH ',' FROM CONCAT(@@SESSION.sql_mode, ',STRICT_ALL_TABLES'))";

/// Production [`SessionBackend`] for MySQL and MariaDB 5.x servers.
#[derive(Debug, Clone)]
pub struct MySqlBackend {
    options: MySqlConnectOptions,
    max_connections: u32,
    acquire_timeout: Duration,
}

impl MySqlBackend {
    pub fn new(settings: &Settings) -> Self {
        let mut options = MySqlConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.user)
            .password(&settings.password)
            .charset("utf8mb4")
            .statement_cache_capacity(0)
            .pipes_as_concat(false);
        if let Some(database) = &settings.database {
            options = options.database(database);
        }

        Self {
            options,
            max_connections: settings.max_connections,
            acquire_timeout: settings.timeout,
        }
    }

    /// Generate a helpful suggestion for connection errors.
    fn connection_suggestion(error: &sqlx::Error) -> &'static str {
        let error_str = error.to_string().to_lowercase();

        if error_str.contains("connection refused") {
            return "Check that the MySQL server is running and MYSQL_HOST/MYSQL_PORT are correct";
        }
        if error_str.contains("access denied") || error_str.contains("password") {
            return "Verify MYSQL_USER and MYSQL_PASSWORD";
        }
        if error_str.contains("unknown database") {
            return "Check that MYSQL_DATABASE names an existing database";
        }
        if error_str.contains("tls") || error_str.contains("ssl") {
            return "Check TLS/SSL configuration or build with a TLS feature";
        }
        if error_str.contains("timed out") {
            return "The server did not answer within MYSQL_TIMEOUT_MS";
        }
        "Verify MYSQL_HOST, MYSQL_PORT and the credentials"
    }
}

impl SessionBackend for MySqlBackend {
    type Pool = MySqlPool;
    type Session = PoolConnection<MySql>;

    async fn connect(&self) -> DbResult<MySqlPool> {
        info!(
            max_connections = self.max_connections,
            acquire_timeout_ms = self.acquire_timeout.as_millis() as u64,
            "Creating MySQL connection pool"
        );

        let pool = MySqlPoolOptions::new()
            .min_connections(0)
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(Some(Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS)))
            .test_before_acquire(true)
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    conn.execute(STRICT_MODE_SQL).await?;
                    Ok(())
                })
            })
            .connect_with(self.options.clone())
            .await
            .map_err(|e| {
                DbError::connection(
                    format!("Failed to connect: {}", e),
                    Self::connection_suggestion(&e),
                )
            })?;

        match sqlx::query_scalar::<_, String>("SELECT VERSION()")
            .fetch_one(&pool)
            .await
        {
            Ok(version) => info!(version = %version, "Connected to MySQL"),
            Err(e) => warn!(error = %e, "Failed to read server version"),
        }

        Ok(pool)
    }

    async fn acquire(&self, pool: &MySqlPool) -> DbResult<PoolConnection<MySql>> {
        Ok(pool.acquire().await?)
    }

    async fn select_database(
        &self,
        session: &mut PoolConnection<MySql>,
        database: &str,
    ) -> DbResult<()> {
        let sql = format!("USE {}", quote_identifier(database)?);
        (&mut **session).execute(sql.as_str()).await?;
        Ok(())
    }

    async fn run(
        &self,
        session: &mut PoolConnection<MySql>,
        statement: &Statement<'_>,
    ) -> DbResult<RawResult> {
        match statement.mode {
            ExecMode::Fetch { limit } => {
                let rows =
                    executor::fetch_rows(&mut **session, statement.sql, statement.params, limit)
                        .await?;
                Ok(RawResult {
                    columns: rows
                        .first()
                        .map(|r| r.column_metadata())
                        .unwrap_or_default(),
                    rows: rows.iter().map(|r| r.to_json_map()).collect(),
                    rows_affected: None,
                    last_insert_id: None,
                })
            }
            ExecMode::Write => {
                let (rows_affected, last_insert_id) =
                    executor::execute_write(&mut **session, statement.sql, statement.params)
                        .await?;
                Ok(RawResult {
                    rows_affected: Some(rows_affected),
                    last_insert_id: (last_insert_id != 0).then_some(last_insert_id),
                    ..RawResult::default()
                })
            }
        }
    }

    async fn release(&self, session: PoolConnection<MySql>) {
        drop(session);
    }

    async fn discard(&self, session: PoolConnection<MySql>) {
        if let Err(e) = session.close().await {
            debug!(error = %e, "Error while closing discarded session");
        }
    }

    async fn close(&self, pool: &MySqlPool) {
        pool.close().await;
    }
}
