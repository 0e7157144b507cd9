//! The query gateway: every tool call runs through [`QueryGateway::run`].
//!
//! Classification and admission happen before any connection is touched, so
//! a denied query never creates the pool or checks out a session.

use crate::config::Settings;
use crate::db::schema::{
    LIST_DATABASES_SQL, LIST_TABLES_SQL, column_descriptors, describe_table_sql,
    first_column_strings,
};
use crate::db::{ConnectionManager, SessionBackend, Statement, normalize};
use crate::error::{DbError, DbResult};
use crate::models::{ColumnDescriptor, Listing, QueryRequest, QueryResult};
use crate::tools::admission::{AccessPolicy, Decision, decide};
use crate::tools::classifier::classify;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub struct QueryGateway<B: SessionBackend> {
    connections: Arc<ConnectionManager<B>>,
    policy: AccessPolicy,
    row_limit: usize,
    debug_sql: bool,
}

impl<B: SessionBackend> Clone for QueryGateway<B> {
    fn clone(&self) -> Self {
        Self {
            connections: Arc::clone(&self.connections),
            policy: self.policy,
            row_limit: self.row_limit,
            debug_sql: self.debug_sql,
        }
    }
}

impl<B: SessionBackend> QueryGateway<B> {
    pub fn new(
        connections: Arc<ConnectionManager<B>>,
        policy: AccessPolicy,
        row_limit: usize,
    ) -> Self {
        Self {
            connections,
            policy,
            row_limit,
            debug_sql: false,
        }
    }

    /// Build a gateway over `backend` using the resolved settings.
    pub fn from_settings(backend: B, settings: &Settings) -> Self {
        let connections = Arc::new(ConnectionManager::new(backend, settings.database.clone()));
        Self::new(connections, settings.access, settings.row_limit)
            .with_debug_sql(settings.debug_sql)
    }

    /// Log every admitted statement at info level instead of debug.
    pub fn with_debug_sql(mut self, debug_sql: bool) -> Self {
        self.debug_sql = debug_sql;
        self
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub fn row_limit(&self) -> usize {
        self.row_limit
    }

    pub fn connections(&self) -> &Arc<ConnectionManager<B>> {
        &self.connections
    }

    /// Classify, admit, execute and normalize one query.
    pub async fn run(&self, request: &QueryRequest) -> DbResult<QueryResult> {
        let verdict = classify(&request.sql);

        let warnings = match decide(&verdict, &self.policy) {
            Decision::Allow { warnings } => warnings,
            Decision::Deny(reason) => {
                info!(command = %verdict.command, reason = %reason, "Query denied");
                return Err(DbError::denied(reason));
            }
        };

        for warning in &warnings {
            warn!(
                feature = warning.feature.as_str(),
                construct = %warning.construct,
                "Compatibility warning"
            );
        }

        let database = request
            .database
            .as_deref()
            .map(str::trim)
            .filter(|db| !db.is_empty());

        if self.debug_sql {
            info!(sql = %request.sql, params = request.params.len(), database = ?database, "Executing SQL");
        } else {
            debug!(sql = %request.sql, params = request.params.len(), database = ?database, "Executing SQL");
        }

        // One row past the cap tells us whether the result was cut.
        let statement = if verdict.command.is_write() {
            Statement::write(&request.sql, &request.params)
        } else {
            Statement::fetch(
                &request.sql,
                &request.params,
                self.row_limit.saturating_add(1),
            )
        };

        let start = Instant::now();
        let raw = self.connections.execute(database, &statement).await?;
        let execution_time_ms = start.elapsed().as_millis() as u64;

        let normalized = normalize(raw.rows, self.row_limit);
        let row_count = normalized.rows.len();

        debug!(
            command = %verdict.command,
            row_count,
            truncated = normalized.truncated,
            rows_affected = ?raw.rows_affected,
            execution_time_ms,
            "Query executed"
        );

        Ok(QueryResult {
            columns: raw.columns,
            rows: normalized.rows,
            row_count,
            truncated: normalized.truncated,
            rows_affected: raw.rows_affected,
            last_insert_id: raw.last_insert_id,
            warnings: warnings.iter().map(ToString::to_string).collect(),
            execution_time_ms,
        })
    }

    /// Names of all databases visible to the configured account.
    pub async fn list_databases(&self) -> DbResult<Listing<String>> {
        let result = self.run(&QueryRequest::new(LIST_DATABASES_SQL)).await?;
        Ok(Listing {
            items: first_column_strings(&result),
            truncated: result.truncated,
        })
    }

    /// Tables of `database`, or of the default database.
    pub async fn list_tables(&self, database: Option<&str>) -> DbResult<Listing<String>> {
        let request = self.schema_request(LIST_TABLES_SQL.to_string(), database)?;
        let result = self.run(&request).await?;
        Ok(Listing {
            items: first_column_strings(&result),
            truncated: result.truncated,
        })
    }

    /// Column descriptors of `table` in `database` or the default database.
    pub async fn describe_table(
        &self,
        database: Option<&str>,
        table: &str,
    ) -> DbResult<Listing<ColumnDescriptor>> {
        let sql = describe_table_sql(table.trim())?;
        let request = self.schema_request(sql, database)?;
        let result = self.run(&request).await?;
        Ok(Listing {
            items: column_descriptors(&result)?,
            truncated: result.truncated,
        })
    }

    fn schema_request(&self, sql: String, database: Option<&str>) -> DbResult<QueryRequest> {
        let database = database.map(str::trim).filter(|db| !db.is_empty());
        let mut request = QueryRequest::new(sql);
        match (database, self.connections.default_database()) {
            (Some(db), _) => request = request.with_database(db),
            (None, Some(_)) => {}
            (None, None) => {
                return Err(DbError::invalid_input(
                    "No database given and MYSQL_DATABASE is not set; pass `database`",
                ));
            }
        }
        Ok(request)
    }

    /// Close the connection pool. Later calls fail.
    pub async fn shutdown(&self) {
        self.connections.close().await;
    }
}
