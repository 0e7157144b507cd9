//! In-memory session backend for integration tests.
//!
//! `FakeBackend` hands out numbered sessions under a capacity limit and logs
//! every checkout, release and discard so tests can observe session identity.
//! Statements are answered from a small fixed catalogue:
//!
//! - `SHOW DATABASES` / `SHOW TABLES` / `DESCRIBE ...` read the configured schema
//! - `SELECT * FROM big` yields `big_rows` rows, streamed up to the fetch limit
//! - `SELECT * FROM wide` yields one row of integers beyond 2^53
//! - any statement mentioning `missing_table` fails like a 42S02 server error
//! - writes report one affected row and insert id 7
//! - anything else yields a single row `{"1": 1}`

#![allow(dead_code)]

use legacy_mysql_mcp::db::{ExecMode, RawResult, SessionBackend, Statement};
use legacy_mysql_mcp::error::{DbError, DbResult};
use legacy_mysql_mcp::models::{ColumnMetadata, Row};
use serde_json::{Value as JsonValue, json};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

pub struct FakeSession {
    pub id: u64,
    pub database: Option<String>,
    _permit: OwnedSemaphorePermit,
}

#[derive(Default)]
pub struct FakeState {
    next_id: AtomicU64,
    pub connects: AtomicUsize,
    pub checkouts: AtomicUsize,
    pub closed: AtomicBool,
    failing_connects: AtomicUsize,
    idle: Mutex<Vec<u64>>,
    in_use: Mutex<HashSet<u64>>,
    pub max_in_use: AtomicUsize,
    /// A session id handed out while already checked out.
    pub violations: Mutex<Vec<u64>>,
    pub released: Mutex<Vec<u64>>,
    pub discarded: Mutex<Vec<u64>>,
    /// (session id, active database, sql) per statement run
    pub statements: Mutex<Vec<(u64, Option<String>, String)>>,
}

impl FakeState {
    pub fn released(&self) -> Vec<u64> {
        self.released.lock().unwrap().clone()
    }

    pub fn discarded(&self) -> Vec<u64> {
        self.discarded.lock().unwrap().clone()
    }

    pub fn statements(&self) -> Vec<(u64, Option<String>, String)> {
        self.statements.lock().unwrap().clone()
    }

    pub fn last_session(&self) -> u64 {
        self.statements.lock().unwrap().last().map(|s| s.0).unwrap()
    }
}

pub struct FakeBackend {
    state: Arc<FakeState>,
    capacity: Arc<Semaphore>,
    connect_delay: Duration,
    run_delay: Duration,
    big_rows: usize,
    /// database name to table names
    schema: BTreeMap<String, Vec<String>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        let mut schema = BTreeMap::new();
        schema.insert(
            "shop".to_string(),
            vec![
                "customers".to_string(),
                "order_items".to_string(),
                "orders".to_string(),
            ],
        );
        schema.insert("archive".to_string(), vec!["orders_2009".to_string()]);

        Self {
            state: Arc::new(FakeState::default()),
            capacity: Arc::new(Semaphore::new(4)),
            connect_delay: Duration::ZERO,
            run_delay: Duration::ZERO,
            big_rows: 5000,
            schema,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Arc::new(Semaphore::new(capacity));
        self
    }

    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    pub fn with_run_delay(mut self, delay: Duration) -> Self {
        self.run_delay = delay;
        self
    }

    /// Add a database holding `count` generated tables.
    pub fn with_tables(mut self, database: &str, count: usize) -> Self {
        let tables = (0..count).map(|i| format!("t{i:05}")).collect();
        self.schema.insert(database.to_string(), tables);
        self
    }

    /// Fail the next `count` pool creations.
    pub fn with_failing_connects(self, count: usize) -> Self {
        self.state.failing_connects.store(count, Ordering::SeqCst);
        self
    }

    pub fn state(&self) -> Arc<FakeState> {
        Arc::clone(&self.state)
    }

    fn check_in(&self, id: u64) {
        self.state.in_use.lock().unwrap().remove(&id);
    }

    fn answer(&self, session: &FakeSession, statement: &Statement<'_>) -> DbResult<RawResult> {
        let sql = statement.sql.trim();
        if sql.contains("missing_table") {
            return Err(DbError::execution(
                "Table 'shop.missing_table' doesn't exist",
                Some("42S02".to_string()),
                "Check the SQL syntax and referenced objects",
            ));
        }

        let limit = match statement.mode {
            ExecMode::Write => {
                let is_insert = sql.to_ascii_uppercase().starts_with("INSERT");
                return Ok(RawResult {
                    rows_affected: Some(1),
                    last_insert_id: is_insert.then_some(7),
                    ..RawResult::default()
                });
            }
            ExecMode::Fetch { limit } => limit,
        };

        let (columns, rows): (Vec<&str>, Vec<JsonValue>) = match sql {
            "SHOW DATABASES" => (
                vec!["Database"],
                self.schema
                    .keys()
                    .map(|db| json!({ "Database": db }))
                    .collect(),
            ),
            "SHOW TABLES" => {
                let Some(db) = &session.database else {
                    return Err(DbError::execution(
                        "No database selected",
                        Some("3D000".to_string()),
                        "Select a database",
                    ));
                };
                let column = format!("Tables_in_{db}");
                let tables = self.schema.get(db).cloned().unwrap_or_default();
                let rows = tables
                    .iter()
                    .map(|t| {
                        let mut row = serde_json::Map::new();
                        row.insert(column.clone(), json!(t));
                        JsonValue::Object(row)
                    })
                    .collect();
                return Ok(raw(vec![column.as_str()], rows, limit));
            }
            s if s.starts_with("DESCRIBE") => (
                vec!["Field", "Type", "Null", "Key", "Default", "Extra"],
                vec![
                    json!({"Field": "id", "Type": "int(10) unsigned", "Null": "NO",
                           "Key": "PRI", "Default": null, "Extra": "auto_increment"}),
                    json!({"Field": "email", "Type": "varchar(255)", "Null": "NO",
                           "Key": "UNI", "Default": null, "Extra": ""}),
                    json!({"Field": "status", "Type": "varchar(16)", "Null": "YES",
                           "Key": "", "Default": "new", "Extra": ""}),
                ],
            ),
            "SELECT * FROM big" => (
                vec!["id"],
                (0..self.big_rows).map(|i| json!({ "id": i })).collect(),
            ),
            "SELECT * FROM wide" => (
                vec!["big_unsigned", "big_negative", "small", "doc"],
                vec![json!({
                    "big_unsigned": u64::MAX,
                    "big_negative": i64::MIN,
                    "small": 42,
                    "doc": {"counter": 9_007_199_254_740_993u64, "tags": [1, 2]},
                })],
            ),
            _ => (vec!["1"], vec![json!({"1": 1})]),
        };

        Ok(raw(columns, rows, limit))
    }
}

fn raw(columns: Vec<&str>, rows: Vec<JsonValue>, limit: usize) -> RawResult {
    let rows: Vec<Row> = rows
        .into_iter()
        .take(limit)
        .map(|r| r.as_object().cloned().unwrap())
        .collect();
    RawResult {
        columns: if rows.is_empty() {
            Vec::new()
        } else {
            columns
                .into_iter()
                .map(|c| ColumnMetadata::new(c, "VARCHAR"))
                .collect()
        },
        rows,
        rows_affected: None,
        last_insert_id: None,
    }
}

impl SessionBackend for FakeBackend {
    type Pool = ();
    type Session = FakeSession;

    async fn connect(&self) -> DbResult<()> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        if !self.connect_delay.is_zero() {
            tokio::time::sleep(self.connect_delay).await;
        }
        let failing = self.state.failing_connects.load(Ordering::SeqCst);
        if failing > 0 {
            self.state
                .failing_connects
                .store(failing - 1, Ordering::SeqCst);
            return Err(DbError::connection(
                "Failed to connect: Connection refused",
                "Check that the MySQL server is running",
            ));
        }
        Ok(())
    }

    async fn acquire(&self, _pool: &()) -> DbResult<FakeSession> {
        let permit = Arc::clone(&self.capacity)
            .acquire_owned()
            .await
            .map_err(|_| DbError::timeout("connection pool acquire"))?;

        let id = self
            .state
            .idle
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| self.state.next_id.fetch_add(1, Ordering::SeqCst) + 1);

        {
            let mut in_use = self.state.in_use.lock().unwrap();
            if !in_use.insert(id) {
                self.state.violations.lock().unwrap().push(id);
            }
            self.state
                .max_in_use
                .fetch_max(in_use.len(), Ordering::SeqCst);
        }
        self.state.checkouts.fetch_add(1, Ordering::SeqCst);

        Ok(FakeSession {
            id,
            database: None,
            _permit: permit,
        })
    }

    async fn select_database(&self, session: &mut FakeSession, database: &str) -> DbResult<()> {
        if !self.schema.contains_key(database) {
            return Err(DbError::execution(
                format!("Unknown database '{database}'"),
                Some("42000".to_string()),
                "Check the database name",
            ));
        }
        session.database = Some(database.to_string());
        Ok(())
    }

    async fn run(
        &self,
        session: &mut FakeSession,
        statement: &Statement<'_>,
    ) -> DbResult<RawResult> {
        self.state.statements.lock().unwrap().push((
            session.id,
            session.database.clone(),
            statement.sql.to_string(),
        ));
        if !self.run_delay.is_zero() {
            tokio::time::sleep(self.run_delay).await;
        }
        self.answer(session, statement)
    }

    async fn release(&self, session: FakeSession) {
        self.check_in(session.id);
        self.state.released.lock().unwrap().push(session.id);
        self.state.idle.lock().unwrap().push(session.id);
    }

    async fn discard(&self, session: FakeSession) {
        self.check_in(session.id);
        self.state.discarded.lock().unwrap().push(session.id);
    }

    async fn close(&self, _pool: &()) {
        self.state.closed.store(true, Ordering::SeqCst);
    }
}
