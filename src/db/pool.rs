//! Connection management.
//!
//! [`ConnectionManager`] owns the lazily created pool and runs statements on
//! checked-out sessions. It is constructed once by the entry point and shared
//! by handle; there is no global pool state.
//!
//! Session discipline:
//! - a session is held by exactly one execution at a time (the pool queues
//!   acquisitions beyond its capacity)
//! - every session is given back exactly once, through `release` or `discard`
//! - a session that saw any error is discarded, never reused

use crate::db::backend::{RawResult, SessionBackend, Statement};
use crate::error::{DbError, DbResult};
use crate::tools::identifier::validate_identifier;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

pub struct ConnectionManager<B: SessionBackend> {
    backend: B,
    /// Single-flight lazy pool. Stays empty after a failed creation so the
    /// next call retries.
    pool: OnceCell<B::Pool>,
    default_database: Option<String>,
    closed: AtomicBool,
}

impl<B: SessionBackend> ConnectionManager<B> {
    pub fn new(backend: B, default_database: Option<String>) -> Self {
        Self {
            backend,
            pool: OnceCell::new(),
            default_database,
            closed: AtomicBool::new(false),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn default_database(&self) -> Option<&str> {
        self.default_database.as_deref()
    }

    /// Whether the pool has been created.
    pub fn is_initialized(&self) -> bool {
        self.pool.initialized()
    }

    async fn pool(&self) -> DbResult<&B::Pool> {
        if self.closed.load(Ordering::Acquire) {
            return Err(closed_error());
        }
        let pool = self
            .pool
            .get_or_try_init(|| async {
                debug!("Creating connection pool on first use");
                self.backend.connect().await
            })
            .await?;

        // close() may have run while the pool was being created and found
        // nothing to close.
        if self.closed.load(Ordering::Acquire) {
            self.backend.close(pool).await;
            return Err(closed_error());
        }
        Ok(pool)
    }

    /// Run one statement on a fresh checkout.
    ///
    /// `database` overrides the configured default for this call only. When a
    /// target database resolves (override or default) the session switches to
    /// it before the statement runs.
    pub async fn execute(
        &self,
        database: Option<&str>,
        statement: &Statement<'_>,
    ) -> DbResult<RawResult> {
        let target = database.or(self.default_database.as_deref());
        if let Some(db) = target {
            validate_identifier(db)?;
        }

        let pool = self.pool().await?;
        let mut session = self.backend.acquire(pool).await?;

        let outcome = async {
            if let Some(db) = target {
                self.backend.select_database(&mut session, db).await?;
            }
            self.backend.run(&mut session, statement).await
        }
        .await;

        match outcome {
            Ok(result) => {
                // Without a default to switch back to, a session left on an
                // override database must not serve a later call.
                if database.is_some() && self.default_database.is_none() {
                    debug!("Retiring session switched to an override database");
                    self.backend.discard(session).await;
                } else {
                    self.backend.release(session).await;
                }
                Ok(result)
            }
            Err(e) => {
                warn!(error = %e, "Statement failed; discarding session");
                self.backend.discard(session).await;
                Err(e)
            }
        }
    }

    /// Close the pool. Later calls fail with a connection error.
    pub async fn close(&self) {
        self.closed.store(true, Ordering::Release);
        if let Some(pool) = self.pool.get() {
            self.backend.close(pool).await;
            info!("Connection pool closed");
        }
    }
}

fn closed_error() -> DbError {
    DbError::connection("Connection manager is closed", "The server is shutting down")
}

impl<B: SessionBackend + std::fmt::Debug> std::fmt::Debug for ConnectionManager<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("backend", &self.backend)
            .field("initialized", &self.pool.initialized())
            .field("default_database", &self.default_database)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}
