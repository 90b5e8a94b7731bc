use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::descriptor::Dialect;
use crate::error::DbError;
use crate::pool_state::GetPoolState;
use crate::result::QueryResult;
use crate::schema::SchemaSnapshot;

/// A single checked-out physical connection, capable of running exactly
/// one validated, read-only statement (spec §4.6 Executor contract).
#[async_trait]
pub trait Db: Send + Sync {
    async fn execute_readonly(
        &mut self,
        sql: &str,
        row_cap: u32,
        statement_timeout: Duration,
    ) -> Result<QueryResult, DbError>;
}

/// Outcome of `DbPool::close`, reported per-pool by `DatabaseRegistry::close_all`
/// (spec §4.1 Shutdown, step 4).
#[derive(Debug, Clone, Copy, Default)]
pub struct CloseOutcome {
    pub graceful: bool,
    pub forced_terminations: u32,
}

/// Implemented once per dialect (`gateway-postgres::PgDbPool`,
/// `gateway-mysql::MysqlDbPool`). The spec's "polymorphism over databases"
/// design note (§9) is realized here: rather than the teacher's
/// compile-time, mutually-exclusive `mysql`/`postgres` Cargo features, every
/// dialect implements the *same* `DbPool`, so `DatabaseRegistry` can hold
/// `Arc<dyn DbPool>` values keyed by database name and dispatch on
/// `Dialect` only where catalog SQL actually differs.
#[async_trait]
pub trait DbPool: Send + Sync + Debug + GetPoolState {
    fn dialect(&self) -> Dialect;

    /// Acquire a connection, blocking (yielding) until one is free or
    /// `deadline` passes. Fails with `DbErrorKind::PoolClosing` immediately
    /// once `close` has been called.
    async fn acquire(&self, deadline: Instant) -> Result<PooledConnection, DbError>;

    /// Pull a fresh `SchemaSnapshot` from the catalog (spec §4.2).
    async fn introspect(&self) -> Result<SchemaSnapshot, DbError>;

    /// Mark the pool as closing and drain it within `deadline`, forcibly
    /// terminating any connections still checked out past that point (spec
    /// §4.1 Shutdown).
    async fn close(&self, deadline: Duration) -> CloseOutcome;
}

/// A checked-out connection handle. `release` is idempotent: the first
/// call drops the underlying driver connection (returning it to the pool,
/// or discarding it if the pool has begun closing); later calls are a
/// no-op, satisfying spec §8 property 7.
#[derive(Clone)]
pub struct PooledConnection {
    inner: Arc<Mutex<Option<Box<dyn Db>>>>,
}

impl PooledConnection {
    pub fn new(db: Box<dyn Db>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(db))),
        }
    }

    pub async fn execute_readonly(
        &self,
        sql: &str,
        row_cap: u32,
        statement_timeout: Duration,
    ) -> Result<QueryResult, DbError> {
        let mut guard = self.inner.lock().await;
        match guard.as_mut() {
            Some(db) => db.execute_readonly(sql, row_cap, statement_timeout).await,
            None => Err(DbError::internal("connection already released")),
        }
    }

    /// Idempotent: does nothing if already released.
    pub async fn release(&self) {
        let mut guard = self.inner.lock().await;
        guard.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_common::ReportableError;

    struct NeverCalled;

    #[async_trait]
    impl Db for NeverCalled {
        async fn execute_readonly(
            &mut self,
            _sql: &str,
            _row_cap: u32,
            _statement_timeout: Duration,
        ) -> Result<QueryResult, DbError> {
            unreachable!("released connection must not be queried")
        }
    }

    #[tokio::test]
    async fn release_is_idempotent() {
        let conn = PooledConnection::new(Box::new(NeverCalled));
        conn.release().await;
        conn.release().await;

        let err = conn
            .execute_readonly("SELECT 1", 10, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind_label(), "internal_error");
    }
}
