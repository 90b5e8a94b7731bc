//! Runs a [`ValidatedSQL`] statement against a registered database and
//! returns a [`QueryResult`] (spec §4.6). This crate is the only consumer
//! of `ValidatedSQL`'s private constructor-gated text: nothing upstream of
//! the safety validator ever reaches the driver.
#[macro_use]
extern crate slog_scope;

mod error;

use std::time::{Duration, Instant};

use gateway_db_common::{DbError, QueryResult};
use gateway_registry::DatabaseRegistry;
use gateway_sql_safety::ValidatedSQL;

pub use error::ExecutorError;

/// Façade over [`DatabaseRegistry`] that acquires a connection, runs one
/// validated statement, and always releases the connection again —
/// including when the statement times out or the caller's deadline
/// expires (spec §4.6 steps 1-6).
pub struct Executor {
    registry: DatabaseRegistry,
}

impl Executor {
    pub fn new(registry: DatabaseRegistry) -> Self {
        Self { registry }
    }

    /// `deadline` bounds connection acquisition (spec §5's "pool
    /// acquisition" suspension point); `statement_timeout` bounds the
    /// statement itself once a connection is held. The two are independent:
    /// a slow-to-acquire pool does not eat into the query's own timeout
    /// budget.
    pub async fn execute(
        &self,
        db_name: &str,
        sql: &ValidatedSQL,
        deadline: Instant,
        statement_timeout: Duration,
        row_cap: u32,
    ) -> Result<QueryResult, ExecutorError> {
        let conn = self.registry.acquire(db_name, deadline).await?;

        let run = conn.execute_readonly(sql.text(), row_cap, statement_timeout);
        let result = match tokio::time::timeout(statement_timeout, run).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => Err(ExecutorError::from(e)),
            Err(_) => Err(ExecutorError::from(DbError::timeout())),
        };

        // Release unconditionally: a timed-out or failed statement still
        // owns the connection until explicitly released (spec §8 property
        // 7's idempotent release, exercised here on every code path).
        conn.release().await;

        let result = result?;
        if result.truncated {
            warn!(
                "query result truncated at row cap";
                "db" => db_name, "row_cap" => row_cap,
            );
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use gateway_db_common::Dialect;
    use gateway_sql_safety::SafetyPolicy;

    use super::*;

    #[tokio::test]
    async fn unknown_database_is_reported_without_acquiring_anything() {
        let executor = Executor::new(DatabaseRegistry::new());
        let policy = SafetyPolicy::new(false, Vec::<String>::new(), Vec::<String>::new(), 100);
        let validated = gateway_sql_safety::validate("SELECT 1", Dialect::Postgres, &policy).unwrap();

        let err = executor
            .execute(
                "ghost",
                &validated,
                Instant::now() + Duration::from_secs(1),
                Duration::from_secs(1),
                100,
            )
            .await
            .unwrap_err();

        use gateway_common::ReportableError;
        assert_eq!(err.kind_label(), "unknown_db");
    }
}
