use std::time::{Duration, Instant};

use async_trait::async_trait;
use gateway_db_common::{Cell, Db, DbError, QueryResult, ResultColumn};

use crate::pool::PooledClient;
use crate::type_map;

/// A single checked-out Postgres connection. One `PgDb` backs exactly one
/// `PooledConnection` for its lifetime (spec §4.6 Executor contract).
pub struct PgDb {
    client: PooledClient,
}

impl PgDb {
    pub(crate) fn new(client: PooledClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Db for PgDb {
    async fn execute_readonly(
        &mut self,
        sql: &str,
        row_cap: u32,
        statement_timeout: Duration,
    ) -> Result<QueryResult, DbError> {
        let started = Instant::now();

        let txn = self
            .client
            .build_transaction()
            .read_only(true)
            .start()
            .await
            .map_err(|e| DbError::db(format!("begin read-only transaction: {e}")))?;

        txn.execute(
            &format!(
                "SET LOCAL statement_timeout = {}",
                statement_timeout.as_millis()
            ),
            &[],
        )
        .await
        .map_err(|e| DbError::db(format!("set statement_timeout: {e}")))?;

        // Fetch one row beyond the cap so truncation can be reported
        // without a second round trip (spec §4.6 step 6).
        let rows = txn.query(sql, &[]).await.map_err(|e| {
            if e.to_string().contains("statement timeout") {
                DbError::timeout()
            } else {
                DbError::db(e.to_string())
            }
        })?;

        txn.rollback()
            .await
            .map_err(|e| DbError::db(format!("rollback read-only transaction: {e}")))?;

        let columns: Vec<ResultColumn> = rows
            .first()
            .map(|r| {
                r.columns()
                    .iter()
                    .map(|c| ResultColumn {
                        name: c.name().to_owned(),
                        type_tag: type_map::type_tag(c.type_()),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let truncated = rows.len() as u32 > row_cap;
        let take = row_cap as usize;
        let mut out_rows = Vec::with_capacity(take.min(rows.len()));
        for row in rows.iter().take(take) {
            let mut cells: Vec<Cell> = Vec::with_capacity(row.columns().len());
            for idx in 0..row.columns().len() {
                cells.push(type_map::cell(row, idx)?);
            }
            out_rows.push(cells);
        }

        Ok(QueryResult {
            row_count: out_rows.len(),
            columns,
            rows: out_rows,
            execution_ms: started.elapsed().as_millis() as u64,
            truncated,
        })
    }
}
