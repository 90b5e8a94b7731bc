use std::time::{Duration, Instant};

use async_trait::async_trait;
use gateway_db_common::{Db, DbError, QueryResult, ResultColumn};
use mysql_async::prelude::*;
use mysql_async::Conn;

use crate::type_map;

/// A single checked-out MySQL connection. One `MysqlDb` backs exactly one
/// `PooledConnection` for its lifetime (spec §4.6 Executor contract).
pub struct MysqlDb {
    conn: Conn,
}

impl MysqlDb {
    pub(crate) fn new(conn: Conn) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl Db for MysqlDb {
    async fn execute_readonly(
        &mut self,
        sql: &str,
        row_cap: u32,
        statement_timeout: Duration,
    ) -> Result<QueryResult, DbError> {
        let started = Instant::now();

        // MySQL has no `SET LOCAL`; scope the timeout to this session and
        // restore it once the statement returns.
        self.conn
            .exec_drop(
                "SET SESSION MAX_EXECUTION_TIME = :ms",
                mysql_async::params! { "ms" => statement_timeout.as_millis() as u64 },
            )
            .await
            .map_err(|e| DbError::db(format!("set max_execution_time: {e}")))?;

        self.conn
            .query_drop("START TRANSACTION READ ONLY")
            .await
            .map_err(|e| DbError::db(format!("begin read-only transaction: {e}")))?;

        let mut result = self.conn.query_iter(sql).await.map_err(|e| {
            if e.to_string().contains("max_statement_time")
                || e.to_string().contains("MAX_EXECUTION_TIME")
            {
                DbError::timeout()
            } else {
                DbError::db(e.to_string())
            }
        })?;

        let columns: Vec<ResultColumn> = result
            .columns()
            .map(|cols| {
                cols.as_ref()
                    .iter()
                    .map(|c| ResultColumn {
                        name: c.name_str().into_owned(),
                        type_tag: type_map::type_tag(c.column_type()),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let rows: Vec<mysql_async::Row> = result
            .collect()
            .await
            .map_err(|e| DbError::db(format!("reading result rows: {e}")))?;

        self.conn
            .query_drop("ROLLBACK")
            .await
            .map_err(|e| DbError::db(format!("rollback read-only transaction: {e}")))?;

        let truncated = rows.len() as u32 > row_cap;
        let take = row_cap as usize;
        let out_rows = rows
            .iter()
            .take(take)
            .map(|row| {
                (0..row.len())
                    .map(|idx| type_map::cell(row, idx))
                    .collect()
            })
            .collect::<Vec<_>>();

        Ok(QueryResult {
            row_count: out_rows.len(),
            columns,
            rows: out_rows,
            execution_ms: started.elapsed().as_millis() as u64,
            truncated,
        })
    }
}
