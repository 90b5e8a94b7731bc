use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use gateway_db_common::{
    CloseOutcome, DatabaseDescriptor, Dialect, DbError, DbPool, GetPoolState, PoolState,
    PooledConnection, SchemaSnapshot,
};
use mysql_async::{Opts, Pool, PoolConstraints, PoolOpts};

use crate::{db::MysqlDb, introspect};

#[derive(Clone)]
pub struct MysqlDbPool {
    pool: Pool,
    descriptor: DatabaseDescriptor,
}

impl MysqlDbPool {
    pub fn new(descriptor: &DatabaseDescriptor) -> Result<Self, DbError> {
        let opts = Opts::from_url(&descriptor.connection_uri)
            .map_err(|e| DbError::connect_failed(format!("invalid mysql uri: {e}")))?;
        let constraints = PoolConstraints::new(
            descriptor.pool_min.max(1) as usize,
            descriptor.pool_max.max(descriptor.pool_min).max(1) as usize,
        )
        .ok_or_else(|| DbError::internal("invalid mysql pool bounds"))?;
        let pool_opts = PoolOpts::default().with_constraints(constraints);
        let pool = Pool::new(mysql_async::OptsBuilder::from_opts(opts).pool_opts(pool_opts));

        Ok(Self {
            pool,
            descriptor: descriptor.clone(),
        })
    }

    fn database_name(&self) -> Option<&str> {
        self.descriptor
            .connection_uri
            .rsplit('/')
            .next()
            .and_then(|tail| tail.split(['?', '#']).next())
            .filter(|s| !s.is_empty())
    }
}

#[async_trait]
impl DbPool for MysqlDbPool {
    fn dialect(&self) -> Dialect {
        Dialect::Mysql
    }

    async fn acquire(&self, deadline: Instant) -> Result<PooledConnection, DbError> {
        let wait = deadline.saturating_duration_since(Instant::now());
        let conn = tokio::time::timeout(wait, self.pool.get_conn())
            .await
            .map_err(|_| DbError::timeout())?
            .map_err(|e| DbError::connect_failed(e.to_string()))?;
        Ok(PooledConnection::new(Box::new(MysqlDb::new(conn))))
    }

    async fn introspect(&self) -> Result<SchemaSnapshot, DbError> {
        let mut conn = self
            .pool
            .get_conn()
            .await
            .map_err(|e| DbError::connect_failed(e.to_string()))?;
        let database = self
            .database_name()
            .ok_or_else(|| DbError::internal("mysql uri missing database name"))?
            .to_owned();
        introspect::snapshot(&mut conn, &database).await
    }

    async fn close(&self, deadline: Duration) -> CloseOutcome {
        match tokio::time::timeout(deadline, self.pool.clone().disconnect()).await {
            Ok(Ok(())) => CloseOutcome {
                graceful: true,
                forced_terminations: 0,
            },
            _ => CloseOutcome {
                graceful: false,
                forced_terminations: 0,
            },
        }
    }
}

impl GetPoolState for MysqlDbPool {
    fn state(&self) -> PoolState {
        // mysql_async doesn't expose live pool occupancy the way deadpool's
        // `Status` does; report capacity only until a metrics hook is added.
        PoolState {
            connections: self.descriptor.pool_max,
            idle_connections: 0,
        }
    }
}

impl fmt::Debug for MysqlDbPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MysqlDbPool")
            .field("database", &self.descriptor.name)
            .finish()
    }
}
