use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use gateway_db_common::{
    CloseOutcome, DatabaseDescriptor, Dialect, DbError, DbPool, GetPoolState, PooledConnection,
};
use gateway_mysql::MysqlDbPool;
use gateway_postgres::PgDbPool;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("database {0:?} is already registered")]
    AlreadyExists(String),
    #[error("database {0:?} is not registered")]
    UnknownDatabase(String),
    #[error("failed to initialize pool for {name:?}: {source}")]
    PoolInit { name: String, source: DbError },
}

struct Entry {
    descriptor: DatabaseDescriptor,
    pool: Arc<dyn DbPool>,
}

#[derive(Clone, Debug)]
pub struct DatabaseHealth {
    pub name: String,
    pub dialect: Dialect,
    pub open_connections: u32,
    pub in_use_connections: u32,
}

#[derive(Clone, Debug)]
pub struct RegistryStatus {
    pub databases: Vec<DatabaseHealth>,
}

/// Holds one pool per registered database name. Construction of the
/// dialect-specific pool is the only place that dispatches on `Dialect`;
/// every other operation goes through the shared `DbPool` trait object
/// (spec §9 "a small tagged variant... no virtual-method gymnastics").
#[derive(Clone)]
pub struct DatabaseRegistry {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl Default for DatabaseRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabaseRegistry {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Builds and registers a pool for `descriptor`. Fails if a database of
    /// that name is already registered; callers that want "replace" must
    /// `unregister_database` first (spec §4.1 admin operations).
    pub async fn register_database(
        &self,
        descriptor: DatabaseDescriptor,
    ) -> Result<(), AdminError> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(&descriptor.name) {
            return Err(AdminError::AlreadyExists(descriptor.name));
        }

        let pool: Arc<dyn DbPool> = match descriptor.dialect {
            Dialect::Postgres => Arc::new(PgDbPool::new(&descriptor).map_err(|source| {
                AdminError::PoolInit {
                    name: descriptor.name.clone(),
                    source,
                }
            })?),
            Dialect::Mysql => Arc::new(MysqlDbPool::new(&descriptor).map_err(|source| {
                AdminError::PoolInit {
                    name: descriptor.name.clone(),
                    source,
                }
            })?),
        };

        info!("registered database"; "name" => &descriptor.name, "dialect" => %descriptor.dialect);
        entries.insert(
            descriptor.name.clone(),
            Entry { descriptor, pool },
        );
        Ok(())
    }

    /// Drains and removes `name`'s pool. The name becomes available for
    /// re-registration immediately; the drain itself is best-effort within
    /// `deadline` just like `close_all`.
    pub async fn unregister_database(
        &self,
        name: &str,
        deadline: Duration,
    ) -> Result<CloseOutcome, AdminError> {
        let entry = {
            let mut entries = self.entries.write().await;
            entries
                .remove(name)
                .ok_or_else(|| AdminError::UnknownDatabase(name.to_owned()))?
        };
        Ok(entry.pool.close(deadline).await)
    }

    pub async fn list_databases(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn descriptor(&self, name: &str) -> Result<DatabaseDescriptor, DbError> {
        self.entries
            .read()
            .await
            .get(name)
            .map(|e| e.descriptor.clone())
            .ok_or_else(|| DbError::unknown_database(name))
    }

    async fn pool(&self, name: &str) -> Result<Arc<dyn DbPool>, DbError> {
        self.entries
            .read()
            .await
            .get(name)
            .map(|e| Arc::clone(&e.pool))
            .ok_or_else(|| DbError::unknown_database(name))
    }

    pub async fn acquire(
        &self,
        name: &str,
        deadline: Instant,
    ) -> Result<PooledConnection, DbError> {
        self.pool(name).await?.acquire(deadline).await
    }

    pub async fn introspect(&self, name: &str) -> Result<gateway_db_common::SchemaSnapshot, DbError> {
        self.pool(name).await?.introspect().await
    }

    pub async fn health(&self) -> RegistryStatus {
        let entries = self.entries.read().await;
        let databases = entries
            .values()
            .map(|e| {
                let state = e.pool.state();
                DatabaseHealth {
                    name: e.descriptor.name.clone(),
                    dialect: e.descriptor.dialect,
                    open_connections: state.connections,
                    in_use_connections: state.in_use(),
                }
            })
            .collect();
        RegistryStatus { databases }
    }

    /// Shutdown step 1-4 (spec §4.1): stop accepting new work for every
    /// pool, drain each within `deadline`, and report what happened
    /// per-database so the server can log forced terminations.
    pub async fn close_all(&self, deadline: Duration) -> Vec<(String, CloseOutcome)> {
        let entries = {
            let mut guard = self.entries.write().await;
            std::mem::take(&mut *guard)
        };
        let mut outcomes = Vec::with_capacity(entries.len());
        for (name, entry) in entries {
            let outcome = entry.pool.close(deadline).await;
            if !outcome.graceful {
                warn!(
                    "database pool did not drain within shutdown deadline";
                    "name" => &name,
                    "forced_terminations" => outcome.forced_terminations,
                );
            }
            outcomes.push((name, outcome));
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str) -> DatabaseDescriptor {
        DatabaseDescriptor {
            name: name.to_owned(),
            dialect: Dialect::Postgres,
            connection_uri: "postgres://localhost/does-not-matter".to_owned(),
            pool_min: 1,
            pool_max: 2,
            statement_timeout: Duration::from_secs(5),
            row_cap: None,
        }
    }

    #[tokio::test]
    async fn registering_duplicate_name_is_rejected() {
        let registry = DatabaseRegistry::new();
        registry.register_database(descriptor("blog")).await.unwrap();
        let err = registry
            .register_database(descriptor("blog"))
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::AlreadyExists(name) if name == "blog"));
    }

    #[tokio::test]
    async fn unknown_database_is_reported() {
        use gateway_common::ReportableError;

        let registry = DatabaseRegistry::new();
        let err = registry.descriptor("ghost").await.unwrap_err();
        assert_eq!(err.kind_label(), "unknown_db");
    }

    #[tokio::test]
    async fn unregistering_unknown_database_errors() {
        let registry = DatabaseRegistry::new();
        let err = registry
            .unregister_database("ghost", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::UnknownDatabase(name) if name == "ghost"));
    }
}
