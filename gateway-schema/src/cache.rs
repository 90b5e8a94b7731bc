use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use gateway_db_common::{DbError, SchemaSnapshot};
use gateway_registry::DatabaseRegistry;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

struct Slot {
    /// `None` until the first successful introspection.
    current: RwLock<Option<(Arc<SchemaSnapshot>, Instant)>>,
    /// Held for the duration of a live introspection call so concurrent
    /// callers for the same database collapse into one in-flight request
    /// instead of stampeding the target database (spec §4.2 single-flight).
    refreshing: Mutex<()>,
}

impl Slot {
    fn new() -> Self {
        Self {
            current: RwLock::new(None),
            refreshing: Mutex::new(()),
        }
    }
}

/// A TTL-bounded cache of `SchemaSnapshot`s, one per registered database.
/// Mirrors the reference project's `CollectionCache`
/// (`Arc<RwLock<HashMap<..>>>` guarding an in-memory lookup table) but adds
/// expiry and a cooperative background revalidation task, modeled on
/// `Deadman`'s jittered `Instant`-based expiry.
pub struct SchemaCache {
    registry: DatabaseRegistry,
    slots: RwLock<HashMap<String, Arc<Slot>>>,
    ttl: Duration,
}

impl SchemaCache {
    pub fn new(registry: DatabaseRegistry, ttl: Duration) -> Arc<Self> {
        Arc::new(Self {
            registry,
            slots: RwLock::new(HashMap::new()),
            ttl,
        })
    }

    async fn slot(&self, db_name: &str) -> Arc<Slot> {
        if let Some(slot) = self.slots.read().await.get(db_name) {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write().await;
        Arc::clone(
            slots
                .entry(db_name.to_owned())
                .or_insert_with(|| Arc::new(Slot::new())),
        )
    }

    /// Returns a cached snapshot if fresh. If stale but present, triggers a
    /// refresh in the background and returns the stale snapshot immediately
    /// without waiting on it. Only blocks the caller when no snapshot
    /// exists yet (spec §4.2 serve-stale-while-revalidating: "only when no
    /// snapshot exists do readers block").
    pub async fn get(self: &Arc<Self>, db_name: &str) -> Result<Arc<SchemaSnapshot>, DbError> {
        let slot = self.slot(db_name).await;

        if let Some((snapshot, fetched_at)) = slot.current.read().await.clone() {
            if fetched_at.elapsed() < self.ttl {
                return Ok(snapshot);
            }
            // Stale but present: serve it now, kick off a refresh that the
            // caller does not wait on. `try_revalidate` itself collapses
            // concurrent triggers into a single in-flight introspection.
            let cache = Arc::clone(self);
            let name = db_name.to_owned();
            tokio::spawn(async move {
                cache.try_revalidate(&name).await;
            });
            return Ok(snapshot);
        }

        // No snapshot at all: block until the single-flight refresh
        // produces one.
        let _guard = slot.refreshing.lock().await;

        // Someone else may have populated it while we waited for the lock.
        if let Some((snapshot, _)) = slot.current.read().await.clone() {
            return Ok(snapshot);
        }

        match self.registry.introspect(db_name).await {
            Ok(fresh) => {
                let fresh = Arc::new(fresh);
                *slot.current.write().await = Some((Arc::clone(&fresh), Instant::now()));
                Ok(fresh)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn invalidate(&self, db_name: &str) {
        if let Some(slot) = self.slots.read().await.get(db_name) {
            *slot.current.write().await = None;
        }
    }

    /// Opportunistically revalidates `db_name` in the background without
    /// blocking the caller. A no-op if a refresh for this database is
    /// already in flight.
    async fn try_revalidate(self: &Arc<Self>, db_name: &str) {
        let slot = self.slot(db_name).await;
        let is_stale = match slot.current.read().await.as_ref() {
            Some((_, fetched_at)) => fetched_at.elapsed() >= self.ttl,
            None => true,
        };
        if !is_stale {
            return;
        }
        let Ok(_guard) = slot.refreshing.try_lock() else {
            return;
        };
        match self.registry.introspect(db_name).await {
            Ok(fresh) => {
                *slot.current.write().await = Some((Arc::new(fresh), Instant::now()));
            }
            Err(e) => {
                warn!("background schema refresh failed"; "db" => db_name, "error" => %e);
            }
        }
    }

    /// Spawns the cooperative revalidation task (spec §4.2 "cooperative
    /// task"): every `interval`, walk every known database and refresh any
    /// entry that's gone stale.
    pub fn start_background_refresh(self: &Arc<Self>, interval: Duration) -> BackgroundRefresh {
        let cache = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut tick = tokio::time::interval(interval);
            loop {
                tick.tick().await;
                let names = cache.registry.list_databases().await;
                for name in names {
                    cache.try_revalidate(&name).await;
                }
            }
        });
        BackgroundRefresh { handle }
    }
}

/// Handle to the spawned background revalidation task.
pub struct BackgroundRefresh {
    handle: JoinHandle<()>,
}

impl BackgroundRefresh {
    /// Aborts the task; waits up to `deadline` for it to actually stop.
    pub async fn stop(self, deadline: Duration) {
        self.handle.abort();
        let _ = tokio::time::timeout(deadline, self.handle).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_database_surfaces_the_registry_error() {
        let registry = DatabaseRegistry::new();
        let cache = SchemaCache::new(registry, Duration::from_secs(60));
        let err = cache.get("ghost").await.unwrap_err();
        use gateway_common::ReportableError;
        assert_eq!(err.kind_label(), "unknown_db");
    }
}
