//! Process-wide application state (spec §9 "Global state": Configuration,
//! Pool Manager, Schema Cache, LLM Client and the metrics registry form a
//! small set of singletons initialized at startup and torn down in reverse
//! order). Mirrors the reference project's `ServerState`, generalized from
//! a single storage backend to the multi-database gateway's collaborators.
use std::sync::Arc;
use std::time::Duration;

use gateway_common::Metrics;
use gateway_history::HistoryLog;
use gateway_orchestrator::Orchestrator;
use gateway_registry::DatabaseRegistry;
use gateway_schema::SchemaCache;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub registry: DatabaseRegistry,
    pub schema_cache: Arc<SchemaCache>,
    pub history: Option<Arc<HistoryLog>>,
    pub metrics: Metrics,
    pub shutdown_deadline: Duration,
    /// Rendered once at startup for the `/__version__`/banner surfaces;
    /// `DatabaseRegistry::list_databases` is the live source of truth.
    pub banner: String,
}
