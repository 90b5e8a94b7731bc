//! Wires every singleton collaborator together from `Settings` (spec §9
//! "Global state... initialized at startup and torn down in reverse
//! order"): the database registry/pool manager, the schema cache and its
//! background revalidation task, the LLM client, the executor, the
//! orchestrator, and the optional history log.
use std::sync::Arc;
use std::time::Duration;

use gateway_common::{metrics_from_opts, Metrics};
use gateway_db_common::DbError;
use gateway_executor::Executor;
use gateway_history::HistoryLog;
use gateway_llm::{Backoff, LlmClient, LlmClientConfig, LlmProvider};
use gateway_orchestrator::{Orchestrator, OrchestratorConfig};
use gateway_registry::DatabaseRegistry;
use gateway_schema::{BackgroundRefresh, SchemaCache};
use gateway_settings::{BackoffKind, Settings};

use crate::state::AppState;

/// Handles to background tasks that must be stopped, in order, during
/// shutdown (spec §5 "Shutdown has an overall deadline").
pub struct Runtime {
    pub state: AppState,
    background_refresh: Option<BackgroundRefresh>,
}

impl Runtime {
    /// Builds every singleton from `settings` and registers each configured
    /// database's pool. A single database failing to register is fatal at
    /// startup (spec §7 `config_error`): better to fail fast than serve
    /// traffic against a registry missing an entry an operator expects.
    pub async fn build(settings: &Settings) -> Result<Self, DbError> {
        let metrics_client = metrics_from_opts(
            env!("CARGO_PKG_NAME"),
            settings.observability.statsd_host.as_deref(),
            settings.observability.statsd_port,
        )
        .map_err(|e| DbError::internal(format!("metrics init failed: {e}")))?;
        let metrics = Metrics::from(&metrics_client);

        let registry = DatabaseRegistry::new();
        for db in &settings.databases {
            registry.register_database(db.to_descriptor()).await.map_err(|e| {
                DbError::internal(format!("registering database {:?}: {e}", db.name))
            })?;
        }

        let schema_cache = SchemaCache::new(
            registry.clone(),
            Duration::from_secs(settings.cache.schema_ttl_s),
        );
        let background_refresh = if settings.cache.refresh_background {
            Some(schema_cache.start_background_refresh(Duration::from_secs(
                settings.cache.background_interval_s,
            )))
        } else {
            None
        };

        let backoff = match settings.resilience.backoff {
            BackoffKind::Fixed => Backoff::Fixed,
            BackoffKind::Exponential => Backoff::Exponential,
        };
        let llm_client = LlmClient::new(LlmClientConfig {
            provider_url: settings.llm.provider_url.clone(),
            model: settings.llm.model.clone(),
            api_key: settings.llm.api_key.clone(),
            max_tokens: settings.llm.max_tokens,
            temperature: settings.llm.temperature,
            call_timeout: Duration::from_secs(settings.llm.timeout_s),
            max_retries: settings.resilience.max_retries,
            base_delay: Duration::from_millis(settings.resilience.base_delay_ms),
            backoff,
            breaker_threshold: settings.resilience.breaker_threshold,
            breaker_cooldown: Duration::from_secs(settings.resilience.breaker_cooldown_s),
            rate_limit_rps: settings.resilience.rate_limit_rps,
            rate_limit_burst: settings.resilience.rate_limit_burst,
        })
        .map_err(|e| DbError::internal(format!("building llm client: {e}")))?;
        let llm: Arc<dyn LlmProvider> = Arc::new(llm_client);

        let executor = Executor::new(registry.clone());

        let orchestrator_config = OrchestratorConfig {
            allow_explain: settings.security.allow_explain,
            blocked_functions: settings.security.blocked_functions.clone(),
            allowed_relations: settings.security.allowed_relations.clone(),
            global_max_rows: settings.security.max_rows,
            prompt_token_budget: settings.llm.prompt_token_budget,
            remediation_budget: settings.llm.remediation_budget,
            request_deadline: Duration::from_secs(settings.request_deadline_s),
            ..OrchestratorConfig::default()
        };
        let orchestrator = Arc::new(Orchestrator::new(
            registry.clone(),
            Arc::clone(&schema_cache),
            llm,
            executor,
            orchestrator_config,
            metrics.clone(),
        ));

        let history = match history_path() {
            Some(path) => Some(Arc::new(
                HistoryLog::open(path)
                    .await
                    .map_err(|e| DbError::internal(format!("opening history log: {e}")))?,
            )),
            None => None,
        };

        let state = AppState {
            orchestrator,
            registry,
            schema_cache,
            history,
            metrics,
            shutdown_deadline: Duration::from_secs(settings.shutdown.deadline_s),
            banner: settings.banner(),
        };

        Ok(Self {
            state,
            background_refresh,
        })
    }

    /// Tears down background tasks then drains every database pool, all
    /// bounded by `self.state.shutdown_deadline` (spec §4.1 Shutdown).
    pub async fn shutdown(self) {
        let deadline = self.state.shutdown_deadline;
        if let Some(refresh) = self.background_refresh {
            refresh.stop(deadline).await;
        }
        for (name, outcome) in self.state.registry.close_all(deadline).await {
            if !outcome.graceful {
                warn!(
                    "forced connection termination during shutdown";
                    "db" => &name, "forced" => outcome.forced_terminations,
                );
            }
        }
    }
}

/// The history log's path is intentionally not a `Settings` field: spec §6
/// calls its layout "an opaque local store" out of the configuration
/// surface. `GATEWAY_HISTORY_PATH` opts in; unset disables history.
fn history_path() -> Option<String> {
    std::env::var("GATEWAY_HISTORY_PATH").ok()
}
