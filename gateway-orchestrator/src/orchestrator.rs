use std::sync::Arc;
use std::time::Instant;

use gateway_common::{Metrics, ReportableError};
use gateway_db_common::Cell;
use gateway_executor::Executor;
use gateway_llm::{Confidence, GeneratedSQL, LlmProvider, PromptAssembler};
use gateway_registry::DatabaseRegistry;
use gateway_schema::SchemaCache;
use gateway_sql_safety::SafetyPolicy;
use uuid::Uuid;

use crate::config::OrchestratorConfig;
use crate::error::OrchestratorError;
use crate::types::{QueryRequest, QueryResponse, ReturnMode, Stats};

/// Composes C5 (schema cache) → C7 (prompt assembler) → C8 (LLM client) →
/// C6 (safety validator) → C9 (executor) → C10 (result judge), implementing
/// the `S0_init .. S6_done | S_fail` state machine of spec §4.7.
pub struct Orchestrator {
    registry: DatabaseRegistry,
    schema_cache: Arc<SchemaCache>,
    llm: Arc<dyn LlmProvider>,
    executor: Executor,
    config: OrchestratorConfig,
    metrics: Metrics,
}

/// Everything needed to turn a failure into a `QueryResponse`: the error
/// itself, and — when generation got far enough to produce one — the
/// offending SQL text, which spec §7 requires surfacing alongside a safety
/// refusal so the caller understands what was rejected.
type RunError = (OrchestratorError, Option<String>);

impl Orchestrator {
    pub fn new(
        registry: DatabaseRegistry,
        schema_cache: Arc<SchemaCache>,
        llm: Arc<dyn LlmProvider>,
        executor: Executor,
        config: OrchestratorConfig,
        metrics: Metrics,
    ) -> Self {
        Self {
            registry,
            schema_cache,
            llm,
            executor,
            config,
            metrics,
        }
    }

    pub async fn query(&self, request: QueryRequest) -> QueryResponse {
        let request_id = Uuid::new_v4().to_string();

        if let Err(msg) = request.validate_shape() {
            self.metrics.incr_with_tag("requests_total", "outcome", "rejected");
            return QueryResponse::failure(
                OrchestratorError::new("config_error", msg, false).into_record(request_id),
                None,
                Stats::default(),
            );
        }

        let mut stats = Stats::default();
        match self.run(&request, &mut stats).await {
            Ok(mut response) => {
                self.metrics.incr_with_tag("requests_total", "outcome", "success");
                response.stats = stats;
                response
            }
            Err((err, sql)) => {
                self.metrics.incr_with_tag("requests_total", "outcome", "failure");
                info!(
                    "query request failed";
                    "request_id" => &request_id, "kind" => err.kind,
                );
                QueryResponse::failure(err.into_record(request_id), sql, stats)
            }
        }
    }

    async fn run(&self, request: &QueryRequest, stats: &mut Stats) -> Result<QueryResponse, RunError> {
        let overall_deadline = Instant::now() + self.config.request_deadline;

        // S1_schema
        let db_name = self.resolve_db_name(request).await.map_err(no_sql)?;
        let descriptor = self
            .registry
            .descriptor(&db_name)
            .await
            .map_err(|e| no_sql(OrchestratorError::from(e)))?;

        let t0 = Instant::now();
        let schema = match tokio::time::timeout(
            self.config.schema_stage_deadline,
            self.schema_cache.get(&db_name),
        )
        .await
        {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(e)) => return Err(no_sql(OrchestratorError::from(e))),
            Err(_) => {
                return Err(no_sql(OrchestratorError::new(
                    "schema_unavailable",
                    "schema introspection did not complete within its stage budget",
                    true,
                )))
            }
        };
        stats.schema_ms = t0.elapsed().as_millis() as u64;

        // S2/S3: generate, validate; one remediation cycle on refusal.
        let effective_row_cap = descriptor.effective_row_cap(self.config.global_max_rows);
        let policy = SafetyPolicy::new(
            self.config.allow_explain,
            self.config.blocked_functions.clone(),
            self.config.allowed_relations.clone(),
            effective_row_cap,
        );

        let mut hint: Option<String> = None;
        let mut remediation_used = 0u32;
        let mut last_sql: Option<String> = None;

        let validated = loop {
            let prompt = PromptAssembler::build(
                &request.question,
                &schema,
                descriptor.dialect,
                self.config.prompt_token_budget,
                hint.as_deref(),
            );

            let t1 = Instant::now();
            let generated = match tokio::time::timeout(
                self.config.generate_stage_deadline,
                self.generate_with_parse_retry(&prompt, descriptor.dialect),
            )
            .await
            {
                Ok(Ok(g)) => g,
                Ok(Err(e)) => return Err((e, last_sql)),
                Err(_) => {
                    return Err((
                        OrchestratorError::new(
                            "timeout",
                            "sql generation did not complete within its stage budget",
                            true,
                        ),
                        last_sql,
                    ))
                }
            };
            stats.generate_ms += t1.elapsed().as_millis() as u64;
            last_sql = Some(generated.text.clone());

            let t2 = Instant::now();
            let verdict = gateway_sql_safety::validate(&generated.text, descriptor.dialect, &policy);
            stats.validate_ms += t2.elapsed().as_millis() as u64;

            match verdict {
                Ok(v) => break v,
                Err(e) => {
                    self.metrics
                        .incr_with_tag("sql_refusals_total", "kind", e.kind_label());
                    if remediation_used < self.config.remediation_budget {
                        remediation_used += 1;
                        stats.retries += 1;
                        hint = Some(e.to_string());
                        continue;
                    }
                    return Err((
                        OrchestratorError::new(
                            "unsafe_sql",
                            format!("remediation budget exhausted: {e}"),
                            false,
                        ),
                        last_sql,
                    ));
                }
            }
        };

        if Instant::now() >= overall_deadline {
            return Err((
                OrchestratorError::new("timeout", "request deadline exceeded before execution", false),
                Some(validated.text().to_owned()),
            ));
        }

        // S4_execute
        if request.return_mode == ReturnMode::SqlOnly {
            return Ok(QueryResponse {
                success: true,
                sql: Some(validated.text().to_owned()),
                data: None,
                confidence: None,
                stats: *stats,
                error: None,
            });
        }

        let remaining = overall_deadline.saturating_duration_since(Instant::now());
        let exec_budget = self.config.execute_stage_deadline.min(remaining);
        let t3 = Instant::now();
        let result = self
            .executor
            .execute(
                &db_name,
                &validated,
                Instant::now() + exec_budget,
                descriptor.statement_timeout,
                effective_row_cap,
            )
            .await
            .map_err(|e| (OrchestratorError::from(e), Some(validated.text().to_owned())))?;
        stats.execute_ms = t3.elapsed().as_millis() as u64;

        // S5_judge: best-effort, never fails the request (spec §4.7 S5).
        let confidence = if self.config.enable_judging && !result.rows.is_empty() {
            let t4 = Instant::now();
            let sample: Vec<&Vec<Cell>> = result.rows.iter().take(5).collect();
            let sample_json = serde_json::to_value(&sample).unwrap_or(serde_json::Value::Null);
            let judged = tokio::time::timeout(
                self.config.judge_stage_deadline,
                self.llm
                    .judge_result(&request.question, validated.text(), &sample_json),
            )
            .await;
            stats.judge_ms = t4.elapsed().as_millis() as u64;
            Some(match judged {
                Ok(Ok(confidence)) => confidence,
                Ok(Err(e)) => {
                    warn!("result judging failed, degrading to unjudged"; "error" => %e);
                    Confidence::unjudged()
                }
                Err(_) => {
                    warn!("result judging timed out, degrading to unjudged");
                    Confidence::unjudged()
                }
            })
        } else {
            None
        };

        Ok(QueryResponse {
            success: true,
            sql: Some(validated.text().to_owned()),
            data: Some(result),
            confidence,
            stats: *stats,
            error: None,
        })
    }

    async fn resolve_db_name(&self, request: &QueryRequest) -> Result<String, OrchestratorError> {
        if let Some(name) = &request.database_name {
            return Ok(name.clone());
        }
        let names = self.registry.list_databases().await;
        match names.as_slice() {
            [one] => Ok(one.clone()),
            [] => Err(OrchestratorError::new("unknown_db", "no databases are registered", false)),
            _ => Err(OrchestratorError::new(
                "unknown_db",
                "database_name is required when more than one database is registered",
                false,
            )),
        }
    }

    /// `llm_parse_error` gets exactly one extra attempt, independent of the
    /// safety-remediation budget tracked by the caller (spec §7).
    async fn generate_with_parse_retry(
        &self,
        prompt: &str,
        dialect: gateway_db_common::Dialect,
    ) -> Result<GeneratedSQL, OrchestratorError> {
        match self.llm.generate_sql(prompt, dialect).await {
            Ok(sql) => Ok(sql),
            Err(e) if e.kind_label() == "llm_parse_error" => {
                warn!("llm reply failed to parse, retrying once"; "error" => %e);
                self.llm
                    .generate_sql(prompt, dialect)
                    .await
                    .map_err(OrchestratorError::from)
            }
            Err(e) => Err(OrchestratorError::from(e)),
        }
    }
}

fn no_sql(e: OrchestratorError) -> RunError {
    (e, None)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use gateway_db_common::Dialect;
    use gateway_llm::LlmError;
    use gateway_schema::SchemaCache;
    use serde_json::Value;

    use super::*;

    struct MockLlm {
        calls: AtomicU32,
        replies: Vec<Result<&'static str, &'static str>>,
    }

    #[async_trait]
    impl LlmProvider for MockLlm {
        async fn generate_sql(&self, _prompt: &str, dialect: Dialect) -> Result<GeneratedSQL, LlmError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            match self.replies.get(n) {
                Some(Ok(text)) => Ok(GeneratedSQL {
                    text: (*text).to_owned(),
                    dialect,
                    model_id: "mock".into(),
                    token_count: 1,
                    generation_ms: 0,
                }),
                Some(Err(_)) => Err(LlmError::parse_error("mock parse failure")),
                None => panic!("unexpected extra llm call"),
            }
        }

        async fn judge_result(&self, _: &str, _: &str, _: &Value) -> Result<Confidence, LlmError> {
            unreachable!("not exercised by these tests")
        }
    }

    fn orchestrator_with(llm: MockLlm) -> Orchestrator {
        let registry = DatabaseRegistry::new();
        let schema_cache = SchemaCache::new(registry.clone(), Duration::from_secs(60));
        let executor = Executor::new(registry.clone());
        Orchestrator::new(
            registry,
            schema_cache,
            Arc::new(llm),
            executor,
            OrchestratorConfig::default(),
            Metrics::noop(),
        )
    }

    #[tokio::test]
    async fn unknown_database_fails_before_any_llm_call() {
        let llm = MockLlm {
            calls: AtomicU32::new(0),
            replies: vec![],
        };
        let calls_handle = &llm.calls;
        let orchestrator = orchestrator_with(llm);

        let response = orchestrator
            .query(QueryRequest {
                database_name: Some("unknown".to_owned()),
                question: "anything".to_owned(),
                return_mode: ReturnMode::SqlOnly,
                client_hints: None,
            })
            .await;

        assert!(!response.success);
        assert_eq!(response.error.unwrap().kind, "unknown_db");
        assert_eq!(calls_handle.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_question_is_rejected_without_touching_any_collaborator() {
        let orchestrator = orchestrator_with(MockLlm {
            calls: AtomicU32::new(0),
            replies: vec![],
        });

        let response = orchestrator
            .query(QueryRequest {
                database_name: Some("blog".to_owned()),
                question: "   ".to_owned(),
                return_mode: ReturnMode::SqlOnly,
                client_hints: None,
            })
            .await;

        assert!(!response.success);
        assert_eq!(response.error.unwrap().kind, "config_error");
    }

    #[tokio::test]
    async fn llm_parse_error_is_retried_exactly_once() {
        let orchestrator = orchestrator_with(MockLlm {
            calls: AtomicU32::new(0),
            replies: vec![Err("bad"), Ok("SELECT 1")],
        });

        let result = orchestrator
            .generate_with_parse_retry("prompt", Dialect::Postgres)
            .await;
        assert_eq!(result.unwrap().text, "SELECT 1");
    }

    #[tokio::test]
    async fn a_second_consecutive_parse_error_is_not_retried_again() {
        let orchestrator = orchestrator_with(MockLlm {
            calls: AtomicU32::new(0),
            replies: vec![Err("bad"), Err("still bad")],
        });

        let err = orchestrator
            .generate_with_parse_retry("prompt", Dialect::Postgres)
            .await
            .unwrap_err();
        assert_eq!(err.kind, "llm_parse_error");
    }
}
