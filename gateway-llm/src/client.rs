use std::time::{Duration, Instant};

use async_trait::async_trait;
use backoff::backoff::Backoff as BackoffTrait;
use backoff::{Error as BackoffError, ExponentialBackoffBuilder};
use gateway_db_common::Dialect;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::breaker::{Admission, CircuitBreaker};
use crate::error::LlmError;
use crate::rate_limiter::RateLimiter;
use crate::types::{Confidence, GeneratedSQL};

/// Retry backoff shape, mirroring `gateway_settings::BackoffKind` without
/// this crate depending on the settings crate (the server binary maps one
/// onto the other at wiring time).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Backoff {
    Fixed,
    Exponential,
}

#[derive(Clone, Debug)]
pub struct LlmClientConfig {
    pub provider_url: String,
    pub model: String,
    pub api_key: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub call_timeout: Duration,
    pub max_retries: u32,
    pub base_delay: Duration,
    pub backoff: Backoff,
    pub breaker_threshold: u32,
    pub breaker_cooldown: Duration,
    pub rate_limit_rps: f64,
    pub rate_limit_burst: u32,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    model: String,
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    text: String,
}

/// Caps `inner`'s backoff sequence at a fixed number of attempts: a bare
/// `ExponentialBackoff` (or any `Backoff`) retries forever until
/// `max_elapsed_time`, but spec §4.5/§7 want a hard attempt budget
/// (`resilience.max_retries`), so this wraps whichever shape the
/// configuration selected and stops handing out delays once it is spent.
struct BoundedBackoff<B> {
    inner: B,
    remaining: u32,
}

impl<B: BackoffTrait> BackoffTrait for BoundedBackoff<B> {
    fn next_backoff(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.inner.next_backoff()
    }

    fn reset(&mut self) {
        self.inner.reset();
    }
}

struct ConstantBackoff {
    delay: Duration,
}

impl BackoffTrait for ConstantBackoff {
    fn next_backoff(&mut self) -> Option<Duration> {
        Some(self.delay)
    }

    fn reset(&mut self) {}
}

enum RetryBackoff {
    Fixed(BoundedBackoff<ConstantBackoff>),
    Exponential(BoundedBackoff<backoff::ExponentialBackoff>),
}

impl BackoffTrait for RetryBackoff {
    fn next_backoff(&mut self) -> Option<Duration> {
        match self {
            RetryBackoff::Fixed(b) => b.next_backoff(),
            RetryBackoff::Exponential(b) => b.next_backoff(),
        }
    }

    fn reset(&mut self) {
        match self {
            RetryBackoff::Fixed(b) => b.reset(),
            RetryBackoff::Exponential(b) => b.reset(),
        }
    }
}

/// Rate-limited, retry-wrapped, circuit-broken client over the external
/// text-completion provider (spec §4.5). Holds one reused `reqwest::Client`
/// for the process's whole lifetime rather than building one per call.
pub struct LlmClient {
    http: HttpClient,
    config: LlmClientConfig,
    limiter: RateLimiter,
    breaker: CircuitBreaker,
}

/// The two operations C8 exposes, behind a trait so the orchestrator can
/// swap in a mock during tests (spec E3's "no LLM call made, verified by
/// mock") without pulling `reqwest` into its test dependency graph.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate_sql(&self, prompt: &str, dialect: Dialect) -> Result<GeneratedSQL, LlmError>;

    async fn judge_result(
        &self,
        question: &str,
        sql: &str,
        sample_rows: &Value,
    ) -> Result<Confidence, LlmError>;
}

impl LlmClient {
    pub fn new(config: LlmClientConfig) -> Result<Self, LlmError> {
        let http = HttpClient::builder()
            .build()
            .map_err(|e| LlmError::internal(format!("building http client: {e}")))?;
        let limiter = RateLimiter::new(config.rate_limit_rps, config.rate_limit_burst);
        let breaker = CircuitBreaker::new(config.breaker_threshold, config.breaker_cooldown);
        Ok(Self {
            http,
            config,
            limiter,
            breaker,
        })
    }

    fn backoff_sequence(&self) -> RetryBackoff {
        match self.config.backoff {
            Backoff::Fixed => RetryBackoff::Fixed(BoundedBackoff {
                inner: ConstantBackoff {
                    delay: self.config.base_delay,
                },
                remaining: self.config.max_retries,
            }),
            Backoff::Exponential => RetryBackoff::Exponential(BoundedBackoff {
                inner: ExponentialBackoffBuilder::new()
                    .with_initial_interval(self.config.base_delay)
                    .with_multiplier(2.0)
                    .with_max_elapsed_time(None)
                    .build(),
                remaining: self.config.max_retries,
            }),
        }
    }

    async fn complete(&self, prompt: &str) -> Result<CompletionResponse, LlmError> {
        let request = CompletionRequest {
            model: &self.config.model,
            prompt,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .http
            .post(&self.config.provider_url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::provider(e.to_string()))?;

        if response.status().is_client_error() {
            return Err(LlmError::provider_rejected(format!(
                "provider rejected request: {}",
                response.status()
            )));
        }
        if response.status().is_server_error() {
            return Err(LlmError::provider(format!(
                "provider server error: {}",
                response.status()
            )));
        }

        response
            .json::<CompletionResponse>()
            .await
            .map_err(|e| LlmError::parse_error(e.to_string()))
    }

    /// Rate limit and circuit breaker gate admission once, up front; each
    /// admitted attempt then gets its own wall-clock timeout independent of
    /// the retry budget, and non-transient provider errors (4xx, a
    /// malformed reply) stop the retry loop immediately rather than
    /// burning through it (spec §4.5).
    async fn call_with_resilience(&self, prompt: &str) -> Result<CompletionResponse, LlmError> {
        if !self.limiter.try_acquire() {
            return Err(LlmError::rate_limited());
        }
        match self.breaker.admit() {
            Admission::Rejected(n) => return Err(LlmError::circuit_open(n)),
            Admission::Allowed => {}
        }

        let timeout = self.config.call_timeout;
        let breaker = &self.breaker;
        let attempt = std::sync::atomic::AtomicU32::new(0);

        let outcome = backoff::future::retry(self.backoff_sequence(), || async {
            let n = attempt.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            match tokio::time::timeout(timeout, self.complete(prompt)).await {
                Ok(Ok(value)) => {
                    breaker.record_success();
                    Ok(value)
                }
                Ok(Err(e)) => {
                    breaker.record_failure();
                    if e.is_transient() {
                        warn!("llm call failed, retrying"; "attempt" => n, "error" => %e);
                        Err(BackoffError::transient(e))
                    } else {
                        Err(BackoffError::permanent(e))
                    }
                }
                Err(_) => {
                    breaker.record_failure();
                    warn!("llm call timed out, retrying"; "attempt" => n);
                    Err(BackoffError::transient(LlmError::timeout()))
                }
            }
        })
        .await;

        outcome.map_err(|e| match e {
            BackoffError::Permanent(err) => err,
            BackoffError::Transient { err, .. } => err,
        })
    }
}

#[async_trait]
impl LlmProvider for LlmClient {
    async fn generate_sql(&self, prompt: &str, dialect: Dialect) -> Result<GeneratedSQL, LlmError> {
        let started = Instant::now();
        let response = self.call_with_resilience(prompt).await?;

        let text = response
            .choices
            .first()
            .map(|c| clean_sql(&c.text))
            .ok_or_else(|| LlmError::parse_error("provider returned no completion choices"))?;
        if text.is_empty() {
            return Err(LlmError::parse_error("provider returned an empty completion"));
        }

        Ok(GeneratedSQL {
            text,
            dialect,
            model_id: if response.model.is_empty() {
                self.config.model.clone()
            } else {
                response.model
            },
            token_count: estimate_tokens(prompt),
            generation_ms: started.elapsed().as_millis() as u64,
        })
    }

    async fn judge_result(
        &self,
        question: &str,
        sql: &str,
        sample_rows: &Value,
    ) -> Result<Confidence, LlmError> {
        let prompt = format!(
            "Question: {question}\nSQL: {sql}\nSample rows (JSON): {sample_rows}\n\
             Score from 0-100 how well the SQL and sample rows answer the question. \
             Respond with JSON only: {{\"score\": <0-100>, \"rationale\": \"...\", \
             \"concerns\": [\"...\"]}}"
        );

        let response = self.call_with_resilience(&prompt).await?;
        let text = response
            .choices
            .first()
            .map(|c| c.text.trim())
            .ok_or_else(|| LlmError::parse_error("provider returned no completion choices"))?;

        let stripped = strip_code_fence(text);
        let parsed: JudgeReply = serde_json::from_str(stripped)
            .map_err(|e| LlmError::parse_error(format!("could not parse judge reply: {e}")))?;

        Ok(Confidence {
            score: Some(parsed.score.min(100)),
            rationale: parsed.rationale,
            concerns: parsed.concerns,
        })
    }
}

#[derive(Deserialize)]
struct JudgeReply {
    score: u8,
    #[serde(default)]
    rationale: String,
    #[serde(default)]
    concerns: Vec<String>,
}

fn estimate_tokens(text: &str) -> u32 {
    (text.len() / 4).max(1) as u32
}

fn clean_sql(text: &str) -> String {
    strip_code_fence(text.trim()).trim().to_owned()
}

/// Strips a leading/trailing ```sql ... ``` (or bare ```) fence some
/// providers wrap their completion in, despite being instructed not to.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("sql").unwrap_or(rest);
    let rest = rest.trim_start_matches(['\n', '\r']);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_sql_code_fences() {
        assert_eq!(clean_sql("```sql\nSELECT 1\n```"), "SELECT 1");
    }

    #[test]
    fn leaves_plain_text_untouched() {
        assert_eq!(clean_sql("SELECT 1"), "SELECT 1");
    }
}
