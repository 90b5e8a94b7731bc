use gateway_db_common::QueryResult;
use gateway_llm::Confidence;
use serde::{Deserialize, Serialize};

/// Whether the caller wants only the serialized, safety-checked SQL back,
/// or wants it executed against the target database (spec §3).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnMode {
    SqlOnly,
    Execute,
}

/// A caller's natural-language question, plus how it should be answered
/// (spec §3). `database_name` is optional only when exactly one database is
/// registered; otherwise the caller must disambiguate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryRequest {
    pub database_name: Option<String>,
    pub question: String,
    pub return_mode: ReturnMode,
    pub client_hints: Option<serde_json::Value>,
}

/// Question length bound (spec §3): "≤ 10 KB; empty rejected".
pub const MAX_QUESTION_BYTES: usize = 10 * 1024;

impl QueryRequest {
    pub fn validate_shape(&self) -> Result<(), &'static str> {
        if self.question.trim().is_empty() {
            return Err("question must not be empty");
        }
        if self.question.len() > MAX_QUESTION_BYTES {
            return Err("question exceeds the 10 KB length bound");
        }
        Ok(())
    }
}

/// Per-stage timings and the remediation-cycle count, surfaced back to the
/// caller regardless of outcome (spec §4.7 S6).
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Stats {
    pub schema_ms: u64,
    pub generate_ms: u64,
    pub validate_ms: u64,
    pub execute_ms: u64,
    pub judge_ms: u64,
    pub retries: u32,
}

/// Externally visible error shape (spec §3, §7). `kind` is one of the
/// stable identifiers in spec §7's table; callers match on it, not on
/// `message`, which is free text intended for humans.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub kind: String,
    pub message: String,
    pub detail: Option<String>,
    pub retryable: bool,
    pub request_id: String,
}

/// The orchestrator's response to a single `QueryRequest` (spec §6
/// `QueryResponse`). `sql` is present even on a safety refusal, so the
/// caller can see exactly what was rejected and why (spec §7 propagation
/// policy: "Safety errors are always surfaced to the user with the
/// offending SQL").
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    pub success: bool,
    pub sql: Option<String>,
    pub data: Option<QueryResult>,
    pub confidence: Option<Confidence>,
    pub stats: Stats,
    pub error: Option<ErrorRecord>,
}

impl QueryResponse {
    pub fn failure(error: ErrorRecord, sql: Option<String>, stats: Stats) -> Self {
        Self {
            success: false,
            sql,
            data: None,
            confidence: None,
            stats,
            error: Some(error),
        }
    }
}
