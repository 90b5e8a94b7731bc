use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a query reached the gateway: typed directly by an operator, or
/// generated from a natural-language question by the orchestrator (spec
/// §6's `source: "manual"|"nl"`).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Manual,
    Nl,
}

/// One line of the append-only history log (spec §6 "Persisted state").
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub db_name: String,
    pub sql: String,
    pub row_count: Option<usize>,
    pub execution_ms: Option<u64>,
    pub success: bool,
    pub error_kind: Option<String>,
    pub source: Source,
}

impl HistoryRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        request_id: impl Into<String>,
        db_name: impl Into<String>,
        sql: impl Into<String>,
        row_count: Option<usize>,
        execution_ms: Option<u64>,
        success: bool,
        error_kind: Option<String>,
        source: Source,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            timestamp: Utc::now(),
            db_name: db_name.into(),
            sql: sql.into(),
            row_count,
            execution_ms,
            success,
            error_kind,
            source,
        }
    }
}
