use gateway_common::ReportableError;

use crate::types::ErrorRecord;

/// Internal carrier for anything that can end a request early. Built from
/// any downstream `ReportableError` (DbError, LlmError, SafetyError,
/// ExecutorError) via the blanket `From` below, plus a few kinds the
/// orchestrator itself originates (`schema_unavailable`, `unsafe_sql`,
/// `config_error`) that have no single owning crate (spec §7).
#[derive(Debug)]
pub struct OrchestratorError {
    pub kind: &'static str,
    pub message: String,
    pub retryable: bool,
}

impl OrchestratorError {
    pub fn new(kind: &'static str, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
        }
    }

    pub fn into_record(self, request_id: String) -> ErrorRecord {
        ErrorRecord {
            kind: self.kind.to_owned(),
            message: self.message,
            detail: None,
            retryable: self.retryable,
            request_id,
        }
    }
}

impl<E> From<E> for OrchestratorError
where
    E: ReportableError + std::fmt::Display,
{
    fn from(e: E) -> Self {
        let retryable = e.retryable();
        let kind = e.kind_label();
        Self {
            kind,
            message: e.to_string(),
            retryable,
        }
    }
}
