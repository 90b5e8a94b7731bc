use gateway_common::ReportableError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SafetyError {
    #[error("could not parse SQL: {0}")]
    Parse(String),

    #[error("statement is empty")]
    EmptyStatement,

    #[error("expected exactly one statement, found {0}")]
    MultipleStatements(usize),

    #[error("statement is not a read-only query")]
    NotReadOnly,

    #[error("statement locks rows ({0}), which is not permitted")]
    RowLocking(String),

    #[error("call to blocked function {0:?}")]
    BlockedFunction(String),

    #[error("relation {0:?} is not on the allowlist")]
    DisallowedRelation(String),
}

impl ReportableError for SafetyError {
    fn error_backtrace(&self) -> String {
        String::new()
    }

    fn is_sentry_event(&self) -> bool {
        false
    }

    fn metric_label(&self) -> Option<String> {
        Some(format!("sql_safety.rejected.{}", self.kind_label()))
    }

    fn kind_label(&self) -> &'static str {
        // Stable identifiers from spec §7's error kind taxonomy. `RowLocking`
        // and `EmptyStatement` are tie-breaks of the same "not read-only"
        // verdict (§4.3 step 3) and don't get their own external kind.
        match self {
            SafetyError::Parse(_) => "parse_error",
            SafetyError::EmptyStatement => "parse_error",
            SafetyError::MultipleStatements(_) => "multiple_statements",
            SafetyError::NotReadOnly => "not_readonly",
            SafetyError::RowLocking(_) => "not_readonly",
            SafetyError::BlockedFunction(_) => "blocked_function",
            SafetyError::DisallowedRelation(_) => "disallowed_identifier",
        }
    }

    fn retryable(&self) -> bool {
        false
    }
}
