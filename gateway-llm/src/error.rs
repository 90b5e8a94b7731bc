use backtrace::Backtrace;
use gateway_common::{impl_fmt_display, InternalError, ReportableError};
use http::StatusCode;
use thiserror::Error;

/// An error arising anywhere in the rate-limit/retry/circuit-breaker/provider
/// path (spec §4.5, §7).
#[derive(Debug)]
pub struct LlmError {
    kind: LlmErrorKind,
    pub status: StatusCode,
    pub backtrace: Box<Backtrace>,
}

#[derive(Debug, Error)]
pub enum LlmErrorKind {
    #[error("local rate limit exceeded")]
    RateLimited,

    #[error("circuit open after {0} consecutive provider failures")]
    CircuitOpen(u32),

    #[error("provider call timed out")]
    Timeout,

    #[error("provider request failed: {0}")]
    Provider(String),

    #[error("provider rejected request: {0}")]
    ProviderRejected(String),

    #[error("could not parse provider reply: {0}")]
    ParseError(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl LlmError {
    pub fn rate_limited() -> Self {
        LlmErrorKind::RateLimited.into()
    }

    pub fn circuit_open(consecutive_failures: u32) -> Self {
        LlmErrorKind::CircuitOpen(consecutive_failures).into()
    }

    pub fn timeout() -> Self {
        LlmErrorKind::Timeout.into()
    }

    pub fn provider(msg: impl Into<String>) -> Self {
        LlmErrorKind::Provider(msg.into()).into()
    }

    /// A provider 4xx (malformed request, auth, content-policy rejection,
    /// ...): the same prompt would fail again, so this is never retried
    /// (spec §4.5 "Non-transient errors (4xx, content policy) do not retry").
    pub fn provider_rejected(msg: impl Into<String>) -> Self {
        LlmErrorKind::ProviderRejected(msg.into()).into()
    }

    pub fn parse_error(msg: impl Into<String>) -> Self {
        LlmErrorKind::ParseError(msg.into()).into()
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        LlmErrorKind::Internal(msg.into()).into()
    }

    /// Whether the same call might succeed on a fresh attempt. Transport
    /// failures, server errors, and timeouts are transient; a malformed
    /// reply or a provider-side rejection (4xx, content policy) is not.
    pub fn is_transient(&self) -> bool {
        matches!(self.kind, LlmErrorKind::Timeout | LlmErrorKind::Provider(_))
    }
}

impl InternalError for LlmError {
    fn internal_error(message: String) -> Self {
        LlmError::internal(message)
    }
}

impl From<LlmErrorKind> for LlmError {
    fn from(kind: LlmErrorKind) -> Self {
        let status = match kind {
            LlmErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            LlmErrorKind::CircuitOpen(_) => StatusCode::SERVICE_UNAVAILABLE,
            LlmErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            LlmErrorKind::ProviderRejected(_) => StatusCode::BAD_REQUEST,
            LlmErrorKind::Provider(_) | LlmErrorKind::ParseError(_) | LlmErrorKind::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            kind,
            status,
            backtrace: Box::new(Backtrace::new()),
        }
    }
}

impl_fmt_display!(LlmError, LlmErrorKind);

impl std::error::Error for LlmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl ReportableError for LlmError {
    fn error_backtrace(&self) -> String {
        format!("{:#?}", self.backtrace)
    }

    fn is_sentry_event(&self) -> bool {
        !matches!(
            self.kind,
            LlmErrorKind::RateLimited
                | LlmErrorKind::CircuitOpen(_)
                | LlmErrorKind::ProviderRejected(_)
        )
    }

    fn metric_label(&self) -> Option<String> {
        Some(format!("llm.error.{}", self.kind_label()))
    }

    fn kind_label(&self) -> &'static str {
        match self.kind {
            LlmErrorKind::RateLimited => "rate_limited",
            LlmErrorKind::CircuitOpen(_) => "llm_unavailable",
            LlmErrorKind::Timeout => "timeout",
            LlmErrorKind::Provider(_) => "llm_unavailable",
            LlmErrorKind::ProviderRejected(_) => "llm_unavailable",
            LlmErrorKind::ParseError(_) => "llm_parse_error",
            LlmErrorKind::Internal(_) => "internal_error",
        }
    }

    fn retryable(&self) -> bool {
        matches!(
            self.kind,
            LlmErrorKind::RateLimited | LlmErrorKind::Timeout | LlmErrorKind::Provider(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient_but_client_rejections_are_not() {
        assert!(LlmError::provider("503").is_transient());
        assert!(!LlmError::provider_rejected("400").is_transient());
    }

    #[test]
    fn only_transient_kinds_are_reported_retryable() {
        assert!(LlmError::provider("503").retryable());
        assert!(!LlmError::provider_rejected("400").retryable());
    }
}
