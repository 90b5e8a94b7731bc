#[macro_use]
extern crate slog_scope;

mod metrics;

pub use metrics::{metrics_from_opts, MetricError, Metrics};

/// Request id header, echoed back to clients and attached to every log line,
/// metric and `ErrorRecord` for a given request.
pub static X_REQUEST_ID: &str = "x-request-id";

#[macro_export]
macro_rules! from_error {
    ($from:ty, $to:ty, $to_kind:expr) => {
        impl From<$from> for $to {
            fn from(inner: $from) -> $to {
                $to_kind(inner).into()
            }
        }
    };
}

#[macro_export]
macro_rules! impl_fmt_display {
    ($error:ty, $kind:ty) => {
        impl std::fmt::Display for $error {
            fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.kind, formatter)
            }
        }
    };
}

/// Implemented by every crate-level error type so the orchestrator can
/// decide whether to forward it to Sentry-style reporting and what metric
/// label to increment, without needing to downcast.
pub trait ReportableError: std::fmt::Debug {
    fn error_backtrace(&self) -> String;
    fn is_sentry_event(&self) -> bool;
    fn metric_label(&self) -> Option<String>;
    /// Externally-stable error kind identifier (spec §7's taxonomy, e.g.
    /// `"pool_exhausted"`, `"db_error"`). Used to build `ErrorRecord::kind`.
    fn kind_label(&self) -> &'static str;
    /// Whether the orchestrator may retry this error per spec §7's
    /// retryable column.
    fn retryable(&self) -> bool;
}

/// Types that implement this trait can represent internal/uncategorized
/// errors produced by infrastructure plumbing (channel closed, task
/// panicked, etc.) rather than by the operation itself.
pub trait InternalError {
    fn internal_error(message: String) -> Self;
}
