use gateway_common::ReportableError;
use gateway_db_common::DbError;
use thiserror::Error;

/// Thin wrapper around [`DbError`]: the executor has no failure modes of
/// its own beyond what acquiring a connection and running a statement can
/// produce, so it simply forwards the underlying error's `kind_label` and
/// `retryable` verdict (spec §4.6 contract's `ErrorKind` set is a subset of
/// §7's `DbError` taxonomy).
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ExecutorError(#[from] DbError);

impl ReportableError for ExecutorError {
    fn error_backtrace(&self) -> String {
        self.0.error_backtrace()
    }

    fn is_sentry_event(&self) -> bool {
        self.0.is_sentry_event()
    }

    fn metric_label(&self) -> Option<String> {
        self.0.metric_label()
    }

    fn kind_label(&self) -> &'static str {
        self.0.kind_label()
    }

    fn retryable(&self) -> bool {
        self.0.retryable()
    }
}
