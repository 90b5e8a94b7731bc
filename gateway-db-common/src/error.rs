use backtrace::Backtrace;
use gateway_common::{impl_fmt_display, InternalError, ReportableError};
use http::StatusCode;
use thiserror::Error;

/// An error arising anywhere in the pool/registry/execution path. Carries
/// enough to map onto spec §7's externally visible `ErrorKind` taxonomy
/// (`kind_label`) and whether the orchestrator may retry (`retryable`).
#[derive(Debug)]
pub struct DbError {
    kind: DbErrorKind,
    pub status: StatusCode,
    pub backtrace: Box<Backtrace>,
}

#[derive(Debug, Error)]
pub enum DbErrorKind {
    #[error("unknown database {0:?}")]
    UnknownDatabase(String),

    #[error("pool exhausted: no connection available within deadline")]
    PoolExhausted,

    #[error("pool is closing")]
    PoolClosing,

    #[error("failed to connect: {0}")]
    ConnectFailed(String),

    #[error("statement timed out")]
    Timeout,

    #[error("database error: {0}")]
    Db(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn unknown_database(name: impl Into<String>) -> Self {
        DbErrorKind::UnknownDatabase(name.into()).into()
    }

    pub fn pool_exhausted() -> Self {
        DbErrorKind::PoolExhausted.into()
    }

    pub fn pool_closing() -> Self {
        DbErrorKind::PoolClosing.into()
    }

    pub fn connect_failed(msg: impl Into<String>) -> Self {
        DbErrorKind::ConnectFailed(msg.into()).into()
    }

    pub fn timeout() -> Self {
        DbErrorKind::Timeout.into()
    }

    pub fn db(msg: impl Into<String>) -> Self {
        DbErrorKind::Db(msg.into()).into()
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        DbErrorKind::Internal(msg.into()).into()
    }
}

impl InternalError for DbError {
    fn internal_error(message: String) -> Self {
        DbError::internal(message)
    }
}

impl From<DbErrorKind> for DbError {
    fn from(kind: DbErrorKind) -> Self {
        let status = match kind {
            DbErrorKind::UnknownDatabase(_) => StatusCode::NOT_FOUND,
            DbErrorKind::PoolExhausted => StatusCode::SERVICE_UNAVAILABLE,
            DbErrorKind::PoolClosing => StatusCode::SERVICE_UNAVAILABLE,
            DbErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            DbErrorKind::ConnectFailed(_) | DbErrorKind::Db(_) | DbErrorKind::Internal(_) => {
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

impl_fmt_display!(DbError, DbErrorKind);

impl std::error::Error for DbError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl ReportableError for DbError {
    fn error_backtrace(&self) -> String {
        format!("{:#?}", self.backtrace)
    }

    fn is_sentry_event(&self) -> bool {
        !matches!(
            self.kind,
            DbErrorKind::PoolClosing | DbErrorKind::UnknownDatabase(_)
        )
    }

    fn metric_label(&self) -> Option<String> {
        Some(format!("db.error.{}", self.kind_label()))
    }

    fn kind_label(&self) -> &'static str {
        match self.kind {
            DbErrorKind::UnknownDatabase(_) => "unknown_db",
            DbErrorKind::PoolExhausted => "pool_exhausted",
            DbErrorKind::PoolClosing => "pool_closing",
            DbErrorKind::ConnectFailed(_) => "db_error",
            DbErrorKind::Timeout => "timeout",
            DbErrorKind::Db(_) => "db_error",
            DbErrorKind::Internal(_) => "internal_error",
        }
    }

    fn retryable(&self) -> bool {
        matches!(
            self.kind,
            DbErrorKind::PoolExhausted | DbErrorKind::ConnectFailed(_)
        )
    }
}
