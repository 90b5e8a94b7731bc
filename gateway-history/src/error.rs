use thiserror::Error;

/// Failures writing a history record. The sink is best-effort: callers log
/// and move on rather than failing the request over it (spec §6 treats
/// history as passive, out-of-core state).
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("opening history log: {0}")]
    Open(#[source] std::io::Error),

    #[error("writing history record: {0}")]
    Write(#[source] std::io::Error),

    #[error("encoding history record: {0}")]
    Encode(#[from] serde_json::Error),
}
