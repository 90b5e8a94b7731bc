//! Append-only JSONL history log (spec §6 "Persisted state"): a passive
//! record of what was asked, what SQL ran, and how it went. Out of the
//! request's critical path — the server writes to it best-effort after a
//! request completes.
mod error;
mod record;
mod sink;

pub use error::HistoryError;
pub use record::{HistoryRecord, Source};
pub use sink::HistoryLog;
