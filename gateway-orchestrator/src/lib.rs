//! The request-level state machine that composes every other component
//! into a single `query(QueryRequest) -> QueryResponse` call (spec §4.7):
//! schema fetch → prompt assembly → LLM generation → safety validation,
//! with one remediation cycle on refusal → execution → best-effort result
//! judging.
#[macro_use]
extern crate slog_scope;

mod config;
mod error;
mod orchestrator;
mod types;

pub use config::OrchestratorConfig;
pub use error::OrchestratorError;
pub use orchestrator::Orchestrator;
pub use types::{ErrorRecord, QueryRequest, QueryResponse, ReturnMode, Stats, MAX_QUESTION_BYTES};
