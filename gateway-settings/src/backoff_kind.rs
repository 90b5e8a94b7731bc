use serde::{Deserialize, Serialize};

/// Backoff shape for the LLM client's retry policy (spec §4.5).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    Fixed,
    Exponential,
}
