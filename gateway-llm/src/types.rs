use gateway_db_common::Dialect;
use serde::{Deserialize, Serialize};

/// Candidate SQL returned by the provider (spec §4.4/§4.5), before it has
/// passed through the safety validator.
#[derive(Clone, Debug)]
pub struct GeneratedSQL {
    pub text: String,
    pub dialect: Dialect,
    pub model_id: String,
    pub token_count: u32,
    pub generation_ms: u64,
}

/// The provider's self-assessment of how well a SQL statement and its
/// sample results answer the original question (spec §4.7 S5). `score` is
/// `None` when judging itself failed or was skipped; callers treat that as
/// "unjudged", not as a rejection.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Confidence {
    pub score: Option<u8>,
    pub rationale: String,
    pub concerns: Vec<String>,
}

impl Confidence {
    pub fn unjudged() -> Self {
        Self {
            score: None,
            rationale: "result was not judged".to_owned(),
            concerns: Vec::new(),
        }
    }
}
