//! Rate-limited, retry-wrapped, circuit-broken client over the external
//! LLM text-completion provider, plus the prompt assembler that feeds it
//! (spec §4.4, §4.5). Everything downstream of this crate treats the
//! provider's replies as untrusted text until `gateway-sql-safety` has
//! validated them.
#[macro_use]
extern crate slog_scope;

mod breaker;
mod client;
mod error;
mod prompt;
mod rate_limiter;
mod types;

pub use client::{Backoff, LlmClient, LlmClientConfig, LlmProvider};
pub use error::{LlmError, LlmErrorKind};
pub use prompt::PromptAssembler;
pub use types::{Confidence, GeneratedSQL};
