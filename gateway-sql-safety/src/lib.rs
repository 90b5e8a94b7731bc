//! Parses, validates, and rewrites a single candidate SQL statement using a
//! real AST (`sqlparser`) rather than string matching, per the spec's
//! explicit requirement that the safety gate not be regex-based (spec §4.3).
mod error;
mod policy;
mod validate;

pub use error::SafetyError;
pub use policy::SafetyPolicy;
pub use validate::{validate, CostClass, ValidatedSQL};
