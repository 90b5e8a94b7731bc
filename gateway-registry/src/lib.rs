//! Runtime registry of `Arc<dyn DbPool>` keyed by database name.
//!
//! The reference project selected exactly one backend at compile time via
//! mutually exclusive Cargo features (`mysql` xor `postgres` xor `spanner`,
//! enforced with `compile_error!` in its own `lib.rs`). This gateway talks
//! to several databases, of possibly different dialects, in the same
//! process, so dispatch moves to runtime: every dialect crate implements
//! the same `gateway_db_common::DbPool` trait, and this registry just holds
//! trait objects.
#[macro_use]
extern crate slog_scope;

mod registry;

pub use registry::{AdminError, DatabaseHealth, DatabaseRegistry, RegistryStatus};
