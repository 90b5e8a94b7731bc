//! Per-database schema snapshot cache with TTL expiry, single-flight
//! refresh, and serve-stale-while-revalidating (spec §4.2).
#[macro_use]
extern crate slog_scope;

mod cache;

pub use cache::SchemaCache;
