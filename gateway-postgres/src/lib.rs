//! Postgres dialect implementation of `gateway_db_common::{Db, DbPool}`.
//!
//! Built on `tokio-postgres` rather than the reference project's
//! `diesel-async`: the gateway executes arbitrary, shape-unknown `SELECT`
//! statements generated at runtime and must read each result column's wire
//! type (OID) back out, which diesel's compile-time-typed `QueryDsl` has no
//! way to express. `deadpool` (the reference project's pooling crate) still
//! manages the connections; only the wire driver underneath changed.
#[macro_use]
extern crate slog_scope;

mod db;
mod introspect;
mod pool;
mod type_map;

pub use db::PgDb;
pub use pool::PgDbPool;
