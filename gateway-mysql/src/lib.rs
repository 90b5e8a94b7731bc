//! MySQL dialect implementation of `gateway_db_common::{Db, DbPool}`, built
//! directly on `mysql_async` rather than Diesel: `mysql_async::Pool` already
//! manages connection pooling and its `Row`/`Value`/`Column` types expose
//! the wire type information the gateway needs to describe shape-unknown
//! result sets (spec §4.6 step 7).
#[macro_use]
extern crate slog_scope;

mod db;
mod introspect;
mod pool;
mod type_map;

pub use db::MysqlDb;
pub use pool::MysqlDbPool;
