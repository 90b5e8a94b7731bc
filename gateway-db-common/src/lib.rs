//! Shared types and traits for every per-dialect database backend:
//! the [`Dialect`] tag, [`DatabaseDescriptor`], the [`Db`]/[`DbPool`]
//! capability traits a backend implements, pool state introspection, and
//! the `DbError` taxonomy the orchestrator maps into spec §7's externally
//! visible error kinds.

pub mod descriptor;
pub mod error;
pub mod pool_state;
pub mod result;
pub mod schema;
pub mod traits;

pub use descriptor::{DatabaseDescriptor, Dialect};
pub use error::{DbError, DbErrorKind};
pub use pool_state::{GetPoolState, PoolState};
pub use result::{Cell, QueryResult, ResultColumn, TypeTag};
pub use schema::{ColumnInfo, SchemaSnapshot, TableInfo, TableKind};
pub use traits::{CloseOutcome, Db, DbPool, PooledConnection};
