use serde::{Deserialize, Serialize};

/// Canonical driver-independent type tag a result cell is mapped to (spec
/// §4.6 step 7).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    Int,
    Float,
    Bool,
    Text,
    Bytes,
    Timestamp,
    Date,
    Json,
    Null,
    Unknown,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cell {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(String),
    Date(String),
    Json(serde_json::Value),
    Null,
}

impl Cell {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Cell::Int(_) => TypeTag::Int,
            Cell::Float(_) => TypeTag::Float,
            Cell::Bool(_) => TypeTag::Bool,
            Cell::Text(_) => TypeTag::Text,
            Cell::Bytes(_) => TypeTag::Bytes,
            Cell::Timestamp(_) => TypeTag::Timestamp,
            Cell::Date(_) => TypeTag::Date,
            Cell::Json(_) => TypeTag::Json,
            Cell::Null => TypeTag::Null,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResultColumn {
    pub name: String,
    pub type_tag: TypeTag,
}

/// Result of executing a `ValidatedSQL` statement (spec §3). Invariant:
/// `rows.len() <= effective_row_cap`; if the statement would have produced
/// more rows, `truncated` is set and `rows` holds the first
/// `effective_row_cap` by the driver's natural order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<ResultColumn>,
    pub rows: Vec<Vec<Cell>>,
    pub row_count: usize,
    pub execution_ms: u64,
    pub truncated: bool,
}
