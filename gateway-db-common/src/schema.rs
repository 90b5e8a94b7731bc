use serde::{Deserialize, Serialize};

/// Canonical, driver-independent schema tree (spec §3). Value-typed and
/// immutable: a fresh snapshot replaces the old one atomically in the
/// cache, it is never mutated in place.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    pub schemas: Vec<SchemaInfo>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SchemaInfo {
    pub name: String,
    pub tables: Vec<TableInfo>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    Table,
    View,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub kind: TableKind,
    pub columns: Vec<ColumnInfo>,
    /// Best-effort row count. A single failed count does not fail the
    /// whole snapshot (spec §4.2); this is simply left `None`.
    pub row_count: Option<i64>,
    pub comment: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub type_name: String,
    pub nullable: bool,
    pub primary_key: bool,
    pub unique: bool,
    pub default: Option<String>,
}

impl SchemaSnapshot {
    pub fn table(&self, schema: &str, table: &str) -> Option<&TableInfo> {
        self.schemas
            .iter()
            .find(|s| s.name == schema)
            .and_then(|s| s.tables.iter().find(|t| t.name == table))
    }

    /// All table names across all schemas, used by the prompt assembler's
    /// lexical-overlap ranking heuristic.
    pub fn all_tables(&self) -> impl Iterator<Item = (&str, &TableInfo)> {
        self.schemas
            .iter()
            .flat_map(|s| s.tables.iter().map(move |t| (s.name.as_str(), t)))
    }
}
