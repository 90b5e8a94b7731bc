use std::collections::{HashMap, HashSet};

use gateway_db_common::{ColumnInfo, DbError, SchemaInfo, SchemaSnapshot, TableInfo, TableKind};
use mysql_async::prelude::*;
use mysql_async::Conn;

/// Pulls a full `SchemaSnapshot` from `information_schema`, scoped to the
/// connection's current database (spec §4.2). MySQL's `information_schema`
/// has no notion of multiple user-visible "schemas" the way Postgres does,
/// so the snapshot carries exactly one `SchemaInfo` named after the
/// database.
pub async fn snapshot(conn: &mut Conn, database: &str) -> Result<SchemaSnapshot, DbError> {
    let table_rows: Vec<(String, String, Option<String>, Option<i64>)> = conn
        .exec(
            "SELECT table_name, table_type, table_comment, table_rows
             FROM information_schema.tables
             WHERE table_schema = :db
             ORDER BY table_name",
            params! { "db" => database },
        )
        .await
        .map_err(|e| DbError::db(format!("introspecting tables: {e}")))?;

    let column_rows: Vec<(String, String, String, String, String, Option<String>)> = conn
        .exec(
            "SELECT table_name, column_name, data_type, is_nullable, column_key, column_default
             FROM information_schema.columns
             WHERE table_schema = :db
             ORDER BY table_name, ordinal_position",
            params! { "db" => database },
        )
        .await
        .map_err(|e| DbError::db(format!("introspecting columns: {e}")))?;

    let mut columns_by_table: HashMap<String, Vec<ColumnInfo>> = HashMap::new();
    let mut seen_primary: HashSet<String> = HashSet::new();
    for (table, column, data_type, nullable, key, default) in column_rows {
        let is_pk = key == "PRI";
        if is_pk {
            seen_primary.insert(format!("{table}.{column}"));
        }
        columns_by_table
            .entry(table)
            .or_default()
            .push(ColumnInfo {
                name: column,
                type_name: data_type,
                nullable: nullable == "YES",
                primary_key: is_pk,
                unique: is_pk || key == "UNI",
                default,
            });
    }

    let tables = table_rows
        .into_iter()
        .map(|(name, table_type, comment, row_count)| TableInfo {
            kind: if table_type == "VIEW" {
                TableKind::View
            } else {
                TableKind::Table
            },
            columns: columns_by_table.remove(&name).unwrap_or_default(),
            row_count,
            comment: comment.filter(|c| !c.is_empty()),
            name,
        })
        .collect();

    Ok(SchemaSnapshot {
        schemas: vec![SchemaInfo {
            name: database.to_owned(),
            tables,
        }],
    })
}
