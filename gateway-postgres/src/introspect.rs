use std::collections::{HashMap, HashSet};

use gateway_db_common::{ColumnInfo, DbError, SchemaInfo, SchemaSnapshot, TableInfo, TableKind};
use tokio_postgres::Client;

/// Pulls a full `SchemaSnapshot` via `information_schema` plus `pg_catalog`
/// for row estimates, mirroring the read-only, best-effort posture of the
/// reference project's collection/BSO bootstrap queries but generalized to
/// arbitrary user schemas (spec §4.2).
pub async fn snapshot(client: &Client) -> Result<SchemaSnapshot, DbError> {
    let table_rows = client
        .query(
            "SELECT table_schema, table_name, table_type, obj_description(
                (quote_ident(table_schema) || '.' || quote_ident(table_name))::regclass, 'pg_class'
            )
             FROM information_schema.tables
             WHERE table_schema NOT IN ('pg_catalog', 'information_schema')
             ORDER BY table_schema, table_name",
            &[],
        )
        .await
        .map_err(|e| DbError::db(format!("introspecting tables: {e}")))?;

    let column_rows = client
        .query(
            "SELECT table_schema, table_name, column_name, data_type, is_nullable, column_default
             FROM information_schema.columns
             WHERE table_schema NOT IN ('pg_catalog', 'information_schema')
             ORDER BY table_schema, table_name, ordinal_position",
            &[],
        )
        .await
        .map_err(|e| DbError::db(format!("introspecting columns: {e}")))?;

    let key_rows = client
        .query(
            "SELECT tc.table_schema, tc.table_name, kcu.column_name, tc.constraint_type
             FROM information_schema.table_constraints tc
             JOIN information_schema.key_column_usage kcu
               ON tc.constraint_name = kcu.constraint_name
              AND tc.table_schema = kcu.table_schema
             WHERE tc.constraint_type IN ('PRIMARY KEY', 'UNIQUE')
               AND tc.table_schema NOT IN ('pg_catalog', 'information_schema')",
            &[],
        )
        .await
        .map_err(|e| DbError::db(format!("introspecting constraints: {e}")))?;

    let mut primary_keys: HashSet<(String, String, String)> = HashSet::new();
    let mut unique_keys: HashSet<(String, String, String)> = HashSet::new();
    for row in &key_rows {
        let key = (row.get::<_, String>(0), row.get::<_, String>(1), row.get::<_, String>(2));
        match row.get::<_, String>(3).as_str() {
            "PRIMARY KEY" => {
                primary_keys.insert(key);
            }
            "UNIQUE" => {
                unique_keys.insert(key);
            }
            _ => {}
        }
    }

    let mut columns_by_table: HashMap<(String, String), Vec<ColumnInfo>> = HashMap::new();
    for row in &column_rows {
        let schema: String = row.get(0);
        let table: String = row.get(1);
        let column: String = row.get(2);
        let key = (schema.clone(), table.clone(), column.clone());
        columns_by_table
            .entry((schema, table))
            .or_default()
            .push(ColumnInfo {
                primary_key: primary_keys.contains(&key),
                unique: unique_keys.contains(&key) || primary_keys.contains(&key),
                name: column,
                type_name: row.get(3),
                nullable: row.get::<_, String>(4) == "YES",
                default: row.get(5),
            });
    }

    // Best-effort row estimates from `pg_class.reltuples`; a single failed
    // lookup must not fail the whole snapshot (spec §4.2).
    let row_estimates = client
        .query(
            "SELECT n.nspname, c.relname, c.reltuples::bigint
             FROM pg_class c
             JOIN pg_namespace n ON n.oid = c.relnamespace
             WHERE n.nspname NOT IN ('pg_catalog', 'information_schema')",
            &[],
        )
        .await
        .unwrap_or_default();
    let mut row_counts: HashMap<(String, String), i64> = HashMap::new();
    for row in &row_estimates {
        row_counts.insert((row.get(0), row.get(1)), row.get::<_, i64>(2).max(0));
    }

    let mut by_schema: HashMap<String, Vec<TableInfo>> = HashMap::new();
    for row in &table_rows {
        let schema: String = row.get(0);
        let name: String = row.get(1);
        let kind = if row.get::<_, String>(2) == "VIEW" {
            TableKind::View
        } else {
            TableKind::Table
        };
        let columns = columns_by_table
            .remove(&(schema.clone(), name.clone()))
            .unwrap_or_default();
        let row_count = row_counts.get(&(schema.clone(), name.clone())).copied();
        by_schema.entry(schema).or_default().push(TableInfo {
            name,
            kind,
            columns,
            row_count,
            comment: row.get(3),
        });
    }

    let mut schemas: Vec<SchemaInfo> = by_schema
        .into_iter()
        .map(|(name, tables)| SchemaInfo { name, tables })
        .collect();
    schemas.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(SchemaSnapshot { schemas })
}
