use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use gateway_db_common::{Cell, DbError, TypeTag};
use rust_decimal::Decimal;
use tokio_postgres::types::Type;
use tokio_postgres::Row;

/// Maps a Postgres wire type to the canonical tag exposed in `QueryResult`
/// (spec §4.6 step 7). Unrecognized OIDs (extension types, composites,
/// arrays) fall back to `Unknown` and are rendered as text.
pub fn type_tag(pg_type: &Type) -> TypeTag {
    match *pg_type {
        Type::BOOL => TypeTag::Bool,
        Type::INT2 | Type::INT4 | Type::INT8 => TypeTag::Int,
        Type::FLOAT4 | Type::FLOAT8 | Type::NUMERIC => TypeTag::Float,
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::CHAR => TypeTag::Text,
        Type::BYTEA => TypeTag::Bytes,
        Type::TIMESTAMP | Type::TIMESTAMPTZ => TypeTag::Timestamp,
        Type::DATE => TypeTag::Date,
        Type::JSON | Type::JSONB => TypeTag::Json,
        _ => TypeTag::Unknown,
    }
}

/// Pulls a single cell out of `row` at `idx`, dispatching on the column's
/// declared type rather than guessing from the Rust value, since an
/// untyped `SELECT` column has no other source of truth at this layer.
pub fn cell(row: &Row, idx: usize) -> Result<Cell, DbError> {
    let col_type = row.columns()[idx].type_();

    macro_rules! get {
        ($t:ty) => {
            row.try_get::<_, Option<$t>>(idx)
                .map_err(|e| DbError::db(format!("column {idx}: {e}")))?
        };
    }

    let cell = match *col_type {
        Type::BOOL => get!(bool).map(Cell::Bool),
        Type::INT2 => get!(i16).map(|v| Cell::Int(v as i64)),
        Type::INT4 => get!(i32).map(|v| Cell::Int(v as i64)),
        Type::INT8 => get!(i64).map(Cell::Int),
        Type::FLOAT4 => get!(f32).map(|v| Cell::Float(v as f64)),
        Type::FLOAT8 => get!(f64).map(Cell::Float),
        Type::NUMERIC => get!(Decimal).map(|d| Cell::Float(d.to_string().parse().unwrap_or(0.0))),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::CHAR => {
            get!(String).map(Cell::Text)
        }
        Type::BYTEA => get!(Vec<u8>).map(Cell::Bytes),
        Type::TIMESTAMP => get!(NaiveDateTime).map(|v| Cell::Timestamp(v.to_string())),
        Type::TIMESTAMPTZ => get!(DateTime<Utc>).map(|v| Cell::Timestamp(v.to_rfc3339())),
        Type::DATE => get!(NaiveDate).map(|v| Cell::Date(v.to_string())),
        Type::JSON | Type::JSONB => get!(serde_json::Value).map(Cell::Json),
        _ => {
            // Best-effort: render anything we don't special-case as text,
            // falling back to `Unknown`/null if even that fails to decode.
            row.try_get::<_, Option<String>>(idx)
                .ok()
                .flatten()
                .map(Cell::Text)
        }
    };

    Ok(cell.unwrap_or(Cell::Null))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_core_scalar_types() {
        assert_eq!(type_tag(&Type::INT4), TypeTag::Int);
        assert_eq!(type_tag(&Type::TEXT), TypeTag::Text);
        assert_eq!(type_tag(&Type::JSONB), TypeTag::Json);
        assert_eq!(type_tag(&Type::BYTEA), TypeTag::Bytes);
    }

    #[test]
    fn unrecognized_type_falls_back_to_unknown() {
        assert_eq!(type_tag(&Type::INT4_RANGE), TypeTag::Unknown);
    }
}
