use gateway_db_common::{Cell, TypeTag};
use mysql_async::consts::ColumnType;
use mysql_async::{Row, Value};

/// Maps a MySQL wire column type to the canonical tag exposed in
/// `QueryResult` (spec §4.6 step 7).
pub fn type_tag(column_type: ColumnType) -> TypeTag {
    use ColumnType::*;
    match column_type {
        MYSQL_TYPE_TINY | MYSQL_TYPE_SHORT | MYSQL_TYPE_LONG | MYSQL_TYPE_LONGLONG
        | MYSQL_TYPE_INT24 | MYSQL_TYPE_YEAR => TypeTag::Int,
        MYSQL_TYPE_FLOAT | MYSQL_TYPE_DOUBLE | MYSQL_TYPE_DECIMAL | MYSQL_TYPE_NEWDECIMAL => {
            TypeTag::Float
        }
        MYSQL_TYPE_TINY_BLOB
        | MYSQL_TYPE_MEDIUM_BLOB
        | MYSQL_TYPE_LONG_BLOB
        | MYSQL_TYPE_BLOB
        | MYSQL_TYPE_GEOMETRY => TypeTag::Bytes,
        MYSQL_TYPE_DATE | MYSQL_TYPE_NEWDATE => TypeTag::Date,
        MYSQL_TYPE_DATETIME | MYSQL_TYPE_TIMESTAMP => TypeTag::Timestamp,
        MYSQL_TYPE_JSON => TypeTag::Json,
        MYSQL_TYPE_VARCHAR | MYSQL_TYPE_VAR_STRING | MYSQL_TYPE_STRING | MYSQL_TYPE_ENUM
        | MYSQL_TYPE_SET => TypeTag::Text,
        _ => TypeTag::Unknown,
    }
}

/// Pulls a single cell out of `row` at `idx`, dispatching on both the
/// column's declared type and the actual wire `Value` variant, since
/// `mysql_async` returns bytes-or-numeric without fully resolving strings
/// vs. blobs vs. JSON on its own.
pub fn cell(row: &Row, idx: usize) -> Cell {
    let tag = type_tag(row.columns_ref()[idx].column_type());
    match row.as_ref(idx) {
        None | Some(Value::NULL) => Cell::Null,
        Some(Value::Int(i)) => Cell::Int(*i),
        Some(Value::UInt(u)) => Cell::Int(*u as i64),
        Some(Value::Float(f)) => Cell::Float(*f as f64),
        Some(Value::Double(d)) => Cell::Float(*d),
        Some(Value::Bytes(bytes)) => match tag {
            TypeTag::Json => serde_json::from_slice(bytes)
                .map(Cell::Json)
                .unwrap_or_else(|_| Cell::Text(String::from_utf8_lossy(bytes).into_owned())),
            TypeTag::Bytes => Cell::Bytes(bytes.clone()),
            TypeTag::Timestamp | TypeTag::Date => {
                Cell::Text(String::from_utf8_lossy(bytes).into_owned())
            }
            _ => Cell::Text(String::from_utf8_lossy(bytes).into_owned()),
        },
        Some(Value::Date(year, month, day, hour, min, sec, micros)) => {
            if *hour == 0 && *min == 0 && *sec == 0 && *micros == 0 {
                Cell::Date(format!("{year:04}-{month:02}-{day:02}"))
            } else {
                Cell::Timestamp(format!(
                    "{year:04}-{month:02}-{day:02}T{hour:02}:{min:02}:{sec:02}.{micros:06}"
                ))
            }
        }
        Some(Value::Time(neg, days, hours, minutes, seconds, micros)) => Cell::Text(format!(
            "{}{}:{:02}:{:02}.{:06}",
            if *neg { "-" } else { "" },
            *days as u32 * 24 + *hours as u32,
            minutes,
            seconds,
            micros
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_core_column_types() {
        assert_eq!(type_tag(ColumnType::MYSQL_TYPE_LONG), TypeTag::Int);
        assert_eq!(type_tag(ColumnType::MYSQL_TYPE_VARCHAR), TypeTag::Text);
        assert_eq!(type_tag(ColumnType::MYSQL_TYPE_JSON), TypeTag::Json);
        assert_eq!(type_tag(ColumnType::MYSQL_TYPE_BLOB), TypeTag::Bytes);
    }
}
