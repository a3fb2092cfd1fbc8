//! MySQL row decoding into JSON records
//!
//! Stored procedures return arbitrary column sets, so rows are decoded by
//! the column's reported type rather than into fixed structs.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{Number, Value};
use sqlx::mysql::MySqlRow;
use sqlx::types::Json;
use sqlx::{Column, Row, TypeInfo, ValueRef};

use crate::models::Record;

/// Largest integer an f64 represents exactly
const MAX_EXACT_F64_INT: f64 = 9_007_199_254_740_992.0;

/// Decode every column of a row, preserving column order.
pub fn row_to_record(row: &MySqlRow) -> Result<Record, sqlx::Error> {
    let mut record = Record::new();
    for (idx, column) in row.columns().iter().enumerate() {
        record.insert(column.name().to_owned(), column_to_json(row, idx)?);
    }
    Ok(record)
}

/// Decode a single column by its MySQL type.
pub fn column_to_json(row: &MySqlRow, idx: usize) -> Result<Value, sqlx::Error> {
    if row.try_get_raw(idx)?.is_null() {
        return Ok(Value::Null);
    }

    let type_name = row.column(idx).type_info().name();
    let value = match type_name {
        "BOOLEAN" => Value::Bool(row.try_get::<bool, _>(idx)?),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            Value::from(row.try_get::<i64, _>(idx)?)
        }
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => Value::from(row.try_get::<u64, _>(idx)?),
        "FLOAT" => float_to_json(f64::from(row.try_get::<f32, _>(idx)?)),
        "DOUBLE" => float_to_json(row.try_get::<f64, _>(idx)?),
        // DECIMAL arrives as its textual representation in both protocols
        "DECIMAL" => numeric_or_text(row.try_get_unchecked::<String, _>(idx)?),
        "DATE" => Value::String(row.try_get::<NaiveDate, _>(idx)?.to_string()),
        "DATETIME" | "TIMESTAMP" => Value::String(
            row.try_get::<NaiveDateTime, _>(idx)?
                .format("%Y-%m-%dT%H:%M:%S%.f")
                .to_string(),
        ),
        "TIME" => Value::String(row.try_get::<NaiveTime, _>(idx)?.to_string()),
        "JSON" => row.try_get::<Json<Value>, _>(idx)?.0,
        _ => match row.try_get::<String, _>(idx) {
            Ok(text) => Value::String(text),
            Err(_) => {
                let bytes = row.try_get_unchecked::<Vec<u8>, _>(idx)?;
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            }
        },
    };

    Ok(value)
}

/// Render numeric text as a JSON number, anything else as a string.
///
/// Integral values become integers (`"1500.00"` -> `1500`).
pub fn numeric_or_text(text: String) -> Value {
    let trimmed = text.trim();
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::from(int);
    }
    match trimmed.parse::<f64>() {
        Ok(float) if float.is_finite() => float_to_json(float),
        _ => Value::String(text),
    }
}

fn float_to_json(float: f64) -> Value {
    if float.fract() == 0.0 && float.abs() <= MAX_EXACT_F64_INT {
        return Value::from(float as i64);
    }
    Number::from_f64(float).map_or(Value::Null, Value::Number)
}
