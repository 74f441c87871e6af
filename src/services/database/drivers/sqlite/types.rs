//! SQLite value conversion.
//!
//! SQLite is dynamically typed: a column's declared type says little about
//! what a given cell holds. Cells are therefore decoded by their storage
//! class (INTEGER, REAL, TEXT, BLOB, NULL) rather than the declared type.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, TypeInfo, ValueRef};

use crate::services::database::traits::Value;

/// Converter for SQLite values to the unified `Value` type.
pub struct SqliteValueConverter;

impl SqliteValueConverter {
    /// Decode every cell of a row.
    pub fn convert_row(row: &SqliteRow) -> Vec<Value> {
        (0..row.len())
            .map(|index| Self::extract_value(row, index))
            .collect()
    }

    /// Decode and render every cell of a row.
    pub fn render_row(row: &SqliteRow, null_text: &str) -> Vec<String> {
        Self::convert_row(row)
            .iter()
            .map(|value| value.render(null_text))
            .collect()
    }

    fn extract_value(row: &SqliteRow, index: usize) -> Value {
        let storage_class = match row.try_get_raw(index) {
            Ok(raw) if raw.is_null() => return Value::Null,
            Ok(raw) => raw.type_info().name().to_uppercase(),
            Err(_) => return Value::Null,
        };

        Self::decode_by_storage_class(row, index, &storage_class)
    }

    fn decode_by_storage_class(row: &SqliteRow, index: usize, storage_class: &str) -> Value {
        match storage_class {
            "INTEGER" => row
                .try_get::<i64, _>(index)
                .map(Value::Int)
                .unwrap_or_else(|_| Self::decode_fallback(row, index, storage_class)),
            "REAL" => row
                .try_get::<f64, _>(index)
                .map(Value::Float)
                .unwrap_or_else(|_| Self::decode_fallback(row, index, storage_class)),
            "TEXT" => row
                .try_get::<String, _>(index)
                .map(Value::Text)
                .unwrap_or_else(|_| Self::decode_fallback(row, index, storage_class)),
            "BLOB" => row
                .try_get::<Vec<u8>, _>(index)
                .map(Value::Bytes)
                .unwrap_or_else(|_| Self::decode_fallback(row, index, storage_class)),
            _ => Self::decode_fallback(row, index, storage_class),
        }
    }

    /// Last resort for cells the typed decoders refused.
    fn decode_fallback(row: &SqliteRow, index: usize, type_name: &str) -> Value {
        let display = if let Ok(s) = row.try_get_unchecked::<String, _>(index) {
            s
        } else if let Ok(v) = row.try_get_unchecked::<i64, _>(index) {
            v.to_string()
        } else if let Ok(v) = row.try_get_unchecked::<f64, _>(index) {
            v.to_string()
        } else {
            "<unknown>".to_string()
        };

        Value::Other {
            type_name: type_name.to_string(),
            display,
        }
    }
}
