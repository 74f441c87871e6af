//! PostgreSQL value conversion.
//!
//! Cells are decoded by the column's PostgreSQL type name into the unified
//! `Value` type, then rendered to display text.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgRow, PgSslMode};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use uuid::Uuid;

use crate::services::database::traits::{SslMode, Value};

/// Converter for PostgreSQL values to the unified `Value` type.
pub struct PgValueConverter;

impl PgValueConverter {
    /// Decode every cell of a row.
    pub fn convert_row(row: &PgRow) -> Vec<Value> {
        row.columns()
            .iter()
            .enumerate()
            .map(|(index, column)| Self::extract_value(row, index, column.type_info().name()))
            .collect()
    }

    /// Decode and render every cell of a row.
    pub fn render_row(row: &PgRow, null_text: &str) -> Vec<String> {
        Self::convert_row(row)
            .iter()
            .map(|value| value.render(null_text))
            .collect()
    }

    fn extract_value(row: &PgRow, index: usize, type_name: &str) -> Value {
        match row.try_get_raw(index) {
            Ok(raw) if raw.is_null() => return Value::Null,
            Err(_) => return Value::Null,
            _ => {}
        }

        Self::decode_by_type(row, index, type_name)
    }

    /// Decode a value based on its PostgreSQL type name.
    fn decode_by_type(row: &PgRow, index: usize, type_name: &str) -> Value {
        let decoded = match type_name {
            "BOOL" => row.try_get::<bool, _>(index).map(Value::Bool),

            "INT2" | "SMALLINT" | "SMALLSERIAL" => {
                row.try_get::<i16, _>(index).map(|v| Value::Int(v.into()))
            }
            "INT4" | "INT" | "INTEGER" | "SERIAL" => {
                row.try_get::<i32, _>(index).map(|v| Value::Int(v.into()))
            }
            "INT8" | "BIGINT" | "BIGSERIAL" => row.try_get::<i64, _>(index).map(Value::Int),

            "FLOAT4" | "REAL" => row.try_get::<f32, _>(index).map(|v| Value::Float(v.into())),
            "FLOAT8" | "DOUBLE PRECISION" => row.try_get::<f64, _>(index).map(Value::Float),

            "NUMERIC" | "DECIMAL" => row.try_get::<Decimal, _>(index).map(Value::Decimal),

            "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => {
                row.try_get::<String, _>(index).map(Value::Text)
            }

            "BYTEA" => row.try_get::<Vec<u8>, _>(index).map(Value::Bytes),

            "DATE" => row.try_get::<NaiveDate, _>(index).map(Value::Date),
            "TIME" => row.try_get::<NaiveTime, _>(index).map(Value::Time),
            "TIMESTAMP" => row.try_get::<NaiveDateTime, _>(index).map(Value::DateTime),
            "TIMESTAMPTZ" => row.try_get::<DateTime<Utc>, _>(index).map(Value::DateTimeTz),

            "UUID" => row.try_get::<Uuid, _>(index).map(Value::Uuid),

            "JSON" | "JSONB" => row.try_get::<serde_json::Value, _>(index).map(Value::Json),

            "INT4[]" => row
                .try_get::<Vec<i32>, _>(index)
                .map(|items| Self::array(type_name, items)),
            "INT8[]" => row
                .try_get::<Vec<i64>, _>(index)
                .map(|items| Self::array(type_name, items)),
            "TEXT[]" | "VARCHAR[]" => row
                .try_get::<Vec<String>, _>(index)
                .map(|items| Self::array(type_name, items)),
            "BOOL[]" => row
                .try_get::<Vec<bool>, _>(index)
                .map(|items| Self::array(type_name, items)),
            "FLOAT8[]" => row
                .try_get::<Vec<f64>, _>(index)
                .map(|items| Self::array(type_name, items)),

            _ => return Self::decode_as_string_fallback(row, index, type_name),
        };

        decoded.unwrap_or_else(|_| Self::decode_as_string_fallback(row, index, type_name))
    }

    /// Arrays render in PostgreSQL's own `{a,b}` notation.
    fn array<T: ToString>(type_name: &str, items: Vec<T>) -> Value {
        let items: Vec<String> = items.iter().map(ToString::to_string).collect();
        Value::Other {
            type_name: type_name.to_string(),
            display: format!("{{{}}}", items.join(",")),
        }
    }

    /// Fallback for unknown types: string, then integer, then float.
    fn decode_as_string_fallback(row: &PgRow, index: usize, type_name: &str) -> Value {
        let display = if let Ok(s) = row.try_get_unchecked::<String, _>(index) {
            s
        } else if let Ok(v) = row.try_get::<i64, _>(index) {
            v.to_string()
        } else if let Ok(v) = row.try_get::<f64, _>(index) {
            v.to_string()
        } else {
            "<unknown>".to_string()
        };

        Value::Other {
            type_name: type_name.to_string(),
            display,
        }
    }

    /// Map the generic SSL mode onto SQLx's PostgreSQL mode.
    pub fn map_ssl_mode(mode: SslMode) -> PgSslMode {
        match mode {
            SslMode::Disable => PgSslMode::Disable,
            SslMode::Prefer => PgSslMode::Prefer,
            SslMode::Require => PgSslMode::Require,
            SslMode::VerifyCa => PgSslMode::VerifyCa,
            SslMode::VerifyFull => PgSslMode::VerifyFull,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssl_mode_mapping() {
        assert!(matches!(
            PgValueConverter::map_ssl_mode(SslMode::Disable),
            PgSslMode::Disable
        ));
        assert!(matches!(
            PgValueConverter::map_ssl_mode(SslMode::Prefer),
            PgSslMode::Prefer
        ));
        assert!(matches!(
            PgValueConverter::map_ssl_mode(SslMode::VerifyFull),
            PgSslMode::VerifyFull
        ));
    }

    #[test]
    fn test_array_notation() {
        assert_eq!(
            PgValueConverter::array("INT4[]", vec![1, 2, 3]).render("NULL"),
            "{1,2,3}"
        );
    }
}
