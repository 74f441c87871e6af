//! MySQL value conversion.
//!
//! Cells are decoded by the column's MySQL type name into the unified
//! `Value` type, then rendered to display text.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::mysql::{MySqlRow, MySqlSslMode};
use sqlx::{Column, Row, TypeInfo, ValueRef};

use crate::services::database::traits::{SslMode, Value};

/// Converter for MySQL values to the unified `Value` type.
pub struct MySqlValueConverter;

impl MySqlValueConverter {
    /// Decode every cell of a row.
    pub fn convert_row(row: &MySqlRow) -> Vec<Value> {
        row.columns()
            .iter()
            .enumerate()
            .map(|(index, column)| Self::extract_value(row, index, column.type_info().name()))
            .collect()
    }

    /// Decode and render every cell of a row.
    pub fn render_row(row: &MySqlRow, null_text: &str) -> Vec<String> {
        Self::convert_row(row)
            .iter()
            .map(|value| value.render(null_text))
            .collect()
    }

    fn extract_value(row: &MySqlRow, index: usize, type_name: &str) -> Value {
        match row.try_get_raw(index) {
            Ok(raw) if raw.is_null() => return Value::Null,
            Err(_) => return Value::Null,
            _ => {}
        }

        Self::decode_by_type(row, index, type_name)
    }

    /// Decode a value based on its MySQL type name.
    fn decode_by_type(row: &MySqlRow, index: usize, type_name: &str) -> Value {
        let decoded = match type_name {
            // TINYINT(1) is reported as BOOLEAN
            "BOOLEAN" | "BOOL" => row.try_get::<bool, _>(index).map(Value::Bool),

            "TINYINT" => row.try_get::<i8, _>(index).map(|v| Value::Int(v.into())),
            "SMALLINT" => row.try_get::<i16, _>(index).map(|v| Value::Int(v.into())),
            "MEDIUMINT" | "INT" | "INTEGER" => {
                row.try_get::<i32, _>(index).map(|v| Value::Int(v.into()))
            }
            "BIGINT" => row.try_get::<i64, _>(index).map(Value::Int),

            "TINYINT UNSIGNED" => row.try_get::<u8, _>(index).map(|v| Value::UInt(v.into())),
            "SMALLINT UNSIGNED" => row.try_get::<u16, _>(index).map(|v| Value::UInt(v.into())),
            "MEDIUMINT UNSIGNED" | "INT UNSIGNED" | "INTEGER UNSIGNED" => {
                row.try_get::<u32, _>(index).map(|v| Value::UInt(v.into()))
            }
            "BIGINT UNSIGNED" => row.try_get::<u64, _>(index).map(Value::UInt),

            "FLOAT" => row.try_get::<f32, _>(index).map(|v| Value::Float(v.into())),
            "DOUBLE" | "DOUBLE PRECISION" | "REAL" => {
                row.try_get::<f64, _>(index).map(Value::Float)
            }

            "DECIMAL" | "NUMERIC" | "DEC" | "FIXED" => {
                row.try_get::<Decimal, _>(index).map(Value::Decimal)
            }

            "CHAR" | "VARCHAR" | "TINYTEXT" | "TEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM"
            | "SET" => row.try_get::<String, _>(index).map(Value::Text),

            "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => {
                row.try_get::<Vec<u8>, _>(index).map(Value::Bytes)
            }

            "DATE" => row.try_get::<NaiveDate, _>(index).map(Value::Date),
            "TIME" => row.try_get::<NaiveTime, _>(index).map(Value::Time),
            "DATETIME" => row.try_get::<NaiveDateTime, _>(index).map(Value::DateTime),
            "TIMESTAMP" => row
                .try_get::<DateTime<Utc>, _>(index)
                .map(Value::DateTimeTz)
                .or_else(|_| row.try_get::<NaiveDateTime, _>(index).map(Value::DateTime)),
            "YEAR" => row.try_get::<u16, _>(index).map(|v| Value::UInt(v.into())),

            "JSON" => row.try_get::<serde_json::Value, _>(index).map(Value::Json),

            _ => return Self::decode_as_string_fallback(row, index, type_name),
        };

        decoded.unwrap_or_else(|_| Self::decode_as_string_fallback(row, index, type_name))
    }

    /// Fallback for unknown types: string, then integer, then float.
    fn decode_as_string_fallback(row: &MySqlRow, index: usize, type_name: &str) -> Value {
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

    /// Map the generic SSL mode onto SQLx's MySQL mode.
    pub fn map_ssl_mode(mode: SslMode) -> MySqlSslMode {
        match mode {
            SslMode::Disable => MySqlSslMode::Disabled,
            SslMode::Prefer => MySqlSslMode::Preferred,
            SslMode::Require => MySqlSslMode::Required,
            SslMode::VerifyCa => MySqlSslMode::VerifyCa,
            SslMode::VerifyFull => MySqlSslMode::VerifyIdentity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssl_mode_mapping() {
        assert!(matches!(
            MySqlValueConverter::map_ssl_mode(SslMode::Disable),
            MySqlSslMode::Disabled
        ));
        assert!(matches!(
            MySqlValueConverter::map_ssl_mode(SslMode::Require),
            MySqlSslMode::Required
        ));
        assert!(matches!(
            MySqlValueConverter::map_ssl_mode(SslMode::VerifyFull),
            MySqlSslMode::VerifyIdentity
        ));
    }
}
