//! MySQL schema introspection over `information_schema` of the current database.

use anyhow::Result;
use sqlx::{MySqlPool, Row};
use tracing::debug;

use super::connection::MySqlConnection;
use crate::services::database::DatabaseError;
use crate::services::database::traits::{Column, TableSchema};

const USER_TABLES_QUERY: &str = r#"
    SELECT CAST(TABLE_NAME AS CHAR) AS table_name
    FROM information_schema.TABLES
    WHERE TABLE_SCHEMA = DATABASE()
        AND TABLE_TYPE = 'BASE TABLE'
    ORDER BY TABLE_NAME
"#;

const COLUMNS_QUERY: &str = r#"
    SELECT
        CAST(COLUMN_NAME AS CHAR) AS column_name,
        CAST(DATA_TYPE AS CHAR) AS data_type,
        CAST(IS_NULLABLE AS CHAR) AS is_nullable,
        CAST(COLUMN_KEY AS CHAR) AS column_key
    FROM information_schema.COLUMNS
    WHERE TABLE_SCHEMA = DATABASE()
        AND TABLE_NAME = ?
    ORDER BY ORDINAL_POSITION
"#;

impl MySqlConnection {
    pub(crate) async fn introspect_tables(&self) -> Result<Vec<TableSchema>> {
        let pool = self.get_pool().await?;

        let names: Vec<String> = sqlx::query_scalar(USER_TABLES_QUERY)
            .fetch_all(&pool)
            .await
            .map_err(DatabaseError::query)?;
        debug!(tables = names.len(), "mysql introspection");

        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let columns = Self::introspect_columns(&pool, &name).await?;
            tables.push(TableSchema::new(name, columns));
        }

        Ok(tables)
    }

    async fn introspect_columns(pool: &MySqlPool, table: &str) -> Result<Vec<Column>> {
        let rows = sqlx::query(COLUMNS_QUERY)
            .bind(table)
            .fetch_all(pool)
            .await
            .map_err(DatabaseError::query)?;

        rows.iter()
            .map(|row| -> Result<Column> {
                let name: String = row.try_get("column_name")?;
                let data_type: String = row.try_get("data_type")?;
                let is_nullable: String = row.try_get("is_nullable")?;
                let column_key: String = row.try_get("column_key")?;

                Ok(Column::new(name, data_type)
                    .with_nullable(is_nullable == "YES")
                    .with_primary_key(column_key == "PRI"))
            })
            .collect()
    }
}
