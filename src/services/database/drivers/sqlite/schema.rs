//! SQLite schema introspection via `sqlite_master` and `PRAGMA table_info`.

use anyhow::Result;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use super::connection::SqliteConnection;
use crate::services::database::DatabaseError;
use crate::services::database::sql::Dialect;
use crate::services::database::traits::{Column, TableSchema};

const USER_TABLES_QUERY: &str = r#"
    SELECT name
    FROM sqlite_master
    WHERE type = 'table'
        AND name NOT LIKE 'sqlite_%'
    ORDER BY name
"#;

impl SqliteConnection {
    pub(crate) async fn introspect_tables(&self) -> Result<Vec<TableSchema>> {
        let pool = self.get_pool().await?;

        let names: Vec<String> = sqlx::query_scalar(USER_TABLES_QUERY)
            .fetch_all(&pool)
            .await
            .map_err(DatabaseError::query)?;
        debug!(tables = names.len(), "sqlite introspection");

        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let columns = Self::introspect_columns(&pool, &name).await?;
            tables.push(TableSchema::new(name, columns));
        }

        Ok(tables)
    }

    async fn introspect_columns(pool: &SqlitePool, table: &str) -> Result<Vec<Column>> {
        let query = format!("PRAGMA table_info({})", Dialect::Sqlite.quote_literal(table));
        let rows = sqlx::query(&query)
            .fetch_all(pool)
            .await
            .map_err(DatabaseError::query)?;

        rows.iter()
            .map(|row| -> Result<Column> {
                let name: String = row.try_get("name")?;
                let data_type: String = row.try_get("type")?;
                let not_null: i64 = row.try_get("notnull")?;
                // pk is the 1-based position within the key, 0 otherwise
                let pk: i64 = row.try_get("pk")?;

                Ok(Column::new(name, data_type)
                    .with_nullable(not_null == 0)
                    .with_primary_key(pk > 0))
            })
            .collect()
    }
}
