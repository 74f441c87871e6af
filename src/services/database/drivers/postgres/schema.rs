//! PostgreSQL schema introspection over `information_schema`.
//!
//! Only base tables of the `public` schema are listed. Each table costs two
//! queries: one for its columns and one for its primary key.

use anyhow::Result;
use sqlx::{PgPool, Row};
use std::collections::HashSet;
use tracing::debug;

use super::connection::PostgresConnection;
use crate::services::database::DatabaseError;
use crate::services::database::traits::{Column, TableSchema};

const USER_TABLES_QUERY: &str = r#"
    SELECT table_name::text AS table_name
    FROM information_schema.tables
    WHERE table_schema = 'public'
        AND table_type = 'BASE TABLE'
    ORDER BY table_name
"#;

const COLUMNS_QUERY: &str = r#"
    SELECT
        column_name::text AS column_name,
        data_type::text AS data_type,
        is_nullable::text AS is_nullable
    FROM information_schema.columns
    WHERE table_schema = 'public'
        AND table_name = $1
    ORDER BY ordinal_position
"#;

const PRIMARY_KEY_QUERY: &str = r#"
    SELECT kcu.column_name::text AS column_name
    FROM information_schema.table_constraints tc
    JOIN information_schema.key_column_usage kcu
        ON tc.constraint_name = kcu.constraint_name
        AND tc.table_schema = kcu.table_schema
        AND tc.table_name = kcu.table_name
    WHERE tc.constraint_type = 'PRIMARY KEY'
        AND tc.table_schema = 'public'
        AND tc.table_name = $1
"#;

impl PostgresConnection {
    pub(crate) async fn introspect_tables(&self) -> Result<Vec<TableSchema>> {
        let pool = self.get_pool().await?;

        let names: Vec<String> = sqlx::query_scalar(USER_TABLES_QUERY)
            .fetch_all(&pool)
            .await
            .map_err(DatabaseError::query)?;
        debug!(tables = names.len(), "postgres introspection");

        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let columns = Self::introspect_columns(&pool, &name).await?;
            tables.push(TableSchema::new(name, columns));
        }

        Ok(tables)
    }

    async fn introspect_columns(pool: &PgPool, table: &str) -> Result<Vec<Column>> {
        let primary_key: HashSet<String> = sqlx::query_scalar(PRIMARY_KEY_QUERY)
            .bind(table)
            .fetch_all(pool)
            .await
            .map_err(DatabaseError::query)?
            .into_iter()
            .collect();

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
                let is_key = primary_key.contains(&name);

                Ok(Column::new(name, data_type)
                    .with_nullable(is_nullable == "YES")
                    .with_primary_key(is_key))
            })
            .collect()
    }
}
