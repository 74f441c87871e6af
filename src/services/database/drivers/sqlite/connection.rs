//! SQLite connection implementation.
//!
//! This module implements `DatabaseConnection` and `Database` for SQLite
//! using a single-connection SQLx pool.

use anyhow::Result;
use async_lock::RwLock;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use super::types::SqliteValueConverter;
use crate::services::database::DatabaseError;
use crate::services::database::sql::Dialect;
use crate::services::database::traits::{
    Assignment, BoxedBackend, Column, ConnectionConfig, ConnectionParams, Database,
    DatabaseConnection, DatabaseType, TableData, TableSchema,
};

const DIALECT: Dialect = Dialect::Sqlite;

/// SQLite database connection.
///
/// Holds at most one open connection, exclusive to this instance. An
/// in-memory database lives exactly as long as that connection.
pub struct SqliteConnection {
    config: ConnectionConfig,
    pool: RwLock<Option<SqlitePool>>,
}

impl std::fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("config", &self.config)
            .field("pool", &"<SqlitePool>")
            .finish()
    }
}

impl SqliteConnection {
    /// Create a new SQLite connection from configuration.
    ///
    /// This does not connect immediately - call `connect()` or use `open()`.
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            pool: RwLock::new(None),
        }
    }

    /// Create and connect.
    pub async fn open(config: ConnectionConfig) -> Result<Self> {
        let mut connection = Self::new(config);
        connection.connect().await?;
        Ok(connection)
    }

    /// Create a boxed backend (for factory use).
    pub fn boxed(config: ConnectionConfig) -> BoxedBackend {
        Box::new(Self::new(config))
    }

    fn build_connect_options(params: &ConnectionParams) -> Result<SqliteConnectOptions> {
        match params {
            ConnectionParams::File { path, read_only } => {
                let mut options = SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(!read_only)
                    .foreign_keys(true);

                if *read_only {
                    options = options.read_only(true);
                } else {
                    options = options.journal_mode(SqliteJournalMode::Wal);
                }

                Ok(options)
            }
            ConnectionParams::InMemory => Ok(SqliteConnectOptions::from_str(":memory:")
                .map_err(DatabaseError::connection)?
                .foreign_keys(true)),
            ConnectionParams::Server { .. } => Err(DatabaseError::InvalidConfig(
                "SQLite does not support server-based connections. Use File or InMemory params."
                    .to_string(),
            )
            .into()),
        }
    }

    fn pool_options() -> SqlitePoolOptions {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .acquire_timeout(Duration::from_secs(5))
    }

    /// The open pool, or `NotConnected`.
    pub(crate) async fn get_pool(&self) -> Result<SqlitePool> {
        let guard = self.pool.read().await;
        guard
            .as_ref()
            .cloned()
            .ok_or_else(|| DatabaseError::NotConnected.into())
    }

    async fn run(&self, sql: &str) -> Result<()> {
        let pool = self.get_pool().await?;
        debug!(%sql, "sqlite execute");
        sqlx::raw_sql(sql)
            .execute(&pool)
            .await
            .map_err(DatabaseError::query)?;
        Ok(())
    }

    async fn fetch_rendered(&self, sql: &str) -> Result<Vec<Vec<String>>> {
        let pool = self.get_pool().await?;
        debug!(%sql, "sqlite fetch");
        let rows = sqlx::query(sql)
            .fetch_all(&pool)
            .await
            .map_err(DatabaseError::query)?;

        let null_text = DatabaseType::SQLite.null_text();
        Ok(rows
            .iter()
            .map(|row| SqliteValueConverter::render_row(row, null_text))
            .collect())
    }
}

#[async_trait]
impl DatabaseConnection for SqliteConnection {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::SQLite
    }

    fn connection_config(&self) -> &ConnectionConfig {
        &self.config
    }

    async fn connect(&mut self) -> Result<()> {
        let options = Self::build_connect_options(&self.config.params)?;

        let pool = Self::pool_options()
            .connect_with(options)
            .await
            .map_err(DatabaseError::connection)?;
        info!(database = %self.display_name(), "sqlite connected");

        let mut guard = self.pool.write().await;
        if let Some(previous) = guard.replace(pool) {
            previous.close().await;
        }

        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        let mut guard = self.pool.write().await;
        match guard.take() {
            Some(pool) => {
                pool.close().await;
                Ok(())
            }
            None => Err(DatabaseError::NotConnected.into()),
        }
    }

    async fn is_connected(&self) -> bool {
        let guard = self.pool.read().await;
        if let Some(pool) = guard.as_ref() {
            sqlx::query("SELECT 1").fetch_one(pool).await.is_ok()
        } else {
            false
        }
    }

    async fn test_connection(config: &ConnectionConfig) -> Result<()> {
        let options = Self::build_connect_options(&config.params)?;

        let pool = Self::pool_options()
            .connect_with(options)
            .await
            .map_err(DatabaseError::connection)?;
        sqlx::query("SELECT 1")
            .fetch_one(&pool)
            .await
            .map_err(DatabaseError::connection)?;
        pool.close().await;

        Ok(())
    }
}

#[async_trait]
impl Database for SqliteConnection {
    async fn execute_query(&self, sql: &str) -> Result<()> {
        self.run(sql).await
    }

    async fn get_tables(&self) -> Result<Vec<TableSchema>> {
        self.introspect_tables().await
    }

    async fn select(&self, table: &str, offset: usize, limit: usize) -> Result<TableData> {
        let sql = DIALECT.select_page(table, offset, limit)?;
        let schema = self.table_schema(table).await?;
        let rows = self.fetch_rendered(&sql).await?;
        Ok(TableData::new(schema, rows, offset / limit))
    }

    async fn edit_row(
        &self,
        table: &str,
        filter: Assignment<'_>,
        values: &[Assignment<'_>],
    ) -> Result<()> {
        let sql = DIALECT.update(table, filter, values)?;
        self.run(&sql).await
    }

    async fn add_row(&self, table: &str, values: &[Assignment<'_>]) -> Result<()> {
        self.run(&DIALECT.insert(table, values)).await
    }

    async fn remove_row(&self, table: &str, filter: Assignment<'_>) -> Result<()> {
        self.run(&DIALECT.delete(table, filter)).await
    }

    async fn search(
        &self,
        table: &str,
        column: &str,
        pattern: &str,
        limit: usize,
    ) -> Result<TableData> {
        let sql = DIALECT.search(table, column, pattern, limit)?;
        let schema = self.table_schema(table).await?;
        let rows = self.fetch_rendered(&sql).await?;
        Ok(TableData::new(schema, rows, 0))
    }

    async fn create_table(&self, schema: &TableSchema) -> Result<()> {
        let sql = DIALECT.create_table(schema)?;
        self.run(&sql).await
    }

    async fn drop_table(&self, table: &str) -> Result<()> {
        self.run(&DIALECT.drop_table(table)).await
    }

    async fn add_column(&self, table: &str, column: &Column) -> Result<()> {
        self.run(&DIALECT.add_column(table, column)).await
    }

    async fn drop_column(&self, table: &str, column: &str) -> Result<()> {
        self.run(&DIALECT.drop_column(table, column)).await
    }
}
