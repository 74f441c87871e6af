//! MySQL connection implementation.
//!
//! This module implements `DatabaseConnection` and `Database` for
//! MySQL using a single-connection SQLx pool.

use anyhow::Result;
use async_lock::RwLock;
use async_trait::async_trait;
use sqlx::MySqlPool;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use std::time::Duration;
use tracing::{debug, info};

use super::types::MySqlValueConverter;
use crate::services::database::DatabaseError;
use crate::services::database::sql::Dialect;
use crate::services::database::traits::{
    Assignment, BoxedBackend, Column, ConnectionConfig, ConnectionParams, Database,
    DatabaseConnection, DatabaseType, TableData, TableSchema,
};

const DIALECT: Dialect = Dialect::MySql;

/// MySQL database connection.
///
/// Holds at most one open connection, exclusive to this instance.
pub struct MySqlConnection {
    config: ConnectionConfig,
    pool: RwLock<Option<MySqlPool>>,
}

impl std::fmt::Debug for MySqlConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlConnection")
            .field("config", &self.config)
            .field("pool", &"<MySqlPool>")
            .finish()
    }
}

impl MySqlConnection {
    /// Create a new MySQL connection from configuration.
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

    fn build_connect_options(params: &ConnectionParams) -> Result<MySqlConnectOptions> {
        match params {
            ConnectionParams::Server {
                hostname,
                port,
                username,
                password,
                database,
                ssl_mode,
            } => Ok(MySqlConnectOptions::new()
                .host(hostname)
                .port(*port)
                .username(username)
                .password(password)
                .database(database)
                .ssl_mode(MySqlValueConverter::map_ssl_mode(*ssl_mode))),
            ConnectionParams::File { .. } | ConnectionParams::InMemory => {
                Err(DatabaseError::InvalidConfig(
                    "MySQL does not support file-based or in-memory connections".to_string(),
                )
                .into())
            }
        }
    }

    fn pool_options() -> MySqlPoolOptions {
        MySqlPoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .acquire_timeout(Duration::from_secs(10))
    }

    /// The open pool, or `NotConnected`.
    pub(crate) async fn get_pool(&self) -> Result<MySqlPool> {
        let guard = self.pool.read().await;
        guard
            .as_ref()
            .cloned()
            .ok_or_else(|| DatabaseError::NotConnected.into())
    }

    async fn run(&self, sql: &str) -> Result<()> {
        let pool = self.get_pool().await?;
        debug!(%sql, "mysql execute");
        sqlx::raw_sql(sql)
            .execute(&pool)
            .await
            .map_err(DatabaseError::query)?;
        Ok(())
    }

    async fn fetch_rendered(&self, sql: &str) -> Result<Vec<Vec<String>>> {
        let pool = self.get_pool().await?;
        debug!(%sql, "mysql fetch");
        let rows = sqlx::query(sql)
            .fetch_all(&pool)
            .await
            .map_err(DatabaseError::query)?;

        let null_text = DatabaseType::MySQL.null_text();
        Ok(rows
            .iter()
            .map(|row| MySqlValueConverter::render_row(row, null_text))
            .collect())
    }
}

#[async_trait]
impl DatabaseConnection for MySqlConnection {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::MySQL
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
        info!(database = %self.display_name(), "mysql connected");

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

        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(5))
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
impl Database for MySqlConnection {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> ConnectionConfig {
        ConnectionConfig::new(
            "test".to_string(),
            DatabaseType::MySQL,
            ConnectionParams::server(
                "db.internal".to_string(),
                3306,
                "root".to_string(),
                "secret".to_string(),
                "shop".to_string(),
            ),
        )
    }

    #[test]
    fn test_mysql_connection_new() {
        let conn = MySqlConnection::new(create_test_config());

        assert_eq!(conn.database_type(), DatabaseType::MySQL);
        assert_eq!(conn.display_name(), "root@db.internal:3306/shop");
    }

    #[test]
    fn test_in_memory_params_rejected() {
        let err = MySqlConnection::build_connect_options(&ConnectionParams::in_memory())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DatabaseError>(),
            Some(DatabaseError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_edit_row_without_values_rejected() {
        smol::block_on(async {
            let conn = MySqlConnection::new(create_test_config());
            let err = conn.edit_row("users", ("id", "1"), &[]).await.unwrap_err();
            assert!(matches!(
                err.downcast_ref::<DatabaseError>(),
                Some(DatabaseError::InvalidArgument(_))
            ));
        });
    }
}
