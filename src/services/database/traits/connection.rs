//! Connection lifecycle trait.
//!
//! `DatabaseConnection` covers opening, closing and probing the single
//! connection a direct backend owns. The data operations live on
//! [`Database`](super::Database).

use anyhow::Result;
use async_trait::async_trait;

use super::database::Database;
use super::types::{ConnectionConfig, ConnectionParams, DatabaseType};

/// Lifecycle of a direct backend's connection.
#[async_trait]
pub trait DatabaseConnection: Send + Sync {
    /// Get the database type for this connection
    fn database_type(&self) -> DatabaseType;

    /// Get the connection configuration
    fn connection_config(&self) -> &ConnectionConfig;

    /// Establish the connection.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::ConnectionFailed` if the engine cannot be
    /// reached or rejects the credentials, and `InvalidConfig` if the
    /// parameters do not fit the engine.
    async fn connect(&mut self) -> Result<()>;

    /// Close the connection and release it.
    async fn disconnect(&mut self) -> Result<()>;

    /// Check if the connection is currently alive.
    ///
    /// Performs a lightweight `SELECT 1`.
    async fn is_connected(&self) -> bool;

    /// Open a throwaway connection, run `SELECT 1` and close it.
    async fn test_connection(config: &ConnectionConfig) -> Result<()>
    where
        Self: Sized;

    /// Human-readable connection label, "user@host:port/database" or a file path.
    fn display_name(&self) -> String {
        let config = self.connection_config();
        match &config.params {
            ConnectionParams::Server {
                hostname,
                port,
                username,
                database,
                ..
            } => {
                format!("{}@{}:{}/{}", username, hostname, port, database)
            }
            ConnectionParams::File { path, .. } => path.display().to_string(),
            ConnectionParams::InMemory => ":memory:".to_string(),
        }
    }
}

/// A direct backend: lifecycle plus data operations.
pub trait Backend: DatabaseConnection + Database {}

impl<T: DatabaseConnection + Database> Backend for T {}

/// A boxed direct backend.
pub type BoxedBackend = Box<dyn Backend>;
