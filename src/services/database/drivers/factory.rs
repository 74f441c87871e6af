//! Connection factory for creating direct backends.
//!
//! The factory picks the backend matching the configuration's database type.

use anyhow::Result;
use tracing::debug;

use super::mysql::MySqlConnection;
use super::postgres::PostgresConnection;
use super::sqlite::SqliteConnection;
use crate::services::database::traits::{BoxedBackend, ConnectionConfig, DatabaseType};

/// Factory for creating backends based on configuration.
///
/// # Example
///
/// ```ignore
/// use aleto::services::database::drivers::ConnectionFactory;
/// use aleto::services::database::traits::ConnectionConfig;
///
/// let db = ConnectionFactory::open(ConnectionConfig::sqlite("app.db")).await?;
/// let tables = db.get_tables().await?;
/// ```
pub struct ConnectionFactory;

impl ConnectionFactory {
    /// Create a backend for the configuration without connecting.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidConfig` if the parameters do not fit
    /// the database type.
    pub fn create(config: ConnectionConfig) -> Result<BoxedBackend> {
        config.validate()?;

        debug!(database_type = %config.database_type, name = %config.name, "creating backend");
        Ok(match config.database_type {
            DatabaseType::PostgreSQL => PostgresConnection::boxed(config),
            DatabaseType::MySQL => MySqlConnection::boxed(config),
            DatabaseType::SQLite => SqliteConnection::boxed(config),
        })
    }

    /// Create a backend and connect it.
    pub async fn open(config: ConnectionConfig) -> Result<BoxedBackend> {
        let mut backend = Self::create(config)?;
        backend.connect().await?;
        Ok(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::database::DatabaseError;
    use crate::services::database::traits::ConnectionParams;

    #[test]
    fn test_factory_validates_config() {
        let config = ConnectionConfig::new(
            "test".to_string(),
            DatabaseType::PostgreSQL,
            ConnectionParams::file(std::path::PathBuf::from("/tmp/test.db"), false),
        );

        let err = ConnectionFactory::create(config).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<DatabaseError>(),
            Some(DatabaseError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_factory_picks_backend() {
        let config = ConnectionConfig::new(
            "test".to_string(),
            DatabaseType::MySQL,
            ConnectionParams::server(
                "localhost".to_string(),
                3306,
                "root".to_string(),
                "password".to_string(),
                "app".to_string(),
            ),
        );
        let backend = ConnectionFactory::create(config).unwrap();
        assert_eq!(backend.database_type(), DatabaseType::MySQL);

        let backend = ConnectionFactory::create(ConnectionConfig::sqlite("/tmp/x.db")).unwrap();
        assert_eq!(backend.database_type(), DatabaseType::SQLite);
    }

    #[test]
    fn test_open_sqlite() {
        smol::block_on(async {
            let dir = tempfile::TempDir::new().unwrap();
            let backend = ConnectionFactory::open(ConnectionConfig::sqlite(dir.path().join("f.db")))
                .await
                .unwrap();
            assert!(backend.is_connected().await);
            assert!(backend.get_tables().await.unwrap().is_empty());
        });
    }
}
