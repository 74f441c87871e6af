//! Database type definitions and connection configuration.
//!
//! This module contains:
//! - `DatabaseType` - Enum of supported database engines
//! - `ConnectionConfig` - Unified connection configuration
//! - `ConnectionParams` - Server, file or in-memory connection parameters
//!
//! A `ConnectionConfig` also has a flat string form, the parameter set the
//! `aleto-driver` executable receives as `--key=value` tokens.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use uuid::Uuid;

use crate::services::database::DatabaseError;

/// Flat key/value form of a connection, as passed to the driver.
pub type DriverParams = BTreeMap<String, String>;

/// Driver parameter naming the engine.
pub const PARAM_DB: &str = "db";
pub const PARAM_PATH: &str = "path";
pub const PARAM_READ_ONLY: &str = "read_only";
pub const PARAM_HOST: &str = "host";
pub const PARAM_PORT: &str = "port";
pub const PARAM_USER: &str = "user";
pub const PARAM_PASSWORD: &str = "password";
pub const PARAM_DATABASE: &str = "database";
pub const PARAM_SSL_MODE: &str = "ssl_mode";

/// Every parameter key that describes the connection rather than row data.
pub const CONNECTION_PARAM_KEYS: &[&str] = &[
    PARAM_DB,
    PARAM_PATH,
    PARAM_READ_ONLY,
    PARAM_HOST,
    PARAM_PORT,
    PARAM_USER,
    PARAM_PASSWORD,
    PARAM_DATABASE,
    PARAM_SSL_MODE,
];

const IN_MEMORY_PATH: &str = ":memory:";

/// Supported database types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    #[default]
    PostgreSQL,
    MySQL,
    SQLite,
}

impl DatabaseType {
    /// Get the display name for this database type
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::PostgreSQL => "PostgreSQL",
            Self::MySQL => "MySQL",
            Self::SQLite => "SQLite",
        }
    }

    /// Get the default port for server-based databases
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Self::PostgreSQL => Some(5432),
            Self::MySQL => Some(3306),
            Self::SQLite => None,
        }
    }

    pub fn is_file_based(&self) -> bool {
        matches!(self, Self::SQLite)
    }

    /// Text a NULL cell renders as in `TableData`.
    ///
    /// SQLite shows an empty cell, the server engines show `NULL`.
    pub fn null_text(&self) -> &'static str {
        match self {
            Self::SQLite => "",
            Self::PostgreSQL | Self::MySQL => "NULL",
        }
    }

    /// Get all available database types
    pub fn all() -> Vec<DatabaseType> {
        vec![Self::PostgreSQL, Self::MySQL, Self::SQLite]
    }

    /// Parse from a string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "postgresql" | "postgres" | "pg" => Some(Self::PostgreSQL),
            "mysql" | "mariadb" => Some(Self::MySQL),
            "sqlite" | "sqlite3" => Some(Self::SQLite),
            _ => None,
        }
    }

    /// Name used for the `db` driver parameter
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Self::PostgreSQL => "postgresql",
            Self::MySQL => "mysql",
            Self::SQLite => "sqlite",
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// SSL mode options (generic across databases)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SslMode {
    /// No SSL connection
    Disable,
    /// Try SSL first, fall back to non-SSL
    #[default]
    Prefer,
    /// Require SSL, don't verify certificates
    Require,
    /// Require SSL and verify server certificate
    VerifyCa,
    /// Require SSL, verify certificate and hostname
    VerifyFull,
}

impl SslMode {
    /// Parse from a database string
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "disable" => Self::Disable,
            "prefer" => Self::Prefer,
            "require" => Self::Require,
            "verify-ca" => Self::VerifyCa,
            "verify-full" => Self::VerifyFull,
            _ => Self::Prefer,
        }
    }

    /// Convert to a database string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Self::Disable => "disable",
            Self::Prefer => "prefer",
            Self::Require => "require",
            Self::VerifyCa => "verify-ca",
            Self::VerifyFull => "verify-full",
        }
    }
}

/// Unified connection configuration for all database types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Unique identifier for this connection
    pub id: Uuid,
    /// User-friendly name for this connection
    pub name: String,
    /// The type of database
    pub database_type: DatabaseType,
    /// Connection parameters (varies by database type)
    pub params: ConnectionParams,
}

impl ConnectionConfig {
    /// Create a new connection configuration
    pub fn new(name: String, database_type: DatabaseType, params: ConnectionParams) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            database_type,
            params,
        }
    }

    /// Shorthand for a SQLite database file.
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::new(
            path.display().to_string(),
            DatabaseType::SQLite,
            ConnectionParams::file(path, false),
        )
    }

    /// Validate that the params match the database type
    pub fn validate(&self) -> Result<(), DatabaseError> {
        match (&self.database_type, &self.params) {
            (DatabaseType::SQLite, ConnectionParams::Server { .. }) => {
                Err(DatabaseError::InvalidConfig(format!(
                    "{} requires file or in-memory connection parameters",
                    self.database_type.display_name()
                )))
            }
            (
                DatabaseType::PostgreSQL | DatabaseType::MySQL,
                ConnectionParams::File { .. } | ConnectionParams::InMemory,
            ) => Err(DatabaseError::InvalidConfig(format!(
                "{} requires server connection parameters",
                self.database_type.display_name()
            ))),
            _ => Ok(()),
        }
    }

    /// Flatten into the driver's parameter set.
    pub fn driver_params(&self) -> DriverParams {
        let mut params = DriverParams::new();
        params.insert(PARAM_DB.into(), self.database_type.to_db_str().into());

        match &self.params {
            ConnectionParams::File { path, read_only } => {
                params.insert(PARAM_PATH.into(), path.display().to_string());
                if *read_only {
                    params.insert(PARAM_READ_ONLY.into(), "true".into());
                }
            }
            ConnectionParams::InMemory => {
                params.insert(PARAM_PATH.into(), IN_MEMORY_PATH.into());
            }
            ConnectionParams::Server {
                hostname,
                port,
                username,
                password,
                database,
                ssl_mode,
            } => {
                params.insert(PARAM_HOST.into(), hostname.clone());
                params.insert(PARAM_PORT.into(), port.to_string());
                params.insert(PARAM_USER.into(), username.clone());
                params.insert(PARAM_PASSWORD.into(), password.clone());
                params.insert(PARAM_DATABASE.into(), database.clone());
                params.insert(PARAM_SSL_MODE.into(), ssl_mode.to_db_str().into());
            }
        }

        params
    }

    /// Rebuild a configuration from driver parameters.
    ///
    /// Keys that are not connection keys are ignored.
    pub fn from_driver_params(params: &DriverParams) -> Result<Self, DatabaseError> {
        let required = |key: &str| {
            params
                .get(key)
                .cloned()
                .ok_or_else(|| DatabaseError::InvalidConfig(format!("missing `{}` parameter", key)))
        };

        let db = required(PARAM_DB)?;
        let database_type = DatabaseType::from_str(&db)
            .ok_or_else(|| DatabaseError::InvalidConfig(format!("unsupported database `{}`", db)))?;

        let connection_params = match database_type {
            DatabaseType::SQLite => {
                let path = required(PARAM_PATH)?;
                if path == IN_MEMORY_PATH {
                    ConnectionParams::InMemory
                } else {
                    let read_only = params
                        .get(PARAM_READ_ONLY)
                        .is_some_and(|v| v == "true" || v == "1");
                    ConnectionParams::file(PathBuf::from(path), read_only)
                }
            }
            DatabaseType::PostgreSQL | DatabaseType::MySQL => {
                let port = match params.get(PARAM_PORT) {
                    Some(port) => port.parse::<u16>().map_err(|_| {
                        DatabaseError::InvalidConfig(format!("invalid port `{}`", port))
                    })?,
                    None => database_type.default_port().unwrap_or_default(),
                };
                ConnectionParams::Server {
                    hostname: required(PARAM_HOST)?,
                    port,
                    username: required(PARAM_USER)?,
                    password: params.get(PARAM_PASSWORD).cloned().unwrap_or_default(),
                    database: required(PARAM_DATABASE)?,
                    ssl_mode: params
                        .get(PARAM_SSL_MODE)
                        .map(|s| SslMode::from_db_str(s))
                        .unwrap_or_default(),
                }
            }
        };

        let config = Self::new(db, database_type, connection_params);
        config.validate()?;
        Ok(config)
    }
}

/// Connection parameters for different database types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConnectionParams {
    /// Server-based databases (PostgreSQL, MySQL)
    Server {
        /// Server hostname or IP address
        hostname: String,
        /// Server port
        port: u16,
        /// Username for authentication
        username: String,
        /// Password for authentication
        #[serde(default)]
        password: String,
        /// Database to connect to
        database: String,
        /// SSL mode for the connection
        #[serde(default)]
        ssl_mode: SslMode,
    },

    /// File-based databases (SQLite)
    File {
        /// Path to the database file
        path: PathBuf,
        /// Open in read-only mode
        #[serde(default)]
        read_only: bool,
    },

    /// In-memory databases
    InMemory,
}

impl ConnectionParams {
    /// Create new server connection parameters
    pub fn server(
        hostname: String,
        port: u16,
        username: String,
        password: String,
        database: String,
    ) -> Self {
        Self::Server {
            hostname,
            port,
            username,
            password,
            database,
            ssl_mode: SslMode::default(),
        }
    }

    /// Create new file connection parameters
    pub fn file(path: PathBuf, read_only: bool) -> Self {
        Self::File { path, read_only }
    }

    /// Create new in-memory connection parameters
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    /// Check if this is a read-only connection
    pub fn is_read_only(&self) -> bool {
        match self {
            Self::File { read_only, .. } => *read_only,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn postgres_config() -> ConnectionConfig {
        ConnectionConfig::new(
            "test".to_string(),
            DatabaseType::PostgreSQL,
            ConnectionParams::server(
                "localhost".to_string(),
                5432,
                "user".to_string(),
                "pass".to_string(),
                "db".to_string(),
            ),
        )
    }

    #[test]
    fn test_database_type_default_ports() {
        assert_eq!(DatabaseType::PostgreSQL.default_port(), Some(5432));
        assert_eq!(DatabaseType::MySQL.default_port(), Some(3306));
        assert_eq!(DatabaseType::SQLite.default_port(), None);
    }

    #[test]
    fn test_database_type_names_parse_back() {
        for database_type in DatabaseType::all() {
            assert_eq!(
                DatabaseType::from_str(database_type.to_db_str()),
                Some(database_type)
            );
        }
        assert_eq!(DatabaseType::from_str("oracle"), None);
    }

    #[test]
    fn test_null_text_per_engine() {
        assert_eq!(DatabaseType::SQLite.null_text(), "");
        assert_eq!(DatabaseType::PostgreSQL.null_text(), "NULL");
        assert_eq!(DatabaseType::MySQL.null_text(), "NULL");
    }

    #[test]
    fn test_connection_config_validation() {
        assert!(postgres_config().validate().is_ok());

        let config = ConnectionConfig::new(
            "test".to_string(),
            DatabaseType::PostgreSQL,
            ConnectionParams::file(PathBuf::from("/tmp/test.db"), false),
        );
        assert!(matches!(
            config.validate(),
            Err(DatabaseError::InvalidConfig(_))
        ));

        assert!(ConnectionConfig::sqlite("/tmp/test.db").validate().is_ok());

        let config = ConnectionConfig::new(
            "test".to_string(),
            DatabaseType::SQLite,
            postgres_config().params,
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sqlite_driver_params() {
        let params = ConnectionConfig::sqlite("/tmp/app.db").driver_params();
        assert_eq!(params.len(), 2);
        assert_eq!(params["db"], "sqlite");
        assert_eq!(params["path"], "/tmp/app.db");

        let config = ConnectionConfig::from_driver_params(&params).unwrap();
        assert_eq!(config.database_type, DatabaseType::SQLite);
        assert_eq!(
            config.params,
            ConnectionParams::file(PathBuf::from("/tmp/app.db"), false)
        );
    }

    #[test]
    fn test_in_memory_driver_params() {
        let config = ConnectionConfig::new(
            "mem".to_string(),
            DatabaseType::SQLite,
            ConnectionParams::in_memory(),
        );
        let params = config.driver_params();
        assert_eq!(params["path"], ":memory:");

        let rebuilt = ConnectionConfig::from_driver_params(&params).unwrap();
        assert_eq!(rebuilt.params, ConnectionParams::InMemory);
    }

    #[test]
    fn test_server_driver_params() {
        let params = postgres_config().driver_params();
        assert_eq!(params["db"], "postgresql");
        assert_eq!(params["host"], "localhost");
        assert_eq!(params["port"], "5432");
        assert_eq!(params["user"], "user");
        assert_eq!(params["password"], "pass");
        assert_eq!(params["database"], "db");
        assert_eq!(params["ssl_mode"], "prefer");

        let rebuilt = ConnectionConfig::from_driver_params(&params).unwrap();
        assert_eq!(rebuilt.database_type, DatabaseType::PostgreSQL);
        assert_eq!(rebuilt.params, postgres_config().params);
    }

    #[test]
    fn test_driver_params_errors() {
        let mut params = DriverParams::new();
        assert!(ConnectionConfig::from_driver_params(&params).is_err());

        params.insert("db".into(), "oracle".into());
        assert!(matches!(
            ConnectionConfig::from_driver_params(&params),
            Err(DatabaseError::InvalidConfig(_))
        ));

        params.insert("db".into(), "mysql".into());
        params.insert("host".into(), "db.local".into());
        params.insert("user".into(), "root".into());
        params.insert("database".into(), "app".into());
        params.insert("port".into(), "not-a-port".into());
        assert!(ConnectionConfig::from_driver_params(&params).is_err());

        params.remove("port");
        let config = ConnectionConfig::from_driver_params(&params).unwrap();
        assert_eq!(
            config.params,
            ConnectionParams::server(
                "db.local".to_string(),
                3306,
                "root".to_string(),
                String::new(),
                "app".to_string(),
            )
        );
    }

    #[test]
    fn test_connection_config_serialization() {
        let config = postgres_config();

        let json = serde_json::to_string(&config).unwrap();
        let deserialized: ConnectionConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config, deserialized);
    }
}
