//! PostgreSQL backend.
//!
//! # Example
//!
//! ```ignore
//! use aleto::services::database::drivers::postgres::PostgresConnection;
//! use aleto::services::database::traits::{ConnectionConfig, ConnectionParams, DatabaseType};
//!
//! let config = ConnectionConfig::new(
//!     "My PostgreSQL".to_string(),
//!     DatabaseType::PostgreSQL,
//!     ConnectionParams::server(
//!         "localhost".to_string(),
//!         5432,
//!         "user".to_string(),
//!         "password".to_string(),
//!         "mydb".to_string(),
//!     ),
//! );
//!
//! let db = PostgresConnection::open(config).await?;
//! ```

mod connection;
mod schema;
mod types;

pub use connection::PostgresConnection;
