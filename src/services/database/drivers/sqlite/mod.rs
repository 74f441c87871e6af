//! SQLite backend.
//!
//! Supports file databases (optionally read-only) and in-memory databases.
//!
//! # Example
//!
//! ```ignore
//! use aleto::services::database::drivers::sqlite::SqliteConnection;
//! use aleto::services::database::traits::{ConnectionConfig, Database};
//!
//! let db = SqliteConnection::open(ConnectionConfig::sqlite("/path/to/app.db")).await?;
//! let page = db.select("users", 0, 100).await?;
//! ```

mod connection;
mod schema;
mod types;

pub use connection::SqliteConnection;
