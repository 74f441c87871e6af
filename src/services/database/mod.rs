//! Uniform CRUD and schema access over SQLite, PostgreSQL and MySQL.

mod error;

pub mod drivers;
pub mod sql;
pub mod traits;

pub use drivers::ConnectionFactory;
pub use error::DatabaseError;
pub use traits::{
    Backend, BoxedBackend, Column, ConnectionConfig, ConnectionParams, Database,
    DatabaseConnection, DatabaseType, SchemaListData, SslMode, TableData, TableSchema, Value,
};
