//! Database abstraction traits and types.
//!
//! - **Types** (`types`): database type enum, connection configuration, SSL modes
//! - **Model** (`model`): table schemas and table data shown by the UI
//! - **Value** (`value`): engine-agnostic cell values and their rendering
//! - **Database** (`database`): the CRUD and schema interface
//! - **Connection** (`connection`): connection lifecycle of direct backends
//!
//! # Example
//!
//! ```ignore
//! use aleto::services::database::traits::{ConnectionConfig, Database};
//! use aleto::services::database::ConnectionFactory;
//!
//! let db = ConnectionFactory::open(ConnectionConfig::sqlite("app.db")).await?;
//! for table in db.get_tables().await? {
//!     let page = db.select(&table.title, 0, 100).await?;
//!     println!("{}: {} rows", page.title(), page.count);
//! }
//! ```

pub mod connection;
pub mod database;
pub mod model;
pub mod types;
pub mod value;

pub use connection::{Backend, BoxedBackend, DatabaseConnection};
pub use database::{Assignment, BoxedDatabase, Database};
pub use model::{Column, SchemaListData, TableData, TableSchema};
pub use types::{
    ConnectionConfig, ConnectionParams, DatabaseType, DriverParams, SslMode,
    CONNECTION_PARAM_KEYS,
};
pub use value::Value;
