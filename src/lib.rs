//! Database access layer for the aleto table browser.
//!
//! Two families of backends implement the same [`Database`] interface:
//!
//! - direct backends (`services::database::drivers`) that talk to SQLite,
//!   PostgreSQL and MySQL through SQLx;
//! - [`DriverClient`], which forwards every operation to the `aleto-driver`
//!   executable over a JSON protocol.
//!
//! [`Database`]: services::database::traits::Database
//! [`DriverClient`]: services::driver::DriverClient

pub mod logging;
pub mod services;

pub use services::database::{
    Column, ConnectionConfig, ConnectionFactory, ConnectionParams, Database, DatabaseError,
    DatabaseType, SchemaListData, TableData, TableSchema,
};
pub use services::driver::{DriverClient, DriverOptions};
