//! MySQL/MariaDB backend.

mod connection;
mod schema;
mod types;

pub use connection::MySqlConnection;
