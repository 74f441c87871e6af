//! Direct backends.
//!
//! - **PostgreSQL** via SQLx
//! - **MySQL** (and MariaDB) via SQLx
//! - **SQLite** via SQLx, file or in-memory
//!
//! Each backend implements `DatabaseConnection` and `Database`.

mod factory;

pub mod mysql;
pub mod postgres;
pub mod sqlite;

pub use factory::ConnectionFactory;
