pub mod database;
pub mod driver;
