//! The backend interface the UI talks to.
//!
//! Every engine, and the out-of-process driver, answers the same CRUD and
//! schema operations. Cell values travel as text; the engine coerces them
//! to the column type.

use anyhow::Result;
use async_trait::async_trait;

use super::model::{Column, TableData, TableSchema};
use crate::services::database::DatabaseError;

/// A `(column, value)` pair. Used both for row filters and assignments.
pub type Assignment<'a> = (&'a str, &'a str);

/// Uniform CRUD and schema operations.
///
/// Implementations perform no retries. Errors carry a [`DatabaseError`].
#[async_trait]
pub trait Database: Send + Sync {
    /// Run a statement verbatim. It may contain several statements.
    async fn execute_query(&self, sql: &str) -> Result<()>;

    /// All user tables, ordered by name, columns in ordinal order.
    async fn get_tables(&self) -> Result<Vec<TableSchema>>;

    /// Schema of a single table, fetched fresh.
    ///
    /// # Errors
    ///
    /// `DatabaseError::TableNotFound` if no such user table exists.
    async fn table_schema(&self, table: &str) -> Result<TableSchema> {
        self.get_tables()
            .await?
            .into_iter()
            .find(|schema| schema.title == table)
            .ok_or_else(|| DatabaseError::TableNotFound(table.to_string()).into())
    }

    /// Up to `limit` rows starting at `offset`.
    ///
    /// The returned page number is `offset / limit`.
    async fn select(&self, table: &str, offset: usize, limit: usize) -> Result<TableData>;

    /// Update rows matching `filter` with `values`.
    async fn edit_row(
        &self,
        table: &str,
        filter: Assignment<'_>,
        values: &[Assignment<'_>],
    ) -> Result<()>;

    /// Insert one row. Columns not named take their defaults.
    async fn add_row(&self, table: &str, values: &[Assignment<'_>]) -> Result<()>;

    /// Delete rows matching `filter`.
    async fn remove_row(&self, table: &str, filter: Assignment<'_>) -> Result<()>;

    /// Case-insensitive literal substring search on one column's text form.
    ///
    /// Returns at most `limit` rows, always as page 0.
    async fn search(
        &self,
        table: &str,
        column: &str,
        pattern: &str,
        limit: usize,
    ) -> Result<TableData>;

    async fn create_table(&self, schema: &TableSchema) -> Result<()>;

    /// Drop a table; dropping a missing table succeeds.
    async fn drop_table(&self, table: &str) -> Result<()>;

    async fn add_column(&self, table: &str, column: &Column) -> Result<()>;

    async fn drop_column(&self, table: &str, column: &str) -> Result<()>;
}

/// A boxed backend interface.
pub type BoxedDatabase = Box<dyn Database>;
