//! SQL text for the statements the direct backends issue.
//!
//! Identifiers and values are always quoted; values are sent as string
//! literals and the engine coerces them to the column type.

use crate::services::database::DatabaseError;
use crate::services::database::traits::{Assignment, Column, DatabaseType, TableSchema};

/// Quoting and syntax rules of one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
    MySql,
}

impl Dialect {
    pub fn for_database(database_type: DatabaseType) -> Self {
        match database_type {
            DatabaseType::SQLite => Self::Sqlite,
            DatabaseType::PostgreSQL => Self::Postgres,
            DatabaseType::MySQL => Self::MySql,
        }
    }

    pub fn quote_ident(self, ident: &str) -> String {
        match self {
            Self::Sqlite | Self::Postgres => format!("\"{}\"", ident.replace('"', "\"\"")),
            Self::MySql => format!("`{}`", ident.replace('`', "``")),
        }
    }

    pub fn quote_literal(self, value: &str) -> String {
        match self {
            Self::Sqlite | Self::Postgres => format!("'{}'", value.replace('\'', "''")),
            Self::MySql => format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''")),
        }
    }

    /// `"col" = 'value'`
    fn assignment(self, (column, value): Assignment<'_>) -> String {
        format!("{} = {}", self.quote_ident(column), self.quote_literal(value))
    }

    pub fn select_page(
        self,
        table: &str,
        offset: usize,
        limit: usize,
    ) -> Result<String, DatabaseError> {
        check_limit(limit)?;
        let table = self.quote_ident(table);
        Ok(match self {
            Self::Postgres => format!("SELECT * FROM {} OFFSET {} LIMIT {}", table, offset, limit),
            Self::Sqlite | Self::MySql => {
                format!("SELECT * FROM {} LIMIT {} OFFSET {}", table, limit, offset)
            }
        })
    }

    /// Case-insensitive substring match on the column's text form.
    pub fn search(
        self,
        table: &str,
        column: &str,
        pattern: &str,
        limit: usize,
    ) -> Result<String, DatabaseError> {
        check_limit(limit)?;
        let column = self.quote_ident(column);
        let needle = self.quote_literal(&format!("%{}%", escape_like(pattern)));
        let escape = self.quote_literal("\\");

        let predicate = match self {
            Self::Postgres => {
                format!("CAST({} AS TEXT) ILIKE {} ESCAPE {}", column, needle, escape)
            }
            // SQLite's LIKE folds ASCII letters only; non-ASCII text matches case-sensitively.
            Self::Sqlite => format!("CAST({} AS TEXT) LIKE {} ESCAPE {}", column, needle, escape),
            Self::MySql => format!(
                "LOWER(CAST({} AS CHAR)) LIKE LOWER({}) ESCAPE {}",
                column, needle, escape
            ),
        };

        Ok(format!(
            "SELECT * FROM {} WHERE {} LIMIT {}",
            self.quote_ident(table),
            predicate,
            limit
        ))
    }

    pub fn update(
        self,
        table: &str,
        filter: Assignment<'_>,
        values: &[Assignment<'_>],
    ) -> Result<String, DatabaseError> {
        if values.is_empty() {
            return Err(DatabaseError::InvalidArgument(
                "edit_row needs at least one column to update".to_string(),
            ));
        }

        let set = values
            .iter()
            .map(|pair| self.assignment(*pair))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!(
            "UPDATE {} SET {} WHERE {}",
            self.quote_ident(table),
            set,
            self.assignment(filter)
        ))
    }

    pub fn insert(self, table: &str, values: &[Assignment<'_>]) -> String {
        let table = self.quote_ident(table);
        if values.is_empty() {
            return match self {
                Self::MySql => format!("INSERT INTO {} () VALUES ()", table),
                Self::Sqlite | Self::Postgres => format!("INSERT INTO {} DEFAULT VALUES", table),
            };
        }

        let (columns, literals): (Vec<_>, Vec<_>) = values
            .iter()
            .map(|(column, value)| (self.quote_ident(column), self.quote_literal(value)))
            .unzip();

        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns.join(", "),
            literals.join(", ")
        )
    }

    pub fn delete(self, table: &str, filter: Assignment<'_>) -> String {
        format!(
            "DELETE FROM {} WHERE {}",
            self.quote_ident(table),
            self.assignment(filter)
        )
    }

    /// `"name" type [NOT NULL] [PRIMARY KEY]`
    pub fn column_definition(self, column: &Column, inline_primary_key: bool) -> String {
        let mut definition = self.quote_ident(&column.name);
        let data_type = column.data_type.trim();
        if !data_type.is_empty() {
            definition.push(' ');
            definition.push_str(data_type);
        }
        if !column.nullable {
            definition.push_str(" NOT NULL");
        }
        if inline_primary_key && column.primary_key {
            definition.push_str(" PRIMARY KEY");
        }
        definition
    }

    /// `CREATE TABLE`; several key columns become a table-level key.
    pub fn create_table(self, schema: &TableSchema) -> Result<String, DatabaseError> {
        if schema.columns.is_empty() {
            return Err(DatabaseError::InvalidArgument(format!(
                "table `{}` has no columns",
                schema.title
            )));
        }

        let keys: Vec<String> = schema
            .primary_keys()
            .map(|c| self.quote_ident(&c.name))
            .collect();
        let inline = keys.len() <= 1;

        let mut definitions: Vec<String> = schema
            .columns
            .iter()
            .map(|c| self.column_definition(c, inline))
            .collect();
        if !inline {
            definitions.push(format!("PRIMARY KEY ({})", keys.join(", ")));
        }

        Ok(format!(
            "CREATE TABLE {} ({})",
            self.quote_ident(&schema.title),
            definitions.join(", ")
        ))
    }

    pub fn drop_table(self, table: &str) -> String {
        format!("DROP TABLE IF EXISTS {}", self.quote_ident(table))
    }

    pub fn add_column(self, table: &str, column: &Column) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN {}",
            self.quote_ident(table),
            self.column_definition(column, true)
        )
    }

    pub fn drop_column(self, table: &str, column: &str) -> String {
        format!(
            "ALTER TABLE {} DROP COLUMN {}",
            self.quote_ident(table),
            self.quote_ident(column)
        )
    }
}

/// Escape LIKE metacharacters so the pattern matches literally.
pub fn escape_like(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn check_limit(limit: usize) -> Result<(), DatabaseError> {
    if limit == 0 {
        return Err(DatabaseError::InvalidArgument(
            "limit must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(Dialect::Sqlite.quote_ident("user"), "\"user\"");
        assert_eq!(Dialect::Postgres.quote_ident("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(Dialect::MySql.quote_ident("back`tick"), "`back``tick`");
    }

    #[test]
    fn test_quote_literal() {
        assert_eq!(Dialect::Sqlite.quote_literal("O'Brien"), "'O''Brien'");
        assert_eq!(Dialect::Postgres.quote_literal("a\\b"), "'a\\b'");
        assert_eq!(Dialect::MySql.quote_literal("a\\b'c"), "'a\\\\b''c'");
    }

    #[test]
    fn test_select_page_order_of_clauses() {
        assert_eq!(
            Dialect::Postgres.select_page("users", 200, 100).unwrap(),
            "SELECT * FROM \"users\" OFFSET 200 LIMIT 100"
        );
        assert_eq!(
            Dialect::Sqlite.select_page("users", 200, 100).unwrap(),
            "SELECT * FROM \"users\" LIMIT 100 OFFSET 200"
        );
        assert_eq!(
            Dialect::MySql.select_page("users", 0, 10).unwrap(),
            "SELECT * FROM `users` LIMIT 10 OFFSET 0"
        );
    }

    #[test]
    fn test_zero_limit_rejected() {
        assert!(matches!(
            Dialect::Sqlite.select_page("users", 0, 0),
            Err(DatabaseError::InvalidArgument(_))
        ));
        assert!(Dialect::Postgres.search("users", "name", "a", 0).is_err());
    }

    #[test]
    fn test_search_statements() {
        assert_eq!(
            Dialect::Postgres.search("users", "name", "al", 5).unwrap(),
            "SELECT * FROM \"users\" WHERE CAST(\"name\" AS TEXT) ILIKE '%al%' ESCAPE '\\' LIMIT 5"
        );
        assert_eq!(
            Dialect::Sqlite.search("users", "name", "al", 5).unwrap(),
            "SELECT * FROM \"users\" WHERE CAST(\"name\" AS TEXT) LIKE '%al%' ESCAPE '\\' LIMIT 5"
        );
        assert_eq!(
            Dialect::MySql.search("users", "name", "al", 5).unwrap(),
            "SELECT * FROM `users` WHERE LOWER(CAST(`name` AS CHAR)) LIKE LOWER('%al%') ESCAPE '\\\\' LIMIT 5"
        );
    }

    #[test]
    fn test_search_escapes_metacharacters() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        let sql = Dialect::Sqlite.search("t", "c", "it's 100%", 1).unwrap();
        assert!(sql.contains("LIKE '%it''s 100\\%%'"));
    }

    #[test]
    fn test_update() {
        assert_eq!(
            Dialect::Sqlite
                .update("users", ("id", "2"), &[("name", "Bobby"), ("email", "b@x.io")])
                .unwrap(),
            "UPDATE \"users\" SET \"name\" = 'Bobby', \"email\" = 'b@x.io' WHERE \"id\" = '2'"
        );
        assert!(Dialect::Sqlite.update("users", ("id", "2"), &[]).is_err());
    }

    #[test]
    fn test_insert() {
        assert_eq!(
            Dialect::Postgres.insert("users", &[("id", "1"), ("name", "Al")]),
            "INSERT INTO \"users\" (\"id\", \"name\") VALUES ('1', 'Al')"
        );
        assert_eq!(
            Dialect::Sqlite.insert("users", &[]),
            "INSERT INTO \"users\" DEFAULT VALUES"
        );
        assert_eq!(Dialect::MySql.insert("users", &[]), "INSERT INTO `users` () VALUES ()");
    }

    #[test]
    fn test_delete() {
        assert_eq!(
            Dialect::MySql.delete("users", ("id", "7")),
            "DELETE FROM `users` WHERE `id` = '7'"
        );
    }

    #[test]
    fn test_create_table() {
        let schema = TableSchema::new(
            "users",
            vec![
                Column::new("id", "INTEGER").with_primary_key(true),
                Column::new("name", "TEXT").with_nullable(true),
                Column::new("email", "TEXT"),
            ],
        );
        assert_eq!(
            Dialect::Sqlite.create_table(&schema).unwrap(),
            "CREATE TABLE \"users\" (\"id\" INTEGER NOT NULL PRIMARY KEY, \"name\" TEXT, \"email\" TEXT NOT NULL)"
        );
    }

    #[test]
    fn test_create_table_composite_key() {
        let schema = TableSchema::new(
            "memberships",
            vec![
                Column::new("user_id", "integer").with_primary_key(true),
                Column::new("group_id", "integer").with_primary_key(true),
            ],
        );
        assert_eq!(
            Dialect::Postgres.create_table(&schema).unwrap(),
            "CREATE TABLE \"memberships\" (\"user_id\" integer NOT NULL, \"group_id\" integer NOT NULL, PRIMARY KEY (\"user_id\", \"group_id\"))"
        );
    }

    #[test]
    fn test_create_table_without_columns() {
        assert!(matches!(
            Dialect::Sqlite.create_table(&TableSchema::new("empty", vec![])),
            Err(DatabaseError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_ddl() {
        assert_eq!(Dialect::Postgres.drop_table("old"), "DROP TABLE IF EXISTS \"old\"");
        assert_eq!(
            Dialect::MySql.add_column("users", &Column::new("age", "int").with_nullable(true)),
            "ALTER TABLE `users` ADD COLUMN `age` int"
        );
        assert_eq!(
            Dialect::Sqlite.drop_column("users", "age"),
            "ALTER TABLE \"users\" DROP COLUMN \"age\""
        );
    }
}
