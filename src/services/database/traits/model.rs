//! Table schema and table data exchanged with the UI.
//!
//! These are also the payload shapes of the driver protocol, so their serde
//! representation is part of the wire format.

use serde::{Deserialize, Serialize};

/// A single column as reported by schema introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
    /// Engine-native type name, inserted verbatim into DDL.
    #[serde(rename = "type")]
    pub data_type: String,
}

impl Column {
    /// A non-nullable, non-key column.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nullable: false,
            primary_key: false,
            data_type: data_type.into(),
        }
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_primary_key(mut self, primary_key: bool) -> Self {
        self.primary_key = primary_key;
        self
    }
}

/// Structure of one table: its name and ordered columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub title: String,
    #[serde(default)]
    pub columns: Vec<Column>,
}

impl TableSchema {
    pub fn new(title: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            title: title.into(),
            columns,
        }
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn primary_keys(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.primary_key)
    }
}

/// One page of rows, each cell already rendered as display text.
///
/// The schema is flattened into the same JSON object, so a `TableData`
/// serializes as `{title, columns, data, page, count}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableData {
    #[serde(flatten)]
    pub schema: TableSchema,
    #[serde(default)]
    pub data: Vec<Vec<String>>,
    #[serde(default)]
    pub page: usize,
    /// Number of rows on this page.
    #[serde(default)]
    pub count: usize,
}

impl TableData {
    /// Build a page; `count` always equals the number of rows given.
    pub fn new(schema: TableSchema, data: Vec<Vec<String>>, page: usize) -> Self {
        let count = data.len();
        Self {
            schema,
            data,
            page,
            count,
        }
    }

    pub fn title(&self) -> &str {
        &self.schema.title
    }

    pub fn columns(&self) -> &[Column] {
        &self.schema.columns
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Cells of the first row whose `column` cell equals `value`.
    pub fn find_row(&self, column: &str, value: &str) -> Option<&[String]> {
        let index = self.schema.columns.iter().position(|c| c.name == column)?;
        self.data
            .iter()
            .find(|row| row.get(index).is_some_and(|cell| cell == value))
            .map(Vec::as_slice)
    }
}

/// Every user table of a database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaListData {
    #[serde(default)]
    pub items: Vec<TableSchema>,
}

impl SchemaListData {
    pub fn new(items: Vec<TableSchema>) -> Self {
        Self { items }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn users() -> TableSchema {
        TableSchema::new(
            "users",
            vec![
                Column::new("id", "INTEGER").with_primary_key(true),
                Column::new("name", "TEXT").with_nullable(true),
            ],
        )
    }

    #[test]
    fn test_column_json_shape() {
        let column = Column::new("id", "integer").with_primary_key(true);
        assert_eq!(
            serde_json::to_value(&column).unwrap(),
            json!({"name": "id", "nullable": false, "primary_key": true, "type": "integer"})
        );
    }

    #[test]
    fn test_column_flags_default_to_false() {
        let column: Column = serde_json::from_value(json!({"name": "x", "type": "text"})).unwrap();
        assert!(!column.nullable);
        assert!(!column.primary_key);
    }

    #[test]
    fn test_table_data_flattens_schema() {
        let data = TableData::new(users(), vec![vec!["1".into(), "alice".into()]], 0);
        let value = serde_json::to_value(&data).unwrap();

        assert_eq!(value["title"], "users");
        assert_eq!(value["columns"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["data"], json!([["1", "alice"]]));
        assert_eq!(value["page"], 0);
        assert_eq!(value["count"], 1);
    }

    #[test]
    fn test_table_data_defaults() {
        let data: TableData =
            serde_json::from_value(json!({"title": "empty", "columns": []})).unwrap();
        assert!(data.is_empty());
        assert_eq!(data.page, 0);
        assert_eq!(data.count, 0);
    }

    #[test]
    fn test_find_row() {
        let data = TableData::new(
            users(),
            vec![
                vec!["1".into(), "alice".into()],
                vec!["2".into(), "bob".into()],
            ],
            0,
        );
        assert_eq!(
            data.find_row("name", "bob"),
            Some(&["2".to_string(), "bob".to_string()][..])
        );
        assert_eq!(data.find_row("name", "carol"), None);
        assert_eq!(data.find_row("missing", "bob"), None);
    }

    #[test]
    fn test_schema_helpers() {
        let schema = users();
        assert_eq!(schema.column_names().collect::<Vec<_>>(), vec!["id", "name"]);
        assert_eq!(schema.primary_keys().count(), 1);
        assert!(schema.column("name").is_some_and(|c| c.nullable));
    }
}
