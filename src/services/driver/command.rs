//! Typed driver commands and their request encoding.

use std::collections::BTreeMap;

use super::protocol::{
    Request, TAG_NONE, TAG_SCHEMA_LIST, TAG_TABLE_DATA, TAG_TABLE_SCHEMA,
};
use crate::services::database::DatabaseError;
use crate::services::database::traits::{CONNECTION_PARAM_KEYS, Column, TableSchema};

/// Rows per page of the `get` command.
pub const PAGE_SIZE: usize = 100;

/// Every operation the driver executable understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCommand {
    /// List all tables.
    Connect,
    /// 1-based page of `PAGE_SIZE` rows.
    Get { table: String, page: usize },
    CreateTable(TableSchema),
    DropTable { table: String },
    /// Add and drop columns until the table matches the schema.
    AlterTable(TableSchema),
    /// Positional values fill columns in table order; named values are
    /// carried as extra parameters.
    AddRow {
        table: String,
        values: Vec<String>,
        named: BTreeMap<String, String>,
    },
    AddColumn { table: String, column: Column },
    DropColumn { table: String, column: String },
    Execute { sql: String },
    Select { table: String, offset: usize, limit: usize },
    Search {
        table: String,
        column: String,
        pattern: String,
        limit: usize,
    },
    Insert {
        table: String,
        values: Vec<(String, String)>,
    },
    EditRow {
        table: String,
        filter: (String, String),
        values: Vec<(String, String)>,
    },
    RemoveRow {
        table: String,
        filter: (String, String),
    },
}

impl DriverCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Get { .. } => "get",
            Self::CreateTable(_) => "create_table",
            Self::DropTable { .. } => "drop_table",
            Self::AlterTable(_) => "alter_table",
            Self::AddRow { .. } => "add_row",
            Self::AddColumn { .. } => "add_column",
            Self::DropColumn { .. } => "drop_column",
            Self::Execute { .. } => "execute",
            Self::Select { .. } => "select",
            Self::Search { .. } => "search",
            Self::Insert { .. } => "insert",
            Self::EditRow { .. } => "edit_row",
            Self::RemoveRow { .. } => "remove_row",
        }
    }

    /// `data_type` tag a successful answer to this command carries.
    pub fn answer_tag(&self) -> &'static str {
        match self {
            Self::Connect => TAG_SCHEMA_LIST,
            Self::Get { .. } | Self::Select { .. } | Self::Search { .. } => TAG_TABLE_DATA,
            Self::CreateTable(_)
            | Self::AlterTable(_)
            | Self::AddRow { .. }
            | Self::AddColumn { .. }
            | Self::DropColumn { .. } => TAG_TABLE_SCHEMA,
            Self::DropTable { .. }
            | Self::Execute { .. }
            | Self::Insert { .. }
            | Self::EditRow { .. }
            | Self::RemoveRow { .. } => TAG_NONE,
        }
    }

    /// Encode as a request without connection parameters.
    pub fn into_request(self) -> Result<Request, DatabaseError> {
        let request = Request::new(self.name());

        Ok(match self {
            Self::Connect => request,
            Self::Get { table, page } => request.arg(table).arg(page.to_string()),
            Self::CreateTable(schema) | Self::AlterTable(schema) => {
                request.arg(to_json(&schema)?)
            }
            Self::DropTable { table } => request.arg(table),
            Self::AddRow {
                table,
                values,
                named,
            } => {
                if let Some(key) = named
                    .keys()
                    .find(|key| CONNECTION_PARAM_KEYS.contains(&key.as_str()))
                {
                    return Err(DatabaseError::InvalidArgument(format!(
                        "column `{}` collides with a connection parameter; pass it positionally",
                        key
                    )));
                }
                request.arg(table).args(values).with_params(named)
            }
            Self::AddColumn { table, column } => request.arg(table).arg(to_json(&column)?),
            Self::DropColumn { table, column } => request.arg(table).arg(column),
            Self::Execute { sql } => request.arg(sql),
            Self::Select {
                table,
                offset,
                limit,
            } => request
                .arg(table)
                .arg(offset.to_string())
                .arg(limit.to_string()),
            Self::Search {
                table,
                column,
                pattern,
                limit,
            } => request
                .arg(table)
                .arg(column)
                .arg(pattern)
                .arg(limit.to_string()),
            Self::Insert { table, values } => request.arg(table).args(flatten(values)),
            Self::EditRow {
                table,
                filter,
                values,
            } => request
                .arg(table)
                .arg(filter.0)
                .arg(filter.1)
                .args(flatten(values)),
            Self::RemoveRow { table, filter } => request.arg(table).arg(filter.0).arg(filter.1),
        })
    }

    /// Decode a request received by the driver.
    pub fn from_request(request: &Request) -> Result<Self, DatabaseError> {
        let args = request.args.as_slice();
        let command = request.command.as_str();

        Ok(match command {
            "connect" => {
                exact(command, args, 0)?;
                Self::Connect
            }
            "get" => {
                exact(command, args, 2)?;
                Self::Get {
                    table: args[0].clone(),
                    page: number(&args[1], "page")?,
                }
            }
            "create_table" => {
                exact(command, args, 1)?;
                Self::CreateTable(from_json(&args[0], "table schema")?)
            }
            "alter_table" => {
                exact(command, args, 1)?;
                Self::AlterTable(from_json(&args[0], "table schema")?)
            }
            "drop_table" => {
                exact(command, args, 1)?;
                Self::DropTable {
                    table: args[0].clone(),
                }
            }
            "add_row" => {
                let (table, values) = args.split_first().ok_or_else(|| arity(command, 1))?;
                let named = request
                    .params
                    .iter()
                    .filter(|(key, _)| !CONNECTION_PARAM_KEYS.contains(&key.as_str()))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                Self::AddRow {
                    table: table.clone(),
                    values: values.to_vec(),
                    named,
                }
            }
            "add_column" => {
                exact(command, args, 2)?;
                Self::AddColumn {
                    table: args[0].clone(),
                    column: from_json(&args[1], "column")?,
                }
            }
            "drop_column" => {
                exact(command, args, 2)?;
                Self::DropColumn {
                    table: args[0].clone(),
                    column: args[1].clone(),
                }
            }
            "execute" => {
                exact(command, args, 1)?;
                Self::Execute {
                    sql: args[0].clone(),
                }
            }
            "select" => {
                exact(command, args, 3)?;
                Self::Select {
                    table: args[0].clone(),
                    offset: number(&args[1], "offset")?,
                    limit: number(&args[2], "limit")?,
                }
            }
            "search" => {
                exact(command, args, 4)?;
                Self::Search {
                    table: args[0].clone(),
                    column: args[1].clone(),
                    pattern: args[2].clone(),
                    limit: number(&args[3], "limit")?,
                }
            }
            "insert" => {
                let (table, rest) = args.split_first().ok_or_else(|| arity(command, 1))?;
                Self::Insert {
                    table: table.clone(),
                    values: pairs(command, rest)?,
                }
            }
            "edit_row" => {
                if args.len() < 3 {
                    return Err(arity(command, 3));
                }
                Self::EditRow {
                    table: args[0].clone(),
                    filter: (args[1].clone(), args[2].clone()),
                    values: pairs(command, &args[3..])?,
                }
            }
            "remove_row" => {
                exact(command, args, 3)?;
                Self::RemoveRow {
                    table: args[0].clone(),
                    filter: (args[1].clone(), args[2].clone()),
                }
            }
            other => {
                return Err(DatabaseError::InvalidArgument(format!(
                    "unknown command `{}`",
                    other
                )));
            }
        })
    }
}

fn flatten(values: Vec<(String, String)>) -> impl Iterator<Item = String> {
    values.into_iter().flat_map(|(column, value)| [column, value])
}

fn pairs(command: &str, args: &[String]) -> Result<Vec<(String, String)>, DatabaseError> {
    let chunks = args.chunks_exact(2);
    if !chunks.remainder().is_empty() {
        return Err(DatabaseError::InvalidArgument(format!(
            "`{}` expects column/value pairs",
            command
        )));
    }
    Ok(chunks
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect())
}

fn exact(command: &str, args: &[String], expected: usize) -> Result<(), DatabaseError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(DatabaseError::InvalidArgument(format!(
            "`{}` expects {} argument(s), got {}",
            command,
            expected,
            args.len()
        )))
    }
}

fn arity(command: &str, minimum: usize) -> DatabaseError {
    DatabaseError::InvalidArgument(format!(
        "`{}` expects at least {} argument(s)",
        command, minimum
    ))
}

fn number(value: &str, what: &str) -> Result<usize, DatabaseError> {
    value
        .parse()
        .map_err(|_| DatabaseError::InvalidArgument(format!("invalid {} `{}`", what, value)))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, DatabaseError> {
    serde_json::to_string(value).map_err(|e| DatabaseError::InvalidArgument(e.to_string()))
}

fn from_json<T: serde::de::DeserializeOwned>(value: &str, what: &str) -> Result<T, DatabaseError> {
    serde_json::from_str(value)
        .map_err(|e| DatabaseError::InvalidArgument(format!("invalid {} JSON: {}", what, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(command: DriverCommand) -> DriverCommand {
        let request = command.into_request().unwrap();
        let request = Request::from_argv(request.to_argv()).unwrap();
        DriverCommand::from_request(&request).unwrap()
    }

    #[test]
    fn test_get_arguments() {
        let request = DriverCommand::Get {
            table: "users".into(),
            page: 2,
        }
        .into_request()
        .unwrap();
        assert_eq!(request.to_argv(), vec!["get", "users", "2"]);
    }

    #[test]
    fn test_schema_commands_carry_json() {
        let schema = TableSchema::new("t", vec![Column::new("a", "TEXT").with_nullable(true)]);
        let command = DriverCommand::AlterTable(schema.clone());
        let request = command.clone().into_request().unwrap();

        let parsed: TableSchema = serde_json::from_str(&request.args[0]).unwrap();
        assert_eq!(parsed, schema);
        assert_eq!(roundtrip(command.clone()), command);
    }

    #[test]
    fn test_edit_row_pairs_survive_argv() {
        let command = DriverCommand::EditRow {
            table: "users".into(),
            filter: ("id".into(), "2".into()),
            values: vec![("name".into(), "--Bobby".into()), ("email".into(), "".into())],
        };
        assert_eq!(roundtrip(command.clone()), command);
    }

    #[test]
    fn test_add_row_named_values_travel_as_params() {
        let mut named = BTreeMap::new();
        named.insert("email".to_string(), "a@b.c".to_string());
        let command = DriverCommand::AddRow {
            table: "users".into(),
            values: vec!["1".into(), "Alice".into()],
            named,
        };

        let mut request = command.clone().into_request().unwrap();
        assert_eq!(request.params["email"], "a@b.c");

        // connection parameters are not row values
        request.params.insert("db".into(), "sqlite".into());
        request.params.insert("path".into(), "/tmp/x.db".into());
        assert_eq!(DriverCommand::from_request(&request).unwrap(), command);
    }

    #[test]
    fn test_add_row_rejects_reserved_names() {
        let mut named = BTreeMap::new();
        named.insert("host".to_string(), "example.org".to_string());
        let err = DriverCommand::AddRow {
            table: "servers".into(),
            values: vec![],
            named,
        }
        .into_request()
        .unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidArgument(_)));
    }

    #[test]
    fn test_bad_requests() {
        let bad = [
            Request::new("teleport"),
            Request::new("get").arg("users"),
            Request::new("get").args(["users", "two"]),
            Request::new("select").args(["users", "0", "-1"]),
            Request::new("create_table").arg("{not json"),
            Request::new("insert").args(["users", "id"]),
            Request::new("edit_row").args(["users", "id"]),
            Request::new("add_row"),
        ];
        for request in bad {
            assert!(
                DriverCommand::from_request(&request).is_err(),
                "accepted {:?}",
                request
            );
        }
    }

    #[test]
    fn test_answer_tags() {
        assert_eq!(DriverCommand::Connect.answer_tag(), TAG_SCHEMA_LIST);
        assert_eq!(
            DriverCommand::DropTable { table: "t".into() }.answer_tag(),
            TAG_NONE
        );
        assert_eq!(
            DriverCommand::Search {
                table: "t".into(),
                column: "c".into(),
                pattern: "p".into(),
                limit: 1
            }
            .answer_tag(),
            TAG_TABLE_DATA
        );
    }
}
