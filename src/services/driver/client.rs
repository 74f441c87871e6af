//! Client side of the driver protocol.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::debug;

use super::command::DriverCommand;
use super::locate::{DriverOptions, TransportKind};
use super::protocol::Payload;
use super::transport::{OneShotTransport, PersistentTransport, Transport};
use crate::services::database::DatabaseError;
use crate::services::database::traits::{
    Assignment, Column, ConnectionConfig, Database, DriverParams, TableData, TableSchema,
};

/// `Database` implemented by running the `aleto-driver` executable.
///
/// Every call sends the connection's parameters along with the command,
/// so the driver needs no state of its own.
pub struct DriverClient {
    config: ConnectionConfig,
    defaults: DriverParams,
    transport: Box<dyn Transport>,
}

impl DriverClient {
    pub fn new(config: ConnectionConfig, options: DriverOptions) -> Result<Self> {
        config.validate()?;
        let program = options.resolve_driver_path()?;
        debug!(program = %program.display(), transport = ?options.transport, "driver client");

        let transport: Box<dyn Transport> = match options.transport {
            TransportKind::OneShot => Box::new(OneShotTransport::new(program)),
            TransportKind::Persistent => Box::new(PersistentTransport::new(program)),
        };
        Ok(Self::with_transport(config, transport))
    }

    /// Client configured from `ALETO_DRIVER_PATH` / `ALETO_DRIVER_MODE`.
    pub fn from_env(config: ConnectionConfig) -> Result<Self> {
        Self::new(config, DriverOptions::from_env())
    }

    pub fn with_transport(config: ConnectionConfig, transport: Box<dyn Transport>) -> Self {
        let defaults = config.driver_params();
        Self {
            config,
            defaults,
            transport,
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub async fn call(&self, command: DriverCommand) -> Result<Payload> {
        self.call_with(command, &DriverParams::new()).await
    }

    /// Run a command; `overrides` replace connection parameters for this call only.
    pub async fn call_with(
        &self,
        command: DriverCommand,
        overrides: &DriverParams,
    ) -> Result<Payload> {
        let name = command.name();
        let expected = command.answer_tag();
        let mut request = command.into_request()?;

        let mut params = self.defaults.clone();
        params.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        params.append(&mut request.params);
        request.params = params;

        let payload = self.transport.exchange(&request).await?.into_result()?;
        if payload.tag() != expected {
            return Err(DatabaseError::Decode(format!(
                "`{}` answered with {} instead of {}",
                name,
                payload.tag(),
                expected
            ))
            .into());
        }
        Ok(payload)
    }

    async fn unit(&self, command: DriverCommand) -> Result<()> {
        self.call(command).await.map(|_| ())
    }

    async fn table_data(&self, command: DriverCommand) -> Result<TableData> {
        match self.call(command).await? {
            Payload::TableData(data) => Ok(data),
            other => Err(unexpected(&other)),
        }
    }

    async fn schema(&self, command: DriverCommand) -> Result<TableSchema> {
        match self.call(command).await? {
            Payload::TableSchema(schema) => Ok(schema),
            other => Err(unexpected(&other)),
        }
    }

    /// All tables with their columns.
    pub async fn connect(&self) -> Result<Vec<TableSchema>> {
        match self.call(DriverCommand::Connect).await? {
            Payload::SchemaList(list) => Ok(list.items),
            other => Err(unexpected(&other)),
        }
    }

    /// 1-based page of `PAGE_SIZE` rows.
    pub async fn get(&self, table: &str, page: usize) -> Result<TableData> {
        self.table_data(DriverCommand::Get {
            table: table.to_string(),
            page,
        })
        .await
    }

    /// Make the table's columns match `schema`; returns the resulting schema.
    pub async fn alter_table(&self, schema: &TableSchema) -> Result<TableSchema> {
        self.schema(DriverCommand::AlterTable(schema.clone())).await
    }

    /// Insert a row from positional values (in column order) plus named values.
    pub async fn add_row_with(
        &self,
        table: &str,
        values: &[String],
        named: &BTreeMap<String, String>,
    ) -> Result<TableSchema> {
        self.schema(DriverCommand::AddRow {
            table: table.to_string(),
            values: values.to_vec(),
            named: named.clone(),
        })
        .await
    }

    /// Stop a persistent driver process, if any.
    pub async fn shutdown(&self) -> Result<()> {
        self.transport.shutdown().await
    }
}

fn unexpected(payload: &Payload) -> anyhow::Error {
    DatabaseError::Decode(format!("unexpected {} payload", payload.tag())).into()
}

fn owned(values: &[Assignment<'_>]) -> Vec<(String, String)> {
    values
        .iter()
        .map(|(column, value)| (column.to_string(), value.to_string()))
        .collect()
}

fn owned_pair((column, value): Assignment<'_>) -> (String, String) {
    (column.to_string(), value.to_string())
}

#[async_trait]
impl Database for DriverClient {
    async fn execute_query(&self, sql: &str) -> Result<()> {
        self.unit(DriverCommand::Execute {
            sql: sql.to_string(),
        })
        .await
    }

    async fn get_tables(&self) -> Result<Vec<TableSchema>> {
        self.connect().await
    }

    async fn select(&self, table: &str, offset: usize, limit: usize) -> Result<TableData> {
        self.table_data(DriverCommand::Select {
            table: table.to_string(),
            offset,
            limit,
        })
        .await
    }

    async fn edit_row(
        &self,
        table: &str,
        filter: Assignment<'_>,
        values: &[Assignment<'_>],
    ) -> Result<()> {
        self.unit(DriverCommand::EditRow {
            table: table.to_string(),
            filter: owned_pair(filter),
            values: owned(values),
        })
        .await
    }

    async fn add_row(&self, table: &str, values: &[Assignment<'_>]) -> Result<()> {
        self.unit(DriverCommand::Insert {
            table: table.to_string(),
            values: owned(values),
        })
        .await
    }

    async fn remove_row(&self, table: &str, filter: Assignment<'_>) -> Result<()> {
        self.unit(DriverCommand::RemoveRow {
            table: table.to_string(),
            filter: owned_pair(filter),
        })
        .await
    }

    async fn search(
        &self,
        table: &str,
        column: &str,
        pattern: &str,
        limit: usize,
    ) -> Result<TableData> {
        self.table_data(DriverCommand::Search {
            table: table.to_string(),
            column: column.to_string(),
            pattern: pattern.to_string(),
            limit,
        })
        .await
    }

    async fn create_table(&self, schema: &TableSchema) -> Result<()> {
        self.schema(DriverCommand::CreateTable(schema.clone()))
            .await
            .map(|_| ())
    }

    async fn drop_table(&self, table: &str) -> Result<()> {
        self.unit(DriverCommand::DropTable {
            table: table.to_string(),
        })
        .await
    }

    async fn add_column(&self, table: &str, column: &Column) -> Result<()> {
        self.schema(DriverCommand::AddColumn {
            table: table.to_string(),
            column: column.clone(),
        })
        .await
        .map(|_| ())
    }

    async fn drop_column(&self, table: &str, column: &str) -> Result<()> {
        self.schema(DriverCommand::DropColumn {
            table: table.to_string(),
            column: column.to_string(),
        })
        .await
        .map(|_| ())
    }
}
