//! Driver side of the protocol: run requests against a direct backend.
//!
//! The `aleto-driver` binary wraps a [`DriverServer`]. Backends are opened
//! from the request's connection parameters and cached per distinct
//! parameter set, so a persistent worker keeps its connections (and any
//! in-memory SQLite database) between requests.

use anyhow::Result;
use async_lock::Mutex;
use smol::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use smol::stream::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::command::{DriverCommand, PAGE_SIZE};
use super::protocol::{Answer, Payload, Request};
use crate::services::database::traits::{
    Assignment, Backend, CONNECTION_PARAM_KEYS, ConnectionConfig, Database, DriverParams,
    SchemaListData,
};
use crate::services::database::{ConnectionFactory, DatabaseError};

/// Executes driver requests.
///
/// Backends stay open for the life of the server, one per distinct set of
/// connection parameters. A persistent worker belongs to a single client and
/// exits when that client shuts it down.
#[derive(Default)]
pub struct DriverServer {
    backends: Mutex<HashMap<DriverParams, Arc<dyn Backend>>>,
}

impl DriverServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one request; failures become `ok: false` answers.
    pub async fn handle(&self, request: &Request) -> Answer {
        match self.dispatch(request).await {
            Ok(payload) => Answer::Success(payload),
            Err(err) => {
                warn!(command = %request.command, error = %err, "driver command failed");
                Answer::failure(format!("{:#}", err))
            }
        }
    }

    /// Answer JSON-line requests from `input` until it closes.
    pub async fn serve<R, W>(&self, input: R, mut output: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("driver serving JSON lines");
        let mut lines = input.lines();

        while let Some(line) = lines.next().await {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let answer = match serde_json::from_str::<Request>(&line) {
                Ok(request) => self.handle(&request).await,
                Err(err) => Answer::failure(format!("malformed request: {}", err)),
            };

            output.write_all(answer.encode().as_bytes()).await?;
            output.write_all(b"\n").await?;
            output.flush().await?;
        }

        info!("driver input closed");
        Ok(())
    }

    async fn dispatch(&self, request: &Request) -> Result<Payload> {
        let command = DriverCommand::from_request(request)?;
        let backend = self.backend(&request.params).await?;
        debug!(command = command.name(), "dispatching");
        execute(backend.as_ref(), command).await
    }

    async fn backend(&self, params: &DriverParams) -> Result<Arc<dyn Backend>> {
        let key: DriverParams = params
            .iter()
            .filter(|(key, _)| CONNECTION_PARAM_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let mut backends = self.backends.lock().await;
        if let Some(backend) = backends.get(&key) {
            return Ok(backend.clone());
        }

        let config = ConnectionConfig::from_driver_params(&key)?;
        let backend: Arc<dyn Backend> = Arc::from(ConnectionFactory::open(config).await?);
        backends.insert(key, backend.clone());
        Ok(backend)
    }
}

/// Run one command against a backend.
pub async fn execute<D>(db: &D, command: DriverCommand) -> Result<Payload>
where
    D: Database + ?Sized,
{
    Ok(match command {
        DriverCommand::Connect => Payload::SchemaList(SchemaListData::new(db.get_tables().await?)),

        DriverCommand::Get { table, page } => {
            let offset = page_offset(page)?;
            let mut data = db.select(&table, offset, PAGE_SIZE).await?;
            data.page = page;
            Payload::TableData(data)
        }

        DriverCommand::CreateTable(schema) => {
            db.create_table(&schema).await?;
            Payload::TableSchema(db.table_schema(&schema.title).await?)
        }

        DriverCommand::DropTable { table } => {
            db.drop_table(&table).await?;
            Payload::None
        }

        DriverCommand::AlterTable(target) => {
            let current = db.table_schema(&target.title).await?;

            for column in &target.columns {
                if current.column(&column.name).is_none() {
                    db.add_column(&target.title, column).await?;
                }
            }
            for column in &current.columns {
                if target.column(&column.name).is_none() {
                    db.drop_column(&target.title, &column.name).await?;
                }
            }

            Payload::TableSchema(db.table_schema(&target.title).await?)
        }

        DriverCommand::AddRow {
            table,
            values,
            named,
        } => {
            let schema = db.table_schema(&table).await?;
            if values.len() > schema.columns.len() {
                return Err(DatabaseError::InvalidArgument(format!(
                    "{} values for {} columns of `{}`",
                    values.len(),
                    schema.columns.len(),
                    table
                ))
                .into());
            }

            let mut row: Vec<Assignment<'_>> = schema
                .column_names()
                .zip(values.iter().map(String::as_str))
                .collect();
            for (column, value) in &named {
                match row.iter_mut().find(|(name, _)| *name == column.as_str()) {
                    Some(slot) => slot.1 = value.as_str(),
                    None => row.push((column.as_str(), value.as_str())),
                }
            }

            db.add_row(&table, &row).await?;
            Payload::TableSchema(schema)
        }

        DriverCommand::AddColumn { table, column } => {
            db.add_column(&table, &column).await?;
            Payload::TableSchema(db.table_schema(&table).await?)
        }

        DriverCommand::DropColumn { table, column } => {
            db.drop_column(&table, &column).await?;
            Payload::TableSchema(db.table_schema(&table).await?)
        }

        DriverCommand::Execute { sql } => {
            db.execute_query(&sql).await?;
            Payload::None
        }

        DriverCommand::Select {
            table,
            offset,
            limit,
        } => Payload::TableData(db.select(&table, offset, limit).await?),

        DriverCommand::Search {
            table,
            column,
            pattern,
            limit,
        } => Payload::TableData(db.search(&table, &column, &pattern, limit).await?),

        DriverCommand::Insert { table, values } => {
            db.add_row(&table, &borrowed(&values)).await?;
            Payload::None
        }

        DriverCommand::EditRow {
            table,
            filter,
            values,
        } => {
            db.edit_row(&table, (filter.0.as_str(), filter.1.as_str()), &borrowed(&values))
                .await?;
            Payload::None
        }

        DriverCommand::RemoveRow { table, filter } => {
            db.remove_row(&table, (filter.0.as_str(), filter.1.as_str())).await?;
            Payload::None
        }
    })
}

/// Row offset of a 1-based page.
fn page_offset(page: usize) -> Result<usize, DatabaseError> {
    match page {
        0 => Err(DatabaseError::InvalidArgument("pages start at 1".to_string())),
        _ => (page - 1).checked_mul(PAGE_SIZE).ok_or_else(|| {
            DatabaseError::InvalidArgument(format!("page {} is out of range", page))
        }),
    }
}

fn borrowed(values: &[(String, String)]) -> Vec<Assignment<'_>> {
    values
        .iter()
        .map(|(column, value)| (column.as_str(), value.as_str()))
        .collect()
}
