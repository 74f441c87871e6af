//! Wire format of the `aleto-driver` protocol.
//!
//! A request is a command name, a flat parameter map and positional
//! arguments. In one-shot mode it travels as argv
//! (`--key=value ... command arg ...`); in persistent mode as one JSON line.
//!
//! The answer is always the JSON object
//! `{"ok", "error_message", "data_type", "data"}`. It decodes into
//! [`Answer`], where a failure can never carry a payload and an unknown
//! `data_type` is rejected.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::services::database::DatabaseError;
use crate::services::database::traits::{SchemaListData, TableData, TableSchema};

pub const TAG_NONE: &str = "None";
pub const TAG_TABLE_DATA: &str = "TableData";
pub const TAG_TABLE_SCHEMA: &str = "TableSchema";
pub const TAG_SCHEMA_LIST: &str = "SchemaListData";

/// One driver invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub command: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Request {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    /// Merge parameters; keys already present are overwritten.
    pub fn with_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// `--key=value` tokens, then the command, then the positional arguments.
    pub fn to_argv(&self) -> Vec<String> {
        self.params
            .iter()
            .map(|(key, value)| format!("--{}={}", key, value))
            .chain(std::iter::once(self.command.clone()))
            .chain(self.args.iter().cloned())
            .collect()
    }

    /// Parse argv as produced by [`Request::to_argv`] (program name excluded).
    pub fn from_argv<I, S>(argv: I) -> Result<Self, DatabaseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tokens = argv.into_iter().map(Into::into);
        let mut params = BTreeMap::new();

        let command = loop {
            let Some(token) = tokens.next() else {
                return Err(DatabaseError::InvalidArgument("missing command".to_string()));
            };
            let Some(pair) = token.strip_prefix("--") else {
                break token;
            };
            let Some((key, value)) = pair.split_once('=') else {
                return Err(DatabaseError::InvalidArgument(format!(
                    "parameter `{}` has no value",
                    token
                )));
            };
            params.insert(key.to_string(), value.to_string());
        };

        Ok(Self {
            command,
            params,
            args: tokens.collect(),
        })
    }

    /// Shell-style rendering of the invocation, for logs.
    pub fn to_command_line(&self, program: &str) -> String {
        let mut line = escape_and_wrap(program);
        for (key, value) in &self.params {
            line.push_str(&format!(" --{}={}", key, escape_and_wrap(value)));
        }
        line.push(' ');
        line.push_str(&self.command);
        for arg in &self.args {
            line.push(' ');
            line.push_str(&escape_and_wrap(arg));
        }
        line
    }
}

/// Wrap in double quotes, backslash-escaping `"` and `\`.
pub fn escape_and_wrap(value: &str) -> String {
    let mut wrapped = String::with_capacity(value.len() + 2);
    wrapped.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            wrapped.push('\\');
        }
        wrapped.push(c);
    }
    wrapped.push('"');
    wrapped
}

/// Typed content of a successful answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    None,
    TableData(TableData),
    TableSchema(TableSchema),
    SchemaList(SchemaListData),
}

impl Payload {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::None => TAG_NONE,
            Self::TableData(_) => TAG_TABLE_DATA,
            Self::TableSchema(_) => TAG_TABLE_SCHEMA,
            Self::SchemaList(_) => TAG_SCHEMA_LIST,
        }
    }

    fn decode(tag: &str, data: Option<serde_json::Value>) -> Result<Self, DatabaseError> {
        fn body<T: serde::de::DeserializeOwned>(
            tag: &str,
            data: Option<serde_json::Value>,
        ) -> Result<T, DatabaseError> {
            match data {
                None | Some(serde_json::Value::Null) => Err(DatabaseError::Decode(format!(
                    "`{}` answer without data",
                    tag
                ))),
                Some(value) => serde_json::from_value(value)
                    .map_err(|e| DatabaseError::Decode(format!("invalid `{}` data: {}", tag, e))),
            }
        }

        match tag {
            TAG_NONE => Ok(Self::None),
            TAG_TABLE_DATA => body(tag, data).map(Self::TableData),
            TAG_TABLE_SCHEMA => body(tag, data).map(Self::TableSchema),
            TAG_SCHEMA_LIST => body(tag, data).map(Self::SchemaList),
            other => Err(DatabaseError::Decode(format!(
                "unknown data_type `{}`",
                other
            ))),
        }
    }

    fn encode(self) -> Option<serde_json::Value> {
        match self {
            Self::None => None,
            Self::TableData(data) => serde_json::to_value(data).ok(),
            Self::TableSchema(schema) => serde_json::to_value(schema).ok(),
            Self::SchemaList(list) => serde_json::to_value(list).ok(),
        }
    }
}

/// Outcome of one driver invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireAnswer", into = "WireAnswer")]
pub enum Answer {
    Success(Payload),
    Failure(Option<String>),
}

impl Answer {
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure(Some(message.into()))
    }

    /// Decode driver output.
    ///
    /// Output that is not a JSON answer object is an `Invocation` error;
    /// a well-formed object with bad content is a `Decode` error.
    pub fn decode(output: &[u8]) -> Result<Self, DatabaseError> {
        let wire: WireAnswer = serde_json::from_slice(output).map_err(|e| {
            DatabaseError::Invocation(format!(
                "driver output is not a JSON answer ({}): {}",
                e,
                String::from_utf8_lossy(output).trim()
            ))
        })?;
        Self::try_from(wire)
    }

    /// Serialize as a single JSON line (no trailing newline).
    pub fn encode(&self) -> String {
        let wire = WireAnswer::from(self.clone());
        serde_json::to_string(&wire).unwrap_or_else(|e| {
            format!(
                r#"{{"ok":false,"error_message":{},"data_type":"None","data":null}}"#,
                serde_json::Value::String(format!("failed to encode answer: {}", e))
            )
        })
    }

    /// Payload of a success, or the driver's error.
    pub fn into_result(self) -> Result<Payload, DatabaseError> {
        match self {
            Self::Success(payload) => Ok(payload),
            Self::Failure(message) => Err(DatabaseError::Driver(message)),
        }
    }
}

/// The flat JSON object actually exchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireAnswer {
    ok: bool,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default = "default_tag")]
    data_type: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

fn default_tag() -> String {
    TAG_NONE.to_string()
}

impl TryFrom<WireAnswer> for Answer {
    type Error = DatabaseError;

    fn try_from(wire: WireAnswer) -> Result<Self, Self::Error> {
        if !wire.ok {
            return Ok(Self::Failure(wire.error_message));
        }
        Payload::decode(&wire.data_type, wire.data).map(Self::Success)
    }
}

impl From<Answer> for WireAnswer {
    fn from(answer: Answer) -> Self {
        match answer {
            Answer::Success(payload) => Self {
                ok: true,
                error_message: None,
                data_type: payload.tag().to_string(),
                data: payload.encode(),
            },
            Answer::Failure(error_message) => Self {
                ok: false,
                error_message,
                data_type: default_tag(),
                data: None,
            },
        }
    }
}
