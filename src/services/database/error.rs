use thiserror::Error;

/// Failure taxonomy shared by direct backends and the driver client.
///
/// Public operations return `anyhow::Result`; the underlying
/// `DatabaseError` can be recovered with `downcast_ref`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Database not connected")]
    NotConnected,

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid connection configuration: {0}")]
    InvalidConfig(String),

    #[error("Driver invocation failed: {0}")]
    Invocation(String),

    /// The driver answered `ok: false`.
    #[error("{}", .0.as_deref().unwrap_or("driver reported failure without a message"))]
    Driver(Option<String>),

    #[error("Malformed driver answer: {0}")]
    Decode(String),
}

impl DatabaseError {
    pub(crate) fn query(err: impl std::fmt::Display) -> Self {
        Self::QueryFailed(err.to_string())
    }

    pub(crate) fn connection(err: impl std::fmt::Display) -> Self {
        Self::ConnectionFailed(err.to_string())
    }
}
