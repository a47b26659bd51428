use thiserror::Error;

/// The shared error taxonomy (§7). Every concrete reader and the Postgres
/// writer/connection-manager produce exactly these variants; callers match
/// on them to decide fatal-vs-recoverable (§7 Propagation policy).
#[derive(Debug, Error)]
pub enum Error {
    /// Unreachable host, auth failure, TLS handshake. Fatal wherever it
    /// surfaces.
    #[error("connect error: {0}")]
    Connect(String),

    /// DDL/DML/COPY failure with the driver's SQLSTATE preserved.
    #[error("database error [{sqlstate}]: {message}")]
    Database { sqlstate: String, message: String },

    /// Source encoding issue; recoverable by substituting NULL.
    #[error("decode error: {0}")]
    Decode(String),

    /// Malformed source line; recoverable by skipping the row.
    #[error("parse error: {0}")]
    Parse(String),

    /// A referenced table is absent from the source.
    #[error("not found: {0}")]
    NotFound(String),

    /// External or peer cancellation. Terminal but clean.
    #[error("cancelled")]
    Cancelled,

    /// `with_transaction` called while a transaction is already open on the
    /// same session (§4.2).
    #[error("nested transaction")]
    NestedTxn,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn database(sqlstate: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Database {
            sqlstate: sqlstate.into(),
            message: message.into(),
        }
    }

    /// Whether this error is recoverable by the writer's batch-split policy
    /// (§4.3 Failure handling) as opposed to being fatal for the whole
    /// table pipeline.
    pub fn is_recoverable_in_writer(&self) -> bool {
        matches!(self, Error::Database { .. })
    }
}

impl From<tokio_postgres::Error> for Error {
    fn from(err: tokio_postgres::Error) -> Self {
        match err.code() {
            Some(code) => Error::Database {
                sqlstate: code.code().to_string(),
                message: err.to_string(),
            },
            None => Error::Connect(err.to_string()),
        }
    }
}

impl From<mysql_async::Error> for Error {
    fn from(err: mysql_async::Error) -> Self {
        match &err {
            mysql_async::Error::Server(server_err) => Error::Database {
                sqlstate: server_err.state.to_string(),
                message: server_err.message.clone(),
            },
            _ => Error::Connect(err.to_string()),
        }
    }
}
