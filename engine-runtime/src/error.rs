use thiserror::Error;

/// Errors the pipeline runtime surfaces to its caller (§4.5 step 6:
/// "propagate the first fatal error"). Per-row and per-batch recoverable
/// errors never reach this type — they are folded into `Stats` instead.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("table '{table}': {source}")]
    Reader {
        table: String,
        #[source]
        source: connectors::error::Error,
    },

    #[error("table '{table}': {source}")]
    Writer {
        table: String,
        #[source]
        source: connectors::error::Error,
    },

    #[error("table '{table}': index build failed: {source}")]
    Index {
        table: String,
        #[source]
        source: connectors::error::Error,
    },

    #[error("schema {phase}: {source}")]
    Schema {
        phase: &'static str,
        #[source]
        source: engine_core::error::MigrationError,
    },
}

impl RuntimeError {
    pub fn reader(table: impl Into<String>, source: connectors::error::Error) -> Self {
        RuntimeError::Reader {
            table: table.into(),
            source,
        }
    }

    pub fn writer(table: impl Into<String>, source: connectors::error::Error) -> Self {
        RuntimeError::Writer {
            table: table.into(),
            source,
        }
    }

    pub fn index(table: impl Into<String>, source: connectors::error::Error) -> Self {
        RuntimeError::Index {
            table: table.into(),
            source,
        }
    }
}
