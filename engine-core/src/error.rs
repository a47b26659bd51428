use thiserror::Error;

/// The run-level error surfaced to the CLI (§7 Propagation policy): every
/// fatal error from a reader, writer, or schema step is wrapped here before
/// crossing a table or phase boundary, so the top level only needs to
/// decide "which table/phase failed" plus the underlying cause.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("table '{table}': {source}")]
    Table {
        table: String,
        #[source]
        source: connectors::error::Error,
    },

    #[error("schema {phase}: {source}")]
    Schema {
        phase: &'static str,
        #[source]
        source: connectors::error::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl MigrationError {
    pub fn table(table: impl Into<String>, source: connectors::error::Error) -> Self {
        MigrationError::Table {
            table: table.into(),
            source,
        }
    }

    pub fn schema(phase: &'static str, source: connectors::error::Error) -> Self {
        MigrationError::Schema { phase, source }
    }
}
