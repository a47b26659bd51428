use thiserror::Error;

/// The top-level error surfaced by `main` (§7 Propagation policy): any
/// variant maps to a non-zero process exit (§6 Exit codes).
#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Source(#[from] connectors::error::Error),

    #[error(transparent)]
    Migration(#[from] engine_core::error::MigrationError),

    #[error(transparent)]
    Runtime(#[from] engine_runtime::error::RuntimeError),

    #[error(transparent)]
    LoadConfig(#[from] engine_config::config::ConfigError),

    #[error(transparent)]
    Dsn(#[from] engine_config::dsn::DsnError),
}
