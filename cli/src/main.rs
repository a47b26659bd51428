mod error;
mod table;

use clap::Parser;
use engine_config::schema_orchestrator::{CompleteOptions, PrepareOptions};
use engine_core::stats::Stats;
use engine_runtime::index_kernel;
use engine_runtime::pipeline::run_table_pipeline;
use error::CliError;
use model::options::BatchConfig;
use model::schema::{IndexSpec, TableSpec};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Streaming bulk loader: moves tabular data from a source (MySQL or a
/// fixed-width text file) into PostgreSQL over the COPY wire protocol,
/// driven by a migration configuration document (§6).
#[derive(Parser, Debug)]
#[command(name = "stratum-migrate", version)]
struct Args {
    /// Path to the migration configuration TOML document.
    #[arg(short, long)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "migration run failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), CliError> {
    let args = Args::parse();
    let config = engine_config::config::load(
        args.config
            .to_str()
            .ok_or_else(|| CliError::Config("config path is not valid UTF-8".to_string()))?,
    )?;

    let target = engine_config::dsn::parse_postgres_dsn(&config.target.dsn)?;
    let stats = Stats::new();

    let mut table_specs: Vec<TableSpec> = config
        .tables
        .iter()
        .map(table::build_table_spec)
        .collect::<Result<_, _>>()?;

    info!(tables = table_specs.len(), "prepare phase starting");
    engine_config::schema_orchestrator::prepare(
        &target,
        &mut table_specs,
        &[],
        PrepareOptions {
            include_drop: config.run.include_drop,
            data_only: config.run.data_only,
        },
        &stats,
    )
    .await?;

    let batch_config = BatchConfig {
        rows: config.run.batch_rows,
        bytes: config.run.batch_bytes,
        concurrent_batches: config.run.concurrent_batches,
    };

    // Index builds run as their own spawned tasks so a table's indexes are
    // under construction on the server while the *next* table's reader and
    // writer are already streaming rows (§1 "running index rebuilds in
    // parallel with row loading", §4.6). All of them are joined just once,
    // right before the complete phase needs their results.
    let mut index_handles = Vec::new();
    let mut built_indexes: Vec<IndexSpec> = Vec::new();

    for (table_config, table_spec) in config.tables.iter().zip(table_specs.iter()) {
        info!(table = %table_spec.qualified_name(), "loading table");
        let reader = table::build_table_reader(table_config)?;
        let copy_options = table::build_copy_options(table_config);

        run_table_pipeline(
            reader,
            &target,
            &config.target.session_settings,
            table_spec,
            &copy_options,
            batch_config,
            stats.clone(),
        )
        .await?;

        let indexes = table::build_table_indexes(table_config, table_spec);
        if !indexes.is_empty() {
            let target = target.clone();
            let stats = stats.clone();
            let table_name = table_spec.qualified_name();
            index_handles.push((
                table_name,
                tokio::spawn(async move { index_kernel::build_indexes(&target, indexes, 4, &stats).await }),
            ));
        }
    }

    for (table_name, handle) in index_handles {
        let outcome = handle
            .await
            .expect("index build task panicked; see logs above for the panic message");
        if !outcome.failed.is_empty() {
            error!(table = %table_name, failed = outcome.failed.len(), "some index builds failed");
        }
        built_indexes.extend(outcome.succeeded);
    }

    info!("complete phase starting");
    engine_config::schema_orchestrator::complete(
        &target,
        &table_specs,
        &built_indexes,
        &[],
        &[],
        CompleteOptions {
            reset_sequences: config.run.reset_sequences,
            data_only: config.run.data_only,
        },
        &stats,
    )
    .await?;

    println!("{}", engine_config::report::render(&stats));
    Ok(())
}
