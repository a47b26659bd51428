//! The per-table pipeline runtime (§4.5, §2 item 5): opens the bounded
//! queue, spawns the reader task, drives the writer on the current task,
//! joins, and surfaces the first fatal error.

use crate::error::RuntimeError;
use crate::queue;
use crate::{producer, writer};
use connectors::reader::Reader;
use engine_core::stats::Stats;
use model::options::{BatchConfig, CopyOptions};
use model::schema::{ConnectionSpec, TableSpec};

pub struct PipelineOutcome {
    pub rows: u64,
    pub errs: u64,
}

/// Runs one table's migration end to end (§4.5 Lifecycle steps 1-6).
/// `reader` and `writer` run as two cooperating tasks over a bounded queue
/// of capacity `batch_config.concurrent_batches`; a fatal error from either
/// side closes the queue so the other side unwinds promptly.
pub async fn run_table_pipeline(
    reader: Box<dyn Reader>,
    target: &ConnectionSpec,
    session_settings: &[(String, String)],
    table: &TableSpec,
    options: &CopyOptions,
    batch_config: BatchConfig,
    stats: Stats,
) -> Result<PipelineOutcome, RuntimeError> {
    let (tx, rx) = queue::channel(batch_config.concurrent_batches);
    let label = format!("Load {}", table.qualified_name());
    let table_name = table.qualified_name();

    let producer_handle = {
        let stats = stats.clone();
        let label = label.clone();
        let table_name = table_name.clone();
        tokio::spawn(async move {
            producer::produce(reader, tx, batch_config, stats, &table_name, &label).await
        })
    };

    let writer_result = writer::copy_from_queue(
        target,
        session_settings,
        table,
        &label,
        rx,
        options,
        &stats,
    )
    .await;

    let producer_result = producer_handle
        .await
        .expect("producer task panicked; see logs above for the panic message");

    // The writer's fatal error, if any, takes priority: it is what caused
    // the queue to abort in the first place (§4.5 step 6).
    match writer_result {
        Err(err) => Err(err),
        Ok(outcome) => producer_result.map(|()| PipelineOutcome {
            rows: outcome.rows,
            errs: outcome.errs,
        }),
    }
}
