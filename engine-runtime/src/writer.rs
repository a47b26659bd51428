//! The PostgreSQL writer (§4.3): drains a table's bounded queue, streaming
//! each `Batch` through `COPY … FROM STDIN` on a dedicated session, one
//! transaction per batch, with batch-split retry on recoverable failures.

use crate::error::RuntimeError;
use crate::queue::QueueReceiver;
use connectors::postgres::session::PgSession;
use engine_core::retry::{open_session_with_retry, RetryPolicy};
use engine_core::stats::{Stats, StatsLabelHandle};
use model::options::CopyOptions;
use model::row::Batch;
use model::schema::{ConnectionSpec, TableSpec};
use std::future::Future;
use std::pin::Pin;
use tracing::warn;

pub struct WriterOutcome {
    pub rows: u64,
    pub errs: u64,
}

/// Startup sequence (§4.3): open session, apply settings, optionally
/// truncate and disable triggers before the first batch, then drain the
/// queue until it closes. Triggers are always re-enabled on the way out,
/// success or failure.
pub async fn copy_from_queue(
    target: &ConnectionSpec,
    session_settings: &[(String, String)],
    table: &TableSpec,
    label: &str,
    mut queue: QueueReceiver,
    options: &CopyOptions,
    stats: &Stats,
) -> Result<WriterOutcome, RuntimeError> {
    let qualified = table.qualified_name();
    let mut session = open_session_with_retry(target, &RetryPolicy::default())
        .await
        .map_err(|e| RuntimeError::writer(&qualified, e))?;
    session
        .apply_settings(session_settings, false)
        .await
        .map_err(|e| RuntimeError::writer(&qualified, e))?;

    let sink = StatsLabelHandle::new(stats.clone(), label.to_string());

    if options.truncate {
        let sql = planner::ddl::truncate_table(table);
        session
            .exec_timed(label, &sql, &sink)
            .await
            .map_err(|e| RuntimeError::writer(&qualified, e))?;
    }

    if options.disable_triggers {
        let sql = planner::ddl::disable_triggers(table);
        session
            .exec_timed(label, &sql, &sink)
            .await
            .map_err(|e| RuntimeError::writer(&qualified, e))?;
    }

    let drain_result = drain(&mut session, &qualified, label, &mut queue, options, stats).await;

    if options.disable_triggers {
        let sql = planner::ddl::enable_triggers(table);
        if let Err(err) = session.exec_timed(label, &sql, &sink).await {
            warn!(table = %qualified, %err, "failed to re-enable triggers after load");
        }
    }

    drain_result
}

async fn drain(
    session: &mut PgSession,
    qualified: &str,
    label: &str,
    queue: &mut QueueReceiver,
    options: &CopyOptions,
    stats: &Stats,
) -> Result<WriterOutcome, RuntimeError> {
    let mut rows_total = 0u64;
    let mut errs_total = 0u64;

    while let Some(batch) = queue.recv().await {
        match write_batch(session, qualified, &options.columns, batch, label, stats).await {
            Ok((rows, errs)) => {
                rows_total += rows;
                errs_total += errs;
            }
            Err(err) => {
                queue.abort();
                return Err(RuntimeError::writer(qualified.to_string(), err));
            }
        }
    }

    Ok(WriterOutcome {
        rows: rows_total,
        errs: errs_total,
    })
}

/// Recursive batch-split on recoverable failure (§4.3 Failure handling):
/// halves a failing batch until it bottoms out at single rows, bounding the
/// worst case to O(log2(batch_rows)) COPY attempts. A non-`Database` error
/// (e.g. connection lost) is fatal and propagates immediately.
fn write_batch<'a>(
    session: &'a mut PgSession,
    table: &'a str,
    columns: &'a [String],
    batch: Batch,
    label: &'a str,
    stats: &'a Stats,
) -> Pin<Box<dyn Future<Output = Result<(u64, u64), connectors::error::Error>> + Send + 'a>> {
    Box::pin(async move {
        let _timer = stats.scoped_timer(label);
        let len = batch.len();
        match connectors::postgres::copy::copy_batch(session, table, columns, &batch).await {
            Ok(accepted) => {
                stats.incr_rows(label, accepted as i64);
                Ok((accepted, 0))
            }
            Err(err) if err.is_recoverable_in_writer() => {
                if len > 1 {
                    let (first, second) = batch.split();
                    let (r1, e1) = write_batch(session, table, columns, first, label, stats).await?;
                    let (r2, e2) = write_batch(session, table, columns, second, label, stats).await?;
                    Ok((r1 + r2, e1 + e2))
                } else {
                    warn!(table, %err, "dropping row after batch split reached length 1");
                    stats.incr_errs(label, 1);
                    Ok((0, 1))
                }
            }
            Err(err) => Err(err),
        }
    })
}
