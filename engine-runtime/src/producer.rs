//! The reader task wrapper (§4.5 step 2): drives a `Reader` into the
//! bounded queue, accumulating rows into batches capped at `rows`/`bytes`
//! and flushing the final partial batch once the source is exhausted.

use crate::error::RuntimeError;
use crate::queue::QueueSender;
use connectors::reader::{EmitControl, Reader};
use engine_core::stats::{Stats, StatsLabelHandle};
use model::options::BatchConfig;
use model::row::{Batch, Row};
use std::sync::{Arc, Mutex};

struct ProducerState {
    current: Batch,
    next_ordinal: u64,
}

/// Runs `reader` to completion, pushing full batches onto `queue` as they
/// fill and flushing the trailing partial batch at the end (§4.5 step 4).
/// Returns once the source is exhausted or the writer signals cancellation
/// by aborting the queue (§4.4 Cancellation).
pub async fn produce(
    mut reader: Box<dyn Reader>,
    queue: QueueSender,
    batch_config: BatchConfig,
    stats: Stats,
    table: &str,
    label: &str,
) -> Result<(), RuntimeError> {
    let sink = StatsLabelHandle::new(stats.clone(), label.to_string());
    let state = Arc::new(Mutex::new(ProducerState {
        current: Batch::new(0),
        next_ordinal: 0,
    }));

    let cancelled = {
        let state = state.clone();
        let queue_handle = queue.clone();
        let rows_limit = batch_config.rows;
        let bytes_limit = batch_config.bytes;
        let mut emit = move |row: Row| -> connectors::reader::BoxEmitFuture {
            let state = state.clone();
            let queue_handle = queue_handle.clone();
            Box::pin(async move {
                let ready_batch = {
                    let mut guard = state.lock().expect("producer state mutex poisoned");
                    guard.current.rows.push(row);
                    let full = guard.current.len() >= rows_limit
                        || guard.current.byte_size() >= bytes_limit;
                    if full {
                        let next_start = guard.next_ordinal + guard.current.len() as u64;
                        let finished =
                            std::mem::replace(&mut guard.current, Batch::new(next_start));
                        guard.next_ordinal = next_start;
                        Some(finished)
                    } else {
                        None
                    }
                };

                match ready_batch {
                    Some(batch) => match queue_handle.push(batch).await {
                        Ok(()) => EmitControl::Continue,
                        Err(_dropped) => EmitControl::Cancel,
                    },
                    None => EmitControl::Continue,
                }
            })
        };

        reader
            .map_rows(&sink, &mut emit)
            .await
            .map_err(|e| RuntimeError::reader(table, e))?;

        queue.cancel_token().is_cancelled()
    };

    let remaining = {
        let mut guard = state.lock().expect("producer state mutex poisoned");
        std::mem::take(&mut guard.current)
    };

    if !remaining.is_empty() && !cancelled {
        let _ = queue.push(remaining).await;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use model::progress::ProgressSink;

    struct FixedRowsReader {
        columns: Vec<String>,
        rows: Vec<Row>,
    }

    #[async_trait]
    impl Reader for FixedRowsReader {
        fn columns(&self) -> &[String] {
            &self.columns
        }

        async fn map_rows(
            &mut self,
            stats: &dyn ProgressSink,
            emit: &mut (dyn FnMut(Row) -> connectors::reader::BoxEmitFuture + Send),
        ) -> Result<(), connectors::error::Error> {
            for row in self.rows.drain(..) {
                stats.inc_read(1);
                let control = emit(row).await;
                if control == EmitControl::Cancel {
                    return Ok(());
                }
                stats.inc_rows(1);
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn flushes_full_batches_and_trailing_partial_batch() {
        let (tx, mut rx) = crate::queue::channel(4);
        let reader: Box<dyn Reader> = Box::new(FixedRowsReader {
            columns: vec!["id".into()],
            rows: (0..5).map(|_| Row::null(1)).collect(),
        });
        let stats = Stats::new();
        let batch_config = BatchConfig {
            rows: 2,
            bytes: usize::MAX,
            concurrent_batches: 4,
        };

        let handle =
            tokio::spawn(
                async move { produce(reader, tx, batch_config, stats, "t", "Load t").await },
            );

        let mut received = 0;
        let mut batch_count = 0;
        while let Some(batch) = rx.recv().await {
            received += batch.len();
            batch_count += 1;
        }
        handle.await.unwrap().unwrap();
        assert_eq!(received, 5);
        assert_eq!(batch_count, 3);
    }

    #[tokio::test]
    async fn empty_source_flushes_nothing() {
        let (tx, mut rx) = crate::queue::channel(4);
        let reader: Box<dyn Reader> = Box::new(FixedRowsReader {
            columns: vec!["id".into()],
            rows: vec![],
        });
        let stats = Stats::new();
        let handle = tokio::spawn(async move {
            produce(reader, tx, BatchConfig::default(), stats, "t", "Load t").await
        });
        assert!(rx.recv().await.is_none());
        handle.await.unwrap().unwrap();
    }
}
