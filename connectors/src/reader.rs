use crate::error::Error;
use async_trait::async_trait;
use model::progress::ProgressSink;
use model::row::Row;

/// Whether the caller of `emit` should keep producing rows.
///
/// `emit_fn` (here, a closure returning a future) yields this so a reader
/// can promptly release its source handle when the writer has already
/// failed (§4.4 Cancellation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitControl {
    Continue,
    Cancel,
}

/// The abstract source-reading contract (§4.4). A concrete reader drives
/// its own traversal and calls `emit` once per row; `emit` is the only
/// thing that can suspend the reader (it awaits a bounded channel send,
/// the backpressure mechanism), and its return value tells the reader
/// whether to keep going.
#[async_trait]
pub trait Reader: Send {
    /// Column order this reader's rows are aligned to; also the order the
    /// writer's `COPY` column list must match.
    fn columns(&self) -> &[String];

    /// Drive the source, calling `emit` once per row. Returns once the
    /// source is exhausted or `emit` signals cancellation. Per-row
    /// decode/parse errors must be handled internally (substitute NULL,
    /// log, continue) — they never reach the caller as an `Err`. Only a
    /// fatal, source-level error (lost connection, missing table) is
    /// returned as `Err`.
    async fn map_rows(
        &mut self,
        stats: &dyn ProgressSink,
        emit: &mut (dyn FnMut(Row) -> BoxEmitFuture + Send),
    ) -> Result<(), Error>;
}

pub type BoxEmitFuture =
    std::pin::Pin<Box<dyn std::future::Future<Output = EmitControl> + Send>>;
