//! The bounded `Batch` queue shared by a table's reader and writer tasks
//! (§4.5, §5 Concurrency & resource model). Capacity equals
//! `concurrent_batches`; closing carries an explicit abort marker via
//! `tokio_util::sync::CancellationToken`, matching the teacher's
//! cancellation idiom (SPEC_FULL.md §5).

use model::row::Batch;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// The producer-side handle: only this side may push batches. Cloneable so
/// the reader task's `emit` closure can hold its own handle while the
/// driving function keeps one to flush the final partial batch.
#[derive(Clone)]
pub struct QueueSender {
    tx: mpsc::Sender<Batch>,
    cancel: CancellationToken,
}

/// The consumer-side handle: only this side may pop batches and trigger an
/// abort.
pub struct QueueReceiver {
    rx: mpsc::Receiver<Batch>,
    cancel: CancellationToken,
}

pub fn channel(capacity: usize) -> (QueueSender, QueueReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let cancel = CancellationToken::new();
    (
        QueueSender {
            tx,
            cancel: cancel.clone(),
        },
        QueueReceiver { rx, cancel },
    )
}

impl QueueSender {
    /// Pushes `batch`, suspending the caller while the queue is full (the
    /// backpressure mechanism, §4.4). Returns the batch back to the caller
    /// if the queue has been aborted or the receiver has been dropped, so
    /// the producer can stop without losing the in-flight batch silently.
    pub async fn push(&self, batch: Batch) -> Result<(), Batch> {
        if self.cancel.is_cancelled() {
            return Err(batch);
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(batch),
            result = self.tx.send(batch) => result.map_err(|e| e.0),
        }
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl QueueReceiver {
    /// Pops the next batch, or `None` once the queue is closed (producer
    /// dropped its sender) or aborted.
    pub async fn recv(&mut self) -> Option<Batch> {
        if self.cancel.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            item = self.rx.recv() => item,
        }
    }

    /// Signals an abort: the producer observes this on its next push and
    /// returns; this receiver's `recv` also starts returning `None`
    /// immediately (§4.5 Cancellation).
    pub fn abort(&self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::row::Row;

    #[tokio::test]
    async fn pushed_batch_is_received_in_order() {
        let (tx, mut rx) = channel(2);
        tx.push(Batch::new(0)).await.unwrap();
        tx.push(Batch::new(1)).await.unwrap();
        drop(tx);
        assert_eq!(rx.recv().await.unwrap().start_ordinal, 0);
        assert_eq!(rx.recv().await.unwrap().start_ordinal, 1);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn abort_unblocks_pending_push_and_recv() {
        let (tx, rx) = channel(1);
        rx.abort();
        let result = tx.push(Batch::new(0)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn batch_with_rows_round_trips() {
        let (tx, mut rx) = channel(1);
        let mut batch = Batch::new(0);
        batch.rows.push(Row::null(2));
        tx.push(batch).await.unwrap();
        let received = rx.recv().await.unwrap();
        assert_eq!(received.len(), 1);
    }
}
