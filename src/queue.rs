//! The multi-producer, single-consumer FIFO carrying buffer handles from
//! producer threads to the worker.
//!
//! Grounded on the channel-based handoff used for non-`Copy` payloads in the
//! pack's binary-logger reference: a bounded `std::sync::mpsc::sync_channel`
//! gives wait-free enqueue under normal load (the channel's internal buffer
//! is sized to the pool, so it only ever blocks if the pool itself would
//! have refused an acquire) and preserves per-thread FIFO order, matching
//! §4.3 and §5's ordering guarantees without a hand-rolled MPSC ring buffer.

use std::sync::mpsc::{Receiver, SyncSender, TrySendError};

use crate::buffer::BufferHandle;

/// Producer-side handle for enqueuing completed records.
#[derive(Clone)]
pub struct QueueSender {
    inner: SyncSender<BufferHandle>,
}

/// Worker-side handle for draining records in submission order.
pub struct QueueReceiver {
    inner: Receiver<BufferHandle>,
}

/// Why [`QueueSender::try_send`] could not enqueue a handle.
pub enum SendOutcome {
    Sent,
    /// The channel is at capacity. Does not happen under the documented
    /// invariant that capacity ≥ pool size, but is surfaced rather than
    /// panicking in case a caller mis-sizes the queue.
    Full(BufferHandle),
    /// The worker has shut down and dropped its receiver.
    Closed,
}

/// Builds a bounded record queue with the given capacity.
///
/// §4.3 requires capacity at least the pool size so that a producer holding
/// an acquired buffer can always enqueue it.
pub fn bounded(capacity: usize) -> (QueueSender, QueueReceiver) {
    let (tx, rx) = std::sync::mpsc::sync_channel(capacity.max(1));
    (QueueSender { inner: tx }, QueueReceiver { inner: rx })
}

impl QueueSender {
    pub fn try_send(&self, handle: BufferHandle) -> SendOutcome {
        match self.inner.try_send(handle) {
            Ok(()) => SendOutcome::Sent,
            Err(TrySendError::Full(handle)) => SendOutcome::Full(handle),
            Err(TrySendError::Disconnected(_)) => SendOutcome::Closed,
        }
    }
}

impl QueueReceiver {
    /// Blocks until a record is available or every sender has dropped.
    pub fn recv(&self) -> Option<BufferHandle> {
        self.inner.recv().ok()
    }

    /// Blocks for at most `timeout` for the next record, used by the worker
    /// to implement its idle-flush backoff from §4.4.
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<BufferHandle> {
        self.inner.recv_timeout(timeout).ok()
    }

    /// Drains whatever is currently queued without blocking, used while
    /// draining on shutdown.
    pub fn drain_available(&self) -> Vec<BufferHandle> {
        self.inner.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufferPool;
    use crate::config::PoolConfig;

    #[test]
    fn preserves_single_thread_fifo_order() {
        let pool = BufferPool::new(&PoolConfig {
            pool_size: 4,
            buffer_size: 16,
            string_capacity: 2,
        });
        let (tx, rx) = bounded(4);
        for i in 0..4u32 {
            let mut handle = pool.try_acquire().unwrap();
            handle.record_mut().logger_id = i;
            assert!(matches!(tx.try_send(handle), SendOutcome::Sent));
        }
        for i in 0..4u32 {
            let handle = rx.recv().unwrap();
            assert_eq!(handle.record().logger_id, i);
            handle.release();
        }
    }

    #[test]
    fn closed_after_sender_dropped() {
        let pool = BufferPool::new(&PoolConfig {
            pool_size: 1,
            buffer_size: 16,
            string_capacity: 1,
        });
        let (tx, rx) = bounded(1);
        drop(tx);
        let _ = pool;
        assert!(rx.recv().is_none());
    }
}
