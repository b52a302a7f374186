//! The worker's pre-allocated "queue was full" notice.
//!
//! [`crate::config::PoolExhaustionStrategy::DropLogMessageAndNotifyAppenders`]
//! still has to get a message to the caller's appenders even though the
//! resource that ran out is the very pool a normal record would be built in.
//! [`PendingNotice`] is the cheap, lock-free side a producer touches on the
//! hot path; [`NoticeBuffer`] is the one [`crate::buffer::RecordData`] the
//! worker owns outside [`crate::buffer::BufferPool`] to synthesize the
//! notice and carry it through the normal resolve/format/write pipeline.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::thread::ThreadId;

use crate::buffer::RecordData;
use crate::level::Level;

const SENTINEL_LOGGER_ID: u32 = u32::MAX;
const NOTICE_MESSAGE: &str = "log message pool exhausted, records dropped:";
const NOTICE_BUFFER_SIZE: usize = 24;
const NOTICE_STRING_CAPACITY: usize = 1;

/// Lock-free drop counter a producer bumps when a record is dropped under
/// `DropLogMessageAndNotifyAppenders`. Several producers may race to set
/// this concurrently; the worker only needs to know a drop happened, for
/// which logger, and how many times, not which specific record was lost.
pub struct PendingNotice {
    logger_id: AtomicU32,
    dropped: AtomicU64,
}

impl PendingNotice {
    pub fn new() -> Self {
        PendingNotice {
            logger_id: AtomicU32::new(SENTINEL_LOGGER_ID),
            dropped: AtomicU64::new(0),
        }
    }

    /// Called from the producer side the moment a record is dropped.
    pub fn record_drop(&self, logger_id: u32) {
        self.logger_id.store(logger_id, Ordering::Relaxed);
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Drains the pending count. Returns `None` when nothing is owed.
    fn take(&self) -> Option<(u32, u64)> {
        let dropped = self.dropped.swap(0, Ordering::Relaxed);
        if dropped == 0 {
            return None;
        }
        let logger_id = self.logger_id.swap(SENTINEL_LOGGER_ID, Ordering::Relaxed);
        Some((logger_id, dropped))
    }
}

impl Default for PendingNotice {
    fn default() -> Self {
        Self::new()
    }
}

/// The worker's own constant-message buffer, sized just for the fixed
/// notice text plus one count argument. Never drawn from
/// [`crate::buffer::BufferPool`], so it stays available precisely when the
/// pool is the resource that's exhausted.
pub struct NoticeBuffer {
    record: RecordData,
}

impl NoticeBuffer {
    pub fn new() -> Self {
        NoticeBuffer {
            record: RecordData::new(NOTICE_BUFFER_SIZE, NOTICE_STRING_CAPACITY),
        }
    }

    /// Synthesizes the next owed notice into this buffer's record, if any is
    /// pending, and returns a reference to it for delivery.
    pub fn synthesize(&mut self, pending: &PendingNotice, thread_id: ThreadId) -> Option<&RecordData> {
        let (logger_id, dropped) = pending.take()?;
        self.record.begin(Level::Warn, logger_id, thread_id, None, Some(NOTICE_MESSAGE));
        let mut writer = self.record.writer();
        writer.append_u64(dropped);
        let len = writer.len();
        let truncated = writer.truncated();
        self.record.finish(len, truncated);
        Some(&self.record)
    }
}

impl Default for NoticeBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_notice_pending_synthesizes_nothing() {
        let pending = PendingNotice::new();
        let mut buffer = NoticeBuffer::new();
        assert!(buffer.synthesize(&pending, std::thread::current().id()).is_none());
    }

    #[test]
    fn pending_drops_are_coalesced_into_one_notice() {
        let pending = PendingNotice::new();
        pending.record_drop(3);
        pending.record_drop(3);
        pending.record_drop(3);
        let mut buffer = NoticeBuffer::new();
        let record = buffer
            .synthesize(&pending, std::thread::current().id())
            .expect("three drops should yield one pending notice");
        assert_eq!(record.logger_id, 3);
        assert_eq!(record.message_template, Some(NOTICE_MESSAGE));
        assert!(!record.arg_bytes().is_empty());

        // Draining clears the counter until another drop occurs.
        assert!(buffer.synthesize(&pending, std::thread::current().id()).is_none());
    }
}
