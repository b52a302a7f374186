//! The fixed-layout record held inside each pooled buffer.

use std::thread::ThreadId;
use std::time::SystemTime;

use crate::buffer::argument::{ArgString, ArgumentWriter};
use crate::level::Level;

/// One log record's metadata and argument payload.
///
/// Sized once at pool construction (see [`crate::config::PoolConfig`]) and
/// reused for the lifetime of the process; logging a record only ever
/// overwrites an existing `RecordData` in place, never allocates one.
pub struct RecordData {
    pub level: Level,
    pub timestamp: SystemTime,
    pub logger_id: u32,
    pub thread_id: ThreadId,
    pub thread_name: Option<ArgString>,
    pub message_template: Option<&'static str>,
    pub truncated: bool,
    arg_bytes: Vec<u8>,
    arg_len: usize,
    refs: Vec<Option<ArgString>>,
}

impl RecordData {
    pub fn new(buffer_size: usize, string_capacity: usize) -> Self {
        RecordData {
            level: Level::Info,
            timestamp: SystemTime::UNIX_EPOCH,
            logger_id: 0,
            thread_id: std::thread::current().id(),
            thread_name: None,
            message_template: None,
            truncated: false,
            arg_bytes: vec![0u8; buffer_size],
            arg_len: 0,
            refs: vec![None; string_capacity],
        }
    }

    /// Resets all fields to start encoding a new record in this slot.
    pub fn begin(
        &mut self,
        level: Level,
        logger_id: u32,
        thread_id: ThreadId,
        thread_name: Option<ArgString>,
        message_template: Option<&'static str>,
    ) {
        self.level = level;
        self.timestamp = SystemTime::now();
        self.logger_id = logger_id;
        self.thread_id = thread_id;
        self.thread_name = thread_name;
        self.message_template = message_template;
        self.truncated = false;
        self.arg_len = 0;
        for slot in &mut self.refs {
            *slot = None;
        }
    }

    /// Borrows an [`ArgumentWriter`] over this record's argument region for
    /// the producer to append typed arguments into.
    pub fn writer(&mut self) -> ArgumentWriter<'_> {
        ArgumentWriter::new(&mut self.arg_bytes, &mut self.refs)
    }

    /// Finalizes the record after the writer has appended all arguments.
    pub fn finish(&mut self, written_len: usize, truncated: bool) {
        self.arg_len = written_len;
        self.truncated = truncated;
    }

    pub fn arg_bytes(&self) -> &[u8] {
        &self.arg_bytes[..self.arg_len]
    }

    pub fn refs(&self) -> &[Option<ArgString>] {
        &self.refs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_resets_previous_contents() {
        let mut record = RecordData::new(64, 4);
        {
            let mut w = record.writer();
            w.append_i32(7);
            let len = w.len();
            record.finish(len, false);
        }
        assert_eq!(record.arg_bytes().len(), 5);

        record.begin(Level::Warn, 1, std::thread::current().id(), None, None);
        assert_eq!(record.arg_bytes().len(), 0);
        assert_eq!(record.level, Level::Warn);
    }
}
