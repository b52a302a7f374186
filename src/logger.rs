//! The producer-facing façade: [`LoggerHandle`] and [`LogRecordBuilder`].
//!
//! Named out of the core's protocol-defining scope, but still the thing
//! every caller actually touches: `begin_record` honors the pool-exhaustion
//! policy from §4.2, and every `append_*` on the builder is a thin pass
//! through to [`crate::buffer::ArgumentWriter`] so the hot path stays
//! allocation-free end to end.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::buffer::{ArgString, BufferHandle, BufferPool, EnumValue};
use crate::config::PoolExhaustionStrategy;
use crate::level::Level;
use crate::notice::PendingNotice;
use crate::queue::{QueueSender, SendOutcome};
use crate::resolver::Resolver;

/// Registry of logger names, indexed by the compact `logger_id` stored in
/// each record. Append-only: names are never removed, only ever added the
/// first time a given dotted name is requested.
pub struct LoggerRegistry {
    names: parking_lot::RwLock<Vec<Arc<str>>>,
}

impl LoggerRegistry {
    pub fn new() -> Self {
        LoggerRegistry {
            names: parking_lot::RwLock::new(Vec::new()),
        }
    }

    pub fn intern(&self, name: &str) -> (u32, Arc<str>) {
        if let Some((id, existing)) = self
            .names
            .read()
            .iter()
            .enumerate()
            .find(|(_, n)| n.as_ref() == name)
        {
            return (id as u32, existing.clone());
        }
        let mut guard = self.names.write();
        if let Some((id, existing)) = guard.iter().enumerate().find(|(_, n)| n.as_ref() == name) {
            return (id as u32, existing.clone());
        }
        let arc: Arc<str> = Arc::from(name);
        guard.push(arc.clone());
        ((guard.len() - 1) as u32, arc)
    }

    pub fn name_of(&self, id: u32) -> Option<Arc<str>> {
        self.names.read().get(id as usize).cloned()
    }

    /// Snapshot of every interned logger name, for the worker's periodic
    /// flush/close sweeps.
    pub fn all_names(&self) -> Vec<Arc<str>> {
        self.names.read().clone()
    }
}

impl Default for LoggerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// An obtained reference to a named logger.
///
/// Holds a cached effective level refreshed on the resolver's "updated"
/// event (see [`crate::manager::LogManager::notify_resolver_updated`]) so
/// the hot-path enabled check is a single atomic load and compare.
pub struct LoggerHandle {
    name: Arc<str>,
    logger_id: u32,
    cached_level: Arc<AtomicU8>,
    resolver: Arc<Resolver>,
    pool: BufferPool,
    queue: QueueSender,
    pending_notice: Arc<PendingNotice>,
}

impl LoggerHandle {
    pub(crate) fn new(
        name: Arc<str>,
        logger_id: u32,
        cached_level: Arc<AtomicU8>,
        resolver: Arc<Resolver>,
        pool: BufferPool,
        queue: QueueSender,
        pending_notice: Arc<PendingNotice>,
    ) -> Self {
        LoggerHandle {
            name,
            logger_id,
            cached_level,
            resolver,
            pool,
            queue,
            pending_notice,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Single-compare hot-path check against the cached effective level.
    pub fn is_enabled(&self, level: Level) -> bool {
        level >= Level::from_u8(self.cached_level.load(Ordering::Relaxed))
    }

    /// Begins a record at `level`, honoring the pool-exhaustion strategy in
    /// effect for this logger. Returns `None` when the logger is disabled
    /// or the record was dropped.
    pub fn begin_record(&self, level: Level, message_template: Option<&'static str>) -> Option<LogRecordBuilder> {
        if !self.is_enabled(level) {
            return None;
        }
        let resolved = self.resolver.resolve(&self.name);
        let handle = match self.pool.try_acquire() {
            Some(handle) => handle,
            None => match resolved.pool_exhaustion_strategy {
                PoolExhaustionStrategy::DropLogMessage => return None,
                PoolExhaustionStrategy::DropLogMessageAndNotifyAppenders => {
                    tracing::warn!(logger = %self.name, "log message pool exhausted, dropping record");
                    self.pending_notice.record_drop(self.logger_id);
                    return None;
                }
                PoolExhaustionStrategy::WaitUntilAvailable => self.wait_for_buffer()?,
            },
        };
        Some(self.finish_begin(handle, level, message_template))
    }

    fn wait_for_buffer(&self) -> Option<BufferHandle> {
        let mut spins = 0;
        loop {
            if let Some(handle) = self.pool.try_acquire() {
                return Some(handle);
            }
            spins += 1;
            if spins < 64 {
                std::hint::spin_loop();
            } else {
                std::thread::sleep(Duration::from_micros(200));
            }
            // No upper bound on the wait itself (matches "block until available");
            // shutdown unblocks producers by having the worker keep draining and
            // releasing buffers until the pool empties out naturally.
        }
    }

    fn finish_begin(
        &self,
        mut handle: BufferHandle,
        level: Level,
        message_template: Option<&'static str>,
    ) -> LogRecordBuilder {
        let thread_name = cached_thread_name();
        handle.record_mut().begin(
            level,
            self.logger_id,
            std::thread::current().id(),
            thread_name,
            message_template,
        );
        LogRecordBuilder {
            handle: Some(handle),
            queue: self.queue.clone(),
        }
    }
}

thread_local! {
    /// The current thread's name, interned once and cloned (refcount bump,
    /// not a copy) on every subsequent record from this thread — allocating
    /// it per record would violate the producer path's no-allocation
    /// contract for every named worker/application thread.
    static THREAD_NAME: Option<ArgString> = std::thread::current()
        .name()
        .map(|n| ArgString::Shared(Arc::from(n)));
}

fn cached_thread_name() -> Option<ArgString> {
    THREAD_NAME.with(|name| name.clone())
}

/// Accumulates typed arguments for one record, then [`LogRecordBuilder::submit`]s
/// it to the queue.
pub struct LogRecordBuilder {
    handle: Option<BufferHandle>,
    queue: QueueSender,
}

macro_rules! append_method {
    ($name:ident, $ty:ty) => {
        pub fn $name(&mut self, value: $ty) -> &mut Self {
            if let Some(handle) = &mut self.handle {
                let mut writer = handle.record_mut().writer();
                writer.$name(value);
                let len = writer.len();
                let truncated = writer.truncated();
                handle.record_mut().finish(len, truncated);
            }
            self
        }
    };
}

impl LogRecordBuilder {
    append_method!(append_bool, bool);
    append_method!(append_u8, u8);
    append_method!(append_i8, i8);
    append_method!(append_char, char);
    append_method!(append_i16, i16);
    append_method!(append_u16, u16);
    append_method!(append_i32, i32);
    append_method!(append_u32, u32);
    append_method!(append_i64, i64);
    append_method!(append_u64, u64);
    append_method!(append_f32, f32);
    append_method!(append_f64, f64);
    append_method!(append_isize, isize);
    append_method!(append_usize, usize);
    append_method!(append_guid, Uuid);

    pub fn append_string(&mut self, value: impl Into<ArgString>) -> &mut Self {
        if let Some(handle) = &mut self.handle {
            let mut writer = handle.record_mut().writer();
            writer.append_string_ref(value, None);
            let len = writer.len();
            let truncated = writer.truncated();
            handle.record_mut().finish(len, truncated);
        }
        self
    }

    pub fn append_string_with_format(&mut self, value: impl Into<ArgString>, format_spec: &'static str) -> &mut Self {
        if let Some(handle) = &mut self.handle {
            let mut writer = handle.record_mut().writer();
            writer.append_string_ref(value, Some(format_spec));
            let len = writer.len();
            let truncated = writer.truncated();
            handle.record_mut().finish(len, truncated);
        }
        self
    }

    pub fn append_utf8_span(&mut self, value: &str) -> &mut Self {
        if let Some(handle) = &mut self.handle {
            let mut writer = handle.record_mut().writer();
            writer.append_utf8_span(value);
            let len = writer.len();
            let truncated = writer.truncated();
            handle.record_mut().finish(len, truncated);
        }
        self
    }

    pub fn append_utf16_span(&mut self, value: &[u16]) -> &mut Self {
        if let Some(handle) = &mut self.handle {
            let mut writer = handle.record_mut().writer();
            writer.append_utf16_span(value);
            let len = writer.len();
            let truncated = writer.truncated();
            handle.record_mut().finish(len, truncated);
        }
        self
    }

    pub fn append_enum(&mut self, value: EnumValue) -> &mut Self {
        if let Some(handle) = &mut self.handle {
            let mut writer = handle.record_mut().writer();
            writer.append_enum(value);
            let len = writer.len();
            let truncated = writer.truncated();
            handle.record_mut().finish(len, truncated);
        }
        self
    }

    /// Appends a `KeyString` marker for `key`, then runs `value` to append
    /// the value it tags (e.g. `.append_key_value("count", |b| { b.append_i64(3); })`).
    pub fn append_key_value(&mut self, key: impl Into<ArgString>, value: impl FnOnce(&mut LogRecordBuilder)) -> &mut Self {
        if let Some(handle) = &mut self.handle {
            let mut writer = handle.record_mut().writer();
            writer.append_key(key);
            let len = writer.len();
            let truncated = writer.truncated();
            handle.record_mut().finish(len, truncated);
            value(self);
        }
        self
    }

    pub fn append_null(&mut self) -> &mut Self {
        if let Some(handle) = &mut self.handle {
            let mut writer = handle.record_mut().writer();
            writer.append_null();
            let len = writer.len();
            let truncated = writer.truncated();
            handle.record_mut().finish(len, truncated);
        }
        self
    }

    /// Enqueues the record for the worker, consuming the builder.
    pub fn submit(mut self) {
        if let Some(handle) = self.handle.take() {
            match self.queue.try_send(handle) {
                SendOutcome::Sent => {}
                SendOutcome::Full(handle) => {
                    tracing::warn!("record queue full, dropping record");
                    handle.release();
                }
                SendOutcome::Closed => {
                    tracing::warn!("record queue closed, dropping record");
                }
            }
        }
    }
}

impl Drop for LogRecordBuilder {
    /// A builder dropped without `submit` (e.g. because the caller's code
    /// panicked mid-record) still owns a buffer; return it to the pool
    /// rather than stalling the pool's capacity permanently.
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.release();
        }
    }
}

/// A value that knows how to append itself to a [`LogRecordBuilder`].
///
/// Implemented for every primitive argument type in §3 so the
/// [`crate::trace!`]/[`crate::info!`]/etc. macros can append whatever the
/// caller passes without the caller naming an `append_*` method by hand.
/// `&'static str` is stored by reference (no copy); any other `&str` is
/// copied inline via `append_utf8_span` since it may not outlive the record.
pub trait Loggable {
    fn append_to(self, builder: &mut LogRecordBuilder);
}

macro_rules! impl_loggable_via {
    ($ty:ty, $method:ident) => {
        impl Loggable for $ty {
            fn append_to(self, builder: &mut LogRecordBuilder) {
                builder.$method(self);
            }
        }
    };
}

impl_loggable_via!(bool, append_bool);
impl_loggable_via!(u8, append_u8);
impl_loggable_via!(i8, append_i8);
impl_loggable_via!(char, append_char);
impl_loggable_via!(i16, append_i16);
impl_loggable_via!(u16, append_u16);
impl_loggable_via!(i32, append_i32);
impl_loggable_via!(u32, append_u32);
impl_loggable_via!(i64, append_i64);
impl_loggable_via!(u64, append_u64);
impl_loggable_via!(f32, append_f32);
impl_loggable_via!(f64, append_f64);
impl_loggable_via!(isize, append_isize);
impl_loggable_via!(usize, append_usize);
impl_loggable_via!(Uuid, append_guid);

impl Loggable for &'static str {
    fn append_to(self, builder: &mut LogRecordBuilder) {
        builder.append_string(self);
    }
}

impl Loggable for Arc<str> {
    fn append_to(self, builder: &mut LogRecordBuilder) {
        builder.append_string(self);
    }
}

impl<'a> Loggable for &'a String {
    fn append_to(self, builder: &mut LogRecordBuilder) {
        builder.append_utf8_span(self);
    }
}

impl LogRecordBuilder {
    /// Generic entry point used by the level macros: dispatches to the
    /// right typed `append_*` via [`Loggable`].
    pub fn append<T: Loggable>(&mut self, value: T) -> &mut Self {
        value.append_to(self);
        self
    }
}
