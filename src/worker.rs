//! The single dedicated consumer thread: drains the queue, resolves
//! appenders, formats, writes, releases.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::formatter::Formatter;
use crate::logger::LoggerRegistry;
use crate::notice::{NoticeBuffer, PendingNotice};
use crate::queue::QueueReceiver;
use crate::resolver::Resolver;

const IDLE_BACKOFF_MIN: Duration = Duration::from_millis(1);
const IDLE_BACKOFF_MAX: Duration = Duration::from_millis(15);
const IDLE_FLUSH_INTERVAL: Duration = Duration::from_secs(1);
const FLUSH_EVERY_N_RECORDS: u32 = 256;

/// Lifecycle state of the worker thread, observable for diagnostics.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Starting = 0,
    Running = 1,
    Draining = 2,
    Stopped = 3,
}

impl WorkerState {
    fn from_u8(raw: u8) -> WorkerState {
        match raw {
            0 => WorkerState::Starting,
            1 => WorkerState::Running,
            2 => WorkerState::Draining,
            _ => WorkerState::Stopped,
        }
    }
}

/// Shared handle used by the manager to observe and request shutdown of the
/// worker thread.
pub struct WorkerControl {
    state: Arc<AtomicU8>,
    drain_requested: Arc<std::sync::atomic::AtomicBool>,
    join_handle: std::sync::Mutex<Option<std::thread::JoinHandle<()>>>,
}

impl WorkerControl {
    pub fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Requests drain-then-stop and blocks until the worker thread exits.
    /// Idempotent: a second call observes the thread already gone.
    pub fn shutdown(&self) {
        self.drain_requested.store(true, Ordering::Release);
        if let Some(handle) = self.join_handle.lock().unwrap().take() {
            let _ = handle.join();
        }
    }
}

/// Spawns the worker thread and returns a control handle.
///
/// `formatter` is shared by every appender; §4.9 ships only one default
/// dialect active per process (plain text or JSON), selected at
/// `initialize` time.
pub fn spawn(
    receiver: QueueReceiver,
    resolver: Arc<Resolver>,
    registry: Arc<LoggerRegistry>,
    formatter: Arc<dyn Formatter>,
    pending_notice: Arc<PendingNotice>,
) -> WorkerControl {
    let state = Arc::new(AtomicU8::new(WorkerState::Starting as u8));
    let drain_requested = Arc::new(std::sync::atomic::AtomicBool::new(false));

    let thread_state = state.clone();
    let thread_drain = drain_requested.clone();
    let join_handle = std::thread::Builder::new()
        .name("swiftlog-worker".to_string())
        .spawn(move || {
            run(
                receiver,
                resolver,
                registry,
                formatter,
                pending_notice,
                thread_state,
                thread_drain,
            )
        })
        .expect("failed to spawn swiftlog worker thread");

    WorkerControl {
        state,
        drain_requested,
        join_handle: std::sync::Mutex::new(Some(join_handle)),
    }
}

fn run(
    receiver: QueueReceiver,
    resolver: Arc<Resolver>,
    registry: Arc<LoggerRegistry>,
    formatter: Arc<dyn Formatter>,
    pending_notice: Arc<PendingNotice>,
    state: Arc<AtomicU8>,
    drain_requested: Arc<std::sync::atomic::AtomicBool>,
) {
    state.store(WorkerState::Running as u8, Ordering::Release);
    tracing::info!("swiftlog worker thread started");

    let mut scratch = String::with_capacity(256);
    let mut last_flush = Instant::now();
    let mut since_flush: u32 = 0;
    let mut backoff = IDLE_BACKOFF_MIN;
    let mut notice_buffer = NoticeBuffer::new();
    let worker_thread_id = std::thread::current().id();

    loop {
        let draining = drain_requested.load(Ordering::Acquire);
        if draining {
            state.store(WorkerState::Draining as u8, Ordering::Release);
        }

        let record = if draining {
            receiver.drain_available().into_iter().next()
        } else {
            receiver.recv_timeout(backoff)
        };

        if let Some(notice) = notice_buffer.synthesize(&pending_notice, worker_thread_id) {
            deliver(notice, &resolver, &registry, &formatter, &mut scratch);
        }

        match record {
            Some(handle) => {
                backoff = IDLE_BACKOFF_MIN;
                process_record(&handle, &resolver, &registry, &formatter, &mut scratch);
                handle.release();
                since_flush += 1;
                if since_flush >= FLUSH_EVERY_N_RECORDS {
                    flush_all(&resolver, &registry);
                    since_flush = 0;
                    last_flush = Instant::now();
                }
            }
            None => {
                if draining {
                    break;
                }
                backoff = (backoff * 2).min(IDLE_BACKOFF_MAX);
                if last_flush.elapsed() >= IDLE_FLUSH_INTERVAL {
                    flush_all(&resolver, &registry);
                    last_flush = Instant::now();
                    since_flush = 0;
                }
            }
        }
    }

    close_all(&resolver, &registry);
    state.store(WorkerState::Stopped as u8, Ordering::Release);
    tracing::info!("swiftlog worker thread stopped");
}

fn process_record(
    handle: &crate::buffer::BufferHandle,
    resolver: &Arc<Resolver>,
    registry: &Arc<LoggerRegistry>,
    formatter: &Arc<dyn Formatter>,
    scratch: &mut String,
) {
    deliver(handle.record(), resolver, registry, formatter, scratch);
}

/// Resolves, formats, and writes one record. Shared by the normal pooled
/// path and the worker's own synthesized queue-full notice, since neither
/// cares where the `RecordData` came from.
fn deliver(
    record: &crate::buffer::RecordData,
    resolver: &Arc<Resolver>,
    registry: &Arc<LoggerRegistry>,
    formatter: &Arc<dyn Formatter>,
    scratch: &mut String,
) {
    let logger_name = registry
        .name_of(record.logger_id)
        .unwrap_or_else(|| Arc::from(""));
    let resolved = resolver.resolve(&logger_name);

    scratch.clear();
    formatter.format(record, &logger_name, scratch);

    for appender in resolved.appenders.iter() {
        appender.lock().write(record.level, scratch.as_str());
    }
}

fn flush_all(resolver: &Arc<Resolver>, registry: &Arc<LoggerRegistry>) {
    // Flushing touches every appender reachable from the root, which is a
    // superset of any single logger's set; walking via `resolve("")` plus
    // each interned logger name keeps this simple without a dedicated
    // tree-walk API on `Resolver`.
    let mut seen = std::collections::HashSet::new();
    for name in std::iter::once(Arc::from("")).chain(registry.all_names()) {
        let resolved = resolver.resolve(&name);
        for appender in resolved.appenders.iter() {
            let ptr = Arc::as_ptr(appender) as usize;
            if seen.insert(ptr) {
                appender.lock().flush();
            }
        }
    }
}

fn close_all(resolver: &Arc<Resolver>, registry: &Arc<LoggerRegistry>) {
    let mut seen = std::collections::HashSet::new();
    for name in std::iter::once(Arc::from("")).chain(registry.all_names()) {
        let resolved = resolver.resolve(&name);
        for appender in resolved.appenders.iter() {
            let ptr = Arc::as_ptr(appender) as usize;
            if seen.insert(ptr) {
                let _ = appender.lock().close();
            }
        }
    }
}
