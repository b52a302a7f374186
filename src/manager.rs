//! Global entry point: [`initialize`], [`shutdown`], [`get_logger`], and the
//! enum registry used by [`crate::buffer::EnumValue`].
//!
//! Grounded on the teacher's `static GLOBAL_LOG: LogCore = LogCore::default();`
//! singleton, generalized from a `const fn`-initialized struct (viable there
//! because the teacher's core needs no heap state) to a lazily-built
//! `once_cell::sync::OnceCell`, since this crate's core owns a worker
//! thread, a pool of heap-allocated buffers, and file/socket handles that
//! cannot exist before `initialize` supplies a configuration.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::buffer::BufferPool;
use crate::config::LoggingConfig;
use crate::error::{LogError, Result};
use crate::formatter::PlainTextFormatter;
use crate::level::Level;
use crate::logger::{LoggerHandle, LoggerRegistry};
use crate::notice::PendingNotice;
use crate::queue::{self, QueueSender};
use crate::resolver::Resolver;
use crate::worker::{self, WorkerControl};

static MANAGER: OnceCell<LogManager> = OnceCell::new();

struct LogManager {
    pool: BufferPool,
    queue: QueueSender,
    resolver: Arc<Resolver>,
    registry: Arc<LoggerRegistry>,
    worker: WorkerControl,
    cached_levels: Mutex<HashMap<u32, Arc<AtomicU8>>>,
    enum_registry: Mutex<HashMap<&'static str, u64>>,
    next_enum_handle: AtomicU32,
    auto_register_enums: bool,
    pending_notice: Arc<PendingNotice>,
}

/// Builds the buffer pool, resolver, record queue, and worker thread from
/// `config`, and installs them as the process-wide logging core.
///
/// Returns [`LogError::Configuration`] if a logger references an appender
/// name not present in `config.appenders`. Calling this a second time
/// without an intervening [`shutdown`] is a configuration error, since a
/// second worker thread and pool would otherwise leak.
pub fn initialize(config: LoggingConfig) -> Result<()> {
    if MANAGER.get().is_some() {
        return Err(LogError::Configuration {
            logger: String::new(),
            appender: "already initialized".to_string(),
        });
    }

    let resolver = Arc::new(Resolver::build(&config)?);
    let pool = BufferPool::new(&config.pool);
    let (tx, rx) = queue::bounded(config.pool.pool_size);
    let registry = Arc::new(LoggerRegistry::new());
    let formatter = Arc::new(PlainTextFormatter::new(
        "%date %time %level %logger %thread",
        config.pool.buffer_size * 4,
        config.truncated_message_suffix.clone(),
    ));
    let pending_notice = Arc::new(PendingNotice::new());
    let worker = worker::spawn(rx, resolver.clone(), registry.clone(), formatter, pending_notice.clone());

    let manager = LogManager {
        pool,
        queue: tx,
        resolver,
        registry,
        worker,
        cached_levels: Mutex::new(HashMap::new()),
        enum_registry: Mutex::new(HashMap::new()),
        next_enum_handle: AtomicU32::new(1),
        auto_register_enums: config.auto_register_enums,
        pending_notice,
    };

    MANAGER
        .set(manager)
        .unwrap_or_else(|_| unreachable!("checked is_some() above"));
    Ok(())
}

/// Drains the queue, flushes and closes every appender, and stops the
/// worker thread. Idempotent: a second call observes the worker already
/// stopped and returns immediately.
pub fn shutdown() {
    if let Some(manager) = MANAGER.get() {
        manager.worker.shutdown();
    }
}

/// Obtains a handle to a named logger, registering the name on first use.
///
/// # Panics
/// Panics if called before [`initialize`]. This mirrors the teacher's
/// global-singleton pattern: the core is meant to be brought up once, early,
/// and used from everywhere after that without threading a handle through
/// every call site.
pub fn get_logger(name: &str) -> LoggerHandle {
    let manager = MANAGER.get().expect("swiftlog::initialize was not called");
    let (logger_id, interned_name) = manager.registry.intern(name);

    let resolved_level = manager.resolver.resolve(name).level;
    let cached_level = manager
        .cached_levels
        .lock()
        .entry(logger_id)
        .or_insert_with(|| Arc::new(AtomicU8::new(resolved_level as u8)))
        .clone();

    LoggerHandle::new(
        interned_name,
        logger_id,
        cached_level,
        manager.resolver.clone(),
        manager.pool.clone(),
        manager.queue.clone(),
        manager.pending_notice.clone(),
    )
}

/// Rebuilds the resolver tree from `config` and atomically swaps it in,
/// then refreshes every outstanding logger handle's cached level.
pub fn reconfigure(config: &LoggingConfig) -> Result<()> {
    let manager = MANAGER.get().expect("swiftlog::initialize was not called");
    manager.resolver.swap(config)?;
    for (&logger_id, cached) in manager.cached_levels.lock().iter() {
        if let Some(name) = manager.registry.name_of(logger_id) {
            let level = manager.resolver.resolve(&name).level;
            cached.store(level as u8, Ordering::Relaxed);
        }
    }
    Ok(())
}

/// Registers an enum type under `type_name`, returning its compact type
/// handle. Idempotent: registering the same name twice returns the same
/// handle.
pub fn register_enum(type_name: &'static str) -> u64 {
    let manager = MANAGER.get().expect("swiftlog::initialize was not called");
    let mut registry = manager.enum_registry.lock();
    if let Some(&handle) = registry.get(type_name) {
        return handle;
    }
    let handle = manager.next_enum_handle.fetch_add(1, Ordering::Relaxed) as u64;
    registry.insert(type_name, handle);
    handle
}

/// Looks up (and, if `AutoRegisterEnums` is set, lazily registers) the type
/// handle for `type_name`.
pub fn resolve_enum_handle(type_name: &'static str) -> Option<u64> {
    let manager = MANAGER.get().expect("swiftlog::initialize was not called");
    if let Some(&handle) = manager.enum_registry.lock().get(type_name) {
        return Some(handle);
    }
    if manager.auto_register_enums {
        Some(register_enum(type_name))
    } else {
        None
    }
}

/// Effective level for `name` as of the last resolver build, without
/// registering a [`LoggerHandle`]. Mainly useful for diagnostics/tests.
pub fn effective_level(name: &str) -> Level {
    let manager = MANAGER.get().expect("swiftlog::initialize was not called");
    manager.resolver.resolve(name).level
}
