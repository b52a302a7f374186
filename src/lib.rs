//! Allocation-free structured logging for latency-sensitive processes.
//!
//! A caller thread obtains a [`logger::LoggerHandle`] via [`get_logger`],
//! begins a record, appends typed arguments, and submits it — all without
//! performing a heap allocation. A single dedicated worker thread drains the
//! submitted records, resolves each one's appender set through a
//! hierarchical configuration [`resolver::Resolver`], formats it, and writes
//! it to the resolved appenders.
//!
//! ```no_run
//! use swiftlog::config::LoggingConfig;
//!
//! swiftlog::initialize(LoggingConfig::default()).unwrap();
//! let logger = swiftlog::get_logger("app.startup");
//! swiftlog::info!(logger, "listening on port", 8080u32);
//! swiftlog::shutdown();
//! ```

pub mod appender;
pub mod buffer;
pub mod config;
pub mod error;
pub mod formatter;
pub mod level;
mod logger;
mod macros;
mod manager;
mod notice;
mod queue;
mod resolver;
mod worker;

pub use error::{LogError, Result};
pub use level::Level;
pub use logger::{LogRecordBuilder, Loggable, LoggerHandle};
pub use manager::{effective_level, get_logger, initialize, reconfigure, register_enum, resolve_enum_handle, shutdown};
pub use resolver::ResolvedConfig;
pub use worker::WorkerState;
