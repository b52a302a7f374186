//! Error kinds and their disposition.
//!
//! Most of these never reach a caller: [`LogError::PoolExhausted`] and
//! [`LogError::EncodingOverflow`] are handled internally per §7 of the design
//! (drop, notify, or truncate). Only [`LogError::Configuration`] is returned
//! synchronously from [`crate::initialize`]; the rest exist so the worker loop,
//! the guarded appender, and the formatter have a single typed vocabulary to
//! report through `tracing` and through [`crate::appender::Appender`]'s `Result`.

use thiserror::Error;

/// Errors surfaced by the logging core.
#[derive(Debug, Error)]
pub enum LogError {
    /// No free buffer was available and the active pool-exhaustion strategy was
    /// `WaitUntilAvailable`, which timed out instead of blocking forever.
    #[error("log message pool exhausted (capacity {capacity})")]
    PoolExhausted {
        /// Configured pool capacity at the time of exhaustion.
        capacity: usize,
    },

    /// The argument byte region or the string reference table filled up before
    /// all arguments were encoded. The record is still delivered, truncated.
    #[error("log record truncated: {reason}")]
    EncodingOverflow {
        /// Human-readable cause (`"argument buffer full"` or `"reference table full"`).
        reason: &'static str,
    },

    /// A formatter could not render a record. The worker falls back to the
    /// literal diagnostic text described in §7 rather than dropping the record.
    #[error("formatter failed: {0}")]
    FormatterFailure(String),

    /// An appender's `write`/`flush`/`close` call failed. Caught by
    /// [`crate::appender::GuardedAppender`], which quarantines the inner appender.
    #[error("appender {appender} failed: {source}")]
    AppenderFailure {
        /// Name of the appender that failed, for diagnostics.
        appender: String,
        /// Underlying I/O or protocol error.
        #[source]
        source: std::io::Error,
    },

    /// An unrecoverable condition inside the worker loop. Once this is
    /// returned the worker thread exits; it is not retried.
    #[error("worker loop failed fatally: {0}")]
    WorkerFailure(String),

    /// A [`crate::config::LoggingConfig`] referenced an appender name that was
    /// never defined. Detected at `initialize` time, before any thread starts.
    #[error("logger {logger:?} references undefined appender {appender:?}")]
    Configuration {
        /// Dotted logger name containing the bad reference.
        logger: String,
        /// The appender name that could not be resolved.
        appender: String,
    },
}

/// Convenience alias used throughout the appender and configuration layers.
pub type Result<T> = std::result::Result<T, LogError>;
