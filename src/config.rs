//! Configuration options and the `serde`-deserializable configuration tree.
//!
//! Defaults mirror §6 of the design: a [`LoggingConfig`] can be built
//! programmatically or deserialized from TOML/JSON and handed to
//! [`crate::initialize`], which builds a [`crate::resolver::Resolver`] from it.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::appender::Encoding;
use crate::level::Level;

/// Buffers held in the [`crate::buffer::BufferPool`].
pub const DEFAULT_POOL_SIZE: usize = 1024;
/// Argument-stream bytes available per buffer.
pub const DEFAULT_BUFFER_SIZE: usize = 128;
/// Interned-string slots available per buffer.
pub const DEFAULT_STRING_CAPACITY: usize = 32;
/// Text substituted for an explicit `Null` argument.
pub const DEFAULT_NULL_DISPLAY: &str = "null";
/// Suffix appended when a decoded message exceeds the output buffer.
pub const DEFAULT_TRUNCATED_SUFFIX: &str = " [TRUNCATED]";
/// How long a failing appender is skipped before being retried.
pub const DEFAULT_QUARANTINE_DELAY: Duration = Duration::from_secs(15);

/// Policy applied when a producer calls `log` and the pool has no free buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolExhaustionStrategy {
    /// Drop the record and arrange for the worker to emit a "queue was full" notice.
    #[default]
    DropLogMessageAndNotifyAppenders,
    /// Drop the record silently.
    DropLogMessage,
    /// Block the producer (bounded spin, then park) until a buffer frees up.
    WaitUntilAvailable,
}

/// Top-level configuration consumed by [`crate::initialize`].
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Buffer pool sizing.
    pub pool: PoolConfig,
    /// Text substituted for an explicit `Null` argument.
    pub null_display_string: String,
    /// Suffix appended to a decoded message that overflowed the output buffer.
    pub truncated_message_suffix: String,
    /// How long a failing appender is quarantined for.
    pub appender_quarantine_delay: Duration,
    /// When true, an unrecognized enum type is registered (and allocates once)
    /// the first time it is logged, instead of requiring `register_enum` up front.
    pub auto_register_enums: bool,
    /// Appenders available to be referenced by name from `loggers`.
    pub appenders: HashMap<String, AppenderConfig>,
    /// Per-logger overrides, keyed by dotted logger name. `""` configures the root.
    pub loggers: HashMap<String, LoggerConfig>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let mut loggers = HashMap::new();
        loggers.insert(String::new(), LoggerConfig::default());
        LoggingConfig {
            pool: PoolConfig::default(),
            null_display_string: DEFAULT_NULL_DISPLAY.to_string(),
            truncated_message_suffix: DEFAULT_TRUNCATED_SUFFIX.to_string(),
            appender_quarantine_delay: DEFAULT_QUARANTINE_DELAY,
            auto_register_enums: false,
            appenders: HashMap::new(),
            loggers,
        }
    }
}

impl LoggingConfig {
    /// Parses a [`LoggingConfig`] from a JSON document.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Parses a [`LoggingConfig`] from a TOML document. Requires the `toml-config` feature.
    #[cfg(feature = "toml-config")]
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

/// Sizing knobs for the buffer pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of buffers in the pool.
    pub pool_size: usize,
    /// Argument-stream bytes per buffer.
    pub buffer_size: usize,
    /// Interned-string slots per buffer.
    pub string_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            pool_size: DEFAULT_POOL_SIZE,
            buffer_size: DEFAULT_BUFFER_SIZE,
            string_capacity: DEFAULT_STRING_CAPACITY,
        }
    }
}

/// Effective configuration of a single logger (or the root, keyed by `""`).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Minimum level this logger (and, unless overridden, its descendants) will record.
    pub level: Level,
    /// Names of appenders defined directly on this logger.
    pub appenders: Vec<String>,
    /// Whether the resolved appender set also includes the parent's appenders.
    pub include_parent_appenders: bool,
    /// Pool-exhaustion policy in effect for loggers resolving to this node.
    pub pool_exhaustion_strategy: PoolExhaustionStrategy,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        LoggerConfig {
            level: Level::Info,
            appenders: Vec::new(),
            include_parent_appenders: true,
            pool_exhaustion_strategy: PoolExhaustionStrategy::default(),
        }
    }
}

/// Declares one concrete appender, selectable by [`LoggerConfig::appenders`].
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AppenderConfig {
    /// Writes to stdout or stderr.
    Console {
        /// Write to stderr instead of stdout.
        #[serde(default)]
        stderr: bool,
        /// Wrap the level text in an ANSI colour code.
        #[serde(default = "default_true")]
        colored: bool,
        /// Optional level floor below the effective logger level.
        #[serde(default)]
        level: Option<Level>,
        /// Text encoding applied to each formatted message before it is written.
        #[serde(default)]
        encoding: Encoding,
    },
    /// Appends to a file, rotating once it exceeds `max_bytes`.
    RollingFile {
        /// Path to the active log file.
        path: String,
        /// Rotation threshold in bytes.
        #[serde(default = "default_max_bytes")]
        max_bytes: u64,
        /// Number of rotated files to retain.
        #[serde(default = "default_max_backups")]
        max_backups: usize,
        /// Optional level floor below the effective logger level.
        #[serde(default)]
        level: Option<Level>,
        /// Text encoding applied to each formatted message before it is written.
        #[serde(default)]
        encoding: Encoding,
    },
    /// Sends one UDP datagram per formatted message.
    Udp {
        /// Destination `host:port`.
        address: String,
        /// Optional level floor below the effective logger level.
        #[serde(default)]
        level: Option<Level>,
        /// Text encoding applied to each formatted message before it is written.
        #[serde(default)]
        encoding: Encoding,
    },
}

fn default_true() -> bool {
    true
}

fn default_max_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_max_backups() -> usize {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_root_logger() {
        let config = LoggingConfig::default();
        assert!(config.loggers.contains_key(""));
        assert_eq!(config.pool.pool_size, DEFAULT_POOL_SIZE);
    }

    #[test]
    fn parses_minimal_json() {
        let json = r#"{
            "appenders": {"console": {"kind": "console"}},
            "loggers": {"": {"level": "info", "appenders": ["console"]}}
        }"#;
        let config = LoggingConfig::from_json(json).unwrap();
        assert_eq!(config.loggers[""].level, Level::Info);
        assert!(matches!(
            config.appenders["console"],
            AppenderConfig::Console { .. }
        ));
    }
}
