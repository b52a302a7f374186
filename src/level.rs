//! Log level definitions.

use std::fmt;

/// Severity of a log record, ordered from most to least verbose.
///
/// Comparisons are by numeric rank: `Level::Trace < Level::Fatal`. `Level::None`
/// is not a real severity — it is the sentinel used to disable a logger entirely.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Most verbose level, typically compiled out of release builds upstream.
    Trace = 0,
    /// Diagnostic detail useful during development.
    Debug = 1,
    /// Routine operational messages.
    Info = 2,
    /// Unexpected but recoverable conditions.
    Warn = 3,
    /// Failures that affect the current operation.
    Error = 4,
    /// Failures the process cannot recover from.
    Fatal = 5,
    /// Disables logging entirely; nothing compares less than or equal to it except itself.
    None = 6,
}

impl Level {
    /// Upper-case textual form, as emitted by the `%level` prefix token.
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
            Level::None => "NONE",
        }
    }

    /// ANSI colour prefix used by [`crate::appender::ConsoleAppender`] when colour is enabled.
    pub const fn color_code(self) -> &'static str {
        match self {
            Level::Trace => "\x1b[90m",
            Level::Debug => "\x1b[36m",
            Level::Info => "\x1b[37m",
            Level::Warn => "\x1b[33m",
            Level::Error => "\x1b[31m",
            Level::Fatal => "\x1b[1;31m",
            Level::None => "\x1b[0m",
        }
    }

    /// Resets the terminal back to its default colour.
    pub const fn reset_code(self) -> &'static str {
        "\x1b[0m"
    }

    pub(crate) const fn from_u8(raw: u8) -> Level {
        match raw {
            0 => Level::Trace,
            1 => Level::Debug,
            2 => Level::Info,
            3 => Level::Warn,
            4 => Level::Error,
            5 => Level::Fatal,
            _ => Level::None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_by_severity() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Debug < Level::Info);
        assert!(Level::Fatal < Level::None);
    }

    #[test]
    fn round_trips_through_u8() {
        for level in [
            Level::Trace,
            Level::Debug,
            Level::Info,
            Level::Warn,
            Level::Error,
            Level::Fatal,
            Level::None,
        ] {
            assert_eq!(Level::from_u8(level as u8), level);
        }
    }
}
