//! Appenders: sinks that receive formatted log text.

pub mod console;
pub mod guarded;
pub mod rolling_file;
pub mod udp;

pub use console::ConsoleAppender;
pub use guarded::GuardedAppender;
pub use rolling_file::RollingFileAppender;
pub use udp::UdpAppender;

use crate::error::Result;
use crate::level::Level;

/// Text encoding an appender uses when turning a formatted `&str` message
/// into the bytes it writes out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// Write the message's native UTF-8 bytes unchanged.
    Utf8,
    /// Transcode to UTF-16, little-endian.
    Utf16Le,
    /// Transcode to ASCII, replacing any non-ASCII scalar with `?`.
    Ascii,
}

impl Default for Encoding {
    fn default() -> Self {
        Encoding::Utf8
    }
}

impl Encoding {
    /// Encodes `message` into `out` (cleared first) according to this encoding.
    pub fn encode_into(self, message: &str, out: &mut Vec<u8>) {
        out.clear();
        match self {
            Encoding::Utf8 => out.extend_from_slice(message.as_bytes()),
            Encoding::Utf16Le => {
                for unit in message.encode_utf16() {
                    out.extend_from_slice(&unit.to_le_bytes());
                }
            }
            Encoding::Ascii => {
                out.extend(message.chars().map(|c| if c.is_ascii() { c as u8 } else { b'?' }));
            }
        }
    }
}

/// A sink for formatted log text. Implementations are single-writer: the
/// worker thread is the only caller, so no internal synchronization is
/// required beyond what's needed for the appender's own I/O handle.
pub trait Appender: Send {
    /// Writes one already-formatted message at the given severity.
    fn write(&mut self, level: Level, message: &str) -> Result<()>;

    /// Flushes any buffered output. Called periodically by the worker and
    /// once during shutdown.
    fn flush(&mut self) -> Result<()>;

    /// Releases resources. Called once, during shutdown or resolver swap.
    fn close(&mut self) -> Result<()>;

    /// Sets the text encoding used for subsequent writes. Called once at
    /// construction and again whenever the resolver rebuilds this appender
    /// from updated configuration.
    fn set_encoding(&mut self, encoding: Encoding) -> Result<()>;
}
