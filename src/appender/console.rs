//! Writes formatted records to stdout or stderr.
//!
//! Grounded on the teacher's `console` module: one lock guards the whole
//! write so a message is never interleaved with another thread's output,
//! and colour is keyed off the record's level the same way
//! `LogLevel::color_code` does.

use std::io::Write as _;

use crate::appender::Encoding;
use crate::error::{LogError, Result};
use crate::level::Level;

/// Target stream for a [`ConsoleAppender`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Appender that writes to a standard stream, optionally colouring the
/// level token by severity.
pub struct ConsoleAppender {
    stream: Stream,
    colored: bool,
    encoding: Encoding,
    scratch: Vec<u8>,
}

impl ConsoleAppender {
    pub fn new(stream: Stream, colored: bool) -> Self {
        ConsoleAppender {
            stream,
            colored,
            encoding: Encoding::default(),
            scratch: Vec::new(),
        }
    }

    /// Wraps the whole line in the level's ANSI colour code when colouring is on.
    fn render(&self, level: Level, message: &str) -> String {
        if self.colored {
            format!("{}{}{}\n", level.color_code(), message, level.reset_code())
        } else {
            format!("{message}\n")
        }
    }
}

impl super::Appender for ConsoleAppender {
    fn write(&mut self, level: Level, message: &str) -> Result<()> {
        let rendered = self.render(level, message);
        self.encoding.encode_into(&rendered, &mut self.scratch);
        let result = match self.stream {
            Stream::Stdout => std::io::stdout().write_all(&self.scratch),
            Stream::Stderr => std::io::stderr().write_all(&self.scratch),
        };
        result.map_err(|source| LogError::AppenderFailure {
            appender: "console".to_string(),
            source,
        })
    }

    fn flush(&mut self) -> Result<()> {
        let result = match self.stream {
            Stream::Stdout => std::io::stdout().flush(),
            Stream::Stderr => std::io::stderr().flush(),
        };
        result.map_err(|source| LogError::AppenderFailure {
            appender: "console".to_string(),
            source,
        })
    }

    fn close(&mut self) -> Result<()> {
        self.flush()
    }

    fn set_encoding(&mut self, encoding: Encoding) -> Result<()> {
        self.encoding = encoding;
        Ok(())
    }
}
