//! Wraps an [`Appender`] so one misbehaving sink cannot stall or poison
//! the others sharing the worker loop.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::appender::{Appender, Encoding};
use crate::error::Result;
use crate::level::Level;

/// Quarantines its inner appender for a configured delay after any failure.
///
/// While quarantined, `write`/`flush`/`close`/`set_encoding` are all skipped
/// silently rather than retried — this is what lets the worker loop keep
/// moving at the queue's pace instead of blocking on a sink that is down. An
/// appender
/// instance may be shared by several resolved logger configurations; this
/// type is the shared quarantine state, so quarantine triggered through one
/// logger is visible to all of them (see the design notes on this being
/// intentional).
pub struct GuardedAppender {
    name: String,
    inner: Box<dyn Appender>,
    quarantine_delay: Duration,
    next_activation: Option<Instant>,
    min_level: Option<Level>,
}

impl fmt::Debug for GuardedAppender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardedAppender")
            .field("name", &self.name)
            .field("quarantine_delay", &self.quarantine_delay)
            .field("next_activation", &self.next_activation)
            .field("min_level", &self.min_level)
            .finish()
    }
}

impl GuardedAppender {
    pub fn new(name: impl Into<String>, inner: Box<dyn Appender>, quarantine_delay: Duration) -> Self {
        GuardedAppender {
            name: name.into(),
            inner,
            quarantine_delay,
            next_activation: None,
            min_level: None,
        }
    }

    /// Sets a level floor below the logger's own effective level. A record
    /// is resolved (and formatted) the same regardless of this floor; it
    /// only gates whether this particular appender writes it.
    pub fn with_min_level(mut self, min_level: Option<Level>) -> Self {
        self.min_level = min_level;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn quarantined(&self, now: Instant) -> bool {
        matches!(self.next_activation, Some(t) if now < t)
    }

    fn record_failure(&mut self, now: Instant, err: &crate::error::LogError) {
        self.next_activation = Some(now + self.quarantine_delay);
        warn!(
            appender = %self.name,
            error = %err,
            quarantine_secs = self.quarantine_delay.as_secs(),
            "appender failed, entering quarantine"
        );
    }

    fn record_recovery(&mut self) {
        if self.next_activation.take().is_some() {
            warn!(appender = %self.name, "appender recovered, quarantine lifted");
        }
    }

    pub fn write(&mut self, level: Level, message: &str) {
        if let Some(floor) = self.min_level {
            if level < floor {
                return;
            }
        }
        let now = Instant::now();
        if self.quarantined(now) {
            return;
        }
        match self.inner.write(level, message) {
            Ok(()) => self.record_recovery(),
            Err(err) => self.record_failure(now, &err),
        }
    }

    pub fn flush(&mut self) {
        let now = Instant::now();
        if self.quarantined(now) {
            return;
        }
        if let Err(err) = self.inner.flush() {
            self.record_failure(now, &err);
        }
    }

    pub fn close(&mut self) -> Result<()> {
        let now = Instant::now();
        if self.quarantined(now) {
            return Ok(());
        }
        match self.inner.close() {
            Ok(()) => {
                self.record_recovery();
                Ok(())
            }
            Err(err) => {
                self.record_failure(now, &err);
                Err(err)
            }
        }
    }

    pub fn set_encoding(&mut self, encoding: Encoding) -> Result<()> {
        let now = Instant::now();
        if self.quarantined(now) {
            return Ok(());
        }
        match self.inner.set_encoding(encoding) {
            Ok(()) => {
                self.record_recovery();
                Ok(())
            }
            Err(err) => {
                self.record_failure(now, &err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlakyAppender {
        fail_next: bool,
        writes: Vec<String>,
    }

    impl Appender for FlakyAppender {
        fn write(&mut self, _level: Level, message: &str) -> Result<()> {
            if self.fail_next {
                self.fail_next = false;
                return Err(crate::error::LogError::AppenderFailure {
                    appender: "flaky".into(),
                    source: std::io::Error::other("boom"),
                });
            }
            self.writes.push(message.to_string());
            Ok(())
        }
        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
        fn close(&mut self) -> Result<()> {
            Ok(())
        }
        fn set_encoding(&mut self, _encoding: Encoding) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn quarantines_after_failure_and_skips_writes() {
        let inner = FlakyAppender {
            fail_next: true,
            writes: Vec::new(),
        };
        let mut guarded = GuardedAppender::new("flaky", Box::new(inner), Duration::from_secs(60));
        guarded.write(Level::Info, "first"); // fails, enters quarantine
        guarded.write(Level::Info, "second"); // skipped while quarantined
        assert!(guarded.next_activation.is_some());
    }

    #[test]
    fn recovers_and_clears_quarantine_flag() {
        let inner = FlakyAppender {
            fail_next: false,
            writes: Vec::new(),
        };
        let mut guarded = GuardedAppender::new("ok", Box::new(inner), Duration::from_secs(60));
        guarded.write(Level::Info, "hello");
        assert!(guarded.next_activation.is_none());
    }
}
