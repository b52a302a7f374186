//! Prefix-pattern parsing and expansion (`%date %time %level %logger %thread`).

use std::fmt::Write as _;
use std::thread::ThreadId;
use std::time::SystemTime;

use chrono::{DateTime, Utc};

use crate::level::Level;

#[derive(Debug, Clone)]
enum Chunk {
    Literal(String),
    Date,
    Time,
    Level,
    Logger,
    Thread,
}

/// A prefix pattern parsed once at appender-construction time and evaluated
/// per message, avoiding re-parsing the pattern text on every log call.
#[derive(Debug, Clone)]
pub struct PrefixPattern {
    chunks: Vec<Chunk>,
}

/// Per-message values the prefix pattern's tokens draw from.
pub struct PrefixContext<'a> {
    pub timestamp: SystemTime,
    pub level: Level,
    pub logger_name: &'a str,
    pub thread_id: ThreadId,
    pub thread_name: Option<&'a str>,
}

impl PrefixPattern {
    /// Parses `pattern`. Recognizes `%date`, `%time`, `%level`, `%logger`,
    /// `%thread`, case-insensitively, with an optional `%{name}` bracket
    /// form. An unrecognized `%token` is passed through verbatim, `%`
    /// included.
    pub fn parse(pattern: &str) -> Self {
        let mut chunks = Vec::new();
        let mut literal = String::new();
        let bytes = pattern.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] != b'%' {
                literal.push(bytes[i] as char);
                i += 1;
                continue;
            }
            let (token, consumed) = read_token(&pattern[i + 1..]);
            match token_to_chunk(token) {
                Some(chunk) => {
                    if !literal.is_empty() {
                        chunks.push(Chunk::Literal(std::mem::take(&mut literal)));
                    }
                    chunks.push(chunk);
                    i += 1 + consumed;
                }
                None => {
                    literal.push('%');
                    i += 1;
                }
            }
        }
        if !literal.is_empty() {
            chunks.push(Chunk::Literal(literal));
        }
        PrefixPattern { chunks }
    }

    /// Writes the expanded prefix into `out`, returning the number of
    /// characters written.
    pub fn write_into(&self, out: &mut String, ctx: &PrefixContext) -> usize {
        let start = out.len();
        for chunk in &self.chunks {
            match chunk {
                Chunk::Literal(s) => out.push_str(s),
                Chunk::Date => {
                    let dt: DateTime<Utc> = ctx.timestamp.into();
                    let _ = write!(out, "{}", dt.format("%Y-%m-%d"));
                }
                Chunk::Time => {
                    let dt: DateTime<Utc> = ctx.timestamp.into();
                    let nanos = dt.timestamp_subsec_nanos();
                    let _ = write!(out, "{}.{:07}", dt.format("%H:%M:%S"), nanos / 100);
                }
                Chunk::Level => out.push_str(ctx.level.as_str()),
                Chunk::Logger => out.push_str(ctx.logger_name),
                Chunk::Thread => match ctx.thread_name {
                    Some(name) => out.push_str(name),
                    None => {
                        // `ThreadId`'s `Debug` form isn't a bare integer; extract its
                        // digits to satisfy the "numeric id" contract.
                        let rendered = format!("{:?}", ctx.thread_id);
                        let digits: String = rendered.chars().filter(|c| c.is_ascii_digit()).collect();
                        out.push_str(if digits.is_empty() { "0" } else { &digits });
                    }
                },
            }
        }
        out.len() - start
    }
}

fn read_token(rest: &str) -> (&str, usize) {
    if let Some(inner) = rest.strip_prefix('{') {
        if let Some(end) = inner.find('}') {
            return (&inner[..end], end + 2);
        }
    }
    let end = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(rest.len());
    (&rest[..end], end)
}

fn token_to_chunk(token: &str) -> Option<Chunk> {
    match token.to_ascii_lowercase().as_str() {
        "date" => Some(Chunk::Date),
        "time" => Some(Chunk::Time),
        "level" => Some(Chunk::Level),
        "logger" => Some(Chunk::Logger),
        "thread" => Some(Chunk::Thread),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32, milli: u32) -> SystemTime {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s)
            .unwrap()
            .checked_add_signed(chrono::Duration::milliseconds(milli as i64))
            .unwrap()
            .into()
    }

    #[test]
    fn expands_date_time_level_logger() {
        let pattern = PrefixPattern::parse("%date %time %level %logger");
        let mut out = String::new();
        pattern.write_into(
            &mut out,
            &PrefixContext {
                timestamp: ts(2020, 1, 2, 3, 4, 5, 6),
                level: Level::Info,
                logger_name: "TestLog",
                thread_id: std::thread::current().id(),
                thread_name: None,
            },
        );
        assert_eq!(out, "2020-01-02 03:04:05.0060000 INFO TestLog");
    }

    #[test]
    fn thread_name_takes_priority_over_numeric_id() {
        let pattern = PrefixPattern::parse("%thread world!");
        let mut out = String::new();
        pattern.write_into(
            &mut out,
            &PrefixContext {
                timestamp: SystemTime::now(),
                level: Level::Info,
                logger_name: "",
                thread_id: std::thread::current().id(),
                thread_name: Some("Hello"),
            },
        );
        assert_eq!(out, "Hello world!");
    }

    #[test]
    fn unknown_token_passes_through_verbatim() {
        let pattern = PrefixPattern::parse("%unknown-token");
        let mut out = String::new();
        pattern.write_into(
            &mut out,
            &PrefixContext {
                timestamp: SystemTime::now(),
                level: Level::Info,
                logger_name: "",
                thread_id: std::thread::current().id(),
                thread_name: None,
            },
        );
        assert_eq!(out, "%unknown-token");
    }
}
