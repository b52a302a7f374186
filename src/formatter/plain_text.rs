//! The default formatter: prefix pattern followed by a `Formatted`-mode
//! argument decode.

use crate::buffer::RecordData;
use crate::formatter::decode::{decode_into, DecodeMode};
use crate::formatter::prefix::{PrefixContext, PrefixPattern};
use crate::formatter::Formatter;

/// Renders `<prefix><message template with arguments substituted>`.
pub struct PlainTextFormatter {
    prefix: PrefixPattern,
    max_message_len: usize,
    truncated_suffix: String,
}

impl PlainTextFormatter {
    pub fn new(pattern: &str, max_message_len: usize, truncated_suffix: impl Into<String>) -> Self {
        PlainTextFormatter {
            prefix: PrefixPattern::parse(pattern),
            max_message_len,
            truncated_suffix: truncated_suffix.into(),
        }
    }
}

impl Formatter for PlainTextFormatter {
    fn format(&self, record: &RecordData, logger_name: &str, out: &mut String) {
        let thread_name = record.thread_name.as_ref().map(|n| n.as_str());
        self.prefix.write_into(
            out,
            &PrefixContext {
                timestamp: record.timestamp,
                level: record.level,
                logger_name,
                thread_id: record.thread_id,
                thread_name,
            },
        );
        out.push(' ');
        if let Some(template) = record.message_template {
            out.push_str(template);
        }
        if !record.arg_bytes().is_empty() {
            if record.message_template.is_some() {
                out.push(' ');
            }
            decode_into(
                out,
                record.arg_bytes(),
                record.refs(),
                DecodeMode::Formatted,
                self.max_message_len,
                &self.truncated_suffix,
            );
        }
        if record.truncated && !out.ends_with(&self.truncated_suffix) {
            out.push_str(&self.truncated_suffix);
        }
    }
}
