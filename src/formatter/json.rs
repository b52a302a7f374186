//! `{"timestamp":...,"level":...,"logger":...,"message":...,"fields":{...}}`
//! structured-log dialect.

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

use crate::buffer::RecordData;
use crate::formatter::decode::{decode_formatted, decode_key_value_pairs};
use crate::formatter::Formatter;

/// Renders a record as one JSON object per line.
///
/// `message` comes from a `Formatted`-mode decode of the argument stream
/// (joined to the message template); `fields` comes from a `KeyValue`-mode
/// decode of the same stream, so a record can carry both a human-readable
/// message and structured key/value data.
pub struct JsonFormatter {
    max_message_len: usize,
}

impl JsonFormatter {
    pub fn new(max_message_len: usize) -> Self {
        JsonFormatter { max_message_len }
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, record: &RecordData, logger_name: &str, out: &mut String) {
        let timestamp: DateTime<Utc> = record.timestamp.into();
        let mut message = String::new();
        if let Some(template) = record.message_template {
            message.push_str(template);
        }
        let decoded = decode_formatted(record.arg_bytes(), record.refs(), self.max_message_len);
        if !decoded.is_empty() {
            if !message.is_empty() {
                message.push(' ');
            }
            message.push_str(&decoded);
        }

        let mut fields = Map::new();
        for pair in decode_key_value_pairs(record.arg_bytes(), record.refs()) {
            fields.insert(pair.key, Value::String(pair.value));
        }

        let object = json!({
            "timestamp": timestamp.to_rfc3339(),
            "level": record.level.as_str(),
            "logger": logger_name,
            "message": message,
            "fields": fields,
        });
        out.push_str(&object.to_string());
    }
}
