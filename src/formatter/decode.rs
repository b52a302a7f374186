//! Walks an encoded argument stream, rendering it in one of three modes.

use std::fmt::Write as _;

use crate::buffer::{decode_stream, ArgString, DecodedArg, DecodedStep};
use crate::config::{DEFAULT_NULL_DISPLAY, DEFAULT_TRUNCATED_SUFFIX};

/// How an argument stream's decoded values are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
    /// Normal human-readable output, honoring per-argument format specifiers.
    Formatted,
    /// Diagnostic dump: strings quoted, arguments joined with `, `.
    Unformatted,
    /// Only `KeyString`-tagged pairs are extracted; everything else is skipped.
    KeyValue,
}

/// A decoded key/value pair, produced only in [`DecodeMode::KeyValue`].
pub struct KeyValuePair {
    pub key: String,
    pub value: String,
}

fn render_value(arg: &DecodedArg<'_>, null_display: &str) -> String {
    match arg {
        DecodedArg::Bool(v) => v.to_string(),
        DecodedArg::U8(v) => v.to_string(),
        DecodedArg::I8(v) => v.to_string(),
        DecodedArg::Char(v) => v.to_string(),
        DecodedArg::I16(v) => v.to_string(),
        DecodedArg::U16(v) => v.to_string(),
        DecodedArg::I32(v) => v.to_string(),
        DecodedArg::U32(v) => v.to_string(),
        DecodedArg::I64(v) => v.to_string(),
        DecodedArg::U64(v) => v.to_string(),
        DecodedArg::F32(v) => v.to_string(),
        DecodedArg::F64(v) => v.to_string(),
        DecodedArg::Decimal(v) => v.to_string(),
        DecodedArg::Isize(v) => v.to_string(),
        DecodedArg::Usize(v) => v.to_string(),
        DecodedArg::DateTimeMicros(v) => v.to_string(),
        DecodedArg::TimeSpanNanos(v) => v.to_string(),
        DecodedArg::DateDays(v) => v.to_string(),
        DecodedArg::TimeNanos(v) => v.to_string(),
        DecodedArg::Guid(v) => v.to_string(),
        DecodedArg::StringRef(s) => s.as_str().to_string(),
        DecodedArg::Utf8Span(s) => s.to_string(),
        DecodedArg::Utf16Span(units) => String::from_utf16_lossy(units),
        DecodedArg::Enum(v) => format!("{}#{}", v.type_handle, v.value),
        DecodedArg::Unmanaged { type_handle, blob } => {
            format!("<unmanaged:{type_handle} {}B>", blob.len())
        }
        DecodedArg::Key(s) => s.as_str().to_string(),
        DecodedArg::Null => null_display.to_string(),
        DecodedArg::EndOfTruncated => String::new(),
    }
}

/// Decodes `bytes`/`refs` into `out` according to `mode`, stopping within
/// `max_len` characters and appending `truncated_suffix` if the decode was
/// cut short (either by a stream-level truncation sentinel or by running
/// out of room in `out`).
pub fn decode_into(
    out: &mut String,
    bytes: &[u8],
    refs: &[Option<ArgString>],
    mode: DecodeMode,
    max_len: usize,
    truncated_suffix: &str,
) {
    let start_len = out.len();
    let mut first = true;
    let mut pending_key: Option<String> = None;
    let mut hit_limit = false;
    let mut stream_truncated = false;

    decode_stream(bytes, refs, |step: DecodedStep| {
        if hit_limit {
            return;
        }
        if matches!(step.arg, DecodedArg::EndOfTruncated) {
            stream_truncated = true;
            return;
        }

        match mode {
            DecodeMode::Formatted => {
                if let DecodedArg::Key(_) = step.arg {
                    return; // key markers are structural, not rendered inline
                }
                let rendered = render_value(&step.arg, DEFAULT_NULL_DISPLAY);
                if out.len() + rendered.len() - start_len > max_len {
                    hit_limit = true;
                    return;
                }
                out.push_str(&rendered);
            }
            DecodeMode::Unformatted => {
                if let DecodedArg::Key(_) = step.arg {
                    return;
                }
                if !first {
                    out.push_str(", ");
                }
                first = false;
                let quoted = matches!(
                    step.arg,
                    DecodedArg::StringRef(_) | DecodedArg::Utf8Span(_) | DecodedArg::Utf16Span(_)
                );
                let rendered = render_value(&step.arg, DEFAULT_NULL_DISPLAY);
                if quoted {
                    let _ = write!(out, "\"{rendered}\"");
                } else {
                    out.push_str(&rendered);
                }
            }
            DecodeMode::KeyValue => {
                if let DecodedArg::Key(key) = &step.arg {
                    pending_key = Some(key.as_str().to_string());
                } else if let Some(_key) = pending_key.take() {
                    // caller extracts pairs via `decode_key_value_pairs`; this
                    // branch exists only so `decode_into`'s KeyValue mode
                    // leaves no textual residue in `out`.
                }
            }
        }
    });

    if hit_limit || (stream_truncated && mode != DecodeMode::KeyValue) {
        out.truncate(start_len + max_len.min(out.len().saturating_sub(start_len)));
        out.push_str(truncated_suffix);
    } else if stream_truncated {
        out.push_str(truncated_suffix);
    }
}

/// Extracts every `KeyString`-tagged pair from the stream, in order.
pub fn decode_key_value_pairs(bytes: &[u8], refs: &[Option<ArgString>]) -> Vec<KeyValuePair> {
    let mut pairs = Vec::new();
    let mut pending_key: Option<String> = None;
    decode_stream(bytes, refs, |step: DecodedStep| match &step.arg {
        DecodedArg::Key(key) => pending_key = Some(key.as_str().to_string()),
        DecodedArg::EndOfTruncated => {}
        other => {
            if let Some(key) = pending_key.take() {
                pairs.push(KeyValuePair {
                    key,
                    value: render_value(other, DEFAULT_NULL_DISPLAY),
                });
            }
        }
    });
    pairs
}

/// Convenience wrapper matching §4.7's "truncated-message suffix" default.
pub fn decode_formatted(bytes: &[u8], refs: &[Option<ArgString>], max_len: usize) -> String {
    let mut out = String::new();
    decode_into(
        &mut out,
        bytes,
        refs,
        DecodeMode::Formatted,
        max_len,
        DEFAULT_TRUNCATED_SUFFIX,
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ArgumentWriter;

    #[test]
    fn key_value_pair_extraction() {
        let mut bytes = vec![0u8; 64];
        let mut refs: Vec<Option<ArgString>> = vec![None, None];
        let len = {
            let mut w = ArgumentWriter::new(&mut bytes, &mut refs);
            w.append_key("NumSeconds");
            w.append_i64(86400);
            w.len()
        };
        let pairs = decode_key_value_pairs(&bytes[..len], &refs);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].key, "NumSeconds");
        assert_eq!(pairs[0].value, "86400");
    }

    #[test]
    fn unformatted_mode_quotes_strings_and_joins_with_comma() {
        let mut bytes = vec![0u8; 64];
        let mut refs: Vec<Option<ArgString>> = vec![None, None];
        let len = {
            let mut w = ArgumentWriter::new(&mut bytes, &mut refs);
            w.append_string_ref("alice", None);
            w.append_i32(42);
            w.len()
        };
        let mut out = String::new();
        decode_into(&mut out, &bytes[..len], &refs, DecodeMode::Unformatted, 256, " [TRUNCATED]");
        assert_eq!(out, "\"alice\", 42");
    }
}
