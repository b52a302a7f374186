//! Binary argument encoding: the TLV-like stream that marshals a record's
//! typed arguments from the producer thread to the worker.
//!
//! Each element starts with a one-byte tag. The low seven bits name the
//! argument's type ([`ArgType`]); the high bit ([`FORMAT_FLAG`]) marks that a
//! format-specifier string-table index immediately follows the tag, before
//! the argument's own payload.

use std::sync::Arc;

use uuid::Uuid;

/// High bit of the tag byte: a format-specifier index follows before the payload.
pub const FORMAT_FLAG: u8 = 0b1000_0000;
const TYPE_MASK: u8 = 0b0111_1111;

/// The type half of an argument tag.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    Bool = 0,
    U8 = 1,
    I8 = 2,
    Char = 3,
    I16 = 4,
    U16 = 5,
    I32 = 6,
    U32 = 7,
    I64 = 8,
    U64 = 9,
    F32 = 10,
    F64 = 11,
    /// Fixed-point 128-bit decimal, stored as its raw `i128` bit pattern.
    Decimal = 12,
    Isize = 13,
    Usize = 14,
    /// UTC timestamp, stored as microseconds since the Unix epoch.
    DateTime = 15,
    /// Duration, stored as nanoseconds.
    TimeSpan = 16,
    /// Calendar date, stored as days since the Unix epoch.
    DateOnly = 17,
    /// Time of day, stored as nanoseconds since midnight.
    TimeOnly = 18,
    Guid = 19,
    /// Index into the buffer's reference table.
    StringRef = 20,
    /// Inline UTF-16 code units, length-prefixed.
    Utf16Span = 21,
    /// Inline UTF-8 bytes, length-prefixed.
    Utf8Span = 22,
    /// A registered enum: type handle plus its numeric value.
    Enum = 23,
    /// An inline blob of known size, identified by a type handle.
    Unmanaged = 24,
    /// Marks the following argument as a structured-data value keyed by a
    /// reference-table string.
    KeyString = 25,
    Null = 26,
    /// Sentinel written when room remains for exactly one more byte after truncation.
    EndOfTruncatedMessage = 27,
}

impl ArgType {
    fn from_u8(raw: u8) -> Option<ArgType> {
        use ArgType::*;
        let table = [
            Bool, U8, I8, Char, I16, U16, I32, U32, I64, U64, F32, F64, Decimal, Isize, Usize,
            DateTime, TimeSpan, DateOnly, TimeOnly, Guid, StringRef, Utf16Span, Utf8Span, Enum,
            Unmanaged, KeyString, Null, EndOfTruncatedMessage,
        ];
        table.get(raw as usize).copied()
    }
}

/// A string argument held by reference rather than copied inline.
///
/// Both variants are zero-allocation to store: a `&'static str` is just a fat
/// pointer, and cloning an `Arc<str>` bumps a refcount rather than allocating.
#[derive(Debug, Clone)]
pub enum ArgString {
    /// A string with `'static` lifetime, typically a literal or interned constant.
    Static(&'static str),
    /// A shared, already-allocated string (e.g. one built once and logged many times).
    Shared(Arc<str>),
}

impl ArgString {
    pub fn as_str(&self) -> &str {
        match self {
            ArgString::Static(s) => s,
            ArgString::Shared(s) => s,
        }
    }
}

impl From<&'static str> for ArgString {
    fn from(s: &'static str) -> Self {
        ArgString::Static(s)
    }
}

impl From<Arc<str>> for ArgString {
    fn from(s: Arc<str>) -> Self {
        ArgString::Shared(s)
    }
}

/// A registered enum value: a compact type handle plus its numeric representation.
///
/// Grounded on the design notes' "compact type-handle registry" (§9): the
/// handle is resolved against [`crate::manager::EnumRegistry`] at decode time
/// so the worker can print a variant name without reflection.
#[derive(Debug, Clone, Copy)]
pub struct EnumValue {
    pub type_handle: u64,
    pub value: u64,
}

/// Appends typed arguments into a buffer's byte region and reference table.
///
/// Every `append_*` method is infallible: on overflow it sets
/// [`ArgumentWriter::truncated`] and becomes a no-op, writing the
/// [`ArgType::EndOfTruncatedMessage`] sentinel once if exactly one byte of
/// room remains. This mirrors §4.2 step 4 and §7's `EncodingOverflow`.
pub struct ArgumentWriter<'a> {
    bytes: &'a mut [u8],
    pos: usize,
    refs: &'a mut [Option<ArgString>],
    ref_len: usize,
    truncated: bool,
}

impl<'a> ArgumentWriter<'a> {
    pub fn new(bytes: &'a mut [u8], refs: &'a mut [Option<ArgString>]) -> Self {
        ArgumentWriter {
            bytes,
            pos: 0,
            refs,
            ref_len: 0,
            truncated: false,
        }
    }

    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub fn len(&self) -> usize {
        self.pos
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn mark_truncated(&mut self) {
        if self.truncated {
            return;
        }
        self.truncated = true;
        if self.remaining() >= 1 {
            self.bytes[self.pos] = ArgType::EndOfTruncatedMessage as u8;
            self.pos += 1;
        }
    }

    fn write_raw(&mut self, data: &[u8]) -> bool {
        if self.truncated {
            return false;
        }
        if self.remaining() < data.len() {
            self.mark_truncated();
            return false;
        }
        self.bytes[self.pos..self.pos + data.len()].copy_from_slice(data);
        self.pos += data.len();
        true
    }

    fn write_tag(&mut self, ty: ArgType, format_spec: Option<&'static str>) -> bool {
        if self.truncated {
            return false;
        }
        let needed = if format_spec.is_some() { 2 } else { 1 };
        if self.remaining() < needed {
            self.mark_truncated();
            return false;
        }
        let mut tag = ty as u8;
        if let Some(spec) = format_spec {
            tag |= FORMAT_FLAG;
            let idx = match self.intern(ArgString::Static(spec)) {
                Some(idx) => idx,
                None => {
                    // Reference table full: drop the format specifier but keep the value.
                    self.bytes[self.pos] = ty as u8;
                    self.pos += 1;
                    return true;
                }
            };
            self.bytes[self.pos] = tag;
            self.bytes[self.pos + 1] = idx;
            self.pos += 2;
        } else {
            self.bytes[self.pos] = tag;
            self.pos += 1;
        }
        true
    }

    /// Interns a string in the reference table, returning its index.
    /// Returns `None` when the table is full; the caller's argument is dropped.
    fn intern(&mut self, s: ArgString) -> Option<u8> {
        if self.ref_len >= self.refs.len() {
            return None;
        }
        let idx = self.ref_len;
        self.refs[idx] = Some(s);
        self.ref_len += 1;
        Some(idx as u8)
    }

    fn tag_len(format_spec: Option<&str>) -> usize {
        if format_spec.is_some() {
            2
        } else {
            1
        }
    }

    /// Writes `ty`'s tag (plus optional format-spec index) and `data` as one
    /// atomic unit: either both fit or neither is written. This keeps the
    /// stream self-describing even under truncation — the sentinel written by
    /// [`Self::mark_truncated`] always falls on an argument boundary, never
    /// midway through a tag's payload, so `decode_stream`'s single
    /// left-to-right pass can always reach it.
    fn append_fixed(&mut self, ty: ArgType, format_spec: Option<&'static str>, data: &[u8]) {
        if self.truncated {
            return;
        }
        let needed = Self::tag_len(format_spec) + data.len();
        if self.remaining() < needed {
            self.mark_truncated();
            return;
        }
        self.write_tag(ty, format_spec);
        self.write_raw(data);
    }

    pub fn append_bool(&mut self, v: bool) {
        self.append_fixed(ArgType::Bool, None, &[v as u8]);
    }

    pub fn append_u8(&mut self, v: u8) {
        self.append_fixed(ArgType::U8, None, &[v]);
    }

    pub fn append_i8(&mut self, v: i8) {
        self.append_fixed(ArgType::I8, None, &v.to_le_bytes());
    }

    pub fn append_char(&mut self, v: char) {
        self.append_fixed(ArgType::Char, None, &(v as u32).to_le_bytes());
    }

    pub fn append_i16(&mut self, v: i16) {
        self.append_fixed(ArgType::I16, None, &v.to_le_bytes());
    }

    pub fn append_u16(&mut self, v: u16) {
        self.append_fixed(ArgType::U16, None, &v.to_le_bytes());
    }

    pub fn append_i32(&mut self, v: i32) {
        self.append_fixed(ArgType::I32, None, &v.to_le_bytes());
    }

    pub fn append_u32(&mut self, v: u32) {
        self.append_fixed(ArgType::U32, None, &v.to_le_bytes());
    }

    pub fn append_i64(&mut self, v: i64) {
        self.append_fixed(ArgType::I64, None, &v.to_le_bytes());
    }

    pub fn append_u64(&mut self, v: u64) {
        self.append_fixed(ArgType::U64, None, &v.to_le_bytes());
    }

    pub fn append_f32(&mut self, v: f32) {
        self.append_fixed(ArgType::F32, None, &v.to_le_bytes());
    }

    pub fn append_f64(&mut self, v: f64) {
        self.append_fixed(ArgType::F64, None, &v.to_le_bytes());
    }

    pub fn append_decimal(&mut self, v: i128) {
        self.append_fixed(ArgType::Decimal, None, &v.to_le_bytes());
    }

    pub fn append_isize(&mut self, v: isize) {
        self.append_fixed(ArgType::Isize, None, &(v as i64).to_le_bytes());
    }

    pub fn append_usize(&mut self, v: usize) {
        self.append_fixed(ArgType::Usize, None, &(v as u64).to_le_bytes());
    }

    /// Microseconds since the Unix epoch, UTC.
    pub fn append_datetime_micros(&mut self, micros: i64) {
        self.append_fixed(ArgType::DateTime, None, &micros.to_le_bytes());
    }

    pub fn append_timespan_nanos(&mut self, nanos: u64) {
        self.append_fixed(ArgType::TimeSpan, None, &nanos.to_le_bytes());
    }

    pub fn append_date_days(&mut self, days: i32) {
        self.append_fixed(ArgType::DateOnly, None, &days.to_le_bytes());
    }

    pub fn append_time_nanos(&mut self, nanos_since_midnight: u64) {
        self.append_fixed(ArgType::TimeOnly, None, &nanos_since_midnight.to_le_bytes());
    }

    pub fn append_guid(&mut self, v: Uuid) {
        self.append_fixed(ArgType::Guid, None, v.as_bytes());
    }

    pub fn append_enum(&mut self, v: EnumValue) {
        let mut payload = [0u8; 16];
        payload[..8].copy_from_slice(&v.type_handle.to_le_bytes());
        payload[8..].copy_from_slice(&v.value.to_le_bytes());
        self.append_fixed(ArgType::Enum, None, &payload);
    }

    /// Appends a type-handle-tagged inline blob of at most 255 bytes.
    pub fn append_unmanaged(&mut self, type_handle: u64, blob: &[u8]) {
        if self.truncated {
            return;
        }
        let len = blob.len().min(u8::MAX as usize);
        let needed = Self::tag_len(None) + 9 + len;
        if self.remaining() < needed {
            self.mark_truncated();
            return;
        }
        self.write_tag(ArgType::Unmanaged, None);
        let mut header = [0u8; 9];
        header[..8].copy_from_slice(&type_handle.to_le_bytes());
        header[8] = len as u8;
        self.write_raw(&header);
        self.write_raw(&blob[..len]);
    }

    /// A string held by reference (stored once in the reference table, zero-copy).
    pub fn append_string_ref(&mut self, s: impl Into<ArgString>, format_spec: Option<&'static str>) {
        if self.truncated {
            return;
        }
        let needed = Self::tag_len(format_spec) + 1;
        if self.remaining() < needed {
            self.mark_truncated();
            return;
        }
        let idx = match self.intern(s.into()) {
            Some(idx) => idx,
            None => {
                self.mark_truncated();
                return;
            }
        };
        self.write_tag(ArgType::StringRef, format_spec);
        self.write_raw(&[idx]);
    }

    /// Copies UTF-8 bytes inline (no reference-table entry, no lifetime requirement).
    pub fn append_utf8_span(&mut self, s: &str) {
        if self.truncated {
            return;
        }
        let needed = Self::tag_len(None) + 4 + s.len();
        if self.remaining() < needed {
            self.mark_truncated();
            return;
        }
        self.write_tag(ArgType::Utf8Span, None);
        self.write_raw(&(s.len() as i32).to_le_bytes());
        self.write_raw(s.as_bytes());
    }

    /// Copies a UTF-16 code-unit span inline.
    pub fn append_utf16_span(&mut self, units: &[u16]) {
        if self.truncated {
            return;
        }
        let needed = Self::tag_len(None) + 4 + units.len() * 2;
        if self.remaining() < needed {
            self.mark_truncated();
            return;
        }
        self.write_tag(ArgType::Utf16Span, None);
        self.write_raw(&(units.len() as i32).to_le_bytes());
        for unit in units {
            self.write_raw(&unit.to_le_bytes());
        }
    }

    /// Tags the argument written immediately after this call as a
    /// structured-data value keyed by `key`.
    pub fn append_key(&mut self, key: impl Into<ArgString>) {
        if self.truncated {
            return;
        }
        let needed = Self::tag_len(None) + 1;
        if self.remaining() < needed {
            self.mark_truncated();
            return;
        }
        let idx = match self.intern(key.into()) {
            Some(idx) => idx,
            None => {
                self.mark_truncated();
                return;
            }
        };
        self.write_tag(ArgType::KeyString, None);
        self.write_raw(&[idx]);
    }

    pub fn append_null(&mut self) {
        self.write_tag(ArgType::Null, None);
    }
}

/// One decoded element of the argument stream, produced by [`decode_stream`].
#[derive(Debug, Clone)]
pub enum DecodedArg<'a> {
    Bool(bool),
    U8(u8),
    I8(i8),
    Char(char),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Decimal(i128),
    Isize(isize),
    Usize(usize),
    DateTimeMicros(i64),
    TimeSpanNanos(u64),
    DateDays(i32),
    TimeNanos(u64),
    Guid(Uuid),
    StringRef(&'a ArgString),
    Utf8Span(&'a str),
    Utf16Span(Vec<u16>),
    Enum(EnumValue),
    Unmanaged { type_handle: u64, blob: &'a [u8] },
    Key(&'a ArgString),
    Null,
    EndOfTruncated,
}

/// One step of a stream decode: the value, plus the format specifier that
/// preceded it (if the producer attached one via the [`FORMAT_FLAG`] bit).
pub struct DecodedStep<'a> {
    pub arg: DecodedArg<'a>,
    pub format_spec: Option<&'a str>,
}

/// Walks the argument stream left to right, calling `visit` once per element.
///
/// Decoding stops (without error) at the end of the byte slice or at an
/// [`ArgType::EndOfTruncatedMessage`] sentinel. This is the only supported
/// traversal: §3 requires a single left-to-right pass with no look-ahead
/// beyond each argument's own header.
pub fn decode_stream<'a>(
    bytes: &'a [u8],
    refs: &'a [Option<ArgString>],
    mut visit: impl FnMut(DecodedStep<'a>),
) {
    let mut pos = 0usize;
    while pos < bytes.len() {
        let raw_tag = bytes[pos];
        pos += 1;
        let format_flag = raw_tag & FORMAT_FLAG != 0;
        let Some(ty) = ArgType::from_u8(raw_tag & TYPE_MASK) else {
            break;
        };

        let format_spec = if format_flag {
            let Some(&idx) = bytes.get(pos) else { break };
            pos += 1;
            refs.get(idx as usize)
                .and_then(|r| r.as_ref())
                .map(ArgString::as_str)
        } else {
            None
        };

        macro_rules! take {
            ($n:expr) => {{
                let Some(slice) = bytes.get(pos..pos + $n) else {
                    return;
                };
                pos += $n;
                slice
            }};
        }

        let arg = match ty {
            ArgType::Bool => DecodedArg::Bool(take!(1)[0] != 0),
            ArgType::U8 => DecodedArg::U8(take!(1)[0]),
            ArgType::I8 => DecodedArg::I8(take!(1)[0] as i8),
            ArgType::Char => {
                let raw = u32::from_le_bytes(take!(4).try_into().unwrap());
                DecodedArg::Char(char::from_u32(raw).unwrap_or('\u{FFFD}'))
            }
            ArgType::I16 => DecodedArg::I16(i16::from_le_bytes(take!(2).try_into().unwrap())),
            ArgType::U16 => DecodedArg::U16(u16::from_le_bytes(take!(2).try_into().unwrap())),
            ArgType::I32 => DecodedArg::I32(i32::from_le_bytes(take!(4).try_into().unwrap())),
            ArgType::U32 => DecodedArg::U32(u32::from_le_bytes(take!(4).try_into().unwrap())),
            ArgType::I64 => DecodedArg::I64(i64::from_le_bytes(take!(8).try_into().unwrap())),
            ArgType::U64 => DecodedArg::U64(u64::from_le_bytes(take!(8).try_into().unwrap())),
            ArgType::F32 => DecodedArg::F32(f32::from_le_bytes(take!(4).try_into().unwrap())),
            ArgType::F64 => DecodedArg::F64(f64::from_le_bytes(take!(8).try_into().unwrap())),
            ArgType::Decimal => {
                DecodedArg::Decimal(i128::from_le_bytes(take!(16).try_into().unwrap()))
            }
            ArgType::Isize => {
                DecodedArg::Isize(i64::from_le_bytes(take!(8).try_into().unwrap()) as isize)
            }
            ArgType::Usize => {
                DecodedArg::Usize(u64::from_le_bytes(take!(8).try_into().unwrap()) as usize)
            }
            ArgType::DateTime => {
                DecodedArg::DateTimeMicros(i64::from_le_bytes(take!(8).try_into().unwrap()))
            }
            ArgType::TimeSpan => {
                DecodedArg::TimeSpanNanos(u64::from_le_bytes(take!(8).try_into().unwrap()))
            }
            ArgType::DateOnly => {
                DecodedArg::DateDays(i32::from_le_bytes(take!(4).try_into().unwrap()))
            }
            ArgType::TimeOnly => {
                DecodedArg::TimeNanos(u64::from_le_bytes(take!(8).try_into().unwrap()))
            }
            ArgType::Guid => DecodedArg::Guid(Uuid::from_bytes(take!(16).try_into().unwrap())),
            ArgType::StringRef => {
                let idx = take!(1)[0];
                match refs.get(idx as usize).and_then(|r| r.as_ref()) {
                    Some(s) => DecodedArg::StringRef(s),
                    None => DecodedArg::Null,
                }
            }
            ArgType::Utf8Span => {
                let len = i32::from_le_bytes(take!(4).try_into().unwrap()).max(0) as usize;
                let bytes = take!(len);
                DecodedArg::Utf8Span(std::str::from_utf8(bytes).unwrap_or(""))
            }
            ArgType::Utf16Span => {
                let len = i32::from_le_bytes(take!(4).try_into().unwrap()).max(0) as usize;
                let mut units = Vec::with_capacity(len);
                for _ in 0..len {
                    units.push(u16::from_le_bytes(take!(2).try_into().unwrap()));
                }
                DecodedArg::Utf16Span(units)
            }
            ArgType::Enum => {
                let payload = take!(16);
                DecodedArg::Enum(EnumValue {
                    type_handle: u64::from_le_bytes(payload[..8].try_into().unwrap()),
                    value: u64::from_le_bytes(payload[8..].try_into().unwrap()),
                })
            }
            ArgType::Unmanaged => {
                let header = take!(9);
                let type_handle = u64::from_le_bytes(header[..8].try_into().unwrap());
                let len = header[8] as usize;
                let blob = take!(len);
                DecodedArg::Unmanaged { type_handle, blob }
            }
            ArgType::KeyString => {
                let idx = take!(1)[0];
                match refs.get(idx as usize).and_then(|r| r.as_ref()) {
                    Some(s) => DecodedArg::Key(s),
                    None => DecodedArg::Null,
                }
            }
            ArgType::Null => DecodedArg::Null,
            ArgType::EndOfTruncatedMessage => {
                visit(DecodedStep {
                    arg: DecodedArg::EndOfTruncated,
                    format_spec,
                });
                return;
            }
        };
        visit(DecodedStep { arg, format_spec });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(f: impl FnOnce(&mut ArgumentWriter)) -> (Vec<u8>, Vec<Option<ArgString>>) {
        let mut bytes = vec![0u8; 128];
        let mut refs: Vec<Option<ArgString>> = vec![None, None, None, None];
        {
            let mut writer = ArgumentWriter::new(&mut bytes, &mut refs);
            f(&mut writer);
            let len = writer.len();
            bytes.truncate(len);
        }
        (bytes, refs)
    }

    #[test]
    fn round_trips_primitives() {
        let (bytes, refs) = roundtrip(|w| {
            w.append_bool(true);
            w.append_i32(-42);
            w.append_f64(3.5);
            w.append_u64(u64::MAX);
        });
        let mut seen = Vec::new();
        decode_stream(&bytes, &refs, |step| seen.push(step.arg));
        assert!(matches!(seen[0], DecodedArg::Bool(true)));
        assert!(matches!(seen[1], DecodedArg::I32(-42)));
        assert!(matches!(seen[2], DecodedArg::F64(v) if v == 3.5));
        assert!(matches!(seen[3], DecodedArg::U64(u64::MAX)));
    }

    #[test]
    fn round_trips_utf8_span() {
        let (bytes, refs) = roundtrip(|w| w.append_utf8_span("hello, world"));
        let mut seen = Vec::new();
        decode_stream(&bytes, &refs, |step| seen.push(step.arg));
        assert!(matches!(seen[0], DecodedArg::Utf8Span("hello, world")));
    }

    #[test]
    fn string_ref_and_format_spec_round_trip() {
        let (bytes, refs) = roundtrip(|w| w.append_string_ref("name", Some("upper")));
        let mut seen = Vec::new();
        decode_stream(&bytes, &refs, |step| {
            seen.push((step.format_spec, step.arg))
        });
        match &seen[0] {
            (Some("upper"), DecodedArg::StringRef(s)) => assert_eq!(s.as_str(), "name"),
            other => panic!("unexpected decode: {other:?}"),
        }
    }

    #[test]
    fn overflow_sets_truncated_and_writes_sentinel() {
        let mut bytes = vec![0u8; 2];
        let mut refs: Vec<Option<ArgString>> = vec![None];
        let mut writer = ArgumentWriter::new(&mut bytes, &mut refs);
        writer.append_u64(1); // needs 9 bytes, only 2 available
        assert!(writer.truncated());
        let len = writer.len();
        let mut seen = Vec::new();
        decode_stream(&bytes[..len], &refs, |step| seen.push(step.arg));
        assert!(matches!(seen.last(), Some(DecodedArg::EndOfTruncated)));
    }

    #[test]
    fn key_value_pair_round_trips() {
        let (bytes, refs) = roundtrip(|w| {
            w.append_key("NumSeconds");
            w.append_i64(86400);
        });
        let mut seen = Vec::new();
        decode_stream(&bytes, &refs, |step| seen.push(step.arg));
        match (&seen[0], &seen[1]) {
            (DecodedArg::Key(k), DecodedArg::I64(v)) => {
                assert_eq!(k.as_str(), "NumSeconds");
                assert_eq!(*v, 86400);
            }
            other => panic!("unexpected decode: {other:?}"),
        }
    }
}
