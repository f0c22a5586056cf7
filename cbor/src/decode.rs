//! The CBOR parser: one state machine shared by plain decoding and
//! source-map decoding, so resource limits and canonical rules cannot
//! diverge between the two entry points.

use crate::encode::key_order;
use crate::error::{Error, ErrorKind};
use crate::limits::{DecodeOptions, Limits};
use crate::source_map::{Recorder, SourceMapEntry};
use crate::value::{FloatWidth, Value};
use crate::{diag, float, hex, tags};
use half::f16;
use num_bigint::BigInt;
use std::cmp::Ordering;
use std::collections::HashSet;

const VALUE_REPR_BUDGET: usize = 64;
const KEY_SEGMENT_BUDGET: usize = 32;

// Flat accounting charge for one decoded node; strings charge their payload
// length on top.
const NODE_COST: u64 = 8;

/// A successful decode.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub value: Value,
    /// Input bytes consumed by the value; trailing bytes are left alone.
    pub bytes_read: usize,
}

/// A successful decode with its source map.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMapped {
    pub value: Value,
    pub bytes_read: usize,
    /// Pre-order: every entry appears before its children.
    pub source_map: Vec<SourceMapEntry>,
}

/// Decode a single data item from the front of `data`.
pub fn decode(data: &[u8], options: &DecodeOptions) -> Result<Decoded, Error> {
    let mut decoder = Decoder::new(data, options, false);
    let value = decoder.parse_value()?;
    Ok(Decoded {
        value,
        bytes_read: decoder.offset,
    })
}

/// Decode a single data item from hex text.
pub fn decode_hex(input: &str, options: &DecodeOptions) -> Result<Decoded, Error> {
    decode(&hex::hex_to_bytes(input)?, options)
}

/// Decode a single data item and record the byte range of every node.
pub fn decode_with_source_map(
    data: &[u8],
    options: &DecodeOptions,
) -> Result<SourceMapped, Error> {
    let mut decoder = Decoder::new(data, options, true);
    let value = decoder.parse_value()?;
    let source_map = decoder
        .recorder
        .take()
        .map(Recorder::into_entries)
        .unwrap_or_default();
    Ok(SourceMapped {
        value,
        bytes_read: decoder.offset,
        source_map,
    })
}

/// Decode hex text and record the byte range of every node.
pub fn decode_with_source_map_hex(
    input: &str,
    options: &DecodeOptions,
) -> Result<SourceMapped, Error> {
    decode_with_source_map(&hex::hex_to_bytes(input)?, options)
}

/// Decode an unframed concatenation of data items (RFC 8742).
pub fn decode_sequence(data: &[u8], options: &DecodeOptions) -> Result<(Vec<Value>, usize), Error> {
    let mut decoder = Decoder::new(data, options, false);
    let mut values = Vec::new();
    while decoder.offset < data.len() {
        values.push(decoder.parse_value()?);
    }
    Ok((values, decoder.offset))
}

pub(crate) struct Decoder<'a> {
    pub(crate) data: &'a [u8],
    pub(crate) offset: usize,
    pub(crate) opts: &'a DecodeOptions,
    limits: Limits,
    path: Vec<String>,
    recorder: Option<Recorder>,
    /// Non-zero while parsing positions that are not addressable source-map
    /// nodes (map keys).
    muted: u32,
    /// Byte ceiling for the next byte string, set by the bignum tags.
    pub(crate) bignum_limit: Option<u64>,
    /// When set, the next array records the byte span of each element
    /// (tag 258 duplicate detection).
    pub(crate) element_spans: Option<Vec<(usize, usize)>>,
}

impl<'a> Decoder<'a> {
    fn new(data: &'a [u8], opts: &'a DecodeOptions, with_source_map: bool) -> Self {
        Decoder {
            data,
            offset: 0,
            opts,
            limits: Limits::new(opts),
            path: Vec::new(),
            recorder: with_source_map.then(Recorder::new),
            muted: 0,
            bignum_limit: None,
            element_spans: None,
        }
    }

    fn path_string(&self) -> String {
        self.path.concat()
    }

    pub(crate) fn err(&self, kind: ErrorKind) -> Error {
        Error::new(kind, self.offset, self.path_string())
    }

    pub(crate) fn err_at(&self, kind: ErrorKind, offset: usize) -> Error {
        Error::new(kind, offset, self.path_string())
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.offset).copied()
    }

    fn read_u8(&mut self) -> Result<u8, Error> {
        let b = self.peek().ok_or_else(|| self.err(ErrorKind::UnexpectedEof))?;
        self.offset += 1;
        Ok(b)
    }

    fn read_exact(&mut self, n: usize) -> Result<&'a [u8], Error> {
        let data: &'a [u8] = self.data;
        let end = self
            .offset
            .checked_add(n)
            .filter(|&end| end <= data.len())
            .ok_or_else(|| self.err(ErrorKind::UnexpectedEof))?;
        let slice = &data[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    /// Read the argument selected by `minor`, reporting whether it used the
    /// shortest possible encoding.
    fn read_argument(&mut self, minor: u8) -> Result<(u64, bool), Error> {
        match minor {
            0..=23 => Ok((minor as u64, true)),
            24 => {
                let v = self.read_u8()?;
                Ok((v as u64, v >= 24))
            }
            25 => {
                let raw = self.read_exact(2)?;
                let v = u16::from_be_bytes([raw[0], raw[1]]);
                Ok((v as u64, v > u8::MAX as u16))
            }
            26 => {
                let raw = self.read_exact(4)?;
                let v = u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]);
                Ok((v as u64, v > u16::MAX as u32))
            }
            27 => {
                let raw = self.read_exact(8)?;
                let v = u64::from_be_bytes([
                    raw[0], raw[1], raw[2], raw[3], raw[4], raw[5], raw[6], raw[7],
                ]);
                Ok((v, v > u32::MAX as u64))
            }
            _ => Err(self.err(ErrorKind::Reserved(minor))),
        }
    }

    fn read_canonical_argument(&mut self, minor: u8, header: usize) -> Result<u64, Error> {
        let (v, shortest) = self.read_argument(minor)?;
        if self.opts.validate_canonical && !shortest {
            return Err(self.err_at(ErrorKind::NonCanonicalInteger, header));
        }
        Ok(v)
    }

    fn check_deadline(&self) -> Result<(), Error> {
        self.limits.check_deadline().map_err(|k| self.err(k))
    }

    fn require_indefinite(&self, header: usize) -> Result<(), Error> {
        if !self.opts.allow_indefinite {
            return Err(self.err_at(ErrorKind::IndefiniteDisallowed, header));
        }
        Ok(())
    }

    fn check_byte_len(
        &self,
        len: u64,
        header: usize,
        bignum_cap: Option<u64>,
    ) -> Result<(), Error> {
        if let Some(cap) = bignum_cap {
            if len > cap {
                return Err(self.err_at(ErrorKind::BignumTooLarge(len), header));
            }
        }
        if len > self.opts.max_byte_string_length {
            return Err(self.err_at(ErrorKind::StringTooLong(len), header));
        }
        Ok(())
    }

    fn check_text_len(&self, len: u64, header: usize) -> Result<(), Error> {
        if len > self.opts.max_text_string_length {
            return Err(self.err_at(ErrorKind::StringTooLong(len), header));
        }
        Ok(())
    }

    fn make_text(&self, bytes: &[u8], header: usize) -> Result<(String, bool), Error> {
        match core::str::from_utf8(bytes) {
            Ok(s) => Ok((s.to_string(), false)),
            Err(e) if self.opts.strict_utf8 => {
                Err(self.err_at(ErrorKind::InvalidUtf8(e), header))
            }
            Err(_) => Ok((String::from_utf8_lossy(bytes).into_owned(), true)),
        }
    }

    /// Parse one value as an addressable node: records a source-map entry
    /// (unless muted) around the actual parse.
    pub(crate) fn parse_value(&mut self) -> Result<Value, Error> {
        let start = self.offset;
        let node = match self.recorder {
            Some(ref mut r) if self.muted == 0 => Some(r.open(self.path.concat(), start)),
            _ => None,
        };
        let value = self.parse_value_at()?;
        if let Some(idx) = node {
            let repr = diag::bounded(&value, VALUE_REPR_BUDGET);
            let major = self.data[start] >> 5;
            if let Some(r) = self.recorder.as_mut() {
                r.close(idx, self.offset, major, value.type_name(), repr);
            }
        }
        Ok(value)
    }

    /// Parse one value without opening a source-map node. Tag content and
    /// map keys come through here directly.
    pub(crate) fn parse_value_at(&mut self) -> Result<Value, Error> {
        let bignum_cap = self.bignum_limit.take();
        let header = self.offset;
        let initial = self.read_u8()?;
        let (major, minor) = (initial >> 5, initial & 0x1F);
        self.limits
            .charge(NODE_COST)
            .map_err(|k| self.err_at(k, header))?;
        match (major, minor) {
            (0, 31) | (1, 31) | (6, 31) => Err(self.err_at(ErrorKind::Reserved(31), header)),

            (0, minor) => Ok(Value::Unsigned(self.read_canonical_argument(minor, header)?)),

            (1, minor) => {
                let n = self.read_canonical_argument(minor, header)?;
                Ok(if n <= i64::MAX as u64 {
                    Value::Negative(-1 - n as i64)
                } else {
                    Value::BigInt(BigInt::from(-1) - BigInt::from(n))
                })
            }

            (2, 31) | (3, 31) => self.parse_chunked_string(major, header, bignum_cap),

            (2, minor) => {
                let len = self.read_canonical_argument(minor, header)?;
                self.check_byte_len(len, header, bignum_cap)?;
                self.limits.charge(len).map_err(|k| self.err_at(k, header))?;
                let payload = self.read_exact(len as usize)?;
                Ok(Value::Bytes {
                    data: payload.to_vec(),
                    chunks: None,
                })
            }

            (3, minor) => {
                let len = self.read_canonical_argument(minor, header)?;
                self.check_text_len(len, header)?;
                self.limits.charge(len).map_err(|k| self.err_at(k, header))?;
                let payload = self.read_exact(len as usize)?;
                let (text, lossy) = self.make_text(payload, header)?;
                Ok(Value::Text {
                    text,
                    chunks: None,
                    lossy,
                })
            }

            (4, 31) => {
                self.require_indefinite(header)?;
                self.limits.enter().map_err(|k| self.err_at(k, header))?;
                let mut spans = self.element_spans.take();
                let mut items = Vec::new();
                loop {
                    self.check_deadline()?;
                    match self.peek() {
                        None => return Err(self.err(ErrorKind::MissingBreak)),
                        Some(0xFF) => {
                            self.offset += 1;
                            break;
                        }
                        Some(_) => {}
                    }
                    self.limits
                        .check_array(items.len() as u64 + 1)
                        .map_err(|k| self.err(k))?;
                    let item_start = self.offset;
                    self.path.push(format!("[{}]", items.len()));
                    let item = self.parse_value();
                    self.path.pop();
                    if let Some(s) = spans.as_mut() {
                        s.push((item_start, self.offset));
                    }
                    items.push(item?);
                }
                self.limits.exit();
                if spans.is_some() {
                    self.element_spans = spans;
                }
                Ok(Value::Array {
                    items,
                    indefinite: true,
                })
            }

            (4, minor) => {
                let count = self.read_canonical_argument(minor, header)?;
                self.limits
                    .check_array(count)
                    .map_err(|k| self.err_at(k, header))?;
                self.limits.enter().map_err(|k| self.err_at(k, header))?;
                let mut spans = self.element_spans.take();
                let mut items = Vec::with_capacity(count.min(1024) as usize);
                for i in 0..count {
                    self.check_deadline()?;
                    let item_start = self.offset;
                    self.path.push(format!("[{i}]"));
                    let item = self.parse_value();
                    self.path.pop();
                    if let Some(s) = spans.as_mut() {
                        s.push((item_start, self.offset));
                    }
                    items.push(item?);
                }
                self.limits.exit();
                if spans.is_some() {
                    self.element_spans = spans;
                }
                Ok(Value::Array {
                    items,
                    indefinite: false,
                })
            }

            (5, 31) => {
                self.require_indefinite(header)?;
                self.limits.enter().map_err(|k| self.err_at(k, header))?;
                let data = self.data;
                let mut entries = Vec::new();
                let mut seen: HashSet<&[u8]> = HashSet::new();
                let mut prev: Option<&[u8]> = None;
                loop {
                    self.check_deadline()?;
                    match self.peek() {
                        None => return Err(self.err(ErrorKind::MissingBreak)),
                        Some(0xFF) => {
                            self.offset += 1;
                            break;
                        }
                        Some(_) => {}
                    }
                    self.limits
                        .check_map(entries.len() as u64 + 1)
                        .map_err(|k| self.err(k))?;
                    let key_start = self.offset;
                    self.muted += 1;
                    let key = self.parse_value();
                    self.muted -= 1;
                    let key = key?;
                    let raw = &data[key_start..self.offset];
                    self.check_key(raw, &mut seen, &mut prev, entries.len(), key_start)?;
                    match self.peek() {
                        None => return Err(self.err(ErrorKind::MissingBreak)),
                        Some(0xFF) => return Err(self.err(ErrorKind::BreakInsideMapPair)),
                        Some(_) => {}
                    }
                    self.path.push(self.key_segment(&key));
                    let value = self.parse_value();
                    self.path.pop();
                    entries.push((key, value?));
                }
                self.limits.exit();
                Ok(Value::Map {
                    entries,
                    indefinite: true,
                })
            }

            (5, minor) => {
                let count = self.read_canonical_argument(minor, header)?;
                self.limits
                    .check_map(count)
                    .map_err(|k| self.err_at(k, header))?;
                self.limits.enter().map_err(|k| self.err_at(k, header))?;
                let data = self.data;
                let mut entries = Vec::with_capacity(count.min(1024) as usize);
                let mut seen: HashSet<&[u8]> = HashSet::new();
                let mut prev: Option<&[u8]> = None;
                for i in 0..count {
                    self.check_deadline()?;
                    let key_start = self.offset;
                    self.muted += 1;
                    let key = self.parse_value();
                    self.muted -= 1;
                    let key = key?;
                    let raw = &data[key_start..self.offset];
                    self.check_key(raw, &mut seen, &mut prev, i as usize, key_start)?;
                    self.path.push(self.key_segment(&key));
                    let value = self.parse_value();
                    self.path.pop();
                    entries.push((key, value?));
                }
                self.limits.exit();
                Ok(Value::Map {
                    entries,
                    indefinite: false,
                })
            }

            (6, minor) => {
                let tag = self.read_canonical_argument(minor, header)?;
                self.check_deadline()?;
                self.limits.enter().map_err(|k| self.err_at(k, header))?;
                let value = tags::dispatch(self, tag, header)?;
                self.limits.exit();
                Ok(value)
            }

            (7, 20) => Ok(Value::Bool(false)),
            (7, 21) => Ok(Value::Bool(true)),
            (7, 22) => Ok(Value::Null),
            (7, 23) => Ok(Value::Undefined),

            (7, minor @ 0..=19) => Ok(Value::Simple(minor)),

            (7, 24) => {
                let v = self.read_u8()?;
                if v < 32 {
                    return Err(self.err_at(ErrorKind::OverlongSimple(v), header));
                }
                Ok(Value::Simple(v))
            }

            (7, 25) => {
                let raw = self.read_exact(2)?;
                let bits = u16::from_be_bytes([raw[0], raw[1]]);
                let value = f64::from(f16::from_bits(bits));
                if self.opts.validate_canonical
                    && value.is_nan()
                    && bits != float::CANONICAL_NAN_F16
                {
                    return Err(self.err_at(ErrorKind::NonCanonicalNaN, header));
                }
                Ok(Value::Float {
                    value,
                    width: FloatWidth::F16,
                })
            }

            (7, 26) => {
                let raw = self.read_exact(4)?;
                let narrow = f32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]);
                if self.opts.validate_canonical {
                    if narrow.is_nan() {
                        return Err(self.err_at(ErrorKind::NonCanonicalNaN, header));
                    }
                    if float::f32_fits_f16(narrow) {
                        return Err(self.err_at(ErrorKind::NonMinimalFloat, header));
                    }
                }
                Ok(Value::Float {
                    value: narrow as f64,
                    width: FloatWidth::F32,
                })
            }

            (7, 27) => {
                let raw = self.read_exact(8)?;
                let value = f64::from_be_bytes([
                    raw[0], raw[1], raw[2], raw[3], raw[4], raw[5], raw[6], raw[7],
                ]);
                if self.opts.validate_canonical {
                    if value.is_nan() {
                        return Err(self.err_at(ErrorKind::NonCanonicalNaN, header));
                    }
                    if float::fits_f32(value) {
                        return Err(self.err_at(ErrorKind::NonMinimalFloat, header));
                    }
                }
                Ok(Value::Float {
                    value,
                    width: FloatWidth::F64,
                })
            }

            (7, 31) => Err(self.err_at(ErrorKind::UnexpectedBreak, header)),

            (7, minor) => Err(self.err_at(ErrorKind::Reserved(minor), header)),

            _ => unreachable!("major type is three bits"),
        }
    }

    fn parse_chunked_string(
        &mut self,
        major: u8,
        header: usize,
        bignum_cap: Option<u64>,
    ) -> Result<Value, Error> {
        self.require_indefinite(header)?;
        let mut total: u64 = 0;
        let mut chunks: Vec<&'a [u8]> = Vec::new();
        loop {
            let b = match self.peek() {
                None => return Err(self.err(ErrorKind::MissingBreak)),
                Some(b) => b,
            };
            if b == 0xFF {
                self.offset += 1;
                break;
            }
            if b >> 5 != major {
                return Err(self.err(ErrorKind::InvalidChunk));
            }
            let chunk_minor = b & 0x1F;
            if chunk_minor == 31 {
                return Err(self.err(ErrorKind::NestedIndefinite));
            }
            let chunk_header = self.offset;
            self.offset += 1;
            let len = self.read_canonical_argument(chunk_minor, chunk_header)?;
            total = total.saturating_add(len);
            if major == 2 {
                self.check_byte_len(total, chunk_header, bignum_cap)?;
            } else {
                self.check_text_len(total, chunk_header)?;
            }
            self.limits
                .charge(len)
                .map_err(|k| self.err_at(k, chunk_header))?;
            chunks.push(self.read_exact(len as usize)?);
        }
        if major == 2 {
            let mut data = Vec::with_capacity(total as usize);
            for chunk in &chunks {
                data.extend_from_slice(chunk);
            }
            Ok(Value::Bytes {
                data,
                chunks: Some(chunks.into_iter().map(<[u8]>::to_vec).collect()),
            })
        } else {
            // RFC 8949 §3.2.3: every chunk must itself be valid UTF-8.
            let mut text = String::with_capacity(total as usize);
            let mut parts = Vec::with_capacity(chunks.len());
            let mut lossy = false;
            for chunk in &chunks {
                let (part, part_lossy) = self.make_text(chunk, header)?;
                lossy |= part_lossy;
                text.push_str(&part);
                parts.push(part);
            }
            Ok(Value::Text {
                text,
                chunks: Some(parts),
                lossy,
            })
        }
    }

    fn check_key<'k>(
        &self,
        raw: &'k [u8],
        seen: &mut HashSet<&'k [u8]>,
        prev: &mut Option<&'k [u8]>,
        index: usize,
        offset: usize,
    ) -> Result<(), Error> {
        if !seen.insert(raw) {
            return Err(self.err_at(ErrorKind::DuplicateKey(index), offset));
        }
        if self.opts.validate_canonical {
            if let Some(p) = prev {
                if key_order(p, raw) != Ordering::Less {
                    return Err(self.err_at(ErrorKind::NonCanonicalKeyOrder(index), offset));
                }
            }
        }
        *prev = Some(raw);
        Ok(())
    }

    fn key_segment(&self, key: &Value) -> String {
        match key {
            Value::Text { text, .. } => format!(".{text}"),
            other => format!("[{}]", diag::bounded(other, KEY_SEGMENT_BUDGET)),
        }
    }
}
