//! The CBOR encoder: a post-order traversal producing deterministic-form
//! output by default.

use crate::error::{Error, ErrorKind};
use crate::plutus::{self, PlutusData};
use crate::value::{FloatWidth, Value};
use crate::{float, hex};
use half::f16;
use num_bigint::{BigInt, Sign};
use num_traits::ToPrimitive;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Encoder configuration.
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    /// Emit RFC 8949 §4.2.1 deterministic form: definite lengths only and
    /// length-lexicographic map key order.
    pub canonical: bool,
    /// Emit each float at the narrowest width that preserves it bit-exactly
    /// (implied by `canonical`).
    pub prefer_shortest_float: bool,
    /// Permit the `undefined` simple value.
    pub allow_undefined: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            canonical: true,
            prefer_shortest_float: true,
            allow_undefined: true,
        }
    }
}

/// Length-lexicographic order on encoded keys: shorter first, equal lengths
/// bytewise ascending. Both the encoder's sort and the decoder's canonical
/// check go through here.
pub(crate) fn key_order(a: &[u8], b: &[u8]) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Encode one value.
pub fn encode(value: &Value, options: &EncodeOptions) -> Result<Vec<u8>, Error> {
    let mut encoder = Encoder::new(options);
    encoder.emit_value(value)?;
    Ok(encoder.data)
}

/// Encode one value as lowercase hex.
pub fn encode_hex(value: &Value, options: &EncodeOptions) -> Result<String, Error> {
    Ok(hex::bytes_to_hex(&encode(value, options)?))
}

/// Encode a sequence of values with no framing (RFC 8742).
pub fn encode_sequence(values: &[Value], options: &EncodeOptions) -> Result<Vec<u8>, Error> {
    let mut encoder = Encoder::new(options);
    for value in values {
        encoder.emit_value(value)?;
    }
    Ok(encoder.data)
}

struct Encoder<'o> {
    data: Vec<u8>,
    opts: &'o EncodeOptions,
}

impl<'o> Encoder<'o> {
    fn new(opts: &'o EncodeOptions) -> Self {
        Encoder {
            data: Vec::new(),
            opts,
        }
    }

    fn err(&self, kind: ErrorKind) -> Error {
        Error::new(kind, self.data.len(), String::new())
    }

    /// Shortest-width argument emission.
    fn emit_uint_minor(&mut self, major: u8, val: u64) {
        if val < 24 {
            self.data.push((major << 5) | val as u8);
        } else if val <= u8::MAX as u64 {
            self.data.push((major << 5) | 24);
            self.data.push(val as u8);
        } else if val <= u16::MAX as u64 {
            self.data.push((major << 5) | 25);
            self.data.extend((val as u16).to_be_bytes());
        } else if val <= u32::MAX as u64 {
            self.data.push((major << 5) | 26);
            self.data.extend((val as u32).to_be_bytes());
        } else {
            self.data.push((major << 5) | 27);
            self.data.extend(val.to_be_bytes());
        }
    }

    fn emit_i64(&mut self, val: i64) {
        if val >= 0 {
            self.emit_uint_minor(0, val as u64);
        } else {
            // -1 - val, without overflowing on i64::MIN.
            self.emit_uint_minor(1, !val as u64);
        }
    }

    fn emit_value(&mut self, value: &Value) -> Result<(), Error> {
        match value {
            Value::Unsigned(n) => {
                self.emit_uint_minor(0, *n);
                Ok(())
            }
            Value::Negative(n) => {
                self.emit_i64(*n);
                Ok(())
            }
            Value::BigInt(n) => {
                self.emit_bigint(n);
                Ok(())
            }
            Value::Bytes { data, chunks } => {
                match chunks {
                    Some(chunks) if !self.opts.canonical => {
                        self.data.push((2 << 5) | 31);
                        for chunk in chunks {
                            self.emit_uint_minor(2, chunk.len() as u64);
                            self.data.extend_from_slice(chunk);
                        }
                        self.data.push(0xFF);
                    }
                    _ => {
                        self.emit_uint_minor(2, data.len() as u64);
                        self.data.extend_from_slice(data);
                    }
                }
                Ok(())
            }
            Value::Text { text, chunks, .. } => {
                match chunks {
                    Some(chunks) if !self.opts.canonical => {
                        self.data.push((3 << 5) | 31);
                        for chunk in chunks {
                            self.emit_uint_minor(3, chunk.len() as u64);
                            self.data.extend_from_slice(chunk.as_bytes());
                        }
                        self.data.push(0xFF);
                    }
                    _ => {
                        self.emit_uint_minor(3, text.len() as u64);
                        self.data.extend_from_slice(text.as_bytes());
                    }
                }
                Ok(())
            }
            Value::Array { items, indefinite } => {
                if *indefinite && !self.opts.canonical {
                    self.data.push((4 << 5) | 31);
                    for item in items {
                        self.emit_value(item)?;
                    }
                    self.data.push(0xFF);
                } else {
                    self.emit_uint_minor(4, items.len() as u64);
                    for item in items {
                        self.emit_value(item)?;
                    }
                }
                Ok(())
            }
            Value::Map { entries, indefinite } => {
                let mut encoded = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    encoded.push((self.encode_detached(key)?, self.encode_detached(value)?));
                }
                self.emit_encoded_map(encoded, *indefinite)
            }
            Value::Tagged(tag, inner) => {
                self.emit_uint_minor(6, *tag);
                self.emit_value(inner)
            }
            Value::Simple(n) => match *n {
                0..=19 => {
                    self.data.push((7 << 5) | *n);
                    Ok(())
                }
                20..=31 => Err(self.err(ErrorKind::EncodingUnsupportedValue(
                    "simple values 20..=31 are reserved",
                ))),
                _ => {
                    self.data.push((7 << 5) | 24);
                    self.data.push(*n);
                    Ok(())
                }
            },
            Value::Bool(b) => {
                self.data.push((7 << 5) | if *b { 21 } else { 20 });
                Ok(())
            }
            Value::Null => {
                self.data.push((7 << 5) | 22);
                Ok(())
            }
            Value::Undefined => {
                if !self.opts.allow_undefined {
                    return Err(self.err(ErrorKind::EncodingUnsupportedValue(
                        "undefined is disabled",
                    )));
                }
                self.data.push((7 << 5) | 23);
                Ok(())
            }
            Value::Float { value, width } => {
                self.emit_float(*value, *width);
                Ok(())
            }
            Value::Plutus(data) => self.emit_plutus(data),
        }
    }

    fn encode_detached(&self, value: &Value) -> Result<Vec<u8>, Error> {
        let mut sub = Encoder::new(self.opts);
        sub.emit_value(value)?;
        Ok(sub.data)
    }

    fn emit_encoded_map(
        &mut self,
        mut pairs: Vec<(Vec<u8>, Vec<u8>)>,
        indefinite: bool,
    ) -> Result<(), Error> {
        if self.opts.canonical {
            pairs.sort_by(|a, b| key_order(&a.0, &b.0));
            for (i, window) in pairs.windows(2).enumerate() {
                if window[0].0 == window[1].0 {
                    return Err(self.err(ErrorKind::DuplicateKey(i + 1)));
                }
            }
        } else {
            let mut seen = HashSet::new();
            for (i, (key, _)) in pairs.iter().enumerate() {
                if !seen.insert(key.as_slice()) {
                    return Err(self.err(ErrorKind::DuplicateKey(i)));
                }
            }
        }
        if indefinite && !self.opts.canonical {
            self.data.push((5 << 5) | 31);
            for (key, value) in &pairs {
                self.data.extend_from_slice(key);
                self.data.extend_from_slice(value);
            }
            self.data.push(0xFF);
        } else {
            self.emit_uint_minor(5, pairs.len() as u64);
            for (key, value) in &pairs {
                self.data.extend_from_slice(key);
                self.data.extend_from_slice(value);
            }
        }
        Ok(())
    }

    fn emit_float(&mut self, value: f64, width: FloatWidth) {
        if self.opts.canonical || self.opts.prefer_shortest_float {
            if value.is_nan() {
                self.data.push((7 << 5) | 25);
                self.data.extend(float::CANONICAL_NAN_F16.to_be_bytes());
            } else if float::fits_f16(value) {
                self.data.push((7 << 5) | 25);
                self.data.extend(f16::from_f64(value).to_be_bytes());
            } else if float::fits_f32(value) {
                self.data.push((7 << 5) | 26);
                self.data.extend((value as f32).to_be_bytes());
            } else {
                self.data.push((7 << 5) | 27);
                self.data.extend(value.to_be_bytes());
            }
            return;
        }
        // Width-preserving emission; promote when the value no longer fits.
        match width {
            FloatWidth::F16 if value.is_nan() || float::fits_f16(value) => {
                self.data.push((7 << 5) | 25);
                self.data.extend(f16::from_f64(value).to_be_bytes());
            }
            FloatWidth::F16 | FloatWidth::F32 if value.is_nan() || float::fits_f32(value) => {
                self.data.push((7 << 5) | 26);
                self.data.extend((value as f32).to_be_bytes());
            }
            _ => {
                self.data.push((7 << 5) | 27);
                self.data.extend(value.to_be_bytes());
            }
        }
    }

    fn emit_bigint(&mut self, n: &BigInt) {
        if let Some(v) = n.to_u64() {
            return self.emit_uint_minor(0, v);
        }
        if n.sign() == Sign::Minus {
            // Major type 1 carries -1 - argument, down to -2^64.
            let argument = BigInt::from(-1) - n;
            if let Some(v) = argument.to_u64() {
                return self.emit_uint_minor(1, v);
            }
            self.emit_uint_minor(6, 3);
            let bytes = argument.magnitude().to_bytes_be();
            self.emit_uint_minor(2, bytes.len() as u64);
            self.data.extend_from_slice(&bytes);
        } else {
            self.emit_uint_minor(6, 2);
            let bytes = n.magnitude().to_bytes_be();
            self.emit_uint_minor(2, bytes.len() as u64);
            self.data.extend_from_slice(&bytes);
        }
    }

    fn emit_plutus(&mut self, data: &PlutusData) -> Result<(), Error> {
        match data {
            PlutusData::Constr {
                constructor,
                fields,
            } => {
                match plutus::tag_for_constructor(*constructor) {
                    Some(tag) => {
                        self.emit_uint_minor(6, tag);
                        self.emit_uint_minor(4, fields.len() as u64);
                    }
                    None => {
                        self.emit_uint_minor(6, 102);
                        self.emit_uint_minor(4, 2);
                        self.emit_uint_minor(0, *constructor);
                        self.emit_uint_minor(4, fields.len() as u64);
                    }
                }
                for field in fields {
                    self.emit_plutus(field)?;
                }
                Ok(())
            }
            PlutusData::Map(pairs) => {
                let mut encoded = Vec::with_capacity(pairs.len());
                for (key, value) in pairs {
                    let mut ke = Encoder::new(self.opts);
                    ke.emit_plutus(key)?;
                    let mut ve = Encoder::new(self.opts);
                    ve.emit_plutus(value)?;
                    encoded.push((ke.data, ve.data));
                }
                self.emit_encoded_map(encoded, false)
            }
            PlutusData::List(items) => {
                self.emit_uint_minor(4, items.len() as u64);
                for item in items {
                    self.emit_plutus(item)?;
                }
                Ok(())
            }
            PlutusData::Int(n) => {
                self.emit_bigint(n);
                Ok(())
            }
            PlutusData::Bytes(bytes) => {
                self.emit_uint_minor(2, bytes.len() as u64);
                self.data.extend_from_slice(bytes);
                Ok(())
            }
        }
    }
}
