//! Semantic validation for recognized tags.
//!
//! Every tag's content is parsed by the same limit-aware dispatcher as any
//! other value; there is no separate, unlimited path. `strict_tags` turns
//! unknown tags into errors and enables full content validation for the
//! text-content tags (RFC 3339 date-times, URIs, base64).

use crate::decode::Decoder;
use crate::error::{Error, ErrorKind};
use crate::plutus::{self, PlutusData};
use crate::value::Value;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use num_bigint::{BigInt, BigUint};
use std::collections::HashSet;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

const PAD_INDIFFERENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const BASE64_URL: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, PAD_INDIFFERENT);
const BASE64_CLASSIC: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, PAD_INDIFFERENT);

pub(crate) fn dispatch(d: &mut Decoder, tag: u64, header: usize) -> Result<Value, Error> {
    match tag {
        0 => date_time(d, header),
        1 => epoch_time(d, header),
        2 | 3 => bignum(d, tag, header),
        4 | 5 => exponent_mantissa(d, tag, header),
        32..=36 => text_content(d, tag, header),
        258 => set(d, header),
        102 => plutus_general(d, header),
        121..=127 | 1280..=1400 => plutus_constr(d, tag, header),
        _ => {
            if d.opts.strict_tags {
                return Err(d.err_at(ErrorKind::UnknownTag(tag), header));
            }
            tracing::warn!(tag, "passing through unrecognized tag");
            let inner = d.parse_value_at()?;
            Ok(Value::Tagged(tag, Box::new(inner)))
        }
    }
}

fn shape(d: &Decoder, tag: u64, expected: &'static str, header: usize) -> Error {
    d.err_at(ErrorKind::TagShapeMismatch { tag, expected }, header)
}

fn date_time(d: &mut Decoder, header: usize) -> Result<Value, Error> {
    let inner = d.parse_value_at()?;
    let Value::Text { text, .. } = &inner else {
        return Err(shape(d, 0, "a text string", header));
    };
    if d.opts.strict_tags && OffsetDateTime::parse(text, &Rfc3339).is_err() {
        return Err(shape(d, 0, "an RFC 3339 date-time", header));
    }
    Ok(Value::Tagged(0, Box::new(inner)))
}

fn epoch_time(d: &mut Decoder, header: usize) -> Result<Value, Error> {
    let inner = d.parse_value_at()?;
    match inner {
        Value::Unsigned(_) | Value::Negative(_) | Value::BigInt(_) | Value::Float { .. } => {
            Ok(Value::Tagged(1, Box::new(inner)))
        }
        _ => Err(shape(d, 1, "an integer or float", header)),
    }
}

fn bignum(d: &mut Decoder, tag: u64, header: usize) -> Result<Value, Error> {
    d.bignum_limit = Some(d.opts.max_bignum_bytes);
    let inner = d.parse_value_at();
    d.bignum_limit = None;
    match inner? {
        Value::Bytes { data, .. } => {
            let n = BigInt::from(BigUint::from_bytes_be(&data));
            Ok(Value::BigInt(if tag == 2 {
                n
            } else {
                BigInt::from(-1) - n
            }))
        }
        _ => Err(shape(d, tag, "a byte string", header)),
    }
}

fn exponent_mantissa(d: &mut Decoder, tag: u64, header: usize) -> Result<Value, Error> {
    let inner = d.parse_value_at()?;
    let well_formed = match &inner {
        Value::Array { items, .. } if items.len() == 2 => {
            matches!(items[0], Value::Unsigned(_) | Value::Negative(_))
                && matches!(
                    items[1],
                    Value::Unsigned(_) | Value::Negative(_) | Value::BigInt(_)
                )
        }
        _ => false,
    };
    if !well_formed {
        return Err(shape(d, tag, "[integer exponent, integer mantissa]", header));
    }
    Ok(Value::Tagged(tag, Box::new(inner)))
}

fn text_content(d: &mut Decoder, tag: u64, header: usize) -> Result<Value, Error> {
    let inner = d.parse_value_at()?;
    let Value::Text { text, .. } = &inner else {
        return Err(shape(d, tag, "a text string", header));
    };
    if d.opts.strict_tags {
        let (valid, expected) = match tag {
            32 => (has_uri_scheme(text), "a URI"),
            33 => (BASE64_URL.decode(text.as_bytes()).is_ok(), "base64url text"),
            34 => (BASE64_CLASSIC.decode(text.as_bytes()).is_ok(), "base64 text"),
            // 35 (regex) and 36 (MIME message): type check only.
            _ => (true, ""),
        };
        if !valid {
            return Err(shape(d, tag, expected, header));
        }
    }
    Ok(Value::Tagged(tag, Box::new(inner)))
}

/// RFC 3986 scheme syntax: ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) ":".
fn has_uri_scheme(text: &str) -> bool {
    let Some((scheme, _)) = text.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn set(d: &mut Decoder, header: usize) -> Result<Value, Error> {
    d.element_spans = Some(Vec::new());
    let inner = d.parse_value_at();
    let spans = d.element_spans.take();
    let inner = inner?;
    if !matches!(inner, Value::Array { .. }) {
        return Err(shape(d, 258, "an array", header));
    }
    if let Some(spans) = spans {
        let mut seen = HashSet::new();
        for (i, (start, end)) in spans.iter().enumerate() {
            if !seen.insert(&d.data[*start..*end]) {
                return Err(d.err_at(ErrorKind::DuplicateKey(i), *start));
            }
        }
    }
    Ok(Value::Tagged(258, Box::new(inner)))
}

fn plutus_constr(d: &mut Decoder, tag: u64, header: usize) -> Result<Value, Error> {
    let Some(constructor) = plutus::constructor_for_tag(tag) else {
        return Err(d.err_at(ErrorKind::UnknownTag(tag), header));
    };
    let inner = d.parse_value_at()?;
    let Value::Array { items, .. } = inner else {
        return Err(shape(d, tag, "an array of constructor fields", header));
    };
    let fields = plutus::fields_from(items).map_err(|k| d.err_at(k, header))?;
    Ok(Value::Plutus(PlutusData::Constr {
        constructor,
        fields,
    }))
}

fn plutus_general(d: &mut Decoder, header: usize) -> Result<Value, Error> {
    let inner = d.parse_value_at()?;
    let Value::Array { mut items, .. } = inner else {
        return Err(shape(d, 102, "a [constructor, fields] pair", header));
    };
    if items.len() != 2 {
        return Err(shape(d, 102, "a [constructor, fields] pair", header));
    }
    let fields_value = items.pop();
    let index_value = items.pop();
    let Some(Value::Unsigned(constructor)) = index_value else {
        return Err(shape(d, 102, "an unsigned constructor index", header));
    };
    let Some(Value::Array { items: fields, .. }) = fields_value else {
        return Err(shape(d, 102, "an array of constructor fields", header));
    };
    let fields = plutus::fields_from(fields).map_err(|k| d.err_at(k, header))?;
    Ok(Value::Plutus(PlutusData::Constr {
        constructor,
        fields,
    }))
}
