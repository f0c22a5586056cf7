//! CBOR diagnostic notation (RFC 8949 §8) over decoded values.

use crate::plutus::{self, PlutusData};
use crate::value::Value;

/// Render a decoded value as diagnostic notation.
pub fn to_diagnostic(value: &Value) -> String {
    let mut out = Out {
        text: String::new(),
        limit: None,
    };
    let _ = write_value(&mut out, value);
    out.text
}

/// Bounded rendering for source-map `value_repr`s: output is cut at
/// `budget` bytes and finished with an ellipsis.
pub(crate) fn bounded(value: &Value, budget: usize) -> String {
    let mut out = Out {
        text: String::new(),
        limit: Some(budget),
    };
    if write_value(&mut out, value).is_err() {
        let mut text = out.text;
        let mut end = budget.min(text.len());
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
        text.push('…');
        return text;
    }
    out.text
}

struct Truncated;

struct Out {
    text: String,
    limit: Option<usize>,
}

impl Out {
    fn push(&mut self, piece: &str) -> Result<(), Truncated> {
        self.text.push_str(piece);
        match self.limit {
            Some(limit) if self.text.len() > limit => Err(Truncated),
            _ => Ok(()),
        }
    }
}

fn write_value(out: &mut Out, value: &Value) -> Result<(), Truncated> {
    match value {
        Value::Unsigned(n) => out.push(&n.to_string()),
        Value::Negative(n) => out.push(&n.to_string()),
        Value::BigInt(n) => out.push(&n.to_string()),
        Value::Bytes { data, chunks } => match chunks {
            Some(chunks) => {
                out.push("(_ ")?;
                for (i, chunk) in chunks.iter().enumerate() {
                    if i > 0 {
                        out.push(", ")?;
                    }
                    out.push(&format!("h'{}'", hex::encode(chunk)))?;
                }
                out.push(")")
            }
            None => out.push(&format!("h'{}'", hex::encode(data))),
        },
        Value::Text { text, chunks, .. } => match chunks {
            Some(chunks) => {
                out.push("(_ ")?;
                for (i, chunk) in chunks.iter().enumerate() {
                    if i > 0 {
                        out.push(", ")?;
                    }
                    out.push(&format!("\"{}\"", escape_text(chunk)))?;
                }
                out.push(")")
            }
            None => out.push(&format!("\"{}\"", escape_text(text))),
        },
        Value::Array { items, indefinite } => {
            out.push(if *indefinite { "[_ " } else { "[" })?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(", ")?;
                }
                write_value(out, item)?;
            }
            out.push("]")
        }
        Value::Map { entries, indefinite } => {
            out.push(if *indefinite { "{_ " } else { "{" })?;
            for (i, (key, value)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push(", ")?;
                }
                write_value(out, key)?;
                out.push(": ")?;
                write_value(out, value)?;
            }
            out.push("}")
        }
        Value::Tagged(tag, inner) => {
            out.push(&format!("{tag}("))?;
            write_value(out, inner)?;
            out.push(")")
        }
        Value::Simple(n) => out.push(&format!("simple({n})")),
        Value::Bool(b) => out.push(if *b { "true" } else { "false" }),
        Value::Null => out.push("null"),
        Value::Undefined => out.push("undefined"),
        Value::Float { value, .. } => {
            if value.is_nan() {
                out.push("NaN")
            } else if value.is_infinite() {
                out.push(if *value > 0.0 { "Infinity" } else { "-Infinity" })
            } else {
                out.push(&format!("{value:?}"))
            }
        }
        Value::Plutus(data) => write_plutus(out, data),
    }
}

fn write_plutus(out: &mut Out, data: &PlutusData) -> Result<(), Truncated> {
    match data {
        PlutusData::Constr {
            constructor,
            fields,
        } => {
            match plutus::tag_for_constructor(*constructor) {
                Some(tag) => out.push(&format!("{tag}(["))?,
                None => out.push(&format!("102([{constructor}, ["))?,
            }
            for (i, field) in fields.iter().enumerate() {
                if i > 0 {
                    out.push(", ")?;
                }
                write_plutus(out, field)?;
            }
            match plutus::tag_for_constructor(*constructor) {
                Some(_) => out.push("])"),
                None => out.push("]])"),
            }
        }
        PlutusData::Map(pairs) => {
            out.push("{")?;
            for (i, (key, value)) in pairs.iter().enumerate() {
                if i > 0 {
                    out.push(", ")?;
                }
                write_plutus(out, key)?;
                out.push(": ")?;
                write_plutus(out, value)?;
            }
            out.push("}")
        }
        PlutusData::List(items) => {
            out.push("[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(", ")?;
                }
                write_plutus(out, item)?;
            }
            out.push("]")
        }
        PlutusData::Int(n) => out.push(&n.to_string()),
        PlutusData::Bytes(bytes) => out.push(&format!("h'{}'", hex::encode(bytes))),
    }
}

fn escape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if c.is_control() => {
                result.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    #[test]
    fn scalars() {
        assert_eq!(to_diagnostic(&Value::Unsigned(42)), "42");
        assert_eq!(to_diagnostic(&Value::Negative(-1)), "-1");
        assert_eq!(to_diagnostic(&Value::Bool(true)), "true");
        assert_eq!(to_diagnostic(&Value::Null), "null");
        assert_eq!(to_diagnostic(&Value::Undefined), "undefined");
        assert_eq!(to_diagnostic(&Value::Simple(16)), "simple(16)");
        assert_eq!(
            to_diagnostic(&Value::BigInt(BigInt::from(18446744073709551616u128))),
            "18446744073709551616"
        );
    }

    #[test]
    fn floats() {
        assert_eq!(to_diagnostic(&Value::float(1.5)), "1.5");
        assert_eq!(to_diagnostic(&Value::float(1.0)), "1.0");
        assert_eq!(to_diagnostic(&Value::float(-0.0)), "-0.0");
        assert_eq!(to_diagnostic(&Value::float(f64::NAN)), "NaN");
        assert_eq!(to_diagnostic(&Value::float(f64::INFINITY)), "Infinity");
        assert_eq!(to_diagnostic(&Value::float(f64::NEG_INFINITY)), "-Infinity");
    }

    #[test]
    fn strings_and_collections() {
        assert_eq!(to_diagnostic(&Value::bytes(vec![0xDE, 0xAD])), "h'dead'");
        assert_eq!(to_diagnostic(&Value::text("a\"b")), "\"a\\\"b\"");
        assert_eq!(
            to_diagnostic(&Value::array(vec![
                Value::Unsigned(1),
                Value::Unsigned(2),
                Value::Unsigned(3),
            ])),
            "[1, 2, 3]"
        );
        assert_eq!(
            to_diagnostic(&Value::map(vec![(Value::Unsigned(1), Value::text("a"))])),
            "{1: \"a\"}"
        );
        assert_eq!(
            to_diagnostic(&Value::Tagged(24, Box::new(Value::bytes(vec![1, 2])))),
            "24(h'0102')"
        );
    }

    #[test]
    fn indefinite_markers() {
        assert_eq!(
            to_diagnostic(&Value::Array {
                items: vec![Value::Unsigned(1)],
                indefinite: true,
            }),
            "[_ 1]"
        );
        assert_eq!(
            to_diagnostic(&Value::Text {
                text: "ab".to_string(),
                chunks: Some(vec!["a".to_string(), "b".to_string()]),
                lossy: false,
            }),
            "(_ \"a\", \"b\")"
        );
    }

    #[test]
    fn plutus_constructors() {
        let data = PlutusData::Constr {
            constructor: 1,
            fields: vec![PlutusData::Int(BigInt::from(7))],
        };
        assert_eq!(to_diagnostic(&Value::Plutus(data)), "122([7])");

        let general = PlutusData::Constr {
            constructor: 500,
            fields: vec![],
        };
        assert_eq!(to_diagnostic(&Value::Plutus(general)), "102([500, []])");
    }

    #[test]
    fn bounded_output_is_truncated() {
        let big = Value::array((0u64..100).map(Value::Unsigned).collect());
        let repr = bounded(&big, 16);
        assert!(repr.ends_with('…'));
        assert!(repr.len() <= 16 + '…'.len_utf8());
        assert_eq!(bounded(&Value::Unsigned(7), 16), "7");
    }
}
