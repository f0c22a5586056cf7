use crate::plutus::PlutusData;
use num_bigint::BigInt;

/// The wire width a float was decoded from (or should be encoded at when
/// shortest-form selection is off).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatWidth {
    F16,
    F32,
    F64,
}

/// A decoded CBOR data item.
///
/// The union is closed: every value either inlines its payload or owns a
/// small heap allocation. Framing details that survive decoding (indefinite
/// flags, chunk boundaries, the float width) are carried alongside the
/// content so a non-canonical re-encode can reproduce the original bytes,
/// but they do not participate in equality.
#[derive(Debug, Clone)]
pub enum Value {
    /// Major type 0.
    Unsigned(u64),
    /// Major type 1, for arguments that fit `i64`.
    Negative(i64),
    /// Arbitrary precision: tag 2/3 bignums and major-1 arguments below
    /// `i64::MIN`.
    BigInt(BigInt),
    /// Major type 2. `chunks` holds the chunk payloads when the string was
    /// read from indefinite-length form.
    Bytes {
        data: Vec<u8>,
        chunks: Option<Vec<Vec<u8>>>,
    },
    /// Major type 3. `lossy` is set when strict UTF-8 was off and invalid
    /// sequences were replaced.
    Text {
        text: String,
        chunks: Option<Vec<String>>,
        lossy: bool,
    },
    /// Major type 4.
    Array { items: Vec<Value>, indefinite: bool },
    /// Major type 5, in input order. Keys may be any value.
    Map {
        entries: Vec<(Value, Value)>,
        indefinite: bool,
    },
    /// Major type 6, for tags without dedicated handling.
    Tagged(u64, Box<Value>),
    /// Major type 7, values 0..=19 and 32..=255.
    Simple(u8),
    Bool(bool),
    Null,
    Undefined,
    /// Major type 7 floats. `-0.0` and NaN payloads are preserved bit-exactly.
    Float { value: f64, width: FloatWidth },
    /// Produced by the Plutus constructor tags (102, 121..=127, 1280..=1400).
    Plutus(PlutusData),
}

impl Value {
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Value::Bytes {
            data: data.into(),
            chunks: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Value::Text {
            text: text.into(),
            chunks: None,
            lossy: false,
        }
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array {
            items,
            indefinite: false,
        }
    }

    pub fn map(entries: Vec<(Value, Value)>) -> Self {
        Value::Map {
            entries,
            indefinite: false,
        }
    }

    pub fn float(value: f64) -> Self {
        Value::Float {
            value,
            width: FloatWidth::F64,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Unsigned(_) => "unsigned integer",
            Value::Negative(_) => "negative integer",
            Value::BigInt(_) => "bignum",
            Value::Bytes { .. } => "byte string",
            Value::Text { .. } => "text string",
            Value::Array { .. } => "array",
            Value::Map { .. } => "map",
            Value::Tagged(..) => "tagged value",
            Value::Simple(_) => "simple value",
            Value::Bool(_) => "boolean",
            Value::Null => "null",
            Value::Undefined => "undefined",
            Value::Float { .. } => "float",
            Value::Plutus(_) => "plutus data",
        }
    }

    /// The numeric content of an integer value, whatever its representation.
    fn as_int(&self) -> Option<BigInt> {
        match self {
            Value::Unsigned(n) => Some(BigInt::from(*n)),
            Value::Negative(n) => Some(BigInt::from(*n)),
            Value::BigInt(n) => Some(n.clone()),
            _ => None,
        }
    }
}

/// Structural equality over content.
///
/// Integers compare numerically across representations (a bignum that holds
/// `5` equals `Unsigned(5)`), floats compare bit-exactly (`-0.0 != 0.0`,
/// `NaN == NaN`), and framing metadata is ignored throughout.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bytes { data: a, .. }, Value::Bytes { data: b, .. }) => a == b,
            (Value::Text { text: a, .. }, Value::Text { text: b, .. }) => a == b,
            (Value::Array { items: a, .. }, Value::Array { items: b, .. }) => a == b,
            (Value::Map { entries: a, .. }, Value::Map { entries: b, .. }) => a == b,
            (Value::Tagged(ta, va), Value::Tagged(tb, vb)) => ta == tb && va == vb,
            (Value::Simple(a), Value::Simple(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Undefined, Value::Undefined) => true,
            (Value::Float { value: a, .. }, Value::Float { value: b, .. }) => {
                a.to_bits() == b.to_bits()
            }
            (Value::Plutus(a), Value::Plutus(b)) => a == b,
            (a, b) => match (a.as_int(), b.as_int()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_compare_numerically() {
        assert_eq!(Value::Unsigned(5), Value::BigInt(BigInt::from(5)));
        assert_eq!(Value::Negative(-5), Value::BigInt(BigInt::from(-5)));
        assert_ne!(Value::Unsigned(5), Value::Negative(-5));
    }

    #[test]
    fn floats_compare_bit_exactly() {
        assert_ne!(Value::float(0.0), Value::float(-0.0));
        assert_eq!(Value::float(f64::NAN), Value::float(f64::NAN));
        assert_eq!(
            Value::Float {
                value: 1.5,
                width: FloatWidth::F16
            },
            Value::float(1.5)
        );
    }

    #[test]
    fn framing_metadata_is_ignored() {
        let chunked = Value::Bytes {
            data: vec![1, 2],
            chunks: Some(vec![vec![1], vec![2]]),
        };
        assert_eq!(chunked, Value::bytes(vec![1, 2]));

        let streamed = Value::Array {
            items: vec![Value::Unsigned(1)],
            indefinite: true,
        };
        assert_eq!(streamed, Value::array(vec![Value::Unsigned(1)]));
    }
}
