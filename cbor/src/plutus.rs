//! The Cardano Plutus Data model.
//!
//! Plutus values live in a closed universe of five shapes. The constructor
//! tags map compactly: 121..=127 carry constructors 0..=6, 1280..=1400 carry
//! 7..=127, and tag 102 carries any index as a `[index, fields]` pair.

use crate::error::ErrorKind;
use crate::value::Value;
use num_bigint::BigInt;

#[derive(Debug, Clone, PartialEq)]
pub enum PlutusData {
    Constr {
        constructor: u64,
        fields: Vec<PlutusData>,
    },
    Map(Vec<(PlutusData, PlutusData)>),
    List(Vec<PlutusData>),
    Int(BigInt),
    Bytes(Vec<u8>),
}

/// Constructor index carried by a tag, if the tag is in either compact
/// window.
pub(crate) fn constructor_for_tag(tag: u64) -> Option<u64> {
    match tag {
        121..=127 => Some(tag - 121),
        1280..=1400 => Some(tag - 1280 + 7),
        _ => None,
    }
}

/// The compact tag for a constructor index; `None` means the general form
/// (tag 102) is required.
pub(crate) fn tag_for_constructor(constructor: u64) -> Option<u64> {
    match constructor {
        0..=6 => Some(121 + constructor),
        7..=127 => Some(1280 + constructor - 7),
        _ => None,
    }
}

/// Structurally convert a decoded subtree into Plutus data.
pub(crate) fn from_value(value: Value) -> Result<PlutusData, ErrorKind> {
    match value {
        Value::Unsigned(n) => Ok(PlutusData::Int(BigInt::from(n))),
        Value::Negative(n) => Ok(PlutusData::Int(BigInt::from(n))),
        Value::BigInt(n) => Ok(PlutusData::Int(n)),
        Value::Bytes { data, .. } => Ok(PlutusData::Bytes(data)),
        Value::Array { items, .. } => Ok(PlutusData::List(fields_from(items)?)),
        Value::Map { entries, .. } => {
            let mut pairs = Vec::with_capacity(entries.len());
            for (key, value) in entries {
                pairs.push((from_value(key)?, from_value(value)?));
            }
            Ok(PlutusData::Map(pairs))
        }
        Value::Plutus(data) => Ok(data),
        other => Err(ErrorKind::PlutusShapeMismatch(other.type_name())),
    }
}

pub(crate) fn fields_from(items: Vec<Value>) -> Result<Vec<PlutusData>, ErrorKind> {
    items.into_iter().map(from_value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_tag_windows() {
        assert_eq!(constructor_for_tag(121), Some(0));
        assert_eq!(constructor_for_tag(127), Some(6));
        assert_eq!(constructor_for_tag(1280), Some(7));
        assert_eq!(constructor_for_tag(1400), Some(127));
        assert_eq!(constructor_for_tag(128), None);
        assert_eq!(constructor_for_tag(1279), None);
        assert_eq!(constructor_for_tag(1401), None);

        assert_eq!(tag_for_constructor(0), Some(121));
        assert_eq!(tag_for_constructor(6), Some(127));
        assert_eq!(tag_for_constructor(7), Some(1280));
        assert_eq!(tag_for_constructor(127), Some(1400));
        assert_eq!(tag_for_constructor(128), None);
    }

    #[test]
    fn windows_are_inverses() {
        for constructor in 0..=127 {
            let tag = tag_for_constructor(constructor).unwrap();
            assert_eq!(constructor_for_tag(tag), Some(constructor));
        }
    }

    #[test]
    fn conversion_rejects_foreign_shapes() {
        assert!(from_value(Value::Unsigned(7)).is_ok());
        assert!(from_value(Value::bytes(vec![1])).is_ok());
        assert_eq!(
            from_value(Value::Bool(true)),
            Err(ErrorKind::PlutusShapeMismatch("boolean"))
        );
        assert_eq!(
            from_value(Value::float(1.0)),
            Err(ErrorKind::PlutusShapeMismatch("float"))
        );
        assert_eq!(
            from_value(Value::text("x")),
            Err(ErrorKind::PlutusShapeMismatch("text string"))
        );
    }

    #[test]
    fn conversion_recurses_through_collections() {
        let value = Value::array(vec![
            Value::Unsigned(1),
            Value::map(vec![(Value::bytes(vec![0xAA]), Value::Negative(-2))]),
        ]);
        let data = from_value(value).unwrap();
        assert_eq!(
            data,
            PlutusData::List(vec![
                PlutusData::Int(BigInt::from(1)),
                PlutusData::Map(vec![(
                    PlutusData::Bytes(vec![0xAA]),
                    PlutusData::Int(BigInt::from(-2)),
                )]),
            ])
        );
    }
}
