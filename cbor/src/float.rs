use half::f16;
use num_traits::FromPrimitive;

/// The one NaN bit pattern deterministic encoding permits.
pub(crate) const CANONICAL_NAN_F16: u16 = 0x7e00;

/// True when `value` survives a round trip through binary16 bit-exactly.
///
/// Bit comparison rather than `==` so `-0.0` is distinct from `0.0`. NaN is
/// excluded: its canonical form is a fixed bit pattern, not a width choice.
pub(crate) fn fits_f16(value: f64) -> bool {
    !value.is_nan() && f64::from(f16::from_f64(value)).to_bits() == value.to_bits()
}

/// True when `value` survives a round trip through binary32 bit-exactly.
pub(crate) fn fits_f32(value: f64) -> bool {
    if value.is_nan() {
        return false;
    }
    match f32::from_f64(value) {
        Some(narrow) => f64::from(narrow).to_bits() == value.to_bits(),
        None => false,
    }
}

/// True when the binary32 `value` survives a round trip through binary16.
pub(crate) fn f32_fits_f16(value: f32) -> bool {
    !value.is_nan() && f32::from(f16::from_f32(value)).to_bits() == value.to_bits()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f16_range_edges() {
        assert!(fits_f16(0.0));
        assert!(fits_f16(-0.0));
        assert!(fits_f16(1.5));
        assert!(fits_f16(65504.0));
        assert!(fits_f16(f64::INFINITY));
        assert!(fits_f16(f64::NEG_INFINITY));
        // Smallest binary16 subnormal.
        assert!(fits_f16(5.960464477539063e-8));
        assert!(!fits_f16(65505.0));
        assert!(!fits_f16(1.1));
        assert!(!fits_f16(f64::NAN));
    }

    #[test]
    fn f32_range_edges() {
        assert!(fits_f32(100000.0));
        assert!(fits_f32(3.4028234663852886e38));
        assert!(!fits_f32(1.1));
        assert!(!fits_f32(1.0e300));
        assert!(!fits_f32(f64::NAN));
    }

    #[test]
    fn zero_signs_are_not_conflated() {
        assert!(fits_f16(-0.0));
        assert_eq!(f64::from(f16::from_f64(-0.0)).to_bits(), (-0.0f64).to_bits());
        assert_ne!((-0.0f64).to_bits(), 0.0f64.to_bits());
    }
}
