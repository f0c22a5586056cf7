use crate::error::ErrorKind;
use std::time::{Duration, Instant};

/// Decoder configuration: resource ceilings and mode flags.
///
/// Ceilings are enforced against declared sizes before any proportional
/// allocation happens, and identically whether or not a source map is being
/// recorded.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Nesting ceiling for arrays, maps and tags.
    pub max_depth: usize,
    /// Largest acceptable array item count, declared or streamed.
    pub max_array_length: u64,
    /// Largest acceptable map pair count, declared or streamed.
    pub max_map_size: u64,
    /// Per-string ceiling for byte strings (chunk total for indefinite form).
    pub max_byte_string_length: u64,
    /// Per-string ceiling for text strings (chunk total for indefinite form).
    pub max_text_string_length: u64,
    /// Ceiling on the payload handed to a tag 2/3 bignum.
    pub max_bignum_bytes: u64,
    /// Ceiling on the running size of the decoded tree.
    pub max_output_size: u64,
    /// Cooperative wall-clock ceiling, checked at every collection item and
    /// tag dispatch.
    pub timeout: Option<Duration>,
    /// Accept indefinite-length framing.
    pub allow_indefinite: bool,
    /// Reject invalid UTF-8 in text strings instead of substituting.
    pub strict_utf8: bool,
    /// Enforce RFC 8949 §4.2.1 deterministic form: shortest arguments,
    /// shortest floats, the canonical NaN, and canonical map key order.
    pub validate_canonical: bool,
    /// Fail on unknown tags and fully validate text-content tags.
    pub strict_tags: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            max_depth: 128,
            max_array_length: 65_536,
            max_map_size: 65_536,
            max_byte_string_length: 16 * 1024 * 1024,
            max_text_string_length: 16 * 1024 * 1024,
            max_bignum_bytes: 4096,
            max_output_size: 64 * 1024 * 1024,
            timeout: None,
            allow_indefinite: true,
            strict_utf8: true,
            validate_canonical: false,
            strict_tags: false,
        }
    }
}

impl DecodeOptions {
    /// Defaults plus canonical-form validation.
    pub fn canonical() -> Self {
        DecodeOptions {
            validate_canonical: true,
            ..Default::default()
        }
    }
}

/// Per-call resource accountant.
///
/// Holds the frozen ceilings, the current nesting depth, the running output
/// total and the start instant. One lives for exactly one top-level decode.
pub(crate) struct Limits {
    max_depth: usize,
    max_array_length: u64,
    max_map_size: u64,
    max_output_size: u64,
    timeout: Option<Duration>,
    depth: usize,
    output: u64,
    started: Instant,
}

impl Limits {
    pub fn new(options: &DecodeOptions) -> Self {
        Limits {
            max_depth: options.max_depth,
            max_array_length: options.max_array_length,
            max_map_size: options.max_map_size,
            max_output_size: options.max_output_size,
            timeout: options.timeout,
            depth: 0,
            output: 0,
            started: Instant::now(),
        }
    }

    /// Enter a nested array, map or tag.
    pub fn enter(&mut self) -> Result<(), ErrorKind> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ErrorKind::DepthExceeded(self.max_depth));
        }
        Ok(())
    }

    pub fn exit(&mut self) {
        self.depth -= 1;
    }

    pub fn check_deadline(&self) -> Result<(), ErrorKind> {
        match self.timeout {
            Some(timeout) if self.started.elapsed() >= timeout => Err(ErrorKind::Timeout),
            _ => Ok(()),
        }
    }

    pub fn check_array(&self, items: u64) -> Result<(), ErrorKind> {
        if items > self.max_array_length {
            return Err(ErrorKind::ArrayTooLarge(items));
        }
        Ok(())
    }

    pub fn check_map(&self, pairs: u64) -> Result<(), ErrorKind> {
        if pairs > self.max_map_size {
            return Err(ErrorKind::MapTooLarge(pairs));
        }
        Ok(())
    }

    /// Account for `size` bytes of decoded output.
    pub fn charge(&mut self, size: u64) -> Result<(), ErrorKind> {
        self.output = self.output.saturating_add(size);
        if self.output > self.max_output_size {
            return Err(ErrorKind::OutputTooLarge(self.max_output_size));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(options: &DecodeOptions) -> Limits {
        Limits::new(options)
    }

    #[test]
    fn depth_fails_past_the_ceiling() {
        let options = DecodeOptions {
            max_depth: 2,
            ..Default::default()
        };
        let mut l = limits(&options);
        assert!(l.enter().is_ok());
        assert!(l.enter().is_ok());
        assert_eq!(l.enter(), Err(ErrorKind::DepthExceeded(2)));
    }

    #[test]
    fn depth_is_released_on_exit() {
        let options = DecodeOptions {
            max_depth: 1,
            ..Default::default()
        };
        let mut l = limits(&options);
        assert!(l.enter().is_ok());
        l.exit();
        assert!(l.enter().is_ok());
    }

    #[test]
    fn output_accumulates_across_charges() {
        let options = DecodeOptions {
            max_output_size: 10,
            ..Default::default()
        };
        let mut l = limits(&options);
        assert!(l.charge(6).is_ok());
        assert_eq!(l.charge(6), Err(ErrorKind::OutputTooLarge(10)));
    }

    #[test]
    fn zero_timeout_trips_immediately() {
        let options = DecodeOptions {
            timeout: Some(Duration::ZERO),
            ..Default::default()
        };
        assert_eq!(limits(&options).check_deadline(), Err(ErrorKind::Timeout));
    }
}
