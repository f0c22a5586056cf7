use crate::error::{Error, ErrorKind};

/// Strict hex text to bytes: even length, `[0-9a-fA-F]` only.
///
/// The reported offset is the offending character position, or the input
/// length for an odd-length input.
pub fn hex_to_bytes(input: &str) -> Result<Vec<u8>, Error> {
    hex::decode(input).map_err(|e| {
        let offset = match e {
            hex::FromHexError::InvalidHexCharacter { index, .. } => index,
            _ => input.len(),
        };
        Error::new(ErrorKind::InvalidHex(e), offset, String::new())
    })
}

/// Lowercase hex, no separators.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}
