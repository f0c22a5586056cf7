use thiserror::Error;

/// Everything that can go wrong while decoding or encoding.
///
/// Kinds are deliberately fine-grained so that callers (and tests) can match
/// on the exact failure class rather than parsing message strings.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorKind {
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error(transparent)]
    InvalidHex(#[from] hex::FromHexError),

    #[error("reserved additional-information value {0}")]
    Reserved(u8),

    #[error("break marker outside an indefinite-length item")]
    UnexpectedBreak,

    #[error("indefinite-length item has no break marker")]
    MissingBreak,

    #[error("indefinite-length chunk inside an indefinite-length string")]
    NestedIndefinite,

    #[error("chunk of a different major type inside an indefinite-length string")]
    InvalidChunk,

    #[error("indefinite-length items are disabled")]
    IndefiniteDisallowed,

    #[error("nesting depth exceeds {0}")]
    DepthExceeded(usize),

    #[error("array of {0} items exceeds the configured maximum")]
    ArrayTooLarge(u64),

    #[error("map of {0} pairs exceeds the configured maximum")]
    MapTooLarge(u64),

    #[error("decoded output exceeds {0} bytes")]
    OutputTooLarge(u64),

    #[error("bignum payload of {0} bytes exceeds the configured maximum")]
    BignumTooLarge(u64),

    #[error("string of {0} bytes exceeds the configured maximum")]
    StringTooLong(u64),

    #[error("decoding timed out")]
    Timeout,

    #[error(transparent)]
    InvalidUtf8(#[from] core::str::Utf8Error),

    #[error("two-byte encoding of simple value {0}")]
    OverlongSimple(u8),

    #[error("map key {0} is not in canonical order")]
    NonCanonicalKeyOrder(usize),

    #[error("duplicate key or set member (item {0})")]
    DuplicateKey(usize),

    #[error("integer argument is not in its shortest form")]
    NonCanonicalInteger,

    #[error("float is losslessly representable in a narrower encoding")]
    NonMinimalFloat,

    #[error("NaN is not encoded as the canonical 0xf97e00")]
    NonCanonicalNaN,

    #[error("break marker between a map key and its value")]
    BreakInsideMapPair,

    #[error("unknown tag {0}")]
    UnknownTag(u64),

    #[error("tag {tag} content must be {expected}")]
    TagShapeMismatch { tag: u64, expected: &'static str },

    #[error("not Plutus data: {0}")]
    PlutusShapeMismatch(&'static str),

    #[error("value cannot be encoded: {0}")]
    EncodingUnsupportedValue(&'static str),
}

/// A decode or encode failure, located in its input.
///
/// `offset` is the byte offset at which the problem was detected (the number
/// of bytes emitted so far, for encoder errors) and `path` is the position
/// within the surrounding structure, in the same notation the source map
/// uses (`""` for the root).
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind} at offset {offset}, path {path:?}")]
pub struct Error {
    pub kind: ErrorKind,
    pub offset: usize,
    pub path: String,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind, offset: usize, path: String) -> Self {
        Error { kind, offset, path }
    }
}
