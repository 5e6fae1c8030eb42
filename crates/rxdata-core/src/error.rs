//! Error types for Marshal decoding.

use crate::cache::CacheKind;
use thiserror::Error;

/// Errors that can occur while decoding a Marshal stream.
///
/// Every variant that originates inside the stream carries the byte offset at
/// which it was detected. Any error aborts the whole decode; there is no
/// partial result.
#[derive(Error, Debug)]
pub enum MarshalError {
    /// The stream ended in the middle of a value.
    #[error("unexpected end of input at offset {offset:#x} (need {need} bytes, have {have})")]
    UnexpectedEndOfInput {
        offset: usize,
        need: usize,
        have: usize,
    },

    /// The tag byte is not part of the Marshal format.
    #[error("unknown tag {tag:#04x} at offset {offset:#x}")]
    UnknownTag { tag: u8, offset: usize },

    /// The tag or class is recognized but intentionally not decoded.
    #[error("unsupported {what} at offset {offset:#x}")]
    UnsupportedFormat { what: String, offset: usize },

    /// A position that requires a specific kind of value received another kind.
    #[error("type mismatch at offset {offset:#x}: {context} must be {expected}, found {found}")]
    TypeMismatch {
        context: &'static str,
        expected: &'static str,
        found: String,
        offset: usize,
    },

    /// A backreference named a slot that does not exist (yet).
    #[error("bad {cache} backreference {index} at offset {offset:#x} (cache holds {len})")]
    BadBackreference {
        cache: CacheKind,
        index: i32,
        len: usize,
        offset: usize,
    },

    /// A length or count prefix was negative.
    #[error("invalid {what} length {len} at offset {offset:#x}")]
    InvalidLength {
        what: &'static str,
        len: i32,
        offset: usize,
    },

    /// Float text that is neither a decimal number nor nan/inf/-inf.
    #[error("invalid float {text:?} at offset {offset:#x}")]
    InvalidFloat { text: String, offset: usize },

    /// A special class did not consume exactly its declared payload.
    #[error("{class} payload at offset {offset:#x} declared {declared} bytes but layout used {consumed}")]
    PayloadLength {
        class: &'static str,
        declared: usize,
        consumed: usize,
        offset: usize,
    },

    /// Nesting went deeper than the configured limit.
    #[error("nesting depth limit {limit} exceeded at offset {offset:#x}")]
    DepthLimitExceeded { limit: usize, offset: usize },

    /// The 2-byte version header is not one this decoder understands.
    #[error("unsupported Marshal version {major}.{minor} (expected 4.8 or older minor)")]
    UnsupportedVersion { major: u8, minor: u8 },

    /// Reading the input file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout rxdata-core.
pub type Result<T> = std::result::Result<T, MarshalError>;
