//! Error types for wire format operations.

use thiserror::Error;

use crate::code::{CodeNumber, ContentType};

/// Result type for decode operations.
pub type WireResult<T> = Result<T, DecodeError>;

/// Errors raised while decoding a DMAP byte stream.
///
/// Any of these means the peer sent a malformed frame; the owning connection
/// should be dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// The buffer held no node at all.
    #[error("empty message")]
    Empty,

    /// A header or length field points past the end of the buffer.
    #[error("truncated node: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    /// A scalar payload did not have its type's fixed width.
    #[error("invalid length for '{code}' ({content_type}): expected {expected} bytes, found {actual}")]
    InvalidScalarLength {
        code: CodeNumber,
        content_type: ContentType,
        expected: usize,
        actual: usize,
    },

    /// A string payload was not valid UTF-8.
    #[error("invalid utf-8 in '{code}'")]
    InvalidUtf8 { code: CodeNumber },

    /// Bytes remained after the top-level node.
    #[error("{remaining} trailing bytes after top-level node")]
    TrailingData { remaining: usize },

    /// Limits exceeded.
    #[error("{kind} limit exceeded: {actual} > {limit}")]
    LimitsExceeded {
        kind: LimitKind,
        limit: usize,
        actual: usize,
    },
}

/// Specific wire limits that can be exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LimitKind {
    #[error("message bytes")]
    MessageBytes,
    #[error("nesting depth")]
    Depth,
    #[error("node count")]
    NodeCount,
}

/// Errors that can occur during encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum EncodeError {
    /// The node name is not present in the bag.
    #[error("unknown content code name '{name}'")]
    UnknownName { name: String },

    /// The node value does not match the type registered for its name.
    #[error("type mismatch for '{name}': code expects {expected}, value is {found}")]
    TypeMismatch {
        name: String,
        expected: ContentType,
        found: ContentType,
    },

    /// A date does not fit a 32-bit unix timestamp.
    #[error("date out of range for '{name}'")]
    DateOutOfRange { name: String },

    /// A payload is too large for the 4-byte length field.
    #[error("length overflow: {length}")]
    LengthOverflow { length: usize },
}
