//! Error types for the protocol crate.

use thiserror::Error;

/// Convenience alias for Results using [`ProtoError`].
pub type Result<T, E = ProtoError> = std::result::Result<T, E>;

/// Errors produced while framing or parsing inbound protocol lines.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtoError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A framed line was not valid UTF-8.
    #[error("invalid UTF-8 in line at byte {byte_pos}")]
    InvalidUtf8 {
        /// Byte position where validation failed.
        byte_pos: usize,
    },

    /// A line exceeded the maximum allowed length.
    #[error("line too long: {actual} bytes (limit: {limit})")]
    LineTooLong {
        /// Actual line length.
        actual: usize,
        /// Maximum allowed length.
        limit: usize,
    },

    /// A framed line did not parse as an IRC message.
    #[error("unparseable message at position {position}: {input:?}")]
    ParseFailed {
        /// The offending input line.
        input: String,
        /// Character position where parsing failed.
        position: usize,
    },
}

/// Errors produced when validating a stored host mask.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MaskError {
    /// The mask has no `!` separator.
    #[error("mask is missing the `!` separator: {0:?}")]
    MissingBang(String),

    /// The mask has no `@` separator after the `!`.
    #[error("mask is missing the `@` separator: {0:?}")]
    MissingAt(String),

    /// One of the mask segments between separators is empty.
    #[error("mask has an empty segment: {0:?}")]
    EmptySegment(String),
}
