//! Contains the Error and Result types used throughout the crate.

use thiserror::Error;

/// Convenience type for Result.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or writing NBT data.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The stream ended part way through a record.
    #[error("unexpected end of stream")]
    UnexpectedEnd,

    /// A tag kind byte outside the closed set 0..=12.
    #[error("invalid tag kind byte: {0}")]
    InvalidTagKind(u8),

    /// A Modified UTF-8 violation: truncated sequence, bad continuation
    /// byte, overlong form, or unknown leading byte.
    #[error("invalid modified utf-8: {0}")]
    InvalidEncoding(String),

    /// A compound has two entries with the same name.
    #[error("duplicate name in compound: {0:?}")]
    DuplicateName(String),

    /// A list element's kind disagrees with the declared content kind, or
    /// an End-content list claims a nonzero length.
    #[error("list content kind mismatch")]
    ListContentMismatch,

    /// A length or numeric value outside what the format can carry.
    #[error("value out of range: {0}")]
    ValueOutOfRange(String),

    /// A structural problem: End materialized as a value, or a malformed
    /// XML document (missing Name/ContentType, unknown kind element).
    #[error("format error: {0}")]
    Format(String),

    /// Underlying stream failure.
    #[error("io error: {0}")]
    Io(#[source] std::io::Error),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        // read_exact reports a short stream as UnexpectedEof; fold it into
        // the format-level variant so callers match one kind.
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::UnexpectedEnd
        } else {
            Error::Io(e)
        }
    }
}

impl Error {
    pub(crate) fn invalid_encoding(detail: impl Into<String>) -> Error {
        Error::InvalidEncoding(detail.into())
    }

    pub(crate) fn format(detail: impl Into<String>) -> Error {
        Error::Format(detail.into())
    }

    pub(crate) fn out_of_range(detail: impl Into<String>) -> Error {
        Error::ValueOutOfRange(detail.into())
    }
}
