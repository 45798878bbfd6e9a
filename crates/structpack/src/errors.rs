//! Error types for schema resolution, packing and unpacking.

use thiserror::Error;

use crate::options::Encoding;

/// Every failure the engine can report. Errors are raised synchronously and
/// propagate to the top-level caller untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The candidate did not resolve to any schema.
    #[error("schema `{0}` is not registered")]
    UnregisteredSchema(String),

    /// A constructor was given a malformed argument.
    #[error("invalid argument for `{constructor}`: {reason}")]
    InvalidArgument {
        constructor: &'static str,
        reason: String,
    },

    /// `depend`, `link` or `exit` was used outside an object or union body.
    #[error("`{0}` must run inside an object or union")]
    MissingScope(&'static str),

    /// A sibling field referenced by `depend` or `link` has not been produced yet.
    #[error("field `{0}` is undefined")]
    UndefinedDependency(String),

    /// Packing an enum name that is not part of the enum map.
    #[error("enum value `{0}` not found")]
    UnknownEnumValue(String),

    /// Reading past the end of the input.
    #[error("buffer underflow at offset {offset}: need {needed} bytes, have {available}")]
    BufferUnderflow {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// The value handed to `pack` does not have the shape the schema expects.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// An element count is larger than its numeric prefix can store.
    #[error("count {count} does not fit in `{prefix}` (max {max})")]
    CountOverflow {
        count: usize,
        prefix: &'static str,
        max: u64,
    },

    /// Bytes or text that cannot be represented in the requested encoding.
    #[error("invalid {0} data")]
    InvalidEncoding(Encoding),

    /// An encode/decode hook of a `parse` schema failed.
    #[error("transform failed: {0}")]
    Transform(String),
}

/// Coarse classification used to separate malformed schemas from malformed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The schema itself is wrong: a programming error.
    Schema,
    /// The schema is fine but the bytes or values do not fit it.
    Data,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnregisteredSchema(_)
            | Error::InvalidArgument { .. }
            | Error::MissingScope(_) => ErrorKind::Schema,
            Error::UndefinedDependency(_)
            | Error::UnknownEnumValue(_)
            | Error::BufferUnderflow { .. }
            | Error::TypeMismatch { .. }
            | Error::CountOverflow { .. }
            | Error::InvalidEncoding(_)
            | Error::Transform(_) => ErrorKind::Data,
        }
    }

    pub(crate) fn invalid(constructor: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            constructor,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
