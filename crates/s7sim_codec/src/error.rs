//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while packing or unpacking S7 values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The type name in a definition is not a supported S7 type.
    #[error("unknown S7 type: {name}")]
    UnknownType {
        /// The unrecognized type name.
        name: String,
    },

    /// A value does not match the declared S7 type.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The declared S7 type.
        expected: String,
        /// The kind of value that was supplied.
        actual: String,
    },

    /// Not enough bytes in the buffer for the declared type.
    #[error("not enough bytes: need {expected}, got {actual}")]
    NotEnoughBytes {
        /// Bytes required by the type.
        expected: usize,
        /// Bytes available.
        actual: usize,
    },

    /// A string payload is not valid for the declared string type.
    #[error("invalid string: {message}")]
    InvalidString {
        /// Description of the problem.
        message: String,
    },

    /// A DT/DTL payload does not decode to a valid timestamp.
    #[error("invalid date/time: {message}")]
    InvalidDateTime {
        /// Description of the problem.
        message: String,
    },

    /// A value is outside the representable range of the declared type.
    #[error("value out of range: {message}")]
    ValueOutOfRange {
        /// Description of the problem.
        message: String,
    },
}

impl CodecError {
    /// Creates an unknown type error.
    pub fn unknown_type(name: impl Into<String>) -> Self {
        Self::UnknownType { name: name.into() }
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates an invalid string error.
    pub fn invalid_string(message: impl Into<String>) -> Self {
        Self::InvalidString {
            message: message.into(),
        }
    }

    /// Creates an invalid date/time error.
    pub fn invalid_datetime(message: impl Into<String>) -> Self {
        Self::InvalidDateTime {
            message: message.into(),
        }
    }

    /// Creates a value out of range error.
    pub fn value_out_of_range(message: impl Into<String>) -> Self {
        Self::ValueOutOfRange {
            message: message.into(),
        }
    }
}
