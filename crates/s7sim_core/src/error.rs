//! Error types for s7sim core.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in store, gateway, and config operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The DB number is not registered in the store.
    #[error("block not found: DB{db_number}")]
    BlockNotFound {
        /// The unknown DB number.
        db_number: u16,
    },

    /// A DB number was registered twice.
    #[error("duplicate block: DB{db_number}")]
    DuplicateBlock {
        /// The duplicated DB number.
        db_number: u16,
    },

    /// A write payload disagrees with the block's declared size.
    #[error("size mismatch on DB{db_number}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// The affected DB number.
        db_number: u16,
        /// The declared block size.
        expected: usize,
        /// The payload size.
        actual: usize,
    },

    /// A field write or read falls outside the block.
    #[error("range out of bounds on DB{db_number}: offset {offset} + {len} exceeds size {size}")]
    RangeOutOfBounds {
        /// The affected DB number.
        db_number: u16,
        /// Start offset of the access.
        offset: usize,
        /// Length of the access.
        len: usize,
        /// The declared block size.
        size: usize,
    },

    /// A BOOL bit index is outside 0..=7.
    #[error("bit index {bit} out of range (0..=7)")]
    BitOutOfRange {
        /// The offending bit index.
        bit: u8,
    },

    /// The named field is not defined for the DB.
    #[error("field not found: {name} in DB{db_number}")]
    FieldNotFound {
        /// The affected DB number.
        db_number: u16,
        /// The unknown field name.
        name: String,
    },

    /// Value codec error.
    #[error("codec error: {0}")]
    Codec(#[from] s7sim_codec::CodecError),

    /// A definition file failed validation.
    #[error("invalid config: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },

    /// A definition file failed to parse.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// I/O error while reading a definition file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CoreError {
    /// Creates an invalid config error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
