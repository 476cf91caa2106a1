//! Error types for the sync engine.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during reconciliation.
///
/// Transport errors are transient by design: they are confined to the
/// current tick for the affected block and the next tick retries naturally.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Transport I/O failure or timeout.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
    },

    /// The block was never registered with the transport.
    #[error("block not registered with transport: DB{db_number}")]
    NotRegistered {
        /// The affected DB number.
        db_number: u16,
    },

    /// Store error during merge.
    #[error("store error: {0}")]
    Core(#[from] s7sim_core::CoreError),

    /// The tick thread could not be started.
    #[error("failed to start sync thread: {message}")]
    ThreadSpawn {
        /// The underlying error.
        message: String,
    },
}

impl SyncError {
    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// True for errors that the next tick retries naturally.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(SyncError::transport("connection reset").is_transient());
        assert!(SyncError::transport("read timed out").is_transient());
        assert!(!SyncError::NotRegistered { db_number: 1 }.is_transient());
    }

    #[test]
    fn error_display() {
        let err = SyncError::NotRegistered { db_number: 7 };
        assert_eq!(err.to_string(), "block not registered with transport: DB7");
    }
}
