//! Ledger error types.

use thiserror::Error;

/// Errors that can occur while appending to or reading the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The append did not happen; the backing store failed.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    /// The append lock or the next sequence number could not be obtained in time.
    #[error("ledger contention: {0}")]
    Contention(String),

    /// Storage error while reading.
    #[error("storage error: {0}")]
    Storage(String),

    /// A stored block could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl LedgerError {
    /// Whether the caller may retry the same append.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Contention(_))
    }
}

impl From<vigil_storage::StorageError> for LedgerError {
    fn from(e: vigil_storage::StorageError) -> Self {
        match e {
            vigil_storage::StorageError::Serialization(msg) => Self::Serialization(msg),
            other => Self::Storage(other.to_string()),
        }
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
