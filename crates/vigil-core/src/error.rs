//! Core error types.

use thiserror::Error;

/// Errors raised when constructing core types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Clearance level outside the supported range.
    #[error("clearance level {0} out of range ({min}..={max})", min = crate::Clearance::MIN, max = crate::Clearance::MAX)]
    InvalidClearance(u8),

    /// Malformed document identifier.
    #[error("invalid document id: {0}")]
    InvalidDocumentId(String),

    /// Timestamp text that is not in canonical form.
    #[error("non-canonical timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
