//! Runtime error types.

use thiserror::Error;
use vigil_core::DocumentId;
use vigil_vault::VaultError;

/// Errors returned by [`Runtime`](crate::Runtime) operations.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Configuration could not be loaded or converted.
    #[error("Configuration error: {0}")]
    Config(#[from] vigil_config::ConfigError),

    /// Key material is missing or malformed.
    #[error("Crypto error: {0}")]
    Crypto(#[from] vigil_crypto::CryptoError),

    /// Logging could not be configured.
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] vigil_telemetry::TelemetryError),

    /// Ledger append or read failed.
    #[error("Ledger error: {0}")]
    Ledger(#[from] vigil_ledger::LedgerError),

    /// Vault operation failed.
    #[error("Vault error: {0}")]
    Vault(VaultError),

    /// Key-value store could not be opened or closed.
    #[error("Storage error: {0}")]
    Storage(#[from] vigil_storage::StorageError),

    /// Invalid clearance or document id.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] vigil_core::CoreError),

    /// Unknown document.
    #[error("Document not found: {0}")]
    NotFound(DocumentId),

    /// Upload exceeds `documents.max_upload_bytes`.
    #[error("Upload of {size} bytes exceeds the limit of {max} bytes")]
    UploadTooLarge {
        /// Upload size.
        size: u64,
        /// Configured limit.
        max: u64,
    },

    /// MIME type not in `documents.allowed_mime_types`.
    #[error("File type not allowed: {0}")]
    MimeTypeNotAllowed(String),

    /// Upload without a usable filename.
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    /// Actor's clearance is below the document's requirement.
    #[error("Insufficient clearance for {document}: level {actual}, required {required}")]
    AccessDenied {
        /// The document.
        document: DocumentId,
        /// Required level.
        required: u8,
        /// Actor's level.
        actual: u8,
    },
}

impl RuntimeError {
    /// Whether the operation may succeed if retried unchanged.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Ledger(e) if e.is_retryable())
    }

    /// Whether this error reports a failed integrity check.
    #[must_use]
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, Self::Vault(e) if e.is_integrity_failure())
    }
}

impl From<VaultError> for RuntimeError {
    fn from(e: VaultError) -> Self {
        match e {
            VaultError::NotFound(id) => Self::NotFound(id),
            other => Self::Vault(other),
        }
    }
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
