//! Vault error types.

use thiserror::Error;
use vigil_core::DocumentId;

/// Errors that can occur in the document vault.
#[derive(Debug, Error)]
pub enum VaultError {
    /// No document with this id.
    #[error("document not found: {0}")]
    NotFound(DocumentId),

    /// The stored ciphertext, nonce or tag failed authentication.
    #[error("document {0} failed authentication")]
    AuthenticationFailed(DocumentId),

    /// The decrypted content does not match the registered fingerprint.
    #[error("document {0} does not match its registered fingerprint")]
    FingerprintMismatch(DocumentId),

    /// The ciphertext file is gone.
    #[error("ciphertext for document {0} is missing")]
    MissingCiphertext(DocumentId),

    /// The stored nonce or tag cannot be parsed.
    #[error("document {0} has a malformed nonce or tag")]
    MalformedMetadata(DocumentId),

    /// A document row with this id already exists.
    #[error("document already registered: {0}")]
    AlreadyExists(DocumentId),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Metadata store error.
    #[error("storage error: {0}")]
    Storage(#[from] vigil_storage::StorageError),

    /// Encryption error.
    #[error("crypto error: {0}")]
    Crypto(#[from] vigil_crypto::CryptoError),

    /// A blocking task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),
}

impl VaultError {
    /// Whether this error means the stored document can no longer be trusted.
    #[must_use]
    pub fn is_integrity_failure(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed(_)
                | Self::FingerprintMismatch(_)
                | Self::MissingCiphertext(_)
                | Self::MalformedMetadata(_)
        )
    }
}

/// Result type for vault operations.
pub type VaultResult<T> = Result<T, VaultError>;
