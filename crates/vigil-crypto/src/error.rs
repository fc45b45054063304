//! Cryptographic error types.

use thiserror::Error;

/// Errors that can occur during cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// No key material was supplied.
    #[error("encryption key is missing")]
    MissingKey,

    /// Invalid key length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected length in bytes.
        expected: usize,
        /// Actual length in bytes.
        actual: usize,
    },

    /// Key text was neither hex nor base64.
    #[error("invalid key encoding: expected 64 hex characters or base64")]
    InvalidKeyEncoding,

    /// Invalid nonce or tag length.
    #[error("invalid {field} length: expected {expected}, got {actual}")]
    InvalidParameterLength {
        /// Which parameter (`nonce` or `tag`).
        field: &'static str,
        /// Expected length in bytes.
        expected: usize,
        /// Actual length in bytes.
        actual: usize,
    },

    /// AEAD tag did not verify: the ciphertext, nonce, tag or key is wrong.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Encryption failed (payload too large for the cipher).
    #[error("encryption failed")]
    EncryptionFailed,

    /// Invalid hex encoding.
    #[error("invalid hex encoding")]
    InvalidHexEncoding,
}

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
