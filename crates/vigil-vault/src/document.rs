//! Document records and verification reports.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use vigil_core::{Clearance, DocumentId, Timestamp};
use vigil_crypto::{ContentHash, CryptoResult, Nonce, Tag};

/// Integrity status of a stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    /// Stored, never verified.
    Registered,
    /// Last verification matched the registered fingerprint.
    Verified,
    /// An integrity check failed. Sticky until the next successful verification.
    Compromised,
}

impl DocumentStatus {
    /// Upper-case wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Registered => "REGISTERED",
            Self::Verified => "VERIFIED",
            Self::Compromised => "COMPROMISED",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied description of a document being registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMetadata {
    /// Original file name.
    pub filename: String,
    /// MIME type.
    pub mime_type: String,
    /// Clearance required to read the plaintext.
    pub required_clearance: Clearance,
}

/// A registered document. The plaintext is never part of this record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Document id.
    pub id: DocumentId,
    /// Original file name.
    pub filename: String,
    /// MIME type.
    pub mime_type: String,
    /// Plaintext size.
    pub size_bytes: u64,
    /// Location of the ciphertext.
    pub stored_path: PathBuf,
    /// SHA-256 of the plaintext at registration.
    pub fingerprint: ContentHash,
    /// AES-GCM nonce, lowercase hex.
    pub iv: String,
    /// AES-GCM tag, lowercase hex.
    pub auth_tag: String,
    /// Clearance required to read the plaintext.
    pub required_clearance: Clearance,
    /// Integrity status.
    pub status: DocumentStatus,
    /// Registration time.
    pub created_at: Timestamp,
    /// Most recent verification attempt.
    #[serde(default)]
    pub last_verified: Option<Timestamp>,
}

impl Document {
    /// Parse the stored nonce and tag.
    ///
    /// They are kept as text so that a row with damaged values still loads
    /// and can be marked compromised.
    ///
    /// # Errors
    ///
    /// Returns a [`CryptoError`](vigil_crypto::CryptoError) if either value is
    /// not lowercase hex of the right length.
    pub fn sealing(&self) -> CryptoResult<(Nonce, Tag)> {
        Ok((Nonce::from_hex(&self.iv)?, Tag::from_hex(&self.auth_tag)?))
    }
}

/// Why a verification found a document compromised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityFailure {
    /// Decryption failed authentication.
    AuthenticationFailed,
    /// Decrypted bytes hash to something else.
    FingerprintMismatch,
    /// The ciphertext file does not exist.
    MissingCiphertext,
    /// The stored nonce or tag is not valid hex of the right length.
    MalformedMetadata,
}

impl fmt::Display for IntegrityFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AuthenticationFailed => "authentication failed",
            Self::FingerprintMismatch => "fingerprint mismatch",
            Self::MissingCiphertext => "ciphertext missing",
            Self::MalformedMetadata => "malformed nonce or tag",
        })
    }
}

/// Outcome of [`Vault::verify`](crate::Vault::verify).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    /// New status, already persisted.
    pub status: DocumentStatus,
    /// Fingerprint of the decrypted bytes, when decryption succeeded.
    pub recomputed_fingerprint: Option<ContentHash>,
    /// Reason for a `COMPROMISED` status.
    pub failure: Option<IntegrityFailure>,
    /// The document as stored after the update.
    pub document: Document,
}

impl VerificationReport {
    /// Whether the document verified intact.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.status == DocumentStatus::Verified
    }
}
