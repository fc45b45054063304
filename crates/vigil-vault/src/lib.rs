//! Vigil Vault - Encrypted, integrity-checked document storage.
//!
//! Documents are encrypted with AES-256-GCM and written to disk; the SHA-256
//! of the plaintext taken at registration is the trust anchor. Verification
//! decrypts, re-fingerprints and compares. Any failure, including a missing
//! ciphertext file, marks the document `COMPROMISED`.
//!
//! The vault never writes to the ledger. Callers record outcomes themselves.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod document;
mod error;
mod vault;

pub use document::{
    Document, DocumentMetadata, DocumentStatus, IntegrityFailure, VerificationReport,
};
pub use error::{VaultError, VaultResult};
pub use vault::{CIPHERTEXT_EXTENSION, NS_DOCUMENTS, Vault};
