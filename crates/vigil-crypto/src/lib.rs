//! Vigil Crypto - Cryptographic primitives for the ledger and document vault.
//!
//! This crate provides:
//! - SHA-256 content hashing for chain links and document fingerprints
//! - 256-bit encryption keys with secure memory handling
//! - AES-256-GCM authenticated encryption with detached nonce and tag
//!
//! # Example
//!
//! ```
//! use vigil_crypto::{ContentCipher, ContentHash, EncryptionKey};
//!
//! let cipher = ContentCipher::new(EncryptionKey::generate());
//!
//! let sealed = cipher.encrypt(b"classified").unwrap();
//! let opened = cipher.decrypt(&sealed.ciphertext, &sealed.nonce, &sealed.tag).unwrap();
//! assert_eq!(opened, b"classified");
//!
//! let fingerprint = ContentHash::hash(b"classified");
//! println!("Fingerprint: {fingerprint}");
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod cipher;
mod error;
mod hash;
mod key;

pub use cipher::{ContentCipher, NONCE_LEN, Nonce, SealedContent, TAG_LEN, Tag};
pub use error::{CryptoError, CryptoResult};
pub use hash::ContentHash;
pub use key::{EncryptionKey, KEY_LEN};
