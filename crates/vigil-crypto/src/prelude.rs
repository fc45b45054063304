//! Prelude module - commonly used types for convenient import.
//!
//! Use `use vigil_crypto::prelude::*;` to import all essential types.

// Errors
pub use crate::{CryptoError, CryptoResult};

// Hashing
pub use crate::ContentHash;

// Encryption
pub use crate::{ContentCipher, EncryptionKey, Nonce, SealedContent, Tag};
