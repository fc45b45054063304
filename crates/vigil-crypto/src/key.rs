//! 256-bit symmetric key with secure memory handling.

use base64::Engine;
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{CryptoError, CryptoResult};

/// Key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// A document encryption key.
///
/// The key bytes are zeroized on drop and never printed by `Debug`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    /// Generate a new random key from the OS CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyLength`] if the slice is not exactly 32 bytes.
    /// Short keys are never padded and long keys are never truncated.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        let array = <[u8; KEY_LEN]>::try_from(bytes).map_err(|_| {
            CryptoError::InvalidKeyLength {
                expected: KEY_LEN,
                actual: bytes.len(),
            }
        })?;
        Ok(Self(array))
    }

    /// Parse key text: 64 hex characters, otherwise standard base64.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::MissingKey`] for empty input,
    /// [`CryptoError::InvalidKeyEncoding`] if the text is neither encoding, and
    /// [`CryptoError::InvalidKeyLength`] if it decodes to anything but 32 bytes.
    pub fn parse(text: &str) -> CryptoResult<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CryptoError::MissingKey);
        }

        let decoded = if text.len() == KEY_LEN * 2 && text.bytes().all(|b| b.is_ascii_hexdigit()) {
            hex::decode(text).map_err(|_| CryptoError::InvalidKeyEncoding)?
        } else {
            base64::engine::general_purpose::STANDARD
                .decode(text)
                .map_err(|_| CryptoError::InvalidKeyEncoding)?
        };
        let decoded = Zeroizing::new(decoded);

        Self::from_bytes(&decoded)
    }

    /// Encode the key as lowercase hex (careful - sensitive!).
    ///
    /// Only intended for writing a freshly generated key into configuration.
    #[must_use]
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.0))
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptionKey(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        let hex_key = "00".repeat(KEY_LEN);
        let key = EncryptionKey::parse(&hex_key).unwrap();
        assert_eq!(key.as_bytes(), &[0u8; KEY_LEN]);
    }

    #[test]
    fn test_parse_base64() {
        let b64 = base64::engine::general_purpose::STANDARD.encode([7u8; KEY_LEN]);
        let key = EncryptionKey::parse(&b64).unwrap();
        assert_eq!(key.as_bytes(), &[7u8; KEY_LEN]);
    }

    #[test]
    fn test_rejects_short_and_long_keys() {
        let short = base64::engine::general_purpose::STANDARD.encode([1u8; 16]);
        assert!(matches!(
            EncryptionKey::parse(&short),
            Err(CryptoError::InvalidKeyLength {
                expected: 32,
                actual: 16
            })
        ));

        let long = base64::engine::general_purpose::STANDARD.encode([1u8; 48]);
        assert!(matches!(
            EncryptionKey::parse(&long),
            Err(CryptoError::InvalidKeyLength { actual: 48, .. })
        ));
    }

    #[test]
    fn test_rejects_empty_and_garbage() {
        assert!(matches!(EncryptionKey::parse("  "), Err(CryptoError::MissingKey)));
        assert!(matches!(
            EncryptionKey::parse("!!not a key!!"),
            Err(CryptoError::InvalidKeyEncoding)
        ));
    }

    #[test]
    fn test_hex_round_trip_and_redacted_debug() {
        let key = EncryptionKey::generate();
        let again = EncryptionKey::parse(&key.to_hex()).unwrap();
        assert_eq!(key.as_bytes(), again.as_bytes());
        assert_eq!(format!("{key:?}"), "EncryptionKey(<redacted>)");
    }
}
