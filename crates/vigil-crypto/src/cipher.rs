//! AES-256-GCM content cipher with detached nonce and tag.
//!
//! Every call to [`ContentCipher::encrypt`] draws a fresh 96-bit nonce from
//! the OS CSPRNG. Callers cannot supply a nonce for encryption, so a nonce is
//! never reused under the same key.

use aes_gcm::aead::AeadInPlace;
use aes_gcm::{Aes256Gcm, KeyInit};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CryptoError, CryptoResult};
use crate::key::EncryptionKey;

/// Nonce length in bytes.
pub const NONCE_LEN: usize = 12;
/// Authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

macro_rules! hex_bytes {
    ($name:ident, $len:expr, $field:literal, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq)]
        pub struct $name([u8; $len]);

        impl $name {
            /// Get the raw bytes.
            #[must_use]
            pub const fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Create from raw bytes.
            #[must_use]
            pub const fn from_bytes(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Encode as lowercase hex string.
            #[must_use]
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Decode from a lowercase hex string.
            ///
            /// # Errors
            ///
            /// Returns an error if the string is not lowercase hex or has the
            /// wrong length.
            pub fn from_hex(s: &str) -> CryptoResult<Self> {
                if s.bytes().any(|b| b.is_ascii_uppercase()) {
                    return Err(CryptoError::InvalidHexEncoding);
                }
                let bytes = hex::decode(s).map_err(|_| CryptoError::InvalidHexEncoding)?;
                <[u8; $len]>::try_from(bytes.as_slice())
                    .map(Self)
                    .map_err(|_| CryptoError::InvalidParameterLength {
                        field: $field,
                        expected: $len,
                        actual: bytes.len(),
                    })
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.to_hex())
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

hex_bytes!(Nonce, NONCE_LEN, "nonce", "A 96-bit AES-GCM nonce (the document `iv`).");
hex_bytes!(Tag, TAG_LEN, "tag", "A 128-bit AES-GCM authentication tag.");

/// Output of a single encryption.
#[derive(Clone)]
pub struct SealedContent {
    /// Encrypted bytes, same length as the plaintext.
    pub ciphertext: Vec<u8>,
    /// Nonce used for this encryption.
    pub nonce: Nonce,
    /// Authentication tag over the ciphertext.
    pub tag: Tag,
}

impl fmt::Debug for SealedContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SealedContent")
            .field("len", &self.ciphertext.len())
            .field("nonce", &self.nonce)
            .field("tag", &self.tag)
            .finish()
    }
}

/// Authenticated encryption of document bytes.
#[derive(Clone)]
pub struct ContentCipher {
    aead: Aes256Gcm,
}

impl ContentCipher {
    /// Create a cipher bound to `key`.
    #[must_use]
    pub fn new(key: EncryptionKey) -> Self {
        let aead = Aes256Gcm::new(key.as_bytes().into());
        Self { aead }
    }

    /// Encrypt `plaintext` under a fresh random nonce.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::EncryptionFailed`] if the payload exceeds the
    /// AES-GCM message limit.
    pub fn encrypt(&self, plaintext: &[u8]) -> CryptoResult<SealedContent> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let mut buffer = plaintext.to_vec();
        let tag = self
            .aead
            .encrypt_in_place_detached((&nonce).into(), b"", &mut buffer)
            .map_err(|_| CryptoError::EncryptionFailed)?;

        Ok(SealedContent {
            ciphertext: buffer,
            nonce: Nonce(nonce),
            tag: Tag(tag.into()),
        })
    }

    /// Decrypt and authenticate.
    ///
    /// Fails closed: no bytes are returned unless the tag verifies.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::AuthenticationFailed`] if the ciphertext, nonce,
    /// tag or key do not match.
    pub fn decrypt(&self, ciphertext: &[u8], nonce: &Nonce, tag: &Tag) -> CryptoResult<Vec<u8>> {
        let mut buffer = ciphertext.to_vec();
        self.aead
            .decrypt_in_place_detached(
                nonce.as_bytes().into(),
                b"",
                &mut buffer,
                tag.as_bytes().into(),
            )
            .map_err(|_| CryptoError::AuthenticationFailed)?;
        Ok(buffer)
    }
}

impl fmt::Debug for ContentCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentCipher")
            .field("algorithm", &"AES-256-GCM")
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> ContentCipher {
        ContentCipher::new(EncryptionKey::generate())
    }

    #[test]
    fn test_round_trip() {
        let cipher = cipher();
        let contents: [&[u8]; 3] = [b"", b"hello", &[0xAB; 4096]];
        for content in contents {
            let sealed = cipher.encrypt(content).unwrap();
            assert_eq!(sealed.ciphertext.len(), content.len());
            let opened = cipher
                .decrypt(&sealed.ciphertext, &sealed.nonce, &sealed.tag)
                .unwrap();
            assert_eq!(opened, content);
        }
    }

    #[test]
    fn test_fresh_nonce_per_call() {
        let cipher = cipher();
        let a = cipher.encrypt(b"same").unwrap();
        let b = cipher.encrypt(b"same").unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_flipped_ciphertext_byte_fails_closed() {
        let cipher = cipher();
        let mut sealed = cipher.encrypt(b"hello world").unwrap();
        sealed.ciphertext[3] ^= 0x01;
        assert!(matches!(
            cipher.decrypt(&sealed.ciphertext, &sealed.nonce, &sealed.tag),
            Err(CryptoError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_flipped_tag_byte_fails_closed() {
        let cipher = cipher();
        let sealed = cipher.encrypt(b"hello world").unwrap();
        let mut tag = *sealed.tag.as_bytes();
        tag[0] ^= 0x80;
        assert!(matches!(
            cipher.decrypt(&sealed.ciphertext, &sealed.nonce, &Tag::from_bytes(tag)),
            Err(CryptoError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_wrong_key_or_nonce_fails_closed() {
        let sealed = cipher().encrypt(b"secret").unwrap();
        assert!(matches!(
            cipher().decrypt(&sealed.ciphertext, &sealed.nonce, &sealed.tag),
            Err(CryptoError::AuthenticationFailed)
        ));

        let cipher = cipher();
        let sealed = cipher.encrypt(b"secret").unwrap();
        let other = cipher.encrypt(b"other").unwrap();
        assert!(matches!(
            cipher.decrypt(&sealed.ciphertext, &other.nonce, &sealed.tag),
            Err(CryptoError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_nonce_hex_length_checked() {
        assert!(Nonce::from_hex("00").is_err());
        assert!(Tag::from_hex(&"00".repeat(TAG_LEN)).is_ok());
        assert!(Nonce::from_hex("zz").is_err());
        assert!(matches!(
            Tag::from_hex(&"AB".repeat(TAG_LEN)),
            Err(CryptoError::InvalidHexEncoding)
        ));
    }
}
