//! The document vault.
//!
//! Ciphertext lives in files under the vault root, one `<fileId>.enc` per
//! document. Document rows live in the `vault:documents` KV namespace.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use vigil_core::{DocumentId, Timestamp};
use vigil_crypto::{ContentCipher, ContentHash, CryptoError, EncryptionKey};
use vigil_storage::{KvStore, MemoryKvStore, ScopedKvStore};

use crate::document::{
    Document, DocumentMetadata, DocumentStatus, IntegrityFailure, VerificationReport,
};
use crate::error::{VaultError, VaultResult};

/// KV namespace for document rows.
pub const NS_DOCUMENTS: &str = "vault:documents";

/// Extension of ciphertext files.
pub const CIPHERTEXT_EXTENSION: &str = "enc";

/// Encrypted document store with fingerprint verification.
#[derive(Clone)]
pub struct Vault {
    root: PathBuf,
    cipher: ContentCipher,
    documents: ScopedKvStore,
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl Vault {
    /// Open a vault rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be created.
    pub async fn open(
        root: impl Into<PathBuf>,
        key: EncryptionKey,
        store: Arc<dyn KvStore>,
    ) -> VaultResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        debug!(root = %root.display(), "Opened document vault");
        Ok(Self {
            root,
            cipher: ContentCipher::new(key),
            documents: ScopedKvStore::new(store, NS_DOCUMENTS)?,
        })
    }

    /// Vault with in-memory metadata and ciphertext under `root` (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be created.
    pub async fn in_memory(root: impl Into<PathBuf>, key: EncryptionKey) -> VaultResult<Self> {
        Self::open(root, key, Arc::new(MemoryKvStore::new())).await
    }

    /// Directory holding the ciphertext files.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Encrypt and store `bytes`.
    ///
    /// The fingerprint is taken from the plaintext before encryption. The
    /// ciphertext is durably on disk before the document row is written.
    ///
    /// # Errors
    ///
    /// Returns an error if encryption, the file write or the row insert fails.
    pub async fn register(&self, bytes: &[u8], metadata: DocumentMetadata) -> VaultResult<Document> {
        let fingerprint = ContentHash::hash(bytes);
        let sealed = self.cipher.encrypt(bytes)?;

        let file_name = format!("{}.{CIPHERTEXT_EXTENSION}", Uuid::new_v4());
        let stored_path = write_atomic(self.root.clone(), file_name, sealed.ciphertext).await?;

        let document = Document {
            id: DocumentId::new(),
            filename: metadata.filename,
            mime_type: metadata.mime_type,
            size_bytes: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
            stored_path,
            fingerprint,
            iv: sealed.nonce.to_hex(),
            auth_tag: sealed.tag.to_hex(),
            required_clearance: metadata.required_clearance,
            status: DocumentStatus::Registered,
            created_at: Timestamp::now(),
            last_verified: None,
        };

        if !self
            .documents
            .insert_json(&document.id.to_string(), &document)
            .await?
        {
            return Err(VaultError::AlreadyExists(document.id));
        }

        info!(
            document_id = %document.id,
            filename = %document.filename,
            size = document.size_bytes,
            clearance = %document.required_clearance,
            "Registered document"
        );
        Ok(document)
    }

    /// Document row without touching the ciphertext.
    ///
    /// # Errors
    ///
    /// Returns an error if the row cannot be read.
    pub async fn fetch(&self, id: DocumentId) -> VaultResult<Option<Document>> {
        Ok(self.documents.get_json(&id.to_string()).await?)
    }

    /// Every document, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if any row cannot be read.
    pub async fn list(&self) -> VaultResult<Vec<Document>> {
        let mut documents = Vec::new();
        for key in self.documents.list_keys().await? {
            if let Some(doc) = self.documents.get_json::<Document>(&key).await? {
                documents.push(doc);
            }
        }
        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(documents)
    }

    /// Decrypt, re-fingerprint and record the result.
    ///
    /// `last_verified` is updated whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::NotFound`] for an unknown id, or an error if the
    /// ciphertext cannot be read for a reason other than being absent.
    pub async fn verify(&self, id: DocumentId) -> VaultResult<VerificationReport> {
        let mut document = self.require(id).await?;

        let (status, recomputed, failure) = match self.open_document(&document).await {
            Ok((plaintext, fingerprint)) => {
                drop(plaintext);
                if fingerprint.ct_eq(&document.fingerprint) {
                    (DocumentStatus::Verified, Some(fingerprint), None)
                } else {
                    (
                        DocumentStatus::Compromised,
                        Some(fingerprint),
                        Some(IntegrityFailure::FingerprintMismatch),
                    )
                }
            },
            Err(Opened::Failed(failure)) => (DocumentStatus::Compromised, None, Some(failure)),
            Err(Opened::Error(e)) => return Err(e),
        };

        document.status = status;
        document.last_verified = Some(Timestamp::now());
        self.save(&document).await?;

        match failure {
            Some(reason) => warn!(
                document_id = %id,
                reason = %reason,
                "Document integrity compromised"
            ),
            None => info!(document_id = %id, "Document verified"),
        }

        Ok(VerificationReport {
            status,
            recomputed_fingerprint: recomputed,
            failure,
            document,
        })
    }

    /// Decrypt a document for a caller that has already passed clearance.
    ///
    /// Any integrity failure marks the document `COMPROMISED`.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::NotFound`], or one of the integrity variants
    /// ([`VaultError::AuthenticationFailed`], [`VaultError::FingerprintMismatch`],
    /// [`VaultError::MissingCiphertext`]).
    pub async fn retrieve_plaintext(&self, id: DocumentId) -> VaultResult<Vec<u8>> {
        let mut document = self.require(id).await?;

        let failure = match self.open_document(&document).await {
            Ok((plaintext, fingerprint)) => {
                if fingerprint.ct_eq(&document.fingerprint) {
                    return Ok(plaintext);
                }
                IntegrityFailure::FingerprintMismatch
            },
            Err(Opened::Failed(failure)) => failure,
            Err(Opened::Error(e)) => return Err(e),
        };

        warn!(document_id = %id, reason = %failure, "Refusing to release compromised document");
        document.status = DocumentStatus::Compromised;
        self.save(&document).await?;

        Err(match failure {
            IntegrityFailure::AuthenticationFailed => VaultError::AuthenticationFailed(id),
            IntegrityFailure::FingerprintMismatch => VaultError::FingerprintMismatch(id),
            IntegrityFailure::MissingCiphertext => VaultError::MissingCiphertext(id),
            IntegrityFailure::MalformedMetadata => VaultError::MalformedMetadata(id),
        })
    }

    async fn require(&self, id: DocumentId) -> VaultResult<Document> {
        self.fetch(id).await?.ok_or(VaultError::NotFound(id))
    }

    async fn save(&self, document: &Document) -> VaultResult<()> {
        Ok(self
            .documents
            .set_json(&document.id.to_string(), document)
            .await?)
    }

    /// Read and decrypt the ciphertext, returning plaintext and its fingerprint.
    async fn open_document(&self, document: &Document) -> Result<(Vec<u8>, ContentHash), Opened> {
        let Ok((nonce, tag)) = document.sealing() else {
            return Err(Opened::Failed(IntegrityFailure::MalformedMetadata));
        };

        let ciphertext = match tokio::fs::read(&document.stored_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Opened::Failed(IntegrityFailure::MissingCiphertext));
            },
            Err(e) => return Err(Opened::Error(e.into())),
        };

        match self.cipher.decrypt(&ciphertext, &nonce, &tag) {
            Ok(plaintext) => {
                let fingerprint = ContentHash::hash(&plaintext);
                Ok((plaintext, fingerprint))
            },
            Err(CryptoError::AuthenticationFailed) => {
                Err(Opened::Failed(IntegrityFailure::AuthenticationFailed))
            },
            Err(e) => Err(Opened::Error(e.into())),
        }
    }
}

enum Opened {
    Failed(IntegrityFailure),
    Error(VaultError),
}

/// Write `bytes` to `root/file_name` via a synced temp file and rename.
async fn write_atomic(root: PathBuf, file_name: String, bytes: Vec<u8>) -> VaultResult<PathBuf> {
    tokio::task::spawn_blocking(move || -> VaultResult<PathBuf> {
        let mut tmp = tempfile::NamedTempFile::new_in(&root)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;

        let target = root.join(file_name);
        tmp.persist(&target).map_err(|e| VaultError::Io(e.error))?;

        #[cfg(unix)]
        std::fs::File::open(&root)?.sync_all()?;

        Ok(target)
    })
    .await
    .map_err(|e| VaultError::Task(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::Clearance;

    fn metadata(clearance: u8) -> DocumentMetadata {
        DocumentMetadata {
            filename: "brief.pdf".into(),
            mime_type: "application/pdf".into(),
            required_clearance: Clearance::new(clearance).unwrap(),
        }
    }

    async fn vault() -> (Vault, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let vault = Vault::in_memory(dir.path().join("docs"), EncryptionKey::generate())
            .await
            .unwrap();
        (vault, dir)
    }

    #[tokio::test]
    async fn test_register_writes_ciphertext_not_plaintext() {
        let (vault, _dir) = vault().await;
        let doc = vault.register(b"hello", metadata(2)).await.unwrap();

        assert_eq!(doc.status, DocumentStatus::Registered);
        assert_eq!(doc.fingerprint, ContentHash::hash(b"hello"));
        assert_eq!(doc.size_bytes, 5);
        assert!(doc.last_verified.is_none());
        assert_eq!(doc.stored_path.parent().unwrap(), vault.root());
        assert_eq!(
            doc.stored_path.extension().unwrap(),
            CIPHERTEXT_EXTENSION
        );

        let on_disk = std::fs::read(&doc.stored_path).unwrap();
        assert_eq!(on_disk.len(), 5);
        assert_ne!(on_disk, b"hello");

        // Only the ciphertext file remains; the temp file was renamed.
        assert_eq!(std::fs::read_dir(vault.root()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_unknown_is_none_and_verify_is_not_found() {
        let (vault, _dir) = vault().await;
        let id = DocumentId::new();
        assert!(vault.fetch(id).await.unwrap().is_none());
        assert!(matches!(
            vault.verify(id).await,
            Err(VaultError::NotFound(missing)) if missing == id
        ));
    }

    #[tokio::test]
    async fn test_verify_intact_document() {
        let (vault, _dir) = vault().await;
        let doc = vault.register(b"hello", metadata(2)).await.unwrap();

        let report = vault.verify(doc.id).await.unwrap();
        assert!(report.is_verified());
        assert_eq!(report.recomputed_fingerprint, Some(doc.fingerprint));
        assert!(report.failure.is_none());
        assert!(report.document.last_verified.is_some());

        let stored = vault.fetch(doc.id).await.unwrap().unwrap();
        assert_eq!(stored.status, DocumentStatus::Verified);
    }

    #[tokio::test]
    async fn test_overwritten_ciphertext_is_compromised() {
        let (vault, _dir) = vault().await;
        let doc = vault.register(b"hello", metadata(2)).await.unwrap();
        std::fs::write(&doc.stored_path, b"HELLO").unwrap();

        let report = vault.verify(doc.id).await.unwrap();
        assert_eq!(report.status, DocumentStatus::Compromised);
        assert_eq!(report.failure, Some(IntegrityFailure::AuthenticationFailed));
        assert!(report.recomputed_fingerprint.is_none());
        assert!(report.document.last_verified.is_some());
    }

    #[tokio::test]
    async fn test_missing_ciphertext_is_compromised() {
        let (vault, _dir) = vault().await;
        let doc = vault.register(b"hello", metadata(2)).await.unwrap();
        std::fs::remove_file(&doc.stored_path).unwrap();

        let report = vault.verify(doc.id).await.unwrap();
        assert_eq!(report.status, DocumentStatus::Compromised);
        assert_eq!(report.failure, Some(IntegrityFailure::MissingCiphertext));

        assert!(matches!(
            vault.retrieve_plaintext(doc.id).await,
            Err(VaultError::MissingCiphertext(_))
        ));
    }

    #[tokio::test]
    async fn test_retrieve_plaintext() {
        let (vault, _dir) = vault().await;
        let doc = vault.register(b"top secret", metadata(4)).await.unwrap();
        assert_eq!(vault.retrieve_plaintext(doc.id).await.unwrap(), b"top secret");
    }

    #[tokio::test]
    async fn test_retrieve_tampered_marks_compromised() {
        let (vault, _dir) = vault().await;
        let doc = vault.register(b"top secret", metadata(4)).await.unwrap();
        let mut bytes = std::fs::read(&doc.stored_path).unwrap();
        bytes[0] ^= 0x01;
        std::fs::write(&doc.stored_path, bytes).unwrap();

        let err = vault.retrieve_plaintext(doc.id).await.unwrap_err();
        assert!(matches!(err, VaultError::AuthenticationFailed(_)));
        assert!(err.is_integrity_failure());
        assert_eq!(
            vault.fetch(doc.id).await.unwrap().unwrap().status,
            DocumentStatus::Compromised
        );
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let (vault, _dir) = vault().await;
        let first = vault.register(b"one", metadata(1)).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = vault.register(b"two", metadata(1)).await.unwrap();

        let ids: Vec<DocumentId> = vault.list().await.unwrap().iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }
}
