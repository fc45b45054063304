//! The Vigil runtime - audited document operations.
//!
//! Every operation that touches a document records its outcome in the
//! ledger, including denials and failed integrity checks.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use vigil_config::Config;
use vigil_core::{Actor, Clearance, DocumentId, Timestamp};
use vigil_crypto::EncryptionKey;
use vigil_ledger::{
    ApprovalId, ChainVerification, KvLedgerStorage, Ledger, LedgerAction, LedgerBlock,
    LedgerRecord, LedgerStatus,
};
use vigil_storage::{KvStore, MemoryKvStore, SurrealKvStore};
use vigil_vault::{Document, DocumentMetadata, Vault, VaultError, VerificationReport};

use crate::config_bridge::{RuntimeSettings, to_encryption_key, to_settings};
use crate::error::{RuntimeError, RuntimeResult};
use crate::threats::{ThreatMetrics, ThreatSummary};
use crate::types::{AccessDecision, Download, UploadRequest};

/// Trailing window of [`Runtime::threat_summary`].
pub const THREAT_WINDOW_HOURS: i64 = 24;

/// Ledger and vault behind one audited API.
pub struct Runtime {
    settings: RuntimeSettings,
    ledger: Ledger,
    vault: Vault,
    /// Set when the runtime owns a persistent store that must be closed.
    persistent: Option<Arc<SurrealKvStore>>,
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("settings", &self.settings)
            .field("vault", &self.vault)
            .field("persistent", &self.persistent.is_some())
            .finish_non_exhaustive()
    }
}

impl Runtime {
    /// Open the persistent runtime described by `cfg`.
    ///
    /// The ledger and the document rows share one `SurrealKV` store under
    /// `<data_dir>/kv`; ciphertext lives under `<data_dir>/documents`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is missing or malformed, a limit is out of
    /// range, or the store or document directory cannot be opened.
    pub async fn open(cfg: &Config) -> RuntimeResult<Self> {
        let settings = to_settings(cfg)?;
        let key = to_encryption_key(cfg)?;
        let kv_dir = cfg.kv_dir()?;
        let documents_dir = cfg.documents_dir()?;

        let kv = Arc::new(SurrealKvStore::open(&kv_dir)?);
        let store: Arc<dyn KvStore> = kv.clone();
        let mut runtime = Self::with_store(settings, key, store, documents_dir).await?;
        runtime.persistent = Some(kv);

        info!(kv_dir = %kv_dir.display(), "Vigil runtime opened");
        Ok(runtime)
    }

    /// Build a runtime over an existing key-value store.
    ///
    /// # Errors
    ///
    /// Returns an error if the document directory cannot be created.
    pub async fn with_store(
        settings: RuntimeSettings,
        key: EncryptionKey,
        store: Arc<dyn KvStore>,
        documents_dir: impl Into<PathBuf>,
    ) -> RuntimeResult<Self> {
        let ledger = Ledger::with_storage(Arc::new(KvLedgerStorage::new(Arc::clone(&store))))
            .with_append_timeout(settings.append_timeout);
        let vault = Vault::open(documents_dir, key, store).await?;
        Ok(Self {
            settings,
            ledger,
            vault,
            persistent: None,
        })
    }

    /// Runtime with default settings and in-memory rows (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the document directory cannot be created.
    pub async fn in_memory(
        documents_dir: impl Into<PathBuf>,
        key: EncryptionKey,
    ) -> RuntimeResult<Self> {
        Self::with_store(
            to_settings(&Config::default())?,
            key,
            Arc::new(MemoryKvStore::new()),
            documents_dir,
        )
        .await
    }

    /// Flush and close the persistent store, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    pub async fn close(&self) -> RuntimeResult<()> {
        if let Some(kv) = &self.persistent {
            kv.close().await?;
        }
        Ok(())
    }

    /// Effective settings.
    #[must_use]
    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    // ---------------------------------------------------------------------
    // Documents
    // ---------------------------------------------------------------------

    /// Validate, encrypt and register an upload, then record `UPLOAD`.
    ///
    /// Rejected uploads are not recorded.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::UploadTooLarge`], [`RuntimeError::MimeTypeNotAllowed`],
    /// [`RuntimeError::InvalidUpload`] or [`RuntimeError::InvalidInput`] for a
    /// rejected upload, or a vault or ledger error.
    pub async fn upload(
        &self,
        actor: &Actor,
        bytes: &[u8],
        request: UploadRequest,
    ) -> RuntimeResult<Document> {
        let filename = request.filename.trim();
        if filename.is_empty() {
            return Err(RuntimeError::InvalidUpload("filename is empty".to_owned()));
        }

        let size = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        if size > self.settings.max_upload_bytes {
            return Err(RuntimeError::UploadTooLarge {
                size,
                max: self.settings.max_upload_bytes,
            });
        }
        if !self.settings.allows_mime_type(&request.mime_type) {
            return Err(RuntimeError::MimeTypeNotAllowed(request.mime_type));
        }

        let clearance = match request.required_clearance {
            Some(level) => Clearance::new(level)?,
            None => self.settings.default_required_clearance,
        };

        let document = self
            .vault
            .register(
                bytes,
                DocumentMetadata {
                    filename: filename.to_owned(),
                    mime_type: request.mime_type,
                    required_clearance: clearance,
                },
            )
            .await?;

        self.record(
            LedgerRecord::new(actor.clone(), LedgerAction::Upload, LedgerStatus::Registered)
                .document(document.id)
                .required_clearance(clearance)
                .meta("filename", document.filename.as_str()),
        )
        .await?;

        Ok(document)
    }

    /// Verify a document's integrity and record `VERIFY / <status>`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::NotFound`] for an unknown id, or a vault or
    /// ledger error.
    pub async fn verify_document(
        &self,
        actor: &Actor,
        id: DocumentId,
    ) -> RuntimeResult<VerificationReport> {
        let report = self.vault.verify(id).await?;

        self.record(
            LedgerRecord::new(
                actor.clone(),
                LedgerAction::Verify,
                LedgerStatus::from(report.status.as_str()),
            )
            .document(id)
            .required_clearance(report.document.required_clearance)
            .meta("filename", report.document.filename.as_str()),
        )
        .await?;

        Ok(report)
    }

    /// Decide an access request and record `ACCESS_REQUEST / GRANTED|DENIED`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::NotFound`] for an unknown id, or a ledger error.
    pub async fn request_access(
        &self,
        actor: &Actor,
        id: DocumentId,
    ) -> RuntimeResult<AccessDecision> {
        let document = self.document(id).await?;
        let granted = actor.meets(document.required_clearance);
        let approval_id = ApprovalId::generate();

        let block = self
            .record(
                LedgerRecord::new(actor.clone(), LedgerAction::AccessRequest, grant_status(granted))
                    .document(id)
                    .required_clearance(document.required_clearance)
                    .approval_id(approval_id.clone())
                    .meta("approvalId", approval_id.as_str())
                    .meta("filename", document.filename.as_str()),
            )
            .await?;

        if !granted {
            warn!(
                document_id = %id,
                user = %actor.username,
                clearance = actor.clearance_level,
                required = %document.required_clearance,
                "Access request denied"
            );
        }

        Ok(AccessDecision {
            granted,
            approval_id,
            required_clearance: document.required_clearance,
            actor_clearance: actor.clearance_level,
            sequence: block.sequence,
        })
    }

    /// Release a document's plaintext to a cleared actor.
    ///
    /// The actor must meet both `min_download_clearance` and the document's
    /// own clearance. Records `DOWNLOAD / DENIED` for insufficient clearance,
    /// `DOWNLOAD / COMPROMISED` for a failed integrity check and
    /// `DOWNLOAD / GRANTED` otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::NotFound`], [`RuntimeError::AccessDenied`], a
    /// vault integrity error, or a ledger error.
    pub async fn download(&self, actor: &Actor, id: DocumentId) -> RuntimeResult<Download> {
        let document = self.document(id).await?;
        let base = |status: LedgerStatus| {
            LedgerRecord::new(actor.clone(), LedgerAction::Download, status)
                .document(id)
                .required_clearance(document.required_clearance)
                .meta("filename", document.filename.as_str())
        };

        let floor = self.settings.min_download_clearance;
        let reason = if !actor.meets(floor) {
            Some("below_download_floor")
        } else if !actor.meets(document.required_clearance) {
            Some("insufficient_clearance")
        } else {
            None
        };
        if let Some(reason) = reason {
            self.record(base(LedgerStatus::Denied).meta("reason", reason))
                .await?;
            return Err(RuntimeError::AccessDenied {
                document: id,
                required: floor.max(document.required_clearance).level(),
                actual: actor.clearance_level,
            });
        }

        match self.vault.retrieve_plaintext(id).await {
            Ok(bytes) => {
                self.record(base(LedgerStatus::Granted)).await?;
                Ok(Download { document, bytes })
            },
            Err(e) if e.is_integrity_failure() => {
                self.record(base(LedgerStatus::Compromised).meta("reason", failure_reason(&e)))
                    .await?;
                Err(e.into())
            },
            Err(e) => Err(e.into()),
        }
    }

    /// A document row.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::NotFound`] for an unknown id.
    pub async fn document(&self, id: DocumentId) -> RuntimeResult<Document> {
        self.vault
            .fetch(id)
            .await?
            .ok_or(RuntimeError::NotFound(id))
    }

    /// Every document, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the rows cannot be read.
    pub async fn documents(&self) -> RuntimeResult<Vec<Document>> {
        Ok(self.vault.list().await?)
    }

    // ---------------------------------------------------------------------
    // Ledger
    // ---------------------------------------------------------------------

    /// Most recent blocks first; `limit` is clamped to `1..=max_list_limit`.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read.
    pub async fn ledger(&self, limit: Option<usize>) -> RuntimeResult<Vec<LedgerBlock>> {
        let limit = self.settings.clamp_list_limit(limit);
        Ok(self.ledger.list(limit).await?)
    }

    /// Re-verify the whole chain.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read.
    pub async fn verify_ledger(&self) -> RuntimeResult<ChainVerification> {
        Ok(self.ledger.verify_chain().await?)
    }

    // ---------------------------------------------------------------------
    // Threats
    // ---------------------------------------------------------------------

    /// Threat summary over the last [`THREAT_WINDOW_HOURS`] hours.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger or document rows cannot be read.
    pub async fn threat_summary(&self) -> RuntimeResult<ThreatSummary> {
        let since = Utc::now()
            .checked_sub_signed(chrono::Duration::hours(THREAT_WINDOW_HOURS))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.threat_summary_since(Timestamp::from_datetime(since))
            .await
    }

    /// Threat summary over blocks stamped at or after `since`.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger or document rows cannot be read.
    pub async fn threat_summary_since(&self, since: Timestamp) -> RuntimeResult<ThreatSummary> {
        let blocks = self.ledger.since(since).await?;
        let documents = self.vault.list().await?;
        let summary =
            ThreatSummary::from_metrics(ThreatMetrics::collect(&blocks, &documents, since), since);
        debug!(
            score = summary.risk.score,
            level = %summary.risk.level,
            blocks = blocks.len(),
            "Computed threat summary"
        );
        Ok(summary)
    }

    async fn record(&self, record: LedgerRecord) -> RuntimeResult<LedgerBlock> {
        let action = record.action.clone();
        let block = self.ledger.append(record).await.inspect_err(|e| {
            warn!(action = %action, error = %e, "Failed to record ledger entry");
        })?;
        debug!(
            sequence = block.sequence,
            action = %block.action,
            status = %block.status,
            "Recorded ledger entry"
        );
        Ok(block)
    }
}

fn grant_status(granted: bool) -> LedgerStatus {
    if granted {
        LedgerStatus::Granted
    } else {
        LedgerStatus::Denied
    }
}

fn failure_reason(e: &VaultError) -> &'static str {
    match e {
        VaultError::AuthenticationFailed(_) => "authentication_failed",
        VaultError::FingerprintMismatch(_) => "fingerprint_mismatch",
        VaultError::MissingCiphertext(_) => "missing_ciphertext",
        VaultError::MalformedMetadata(_) => "malformed_metadata",
        _ => "error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_ledger::MetadataValue;
    use vigil_vault::DocumentStatus;

    const PDF: &str = "application/pdf";

    async fn runtime(dir: &tempfile::TempDir) -> Runtime {
        Runtime::in_memory(dir.path().join("documents"), EncryptionKey::generate())
            .await
            .unwrap()
    }

    fn analyst(level: u8) -> Actor {
        Actor::new("alice", "ANALYST", level).with_user_id("u-1")
    }

    #[tokio::test]
    async fn test_upload_records_registration() {
        let dir = tempfile::tempdir().unwrap();
        let rt = runtime(&dir).await;

        let doc = rt
            .upload(&analyst(3), b"report", UploadRequest::new("r.pdf", PDF))
            .await
            .unwrap();
        assert_eq!(doc.status, DocumentStatus::Registered);
        assert_eq!(doc.required_clearance.level(), 2);

        let blocks = rt.ledger(None).await.unwrap();
        assert_eq!(blocks.len(), 1);
        let block = &blocks[0];
        assert_eq!(block.action, LedgerAction::Upload);
        assert_eq!(block.status, LedgerStatus::Registered);
        assert_eq!(block.document_id, Some(doc.id));
        assert_eq!(block.actor.username, "alice");
        assert_eq!(block.required_clearance.map(Clearance::level), Some(2));
        assert_eq!(
            block.metadata.get("filename"),
            Some(&MetadataValue::from("r.pdf"))
        );
    }

    #[tokio::test]
    async fn test_rejected_uploads_are_not_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = to_settings(&Config::default()).unwrap();
        settings.max_upload_bytes = 4;
        let rt = Runtime::with_store(
            settings,
            EncryptionKey::generate(),
            Arc::new(MemoryKvStore::new()),
            dir.path().join("documents"),
        )
        .await
        .unwrap();
        let actor = analyst(5);

        assert!(matches!(
            rt.upload(&actor, b"too long", UploadRequest::new("a.pdf", PDF)).await,
            Err(RuntimeError::UploadTooLarge { size: 8, max: 4 })
        ));
        assert!(matches!(
            rt.upload(&actor, b"ok", UploadRequest::new("a.txt", "text/plain")).await,
            Err(RuntimeError::MimeTypeNotAllowed(m)) if m == "text/plain"
        ));
        assert!(matches!(
            rt.upload(&actor, b"ok", UploadRequest::new("a.pdf", PDF).with_clearance(6)).await,
            Err(RuntimeError::InvalidInput(_))
        ));
        assert!(matches!(
            rt.upload(&actor, b"ok", UploadRequest::new("  ", PDF)).await,
            Err(RuntimeError::InvalidUpload(_))
        ));

        assert!(rt.ledger(None).await.unwrap().is_empty());
        assert!(rt.documents().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_access_request_granted_and_denied() {
        let dir = tempfile::tempdir().unwrap();
        let rt = runtime(&dir).await;
        let doc = rt
            .upload(&analyst(5), b"secret", UploadRequest::new("s.pdf", PDF).with_clearance(4))
            .await
            .unwrap();

        let denied = rt.request_access(&analyst(3), doc.id).await.unwrap();
        assert!(!denied.granted);
        assert_eq!(denied.required_clearance.level(), 4);
        assert_eq!(denied.actor_clearance, 3);

        let granted = rt.request_access(&analyst(4), doc.id).await.unwrap();
        assert!(granted.granted);
        assert_ne!(granted.sequence, denied.sequence);

        let blocks = rt.ledger(None).await.unwrap();
        assert_eq!(blocks[0].status, LedgerStatus::Granted);
        assert_eq!(blocks[0].approval_id, granted.approval_id);
        assert_eq!(
            blocks[0].metadata.get("approvalId"),
            Some(&MetadataValue::from(granted.approval_id.as_str()))
        );
        assert_eq!(blocks[1].status, LedgerStatus::Denied);
        assert_eq!(blocks[1].action, LedgerAction::AccessRequest);
    }

    #[tokio::test]
    async fn test_unknown_document() {
        let dir = tempfile::tempdir().unwrap();
        let rt = runtime(&dir).await;
        let id = DocumentId::new();

        assert!(matches!(rt.document(id).await, Err(RuntimeError::NotFound(x)) if x == id));
        assert!(matches!(
            rt.verify_document(&analyst(5), id).await,
            Err(RuntimeError::NotFound(_))
        ));
        assert!(matches!(
            rt.request_access(&analyst(5), id).await,
            Err(RuntimeError::NotFound(_))
        ));
        assert!(rt.ledger(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_download_paths() {
        let dir = tempfile::tempdir().unwrap();
        let rt = runtime(&dir).await;
        let doc = rt
            .upload(&analyst(5), b"payload", UploadRequest::new("p.pdf", PDF).with_clearance(3))
            .await
            .unwrap();

        assert!(matches!(
            rt.download(&analyst(2), doc.id).await,
            Err(RuntimeError::AccessDenied { required: 3, actual: 2, .. })
        ));

        let download = rt.download(&analyst(3), doc.id).await.unwrap();
        assert_eq!(download.bytes, b"payload");

        tokio::fs::remove_file(&doc.stored_path).await.unwrap();
        let err = rt.download(&analyst(3), doc.id).await.unwrap_err();
        assert!(err.is_integrity_failure());
        assert_eq!(
            rt.document(doc.id).await.unwrap().status,
            DocumentStatus::Compromised
        );

        let statuses: Vec<_> = rt
            .ledger(None)
            .await
            .unwrap()
            .into_iter()
            .map(|b| (b.action, b.status))
            .collect();
        assert_eq!(
            statuses,
            vec![
                (LedgerAction::Download, LedgerStatus::Compromised),
                (LedgerAction::Download, LedgerStatus::Granted),
                (LedgerAction::Download, LedgerStatus::Denied),
                (LedgerAction::Upload, LedgerStatus::Registered),
            ]
        );
    }

    #[tokio::test]
    async fn test_download_floor_applies_to_low_clearance_documents() {
        let dir = tempfile::tempdir().unwrap();
        let rt = runtime(&dir).await;
        let doc = rt
            .upload(&analyst(5), b"memo", UploadRequest::new("m.pdf", PDF).with_clearance(1))
            .await
            .unwrap();

        // Clearance 1 meets the document but not the download floor of 2.
        assert!(rt.request_access(&analyst(1), doc.id).await.unwrap().granted);
        assert!(matches!(
            rt.download(&analyst(1), doc.id).await,
            Err(RuntimeError::AccessDenied { required: 2, actual: 1, .. })
        ));
        assert_eq!(rt.download(&analyst(2), doc.id).await.unwrap().bytes, b"memo");

        let blocks = rt.ledger(Some(2)).await.unwrap();
        assert_eq!(
            (blocks[0].action.clone(), blocks[0].status.clone()),
            (LedgerAction::Download, LedgerStatus::Granted)
        );
        assert_eq!(
            (blocks[1].action.clone(), blocks[1].status.clone()),
            (LedgerAction::Download, LedgerStatus::Denied)
        );
        assert_eq!(
            blocks[1].metadata.get("reason"),
            Some(&MetadataValue::from("below_download_floor"))
        );
    }

    #[tokio::test]
    async fn test_threat_summary() {
        let dir = tempfile::tempdir().unwrap();
        let rt = runtime(&dir).await;

        let quiet = rt.threat_summary().await.unwrap();
        assert_eq!(quiet.metrics, ThreatMetrics::default());
        assert_eq!(quiet.risk.level, crate::RiskLevel::Low);

        let doc = rt
            .upload(&analyst(5), b"plans", UploadRequest::new("p.pdf", PDF).with_clearance(4))
            .await
            .unwrap();
        for _ in 0..5 {
            rt.request_access(&analyst(2), doc.id).await.unwrap();
        }
        rt.request_access(&analyst(4), doc.id).await.unwrap();
        tokio::fs::write(&doc.stored_path, b"xxxxx").await.unwrap();
        rt.verify_document(&analyst(4), doc.id).await.unwrap();

        let summary = rt.threat_summary().await.unwrap();
        assert_eq!(
            summary.metrics,
            ThreatMetrics {
                denied_access: 5,
                access_requests: 6,
                verify_failures: 1,
                compromised_documents: 1,
            }
        );
        assert_eq!(summary.risk.score, 10);
        assert_eq!(summary.risk.level, crate::RiskLevel::High);
        assert!(summary.summary.contains("Compromised documents detected."));

        // Ledger activity before the window is ignored; the document table is not.
        let later = Utc::now().checked_add_signed(chrono::Duration::hours(1)).unwrap();
        let empty_window = rt
            .threat_summary_since(Timestamp::from_datetime(later))
            .await
            .unwrap();
        assert_eq!(empty_window.metrics.access_requests, 0);
        assert_eq!(empty_window.metrics.compromised_documents, 1);
        assert_eq!(empty_window.risk.score, 5);
    }

    #[tokio::test]
    async fn test_ledger_limit_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let rt = runtime(&dir).await;
        for i in 0..3 {
            rt.upload(&analyst(5), b"x", UploadRequest::new(format!("{i}.pdf"), PDF))
                .await
                .unwrap();
        }

        assert_eq!(rt.ledger(Some(0)).await.unwrap().len(), 1);
        assert_eq!(rt.ledger(Some(2)).await.unwrap().len(), 2);
        assert_eq!(rt.ledger(Some(usize::MAX)).await.unwrap().len(), 3);
        assert!(rt.verify_ledger().await.unwrap().valid);
    }
}
