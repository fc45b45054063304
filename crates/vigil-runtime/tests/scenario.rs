//! End-to-end document lifecycle against the runtime.

use vigil_config::Config;
use vigil_core::Actor;
use vigil_crypto::{ContentHash, EncryptionKey};
use vigil_ledger::{LedgerAction, LedgerStatus};
use vigil_runtime::{Runtime, RuntimeError, UploadRequest};
use vigil_vault::{DocumentStatus, IntegrityFailure};

const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

fn officer() -> Actor {
    Actor::new("officer", "CONFIDENTIAL", 3).with_user_id("7")
}

#[tokio::test]
async fn test_register_verify_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let rt = Runtime::in_memory(dir.path().join("documents"), EncryptionKey::generate())
        .await
        .unwrap();
    let actor = officer();

    let doc = rt
        .upload(
            &actor,
            b"hello",
            UploadRequest::new("hello.pdf", "application/pdf").with_clearance(2),
        )
        .await
        .unwrap();
    assert_eq!(doc.status, DocumentStatus::Registered);
    assert_eq!(doc.fingerprint.to_hex(), HELLO_SHA256);
    assert_eq!(doc.fingerprint, ContentHash::hash(b"hello"));

    let report = rt.verify_document(&actor, doc.id).await.unwrap();
    assert_eq!(report.status, DocumentStatus::Verified);
    assert_eq!(report.recomputed_fingerprint.unwrap().to_hex(), HELLO_SHA256);

    let prior_head = rt.ledger(Some(1)).await.unwrap().remove(0);
    assert_eq!(prior_head.action, LedgerAction::Verify);
    assert_eq!(prior_head.status, LedgerStatus::Verified);

    tokio::fs::write(&doc.stored_path, b"not the ciphertext you stored")
        .await
        .unwrap();

    let report = rt.verify_document(&actor, doc.id).await.unwrap();
    assert_eq!(report.status, DocumentStatus::Compromised);
    assert_eq!(report.failure, Some(IntegrityFailure::AuthenticationFailed));
    assert_eq!(
        rt.document(doc.id).await.unwrap().status,
        DocumentStatus::Compromised
    );

    let head = rt.ledger(Some(1)).await.unwrap().remove(0);
    assert_eq!(head.action, LedgerAction::Verify);
    assert_eq!(head.status, LedgerStatus::Compromised);
    assert_eq!(head.document_id, Some(doc.id));
    assert_eq!((prior_head.sequence, head.sequence), (2, 3));
    assert_eq!(head.previous_hash, prior_head.current_hash.to_hex());

    let chain = rt.verify_ledger().await.unwrap();
    assert!(chain.valid);
    assert_eq!(chain.length, 3);

    let err = rt.download(&actor, doc.id).await.unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Vault(vigil_vault::VaultError::AuthenticationFailed(id)) if id == doc.id
    ));
}

#[tokio::test]
async fn test_persistent_runtime_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.storage.data_dir = Some(dir.path().to_path_buf());
    config.crypto.encryption_key = Some(EncryptionKey::generate().to_hex().to_string());

    let rt = Runtime::open(&config).await.unwrap();
    let actor = officer();
    let doc = rt
        .upload(
            &actor,
            b"persisted",
            UploadRequest::new("p.pdf", "application/pdf"),
        )
        .await
        .unwrap();

    assert!(doc.stored_path.starts_with(dir.path().join("documents")));
    assert!(dir.path().join("kv").exists());
    assert_eq!(rt.documents().await.unwrap().len(), 1);

    let decision = rt.request_access(&actor, doc.id).await.unwrap();
    assert!(decision.granted);
    assert!(decision.approval_id.as_str().starts_with("APR-"));

    let download = rt.download(&actor, doc.id).await.unwrap();
    assert_eq!(download.bytes, b"persisted");
    assert!(rt.verify_ledger().await.unwrap().valid);

    rt.close().await.unwrap();
}

#[tokio::test]
async fn test_missing_key_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.storage.data_dir = Some(dir.path().to_path_buf());

    assert!(matches!(
        Runtime::open(&config).await,
        Err(RuntimeError::Crypto(vigil_crypto::CryptoError::MissingKey))
    ));
}
