//! Conversion from `vigil_config::Config` to runtime and domain types.
//!
//! `vigil-config` holds plain strings and numbers. This module turns them
//! into typed values once, so the CLI and tests share one conversion.

use std::time::Duration;

use vigil_config::Config;
use vigil_core::Clearance;
use vigil_crypto::{CryptoError, EncryptionKey};
use vigil_telemetry::LogConfig;

use crate::error::RuntimeResult;

/// Typed runtime limits and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSettings {
    /// Largest accepted upload.
    pub max_upload_bytes: u64,
    /// Accepted MIME types.
    pub allowed_mime_types: Vec<String>,
    /// Clearance applied when an upload names none.
    pub default_required_clearance: Clearance,
    /// Floor every download must meet, whatever the document requires.
    pub min_download_clearance: Clearance,
    /// Ledger listing size when the caller names none.
    pub default_list_limit: usize,
    /// Largest ledger listing.
    pub max_list_limit: usize,
    /// Bound on waiting for the ledger append lock.
    pub append_timeout: Duration,
}

impl RuntimeSettings {
    /// Clamp a requested listing size to `1..=max_list_limit`.
    #[must_use]
    pub fn clamp_list_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_list_limit)
            .clamp(1, self.max_list_limit.max(1))
    }

    /// Whether `mime_type` may be uploaded.
    #[must_use]
    pub fn allows_mime_type(&self, mime_type: &str) -> bool {
        self.allowed_mime_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(mime_type))
    }
}

/// Convert config to [`RuntimeSettings`].
///
/// # Errors
///
/// Returns an error if a clearance level is out of range.
pub fn to_settings(cfg: &Config) -> RuntimeResult<RuntimeSettings> {
    Ok(RuntimeSettings {
        max_upload_bytes: cfg.documents.max_upload_bytes,
        allowed_mime_types: cfg.documents.allowed_mime_types.clone(),
        default_required_clearance: Clearance::new(cfg.documents.default_required_clearance)?,
        min_download_clearance: Clearance::new(cfg.documents.min_download_clearance)?,
        default_list_limit: cfg.ledger.default_list_limit,
        max_list_limit: cfg.ledger.max_list_limit,
        append_timeout: Duration::from_millis(cfg.ledger.append_timeout_ms),
    })
}

/// Parse the configured encryption key.
///
/// # Errors
///
/// Returns [`CryptoError::MissingKey`] when unset, or a parse error for
/// malformed key text.
pub fn to_encryption_key(cfg: &Config) -> RuntimeResult<EncryptionKey> {
    let text = cfg
        .crypto
        .encryption_key
        .as_deref()
        .ok_or(CryptoError::MissingKey)?;
    Ok(EncryptionKey::parse(text)?)
}

/// Convert config to a [`LogConfig`].
///
/// # Errors
///
/// Returns an error if the log format is unknown.
pub fn to_log_config(cfg: &Config) -> RuntimeResult<LogConfig> {
    Ok(LogConfig::from_section(&cfg.logging)?)
}
