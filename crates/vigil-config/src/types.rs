//! Configuration types for Vigil.
//!
//! Types here carry plain values only; parsing of the encryption key and
//! clearance levels into domain types happens where they are used. Every
//! struct implements [`Default`] with the same values as `defaults.toml`.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where data lives.
    pub storage: StorageSection,
    /// Key material.
    pub crypto: CryptoSection,
    /// Ledger behaviour.
    pub ledger: LedgerSection,
    /// Document upload rules.
    pub documents: DocumentsSection,
    /// Log level and format.
    pub logging: LoggingSection,
}

impl Config {
    /// The data directory: `storage.data_dir`, or the platform data directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoDataDir`] if neither is available.
    pub fn data_dir(&self) -> ConfigResult<PathBuf> {
        if let Some(dir) = &self.storage.data_dir {
            return Ok(dir.clone());
        }
        directories::ProjectDirs::from("", "", "vigil")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or(ConfigError::NoDataDir)
    }

    /// Directory of the ledger and document-row key-value store.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be determined.
    pub fn kv_dir(&self) -> ConfigResult<PathBuf> {
        Ok(self.data_dir()?.join("kv"))
    }

    /// Directory of encrypted document files.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be determined.
    pub fn documents_dir(&self) -> ConfigResult<PathBuf> {
        Ok(self.data_dir()?.join("documents"))
    }
}

/// `[storage]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Data directory override.
    pub data_dir: Option<PathBuf>,
}

/// `[crypto]`
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoSection {
    /// Document encryption key text (hex or base64).
    pub encryption_key: Option<String>,
}

impl fmt::Debug for CryptoSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoSection")
            .field(
                "encryption_key",
                &self.encryption_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// `[ledger]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSection {
    /// Bound on waiting for the append lock, in milliseconds.
    pub append_timeout_ms: u64,
    /// Blocks returned by a listing when no limit is given.
    pub default_list_limit: usize,
    /// Largest listing a caller may request.
    pub max_list_limit: usize,
}

impl Default for LedgerSection {
    fn default() -> Self {
        Self {
            append_timeout_ms: 5000,
            default_list_limit: 200,
            max_list_limit: 500,
        }
    }
}

/// `[documents]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentsSection {
    /// Largest accepted upload.
    pub max_upload_bytes: u64,
    /// Accepted MIME types.
    pub allowed_mime_types: Vec<String>,
    /// Clearance applied when an upload does not specify one.
    pub default_required_clearance: u8,
    /// Lowest clearance allowed to download any plaintext.
    pub min_download_clearance: u8,
}

impl Default for DocumentsSection {
    fn default() -> Self {
        Self {
            max_upload_bytes: 20_971_520,
            allowed_mime_types: vec![
                "application/pdf".to_owned(),
                "application/msword".to_owned(),
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
                    .to_owned(),
            ],
            default_required_clearance: 2,
            min_download_clearance: 2,
        }
    }
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Level: `trace`, `debug`, `info`, `warn` or `error`.
    pub level: String,
    /// Format: `pretty`, `compact` or `json`.
    pub format: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
        }
    }
}
