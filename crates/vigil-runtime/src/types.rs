//! Request and response types for runtime operations.

use vigil_core::Clearance;
use vigil_ledger::ApprovalId;
use vigil_vault::Document;

/// An upload as received from a frontend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Original file name.
    pub filename: String,
    /// Declared MIME type.
    pub mime_type: String,
    /// Requested clearance; the configured default when `None`.
    pub required_clearance: Option<u8>,
}

impl UploadRequest {
    /// Upload with the default clearance.
    #[must_use]
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            required_clearance: None,
        }
    }

    /// Request a specific clearance level.
    #[must_use]
    pub fn with_clearance(mut self, level: u8) -> Self {
        self.required_clearance = Some(level);
        self
    }
}

/// Outcome of an access request. Recorded whether granted or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDecision {
    /// Whether the actor meets the document's clearance.
    pub granted: bool,
    /// Token recorded with the ledger entry.
    pub approval_id: ApprovalId,
    /// The document's required clearance.
    pub required_clearance: Clearance,
    /// The actor's clearance at the time of the request.
    pub actor_clearance: u8,
    /// Sequence of the ledger entry recording this decision.
    pub sequence: u64,
}

/// Decrypted document content released to a cleared actor.
#[derive(Clone, PartialEq, Eq)]
pub struct Download {
    /// The document row.
    pub document: Document,
    /// Plaintext, fingerprint already checked.
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for Download {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Download")
            .field("document", &self.document.id)
            .field("len", &self.bytes.len())
            .finish()
    }
}
