//! Ledger block and record types.

use rand::Rng;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use vigil_core::{Actor, Clearance, DocumentId, Timestamp};
use vigil_crypto::ContentHash;

use crate::canonical::block_hash_input;

/// `previous_hash` of the first block in every chain.
pub const GENESIS_HASH: &str = "0000000000000000";

macro_rules! open_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
            /// Any other value, preserved verbatim.
            Other(String),
        }

        impl $name {
            /// The wire string for this value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $text,)+
                    Self::Other(s) => s,
                }
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                match s {
                    $($text => Self::$variant,)+
                    other => Self::Other(other.to_string()),
                }
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                match Self::from(s.as_str()) {
                    Self::Other(_) => Self::Other(s),
                    known => known,
                }
            }
        }

        impl From<$name> for String {
            fn from(v: $name) -> Self {
                match v {
                    $name::Other(s) => s,
                    known => known.as_str().to_string(),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

open_enum! {
    /// What was done.
    LedgerAction {
        /// A document was registered.
        Upload => "UPLOAD",
        /// A document's integrity was checked.
        Verify => "VERIFY",
        /// Access to a document was requested.
        AccessRequest => "ACCESS_REQUEST",
        /// Plaintext of a document was requested.
        Download => "DOWNLOAD",
        /// A document view was attempted.
        ViewAttempt => "VIEW_ATTEMPT",
    }
}

open_enum! {
    /// How it turned out.
    LedgerStatus {
        /// Document registered.
        Registered => "REGISTERED",
        /// Document verified intact.
        Verified => "VERIFIED",
        /// Document failed an integrity check.
        Compromised => "COMPROMISED",
        /// Access granted.
        Granted => "GRANTED",
        /// Access denied.
        Denied => "DENIED",
        /// Generic success.
        Success => "SUCCESS",
        /// Generic failure.
        Failure => "FAILURE",
    }
}

/// Correlation token attached to every block (`APR-####`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApprovalId(String);

impl ApprovalId {
    /// Generate a fresh `APR-1000`..`APR-9999` token from the OS CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        let n: u16 = OsRng.gen_range(1000..10000);
        Self(format!("APR-{n}"))
    }

    /// Wrap an existing token.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApprovalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A primitive metadata value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// JSON `null`.
    Null,
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A string.
    Str(String),
}

impl MetadataValue {
    /// Convert to a `serde_json::Value`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Str(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for MetadataValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for MetadataValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Block metadata; a `BTreeMap` so iteration order is already canonical.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// One immutable, hash-linked entry in the ledger.
///
/// Decoding is strict: unknown fields and non-canonical spellings of known
/// ones are rejected, so every stored byte outside `metadata` encoding is
/// covered by `current_hash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LedgerBlock {
    /// Position in the chain, starting at 1.
    pub sequence: u64,
    /// When the block was created.
    pub timestamp: Timestamp,
    /// Who acted.
    pub actor: Actor,
    /// What was done.
    pub action: LedgerAction,
    /// How it turned out.
    pub status: LedgerStatus,
    /// Correlation token.
    pub approval_id: ApprovalId,
    /// Clearance the subject document required, for access-related actions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_clearance: Option<Clearance>,
    /// Subject document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<DocumentId>,
    /// Free-form primitive metadata.
    #[serde(default)]
    pub metadata: Metadata,
    /// `current_hash` of the previous block, or [`GENESIS_HASH`].
    pub previous_hash: String,
    /// SHA-256 of the canonical encoding of every other field.
    pub current_hash: ContentHash,
}

impl LedgerBlock {
    /// Build and hash the block that extends a chain.
    #[must_use]
    pub fn seal(
        sequence: u64,
        timestamp: Timestamp,
        record: &LedgerRecord,
        approval_id: ApprovalId,
        previous_hash: String,
    ) -> Self {
        let mut block = Self {
            sequence,
            timestamp,
            actor: record.actor.clone(),
            action: record.action.clone(),
            status: record.status.clone(),
            approval_id,
            required_clearance: record.required_clearance,
            document_id: record.document_id,
            metadata: record.metadata.clone(),
            previous_hash,
            current_hash: ContentHash::from_bytes([0; 32]),
        };
        block.current_hash = block.compute_hash();
        block
    }

    /// Recompute the hash from the block's fields.
    #[must_use]
    pub fn compute_hash(&self) -> ContentHash {
        ContentHash::hash(block_hash_input(self).as_bytes())
    }

    /// Whether the stored hash matches the recomputed one.
    #[must_use]
    pub fn verify_hash(&self) -> bool {
        self.compute_hash() == self.current_hash
    }

    /// Whether this block links to `previous`.
    #[must_use]
    pub fn follows(&self, previous: &LedgerBlock) -> bool {
        self.previous_hash == previous.current_hash.to_hex()
    }
}

/// Input to [`Ledger::append`](crate::Ledger::append).
///
/// Sequence, timestamp and hashes are assigned by the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRecord {
    /// Who acted.
    pub actor: Actor,
    /// What was done.
    pub action: LedgerAction,
    /// How it turned out.
    pub status: LedgerStatus,
    /// Required clearance of the subject document.
    pub required_clearance: Option<Clearance>,
    /// Subject document.
    pub document_id: Option<DocumentId>,
    /// Metadata.
    pub metadata: Metadata,
    /// Caller-supplied correlation token; generated when absent.
    pub approval_id: Option<ApprovalId>,
}

impl LedgerRecord {
    /// Start a record.
    #[must_use]
    pub fn new(
        actor: Actor,
        action: impl Into<LedgerAction>,
        status: impl Into<LedgerStatus>,
    ) -> Self {
        Self {
            actor,
            action: action.into(),
            status: status.into(),
            required_clearance: None,
            document_id: None,
            metadata: Metadata::new(),
            approval_id: None,
        }
    }

    /// Set the subject document.
    #[must_use]
    pub fn document(mut self, id: DocumentId) -> Self {
        self.document_id = Some(id);
        self
    }

    /// Set the required clearance.
    #[must_use]
    pub fn required_clearance(mut self, clearance: Clearance) -> Self {
        self.required_clearance = Some(clearance);
        self
    }

    /// Add a metadata entry.
    #[must_use]
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Use a specific approval id.
    #[must_use]
    pub fn approval_id(mut self, id: ApprovalId) -> Self {
        self.approval_id = Some(id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approval_id_format() {
        for _ in 0..100 {
            let id = ApprovalId::generate();
            let digits = id.as_str().strip_prefix("APR-").unwrap();
            let n: u16 = digits.parse().unwrap();
            assert!((1000..=9999).contains(&n));
        }
    }

    #[test]
    fn test_open_enums_preserve_unknown() {
        assert_eq!(LedgerAction::from("UPLOAD"), LedgerAction::Upload);
        assert_eq!(
            LedgerAction::from("ROTATE_KEYS"),
            LedgerAction::Other("ROTATE_KEYS".into())
        );
        let json = serde_json::to_string(&LedgerStatus::Other("ESCALATED".into())).unwrap();
        assert_eq!(json, "\"ESCALATED\"");
        let back: LedgerStatus = serde_json::from_str("\"DENIED\"").unwrap();
        assert_eq!(back, LedgerStatus::Denied);
    }

    #[test]
    fn test_metadata_rejects_floats() {
        let ok: Metadata = serde_json::from_str(r#"{"a":null,"b":true,"c":3,"d":"x"}"#).unwrap();
        assert_eq!(ok.len(), 4);
        assert_eq!(ok["c"], MetadataValue::Int(3));
        assert!(serde_json::from_str::<Metadata>(r#"{"a":1.5}"#).is_err());
    }

    #[test]
    fn test_seal_and_verify() {
        let record = LedgerRecord::new(Actor::new("bob", "PUBLIC", 1), "VIEW_ATTEMPT", "FAILURE")
            .meta("reason", "clearance");
        let block = LedgerBlock::seal(
            1,
            Timestamp::now(),
            &record,
            ApprovalId::generate(),
            GENESIS_HASH.to_string(),
        );
        assert!(block.verify_hash());

        let mut tampered = block.clone();
        tampered.actor.clearance_level = 5;
        assert!(!tampered.verify_hash());

        let json = serde_json::to_string(&block).unwrap();
        let back: LedgerBlock = serde_json::from_str(&json).unwrap();
        assert!(back.verify_hash());
        assert_eq!(back, block);
    }
}
