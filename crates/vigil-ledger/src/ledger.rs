//! Ledger - append engine and chain verifier.
//!
//! Appends are serialized behind a single fair async mutex that also owns
//! the cached chain head. Verification reads storage directly and never
//! waits for the append lock.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};
use vigil_core::Timestamp;

use crate::block::{ApprovalId, GENESIS_HASH, LedgerBlock, LedgerRecord};
use crate::error::{LedgerError, LedgerResult};
use crate::storage::{KvLedgerStorage, LedgerStorage, StoredBlock};

/// Default bound on waiting for the append lock.
pub const DEFAULT_APPEND_TIMEOUT: Duration = Duration::from_millis(5000);

/// What the next block needs to know about the chain.
#[derive(Debug, Clone)]
struct ChainHead {
    sequence: u64,
    hash: String,
    timestamp: Option<Timestamp>,
}

impl ChainHead {
    fn genesis() -> Self {
        Self {
            sequence: 0,
            hash: GENESIS_HASH.to_string(),
            timestamp: None,
        }
    }

    fn of(block: &LedgerBlock) -> Self {
        Self {
            sequence: block.sequence,
            hash: block.current_hash.to_hex(),
            timestamp: Some(block.timestamp),
        }
    }
}

/// Append-only, hash-chained audit ledger.
pub struct Ledger {
    storage: Arc<dyn LedgerStorage>,
    /// `None` until loaded from storage, and again after a failed write.
    head: Mutex<Option<ChainHead>>,
    append_timeout: Duration,
}

impl Ledger {
    /// Create a ledger over a storage backend.
    #[must_use]
    pub fn with_storage(storage: Arc<dyn LedgerStorage>) -> Self {
        Self {
            storage,
            head: Mutex::new(None),
            append_timeout: DEFAULT_APPEND_TIMEOUT,
        }
    }

    /// Open a `SurrealKV`-backed ledger at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails to open.
    pub fn open(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let storage = KvLedgerStorage::open(path)?;
        Ok(Self::with_storage(Arc::new(storage)))
    }

    /// In-memory ledger (for testing).
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_storage(Arc::new(KvLedgerStorage::in_memory()))
    }

    /// Set how long an append may wait for the lock.
    #[must_use]
    pub fn with_append_timeout(mut self, timeout: Duration) -> Self {
        self.append_timeout = timeout;
        self
    }

    /// Append a record as the next block of the chain.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Contention`] if the lock is not acquired within the
    ///   append timeout, or the next sequence number is taken twice in a row.
    ///   Retryable.
    /// - [`LedgerError::Unavailable`] if storage fails. Nothing was appended.
    pub async fn append(&self, record: LedgerRecord) -> LedgerResult<LedgerBlock> {
        let mut head = tokio::time::timeout(self.append_timeout, self.head.lock())
            .await
            .map_err(|_| {
                warn!(timeout = ?self.append_timeout, "Timed out waiting for ledger append lock");
                LedgerError::Contention(format!(
                    "append lock not acquired within {} ms",
                    self.append_timeout.as_millis()
                ))
            })?;

        let approval_id = record
            .approval_id
            .clone()
            .unwrap_or_else(ApprovalId::generate);

        for _ in 0..2 {
            let current = match head.as_ref() {
                Some(cached) => cached.clone(),
                None => {
                    let loaded = self.load_head().await?;
                    *head = Some(loaded.clone());
                    loaded
                },
            };

            let sequence = current
                .sequence
                .checked_add(1)
                .ok_or_else(|| LedgerError::Unavailable("sequence space exhausted".into()))?;
            let now = Timestamp::now();
            let timestamp = current.timestamp.map_or(now, |prev| now.max(prev));

            let block = LedgerBlock::seal(
                sequence,
                timestamp,
                &record,
                approval_id.clone(),
                current.hash,
            );

            match self.storage.insert_block(&block).await {
                Ok(true) => {
                    debug!(
                        sequence,
                        action = %block.action,
                        status = %block.status,
                        hash = %block.current_hash,
                        "Appended ledger block"
                    );
                    *head = Some(ChainHead::of(&block));
                    return Ok(block);
                },
                Ok(false) => {
                    warn!(sequence, "Ledger sequence already taken, reloading chain head");
                    *head = None;
                },
                Err(e) => {
                    error!(sequence, error = %e, "Failed to persist ledger block");
                    *head = None;
                    return Err(LedgerError::Unavailable(e.to_string()));
                },
            }
        }

        Err(LedgerError::Contention(
            "next sequence number taken by a concurrent writer".into(),
        ))
    }

    async fn load_head(&self) -> LedgerResult<ChainHead> {
        match self.storage.head().await {
            Ok(Some(block)) => Ok(ChainHead::of(&block)),
            Ok(None) => Ok(ChainHead::genesis()),
            Err(e) => {
                error!(error = %e, "Failed to load ledger chain head");
                Err(LedgerError::Unavailable(e.to_string()))
            },
        }
    }

    /// Replay the whole chain and report every break found.
    ///
    /// # Errors
    ///
    /// Returns an error only if storage cannot be read; corrupted blocks are
    /// reported as issues.
    pub async fn verify_chain(&self) -> LedgerResult<ChainVerification> {
        let stored = self.storage.scan().await?;
        let length = stored.len();
        let mut issues = Vec::new();
        // `None` after an undecodable block: its successor's link cannot be judged.
        let mut previous_hash: Option<String> = Some(GENESIS_HASH.to_string());
        let mut position: u64 = 0;
        // Sequence of the prior entry; an undecodable entry counts as in place.
        let mut prior_sequence: u64 = 0;

        for entry in stored {
            position = position.saturating_add(1);

            let block = match entry {
                StoredBlock::Decoded(block) => block,
                StoredBlock::Undecodable { key, reason } => {
                    warn!(position, key = %key, reason = %reason, "Undecodable ledger block");
                    issues.push(ChainIssue::Undecodable {
                        sequence: position,
                        reason,
                    });
                    previous_hash = None;
                    prior_sequence = position;
                    continue;
                },
            };

            let continues_run = block.sequence == prior_sequence.saturating_add(1);
            if block.sequence != position && !continues_run {
                warn!(expected = position, found = block.sequence, "Ledger sequence gap");
                issues.push(ChainIssue::SequenceGap {
                    sequence: position,
                    found: block.sequence,
                });
            }

            if let Some(expected) = previous_hash.as_deref()
                && block.previous_hash != expected
            {
                warn!(sequence = block.sequence, "Ledger chain link broken");
                issues.push(ChainIssue::BrokenLink {
                    sequence: position,
                    expected_previous: expected.to_string(),
                    actual_previous: block.previous_hash.clone(),
                });
            }

            let computed = block.compute_hash();
            if computed != block.current_hash {
                warn!(sequence = block.sequence, "Ledger block hash mismatch");
                issues.push(ChainIssue::HashMismatch {
                    sequence: position,
                    stored: block.current_hash.to_hex(),
                    computed: computed.to_hex(),
                });
            }

            prior_sequence = block.sequence;
            previous_hash = Some(block.current_hash.to_hex());
        }

        Ok(ChainVerification {
            valid: issues.is_empty(),
            broken_at_sequence: issues.first().map(ChainIssue::sequence),
            length,
            issues,
        })
    }

    /// Up to `limit` most recent blocks, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub async fn list(&self, limit: usize) -> LedgerResult<Vec<LedgerBlock>> {
        self.storage.recent(limit).await
    }

    /// Blocks stamped at or after `cutoff`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub async fn since(&self, cutoff: Timestamp) -> LedgerResult<Vec<LedgerBlock>> {
        let mut blocks = self.storage.recent(usize::MAX).await?;
        // Timestamps never decrease along the chain.
        if let Some(end) = blocks.iter().position(|b| b.timestamp < cutoff) {
            blocks.truncate(end);
        }
        Ok(blocks)
    }

    /// Number of stored blocks.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub async fn len(&self) -> LedgerResult<usize> {
        self.storage.count().await
    }

    /// Whether the ledger has no blocks.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub async fn is_empty(&self) -> LedgerResult<bool> {
        Ok(self.len().await? == 0)
    }
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("append_timeout", &self.append_timeout)
            .finish_non_exhaustive()
    }
}

/// Result of chain verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainVerification {
    /// Whether the chain is intact.
    pub valid: bool,
    /// Sequence of the first break, if any.
    pub broken_at_sequence: Option<u64>,
    /// Number of stored blocks scanned.
    pub length: usize,
    /// Every break found, in chain order.
    pub issues: Vec<ChainIssue>,
}

/// A break found during chain verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainIssue {
    /// Stored bytes at this position are not a block.
    Undecodable {
        /// Chain position.
        sequence: u64,
        /// Decoder message.
        reason: String,
    },
    /// The block at this position carries a different sequence number.
    ///
    /// Reported once per discontinuity: after a deleted block, the blocks
    /// that follow it in unbroken order are not reported again.
    SequenceGap {
        /// Chain position.
        sequence: u64,
        /// Sequence number found in the block.
        found: u64,
    },
    /// `previous_hash` does not match the prior block.
    BrokenLink {
        /// Chain position.
        sequence: u64,
        /// Hash of the prior block.
        expected_previous: String,
        /// Hash recorded in this block.
        actual_previous: String,
    },
    /// `current_hash` does not match the block's contents.
    HashMismatch {
        /// Chain position.
        sequence: u64,
        /// Hash stored in the block.
        stored: String,
        /// Hash recomputed from the fields.
        computed: String,
    },
}

impl ChainIssue {
    /// Chain position where the issue was found.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        match self {
            Self::Undecodable { sequence, .. }
            | Self::SequenceGap { sequence, .. }
            | Self::BrokenLink { sequence, .. }
            | Self::HashMismatch { sequence, .. } => *sequence,
        }
    }
}

impl fmt::Display for ChainIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undecodable { sequence, reason } => {
                write!(f, "Undecodable block at {sequence}: {reason}")
            },
            Self::SequenceGap { sequence, found } => {
                write!(f, "Sequence gap at {sequence} (found {found})")
            },
            Self::BrokenLink { sequence, .. } => {
                write!(f, "Broken chain link at {sequence}")
            },
            Self::HashMismatch { sequence, .. } => {
                write!(f, "Hash mismatch at {sequence}")
            },
        }
    }
}
