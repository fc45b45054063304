//! Ledger storage trait and key-value implementation.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;
use vigil_storage::{KvStore, MemoryKvStore, StorageError, SurrealKvStore};

use crate::block::LedgerBlock;
use crate::error::{LedgerError, LedgerResult};

/// Namespace holding one JSON block per sequence number.
pub const NS_BLOCKS: &str = "ledger:blocks";

/// Storage key for a sequence number; zero padding keeps key order equal to
/// sequence order.
#[must_use]
pub fn block_key(sequence: u64) -> String {
    format!("{sequence:020}")
}

/// A block as found in storage, which may not decode.
#[derive(Debug, Clone)]
pub enum StoredBlock {
    /// The bytes decoded into a block.
    Decoded(LedgerBlock),
    /// The bytes are not a valid block.
    Undecodable {
        /// Storage key the bytes were found under.
        key: String,
        /// Decoder message.
        reason: String,
    },
}

/// Storage backend for the ledger.
///
/// Blocks are write-once: there is no update or delete.
#[async_trait]
pub trait LedgerStorage: Send + Sync {
    /// Persist `block` only if its sequence number is free.
    ///
    /// Returns `false` if a block with that sequence already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails; nothing is persisted in that case.
    async fn insert_block(&self, block: &LedgerBlock) -> LedgerResult<bool>;

    /// The block with the highest sequence number.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the head does not decode.
    async fn head(&self) -> LedgerResult<Option<LedgerBlock>>;

    /// Every stored block in ascending key order.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store itself fails.
    async fn scan(&self) -> LedgerResult<Vec<StoredBlock>>;

    /// Up to `limit` most recent decodable blocks, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    async fn recent(&self, limit: usize) -> LedgerResult<Vec<LedgerBlock>>;

    /// Number of stored blocks.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    async fn count(&self) -> LedgerResult<usize>;
}

/// [`LedgerStorage`] over a namespaced [`KvStore`].
#[derive(Clone)]
pub struct KvLedgerStorage {
    store: Arc<dyn KvStore>,
}

impl std::fmt::Debug for KvLedgerStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvLedgerStorage")
            .field("namespace", &NS_BLOCKS)
            .finish_non_exhaustive()
    }
}

impl KvLedgerStorage {
    /// Use an existing key-value store.
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Open or create a `SurrealKV`-backed ledger at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails to open.
    pub fn open(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let store = SurrealKvStore::open(path)?;
        Ok(Self::new(Arc::new(store)))
    }

    /// In-memory storage (for testing).
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKvStore::new()))
    }

    async fn keys(&self) -> LedgerResult<Vec<String>> {
        Ok(self.store.list_keys(NS_BLOCKS).await?)
    }

    async fn decode(&self, key: &str) -> LedgerResult<Option<StoredBlock>> {
        let Some(bytes) = self.store.get(NS_BLOCKS, key).await? else {
            return Ok(None);
        };
        Ok(Some(match serde_json::from_slice::<LedgerBlock>(&bytes) {
            Ok(block) => StoredBlock::Decoded(block),
            Err(e) => StoredBlock::Undecodable {
                key: key.to_string(),
                reason: e.to_string(),
            },
        }))
    }
}

#[async_trait]
impl LedgerStorage for KvLedgerStorage {
    async fn insert_block(&self, block: &LedgerBlock) -> LedgerResult<bool> {
        let bytes = serde_json::to_vec(block)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let inserted = self
            .store
            .insert_new(NS_BLOCKS, &block_key(block.sequence), bytes)
            .await?;
        Ok(inserted)
    }

    async fn head(&self) -> LedgerResult<Option<LedgerBlock>> {
        let keys = self.keys().await?;
        let Some(last) = keys.last() else {
            return Ok(None);
        };
        match self.decode(last).await? {
            Some(StoredBlock::Decoded(block)) => Ok(Some(block)),
            Some(StoredBlock::Undecodable { key, reason }) => Err(LedgerError::Serialization(
                format!("chain head {key} does not decode: {reason}"),
            )),
            None => Err(LedgerError::Storage(format!("chain head {last} vanished"))),
        }
    }

    async fn scan(&self) -> LedgerResult<Vec<StoredBlock>> {
        let keys = self.keys().await?;
        let mut blocks = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(stored) = self.decode(&key).await? {
                blocks.push(stored);
            }
        }
        Ok(blocks)
    }

    async fn recent(&self, limit: usize) -> LedgerResult<Vec<LedgerBlock>> {
        let keys = self.keys().await?;
        let mut blocks = Vec::with_capacity(limit.min(keys.len()));
        for key in keys.iter().rev() {
            if blocks.len() >= limit {
                break;
            }
            match self.decode(key).await? {
                Some(StoredBlock::Decoded(block)) => blocks.push(block),
                Some(StoredBlock::Undecodable { key, reason }) => {
                    warn!(key = %key, reason = %reason, "Skipping undecodable ledger block");
                },
                None => {},
            }
        }
        Ok(blocks)
    }

    async fn count(&self) -> LedgerResult<usize> {
        Ok(self.keys().await?.len())
    }
}
