//! Vigil Ledger - Hash-chained, append-only audit ledger.
//!
//! This crate provides:
//! - Ledger blocks linked by SHA-256 over a canonical text encoding
//! - A serialized append engine with a bounded, fair lock
//! - Write-once persistence keyed by sequence number (`SurrealKV` or in-memory)
//! - Full-chain verification that reports every break
//!
//! # Security Model
//!
//! Every block records who acted, what was done and how it turned out, and
//! carries the hash of the block before it. Editing, reordering or deleting
//! any stored block breaks the chain at that position.
//!
//! # Example
//!
//! ```
//! use vigil_core::Actor;
//! use vigil_ledger::{Ledger, LedgerRecord};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let ledger = Ledger::in_memory();
//!
//! let block = ledger
//!     .append(LedgerRecord::new(Actor::system(), "VERIFY", "VERIFIED"))
//!     .await
//!     .unwrap();
//! assert_eq!(block.sequence, 1);
//!
//! let result = ledger.verify_chain().await.unwrap();
//! assert!(result.valid);
//! # });
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod block;
mod canonical;
mod error;
mod ledger;
mod storage;

pub use block::{
    ApprovalId, GENESIS_HASH, LedgerAction, LedgerBlock, LedgerRecord, LedgerStatus, Metadata,
    MetadataValue,
};
pub use canonical::{block_hash_input, canonical_json, canonical_metadata};
pub use error::{LedgerError, LedgerResult};
pub use ledger::{ChainIssue, ChainVerification, DEFAULT_APPEND_TIMEOUT, Ledger};
pub use storage::{KvLedgerStorage, LedgerStorage, NS_BLOCKS, StoredBlock, block_key};
