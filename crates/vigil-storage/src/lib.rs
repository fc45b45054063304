//! Vigil Storage - namespaced key-value persistence.
//!
//! The [`KvStore`] trait provides byte-level `get`/`set`/`insert_new`
//! operations with namespaced keys. Two backends:
//!
//! - [`MemoryKvStore`] (always available): tests and ephemeral runs
//! - `SurrealKvStore` (behind the **`kv`** feature): embedded, ACID,
//!   LSM-tree storage on local disk
//!
//! [`ScopedKvStore`] pre-binds a namespace and adds typed JSON helpers. The
//! ledger uses the `ledger:blocks` namespace and the vault uses
//! `vault:documents`.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod error;
pub mod kv;

pub use error::{StorageError, StorageResult};
pub use kv::{KvStore, MemoryKvStore, ScopedKvStore};

#[cfg(feature = "kv")]
pub use kv::SurrealKvStore;
