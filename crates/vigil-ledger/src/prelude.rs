//! Prelude module - commonly used types for convenient import.
//!
//! Use `use vigil_ledger::prelude::*;` to import all essential types.

// Errors
pub use crate::{LedgerError, LedgerResult};

// Blocks and records
pub use crate::{ApprovalId, LedgerAction, LedgerBlock, LedgerRecord, LedgerStatus, MetadataValue};

// Ledger and verification
pub use crate::{ChainIssue, ChainVerification, Ledger};

// Storage
pub use crate::{KvLedgerStorage, LedgerStorage};
