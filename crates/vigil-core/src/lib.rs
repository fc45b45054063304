//! Vigil Core - Foundation types for the Vigil ledger and document vault.
//!
//! This crate provides:
//! - Document identifiers
//! - Millisecond-precision UTC timestamps with a canonical rendering
//! - Clearance levels and the actor snapshot recorded with every decision

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod error;
pub mod types;

pub use error::{CoreError, CoreResult};
pub use types::{Actor, Clearance, DocumentId, Timestamp};
