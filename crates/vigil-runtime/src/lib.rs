//! Vigil Runtime - audited document operations over the ledger and vault.
//!
//! The runtime ties the pieces together:
//! - [`Runtime`] validates uploads, checks clearance and records every
//!   document operation in the hash-chained ledger
//! - [`threats`] scores recent denials and integrity failures
//! - [`config_bridge`] converts a loaded `vigil_config::Config` into typed
//!   settings, the encryption key and a log configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use vigil_core::Actor;
//! use vigil_runtime::{Runtime, UploadRequest};
//!
//! # async fn example() -> Result<(), vigil_runtime::RuntimeError> {
//! let resolved = vigil_config::Config::load(None)?;
//! let runtime = Runtime::open(&resolved.config).await?;
//!
//! let actor = Actor::new("alice", "ANALYST", 3);
//! let doc = runtime
//!     .upload(&actor, b"%PDF-1.7", UploadRequest::new("brief.pdf", "application/pdf"))
//!     .await?;
//! let report = runtime.verify_document(&actor, doc.id).await?;
//! assert!(report.is_verified());
//!
//! runtime.close().await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config_bridge;
pub mod prelude;
pub mod threats;

mod error;
mod runtime;
mod types;

pub use config_bridge::RuntimeSettings;
pub use error::{RuntimeError, RuntimeResult};
pub use runtime::Runtime;
pub use threats::{RiskLevel, ThreatMetrics, ThreatSummary};
pub use types::{AccessDecision, Download, UploadRequest};
