//! Vigil Telemetry - logging setup for the Vigil ledger and vault.
//!
//! Every Vigil crate logs through `tracing`. This crate installs the global
//! subscriber: an `EnvFilter` built from a base level plus directives, and a
//! `fmt` layer in pretty, compact or JSON form writing to stderr, stdout or
//! daily-rotated files.
//!
//! # Example
//!
//! ```rust,no_run
//! use vigil_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), vigil_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Json)
//!     .with_directive("vigil_ledger=debug");
//!
//! setup_logging(&config)?;
//! tracing::info!(sequence = 1, "block appended");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging};
