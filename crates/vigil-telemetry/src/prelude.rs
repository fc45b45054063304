//! Commonly used telemetry types.
//!
//! Use `use vigil_telemetry::prelude::*;` to import them.

pub use crate::{TelemetryError, TelemetryResult};

pub use crate::{LogConfig, LogFormat, LogTarget};

pub use crate::{setup_default_logging, setup_logging};
