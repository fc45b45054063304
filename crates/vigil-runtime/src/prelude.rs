//! Commonly used runtime types.
//!
//! Use `use vigil_runtime::prelude::*;` to import them.

// Errors
pub use crate::{RuntimeError, RuntimeResult};

// Runtime
pub use crate::{Runtime, RuntimeSettings};

// Requests and outcomes
pub use crate::{AccessDecision, Download, UploadRequest};

// Threat summary
pub use crate::{RiskLevel, ThreatMetrics, ThreatSummary};
