//! Rule-based threat summary over recent ledger activity.
//!
//! Counts are taken over a trailing window (24 hours by default) except
//! `compromised_documents`, which is the current document table.

use std::fmt;

use vigil_core::Timestamp;
use vigil_ledger::{LedgerAction, LedgerBlock, LedgerStatus};
use vigil_vault::{Document, DocumentStatus};

/// Denied requests in the window that add to the score.
pub const DENIED_ELEVATED: usize = 5;
/// Denied requests in the window that add to the score again.
pub const DENIED_SEVERE: usize = 20;

const DENIED_POINTS: u32 = 2;
const COMPROMISED_POINTS: u32 = 5;
const VERIFY_FAILURE_POINTS: u32 = 3;
const MEDIUM_AT: u32 = 3;
const HIGH_AT: u32 = 6;

/// Activity counts feeding the risk score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThreatMetrics {
    /// `ACCESS_REQUEST / DENIED` blocks in the window.
    pub denied_access: usize,
    /// `ACCESS_REQUEST` blocks in the window.
    pub access_requests: usize,
    /// `VERIFY / COMPROMISED` blocks in the window.
    pub verify_failures: usize,
    /// Documents currently marked `COMPROMISED`.
    pub compromised_documents: usize,
}

impl ThreatMetrics {
    /// Count blocks stamped at or after `since` and compromised documents.
    #[must_use]
    pub fn collect(blocks: &[LedgerBlock], documents: &[Document], since: Timestamp) -> Self {
        let mut metrics = Self::default();
        for block in blocks.iter().filter(|b| b.timestamp >= since) {
            match (&block.action, &block.status) {
                (LedgerAction::AccessRequest, status) => {
                    metrics.access_requests = metrics.access_requests.saturating_add(1);
                    if *status == LedgerStatus::Denied {
                        metrics.denied_access = metrics.denied_access.saturating_add(1);
                    }
                },
                (LedgerAction::Verify, LedgerStatus::Compromised) => {
                    metrics.verify_failures = metrics.verify_failures.saturating_add(1);
                },
                _ => {},
            }
        }
        metrics.compromised_documents = documents
            .iter()
            .filter(|d| d.status == DocumentStatus::Compromised)
            .count();
        metrics
    }

    /// Score the metrics.
    #[must_use]
    pub fn risk(&self) -> RiskAssessment {
        let mut score: u32 = 0;
        if self.denied_access >= DENIED_ELEVATED {
            score = score.saturating_add(DENIED_POINTS);
        }
        if self.denied_access >= DENIED_SEVERE {
            score = score.saturating_add(DENIED_POINTS);
        }
        if self.compromised_documents > 0 {
            score = score.saturating_add(COMPROMISED_POINTS);
        }
        if self.verify_failures > 0 {
            score = score.saturating_add(VERIFY_FAILURE_POINTS);
        }

        let level = if score >= HIGH_AT {
            RiskLevel::High
        } else if score >= MEDIUM_AT {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };
        RiskAssessment { level, score }
    }

    /// One-line plain summary.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if self.compromised_documents > 0 {
            parts.push("Compromised documents detected.".to_owned());
        }
        if self.denied_access > 0 {
            parts.push(format!(
                "Denied access attempts in the window: {}.",
                self.denied_access
            ));
        }
        if parts.is_empty() {
            parts.push("No unusual access patterns in the window.".to_owned());
        }
        parts.join(" ")
    }
}

/// Coarse risk bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    /// Score below 3.
    Low,
    /// Score 3 to 5.
    Medium,
    /// Score 6 or more.
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        })
    }
}

/// Score and bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskAssessment {
    /// Bucket.
    pub level: RiskLevel,
    /// Additive score.
    pub score: u32,
}

/// Result of [`Runtime::threat_summary`](crate::Runtime::threat_summary).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreatSummary {
    /// Start of the counting window.
    pub since: Timestamp,
    /// Counts.
    pub metrics: ThreatMetrics,
    /// Score.
    pub risk: RiskAssessment,
    /// Plain summary.
    pub summary: String,
}

impl ThreatSummary {
    /// Score `metrics` and describe them.
    #[must_use]
    pub fn from_metrics(metrics: ThreatMetrics, since: Timestamp) -> Self {
        Self {
            since,
            risk: metrics.risk(),
            summary: metrics.describe(),
            metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use vigil_core::Actor;
    use vigil_ledger::{ApprovalId, GENESIS_HASH, LedgerRecord};

    fn at(hour: u32) -> Timestamp {
        Timestamp::from_datetime(chrono::Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap())
    }

    fn block(hour: u32, action: &str, status: &str) -> LedgerBlock {
        LedgerBlock::seal(
            1,
            at(hour),
            &LedgerRecord::new(Actor::new("alice", "ANALYST", 2), action, status),
            ApprovalId::new("APR-1000"),
            GENESIS_HASH.to_owned(),
        )
    }

    fn denied(n: usize) -> ThreatMetrics {
        ThreatMetrics {
            denied_access: n,
            ..Default::default()
        }
    }

    #[test]
    fn test_collect_counts_window_only() {
        let blocks = vec![
            block(1, "ACCESS_REQUEST", "DENIED"),
            block(10, "ACCESS_REQUEST", "DENIED"),
            block(11, "ACCESS_REQUEST", "GRANTED"),
            block(12, "VERIFY", "COMPROMISED"),
            block(12, "VERIFY", "VERIFIED"),
            block(13, "DOWNLOAD", "DENIED"),
        ];
        let metrics = ThreatMetrics::collect(&blocks, &[], at(9));
        assert_eq!(
            metrics,
            ThreatMetrics {
                denied_access: 1,
                access_requests: 2,
                verify_failures: 1,
                compromised_documents: 0,
            }
        );
    }

    #[test]
    fn test_denied_thresholds() {
        assert_eq!(denied(4).risk().score, 0);
        assert_eq!(denied(5).risk().score, 2);
        assert_eq!(denied(19).risk().score, 2);
        assert_eq!(denied(20).risk().score, 4);
        assert_eq!(denied(20).risk().level, RiskLevel::Medium);
        assert_eq!(denied(0).risk().level, RiskLevel::Low);
    }

    #[test]
    fn test_compromise_and_verify_failure_points() {
        let compromised = ThreatMetrics {
            compromised_documents: 1,
            ..Default::default()
        };
        assert_eq!(
            compromised.risk(),
            RiskAssessment {
                level: RiskLevel::Medium,
                score: 5
            }
        );

        let failing = ThreatMetrics {
            verify_failures: 2,
            ..Default::default()
        };
        assert_eq!(failing.risk().score, 3);
        assert_eq!(failing.risk().level, RiskLevel::Medium);

        let both = ThreatMetrics {
            compromised_documents: 1,
            verify_failures: 1,
            ..Default::default()
        };
        assert_eq!(both.risk().score, 8);
        assert_eq!(both.risk().level, RiskLevel::High);
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            ThreatMetrics::default().describe(),
            "No unusual access patterns in the window."
        );
        let busy = ThreatMetrics {
            denied_access: 3,
            compromised_documents: 1,
            ..Default::default()
        };
        assert_eq!(
            busy.describe(),
            "Compromised documents detected. Denied access attempts in the window: 3."
        );
    }
}
