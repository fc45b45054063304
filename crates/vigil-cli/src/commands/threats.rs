//! Threats command - rule-based risk summary of recent activity.

use colored::Colorize;
use vigil_runtime::{RiskLevel, Runtime};

use crate::theme::Theme;

/// Print the threat summary for the trailing window.
pub(crate) async fn summary(runtime: &Runtime) -> anyhow::Result<()> {
    let summary = runtime.threat_summary().await?;
    let metrics = &summary.metrics;

    println!("\n{}", Theme::header("Threat Summary"));
    println!("{}", Theme::separator());
    println!(
        "{}",
        Theme::kv(
            "Risk",
            &format!("{} (score {})", risk_label(summary.risk.level), summary.risk.score)
        )
    );
    println!("{}", Theme::kv("Since", &Theme::timestamp(&summary.since)));
    println!("{}", Theme::kv("Access requests", &metrics.access_requests.to_string()));
    println!("{}", Theme::kv("Denied", &metrics.denied_access.to_string()));
    println!("{}", Theme::kv("Verify failures", &metrics.verify_failures.to_string()));
    println!(
        "{}",
        Theme::kv("Compromised", &metrics.compromised_documents.to_string())
    );
    println!("\n  {}\n", summary.summary);

    Ok(())
}

fn risk_label(level: RiskLevel) -> String {
    let text = level.to_string();
    match level {
        RiskLevel::Low => text.green().to_string(),
        RiskLevel::Medium => text.yellow().bold().to_string(),
        RiskLevel::High => text.red().bold().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_label_keeps_text() {
        colored::control::set_override(false);
        assert_eq!(risk_label(RiskLevel::High), "High");
        assert_eq!(risk_label(RiskLevel::Low), "Low");
    }
}
