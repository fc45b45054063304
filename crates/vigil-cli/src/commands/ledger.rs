//! Ledger command - list and verify the audit chain.

use colored::Colorize;
use vigil_runtime::Runtime;

use crate::theme::Theme;

/// List the most recent ledger entries.
pub(crate) async fn list_entries(runtime: &Runtime, limit: Option<usize>) -> anyhow::Result<()> {
    let blocks = runtime.ledger(limit).await?;

    if blocks.is_empty() {
        println!("{}", Theme::info("Ledger is empty"));
        return Ok(());
    }

    println!("\n{}", Theme::header("Ledger"));
    println!(
        "{:>6} {:>19} {:<14} {:<15} {:<12} {}",
        "SEQ".dimmed(),
        "TIMESTAMP".dimmed(),
        "ACTOR".dimmed(),
        "ACTION".dimmed(),
        "STATUS".dimmed(),
        "DOCUMENT".dimmed()
    );
    println!("{}", Theme::separator());

    for block in blocks {
        let document = block
            .document_id
            .map_or_else(|| "-".to_owned(), |id| Theme::short_id(&id.to_string()));
        println!(
            "{:>6} {} {:<14} {:<15} {:<12} {}",
            block.sequence,
            Theme::timestamp(&block.timestamp),
            block.actor.username,
            block.action.as_str(),
            Theme::status(block.status.as_str()),
            document
        );
    }

    println!();
    Ok(())
}

/// Verify the whole chain. Fails when any break is found.
pub(crate) async fn verify_chain(runtime: &Runtime) -> anyhow::Result<()> {
    let result = runtime.verify_ledger().await?;

    if result.valid {
        println!(
            "{}",
            Theme::success(&format!(
                "Ledger verified: {} blocks, no issues",
                result.length
            ))
        );
        return Ok(());
    }

    let first = result
        .broken_at_sequence
        .map_or_else(|| "?".to_owned(), |s| s.to_string());
    println!(
        "{}",
        Theme::error(&format!(
            "Ledger broken at sequence {first}: {} issues in {} blocks",
            result.issues.len(),
            result.length
        ))
    );
    for issue in &result.issues {
        println!("  - {issue}");
    }

    anyhow::bail!("ledger verification failed")
}
