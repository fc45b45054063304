//! CLI theme and styling.

use colored::Colorize;
use vigil_core::Timestamp;

/// CLI theme configuration.
pub(crate) struct Theme;

impl Theme {
    /// Format a header.
    pub(crate) fn header(text: &str) -> String {
        format!("{}", text.bold().cyan())
    }

    /// Format a success message.
    pub(crate) fn success(text: &str) -> String {
        format!("{} {}", "✓".green(), text)
    }

    /// Format an error message.
    pub(crate) fn error(text: &str) -> String {
        format!("{} {}", "✗".red(), text.red())
    }

    /// Format a warning message.
    pub(crate) fn warning(text: &str) -> String {
        format!("{} {}", "!".yellow(), text.yellow())
    }

    /// Format an info message.
    pub(crate) fn info(text: &str) -> String {
        format!("{} {}", "i".blue(), text)
    }

    /// Format a separator line.
    pub(crate) fn separator() -> String {
        "━".repeat(50).dimmed().to_string()
    }

    /// Format a key-value pair.
    pub(crate) fn kv(key: &str, value: &str) -> String {
        let label = format!("{:<16}", format!("{key}:"));
        format!("  {} {}", label.bold(), value)
    }

    /// Color a ledger or document status by outcome.
    pub(crate) fn status(status: &str) -> String {
        match status {
            "VERIFIED" | "GRANTED" | "REGISTERED" | "SUCCESS" => status.green().to_string(),
            "COMPROMISED" | "DENIED" | "FAILURE" => status.red().bold().to_string(),
            other => other.yellow().to_string(),
        }
    }

    /// First eight characters of an id.
    pub(crate) fn short_id(id: &str) -> String {
        let short = id.get(..8).unwrap_or(id);
        format!("{}", short.cyan())
    }

    /// Format a timestamp.
    pub(crate) fn timestamp(ts: &Timestamp) -> String {
        ts.0.format("%Y-%m-%d %H:%M:%S").to_string().dimmed().to_string()
    }
}
