//! Access command - request access to a document.

use vigil_core::{Actor, DocumentId};
use vigil_runtime::Runtime;

use crate::theme::Theme;

/// Request access and print the recorded decision.
pub(crate) async fn request(runtime: &Runtime, actor: &Actor, id: DocumentId) -> anyhow::Result<()> {
    let decision = runtime.request_access(actor, id).await?;

    if decision.granted {
        println!("{}", Theme::success("Access granted"));
    } else {
        println!("{}", Theme::error("Access denied: insufficient clearance"));
    }
    println!("{}", Theme::kv("Approval ID", decision.approval_id.as_str()));
    println!(
        "{}",
        Theme::kv("Clearance", &format!(
            "{} (required {})",
            decision.actor_clearance, decision.required_clearance
        ))
    );
    println!("{}", Theme::kv("Ledger entry", &decision.sequence.to_string()));

    Ok(())
}
