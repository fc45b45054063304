//! Doc command - upload, inspect, verify and download documents.

use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use vigil_core::{Actor, DocumentId};
use vigil_runtime::{Runtime, UploadRequest};
use vigil_vault::Document;

use crate::theme::Theme;

/// MIME type for a file extension, limited to the types Vigil accepts by default.
pub(crate) fn guess_mime_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some("application/pdf"),
        "doc" => Some("application/msword"),
        "docx" => Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        _ => None,
    }
}

/// Encrypt and register a file.
pub(crate) async fn upload(
    runtime: &Runtime,
    actor: &Actor,
    path: &Path,
    clearance: Option<u8>,
    mime: Option<String>,
) -> anyhow::Result<()> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("not a file path: {}", path.display()))?;
    let mime_type = match mime {
        Some(m) => m,
        None => guess_mime_type(path)
            .with_context(|| format!("cannot infer MIME type of {filename}; pass --mime"))?
            .to_owned(),
    };
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    let mut request = UploadRequest::new(filename, mime_type);
    request.required_clearance = clearance;
    let document = runtime.upload(actor, &bytes, request).await?;

    println!("{}", Theme::success("Document registered"));
    print_document(&document);
    Ok(())
}

/// Re-check a document's integrity.
pub(crate) async fn verify(runtime: &Runtime, actor: &Actor, id: DocumentId) -> anyhow::Result<()> {
    let report = runtime.verify_document(actor, id).await?;

    if report.is_verified() {
        println!(
            "{}",
            Theme::success(&format!("{} verified", report.document.filename))
        );
        println!("{}", Theme::kv("Fingerprint", &report.document.fingerprint.to_hex()));
        return Ok(());
    }

    let reason = report
        .failure
        .map_or_else(|| "unknown".to_owned(), |f| f.to_string());
    println!(
        "{}",
        Theme::error(&format!(
            "{} is COMPROMISED: {reason}",
            report.document.filename
        ))
    );
    println!("{}", Theme::kv("Registered", &report.document.fingerprint.to_hex()));
    if let Some(found) = report.recomputed_fingerprint {
        println!("{}", Theme::kv("Found", &found.to_hex()));
    }
    anyhow::bail!("document {id} failed verification")
}

/// Show one document's record.
pub(crate) async fn show(runtime: &Runtime, id: DocumentId) -> anyhow::Result<()> {
    let document = runtime.document(id).await?;
    println!("\n{}", Theme::header(&document.filename));
    print_document(&document);
    println!();
    Ok(())
}

/// List every document, newest first.
pub(crate) async fn list(runtime: &Runtime) -> anyhow::Result<()> {
    let documents = runtime.documents().await?;

    if documents.is_empty() {
        println!("{}", Theme::info("No documents"));
        return Ok(());
    }

    println!("\n{}", Theme::header("Documents"));
    println!(
        "{:<8} {:<12} {:>5} {:>10} {:>19} {}",
        "ID".dimmed(),
        "STATUS".dimmed(),
        "CLR".dimmed(),
        "SIZE".dimmed(),
        "CREATED".dimmed(),
        "FILENAME".dimmed()
    );
    println!("{}", Theme::separator());

    for doc in documents {
        println!(
            "{} {:<12} {:>5} {:>10} {} {}",
            Theme::short_id(&doc.id.to_string()),
            Theme::status(doc.status.as_str()),
            doc.required_clearance,
            doc.size_bytes,
            Theme::timestamp(&doc.created_at),
            doc.filename
        );
    }

    println!();
    Ok(())
}

/// Decrypt a document to `out`. Refuses to overwrite unless `force`.
pub(crate) async fn download(
    runtime: &Runtime,
    actor: &Actor,
    id: DocumentId,
    out: &Path,
    force: bool,
) -> anyhow::Result<()> {
    if !force && tokio::fs::try_exists(out).await.unwrap_or(false) {
        anyhow::bail!("{} already exists; pass --force to overwrite", out.display());
    }

    let download = runtime.download(actor, id).await?;
    tokio::fs::write(out, &download.bytes)
        .await
        .with_context(|| format!("failed to write {}", out.display()))?;

    println!(
        "{}",
        Theme::success(&format!(
            "Wrote {} ({} bytes) to {}",
            download.document.filename,
            download.bytes.len(),
            out.display()
        ))
    );
    Ok(())
}

fn print_document(document: &Document) {
    println!("{}", Theme::kv("ID", &document.id.to_string()));
    println!("{}", Theme::kv("Filename", &document.filename));
    println!("{}", Theme::kv("MIME type", &document.mime_type));
    println!("{}", Theme::kv("Size", &format!("{} bytes", document.size_bytes)));
    println!("{}", Theme::kv("Clearance", &document.required_clearance.to_string()));
    println!("{}", Theme::kv("Status", &Theme::status(document.status.as_str())));
    println!("{}", Theme::kv("Fingerprint", &document.fingerprint.to_hex()));
    println!("{}", Theme::kv("Created", &Theme::timestamp(&document.created_at)));
    let verified = document
        .last_verified
        .as_ref()
        .map_or_else(|| "never".to_owned(), Theme::timestamp);
    println!("{}", Theme::kv("Last verified", &verified));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_mime_type() {
        assert_eq!(guess_mime_type(Path::new("a/brief.PDF")), Some("application/pdf"));
        assert_eq!(guess_mime_type(Path::new("memo.doc")), Some("application/msword"));
        assert!(guess_mime_type(Path::new("memo.docx")).is_some_and(|m| m.ends_with(".document")));
        assert_eq!(guess_mime_type(Path::new("notes.txt")), None);
        assert_eq!(guess_mime_type(Path::new("README")), None);
    }
}
