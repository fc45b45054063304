//! Vigil CLI - tamper-evident audit ledger and encrypted document vault.
//!
//! Every document command runs as the actor named by `--user`, `--role` and
//! `--clearance`, and is recorded in the ledger.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use vigil_core::{Actor, DocumentId};
use vigil_runtime::{Runtime, config_bridge};

mod commands;
mod theme;

use commands::{access, doc, keys, ledger, threats};

/// Vigil - tamper-evident audit ledger and document vault
#[derive(Parser)]
#[command(name = "vigil")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a configuration file
    #[arg(short, long, global = true, env = "VIGIL_CONFIG")]
    config: Option<PathBuf>,

    /// Username recorded for this invocation
    #[arg(long, global = true, env = "VIGIL_USER", default_value = "operator")]
    user: String,

    /// Stable user id recorded alongside the username
    #[arg(long, global = true, env = "VIGIL_USER_ID")]
    user_id: Option<String>,

    /// Role recorded for this invocation
    #[arg(long, global = true, env = "VIGIL_ROLE", default_value = "ANALYST")]
    role: String,

    /// Clearance level of the acting user (0-5)
    #[arg(
        long,
        global = true,
        env = "VIGIL_CLEARANCE",
        default_value_t = 1,
        value_parser = clap::value_parser!(u8).range(0..=5)
    )]
    clearance: u8,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn actor(&self) -> Actor {
        let actor = Actor::new(&self.user, &self.role, self.clearance);
        match &self.user_id {
            Some(id) => actor.with_user_id(id),
            None => actor,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// View and verify the audit ledger
    Ledger {
        #[command(subcommand)]
        command: LedgerCommands,
    },

    /// Manage documents
    Doc {
        #[command(subcommand)]
        command: DocCommands,
    },

    /// Request access to documents
    Access {
        #[command(subcommand)]
        command: AccessCommands,
    },

    /// Summarize recent denials and integrity failures
    Threats,

    /// Manage encryption keys
    Keys {
        #[command(subcommand)]
        command: KeyCommands,
    },
}

#[derive(Subcommand)]
enum LedgerCommands {
    /// List the most recent entries
    List {
        /// Number of entries (clamped to the configured maximum)
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Verify the hash chain
    Verify,
}

#[derive(Subcommand)]
enum DocCommands {
    /// Encrypt and register a file
    Upload {
        /// File to upload
        path: PathBuf,
        /// Required clearance (1-5)
        #[arg(long)]
        clearance: Option<u8>,
        /// MIME type (inferred from the extension when omitted)
        #[arg(long)]
        mime: Option<String>,
    },
    /// Re-check a document's integrity
    Verify {
        /// Document ID
        id: DocumentId,
    },
    /// Show a document's record
    Show {
        /// Document ID
        id: DocumentId,
    },
    /// List documents
    List,
    /// Decrypt a document to a file
    Download {
        /// Document ID
        id: DocumentId,
        /// Output path
        #[arg(short, long)]
        out: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum AccessCommands {
    /// Request access to a document
    Request {
        /// Document ID
        id: DocumentId,
    },
}

#[derive(Subcommand)]
enum KeyCommands {
    /// Generate a new encryption key
    Generate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Key generation needs no configuration.
    if let Commands::Keys {
        command: KeyCommands::Generate,
    } = cli.command
    {
        keys::generate_key();
        return Ok(());
    }

    let resolved = vigil_config::Config::load(cli.config.as_deref())?;

    let mut log_config = config_bridge::to_log_config(&resolved.config)?;
    if cli.verbose {
        "debug".clone_into(&mut log_config.level);
    }
    if let Err(e) = vigil_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }
    tracing::debug!(
        files = ?resolved.loaded_files,
        env_applied = resolved.env_applied,
        "configuration loaded"
    );

    let runtime = Runtime::open(&resolved.config).await?;
    let actor = cli.actor();
    let outcome = run(&runtime, &actor, cli.command).await;
    runtime.close().await?;
    outcome
}

async fn run(runtime: &Runtime, actor: &Actor, command: Commands) -> Result<()> {
    match command {
        Commands::Ledger { command } => match command {
            LedgerCommands::List { limit } => ledger::list_entries(runtime, limit).await,
            LedgerCommands::Verify => ledger::verify_chain(runtime).await,
        },
        Commands::Doc { command } => match command {
            DocCommands::Upload {
                path,
                clearance,
                mime,
            } => doc::upload(runtime, actor, &path, clearance, mime).await,
            DocCommands::Verify { id } => doc::verify(runtime, actor, id).await,
            DocCommands::Show { id } => doc::show(runtime, id).await,
            DocCommands::List => doc::list(runtime).await,
            DocCommands::Download { id, out, force } => {
                doc::download(runtime, actor, id, &out, force).await
            },
        },
        Commands::Access { command } => match command {
            AccessCommands::Request { id } => access::request(runtime, actor, id).await,
        },
        Commands::Threats => threats::summary(runtime).await,
        Commands::Keys {
            command: KeyCommands::Generate,
        } => {
            keys::generate_key();
            Ok(())
        },
    }
}
