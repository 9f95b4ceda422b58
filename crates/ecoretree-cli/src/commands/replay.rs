//! Replay command
//!
//! Usage: ecoretree replay --snapshot <FILE> --messages <FILE> [--select <A/B>]
//!
//! Loads the snapshot into an in-memory model server, opens an editor on it
//! and feeds each line of the messages file (one push message per line) to
//! the coordinator. A resync request reloads the initial snapshot.

use anyhow::{bail, Context, Result};
use clap::Args;
use ecoretree_core::logging_facility;
use ecoretree_core::mirror::{PushMessage, PushOutcome};
use ecoretree_core::EcoreLabelResolver;
use ecoretree_engine::memory::{InMemoryModelServer, RecordingHost};
use ecoretree_engine::{SyncConfig, SyncCoordinator};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Snapshot JSON file
    #[arg(long)]
    pub snapshot: PathBuf,

    /// Push messages, one JSON object per line
    #[arg(long)]
    pub messages: PathBuf,

    /// Display-name chain of the node to select first, separated by '/'
    #[arg(long)]
    pub select: Option<String>,

    /// Editor configuration (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the final outline instead of the final document
    #[arg(long)]
    pub outline: bool,

    /// Output file path (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn execute(args: ReplayArgs) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("cannot start runtime")?;
    runtime.block_on(replay(args))
}

fn config_for(args: &ReplayArgs) -> Result<SyncConfig> {
    match &args.config {
        Some(path) => {
            let config = SyncConfig::load(path)?;
            logging_facility::init(config.logging.profile);
            Ok(config)
        }
        None => {
            let document_id = file_name(&args.snapshot)?;
            Ok(SyncConfig::new("file:///workspace", document_id))
        }
    }
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .with_context(|| format!("{} has no file name", path.display()))
}

async fn replay(args: ReplayArgs) -> Result<()> {
    let config = config_for(&args)?;
    let snapshot = super::read_json(&args.snapshot)?;
    let messages = std::fs::read_to_string(&args.messages)
        .with_context(|| format!("cannot read {}", args.messages.display()))?;

    let server = InMemoryModelServer::new();
    server.put_document(&config.document_id, snapshot).await;
    let host = RecordingHost::new();
    let mut coordinator = SyncCoordinator::new(
        &config,
        server.clone(),
        host,
        Arc::new(EcoreLabelResolver),
    );
    coordinator.open().await?;
    if let Some(error) = coordinator.mirror().error() {
        bail!("{}", error);
    }

    if let Some(select) = &args.select {
        let path: Vec<String> = select.split('/').map(str::to_string).collect();
        let id = coordinator
            .mirror()
            .root()
            .and_then(|root| root.find_by_names(&path))
            .map(|node| node.id)
            .with_context(|| format!("no node at '{}'", select))?;
        coordinator.select(&id);
    }

    for (number, line) in messages.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let message: PushMessage = serde_json::from_str(line)
            .with_context(|| format!("line {} is not a push message", number + 1))?;
        let outcome = coordinator.handle_push(message).await;
        eprintln!("{}: {}", number + 1, describe(&outcome));
    }

    let selected = coordinator.mirror().selected_path();
    if !selected.is_empty() {
        eprintln!("selected: {}", selected.join("/"));
    }

    let text = match (coordinator.mirror().root(), coordinator.mirror().document()) {
        (Some(root), _) if args.outline => super::render::outline(root),
        (_, Some(document)) => serde_json::to_string_pretty(document)?,
        _ => bail!("no document loaded"),
    };
    coordinator.dispose().await;
    super::emit(args.output.as_deref(), &text)
}

fn describe(outcome: &PushOutcome) -> String {
    match outcome {
        PushOutcome::Rebuilt {
            selection_restored, ..
        } => format!("rebuilt (selection restored: {})", selection_restored),
        PushOutcome::Patched {
            refresh_detail: true,
            ..
        } => "patched, detail refreshed".to_string(),
        PushOutcome::Patched { .. } => "patched".to_string(),
        PushOutcome::ResyncRequired => "resync".to_string(),
        PushOutcome::Dropped(e) => format!("dropped: {}", e),
        PushOutcome::DirtyChanged(dirty) => format!("dirty: {}", dirty),
    }
}
