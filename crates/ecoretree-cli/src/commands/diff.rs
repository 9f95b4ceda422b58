//! Diff command
//!
//! Usage: ecoretree diff --current <FILE> --baseline <FILE> [--owner-base <URI>]
//!
//! Prints the change set between two element payloads and the Set command a
//! form edit would send for it (`null` when nothing is sendable).

use anyhow::{Context, Result};
use clap::Args;
use ecoretree_core::codec::build_set_command;
use ecoretree_core::diff;
use ecoretree_core::model::payload::as_payload;
use serde_json::json;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Edited payload (JSON object)
    #[arg(long)]
    pub current: PathBuf,

    /// Last acknowledged payload (JSON object)
    #[arg(long)]
    pub baseline: PathBuf,

    /// Document locator used in the owner reference
    #[arg(long, default_value = "file:/workspace/model.ecore")]
    pub owner_base: String,
}

pub fn execute(args: DiffArgs) -> Result<()> {
    let current = super::read_json(&args.current)?;
    let baseline = super::read_json(&args.baseline)?;
    let current = as_payload(&current)
        .with_context(|| format!("{} does not hold a JSON object", args.current.display()))?;
    let baseline = as_payload(&baseline)
        .with_context(|| format!("{} does not hold a JSON object", args.baseline.display()))?;

    let changes = diff(current, baseline);
    let command = build_set_command(&args.owner_base, current, &changes);
    let report = json!({
        "changes": changes,
        "command": command.map(|c| c.to_wire()),
    });
    super::emit(None, &serde_json::to_string_pretty(&report)?)
}
