//! Render command
//!
//! Usage: ecoretree render --snapshot <FILE> [--json] [--output <FILE>]

use anyhow::{bail, Result};
use clap::Args;
use ecoretree_core::builder::build;
use ecoretree_core::{EcoreLabelResolver, TreeNode};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Snapshot JSON file
    #[arg(long)]
    pub snapshot: PathBuf,

    /// Print the reassembled raw document instead of the outline
    #[arg(long)]
    pub json: bool,

    /// Output file path (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn execute(args: RenderArgs) -> Result<()> {
    let snapshot = super::read_json(&args.snapshot)?;
    if !snapshot.is_object() {
        bail!("{} does not hold a JSON object", args.snapshot.display());
    }
    let root = build(&snapshot, &EcoreLabelResolver);

    let text = if args.json {
        serde_json::to_string_pretty(&root.to_raw())?
    } else {
        outline(&root)
    };
    super::emit(args.output.as_deref(), &text)
}

/// Indented outline, one node per line
pub fn outline(root: &TreeNode) -> String {
    let mut lines = Vec::new();
    write_node(root, 0, &mut lines);
    lines.join("\n")
}

fn write_node(node: &TreeNode, depth: usize, lines: &mut Vec<String>) {
    lines.push(format!(
        "{}{} ({})",
        "  ".repeat(depth),
        node.name,
        node.kind.name()
    ));
    for child in &node.children {
        write_node(child, depth + 1, lines);
    }
}
