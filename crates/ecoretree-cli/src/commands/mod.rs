pub mod diff;
pub mod render;
pub mod replay;

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

/// Read a JSON file
pub(crate) fn read_json(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", path.display()))
}

/// Write to a file, or to stdout when no path is given
pub(crate) fn emit(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("cannot write {}", path.display()))?;
            eprintln!("✓ Written to {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}
