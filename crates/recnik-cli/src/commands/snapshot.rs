//! Snapshot command handler

use std::path::PathBuf;

use anyhow::{Context, Result};

use recnik_core::storage::snapshot::{build_snapshot, read_changes};

use crate::output::Output;

/// Build a bundled snapshot from a JSON list of add changes
pub fn build(input: PathBuf, target: PathBuf, output: &Output) -> Result<()> {
    let changes = read_changes(&input)?;
    let count = build_snapshot(&changes, &target)
        .with_context(|| format!("Failed to build snapshot at {:?}", target))?;

    output.success(&format!("Wrote {} entries to {}", count, target.display()));
    Ok(())
}
