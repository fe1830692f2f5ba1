//! Bundled snapshot builder
//!
//! Produces the read-only `dictionary.db` shipped with the application from
//! a JSON list of `add` changes, the same document shape the sync client
//! consumes. Accepts either a bare array of changes or a full changeset.

use std::fs::{self, File};
use std::path::Path;

use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use serde::Deserialize;
use tracing::info;

use crate::repository::EntryRepository;
use crate::storage::bootstrap::StoreLocation;
use crate::sync::{Change, ChangeAction, Changeset};

#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotInput {
    List(Vec<Change>),
    Changeset(Changeset),
}

/// Parse snapshot input from JSON
pub fn parse_changes(json: &str) -> Result<Vec<Change>> {
    let input: SnapshotInput =
        serde_json::from_str(json).context("Expected a list of changes or a changeset document")?;
    Ok(match input {
        SnapshotInput::List(changes) => changes,
        SnapshotInput::Changeset(changeset) => changeset.entries,
    })
}

/// Read snapshot input from a JSON file
pub fn read_changes(path: &Path) -> Result<Vec<Change>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot input from {:?}", path))?;
    parse_changes(&json).with_context(|| format!("Failed to parse {:?}", path))
}

/// Write a new snapshot store at `output` and return the number of entries
///
/// Only `add` changes are accepted. The store is built under a temporary
/// name and moved into place when complete; an existing `output` is never
/// overwritten.
pub fn build_snapshot(changes: &[Change], output: &Path) -> Result<usize> {
    if let Some(change) = changes.iter().find(|c| c.action != ChangeAction::Add) {
        bail!(
            "Snapshot input may only contain add changes, found {:?}",
            change.action
        );
    }
    if output.exists() {
        bail!("Refusing to overwrite existing file {:?}", output);
    }
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }

    let temp_path = output.with_extension("db.tmp");
    if temp_path.exists() {
        fs::remove_file(&temp_path)
            .with_context(|| format!("Failed to remove stale temp file {:?}", temp_path))?;
    }

    let result = write_entries(changes, &temp_path);
    if let Err(e) = result {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    File::open(&temp_path)
        .and_then(|f| f.sync_all())
        .with_context(|| format!("Failed to sync {:?}", temp_path))?;
    fs::rename(&temp_path, output)
        .with_context(|| format!("Failed to rename {:?} to {:?}", temp_path, output))?;

    info!("Wrote {} entries to {:?}", changes.len(), output);
    Ok(changes.len())
}

fn write_entries(changes: &[Change], path: &Path) -> Result<()> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to create snapshot at {:?}", path))?;
    conn.execute_batch("PRAGMA synchronous = OFF;")?;

    let repo = EntryRepository::from_connection(conn, StoreLocation::Existing(path.to_path_buf()))?;
    for (index, change) in changes.iter().enumerate() {
        repo.insert(change)
            .with_context(|| format!("Failed to write change {}", index))?;
    }
    Ok(())
}
