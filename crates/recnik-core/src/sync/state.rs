//! Sync state persistence
//!
//! Remembers the version of the last changeset applied in full, so each
//! version is applied at most once. Stored in its own file next to the
//! store, so re-copying the store from the bundle does not reset it.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// On-disk shape of the sync state file
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredState {
    #[serde(default)]
    dictionary_update_version: i64,
}

/// Persistent sync state
#[derive(Debug, Default)]
pub struct SyncState {
    /// Version of the last fully applied changeset, 0 if none
    version: i64,
    /// Path to persist state
    path: Option<PathBuf>,
}

impl SyncState {
    /// Create a new sync state (in-memory only)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sync state that persists to disk
    ///
    /// A missing file means nothing has been applied yet.
    pub fn with_path(path: PathBuf) -> Result<Self> {
        let mut state = Self {
            version: 0,
            path: Some(path.clone()),
        };

        if path.exists() {
            state.load()?;
        }

        Ok(state)
    }

    /// Version of the last fully applied changeset
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Where the state is persisted, if anywhere
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Record a newly applied version and persist it
    ///
    /// The in-memory value only changes once the file is written.
    pub fn set_version(&mut self, version: i64) -> Result<()> {
        if let Some(ref path) = self.path {
            let stored = StoredState {
                dictionary_update_version: version,
            };
            let json = serde_json::to_string_pretty(&stored)?;
            atomic_write(path, json.as_bytes())
                .with_context(|| format!("Failed to save sync state to {:?}", path))?;
        }

        self.version = version;
        Ok(())
    }

    fn load(&mut self) -> Result<()> {
        let Some(ref path) = self.path else {
            return Ok(());
        };

        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read sync state from {:?}", path))?;
        let stored: StoredState = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse sync state from {:?}", path))?;

        self.version = stored.dictionary_update_version;
        Ok(())
    }
}

/// Write data to a file atomically
///
/// Writes to a temp file in the same directory, syncs, then renames over
/// the target.
fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }

    let temp_path = path.with_extension("tmp");

    let mut file = File::create(&temp_path)
        .with_context(|| format!("Failed to create temp file {:?}", temp_path))?;

    file.write_all(data)
        .with_context(|| format!("Failed to write to temp file {:?}", temp_path))?;

    file.sync_all()
        .with_context(|| format!("Failed to sync temp file {:?}", temp_path))?;

    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename {:?} to {:?}", temp_path, path))?;

    Ok(())
}
