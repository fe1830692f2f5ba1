//! Sync client implementation
//!
//! One-shot HTTP client that fetches the published changeset and applies it
//! to the local store when it is newer than the last applied version.

use std::time::Duration;

use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::message::{ChangeAction, Changeset};
use super::state::SyncState;
use crate::config::Config;
use crate::repository::EntryRepository;
use crate::storage::error::StoreError;

/// Errors that can occur while checking for updates
///
/// `check_for_updates` reduces every one of these to "nothing applied".
#[derive(Error, Debug)]
pub enum SyncError {
    /// Connection, timeout, or body read failure
    #[error("Failed to fetch changeset: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with something other than 200
    #[error("Changeset server returned {0}")]
    Status(StatusCode),

    /// The body is not a valid changeset document
    #[error("Malformed changeset: {0}")]
    Parse(#[from] serde_json::Error),

    /// A store failure aborted the changeset
    #[error("Failed to apply changeset: {0}")]
    Store(#[from] StoreError),

    /// The new version could not be persisted
    #[error("Failed to record sync version: {0}")]
    State(String),

    /// No store is open
    #[error("Dictionary store is not available")]
    NotReady,
}

/// Result of one update check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The remote version was not newer than the applied one
    UpToDate { version: i64 },
    /// A changeset was applied and its version recorded
    Applied {
        version: i64,
        applied: usize,
        skipped: usize,
    },
}

impl SyncOutcome {
    /// Number of changes written to the store
    pub fn applied(&self) -> usize {
        match self {
            SyncOutcome::UpToDate { .. } => 0,
            SyncOutcome::Applied { applied, .. } => *applied,
        }
    }

    /// Version recorded after this check
    pub fn version(&self) -> i64 {
        match self {
            SyncOutcome::UpToDate { version } | SyncOutcome::Applied { version, .. } => *version,
        }
    }
}

/// Client for the published changeset document
pub struct SyncClient {
    client: reqwest::Client,
    url: String,
}

impl SyncClient {
    /// Create a new sync client with a request timeout
    pub fn new(url: &str, timeout: Duration) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    /// Create a client when sync is enabled and a URL is configured
    pub fn from_config(config: &Config) -> Result<Option<Self>, SyncError> {
        match config.active_sync_url() {
            Some(url) => Self::new(url, Duration::from_secs(config.sync_timeout_secs)).map(Some),
            None => Ok(None),
        }
    }

    /// Changeset URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and parse the changeset, bypassing any cache
    pub async fn fetch_changeset(&self) -> Result<Changeset, SyncError> {
        debug!("Fetching changeset from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(SyncError::Status(status));
        }

        let body = response.bytes().await?;
        Ok(Changeset::from_slice(&body)?)
    }

    /// Fetch the changeset and apply it if it is newer
    pub async fn try_update(
        &self,
        repo: &EntryRepository,
        state: &mut SyncState,
    ) -> Result<SyncOutcome, SyncError> {
        if !repo.is_ready() {
            return Err(SyncError::NotReady);
        }

        let changeset = self.fetch_changeset().await?;
        apply_changeset(repo, state, &changeset)
    }

    /// Check for updates and return the number of changes applied
    ///
    /// Never fails: network, parse, and store errors are logged and count
    /// as "no update".
    pub async fn check_for_updates(&self, repo: &EntryRepository, state: &mut SyncState) -> usize {
        match self.try_update(repo, state).await {
            Ok(SyncOutcome::UpToDate { version }) => {
                debug!("Dictionary is up to date at version {}", version);
                0
            }
            Ok(SyncOutcome::Applied {
                version,
                applied,
                skipped,
            }) => {
                info!(
                    "Applied {} change(s) from version {} ({} skipped)",
                    applied, version, skipped
                );
                applied
            }
            Err(e) => {
                warn!("Update check failed: {}", e);
                0
            }
        }
    }
}

/// Apply a parsed changeset to the store
///
/// Changes are applied in order, each as its own unit. Updates and deletes
/// without an id, and updates of missing entries, are skipped. Any other
/// store failure stops the run and leaves the recorded version unchanged.
pub fn apply_changeset(
    repo: &EntryRepository,
    state: &mut SyncState,
    changeset: &Changeset,
) -> Result<SyncOutcome, SyncError> {
    if changeset.version <= state.version() {
        return Ok(SyncOutcome::UpToDate {
            version: state.version(),
        });
    }

    let mut applied = 0;
    let mut skipped = 0;

    for (index, change) in changeset.entries.iter().enumerate() {
        match (change.action, change.id) {
            (ChangeAction::Add, _) => {
                let id = repo.insert(change)?;
                debug!("Change {}: added entry {}", index, id);
            }
            (ChangeAction::Update, Some(id)) => match repo.update(id, change) {
                Ok(()) => {}
                Err(StoreError::NotFound { id }) => {
                    warn!("Change {}: entry {} does not exist, skipping update", index, id);
                    skipped += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            },
            (ChangeAction::Delete, Some(id)) => repo.delete(id)?,
            (action, None) => {
                warn!("Change {}: {:?} without an id, skipping", index, action);
                skipped += 1;
                continue;
            }
        }
        applied += 1;
    }

    state
        .set_version(changeset.version)
        .map_err(|e| SyncError::State(format!("{:#}", e)))?;

    Ok(SyncOutcome::Applied {
        version: changeset.version,
        applied,
        skipped,
    })
}
