//! Sync command handlers

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use recnik_core::config::DEFAULT_SYNC_URL;
use recnik_core::{Config, EntryRepository, SyncClient, SyncError, SyncOutcome, SyncState};

use crate::output::{Output, OutputFormat};

/// Check for dictionary updates in the foreground and report the result
pub async fn sync(config: &Config, repo: &EntryRepository, output: &Output) -> Result<()> {
    if !config.sync_enabled {
        bail!(
            "Sync is not enabled. Enable it with:\n  \
             recnik config set sync_enabled true"
        );
    }

    let Some(client) = SyncClient::from_config(config)? else {
        bail!(
            "Sync URL not configured. Set it with:\n  \
             recnik config set sync_url {}",
            DEFAULT_SYNC_URL
        );
    };

    let mut state = SyncState::with_path(config.sync_state_path())?;

    output.message(&format!("Checking {} for updates...", client.url()));

    let outcome = match client.try_update(repo, &mut state).await {
        Ok(outcome) => outcome,
        Err(SyncError::Store(e)) => match e.recovery_suggestion() {
            Some(hint) => bail!("Sync failed: {}\n{}", e, hint),
            None => bail!("Sync failed: {}", e),
        },
        Err(e) => return Err(e).context("Sync failed"),
    };

    match output.format {
        OutputFormat::Json => {
            let (status, applied, skipped) = match outcome {
                SyncOutcome::UpToDate { .. } => ("up_to_date", 0, 0),
                SyncOutcome::Applied {
                    applied, skipped, ..
                } => ("updated", applied, skipped),
            };
            println!(
                "{}",
                serde_json::json!({
                    "status": status,
                    "version": outcome.version(),
                    "applied": applied,
                    "skipped": skipped
                })
            );
        }
        _ => match outcome {
            SyncOutcome::UpToDate { version } => {
                output.success(&format!("Already up to date (version {})", version));
            }
            SyncOutcome::Applied {
                version,
                applied,
                skipped,
            } => {
                output.success(&format!(
                    "Updated to version {}: {} change(s) applied",
                    version, applied
                ));
                if skipped > 0 {
                    output.message(&format!("  {} change(s) skipped", skipped));
                }
            }
        },
    }

    Ok(())
}

/// Start an update check in the background, if sync is enabled
///
/// Problems creating the client or reading the sync state only disable
/// this run's check.
pub fn spawn_background(config: &Config, repo: Arc<EntryRepository>) -> Option<JoinHandle<usize>> {
    let client = match SyncClient::from_config(config) {
        Ok(Some(client)) => client,
        Ok(None) => return None,
        Err(e) => {
            warn!("Background sync disabled: {}", e);
            return None;
        }
    };

    let mut state = match SyncState::with_path(config.sync_state_path()) {
        Ok(state) => state,
        Err(e) => {
            warn!("Background sync disabled: {:#}", e);
            return None;
        }
    };

    debug!("Starting background update check against {}", client.url());
    Some(tokio::spawn(async move {
        client.check_for_updates(&repo, &mut state).await
    }))
}

/// Wait for a background update check, bounded by the sync timeout
pub async fn finish_background(handle: JoinHandle<usize>, config: &Config, output: &Output) {
    // The request itself is bounded by the client timeout; allow a little
    // extra for applying the changes.
    let limit = Duration::from_secs(config.sync_timeout_secs.saturating_add(5));

    match tokio::time::timeout(limit, handle).await {
        Ok(Ok(0)) => {}
        Ok(Ok(applied)) => {
            output.warn(&format!(
                "Dictionary updated in the background ({} change(s)); results above may predate it",
                applied
            ));
        }
        Ok(Err(e)) => warn!("Background sync task failed: {}", e),
        Err(_) => warn!("Background sync did not finish within {:?}", limit),
    }
}
