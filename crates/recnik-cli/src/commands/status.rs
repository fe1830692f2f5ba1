//! Status command handler

use anyhow::Result;

use recnik_core::{Config, EntryRepository, SyncState};

use crate::output::{Output, OutputFormat};

/// Show status information
pub fn show(config: &Config, repo: &EntryRepository, output: &Output) -> Result<()> {
    let location = repo.location();
    let count = repo.count().ready();
    let sync_version = SyncState::with_path(config.sync_state_path())
        .map(|state| state.version())
        .ok();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "ready": repo.is_ready(),
                    "location": location.label(),
                    "path": location.path(),
                    "degraded": location.is_degraded(),
                    "diagnostic": repo.diagnostic(),
                    "last_error": repo.last_error(),
                    "entries": count,
                    "sync": {
                        "enabled": config.sync_enabled,
                        "url": config.sync_url,
                        "version": sync_version,
                        "state_file": config.sync_state_path()
                    }
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", if repo.is_ready() { "ready" } else { "unavailable" });
        }
        OutputFormat::Human => {
            println!("Recnik Status");
            println!("=============");
            println!();
            println!("Store:");
            println!("  Status:   {}", if repo.is_ready() { "ready" } else { "unavailable" });
            println!("  Source:   {}", location.label());
            if let Some(path) = location.path() {
                println!("  Location: {}", path.display());
            }
            if let Some(count) = count {
                println!("  Entries:  {}", count);
            }
            if let Some(diagnostic) = repo.diagnostic() {
                println!("  Notes:    {}", diagnostic);
            }
            if let Some(error) = repo.last_error().filter(|_| repo.is_ready()) {
                println!("  Error:    {}", error);
            }
            println!();
            println!("Sync:");
            println!(
                "  Status:  {}",
                if config.sync_enabled {
                    "enabled"
                } else {
                    "disabled"
                }
            );
            if let Some(ref url) = config.sync_url {
                println!("  Server:  {}", url);
            }
            match sync_version {
                Some(version) => println!("  Version: {}", version),
                None => println!("  Version: (unreadable sync state)"),
            }
        }
    }

    Ok(())
}
