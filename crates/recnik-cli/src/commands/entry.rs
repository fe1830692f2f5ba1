//! Entry command handlers

use anyhow::{bail, Result};

use recnik_core::{
    sort_by_word, word_of_the_day_or_placeholder, EntryRepository, Loaded, Script, StoreError,
};

use crate::output::Output;

/// List entries sorted by headword, optionally only those under a letter
pub fn list(
    repo: &EntryRepository,
    script: Script,
    letter: Option<String>,
    output: &Output,
) -> Result<()> {
    let loaded = match letter {
        Some(ref prefix) => repo.load_by_prefix(script, prefix),
        None => repo.load_all(),
    };

    let mut entries = fail_soft(repo, loaded, output);
    sort_by_word(&mut entries, script);

    output.print_entries(&entries, script);
    Ok(())
}

/// Show a single entry
pub fn show(repo: &EntryRepository, id: i64, output: &Output) -> Result<()> {
    let entry = require(repo, repo.load_by_id(id))?
        .ok_or_else(|| anyhow::anyhow!("Entry not found: {}", id))?;

    output.print_entry(&entry);
    Ok(())
}

/// Show the entry a `recnik://word/<id>` link points to
pub fn open(repo: &EntryRepository, link: String, output: &Output) -> Result<()> {
    if recnik_core::deeplink::parse_entry_link(&link).is_none() {
        bail!("Not an entry link: {}\nExpected recnik://word/<id>", link);
    }

    let entry = require(repo, repo.resolve_link(&link))?
        .ok_or_else(|| anyhow::anyhow!("Entry not found: {}", link))?;

    output.print_entry(&entry);
    Ok(())
}

/// Search headwords in all three scripts
pub fn search(repo: &EntryRepository, query: String, script: Script, output: &Output) -> Result<()> {
    let mut entries = fail_soft(repo, repo.search(&query), output);
    sort_by_word(&mut entries, script);

    output.print_entries(&entries, script);
    Ok(())
}

/// Show the entry of the day
///
/// Falls back to the placeholder entry when the dictionary is empty or
/// unavailable.
pub fn today(repo: &EntryRepository, output: &Output) -> Result<()> {
    let entries = fail_soft(repo, repo.load_all(), output);
    let entry = word_of_the_day_or_placeholder(&entries);

    output.print_entry(&entry);
    Ok(())
}

/// Flatten a read to its value, warning when the store could not answer
fn fail_soft<T: Default>(repo: &EntryRepository, loaded: Loaded<T>, output: &Output) -> T {
    match loaded {
        Loaded::Ready(value) => value,
        Loaded::NotReady => {
            output.warn(&format!(
                "Dictionary is not available: {}",
                repo.diagnostic().unwrap_or("no store could be opened")
            ));
            T::default()
        }
        Loaded::Failed(message) => {
            output.warn(&format!("Failed to read dictionary: {}", message));
            T::default()
        }
    }
}

/// Unwrap a read whose absence must be reported as an error
fn require<T>(repo: &EntryRepository, loaded: Loaded<T>) -> Result<T> {
    match loaded {
        Loaded::Ready(value) => Ok(value),
        Loaded::NotReady => {
            let err = StoreError::NotReady {
                diagnostic: repo
                    .diagnostic()
                    .unwrap_or("no store could be opened")
                    .to_string(),
            };
            match err.recovery_suggestion() {
                Some(hint) => bail!("{}\n{}", err, hint),
                None => bail!(err),
            }
        }
        Loaded::Failed(message) => bail!("Failed to read dictionary: {}", message),
    }
}
