//! Recnik Core Library
//!
//! This crate provides the core functionality for recnik, an offline
//! Serbian (Cyrillic and Latin) / English dictionary backed by a bundled
//! SQLite snapshot and kept current by incremental changesets.
//!
//! # Architecture
//!
//! - **Bootstrap**: picks the store file once per process (working copy,
//!   fresh copy of the bundle, or the bundle itself)
//! - **Repository**: the single serialized access point to that store
//! - **Sync**: fetches a versioned changeset and replays it into the store
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let repo = EntryRepository::open(&config);
//!
//! let mut entries = repo.load_all().unwrap_or_default();
//! sort_by_word(&mut entries, Script::Latin);
//! let today = word_of_the_day_or_placeholder(&entries);
//! ```
//!
//! # Modules
//!
//! - `models`: Entries, script variants, and parts of speech
//! - `repository`: Entry repository (main entry point)
//! - `storage`: Store bootstrap, schema, and snapshot building
//! - `sync`: Changeset fetching and application
//! - `daily`: Entry of the day
//! - `deeplink`: `recnik://word/<id>` links
//! - `config`: Application configuration

pub mod config;
pub mod daily;
pub mod deeplink;
pub mod models;
pub mod repository;
pub mod storage;
pub mod sync;

pub use config::Config;
pub use daily::{word_of_the_day, word_of_the_day_or_placeholder};
pub use models::{sort_by_word, Entry, PartOfSpeech, Script, Variant};
pub use repository::{EntryRepository, Loaded};
pub use storage::{BootstrapError, Bootstrapper, StoreError, StoreLocation};
pub use sync::{SyncClient, SyncError, SyncOutcome, SyncState};
