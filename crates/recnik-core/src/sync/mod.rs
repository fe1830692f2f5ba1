//! Incremental dictionary updates
//!
//! The remote publishes one changeset document carrying a version number
//! and an ordered list of add/update/delete changes. A client fetches it,
//! compares the version with the last one applied locally, and replays the
//! changes into the store.
//!
//! ## Usage
//!
//! ```ignore
//! let client = SyncClient::new("https://example.com/changes.json", timeout)?;
//! let mut state = SyncState::with_path(config.sync_state_path())?;
//! let applied = client.check_for_updates(&repo, &mut state).await;
//! ```

pub mod client;
pub mod message;
pub mod state;

pub use client::{apply_changeset, SyncClient, SyncError, SyncOutcome};
pub use message::{column_name, Change, ChangeAction, Changeset, Field};
pub use state::SyncState;
