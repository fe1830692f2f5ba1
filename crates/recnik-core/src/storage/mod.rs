//! Storage layer
//!
//! Handles locating, seeding, and opening the SQLite dictionary store.
//!
//! ## Layout
//!
//! - **Bundled snapshot**: read-only `dictionary.db` shipped with the app
//! - **Working copy**: `dictionary.db` in the shared data directory, seeded
//!   from the bundle on first launch and updated by sync
//!
//! Both files share one schema: the `words` table, plus a small
//! `recnik_meta` table that remembers the highest entry id ever assigned.

pub mod bootstrap;
pub mod error;
pub mod schema;
pub mod snapshot;

pub use bootstrap::{resolve_store, Bootstrapper, ResolvedStore, StoreLocation, StorePaths};
pub use error::{BootstrapError, StoreError, StoreResult};
pub use schema::{has_words_table, init_schema};
pub use snapshot::build_snapshot;
