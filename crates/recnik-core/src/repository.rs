//! Entry repository
//!
//! The single access point to the dictionary store. Owns the one SQLite
//! connection produced by bootstrap and serializes every read and write
//! through a mutex, so it can be shared across threads behind an `Arc`.
//!
//! ## Not-ready mode
//!
//! When bootstrap could not open any store, the repository still exists:
//! reads return [`Loaded::NotReady`] and writes return
//! [`StoreError::NotReady`]. Callers decide whether to show an error state
//! or flatten to empty results with [`Loaded::unwrap_or_default`].
//!
//! ## Usage
//!
//! ```ignore
//! let repo = EntryRepository::open(&config);
//! let entries = repo.load_all().unwrap_or_default();
//! let bucket = repo.load_by_prefix(Script::Cyrillic, "к").unwrap_or_default();
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use tracing::{debug, warn};

use crate::config::Config;
use crate::deeplink;
use crate::models::{Entry, Script, Variant};
use crate::storage::bootstrap::{resolve_store, ResolvedStore, StoreLocation, StorePaths};
use crate::storage::error::{StoreError, StoreResult};
use crate::storage::schema::{
    ensure_meta_table, id_high_water, init_schema, record_id_high_water, WORDS_TABLE, WORD_COLUMNS,
};
use crate::sync::{Change, Field};

/// Outcome of a read against the repository
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded<T> {
    /// The read succeeded
    Ready(T),
    /// No store could be opened at bootstrap
    NotReady,
    /// The store is open but the read failed
    Failed(String),
}

impl<T> Loaded<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Loaded::Ready(_))
    }

    /// The value, if the read succeeded
    pub fn ready(self) -> Option<T> {
        match self {
            Loaded::Ready(value) => Some(value),
            Loaded::NotReady | Loaded::Failed(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Loaded<U> {
        match self {
            Loaded::Ready(value) => Loaded::Ready(f(value)),
            Loaded::NotReady => Loaded::NotReady,
            Loaded::Failed(message) => Loaded::Failed(message),
        }
    }
}

impl<T: Default> Loaded<T> {
    /// Flatten to the fail-soft result: the value, or empty
    pub fn unwrap_or_default(self) -> T {
        self.ready().unwrap_or_default()
    }
}

/// Repository over the `words` table
pub struct EntryRepository {
    conn: Mutex<Option<Connection>>,
    location: StoreLocation,
    diagnostic: Option<String>,
    last_error: Mutex<Option<String>>,
}

impl EntryRepository {
    /// Bootstrap the store described by `config` and wrap it
    pub fn open(config: &Config) -> Self {
        Self::from_resolved(resolve_store(&StorePaths::from_config(config)))
    }

    /// Wrap the result of bootstrap
    pub fn from_resolved(resolved: ResolvedStore) -> Self {
        let diagnostic = resolved.diagnostic();
        let last_error = if resolved.is_ready() {
            None
        } else {
            diagnostic.clone()
        };

        Self {
            conn: Mutex::new(resolved.conn),
            location: resolved.location,
            diagnostic,
            last_error: Mutex::new(last_error),
        }
    }

    /// Wrap an already-open connection, creating the schema if needed
    pub fn from_connection(conn: Connection, location: StoreLocation) -> StoreResult<Self> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(Some(conn)),
            location,
            diagnostic: None,
            last_error: Mutex::new(None),
        })
    }

    /// Open an empty in-memory store (for testing)
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?, StoreLocation::Memory)
    }

    /// A repository with no store behind it
    pub fn unavailable(diagnostic: impl Into<String>) -> Self {
        let diagnostic = diagnostic.into();
        Self {
            conn: Mutex::new(None),
            location: StoreLocation::Unavailable,
            diagnostic: Some(diagnostic.clone()),
            last_error: Mutex::new(Some(diagnostic)),
        }
    }

    // ==================== Status ====================

    /// Whether a store is open
    pub fn is_ready(&self) -> bool {
        self.lock_conn().is_some()
    }

    /// Where the active store lives
    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    /// Diagnostics recorded during bootstrap
    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    /// Most recent store error, or the bootstrap diagnostic when not ready
    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // ==================== Reads ====================

    /// All entries, in storage order
    pub fn load_all(&self) -> Loaded<Vec<Entry>> {
        self.read("load_all", query_all)
    }

    /// Entries whose headword in `script` starts with `prefix`, ignoring case
    ///
    /// Matching uses Unicode lowercasing, so Cyrillic and Latin diacritics
    /// fold the same way as ASCII. Storage order is preserved.
    pub fn load_by_prefix(&self, script: Script, prefix: &str) -> Loaded<Vec<Entry>> {
        self.load_all().map(|entries| {
            entries
                .into_iter()
                .filter(|e| e.word_starts_with(script, prefix))
                .collect()
        })
    }

    /// Entries where any headword contains `query`, ignoring case
    pub fn search(&self, query: &str) -> Loaded<Vec<Entry>> {
        self.load_all()
            .map(|entries| entries.into_iter().filter(|e| e.matches(query)).collect())
    }

    /// A single entry
    pub fn load_by_id(&self, id: i64) -> Loaded<Option<Entry>> {
        self.read("load_by_id", |conn| {
            let sql = format!("SELECT {} FROM {} WHERE id = ?1", WORD_COLUMNS, WORDS_TABLE);
            conn.query_row(&sql, params![id], entry_from_row).optional()
        })
    }

    /// Resolve a `recnik://word/<id>` link
    ///
    /// Links that do not parse resolve to no entry.
    pub fn resolve_link(&self, link: &str) -> Loaded<Option<Entry>> {
        match deeplink::parse_entry_link(link) {
            Some(id) => self.load_by_id(id),
            None => {
                debug!("Ignoring unrecognized link {:?}", link);
                Loaded::Ready(None)
            }
        }
    }

    /// Number of entries
    pub fn count(&self) -> Loaded<i64> {
        self.read("count", |conn| {
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", WORDS_TABLE), [], |row| {
                row.get(0)
            })
        })
    }

    // ==================== Writes ====================

    /// Insert a new entry and return its id
    ///
    /// Fields not supplied by `change` are stored as empty strings; the
    /// change's own `id` is ignored. The new id is above every id the store
    /// has ever handed out, including deleted ones.
    pub fn insert(&self, change: &Change) -> StoreResult<i64> {
        self.write(|conn| {
            let tx = conn.unchecked_transaction()?;
            ensure_meta_table(&tx)?;
            let id = id_high_water(&tx)? + 1;

            let mut columns = vec!["id".to_string()];
            let mut texts = Vec::new();
            for script in Script::ALL {
                for field in Field::ALL {
                    columns.push(crate::sync::column_name(script, field));
                    texts.push(change.value_or_empty(script, field));
                }
            }
            let mut values: Vec<&dyn ToSql> = vec![&id];
            values.extend(texts.iter().map(|value| value as &dyn ToSql));

            let placeholders = (1..=columns.len())
                .map(|i| format!("?{}", i))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                WORDS_TABLE,
                columns.join(", "),
                placeholders
            );

            tx.execute(&sql, values.as_slice())?;
            record_id_high_water(&tx, id)?;
            tx.commit()?;
            debug!("Inserted entry {}", id);
            Ok(id)
        })
    }

    /// Overwrite only the fields supplied by `change`
    pub fn update(&self, id: i64, change: &Change) -> StoreResult<()> {
        let supplied = change.supplied();

        self.write(|conn| {
            if supplied.is_empty() {
                return if row_exists(conn, id)? {
                    Ok(())
                } else {
                    Err(StoreError::NotFound { id })
                };
            }

            let assignments = supplied
                .iter()
                .enumerate()
                .map(|(i, (column, _))| format!("{} = ?{}", column, i + 1))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "UPDATE {} SET {} WHERE id = ?{}",
                WORDS_TABLE,
                assignments,
                supplied.len() + 1
            );

            let mut values: Vec<&dyn ToSql> =
                supplied.iter().map(|(_, value)| value as &dyn ToSql).collect();
            values.push(&id);

            match conn.execute(&sql, values.as_slice())? {
                0 => Err(StoreError::NotFound { id }),
                _ => {
                    debug!("Updated {} field(s) of entry {}", supplied.len(), id);
                    Ok(())
                }
            }
        })
    }

    /// Remove an entry; removing a missing entry is not an error
    pub fn delete(&self, id: i64) -> StoreResult<()> {
        self.write(|conn| {
            let tx = conn.unchecked_transaction()?;
            ensure_meta_table(&tx)?;
            let removed = tx.execute(
                &format!("DELETE FROM {} WHERE id = ?1", WORDS_TABLE),
                params![id],
            )?;
            if removed == 0 {
                debug!("Delete of entry {} matched nothing", id);
                return Ok(());
            }
            record_id_high_water(&tx, id)?;
            tx.commit()?;
            Ok(())
        })
    }

    // ==================== Internals ====================

    fn lock_conn(&self) -> MutexGuard<'_, Option<Connection>> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_error(&self, message: String) {
        *self
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(message);
    }

    fn read<T>(
        &self,
        operation: &str,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Loaded<T> {
        let guard = self.lock_conn();
        let Some(conn) = guard.as_ref() else {
            return Loaded::NotReady;
        };

        match f(conn) {
            Ok(value) => Loaded::Ready(value),
            Err(e) => {
                warn!("Store read {} failed: {}", operation, e);
                let message = e.to_string();
                self.record_error(message.clone());
                Loaded::Failed(message)
            }
        }
    }

    fn write<T>(&self, f: impl FnOnce(&Connection) -> StoreResult<T>) -> StoreResult<T> {
        let guard = self.lock_conn();
        let Some(conn) = guard.as_ref() else {
            return Err(StoreError::NotReady {
                diagnostic: self
                    .diagnostic
                    .clone()
                    .unwrap_or_else(|| "no store is open".to_string()),
            });
        };

        f(conn).map_err(|e| {
            if e.is_fatal() {
                self.record_error(e.to_string());
            }
            e
        })
    }
}

fn query_all(conn: &Connection) -> rusqlite::Result<Vec<Entry>> {
    let sql = format!("SELECT {} FROM {}", WORD_COLUMNS, WORDS_TABLE);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], entry_from_row)?;
    rows.collect()
}

fn row_exists(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    conn.prepare(&format!("SELECT 1 FROM {} WHERE id = ?1", WORDS_TABLE))?
        .exists(params![id])
}

/// Build an entry from a row selected with `WORD_COLUMNS`
fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<Entry> {
    let variant = |start: usize| -> rusqlite::Result<Variant> {
        Ok(Variant {
            word: text(row, start)?,
            part_of_speech: text(row, start + 1)?,
            definition: text(row, start + 2)?,
            example: text(row, start + 3)?,
        })
    };

    Ok(Entry {
        id: row.get(0)?,
        cyrillic: variant(1)?,
        latin: variant(5)?,
        english: variant(9)?,
    })
}

/// Read a column as text, treating NULL as empty
///
/// The shipped snapshot is not strictly typed, so numbers are rendered
/// rather than rejected.
fn text(row: &Row<'_>, idx: usize) -> rusqlite::Result<String> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => String::new(),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
    })
}
