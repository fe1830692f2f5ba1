//! SQLite schema for the dictionary store
//!
//! The shipped snapshot already contains the `words` table; this module
//! creates it for freshly built snapshots and checks that an opened file is
//! actually a dictionary.
//!
//! Entry ids are never reused. Snapshots built here use `AUTOINCREMENT`,
//! and every store also keeps the highest id ever assigned in `recnik_meta`,
//! because older snapshots declare a plain `INTEGER PRIMARY KEY`.

use rusqlite::{params, Connection, OptionalExtension, Result};

/// Name of the single table holding entries
pub const WORDS_TABLE: &str = "words";

/// Key/value table for store bookkeeping
pub const META_TABLE: &str = "recnik_meta";

const ID_HIGH_WATER_KEY: &str = "id_high_water";

/// Column list in the order rows are read
pub const WORD_COLUMNS: &str = "id, \
    cyrillic_word, cyrillic_part, cyrillic_def, cyrillic_example, \
    latin_word, latin_part, latin_def, latin_example, \
    english_word, english_part, english_def, english_example";

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS words (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            cyrillic_word TEXT,
            cyrillic_part TEXT,
            cyrillic_def TEXT,
            cyrillic_example TEXT,
            latin_word TEXT,
            latin_part TEXT,
            latin_def TEXT,
            latin_example TEXT,
            english_word TEXT,
            english_part TEXT,
            english_def TEXT,
            english_example TEXT
        );
        "#,
    )?;
    ensure_meta_table(conn)
}

/// Create the bookkeeping table if this store predates it
pub fn ensure_meta_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS recnik_meta (
            key TEXT PRIMARY KEY,
            value INTEGER NOT NULL
        );
        "#,
    )
}

/// Check whether the `words` table is present
///
/// Errors (a locked or unreadable file) are returned rather than folded into
/// `false`, so callers can tell them apart from a file that is not a
/// dictionary.
pub fn has_words_table(conn: &Connection) -> Result<bool> {
    conn.prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1")?
        .exists([WORDS_TABLE])
}

/// Highest entry id ever assigned: the recorded mark or the largest live id
pub fn id_high_water(conn: &Connection) -> Result<i64> {
    let recorded: Option<i64> = conn
        .query_row(
            &format!("SELECT value FROM {} WHERE key = ?1", META_TABLE),
            params![ID_HIGH_WATER_KEY],
            |row| row.get(0),
        )
        .optional()?;
    let live: i64 = conn.query_row(
        &format!("SELECT COALESCE(MAX(id), 0) FROM {}", WORDS_TABLE),
        [],
        |row| row.get(0),
    )?;
    Ok(recorded.unwrap_or(0).max(live))
}

/// Raise the recorded high-water mark to at least `id`
pub fn record_id_high_water(conn: &Connection, id: i64) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO {} (key, value) VALUES (?1, ?2) \
             ON CONFLICT(key) DO UPDATE SET value = MAX(value, excluded.value)",
            META_TABLE
        ),
        params![ID_HIGH_WATER_KEY, id],
    )?;
    Ok(())
}
