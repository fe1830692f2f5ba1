//! Store bootstrap
//!
//! Decides which file backs the dictionary for the lifetime of the process.
//! Candidates are tried in order and the first that opens wins:
//!
//! 1. The working copy in the shared data directory, if it exists
//! 2. A fresh copy of the bundled snapshot in the shared data directory
//! 3. The bundled snapshot itself (degraded: may be read-only)
//!
//! Every failure along the way is kept as a diagnostic. If nothing opens,
//! the result carries no connection and the repository runs in not-ready
//! mode instead of failing.
//!
//! An existing working copy is never deleted or overwritten, and the copy in
//! step 2 lands via temp file + rename so nothing observes a partial file.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use rusqlite::{Connection, OpenFlags};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::repository::EntryRepository;
use crate::storage::error::BootstrapError;
use crate::storage::schema::has_words_table;

/// Candidate locations for the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    /// Working copy location; `None` when no shared directory is available
    pub container: Option<PathBuf>,
    /// Read-only snapshot shipped with the application
    pub bundle: Option<PathBuf>,
}

impl StorePaths {
    pub fn new(container: Option<PathBuf>, bundle: Option<PathBuf>) -> Self {
        Self { container, bundle }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            container: config.store_path(),
            bundle: config.bundle_path.clone(),
        }
    }
}

/// Where the active store was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// Working copy that already existed
    Existing(PathBuf),
    /// Working copy seeded from the bundle during this bootstrap
    Seeded(PathBuf),
    /// Bundled snapshot opened in place
    Bundled { path: PathBuf, read_only: bool },
    /// In-memory store (tests, snapshot building)
    Memory,
    /// Nothing could be opened
    Unavailable,
}

impl StoreLocation {
    /// Path of the active store file, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            StoreLocation::Existing(path) | StoreLocation::Seeded(path) => Some(path),
            StoreLocation::Bundled { path, .. } => Some(path),
            StoreLocation::Memory | StoreLocation::Unavailable => None,
        }
    }

    /// Whether the bundle is being used directly
    ///
    /// Changes made in this mode may not survive a reinstall.
    pub fn is_degraded(&self) -> bool {
        matches!(self, StoreLocation::Bundled { .. })
    }

    /// Short label for status output
    pub fn label(&self) -> &'static str {
        match self {
            StoreLocation::Existing(_) => "working copy",
            StoreLocation::Seeded(_) => "working copy (seeded from bundle)",
            StoreLocation::Bundled {
                read_only: true, ..
            } => "bundled snapshot (read-only)",
            StoreLocation::Bundled { .. } => "bundled snapshot",
            StoreLocation::Memory => "in-memory",
            StoreLocation::Unavailable => "unavailable",
        }
    }
}

/// Outcome of bootstrap
#[derive(Debug)]
pub struct ResolvedStore {
    /// Open connection; `None` when no candidate could be opened
    pub conn: Option<Connection>,
    pub location: StoreLocation,
    /// Failures recorded while trying candidates, in order
    pub diagnostics: Vec<BootstrapError>,
}

impl ResolvedStore {
    pub fn is_ready(&self) -> bool {
        self.conn.is_some()
    }

    /// All diagnostics joined into one message
    pub fn diagnostic(&self) -> Option<String> {
        if self.diagnostics.is_empty() {
            return None;
        }
        Some(
            self.diagnostics
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Resolve and open the store
///
/// Performs at most one file copy. Never fails: problems are reported in
/// `ResolvedStore::diagnostics`.
pub fn resolve_store(paths: &StorePaths) -> ResolvedStore {
    let mut diagnostics = Vec::new();

    match paths.container {
        Some(ref store_path) => {
            if let Some((conn, location)) =
                open_container(store_path, paths.bundle.as_deref(), &mut diagnostics)
            {
                return ResolvedStore {
                    conn: Some(conn),
                    location,
                    diagnostics,
                };
            }
        }
        None => diagnostics.push(BootstrapError::NoContainer),
    }

    match paths.bundle {
        Some(ref bundle) if bundle.is_file() => match open_bundle(bundle) {
            Ok((conn, read_only)) => {
                warn!(
                    "Using bundled snapshot directly at {:?} (read_only={})",
                    bundle, read_only
                );
                return ResolvedStore {
                    conn: Some(conn),
                    location: StoreLocation::Bundled {
                        path: bundle.clone(),
                        read_only,
                    },
                    diagnostics,
                };
            }
            Err(e) => diagnostics.push(e),
        },
        Some(ref bundle) => diagnostics.push(BootstrapError::BundleMissing {
            path: Some(bundle.clone()),
        }),
        None => diagnostics.push(BootstrapError::BundleMissing { path: None }),
    }

    for diagnostic in &diagnostics {
        match diagnostic.recovery_suggestion() {
            Some(hint) => warn!("Store bootstrap: {} ({})", diagnostic, hint),
            None => warn!("Store bootstrap: {}", diagnostic),
        }
    }

    ResolvedStore {
        conn: None,
        location: StoreLocation::Unavailable,
        diagnostics,
    }
}

/// Try steps 1 and 2: open or seed the working copy
fn open_container(
    store_path: &Path,
    bundle: Option<&Path>,
    diagnostics: &mut Vec<BootstrapError>,
) -> Option<(Connection, StoreLocation)> {
    if store_path.exists() {
        return match open_read_write(store_path) {
            Ok(conn) => {
                info!("Opened working copy at {:?}", store_path);
                Some((conn, StoreLocation::Existing(store_path.to_path_buf())))
            }
            Err(e) => {
                // Leave the existing file alone and fall back to the bundle
                diagnostics.push(e);
                None
            }
        };
    }

    // A missing bundle is reported once, by the bundle step
    let bundle = bundle.filter(|b| b.is_file())?;

    if let Some(parent) = store_path.parent() {
        if let Err(source) = fs::create_dir_all(parent) {
            diagnostics.push(BootstrapError::ContainerUnavailable {
                path: parent.to_path_buf(),
                source,
            });
            return None;
        }
    }

    if let Err(e) = copy_snapshot(bundle, store_path) {
        diagnostics.push(e);
        return None;
    }

    match open_read_write(store_path) {
        Ok(conn) => {
            info!("Seeded working copy at {:?} from {:?}", store_path, bundle);
            Some((conn, StoreLocation::Seeded(store_path.to_path_buf())))
        }
        Err(e) => {
            diagnostics.push(e);
            None
        }
    }
}

/// Open an existing store file for reading and writing
///
/// Never creates the file.
fn open_read_write(path: &Path) -> Result<Connection, BootstrapError> {
    open_with(path, OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX)
}

/// Open the bundled snapshot, read-write when the platform allows it
fn open_bundle(path: &Path) -> Result<(Connection, bool), BootstrapError> {
    let read_only_file = fs::metadata(path)
        .map(|m| m.permissions().readonly())
        .unwrap_or(true);
    let read_only_flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;

    if read_only_file {
        return open_with(path, read_only_flags).map(|conn| (conn, true));
    }

    match open_read_write(path) {
        Ok(conn) => Ok((conn, false)),
        Err(e) => {
            debug!("Read-write open of bundle failed ({}), retrying read-only", e);
            open_with(path, read_only_flags)
                .map(|conn| (conn, true))
                .map_err(|_| e)
        }
    }
}

fn open_with(path: &Path, flags: OpenFlags) -> Result<Connection, BootstrapError> {
    let conn = Connection::open_with_flags(path, flags).map_err(|source| BootstrapError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    // Opening is lazy; the first query is what detects a bad file
    let is_dictionary = has_words_table(&conn).map_err(|source| BootstrapError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    if !is_dictionary {
        return Err(BootstrapError::NotADictionary {
            path: path.to_path_buf(),
        });
    }

    Ok(conn)
}

/// Copy the bundled snapshot into place atomically
///
/// 1. Copy to a temporary file next to the target
/// 2. Make it writable (the bundle's read-only bits come along with the copy)
/// 3. Sync the file to disk
/// 4. Rename the temp file to the target path, unless a store appeared there
///    in the meantime
fn copy_snapshot(bundle: &Path, target: &Path) -> Result<(), BootstrapError> {
    let temp_path = target.with_extension("db.tmp");
    let copy_err = |e| BootstrapError::from_copy(e, bundle.to_path_buf(), target.to_path_buf());

    let result = fs::copy(bundle, &temp_path)
        .and_then(|bytes| {
            make_owner_writable(&temp_path)?;
            File::open(&temp_path)?.sync_all()?;
            Ok(bytes)
        })
        .and_then(|bytes| {
            if target.exists() {
                debug!("Working copy appeared at {:?}, discarding temp copy", target);
                fs::remove_file(&temp_path)?;
            } else {
                fs::rename(&temp_path, target)?;
            }
            Ok(bytes)
        });

    match result {
        Ok(bytes) => {
            debug!("Copied {} bytes from {:?} to {:?}", bytes, bundle, target);
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_file(&temp_path);
            Err(copy_err(e))
        }
    }
}

fn make_owner_writable(path: &Path) -> io::Result<()> {
    let mut permissions = fs::metadata(path)?.permissions();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        permissions.set_mode(permissions.mode() | 0o200);
    }
    #[cfg(not(unix))]
    permissions.set_readonly(false);
    fs::set_permissions(path, permissions)
}

/// Resolves the store once and hands out the shared repository
///
/// The first call runs bootstrap; later calls return the same repository
/// without touching the filesystem again.
pub struct Bootstrapper {
    paths: StorePaths,
    repository: OnceLock<Arc<EntryRepository>>,
}

impl Bootstrapper {
    pub fn new(paths: StorePaths) -> Self {
        Self {
            paths,
            repository: OnceLock::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(StorePaths::from_config(config))
    }

    /// Get the repository, resolving the store on first use
    pub fn repository(&self) -> Arc<EntryRepository> {
        self.repository
            .get_or_init(|| Arc::new(EntryRepository::from_resolved(resolve_store(&self.paths))))
            .clone()
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }
}
