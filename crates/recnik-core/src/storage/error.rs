//! Storage error handling
//!
//! Provides typed errors for bootstrap and store operations with descriptive
//! messages and recovery suggestions.

use std::io;
use std::path::PathBuf;

use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors raised while resolving which file backs the store
///
/// None of these are fatal: the bootstrapper records them as diagnostics and
/// falls through to the next candidate location.
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// No shared data directory is configured for this process
    #[error("No shared data directory is configured")]
    NoContainer,

    /// The shared data directory could not be created or accessed
    #[error("Shared data directory '{path}' is not available: {source}")]
    ContainerUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The bundled snapshot could not be located
    #[error("Bundled snapshot not found{}", .path.as_ref().map(|p| format!(" at '{}'", p.display())).unwrap_or_default())]
    BundleMissing { path: Option<PathBuf> },

    /// Permission denied while copying the bundled snapshot
    #[error("Permission denied copying '{from}' to '{to}'. Check file permissions.")]
    PermissionDenied {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Disk full while copying the bundled snapshot
    #[error("Disk full or quota exceeded while copying '{from}' to '{to}'. Free up disk space and try again.")]
    DiskFull {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Copying the bundled snapshot failed
    #[error("Failed to copy '{from}' to '{to}': {source}")]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// SQLite refused to open the file
    #[error("Failed to open store at '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// The file opened but does not contain a dictionary
    #[error("'{path}' is not a dictionary store (missing words table)")]
    NotADictionary { path: PathBuf },
}

impl BootstrapError {
    /// Create a copy error from an I/O error, classified by kind
    pub fn from_copy(error: io::Error, from: PathBuf, to: PathBuf) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => BootstrapError::PermissionDenied {
                from,
                to,
                source: error,
            },
            io::ErrorKind::NotFound => BootstrapError::BundleMissing { path: Some(from) },
            _ if is_disk_full_error(&error) => BootstrapError::DiskFull {
                from,
                to,
                source: error,
            },
            _ => BootstrapError::CopyFailed {
                from,
                to,
                source: error,
            },
        }
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            BootstrapError::NoContainer | BootstrapError::ContainerUnavailable { .. } => {
                Some("Set data_dir in the config file or RECNIK_DATA_DIR to a writable directory.")
            }
            BootstrapError::BundleMissing { .. } => {
                Some("Set bundle_path in the config file or RECNIK_BUNDLE_PATH to the shipped dictionary.db.")
            }
            BootstrapError::PermissionDenied { .. } => {
                Some("Check permissions on the data directory.")
            }
            BootstrapError::DiskFull { .. } => Some("Free up disk space and try again."),
            _ => None,
        }
    }
}

/// Errors that can occur on an open store
#[derive(Error, Debug)]
pub enum StoreError {
    /// No store could be opened during bootstrap
    #[error("Dictionary store is not available: {diagnostic}")]
    NotReady { diagnostic: String },

    /// Update target does not exist
    #[error("Entry {id} not found")]
    NotFound { id: i64 },

    /// The active store is the read-only bundled snapshot
    #[error("Dictionary store is read-only: {0}")]
    ReadOnly(#[source] rusqlite::Error),

    /// Disk full while writing
    #[error("Disk full while writing to the dictionary store: {0}")]
    DiskFull(#[source] rusqlite::Error),

    /// SQLite prepare/bind/step failure
    #[error("Database error: {0}")]
    Database(#[source] rusqlite::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(error: rusqlite::Error) -> Self {
        match error.sqlite_error_code() {
            Some(ErrorCode::ReadOnly) => StoreError::ReadOnly(error),
            Some(ErrorCode::DiskFull) => StoreError::DiskFull(error),
            _ => StoreError::Database(error),
        }
    }
}

impl StoreError {
    /// Whether this error aborts a changeset application
    ///
    /// `NotFound` only affects the single change that named a missing row.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, StoreError::NotFound { .. })
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StoreError::NotReady { .. } => {
                Some("Check the data directory and bundled snapshot paths with `recnik status`.")
            }
            StoreError::ReadOnly(_) => Some(
                "The bundled snapshot is in use. Make the data directory writable so a copy can be made.",
            ),
            StoreError::DiskFull(_) => Some("Free up disk space and try again."),
            _ => None,
        }
    }
}

/// Check if an I/O error indicates disk full condition
fn is_disk_full_error(error: &io::Error) -> bool {
    let msg = error.to_string().to_lowercase();
    msg.contains("no space left")
        || msg.contains("disk full")
        || msg.contains("quota exceeded")
        || msg.contains("not enough space")
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn copy_err(kind: io::ErrorKind, msg: &str) -> BootstrapError {
        BootstrapError::from_copy(
            io::Error::new(kind, msg.to_string()),
            PathBuf::from("/bundle/dictionary.db"),
            PathBuf::from("/data/dictionary.db"),
        )
    }

    #[test]
    fn test_permission_denied_classification() {
        let err = copy_err(io::ErrorKind::PermissionDenied, "access denied");
        assert!(matches!(err, BootstrapError::PermissionDenied { .. }));
        assert!(err.recovery_suggestion().is_some());
    }

    #[test]
    fn test_missing_source_is_bundle_missing() {
        let err = copy_err(io::ErrorKind::NotFound, "no such file");
        assert!(matches!(err, BootstrapError::BundleMissing { path: Some(_) }));
        assert!(err.to_string().contains("/bundle/dictionary.db"));
    }

    #[test]
    fn test_disk_full_detection() {
        let err = copy_err(io::ErrorKind::Other, "No space left on device");
        assert!(matches!(err, BootstrapError::DiskFull { .. }));
    }

    #[test]
    fn test_other_copy_failure() {
        let err = copy_err(io::ErrorKind::Other, "interrupted");
        assert!(matches!(err, BootstrapError::CopyFailed { .. }));
        assert!(err.recovery_suggestion().is_none());
    }

    #[test]
    fn test_bundle_missing_without_path() {
        let err = BootstrapError::BundleMissing { path: None };
        assert_eq!(err.to_string(), "Bundled snapshot not found");
    }

    #[test]
    fn test_not_found_is_not_fatal() {
        assert!(!StoreError::NotFound { id: 3 }.is_fatal());
        assert!(StoreError::NotReady {
            diagnostic: "x".to_string()
        }
        .is_fatal());
    }

    #[test]
    fn test_sqlite_error_mapping() {
        let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StoreError::Database(_)));
        assert!(err.is_fatal());
    }
}
