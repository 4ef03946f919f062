//! Error types for mtimekeeper
//!
//! Errors fall into two tiers. Fatal errors abort a whole snapshot or restore
//! run (the root cannot be walked, the manifest cannot be read). Everything
//! else is confined to a single entry and ends up in a run report instead of
//! being returned as `Err`.

use std::path::PathBuf;
use thiserror::Error;

/// Type alias for Results in the mtimekeeper library
pub type Result<T> = std::result::Result<T, MtimeError>;

/// Main error type for all mtimekeeper operations
#[derive(Debug, Error)]
pub enum MtimeError {
    /// I/O errors during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors during JSON serialization/deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Walk directory error from walkdir crate
    #[error("Walk directory error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// Snapshot root exists but is not a directory
    #[error("Not a directory: {0:?}")]
    NotADirectory(PathBuf),

    /// Snapshot root is missing or cannot be inspected
    #[error("Cannot read root {path:?}: {source}")]
    RootUnreadable {
        /// Root that was requested
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Manifest file could not be read
    #[error("Cannot read manifest {path:?}: {source}")]
    ManifestRead {
        /// Path of the manifest file
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Manifest contents are not a valid manifest
    #[error("Malformed manifest: {0}")]
    MalformedManifest(String),

    /// Recorded timestamp could not be parsed
    #[error("Invalid timestamp '{value}': {reason}")]
    InvalidTimestamp {
        /// Raw timestamp text from the manifest
        value: String,
        /// Parser message
        reason: String,
    },

    /// Manifest path would resolve outside of the target root
    #[error("Path escapes root: {0}")]
    PathEscapesRoot(String),

    /// A component below the target root is a symbolic link
    #[error("Refusing to follow symbolic link: {0:?}")]
    SymlinkInPath(PathBuf),

    /// Target path exists but is not a regular file
    #[error("Not a regular file: {0:?}")]
    NotAFile(PathBuf),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MtimeError {
    /// Create a malformed-manifest error with a custom message
    pub fn malformed(msg: impl Into<String>) -> Self {
        MtimeError::MalformedManifest(msg.into())
    }

    /// Create an internal error with a custom message
    pub fn internal(msg: impl Into<String>) -> Self {
        MtimeError::Internal(msg.into())
    }

    /// Check if this error aborts a whole run rather than a single entry
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MtimeError::WalkDir(_)
                | MtimeError::NotADirectory(_)
                | MtimeError::RootUnreadable { .. }
                | MtimeError::ManifestRead { .. }
                | MtimeError::MalformedManifest(_)
                | MtimeError::Json(_)
        )
    }

    /// Check if this error means the file was simply not there
    pub fn is_not_found(&self) -> bool {
        match self {
            MtimeError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
