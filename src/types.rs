//! Shared types for snapshot and restore runs
//!
//! - **Progress**: `ProgressInfo`, `ProgressCallback` - optional per-entry notifications
//! - **Snapshot results**: `SnapshotReport`, `SnapshotWarning`
//! - **Restore results**: `RestoreReport`, `EntryResult`, `EntryOutcome`
//!
//! Every run hands back its counts and per-entry problems as values, so
//! callers decide whether to print, collect, or ignore them.

use crate::manifest::Manifest;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Progress callback type
pub type ProgressCallback = Arc<dyn Fn(ProgressInfo) + Send + Sync>;

/// Information passed to progress callbacks
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Operation being performed
    pub operation: String,
    /// Current item being processed
    pub current_item: Option<String>,
    /// Items processed so far
    pub processed: usize,
    /// Total items to process (if known)
    pub total: Option<usize>,
}

impl ProgressInfo {
    /// Get progress as a percentage (0-100)
    pub fn percentage(&self) -> Option<f32> {
        match self.total {
            Some(total) if total > 0 => Some((self.processed as f32 / total as f32) * 100.0),
            _ => None,
        }
    }
}

/// Something a snapshot skipped and wants the caller to know about
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SnapshotWarning {
    /// Symbolic links are never followed or recorded
    SymlinkSkipped {
        /// Path of the link
        path: PathBuf,
    },
    /// FIFOs, sockets, device nodes
    UnsupportedFileType {
        /// Path of the entry
        path: PathBuf,
    },
    /// Metadata or content could not be read
    UnreadableFile {
        /// Path of the file
        path: PathBuf,
        /// Underlying error message
        reason: String,
    },
    /// Path cannot be written to a manifest as UTF-8
    NonUtf8Path {
        /// Path of the file
        path: PathBuf,
    },
}

impl SnapshotWarning {
    /// Path the warning is about
    pub fn path(&self) -> &PathBuf {
        match self {
            SnapshotWarning::SymlinkSkipped { path }
            | SnapshotWarning::UnsupportedFileType { path }
            | SnapshotWarning::UnreadableFile { path, .. }
            | SnapshotWarning::NonUtf8Path { path } => path,
        }
    }

    /// Whether this is a real failure rather than an informational skip
    pub fn is_error(&self) -> bool {
        matches!(self, SnapshotWarning::UnreadableFile { .. })
    }
}

impl fmt::Display for SnapshotWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotWarning::SymlinkSkipped { path } => {
                write!(f, "Skipping symbolic link: {}", path.display())
            }
            SnapshotWarning::UnsupportedFileType { path } => {
                write!(f, "Skipping special file: {}", path.display())
            }
            SnapshotWarning::UnreadableFile { path, reason } => {
                write!(f, "Cannot read {}: {}", path.display(), reason)
            }
            SnapshotWarning::NonUtf8Path { path } => {
                write!(f, "Skipping non UTF-8 path: {}", path.display())
            }
        }
    }
}

/// Result of a snapshot run
#[derive(Debug, Clone)]
pub struct SnapshotReport {
    /// Every regular file that was fingerprinted, in walk order
    pub manifest: Manifest,
    /// Entries that were skipped, in walk order
    pub warnings: Vec<SnapshotWarning>,
    /// Time taken in milliseconds
    pub duration_ms: u64,
}

impl SnapshotReport {
    /// Number of files recorded in the manifest
    pub fn files_processed(&self) -> usize {
        self.manifest.len()
    }

    /// Number of symbolic links that were skipped
    pub fn symlinks_skipped(&self) -> usize {
        self.warnings
            .iter()
            .filter(|w| matches!(w, SnapshotWarning::SymlinkSkipped { .. }))
            .count()
    }

    /// Number of files that could not be read
    pub fn files_failed(&self) -> usize {
        self.warnings.iter().filter(|w| w.is_error()).count()
    }
}

/// What happened to one manifest entry during a restore
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum EntryOutcome {
    /// Timestamps were set to the recorded value
    Updated,
    /// Content matched; timestamps would have been set (dry run)
    WouldUpdate,
    /// Directory entries are never restored
    SkippedDirectory,
    /// No file at the entry's path
    SkippedMissing,
    /// File content differs from the snapshot
    SkippedMismatch,
    /// Reported failure: unreadable file, bad timestamp, unsafe path, or set failure
    SkippedError(String),
}

impl EntryOutcome {
    /// Whether the entry counts towards the updated total
    pub fn is_updated(&self) -> bool {
        matches!(self, EntryOutcome::Updated | EntryOutcome::WouldUpdate)
    }

    /// Whether the outcome should be surfaced to the operator
    pub fn is_error(&self) -> bool {
        matches!(self, EntryOutcome::SkippedError(_))
    }
}

/// One manifest entry and its outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryResult {
    /// Path as recorded in the manifest
    pub relative_path: String,
    /// What the restorer did with it
    pub outcome: EntryOutcome,
}

/// Result of a restore run
#[derive(Debug, Clone, Serialize)]
pub struct RestoreReport {
    /// Number of manifest entries considered
    pub total_entries: usize,
    /// Number of entries whose timestamps were (or would be) set
    pub updated_count: usize,
    /// Per-entry outcomes in manifest order
    pub entries: Vec<EntryResult>,
    /// Whether this was a dry run
    pub dry_run: bool,
    /// Time taken in milliseconds
    pub duration_ms: u64,
}

impl RestoreReport {
    /// Build a report from per-entry results
    pub fn new(entries: Vec<EntryResult>, dry_run: bool, duration_ms: u64) -> Self {
        let updated_count = entries.iter().filter(|e| e.outcome.is_updated()).count();
        Self {
            total_entries: entries.len(),
            updated_count,
            entries,
            dry_run,
            duration_ms,
        }
    }

    fn count(&self, outcome: &EntryOutcome) -> usize {
        self.entries.iter().filter(|e| &e.outcome == outcome).count()
    }

    /// Entries with no file on disk
    pub fn skipped_missing(&self) -> usize {
        self.count(&EntryOutcome::SkippedMissing)
    }

    /// Entries whose content has changed since the snapshot
    pub fn skipped_mismatch(&self) -> usize {
        self.count(&EntryOutcome::SkippedMismatch)
    }

    /// Directory entries
    pub fn skipped_directories(&self) -> usize {
        self.count(&EntryOutcome::SkippedDirectory)
    }

    /// Reported failures as `(path, reason)` pairs
    pub fn errors(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().filter_map(|e| match &e.outcome {
            EntryOutcome::SkippedError(reason) => Some((e.relative_path.as_str(), reason.as_str())),
            _ => None,
        })
    }

    /// Look up the outcome for a path
    pub fn outcome(&self, relative_path: &str) -> Option<&EntryOutcome> {
        self.entries
            .iter()
            .find(|e| e.relative_path == relative_path)
            .map(|e| &e.outcome)
    }
}
