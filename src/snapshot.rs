//! Directory snapshots
//!
//! The snapshotter walks a root directory and records every regular file's
//! relative path, content fingerprint and modification time in a
//! [`Manifest`].
//!
//! ## Walk rules
//!
//! - Directories produce no entry, but their children are visited
//! - Symbolic links are never followed and are reported as skipped
//! - FIFOs, sockets and device nodes are reported as skipped
//! - A file that cannot be read is reported and the walk continues
//! - A failure to enumerate the tree itself aborts the whole snapshot
//!
//! Entries are visited in lexicographic order within each directory, so
//! snapshots of identical trees produce identical manifests.
//!
//! ## Example
//!
//! ```rust,no_run
//! use mtimekeeper::snapshot::Snapshotter;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let report = Snapshotter::new("./project").run()?;
//! for warning in &report.warnings {
//!     eprintln!("{}", warning);
//! }
//! report.manifest.save(Path::new("file_info.json"))?;
//! println!("Processed {} files", report.files_processed());
//! # Ok(())
//! # }
//! ```

use crate::error::{MtimeError, Result};
use crate::fingerprint::fingerprint_file;
use crate::manifest::{to_manifest_path, Manifest, ManifestEntry};
use crate::types::{ProgressCallback, ProgressInfo, SnapshotReport, SnapshotWarning};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, trace, warn};
use walkdir::{DirEntry, WalkDir};

/// Builds a manifest from a live directory tree
pub struct Snapshotter {
    /// Directory to snapshot
    root: PathBuf,
    /// Optional per-file progress notifications
    progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for Snapshotter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshotter")
            .field("root", &self.root)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl Snapshotter {
    /// Create a snapshotter for `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            progress: None,
        }
    }

    /// Report each recorded file to `callback`
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Root directory being snapshotted
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the tree and build the manifest
    ///
    /// # Errors
    ///
    /// - [`MtimeError::RootUnreadable`] if the root does not exist or cannot be inspected
    /// - [`MtimeError::NotADirectory`] if the root is not a directory
    /// - [`MtimeError::WalkDir`] if any part of the tree cannot be enumerated
    ///
    /// Per-file problems are returned in [`SnapshotReport::warnings`].
    pub fn run(&self) -> Result<SnapshotReport> {
        let start = Instant::now();
        self.check_root()?;

        info!("Snapshotting {:?}", self.root);

        let mut entries = Vec::new();
        let mut warnings = Vec::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name();

        for item in walker {
            let dir_entry = item?;
            let file_type = dir_entry.file_type();

            if file_type.is_dir() {
                continue;
            }

            if file_type.is_symlink() {
                info!("Skipping symbolic link: {:?}", dir_entry.path());
                warnings.push(SnapshotWarning::SymlinkSkipped {
                    path: dir_entry.path().to_path_buf(),
                });
                continue;
            }

            if !file_type.is_file() {
                warn!("Skipping special file: {:?}", dir_entry.path());
                warnings.push(SnapshotWarning::UnsupportedFileType {
                    path: dir_entry.path().to_path_buf(),
                });
                continue;
            }

            match self.process_file(&dir_entry) {
                Ok(entry) => {
                    trace!("Recorded {} ({})", entry.relative_path, entry.modification_time);
                    entries.push(entry);
                    self.report_progress(&entries);
                }
                Err(warning) => {
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        let manifest = Manifest::from_entries(entries)?;
        let duration_ms = start.elapsed().as_millis() as u64;

        debug!(
            "Snapshot of {:?}: {} files, {} skipped in {}ms",
            self.root,
            manifest.len(),
            warnings.len(),
            duration_ms
        );

        Ok(SnapshotReport {
            manifest,
            warnings,
            duration_ms,
        })
    }

    fn check_root(&self) -> Result<()> {
        let metadata = fs::metadata(&self.root).map_err(|source| MtimeError::RootUnreadable {
            path: self.root.clone(),
            source,
        })?;
        if !metadata.is_dir() {
            return Err(MtimeError::NotADirectory(self.root.clone()));
        }
        Ok(())
    }

    /// Fingerprint one regular file
    ///
    /// The modification time is captured before the content is read.
    fn process_file(&self, dir_entry: &DirEntry) -> std::result::Result<ManifestEntry, SnapshotWarning> {
        let path = dir_entry.path();
        let unreadable = |reason: String| SnapshotWarning::UnreadableFile {
            path: path.to_path_buf(),
            reason,
        };

        let relative_path = path
            .strip_prefix(&self.root)
            .ok()
            .and_then(to_manifest_path)
            .ok_or_else(|| SnapshotWarning::NonUtf8Path {
                path: path.to_path_buf(),
            })?;

        let metadata = dir_entry.metadata().map_err(|e| unreadable(e.to_string()))?;
        let modified = metadata.modified().map_err(|e| unreadable(e.to_string()))?;
        let hash = fingerprint_file(path).map_err(|e| unreadable(e.to_string()))?;

        ManifestEntry::new(relative_path, hash, modified).map_err(|e| unreadable(e.to_string()))
    }

    fn report_progress(&self, entries: &[ManifestEntry]) {
        if let Some(callback) = &self.progress {
            callback(ProgressInfo {
                operation: "Snapshotting".to_string(),
                current_item: entries.last().map(|e| e.relative_path.clone()),
                processed: entries.len(),
                total: None,
            });
        }
    }
}

/// Snapshot `root` with default options
pub fn snapshot(root: &Path) -> Result<SnapshotReport> {
    Snapshotter::new(root).run()
}
