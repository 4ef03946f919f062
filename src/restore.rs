//! Timestamp restoration
//!
//! The restorer takes a [`Manifest`] and a target root and, for every entry
//! whose file on disk still has the recorded content fingerprint, sets the
//! file's access and modification times to the recorded modification time.
//!
//! Each entry is handled on its own and ends in exactly one
//! [`EntryOutcome`]:
//!
//! | Situation                              | Outcome              | Reported |
//! |----------------------------------------|----------------------|----------|
//! | `is_directory` entry                   | `SkippedDirectory`   | no       |
//! | no file at the path                    | `SkippedMissing`     | no       |
//! | content differs from the snapshot      | `SkippedMismatch`    | no       |
//! | unsafe path, unreadable file, bad time | `SkippedError`       | yes      |
//! | symbolic link or non-file on the path  | `SkippedError`       | yes      |
//! | timestamps could not be set            | `SkippedError`       | yes      |
//! | content matches                        | `Updated`            | no       |
//!
//! Symbolic links in the target tree are never followed, so a restore only
//! ever touches regular files physically under the root.
//!
//! Nothing short of failing to load the manifest aborts a restore, and file
//! content is never written.
//!
//! ## Example
//!
//! ```rust,no_run
//! use mtimekeeper::restore::Restorer;
//! use mtimekeeper::Manifest;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manifest = Manifest::load(Path::new("file_info.json"))?;
//! let report = Restorer::new("./checkout").run(&manifest);
//! println!("Updated {} of {}", report.updated_count, report.total_entries);
//! # Ok(())
//! # }
//! ```

use crate::error::{MtimeError, Result};
use crate::fingerprint::fingerprint_file;
use crate::manifest::{safe_relative_path, Manifest, ManifestEntry};
use crate::types::{EntryOutcome, EntryResult, ProgressCallback, ProgressInfo, RestoreReport};
use filetime::FileTime;
use rayon::prelude::*;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, info, trace, warn};

/// Applies recorded timestamps onto a target tree
pub struct Restorer {
    /// Tree to restore into
    root: PathBuf,
    /// Check everything but leave timestamps alone
    dry_run: bool,
    /// Process entries on the rayon thread pool
    parallel: bool,
    /// Optional per-entry progress notifications
    progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for Restorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Restorer")
            .field("root", &self.root)
            .field("dry_run", &self.dry_run)
            .field("parallel", &self.parallel)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl Restorer {
    /// Create a sequential, non-dry-run restorer for `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            dry_run: false,
            parallel: false,
            progress: None,
        }
    }

    /// Only report what would be updated
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Spread entries across threads
    ///
    /// Entries touch disjoint files, so outcomes are identical to a
    /// sequential run and are still reported in manifest order.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Report each processed entry to `callback`
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Root directory being restored into
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Restore every entry of `manifest`
    pub fn run(&self, manifest: &Manifest) -> RestoreReport {
        let start = Instant::now();
        let total = manifest.len();
        let processed = AtomicUsize::new(0);

        info!(
            "Restoring {} entries into {:?}{}",
            total,
            self.root,
            if self.dry_run { " (dry run)" } else { "" }
        );

        let handle = |entry: &ManifestEntry| {
            let outcome = self.restore_entry(entry);
            let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
            self.report_progress(entry, done, total);
            EntryResult {
                relative_path: entry.relative_path.clone(),
                outcome,
            }
        };

        let results: Vec<EntryResult> = if self.parallel {
            manifest.entries().par_iter().map(handle).collect()
        } else {
            manifest.entries().iter().map(handle).collect()
        };

        let report = RestoreReport::new(results, self.dry_run, start.elapsed().as_millis() as u64);
        debug!(
            "Restore into {:?}: {} of {} updated in {}ms",
            self.root, report.updated_count, report.total_entries, report.duration_ms
        );
        report
    }

    /// Decide and apply one entry
    pub fn restore_entry(&self, entry: &ManifestEntry) -> EntryOutcome {
        if entry.is_directory {
            trace!("Skipping directory entry {}", entry.relative_path);
            return EntryOutcome::SkippedDirectory;
        }

        match self.try_restore(entry) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Skipping {}: {}", entry.relative_path, e);
                EntryOutcome::SkippedError(e.to_string())
            }
        }
    }

    fn try_restore(&self, entry: &ManifestEntry) -> Result<EntryOutcome> {
        let relative = safe_relative_path(&entry.relative_path)?;
        let path = match self.locate(&relative)? {
            Some(path) => path,
            None => {
                trace!("Not present: {}", entry.relative_path);
                return Ok(EntryOutcome::SkippedMissing);
            }
        };

        let actual = fingerprint_file(&path)?;
        if !actual.eq_ignore_ascii_case(&entry.content_fingerprint) {
            debug!("Content changed: {}", entry.relative_path);
            return Ok(EntryOutcome::SkippedMismatch);
        }

        let modified = entry.modified_at()?;
        let time = FileTime::from_unix_time(modified.timestamp(), modified.timestamp_subsec_nanos());

        if self.dry_run {
            return Ok(EntryOutcome::WouldUpdate);
        }

        filetime::set_file_times(&path, time, time)?;
        trace!("Set {} to {}", entry.relative_path, entry.modification_time);
        Ok(EntryOutcome::Updated)
    }

    /// Find the regular file at `relative` under the root without following links
    ///
    /// Every component is inspected with `symlink_metadata`, so a link
    /// anywhere below the root (dangling or not) is refused rather than
    /// traversed. Returns `None` when some component does not exist.
    fn locate(&self, relative: &Path) -> Result<Option<PathBuf>> {
        let mut path = self.root.clone();
        let mut leaf = None;

        for component in relative.components() {
            path.push(component);
            let metadata = match fs::symlink_metadata(&path) {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(e.into()),
            };
            if metadata.file_type().is_symlink() {
                return Err(MtimeError::SymlinkInPath(path));
            }
            leaf = Some(metadata);
        }

        match leaf {
            Some(metadata) if metadata.is_file() => Ok(Some(path)),
            _ => Err(MtimeError::NotAFile(path)),
        }
    }

    fn report_progress(&self, entry: &ManifestEntry, processed: usize, total: usize) {
        if let Some(callback) = &self.progress {
            callback(ProgressInfo {
                operation: "Restoring".to_string(),
                current_item: Some(entry.relative_path.clone()),
                processed,
                total: Some(total),
            });
        }
    }
}

/// Restore `manifest` onto `root` with default options
pub fn restore(root: &Path, manifest: &Manifest) -> RestoreReport {
    Restorer::new(root).run(manifest)
}

/// Load a manifest file and restore it onto `root`
///
/// # Errors
///
/// Only manifest loading can fail; per-entry failures are in the report.
pub fn restore_from_file(root: &Path, manifest_path: &Path) -> Result<RestoreReport> {
    let manifest = Manifest::load(manifest_path)?;
    if manifest.is_empty() {
        debug!("Manifest {:?} has no entries", manifest_path);
    }
    Ok(restore(root, &manifest))
}
