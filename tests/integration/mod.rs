//! Snapshot/restore scenarios against real directory trees
//!
//! Each test builds a source tree with known old timestamps, snapshots it,
//! recreates the tree elsewhere with fresh timestamps, and checks what the
//! restore does.

use ::mtimekeeper::*;
use filetime::FileTime;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const T1: i64 = 1_100_000_000;
pub const T2: i64 = 1_200_000_000;

/// Source and target trees for snapshot/restore scenarios
pub struct TreeHarness {
    pub source: TempDir,
    pub target: TempDir,
}

impl TreeHarness {
    pub fn new() -> Self {
        Self {
            source: TempDir::new().unwrap(),
            target: TempDir::new().unwrap(),
        }
    }

    /// Write a file into the source tree with a fixed mtime
    pub fn add_source_file(&self, relative: &str, content: &str, mtime_secs: i64) -> anyhow::Result<PathBuf> {
        let path = write_file(self.source.path(), relative, content)?;
        filetime::set_file_mtime(&path, FileTime::from_unix_time(mtime_secs, 0))?;
        Ok(path)
    }

    /// Write a file into the target tree with whatever mtime the OS gives it
    pub fn add_target_file(&self, relative: &str, content: &str) -> anyhow::Result<PathBuf> {
        write_file(self.target.path(), relative, content)
    }

    /// Recreate every source file in the target with fresh timestamps
    pub fn copy_source_to_target(&self) -> anyhow::Result<usize> {
        let mut copied = 0;
        for entry in walkdir::WalkDir::new(self.source.path()) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(self.source.path())?;
            let dest = self.target.path().join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&dest, fs::read(entry.path())?)?;
            copied += 1;
        }
        Ok(copied)
    }

    pub fn target_path(&self, relative: &str) -> PathBuf {
        self.target.path().join(relative)
    }
}

pub fn write_file(root: &Path, relative: &str, content: &str) -> anyhow::Result<PathBuf> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, content)?;
    Ok(path)
}

pub fn mtime_secs(path: &Path) -> i64 {
    FileTime::from_last_modification_time(&fs::metadata(path).unwrap()).unix_seconds()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn basic_tree() -> TreeHarness {
        let harness = TreeHarness::new();
        harness.add_source_file("a.txt", "hello", T1).unwrap();
        harness.add_source_file("b/c.txt", "world", T2).unwrap();
        harness
    }

    #[test]
    #[traced_test]
    fn test_basic_restore() {
        let harness = basic_tree();
        let snap = snapshot(harness.source.path()).unwrap();
        assert_eq!(snap.files_processed(), 2);

        assert_eq!(harness.copy_source_to_target().unwrap(), 2);
        assert_ne!(mtime_secs(&harness.target_path("a.txt")), T1);

        let report = restore(harness.target.path(), &snap.manifest);
        assert_eq!(report.total_entries, 2);
        assert_eq!(report.updated_count, 2);
        assert_eq!(mtime_secs(&harness.target_path("a.txt")), T1);
        assert_eq!(mtime_secs(&harness.target_path("b/c.txt")), T2);
    }

    #[test]
    fn test_content_drift() {
        let harness = basic_tree();
        let snap = snapshot(harness.source.path()).unwrap();

        harness.copy_source_to_target().unwrap();
        harness.add_target_file("b/c.txt", "world, edited").unwrap();
        let drifted_before = mtime_secs(&harness.target_path("b/c.txt"));

        let report = restore(harness.target.path(), &snap.manifest);
        assert_eq!(report.updated_count, 1);
        assert_eq!(report.total_entries, 2);
        assert_eq!(report.outcome("b/c.txt"), Some(&EntryOutcome::SkippedMismatch));
        assert_eq!(mtime_secs(&harness.target_path("a.txt")), T1);
        assert_eq!(mtime_secs(&harness.target_path("b/c.txt")), drifted_before);
    }

    #[test]
    fn test_missing_file() {
        let harness = basic_tree();
        harness.add_source_file("d.txt", "gone later", T1).unwrap();
        let snap = snapshot(harness.source.path()).unwrap();

        harness.add_target_file("a.txt", "hello").unwrap();
        harness.add_target_file("b/c.txt", "world").unwrap();

        let report = restore(harness.target.path(), &snap.manifest);
        assert_eq!(report.total_entries, 3);
        assert_eq!(report.updated_count, 2);
        assert_eq!(report.skipped_missing(), 1);
        assert_eq!(report.errors().count(), 0);
        assert!(!harness.target_path("d.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_symbolic_link_not_recorded() {
        let harness = basic_tree();
        std::os::unix::fs::symlink(
            harness.source.path().join("a.txt"),
            harness.source.path().join("link-to-a"),
        )
        .unwrap();

        let snap = snapshot(harness.source.path()).unwrap();
        assert!(snap.manifest.get("link-to-a").is_none());
        assert!(snap.manifest.get("a.txt").is_some());
        assert!(snap.manifest.get("b/c.txt").is_some());
        assert_eq!(snap.symlinks_skipped(), 1);
    }

    #[test]
    fn test_round_trip_same_tree() {
        let harness = basic_tree();
        harness.add_source_file("deep/er/still/file.bin", "\u{0}\u{1}\u{2}", T2).unwrap();
        let snap = snapshot(harness.source.path()).unwrap();

        let report = restore(harness.source.path(), &snap.manifest);
        assert_eq!(report.updated_count, snap.files_processed());
        assert_eq!(report.skipped_directories(), 0);
    }

    #[test]
    fn test_idempotent_restore() {
        let harness = basic_tree();
        let snap = snapshot(harness.source.path()).unwrap();
        harness.copy_source_to_target().unwrap();

        let first = restore(harness.target.path(), &snap.manifest);
        let times_after_first = (
            mtime_secs(&harness.target_path("a.txt")),
            mtime_secs(&harness.target_path("b/c.txt")),
        );
        let second = restore(harness.target.path(), &snap.manifest);

        assert_eq!(first.updated_count, second.updated_count);
        assert_eq!(first.entries, second.entries);
        assert_eq!(
            times_after_first,
            (
                mtime_secs(&harness.target_path("a.txt")),
                mtime_secs(&harness.target_path("b/c.txt")),
            )
        );
    }

    #[test]
    fn test_restore_never_changes_content() {
        let harness = basic_tree();
        let snap = snapshot(harness.source.path()).unwrap();
        harness.copy_source_to_target().unwrap();

        let before = snapshot(harness.target.path()).unwrap();
        restore(harness.target.path(), &snap.manifest);
        let after = snapshot(harness.target.path()).unwrap();

        for (b, a) in before.manifest.iter().zip(after.manifest.iter()) {
            assert_eq!(b.relative_path, a.relative_path);
            assert_eq!(b.content_fingerprint, a.content_fingerprint);
        }
        // And the second snapshot now records the original times
        assert_eq!(after.manifest, snap.manifest);
    }

    #[test]
    fn test_manifest_file_round_trip() {
        let harness = basic_tree();
        let snap = snapshot(harness.source.path()).unwrap();
        let manifest_dir = TempDir::new().unwrap();
        let manifest_path = manifest_dir.path().join(DEFAULT_MANIFEST_NAME);
        snap.manifest.save(&manifest_path).unwrap();

        harness.copy_source_to_target().unwrap();
        let report = restore_from_file(harness.target.path(), &manifest_path).unwrap();
        assert_eq!(report.updated_count, 2);
    }

    #[test]
    fn test_restore_into_moved_subtree_only_matches_paths() {
        // Same content under a different path is not a match
        let harness = basic_tree();
        let snap = snapshot(harness.source.path()).unwrap();
        harness.add_target_file("renamed.txt", "hello").unwrap();

        let report = restore(harness.target.path(), &snap.manifest);
        assert_eq!(report.updated_count, 0);
        assert_eq!(report.skipped_missing(), 2);
        assert_ne!(mtime_secs(&harness.target_path("renamed.txt")), T1);
    }

    #[test]
    fn test_parallel_restore_matches_sequential() {
        let harness = TreeHarness::new();
        for i in 0..50 {
            harness
                .add_source_file(&format!("dir{}/file{}.txt", i % 5, i), &format!("content {i}"), T1 + i)
                .unwrap();
        }
        let snap = snapshot(harness.source.path()).unwrap();
        harness.copy_source_to_target().unwrap();
        harness.add_target_file("dir0/file0.txt", "drifted").unwrap();

        let report = Restorer::new(harness.target.path()).parallel(true).run(&snap.manifest);
        assert_eq!(report.total_entries, 50);
        assert_eq!(report.updated_count, 49);
        let paths: Vec<_> = report.entries.iter().map(|e| e.relative_path.clone()).collect();
        let manifest_paths: Vec<_> = snap.manifest.iter().map(|e| e.relative_path.clone()).collect();
        assert_eq!(paths, manifest_paths);
        assert_eq!(mtime_secs(&harness.target_path("dir3/file13.txt")), T1 + 13);
    }
}
