//! # mtimekeeper - Content-addressed modification time snapshots
//!
//! Copying, archiving, checking out or rebuilding a directory tree throws away
//! the files' original modification times. Build systems and caches then see
//! every file as new and redo work they already did.
//!
//! mtimekeeper records each file's relative path, SHA-256 content fingerprint
//! and modification time in a JSON manifest. Later, against a copy of the tree
//! anywhere on disk, it puts the recorded times back on every file whose
//! content is provably unchanged.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mtimekeeper::{restore, snapshot};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Before the tree is copied or rebuilt
//! let report = snapshot(Path::new("./project"))?;
//! report.manifest.save(Path::new("file_info.json"))?;
//!
//! // Later, against the new copy
//! let manifest = mtimekeeper::Manifest::load(Path::new("file_info.json"))?;
//! let result = restore(Path::new("./project-copy"), &manifest);
//! println!("Updated {} of {} files", result.updated_count, result.total_entries);
//! # Ok(())
//! # }
//! ```
//!
//! ## Guarantees
//!
//! - A timestamp is only applied when the file's current fingerprint equals
//!   the recorded one; changed files keep whatever time they have
//! - File content is never written, and files are never created or deleted
//! - Manifest paths cannot resolve outside the target root
//! - Symbolic links in the target tree are never followed
//! - Every entry is independent: one bad file never stops the rest of a run
//! - Restoring the same manifest twice gives the same result
//!
//! ## Error Handling
//!
//! Operations that can fail as a whole return `Result<T, MtimeError>`:
//! walking the snapshot root and loading a manifest. Problems with individual
//! files are returned inside [`SnapshotReport`] and [`RestoreReport`].
//!
//! ## Module Organization
//!
//! - [`fingerprint`]: streaming SHA-256 content fingerprints
//! - [`manifest`]: manifest data model, JSON format, path safety
//! - [`snapshot`]: directory walk producing a manifest
//! - [`restore`]: fingerprint-checked timestamp restoration
//! - [`types`]: reports, per-entry outcomes and progress types
//! - [`error`]: error types and handling

pub mod error;
pub mod fingerprint;
pub mod manifest;
pub mod restore;
pub mod snapshot;
pub mod types;

// Re-export main types for convenience
pub use error::{MtimeError, Result};
pub use manifest::{Manifest, ManifestEntry, DEFAULT_MANIFEST_NAME};
pub use restore::{restore, restore_from_file, Restorer};
pub use snapshot::{snapshot, Snapshotter};
pub use types::*;
