//! Manifest data model and on-disk format
//!
//! A manifest is an ordered list of [`ManifestEntry`] records, one per regular
//! file found by a snapshot. It is written once and only read afterwards.
//!
//! ## Wire format
//!
//! Manifests are stored as a pretty-printed JSON array:
//!
//! ```text
//! [
//!     {
//!         "path": "b/c.txt",
//!         "hash": "486ea46224d1bb4fb680f34f7c9ad96a8f24ec88be73ea8e5a6c65260e9cb8a7",
//!         "mod_time": "2024-03-01T12:30:00.123456789Z",
//!         "is_directory": false
//!     }
//! ]
//! ```
//!
//! `mod_time` is always RFC 3339. Snapshots write UTC with as many fractional
//! digits as the filesystem reported; any RFC 3339 offset is accepted on read.

use crate::error::{MtimeError, Result};
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// File name a snapshot is written to when no output path is given
pub const DEFAULT_MANIFEST_NAME: &str = "file_info.json";

/// One file's identity at snapshot time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Path relative to the snapshot root, `/`-separated
    #[serde(rename = "path")]
    pub relative_path: String,
    /// SHA-256 of the full file content, lowercase hex
    #[serde(rename = "hash")]
    pub content_fingerprint: String,
    /// Last-write time as an RFC 3339 timestamp
    #[serde(rename = "mod_time")]
    pub modification_time: String,
    /// Never restored; kept for compatibility with older manifests
    #[serde(default)]
    pub is_directory: bool,
}

impl ManifestEntry {
    /// Build an entry for a regular file
    ///
    /// Fails with [`MtimeError::InvalidTimestamp`] if `modified` cannot be
    /// written as RFC 3339.
    pub fn new(
        relative_path: impl Into<String>,
        content_fingerprint: impl Into<String>,
        modified: SystemTime,
    ) -> Result<Self> {
        Ok(Self {
            relative_path: relative_path.into(),
            content_fingerprint: content_fingerprint.into(),
            modification_time: format_timestamp(modified)?,
            is_directory: false,
        })
    }

    /// Parse the recorded modification time
    pub fn modified_at(&self) -> Result<DateTime<FixedOffset>> {
        parse_timestamp(&self.modification_time)
    }

    /// Join the entry's path onto `root`, refusing anything that would leave it
    pub fn resolve(&self, root: &Path) -> Result<PathBuf> {
        Ok(root.join(safe_relative_path(&self.relative_path)?))
    }
}

/// Ordered collection of manifest entries with unique paths
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Build a manifest, rejecting duplicate paths
    pub fn from_entries(entries: Vec<ManifestEntry>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(entry.relative_path.as_str()) {
                return Err(MtimeError::malformed(format!(
                    "duplicate path '{}'",
                    entry.relative_path
                )));
            }
        }
        Ok(Self { entries })
    }

    /// Entries in walk order
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Iterate over entries in walk order
    pub fn iter(&self) -> std::slice::Iter<'_, ManifestEntry> {
        self.entries.iter()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by its relative path
    pub fn get(&self, relative_path: &str) -> Option<&ManifestEntry> {
        self.entries.iter().find(|e| e.relative_path == relative_path)
    }

    /// Parse a manifest from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<ManifestEntry> =
            serde_json::from_str(json).map_err(|e| MtimeError::malformed(e.to_string()))?;
        Self::from_entries(entries)
    }

    /// Render the manifest as 4-space indented JSON
    pub fn to_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        String::from_utf8(buf).map_err(|e| MtimeError::internal(e.to_string()))
    }

    /// Read and parse a manifest file
    ///
    /// # Errors
    ///
    /// - [`MtimeError::ManifestRead`] if the file cannot be read
    /// - [`MtimeError::MalformedManifest`] if it is not a valid manifest
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|source| MtimeError::ManifestRead {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest = Self::from_json(&json)?;
        debug!("Loaded {} manifest entries from {:?}", manifest.len(), path);
        Ok(manifest)
    }

    /// Write the manifest to `path`, replacing any existing file atomically
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        temp.write_all(json.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| e.error)?;
        set_readable(path)?;

        debug!("Wrote {} manifest entries to {:?}", self.len(), path);
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a ManifestEntry;
    type IntoIter = std::slice::Iter<'a, ManifestEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Temp files are created owner-only; manifests are meant to be shared
#[cfg(unix)]
fn set_readable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o644))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_readable(_path: &Path) -> Result<()> {
    Ok(())
}

/// Canonical timestamp text for a modification time
///
/// Filesystems can store times far outside the RFC 3339 year range; those
/// are rejected instead of being clamped.
pub fn format_timestamp(time: SystemTime) -> Result<String> {
    let out_of_range = |reason: &str| MtimeError::InvalidTimestamp {
        value: format!("{:?}", time),
        reason: reason.to_string(),
    };

    let (secs, nanos) = match time.duration_since(UNIX_EPOCH) {
        Ok(after) => (i64::try_from(after.as_secs()).ok(), after.subsec_nanos()),
        Err(e) => {
            let before = e.duration();
            let secs = i64::try_from(before.as_secs()).ok().map(|s| -s);
            match before.subsec_nanos() {
                0 => (secs, 0),
                n => (secs.and_then(|s| s.checked_sub(1)), 1_000_000_000 - n),
            }
        }
    };

    let secs = secs.ok_or_else(|| out_of_range("seconds overflow"))?;
    let datetime = DateTime::<Utc>::from_timestamp(secs, nanos)
        .ok_or_else(|| out_of_range("outside the representable date range"))?;
    Ok(datetime.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

/// Parse timestamp text written by [`format_timestamp`] (or any RFC 3339 value)
pub fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).map_err(|e| MtimeError::InvalidTimestamp {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Convert a path relative to the snapshot root into manifest form
///
/// Returns `None` if a component is not valid UTF-8 or the path is not a
/// plain relative path.
pub fn to_manifest_path(relative: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Validate a manifest path and convert it to a platform path
///
/// Only plain names are allowed: no root, no drive prefix, no `..`. Empty and
/// `.` segments are dropped. The result always stays under whatever root it is
/// joined to.
pub fn safe_relative_path(raw: &str) -> Result<PathBuf> {
    let escapes = || MtimeError::PathEscapesRoot(raw.to_string());

    if raw.starts_with('/') {
        return Err(escapes());
    }

    let mut out = PathBuf::new();
    for segment in raw.split('/') {
        for component in Path::new(segment).components() {
            match component {
                Component::Normal(part) => out.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(escapes())
                }
            }
        }
    }

    if out.as_os_str().is_empty() {
        return Err(escapes());
    }
    Ok(out)
}
