//! Scanner module: directory traversal and content hashing.
//!
//! This module provides:
//! - [`Scanner`]: depth-first walk of a root that records every file and
//!   directory as an [`Entry`] and builds an [`Index`](crate::index::Index)
//! - [`Hasher`]: streaming SHA-256 of file contents
//!
//! # Error taxonomy
//!
//! Per-item problems never abort a scan. They are captured as [`ItemError`]
//! values inside the resulting index's stats:
//! - metadata that cannot be read leaves the entry in place with `size`,
//!   `modified` unset and `modified_display` = [`UNKNOWN_MODIFIED`];
//! - a directory that cannot be listed is recorded, its contents skipped.
//!
//! Only whole-operation failures (missing root, unreadable root) and
//! cancellation surface as [`ScanError`].
//!
//! # Example
//!
//! ```no_run
//! use cleanscan::scanner::{ScanConfig, Scanner};
//! use std::path::Path;
//!
//! let index = Scanner::new(ScanConfig::default())
//!     .scan(Path::new("."))
//!     .expect("scan failed");
//!
//! for path in index.lookup_substring("report") {
//!     println!("{}", path.display());
//! }
//! ```

pub mod hasher;
pub mod walker;

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Local};

pub use hasher::{hash_to_hex, hex_to_hash, Hash, Hasher, DEFAULT_CHUNK_SIZE};
pub use walker::Scanner;

/// Display value for a modification time that could not be read.
pub const UNKNOWN_MODIFIED: &str = "unknown";

/// Format used for [`Entry::modified_display`].
pub const MODIFIED_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Position of an entry inside its index.
///
/// Ids are dense (`0..index.len()`) and only meaningful for the index that
/// issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub(crate) usize);

impl EntryId {
    /// Slot number inside the index arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// One filesystem object captured by a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Absolute path, unique within an index
    pub path: PathBuf,
    /// Base name as found on disk
    pub name: String,
    /// Lowercased base name, used for every match
    pub name_lower: String,
    /// Whether this is a directory
    pub is_dir: bool,
    /// Size in bytes, `None` when metadata could not be read
    pub size: Option<u64>,
    /// Modification time in seconds since the Unix epoch, `None` when unreadable
    pub modified: Option<i64>,
    /// Precomputed local time string or [`UNKNOWN_MODIFIED`]
    pub modified_display: String,
}

impl Entry {
    /// Create an entry with readable metadata.
    ///
    /// # Arguments
    ///
    /// * `path` - Absolute path of the object
    /// * `is_dir` - Whether the object is a directory
    /// * `size` - Size in bytes, if known
    /// * `modified` - Modification time, if known
    #[must_use]
    pub fn new(
        path: PathBuf,
        is_dir: bool,
        size: Option<u64>,
        modified: Option<SystemTime>,
    ) -> Self {
        let name = base_name(&path);
        let modified = modified.map(epoch_seconds);
        Self {
            name_lower: name.to_lowercase(),
            name,
            is_dir,
            size,
            modified_display: display_time(modified),
            modified,
            path,
        }
    }

    /// Create an entry whose metadata could not be read.
    #[must_use]
    pub fn unreadable(path: PathBuf, is_dir: bool) -> Self {
        Self::new(path, is_dir, None, None)
    }

    /// Create an entry from an epoch timestamp, mostly for synthetic indexes.
    #[must_use]
    pub fn with_timestamp(path: PathBuf, is_dir: bool, size: Option<u64>, modified: i64) -> Self {
        let mut entry = Self::new(path, is_dir, size, None);
        entry.modified = Some(modified);
        entry.modified_display = display_time(Some(modified));
        entry
    }

    /// Whether this entry is a file (anything that is not a directory).
    #[must_use]
    pub fn is_file(&self) -> bool {
        !self.is_dir
    }

    /// Lowercased extension including the leading dot (`".pdf"`).
    ///
    /// Hidden names like `.bashrc` have no extension.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        extension_of(&self.name_lower)
    }
}

/// Lowercased extension with leading dot for an already-lowercased name.
pub(crate) fn extension_of(name_lower: &str) -> Option<&str> {
    match name_lower.rfind('.') {
        Some(0) | None => None,
        Some(pos) if pos + 1 == name_lower.len() => None,
        Some(pos) => Some(&name_lower[pos..]),
    }
}

fn base_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.to_string_lossy().into_owned(),
        |n| n.to_string_lossy().into_owned(),
    )
}

/// Seconds since the Unix epoch; negative for times before it.
#[must_use]
pub fn epoch_seconds(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_secs()).unwrap_or(i64::MAX),
        Err(e) => -i64::try_from(e.duration().as_secs()).unwrap_or(i64::MAX),
    }
}

fn display_time(modified: Option<i64>) -> String {
    modified
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map_or_else(
            || UNKNOWN_MODIFIED.to_string(),
            |utc| utc.with_timezone(&Local).format(MODIFIED_FORMAT).to_string(),
        )
}

/// Traversal options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanConfig {
    /// Follow symbolic links during traversal.
    /// Loops are detected and reported as item errors.
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,
}

impl ScanConfig {
    /// Set symlink following.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Set hidden-entry skipping.
    #[must_use]
    pub fn with_skip_hidden(mut self, skip: bool) -> Self {
        self.skip_hidden = skip;
        self
    }
}

/// A problem with a single item. Recorded, never propagated.
#[derive(thiserror::Error, Debug)]
pub enum ItemError {
    /// Permission was denied reading an entry's metadata.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The entry disappeared between listing and stat.
    #[error("Path vanished during scan: {0}")]
    NotFound(PathBuf),

    /// Metadata could not be read for another reason.
    #[error("Cannot read metadata for {path}: {source}")]
    Metadata {
        /// Entry whose metadata failed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A directory could not be listed; its contents are missing from the index.
    #[error("Cannot list directory {path}: {source}")]
    DirectoryUnreadable {
        /// Directory that was skipped
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A symlink cycle was detected while following links.
    #[error("Symlink loop at {0}")]
    Loop(PathBuf),
}

impl ItemError {
    /// Path the error is about.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::PermissionDenied(p) | Self::NotFound(p) | Self::Loop(p) => p,
            Self::Metadata { path, .. } | Self::DirectoryUnreadable { path, .. } => path,
        }
    }

    /// Classify a metadata failure for `path`.
    #[must_use]
    pub fn from_metadata(path: PathBuf, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            _ => Self::Metadata { path, source },
        }
    }
}

/// A scan that produced no usable index.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// The root does not exist.
    #[error("Path not found: {0}")]
    RootNotFound(PathBuf),

    /// The root exists but is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The root itself could not be read or listed.
    #[error("Cannot read {path}: {source}")]
    RootUnreadable {
        /// The scan root
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The scan was cancelled; no index was produced.
    #[error("Scan interrupted")]
    Interrupted,
}

/// Errors while hashing a single file.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Another I/O error while reading.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Hashing stopped because cancellation was requested.
    #[error("Hashing interrupted: {0}")]
    Interrupted(PathBuf),
}

impl HashError {
    /// Classify an I/O failure for `path`.
    #[must_use]
    pub fn from_io(path: &Path, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}
