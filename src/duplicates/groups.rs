//! Duplicate groups and size bucketing.
//!
//! # Overview
//!
//! Size bucketing is the first phase of duplicate detection: files with
//! different sizes cannot be duplicates, so only buckets with two or more
//! members move on to hashing (or are reported directly in size-only mode).
//!
//! # Example
//!
//! ```
//! use cleanscan::duplicates::group_by_size;
//! use std::path::PathBuf;
//!
//! let files = vec![
//!     (PathBuf::from("/file1.txt"), 1024),
//!     (PathBuf::from("/file2.txt"), 1024),
//!     (PathBuf::from("/file3.txt"), 2048),
//! ];
//!
//! let (buckets, stats) = group_by_size(files, 1);
//!
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.potential_duplicates, 2);
//! assert_eq!(buckets.len(), 1);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};

/// Key a duplicate group is reported under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKey {
    /// Size-only match (`"size:<n>"`)
    Size(u64),
    /// Content match, lowercase hex SHA-256
    Hash(String),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Size(size) => write!(f, "size:{size}"),
            Self::Hash(hex) => f.write_str(hex),
        }
    }
}

impl Serialize for GroupKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Confirmed set of files sharing a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// Grouping key
    pub key: GroupKey,
    /// Size in bytes shared by every member
    pub size: u64,
    /// Member paths, sorted
    pub files: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Create a group; members are sorted so results are reproducible.
    #[must_use]
    pub fn new(key: GroupKey, size: u64, mut files: Vec<PathBuf>) -> Self {
        files.sort();
        Self { key, size, files }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Sum of member sizes.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.size * self.files.len() as u64
    }

    /// Total wasted space (all copies minus one).
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }

    /// Number of duplicate copies (total - 1 original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Whether membership was proven by content hash.
    #[must_use]
    pub fn is_content_match(&self) -> bool {
        matches!(self.key, GroupKey::Hash(_))
    }

    /// Member paths.
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.files
    }

    /// Whether `path` is a member.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.files.iter().any(|p| p == path)
    }
}

/// Statistics from the size phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total number of files processed
    pub total_files: usize,
    /// Total size of all files in bytes
    pub total_size: u64,
    /// Number of unique file sizes (after exclusions)
    pub unique_sizes: usize,
    /// Number of files in buckets of 2+
    pub potential_duplicates: usize,
    /// Number of files eliminated as unique (singleton buckets)
    pub eliminated_unique: usize,
    /// Number of zero-byte files excluded
    pub empty_files: usize,
    /// Number of files below the minimum size
    pub below_min_size: usize,
    /// Number of buckets with 2+ files
    pub duplicate_groups: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated by size grouping.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Bucket `(path, size)` pairs by exact size.
///
/// Zero-byte files are always excluded, as are files smaller than
/// `min_size`. Only buckets with two or more members are returned, keyed by
/// size in ascending order.
///
/// # Example
///
/// ```
/// use cleanscan::duplicates::group_by_size;
/// use std::path::PathBuf;
///
/// let files = vec![
///     (PathBuf::from("/a.txt"), 100),
///     (PathBuf::from("/b.txt"), 100),
///     (PathBuf::from("/c.txt"), 200),
///     (PathBuf::from("/empty1"), 0),
///     (PathBuf::from("/empty2"), 0),
/// ];
///
/// let (buckets, stats) = group_by_size(files, 1);
///
/// assert_eq!(buckets.len(), 1);
/// assert_eq!(buckets[&100].len(), 2);
/// assert_eq!(stats.eliminated_unique, 1);
/// assert_eq!(stats.empty_files, 2);
/// ```
#[must_use]
pub fn group_by_size(
    files: impl IntoIterator<Item = (PathBuf, u64)>,
    min_size: u64,
) -> (BTreeMap<u64, Vec<PathBuf>>, GroupingStats) {
    let mut all: BTreeMap<u64, Vec<PathBuf>> = BTreeMap::new();
    let mut stats = GroupingStats::default();

    for (path, size) in files {
        stats.total_files += 1;
        stats.total_size += size;

        if size == 0 {
            stats.empty_files += 1;
            log::trace!("Empty file excluded: {}", path.display());
            continue;
        }
        if size < min_size {
            stats.below_min_size += 1;
            log::trace!("Below minimum size ({size} < {min_size}): {}", path.display());
            continue;
        }

        all.entry(size).or_default().push(path);
    }

    if stats.empty_files > 0 {
        log::debug!("Excluded {} empty file(s)", stats.empty_files);
    }

    stats.unique_sizes = all.len();

    let buckets: BTreeMap<u64, Vec<PathBuf>> = all
        .into_iter()
        .filter(|(size, files)| {
            if files.len() == 1 {
                stats.eliminated_unique += 1;
                log::trace!("Eliminated unique size {}: {}", size, files[0].display());
                false
            } else {
                stats.potential_duplicates += files.len();
                stats.duplicate_groups += 1;
                log::debug!("Size bucket {} bytes: {} candidates", size, files.len());
                true
            }
        })
        .collect();

    log::info!(
        "Size phase complete: {} files -> {} candidates ({:.1}% eliminated)",
        stats.total_files,
        stats.potential_duplicates,
        stats.elimination_rate()
    );

    (buckets, stats)
}
