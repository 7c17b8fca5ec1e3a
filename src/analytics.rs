//! Summary statistics over an index.
//!
//! Everything is computed from the index alone; no filesystem access.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::index::Index;
use crate::scanner::{epoch_seconds, Entry};
use crate::view::presets::FileCategory;

const DAY: i64 = 24 * 60 * 60;

/// Thresholds for the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Files strictly larger than this many bytes are "large".
    pub large_file_threshold: u64,
    /// Files not modified for more than this many whole days are "old".
    pub old_file_days: u64,
    /// Maximum entries in the large and old file lists.
    pub top_n: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            large_file_threshold: 10 * 1024 * 1024,
            old_file_days: 365,
            top_n: 20,
        }
    }
}

/// Count and volume of one group of files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtensionStats {
    /// Number of files
    pub count: usize,
    /// Sum of readable sizes
    pub size: u64,
}

/// A file worth pointing out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    /// Absolute path
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
    /// Modification time for display
    pub modified: String,
}

impl FileSummary {
    fn from_entry(entry: &Entry) -> Self {
        Self {
            path: entry.path.clone(),
            size: entry.size.unwrap_or(0),
            modified: entry.modified_display.clone(),
        }
    }
}

/// Statistics over one index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    /// Scanned root
    pub root: PathBuf,
    /// Number of files
    pub files: usize,
    /// Number of directories
    pub directories: usize,
    /// Sum of readable file sizes
    pub total_size: u64,
    /// Entries whose metadata could not be read
    pub unreadable: usize,
    /// Per extension (lowercase with dot, `""` for none)
    pub by_extension: BTreeMap<String, ExtensionStats>,
    /// Per category
    pub by_category: BTreeMap<FileCategory, ExtensionStats>,
    /// Number of large files
    pub large_file_count: usize,
    /// Largest files above the threshold, biggest first
    pub large_files: Vec<FileSummary>,
    /// Number of old files
    pub old_file_count: usize,
    /// Files not modified within the window, oldest first
    pub old_files: Vec<FileSummary>,
}

impl IndexReport {
    /// Build a report for `index` as of `now`.
    #[must_use]
    pub fn from_index(index: &Index, config: &ReportConfig, now: SystemTime) -> Self {
        let now = epoch_seconds(now);
        let mut by_extension: BTreeMap<String, ExtensionStats> = BTreeMap::new();
        let mut by_category: BTreeMap<FileCategory, ExtensionStats> = BTreeMap::new();
        let mut large: Vec<&Entry> = Vec::new();
        let mut old: Vec<(i64, &Entry)> = Vec::new();
        let mut total_size = 0u64;

        for entry in index.files() {
            let size = entry.size.unwrap_or(0);
            total_size += size;

            let ext = entry.extension().unwrap_or("").to_string();
            let slot = by_extension.entry(ext).or_default();
            slot.count += 1;
            slot.size += size;

            let slot = by_category.entry(FileCategory::of(&entry.name)).or_default();
            slot.count += 1;
            slot.size += size;

            if entry.size.is_some_and(|s| s > config.large_file_threshold) {
                large.push(entry);
            }
            if let Some(modified) = entry.modified {
                let age_days = now.saturating_sub(modified) / DAY;
                if age_days > 0 && age_days.unsigned_abs() > config.old_file_days {
                    old.push((modified, entry));
                }
            }
        }

        large.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));
        old.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.path.cmp(&b.1.path)));

        Self {
            root: index.root().to_path_buf(),
            files: index.stats().files,
            directories: index.stats().directories,
            total_size,
            unreadable: index.stats().unreadable_entries,
            by_extension,
            by_category,
            large_file_count: large.len(),
            large_files: large
                .into_iter()
                .take(config.top_n)
                .map(FileSummary::from_entry)
                .collect(),
            old_file_count: old.len(),
            old_files: old
                .into_iter()
                .take(config.top_n)
                .map(|(_, e)| FileSummary::from_entry(e))
                .collect(),
        }
    }

    /// Extensions ordered by total size, largest first.
    #[must_use]
    pub fn top_extensions(&self, n: usize) -> Vec<(&str, ExtensionStats)> {
        let mut list: Vec<(&str, ExtensionStats)> = self
            .by_extension
            .iter()
            .map(|(ext, stats)| (ext.as_str(), *stats))
            .collect();
        list.sort_by(|a, b| b.1.size.cmp(&a.1.size).then_with(|| a.0.cmp(b.0)));
        list.truncate(n);
        list
    }
}
