//! JSON documents for each command.
//!
//! Every document carries the exit code so scripts can branch on one value.
//!
//! # Duplicate schema
//!
//! ```json
//! {
//!   "duplicates": [
//!     {
//!       "key": "9f86d081884c7d65...",
//!       "size": 1024,
//!       "files": ["/path/to/file1.txt", "/path/to/file2.txt"]
//!     }
//!   ],
//!   "plans": null,
//!   "removals": null,
//!   "summary": {
//!     "input_paths": 100,
//!     "duplicate_groups": 5,
//!     "duplicate_files": 10,
//!     "reclaimable_space": 51200,
//!     "duration_ms": 1234,
//!     "exit_code": 0,
//!     "exit_code_name": "CS000"
//!   }
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::analytics::IndexReport;
use crate::duplicates::{DuplicateGroup, DuplicateMap, FinderStats, GroupPlan};
use crate::error::ExitCode;
use crate::index::ScanStats;
use crate::view::{ViewFilter, ViewRow, VisibleSet};

/// How a scan went.
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummaryJson {
    /// Files indexed
    pub files: usize,
    /// Directories indexed
    pub directories: usize,
    /// Entries with unreadable metadata
    pub unreadable_entries: usize,
    /// Directories whose contents were skipped
    pub skipped_directories: usize,
    /// Per-item problems, as messages
    pub errors: Vec<String>,
    /// Wall time in milliseconds
    pub duration_ms: u64,
}

impl ScanSummaryJson {
    /// Summarize `stats`.
    #[must_use]
    pub fn from_stats(stats: &ScanStats) -> Self {
        Self {
            files: stats.files,
            directories: stats.directories,
            unreadable_entries: stats.unreadable_entries,
            skipped_directories: stats.skipped_directories,
            errors: stats.errors.iter().map(ToString::to_string).collect(),
            duration_ms: stats.duration.as_millis() as u64,
        }
    }
}

/// `index` output.
#[derive(Debug, Clone, Serialize)]
pub struct IndexJson<'a> {
    /// Analytics
    pub report: &'a IndexReport,
    /// Scan statistics
    pub scan: ScanSummaryJson,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "CS000")
    pub exit_code_name: &'static str,
}

impl<'a> IndexJson<'a> {
    /// Build the document.
    #[must_use]
    pub fn new(report: &'a IndexReport, stats: &ScanStats, exit_code: ExitCode) -> Self {
        Self {
            report,
            scan: ScanSummaryJson::from_stats(stats),
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix(),
        }
    }
}

/// `search` output.
#[derive(Debug, Clone, Serialize)]
pub struct SearchJson<'a> {
    /// Scanned root
    pub root: &'a Path,
    /// Filter that produced the view
    pub filter: &'a ViewFilter,
    /// Visible rows in tree order
    pub rows: &'a [ViewRow],
    /// Visible files
    pub file_count: usize,
    /// Scan statistics
    pub scan: ScanSummaryJson,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name
    pub exit_code_name: &'static str,
}

impl<'a> SearchJson<'a> {
    /// Build the document.
    #[must_use]
    pub fn new(
        root: &'a Path,
        filter: &'a ViewFilter,
        view: &'a VisibleSet,
        stats: &ScanStats,
        exit_code: ExitCode,
    ) -> Self {
        Self {
            root,
            filter,
            rows: view.rows(),
            file_count: view.file_count(),
            scan: ScanSummaryJson::from_stats(stats),
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix(),
        }
    }
}

/// `lookup` output.
#[derive(Debug, Clone, Serialize)]
pub struct LookupJson<'a> {
    /// Term as given
    pub term: &'a str,
    /// Matching paths, sorted
    pub matches: Vec<&'a Path>,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name
    pub exit_code_name: &'static str,
}

impl<'a> LookupJson<'a> {
    /// Build the document.
    #[must_use]
    pub fn new(term: &'a str, matches: Vec<&'a Path>, exit_code: ExitCode) -> Self {
        Self {
            term,
            matches,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix(),
        }
    }
}

/// Summary of a duplicate search.
#[derive(Debug, Clone, Serialize)]
pub struct DupesSummaryJson {
    /// Distinct input paths
    pub input_paths: usize,
    /// Files that took part in size grouping
    pub sized_files: usize,
    /// Files dropped because their size was unique
    pub eliminated_by_size: usize,
    /// Files hashed
    pub hashed_files: usize,
    /// Files that could not be examined
    pub skipped_files: usize,
    /// Confirmed groups
    pub duplicate_groups: usize,
    /// Copies beyond the first in every group
    pub duplicate_files: usize,
    /// Bytes freed by keeping one copy per group
    pub reclaimable_space: u64,
    /// Wall time in milliseconds
    pub duration_ms: u64,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name
    pub exit_code_name: &'static str,
}

impl DupesSummaryJson {
    fn from_stats(stats: &FinderStats, exit_code: ExitCode) -> Self {
        Self {
            input_paths: stats.input_paths,
            sized_files: stats.grouping.total_files,
            eliminated_by_size: stats.grouping.eliminated_unique,
            hashed_files: stats.hashed_files,
            skipped_files: stats.unreadable_files + stats.failed_hashes,
            duplicate_groups: stats.duplicate_groups,
            duplicate_files: stats.duplicate_files,
            reclaimable_space: stats.reclaimable_space,
            duration_ms: stats.duration.as_millis() as u64,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix(),
        }
    }
}

/// `dupes` output.
#[derive(Debug, Clone, Serialize)]
pub struct DupesJson<'a> {
    /// Groups ordered by key
    pub duplicates: Vec<&'a DuplicateGroup>,
    /// Removal plan, when a keep strategy was given
    pub plans: Option<&'a [GroupPlan]>,
    /// Every path the plan removes, flattened
    pub removals: Option<Vec<PathBuf>>,
    /// Search statistics
    pub summary: DupesSummaryJson,
}

impl<'a> DupesJson<'a> {
    /// Build the document.
    #[must_use]
    pub fn new(
        groups: &'a DuplicateMap,
        stats: &FinderStats,
        plans: Option<&'a [GroupPlan]>,
        exit_code: ExitCode,
    ) -> Self {
        Self {
            duplicates: groups.values().collect(),
            plans,
            removals: plans.map(removal_list),
            summary: DupesSummaryJson::from_stats(stats, exit_code),
        }
    }
}

/// Paths of a plan's removals, flattened, for scripts that only need a list.
#[must_use]
pub fn removal_list(plans: &[GroupPlan]) -> Vec<PathBuf> {
    plans.iter().flat_map(|p| p.remove.iter().cloned()).collect()
}
