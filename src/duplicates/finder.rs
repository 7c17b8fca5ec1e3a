//! Two-phase duplicate finder.
//!
//! # Overview
//!
//! 1. **Size phase** (0-20% progress): read the size of every input path,
//!    drop empty, too small and unreadable files, bucket the rest by size.
//! 2. **Grouping phase** (20-100%): in size-only mode every bucket of two or
//!    more files is a group. Otherwise every candidate is hashed with
//!    SHA-256 on a bounded thread pool and files are grouped by digest within
//!    their bucket.
//!
//! Groups are streamed to the progress callback as soon as they are
//! confirmed and also returned in the final map. The callback's
//! `on_complete` fires exactly once however the run ends.
//!
//! # Example
//!
//! ```no_run
//! use cleanscan::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::PathBuf;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default().with_io_threads(4));
//! let paths = vec![PathBuf::from("a.bin"), PathBuf::from("b.bin")];
//! let (groups, stats) = finder.find_duplicates(&paths, true).unwrap();
//!
//! println!("{} groups, {} bytes reclaimable", groups.len(), stats.reclaimable_space);
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use rayon::prelude::*;

use super::groups::{group_by_size, DuplicateGroup, GroupKey, GroupingStats};
use crate::index::Index;
use crate::progress::{ProgressCallback, ProgressTracker};
use crate::scanner::{hash_to_hex, Hash, HashError, Hasher, DEFAULT_CHUNK_SIZE};
use crate::signal::CancelFlag;

/// End of the size phase in the overall percentage.
const SIZE_PHASE_END: u8 = 20;

/// Final result: groups ordered by key.
pub type DuplicateMap = BTreeMap<GroupKey, DuplicateGroup>;

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of I/O threads for parallel hashing.
    /// Default is 4 to prevent disk thrashing.
    pub io_threads: usize,
    /// Files smaller than this are ignored. Empty files are always ignored.
    pub min_size: u64,
    /// Read size while hashing.
    pub hash_chunk_size: usize,
    /// Optional cancel flag, polled per file and per chunk.
    pub cancel: Option<CancelFlag>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("io_threads", &self.io_threads)
            .field("min_size", &self.min_size)
            .field("hash_chunk_size", &self.hash_chunk_size)
            .field("cancel", &self.cancel)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            io_threads: 4,
            min_size: 1,
            hash_chunk_size: DEFAULT_CHUNK_SIZE,
            cancel: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the I/O thread count (at least one).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the minimum file size considered.
    #[must_use]
    pub fn with_min_size(mut self, min_size: u64) -> Self {
        self.min_size = min_size;
        self
    }

    /// Set the hashing read size.
    #[must_use]
    pub fn with_hash_chunk_size(mut self, chunk_size: usize) -> Self {
        self.hash_chunk_size = chunk_size;
        self
    }

    /// Set the cancel flag.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
    }
}

/// Statistics from one duplicate search.
#[derive(Debug, Default)]
pub struct FinderStats {
    /// Distinct input paths
    pub input_paths: usize,
    /// Paths skipped because their metadata could not be read
    pub unreadable_files: usize,
    /// Paths skipped because they are not regular files
    pub non_files: usize,
    /// Size phase statistics
    pub grouping: GroupingStats,
    /// Files successfully hashed
    pub hashed_files: usize,
    /// Files that failed to hash and were left out
    pub failed_hashes: usize,
    /// Hash failures, in no particular order
    pub errors: Vec<HashError>,
    /// Groups in the result
    pub duplicate_groups: usize,
    /// Copies beyond the first in every group
    pub duplicate_files: usize,
    /// Bytes freed by keeping one copy per group
    pub reclaimable_space: u64,
    /// Wall time
    pub duration: Duration,
}

impl FinderStats {
    /// Whether some inputs could not be examined.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.unreadable_files > 0 || self.failed_hashes > 0
    }

    fn record_groups(&mut self, groups: &DuplicateMap) {
        self.duplicate_groups = groups.len();
        self.duplicate_files = groups.values().map(DuplicateGroup::duplicate_count).sum();
        self.reclaimable_space = groups.values().map(DuplicateGroup::wasted_space).sum();
    }
}

/// Errors that end a duplicate search without a result.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The search was cancelled.
    #[error("Duplicate search interrupted")]
    Interrupted,

    /// The hashing thread pool could not be created.
    #[error("Failed to start hashing threads: {0}")]
    ThreadPool(String),
}

/// Calls `on_complete` when dropped, so every exit path signals completion.
struct CompletionGuard<'a>(Option<&'a dyn ProgressCallback>);

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        if let Some(callback) = self.0 {
            callback.on_complete();
        }
    }
}

/// Duplicate finder.
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Hasher,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let mut hasher = Hasher::new().with_chunk_size(config.hash_chunk_size);
        if let Some(ref flag) = config.cancel {
            hasher = hasher.with_cancel_flag(flag.clone());
        }
        Self { config, hasher }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Find duplicates among `paths`.
    ///
    /// With `compare_content` false, same-size files are reported as
    /// duplicates without reading them. Duplicate input paths are
    /// considered once.
    ///
    /// # Errors
    ///
    /// - [`FinderError::Interrupted`] when cancelled
    /// - [`FinderError::ThreadPool`] when hashing threads cannot start; this
    ///   is also reported through `on_diagnostic`
    pub fn find_duplicates(
        &self,
        paths: &[PathBuf],
        compare_content: bool,
    ) -> Result<(DuplicateMap, FinderStats), FinderError> {
        let callback = self.config.progress_callback.as_deref();
        let _complete = CompletionGuard(callback);

        let result = self.run(paths, compare_content);
        match result {
            Err(FinderError::ThreadPool(ref msg)) => {
                log::error!("Duplicate search failed: {msg}");
                if let Some(cb) = callback {
                    cb.on_diagnostic(msg);
                }
            }
            Err(FinderError::Interrupted) => log::info!("Duplicate search interrupted"),
            Ok(_) => {}
        }
        result
    }

    /// Find duplicates among every file of `index`.
    ///
    /// # Errors
    ///
    /// Same as [`find_duplicates`](Self::find_duplicates).
    pub fn find_duplicates_in_index(
        &self,
        index: &Index,
        compare_content: bool,
    ) -> Result<(DuplicateMap, FinderStats), FinderError> {
        self.find_duplicates(&index.file_paths(), compare_content)
    }

    fn run(
        &self,
        paths: &[PathBuf],
        compare_content: bool,
    ) -> Result<(DuplicateMap, FinderStats), FinderError> {
        let started = Instant::now();
        let tracker = ProgressTracker::new();
        let mut stats = FinderStats::default();

        let (buckets, grouping) = self.size_phase(paths, &tracker, &mut stats)?;
        stats.grouping = grouping;

        let groups = if compare_content {
            self.hash_phase(buckets, &tracker, &mut stats)?
        } else {
            self.size_only_groups(buckets)
        };

        stats.record_groups(&groups);
        stats.duration = started.elapsed();
        log::info!(
            "Found {} duplicate groups ({} redundant files) in {:.2?}",
            stats.duplicate_groups,
            stats.duplicate_files,
            stats.duration
        );
        self.report_message(&tracker, 100, &format!("Found {} duplicate groups", groups.len()));
        Ok((groups, stats))
    }

    /// Phase 1: read sizes and bucket.
    fn size_phase(
        &self,
        paths: &[PathBuf],
        tracker: &ProgressTracker,
        stats: &mut FinderStats,
    ) -> Result<(BTreeMap<u64, Vec<PathBuf>>, GroupingStats), FinderError> {
        let mut seen = HashSet::with_capacity(paths.len());
        let unique: Vec<&PathBuf> = paths.iter().filter(|p| seen.insert(*p)).collect();
        stats.input_paths = unique.len();
        let total = unique.len();

        self.report_message(tracker, 0, &format!("Checking sizes of {total} files"));

        let mut sized = Vec::with_capacity(total);
        for (i, path) in unique.into_iter().enumerate() {
            if self.config.is_cancelled() {
                return Err(FinderError::Interrupted);
            }

            match std::fs::metadata(path) {
                Ok(meta) if meta.is_file() => sized.push((path.clone(), meta.len())),
                Ok(_) => {
                    log::debug!("Not a regular file, skipping: {}", path.display());
                    stats.non_files += 1;
                }
                Err(e) => {
                    log::warn!("Cannot read size of {}: {}", path.display(), e);
                    stats.unreadable_files += 1;
                }
            }

            let percent = ProgressTracker::scale(i + 1, total, 0, SIZE_PHASE_END);
            self.report(tracker, percent, &format!("Checking {}", path.display()));
        }

        Ok(group_by_size(sized, self.config.min_size))
    }

    fn size_only_groups(&self, buckets: BTreeMap<u64, Vec<PathBuf>>) -> DuplicateMap {
        let mut groups = DuplicateMap::new();
        for (size, files) in buckets {
            let group = DuplicateGroup::new(GroupKey::Size(size), size, files);
            self.emit(&group);
            groups.insert(group.key.clone(), group);
        }
        groups
    }

    /// Phase 2: hash every candidate and split buckets by digest.
    ///
    /// All candidates share one parallel pass so small buckets do not leave
    /// the pool idle. A bucket is split and its groups streamed as soon as
    /// its last file is hashed.
    fn hash_phase(
        &self,
        buckets: BTreeMap<u64, Vec<PathBuf>>,
        tracker: &ProgressTracker,
        stats: &mut FinderStats,
    ) -> Result<DuplicateMap, FinderError> {
        let total: usize = buckets.values().map(Vec::len).sum();
        let mut groups = DuplicateMap::new();
        if total == 0 {
            return Ok(groups);
        }

        log::info!("Hashing {} candidate files with {} threads", total, self.config.io_threads);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.io_threads)
            .thread_name(|i| format!("cleanscan-hash-{i}"))
            .build()
            .map_err(|e| FinderError::ThreadPool(e.to_string()))?;

        let mut slots = Vec::with_capacity(buckets.len());
        let mut jobs = Vec::with_capacity(total);
        for (slot, (size, files)) in buckets.into_iter().enumerate() {
            slots.push(PendingBucket::new(size, files.len()));
            jobs.extend(files.into_iter().map(|path| (slot, path)));
        }

        let hashed = AtomicUsize::new(0);
        let outcomes: Vec<BucketOutcome> = pool.install(|| {
            jobs.into_par_iter()
                .filter_map(|(slot, path)| {
                    let result = self.hasher.full_hash(&path);
                    let done = hashed.fetch_add(1, Ordering::SeqCst) + 1;
                    let percent = ProgressTracker::scale(done, total, SIZE_PHASE_END, 100);
                    self.report(tracker, percent, &format!("Hashing {}", path.display()));
                    self.settle(&slots[slot], path, result)
                })
                .collect()
        });

        if self.config.is_cancelled() {
            return Err(FinderError::Interrupted);
        }
        for outcome in outcomes {
            if outcome.interrupted {
                return Err(FinderError::Interrupted);
            }
            stats.hashed_files += outcome.hashed;
            stats.failed_hashes += outcome.errors.len();
            stats.errors.extend(outcome.errors);
            for group in outcome.groups {
                groups.insert(group.key.clone(), group);
            }
        }

        Ok(groups)
    }

    /// Record one hashed file; the worker that records a bucket's last file
    /// splits it by digest and returns the result.
    fn settle(
        &self,
        bucket: &PendingBucket,
        path: PathBuf,
        result: Result<Hash, HashError>,
    ) -> Option<BucketOutcome> {
        bucket
            .results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((path, result));
        if bucket.remaining.fetch_sub(1, Ordering::SeqCst) != 1 {
            return None;
        }

        let results = std::mem::take(
            &mut *bucket.results.lock().unwrap_or_else(PoisonError::into_inner),
        );
        let mut outcome = BucketOutcome::default();
        let mut by_hash: BTreeMap<Hash, Vec<PathBuf>> = BTreeMap::new();
        for (path, result) in results {
            match result {
                Ok(hash) => {
                    outcome.hashed += 1;
                    by_hash.entry(hash).or_default().push(path);
                }
                Err(HashError::Interrupted(_)) => outcome.interrupted = true,
                Err(e) => {
                    log::warn!("Skipping unhashable file: {e}");
                    outcome.errors.push(e);
                }
            }
        }
        if outcome.interrupted {
            return Some(outcome);
        }

        for (hash, members) in by_hash {
            if members.len() < 2 {
                continue;
            }
            let group = DuplicateGroup::new(GroupKey::Hash(hash_to_hex(&hash)), bucket.size, members);
            log::debug!("Duplicate group {} ({} files)", group.key, group.len());
            self.emit(&group);
            outcome.groups.push(group);
        }
        Some(outcome)
    }

    fn emit(&self, group: &DuplicateGroup) {
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_group_found(group);
        }
    }

    fn report(&self, tracker: &ProgressTracker, percent: u8, message: &str) {
        if let Some(ref callback) = self.config.progress_callback {
            tracker.report(callback.as_ref(), percent, message);
        }
    }

    fn report_message(&self, tracker: &ProgressTracker, percent: u8, message: &str) {
        if let Some(ref callback) = self.config.progress_callback {
            tracker.report_message(callback.as_ref(), percent, message);
        }
    }
}

/// Hash results of one size bucket, filled from the pool.
struct PendingBucket {
    size: u64,
    remaining: AtomicUsize,
    results: Mutex<Vec<(PathBuf, Result<Hash, HashError>)>>,
}

impl PendingBucket {
    fn new(size: u64, files: usize) -> Self {
        Self {
            size,
            remaining: AtomicUsize::new(files),
            results: Mutex::new(Vec::with_capacity(files)),
        }
    }
}

/// What a completed bucket contributes to the result.
#[derive(Default)]
struct BucketOutcome {
    groups: Vec<DuplicateGroup>,
    hashed: usize,
    errors: Vec<HashError>,
    interrupted: bool,
}
