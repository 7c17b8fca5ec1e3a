//! Depth-first directory scanner.
//!
//! # Overview
//!
//! [`Scanner`] walks a root with [`walkdir`], records every file and
//! directory beneath it as an [`Entry`] and feeds them into an
//! [`IndexBuilder`]. The walk is iterative (no recursion), children are
//! visited in name order so results are deterministic, and a cancel flag is
//! polled before every step.
//!
//! # Failure handling
//!
//! - Metadata that cannot be read: the entry is still recorded, with unknown
//!   size and time.
//! - A directory that cannot be listed: the directory entry stays, its
//!   contents are skipped, siblings continue.
//! - The root cannot be read: [`ScanError`], no index.
//! - Cancellation: [`ScanError::Interrupted`], the partial index is dropped.

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use walkdir::{DirEntry, WalkDir};

use super::{Entry, ItemError, ScanConfig, ScanError};
use crate::index::{Index, IndexBuilder};
use crate::progress::{ProgressCallback, ProgressTracker};
use crate::signal::CancelFlag;

/// Entries between two progress messages.
const PROGRESS_EVERY: usize = 256;

/// Directory scanner producing an [`Index`].
pub struct Scanner {
    config: ScanConfig,
    cancel: Option<CancelFlag>,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("config", &self.config)
            .field("cancel", &self.cancel)
            .field("has_progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

impl Scanner {
    /// Create a scanner.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use cleanscan::scanner::{ScanConfig, Scanner};
    /// use std::path::Path;
    ///
    /// let index = Scanner::new(ScanConfig::default()).scan(Path::new(".")).unwrap();
    /// println!("{} entries", index.len());
    /// ```
    #[must_use]
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            cancel: None,
            progress_callback: None,
        }
    }

    /// Stop the walk when `flag` is set.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Report progress to `callback`.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
    }

    /// Scan `root` and build its index.
    ///
    /// # Errors
    ///
    /// - [`ScanError::RootNotFound`] / [`ScanError::NotADirectory`] for a bad root
    /// - [`ScanError::RootUnreadable`] when the root cannot be listed
    /// - [`ScanError::Interrupted`] when cancelled
    pub fn scan(&self, root: &Path) -> Result<Index, ScanError> {
        let started = Instant::now();
        let root = check_root(root)?;
        let tracker = ProgressTracker::new();
        self.report(&tracker, 0, &format!("Scanning {}", root.display()));

        let mut builder = IndexBuilder::new(root.clone(), SystemTime::now());
        let skip_hidden = self.config.skip_hidden;
        let mut walk = WalkDir::new(&root)
            .min_depth(1)
            .follow_links(self.config.follow_symlinks)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()))
            .into_iter()
            .filter_entry(move |e| e.depth() == 0 || !(skip_hidden && is_hidden(e)));

        let mut seen = 0usize;
        loop {
            if self.is_cancelled() {
                log::debug!("Scanner: cancellation requested, discarding partial index");
                return Err(ScanError::Interrupted);
            }

            let Some(next) = walk.next() else { break };
            match next {
                Ok(dent) => {
                    let entry = self.build_entry(&dent, &mut builder);
                    builder.insert(entry);
                    seen += 1;
                    if seen % PROGRESS_EVERY == 0 {
                        self.report(&tracker, 0, &format!("Scanned {seen} items: {}", dent.path().display()));
                    }
                }
                Err(err) => {
                    if err.depth() == 0 {
                        let source = err
                            .into_io_error()
                            .unwrap_or_else(|| std::io::Error::other("walk failed at root"));
                        return Err(ScanError::RootUnreadable { path: root, source });
                    }
                    let path = err.path().map(Path::to_path_buf);
                    let item = classify_walk_error(err, &builder);
                    builder.record_error(item);
                    // Unresolvable links still get an entry, as they do unfollowed.
                    if let Some(path) = path.filter(|p| !builder.contains(p)) {
                        builder.insert(Entry::unreadable(path, false));
                    }
                }
            }
        }

        builder.set_duration(started.elapsed());
        let index = builder.finish();
        log::info!(
            "Scanned {}: {} files, {} directories in {:.2?}",
            root.display(),
            index.stats().files,
            index.stats().directories,
            index.stats().duration
        );
        self.report(&tracker, 100, &format!("Indexed {} items", index.len()));
        Ok(index)
    }

    /// Build an entry, downgrading metadata failures to an unreadable entry.
    fn build_entry(&self, dent: &DirEntry, builder: &mut IndexBuilder) -> Entry {
        let path = dent.path().to_path_buf();
        let is_dir = dent.file_type().is_dir();

        match dent.metadata() {
            Ok(meta) => entry_from_metadata(path, is_dir, &meta),
            Err(err) => {
                let source = err
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("metadata unavailable"));
                let item = ItemError::from_metadata(path.clone(), source);
                log_item_error(&item);
                builder.record_error(item);
                Entry::unreadable(path, is_dir)
            }
        }
    }

    fn report(&self, tracker: &ProgressTracker, percent: u8, message: &str) {
        if let Some(ref callback) = self.progress_callback {
            tracker.report_message(callback.as_ref(), percent, message);
        }
    }
}

fn check_root(root: &Path) -> Result<PathBuf, ScanError> {
    let root = std::path::absolute(root).map_err(|source| ScanError::RootUnreadable {
        path: root.to_path_buf(),
        source,
    })?;
    match std::fs::metadata(&root) {
        Ok(meta) if meta.is_dir() => Ok(root),
        Ok(_) => Err(ScanError::NotADirectory(root)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ScanError::RootNotFound(root)),
        Err(source) => Err(ScanError::RootUnreadable { path: root, source }),
    }
}

fn entry_from_metadata(path: PathBuf, is_dir: bool, meta: &Metadata) -> Entry {
    let modified = match meta.modified() {
        Ok(t) => Some(t),
        Err(e) => {
            log::trace!("No modification time for {}: {}", path.display(), e);
            None
        }
    };
    Entry::new(path, is_dir, Some(meta.len()), modified)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_str().is_some_and(|s| s.starts_with('.'))
}

/// Map a walk error below the root to an item error.
///
/// A failure to list an already recorded directory means its subtree is
/// missing from the index.
fn classify_walk_error(err: walkdir::Error, builder: &IndexBuilder) -> ItemError {
    let path = err.path().map(Path::to_path_buf).unwrap_or_default();

    if err.loop_ancestor().is_some() {
        let item = ItemError::Loop(path);
        log_item_error(&item);
        return item;
    }

    let source = err
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
    let item = if builder.is_directory(&path) {
        ItemError::DirectoryUnreadable { path, source }
    } else {
        ItemError::from_metadata(path, source)
    };
    log_item_error(&item);
    item
}

fn log_item_error(item: &ItemError) {
    match item {
        ItemError::NotFound(_) => log::debug!("{item}"),
        _ => log::warn!("{item}"),
    }
}
