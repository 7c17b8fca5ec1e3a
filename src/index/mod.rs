//! In-memory index of one scanned root.
//!
//! An [`Index`] is an immutable snapshot: an arena of [`Entry`] values
//! addressed by [`EntryId`], a path lookup table, the resolved tree
//! (parent and ordered children per entry) and a [`SubstringIndex`] over
//! lowercased names. It is produced by [`IndexBuilder::finish`], normally
//! driven by the [`Scanner`](crate::scanner::Scanner).
//!
//! # Example
//!
//! ```
//! use cleanscan::index::IndexBuilder;
//! use cleanscan::scanner::Entry;
//! use std::path::PathBuf;
//! use std::time::SystemTime;
//!
//! let mut builder = IndexBuilder::new("/data", SystemTime::now());
//! builder.insert(Entry::new(PathBuf::from("/data/a"), true, Some(0), None));
//! builder.insert(Entry::new(PathBuf::from("/data/a/Report.pdf"), false, Some(10), None));
//! let index = builder.finish();
//!
//! assert_eq!(index.len(), 2);
//! assert_eq!(index.lookup_substring("REP").len(), 1);
//! ```

pub mod search;

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

pub use search::{SubstringIndex, MAX_SUBSTRING_LEN};

use crate::scanner::{Entry, EntryId, ItemError};

/// How long an index stays valid after its scan.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Counters collected while building an index.
#[derive(Debug, Default)]
pub struct ScanStats {
    /// Number of file entries
    pub files: usize,
    /// Number of directory entries
    pub directories: usize,
    /// Entries recorded without size/mtime
    pub unreadable_entries: usize,
    /// Directories whose contents could not be listed
    pub skipped_directories: usize,
    /// Every per-item problem, in encounter order
    pub errors: Vec<ItemError>,
    /// Wall time of the scan
    pub duration: Duration,
}

impl ScanStats {
    /// Whether any item could not be fully read.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.unreadable_entries > 0 || self.skipped_directories > 0 || !self.errors.is_empty()
    }
}

/// Ordering of siblings: directories first, then case-insensitive name,
/// then the on-disk name to keep the order total.
#[must_use]
pub fn tree_order(a: &Entry, b: &Entry) -> Ordering {
    b.is_dir
        .cmp(&a.is_dir)
        .then_with(|| a.name_lower.cmp(&b.name_lower))
        .then_with(|| a.name.cmp(&b.name))
}

/// Incremental constructor for an [`Index`].
///
/// Entries must be inserted parents-before-children (a preorder walk does
/// this naturally). A path whose parent directory was never inserted gets
/// placeholder directory entries so the tree stays connected to the root.
#[derive(Debug)]
pub struct IndexBuilder {
    root: PathBuf,
    scanned_at: SystemTime,
    entries: Vec<Entry>,
    by_path: HashMap<PathBuf, EntryId>,
    search: SubstringIndex,
    errors: Vec<ItemError>,
    duration: Duration,
}

impl IndexBuilder {
    /// Start an index for `root`, stamped with `scanned_at`.
    ///
    /// `root` is made absolute against the current directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, scanned_at: SystemTime) -> Self {
        let root = root.into();
        Self {
            root: normalize_root(&root),
            scanned_at,
            entries: Vec::new(),
            by_path: HashMap::new(),
            search: SubstringIndex::new(),
            errors: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    /// Root this builder accepts entries under.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of entries inserted so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `path` was recorded.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.by_path.contains_key(path)
    }

    /// Whether `path` was recorded as a directory.
    #[must_use]
    pub fn is_directory(&self, path: &Path) -> bool {
        self.by_path
            .get(path)
            .is_some_and(|id| self.entries[id.0].is_dir)
    }

    /// Add an entry and register its name substrings.
    ///
    /// Returns `None` (and drops the entry) when its path is the root itself
    /// or lies outside the root. Re-inserting a path replaces the previous
    /// entry in place.
    pub fn insert(&mut self, entry: Entry) -> Option<EntryId> {
        if entry.path == self.root || !entry.path.starts_with(&self.root) {
            log::debug!("Ignoring entry outside of {}: {}", self.root.display(), entry.path.display());
            return None;
        }

        if let Some(&id) = self.by_path.get(&entry.path) {
            log::debug!("Path revisited, replacing entry: {}", entry.path.display());
            self.entries[id.0] = entry;
            return Some(id);
        }

        if let Some(parent) = entry.path.parent() {
            if parent != self.root && !self.by_path.contains_key(parent) {
                let placeholder = Entry::unreadable(parent.to_path_buf(), true);
                self.insert(placeholder);
            }
        }

        let id = EntryId(self.entries.len());
        self.search.insert(&entry.name_lower, id);
        self.by_path.insert(entry.path.clone(), id);
        self.entries.push(entry);
        Some(id)
    }

    /// Record a per-item problem.
    pub fn record_error(&mut self, error: ItemError) {
        self.errors.push(error);
    }

    /// Record how long the scan took.
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }

    /// Resolve the tree and freeze the index.
    #[must_use]
    pub fn finish(self) -> Index {
        let count = self.entries.len();
        let mut parents: Vec<Option<EntryId>> = Vec::with_capacity(count);
        let mut depths: Vec<usize> = Vec::with_capacity(count);
        let mut children: Vec<Vec<EntryId>> = vec![Vec::new(); count];
        let mut top_level = Vec::new();

        for (slot, entry) in self.entries.iter().enumerate() {
            let id = EntryId(slot);
            let parent = entry
                .path
                .parent()
                .filter(|p| *p != self.root)
                .and_then(|p| self.by_path.get(p).copied());

            match parent {
                Some(p) => {
                    children[p.0].push(id);
                    depths.push(depths[p.0] + 1);
                }
                None => {
                    top_level.push(id);
                    depths.push(0);
                }
            }
            parents.push(parent);
        }

        let entries = &self.entries;
        let by_order = |a: &EntryId, b: &EntryId| tree_order(&entries[a.0], &entries[b.0]);
        for list in &mut children {
            list.sort_by(by_order);
        }
        top_level.sort_by(by_order);

        let stats = ScanStats {
            files: entries.iter().filter(|e| !e.is_dir).count(),
            directories: entries.iter().filter(|e| e.is_dir).count(),
            unreadable_entries: entries.iter().filter(|e| e.size.is_none()).count(),
            skipped_directories: self
                .errors
                .iter()
                .filter(|e| matches!(e, ItemError::DirectoryUnreadable { .. }))
                .count(),
            errors: self.errors,
            duration: self.duration,
        };

        log::debug!(
            "Index for {}: {} files, {} directories, {} substring keys",
            self.root.display(),
            stats.files,
            stats.directories,
            self.search.key_count()
        );

        Index {
            root: self.root,
            scanned_at: self.scanned_at,
            entries: self.entries,
            parents,
            depths,
            children,
            top_level,
            by_path: self.by_path,
            search: self.search,
            stats,
        }
    }
}

/// Immutable snapshot of one scanned root.
#[derive(Debug)]
pub struct Index {
    root: PathBuf,
    scanned_at: SystemTime,
    entries: Vec<Entry>,
    parents: Vec<Option<EntryId>>,
    depths: Vec<usize>,
    children: Vec<Vec<EntryId>>,
    top_level: Vec<EntryId>,
    by_path: HashMap<PathBuf, EntryId>,
    search: SubstringIndex,
    stats: ScanStats,
}

impl Index {
    /// The scanned root (absolute).
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// When the scan started.
    #[must_use]
    pub fn scanned_at(&self) -> SystemTime {
        self.scanned_at
    }

    /// Number of entries (files and directories, root excluded).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the root had no readable children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Scan counters and per-item errors.
    #[must_use]
    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    /// Entry for an id issued by this index.
    ///
    /// # Panics
    ///
    /// Panics if `id` comes from another index and is out of range.
    #[must_use]
    pub fn entry(&self, id: EntryId) -> &Entry {
        &self.entries[id.0]
    }

    /// Entry for an absolute path.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&Entry> {
        self.id_of(path).map(|id| self.entry(id))
    }

    /// Id for an absolute path.
    #[must_use]
    pub fn id_of(&self, path: &Path) -> Option<EntryId> {
        self.by_path.get(path).copied()
    }

    /// All ids in insertion (preorder) order.
    pub fn ids(&self) -> impl Iterator<Item = EntryId> {
        (0..self.entries.len()).map(EntryId)
    }

    /// All entries with their ids.
    pub fn entries(&self) -> impl Iterator<Item = (EntryId, &Entry)> {
        self.entries.iter().enumerate().map(|(i, e)| (EntryId(i), e))
    }

    /// File entries only.
    pub fn files(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| !e.is_dir)
    }

    /// Paths of every file entry, in preorder.
    #[must_use]
    pub fn file_paths(&self) -> Vec<PathBuf> {
        self.files().map(|e| e.path.clone()).collect()
    }

    /// Containing directory, `None` for direct children of the root.
    #[must_use]
    pub fn parent(&self, id: EntryId) -> Option<EntryId> {
        self.parents[id.0]
    }

    /// Distance from the root (direct children are depth 0).
    #[must_use]
    pub fn depth(&self, id: EntryId) -> usize {
        self.depths[id.0]
    }

    /// Children of a directory in tree order.
    #[must_use]
    pub fn children(&self, id: EntryId) -> &[EntryId] {
        &self.children[id.0]
    }

    /// Direct children of the root in tree order.
    #[must_use]
    pub fn top_level(&self) -> &[EntryId] {
        &self.top_level
    }

    /// Ancestor directories of `id`, nearest first.
    pub fn ancestors(&self, id: EntryId) -> impl Iterator<Item = EntryId> + '_ {
        std::iter::successors(self.parent(id), move |p| self.parent(*p))
    }

    /// Ids whose lowercased name contains `term` (case-insensitive).
    ///
    /// An empty term matches every entry. Terms up to
    /// [`MAX_SUBSTRING_LEN`] characters are a single map lookup; longer
    /// terms fall back to scanning every name.
    #[must_use]
    pub fn lookup_ids(&self, term: &str) -> Vec<EntryId> {
        let term = term.to_lowercase();
        if term.is_empty() {
            return self.ids().collect();
        }
        if term.chars().count() <= MAX_SUBSTRING_LEN {
            return self.search.get(&term).to_vec();
        }
        log::trace!("Term longer than {MAX_SUBSTRING_LEN} chars, scanning names");
        self.entries()
            .filter(|(_, e)| e.name_lower.contains(&term))
            .map(|(id, _)| id)
            .collect()
    }

    /// Paths whose lowercased name contains `term`.
    #[must_use]
    pub fn lookup_substring(&self, term: &str) -> BTreeSet<&Path> {
        self.lookup_ids(term)
            .into_iter()
            .map(|id| self.entry(id).path.as_path())
            .collect()
    }

    /// Whether this index can serve `root` at `now` under [`DEFAULT_TTL`].
    #[must_use]
    pub fn is_valid(&self, root: &Path, now: SystemTime) -> bool {
        self.is_valid_for(root, now, DEFAULT_TTL)
    }

    /// Whether this index can serve `root` at `now` under `ttl`.
    ///
    /// A `now` earlier than the scan time counts as stale.
    #[must_use]
    pub fn is_valid_for(&self, root: &Path, now: SystemTime, ttl: Duration) -> bool {
        if normalize_root(root) != self.root {
            return false;
        }
        self.age(now).is_some_and(|age| age < ttl)
    }

    /// Time since the scan, `None` if the clock went backwards.
    #[must_use]
    pub fn age(&self, now: SystemTime) -> Option<Duration> {
        now.duration_since(self.scanned_at).ok()
    }
}

fn normalize_root(root: &Path) -> PathBuf {
    std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf())
}
