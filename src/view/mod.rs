//! Filtered tree views over an [`Index`].
//!
//! [`build_view`] derives the visible subset of an index for a
//! [`ViewFilter`] and lays it out as a preorder list of [`ViewRow`]s ready
//! for rendering. It is a pure function of the index: no filesystem access.
//!
//! # Visibility
//!
//! - No active filter: everything is visible.
//! - A file is visible when it matches every active filter (name contains
//!   the term, extension in the allow list, modification time in range).
//! - A directory is visible when its name contains the search term, or when
//!   it is an ancestor of anything visible.
//!
//! Within a directory, subdirectories come before files and both are
//! ordered case-insensitively by name.

pub mod presets;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::index::Index;
use crate::scanner::{Entry, EntryId};

/// Inclusive range of modification times, in epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    /// Earliest accepted time
    pub min: i64,
    /// Latest accepted time
    pub max: i64,
}

impl DateRange {
    /// Create a range. An inverted range matches nothing.
    #[must_use]
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Whether `timestamp` lies in the range.
    #[must_use]
    pub fn contains(&self, timestamp: i64) -> bool {
        self.min <= timestamp && timestamp <= self.max
    }
}

/// Normalize a user-supplied extension to lowercase with a leading dot.
///
/// Returns `None` for empty input.
///
/// # Example
///
/// ```
/// use cleanscan::view::normalize_extension;
///
/// assert_eq!(normalize_extension("PDF").as_deref(), Some(".pdf"));
/// assert_eq!(normalize_extension(" .tar.gz ").as_deref(), Some(".tar.gz"));
/// assert_eq!(normalize_extension("."), None);
/// ```
#[must_use]
pub fn normalize_extension(ext: &str) -> Option<String> {
    let trimmed = ext.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        return None;
    }
    Some(format!(".{}", trimmed.to_lowercase()))
}

/// Predicates for a view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewFilter {
    /// Substring the name must contain (case-insensitive); empty for none
    pub search_term: String,
    /// Allowed extensions, normalized; empty for none
    pub extensions: Vec<String>,
    /// Accepted modification times; `None` for none
    pub date_range: Option<DateRange>,
}

impl ViewFilter {
    /// Filter with nothing active.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the search term.
    #[must_use]
    pub fn with_search_term(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    /// Add extensions to the allow list; inputs are normalized and
    /// duplicates dropped.
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for ext in extensions {
            if let Some(ext) = normalize_extension(ext.as_ref()) {
                if !self.extensions.contains(&ext) {
                    self.extensions.push(ext);
                }
            }
        }
        self
    }

    /// Set the date range.
    #[must_use]
    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    /// Whether any predicate is set.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.search_term.is_empty() || !self.extensions.is_empty() || self.date_range.is_some()
    }

    /// Whether a file entry passes every active predicate.
    ///
    /// An entry with unknown modification time fails an active date range.
    #[must_use]
    pub fn matches_file(&self, entry: &Entry) -> bool {
        let term = self.search_term.to_lowercase();
        if !term.is_empty() && !entry.name_lower.contains(&term) {
            return false;
        }
        if !self.extensions.is_empty() && !self.matches_extension(entry) {
            return false;
        }
        match self.date_range {
            Some(range) => entry.modified.is_some_and(|t| range.contains(t)),
            None => true,
        }
    }

    /// Only the last suffix counts, the same one [`Entry::extension`] and the
    /// categories use: `x.tar.gz` has extension `.gz`, `.pdf` has none.
    fn matches_extension(&self, entry: &Entry) -> bool {
        entry
            .extension()
            .is_some_and(|ext| self.extensions.iter().any(|allowed| allowed == ext))
    }
}

/// One visible entry, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewRow {
    /// Index entry this row shows
    #[serde(skip)]
    pub id: EntryId,
    /// Absolute path
    pub path: PathBuf,
    /// Base name
    pub name: String,
    /// Whether this row is a directory
    pub is_dir: bool,
    /// Nesting level; direct children of the root are 0
    pub depth: usize,
    /// Row number of the containing directory
    pub parent: Option<usize>,
    /// Size in bytes, when known
    pub size: Option<u64>,
    /// Modification time for display
    pub modified: String,
}

/// Result of [`build_view`]: rows in preorder plus a path lookup.
#[derive(Debug, Clone, Default)]
pub struct VisibleSet {
    rows: Vec<ViewRow>,
    by_path: HashMap<PathBuf, usize>,
}

impl VisibleSet {
    /// Number of visible entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether nothing is visible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in tree order.
    #[must_use]
    pub fn rows(&self) -> &[ViewRow] {
        &self.rows
    }

    /// Whether `path` is visible.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.by_path.contains_key(path)
    }

    /// Row for a visible path.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&ViewRow> {
        self.by_path.get(path).map(|&i| &self.rows[i])
    }

    /// Rows whose parent is row `parent` (or the root for `None`), in order.
    pub fn children(&self, parent: Option<usize>) -> impl Iterator<Item = &ViewRow> {
        self.rows.iter().filter(move |r| r.parent == parent)
    }

    /// Visible file paths, in tree order.
    #[must_use]
    pub fn file_paths(&self) -> Vec<PathBuf> {
        self.rows
            .iter()
            .filter(|r| !r.is_dir)
            .map(|r| r.path.clone())
            .collect()
    }

    /// Number of visible files.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.rows.iter().filter(|r| !r.is_dir).count()
    }
}

/// Compute the visible subset of `index` under `filter`.
///
/// # Example
///
/// ```
/// use cleanscan::index::IndexBuilder;
/// use cleanscan::scanner::Entry;
/// use cleanscan::view::{build_view, ViewFilter};
/// use std::path::{Path, PathBuf};
/// use std::time::SystemTime;
///
/// let mut builder = IndexBuilder::new("/r", SystemTime::now());
/// builder.insert(Entry::new(PathBuf::from("/r/a"), true, Some(0), None));
/// builder.insert(Entry::new(PathBuf::from("/r/a/b"), true, Some(0), None));
/// builder.insert(Entry::new(PathBuf::from("/r/a/report_final.pdf"), false, Some(1), None));
/// let index = builder.finish();
///
/// let view = build_view(&index, &ViewFilter::new().with_search_term("report"));
/// assert_eq!(view.len(), 2);
/// assert!(view.contains(Path::new("/r/a")));
/// assert!(!view.contains(Path::new("/r/a/b")));
/// ```
#[must_use]
pub fn build_view(index: &Index, filter: &ViewFilter) -> VisibleSet {
    let mut visible = vec![false; index.len()];

    if filter.is_active() {
        let term = filter.search_term.to_lowercase();
        let candidates = index.lookup_ids(&term);
        for id in candidates {
            let entry = index.entry(id);
            let matched = if entry.is_dir {
                !term.is_empty()
            } else {
                filter.matches_file(entry)
            };
            if matched {
                mark_with_ancestors(index, &mut visible, id);
            }
        }
    } else {
        visible.fill(true);
    }

    let set = layout(index, &visible);
    log::debug!("View: {} of {} entries visible", set.len(), index.len());
    set
}

/// Mark `id` and walk up until reaching an already marked ancestor; a
/// marked entry always has its whole chain marked.
fn mark_with_ancestors(index: &Index, visible: &mut [bool], id: EntryId) {
    if visible[id.index()] {
        return;
    }
    visible[id.index()] = true;
    for ancestor in index.ancestors(id) {
        if visible[ancestor.index()] {
            break;
        }
        visible[ancestor.index()] = true;
    }
}

/// Preorder layout of the marked entries with an explicit stack.
fn layout(index: &Index, visible: &[bool]) -> VisibleSet {
    let mut set = VisibleSet::default();
    let mut stack: Vec<(EntryId, Option<usize>)> = index
        .top_level()
        .iter()
        .rev()
        .filter(|id| visible[id.index()])
        .map(|&id| (id, None))
        .collect();

    while let Some((id, parent)) = stack.pop() {
        let entry = index.entry(id);
        let row = set.rows.len();
        set.by_path.insert(entry.path.clone(), row);
        set.rows.push(ViewRow {
            id,
            path: entry.path.clone(),
            name: entry.name.clone(),
            is_dir: entry.is_dir,
            depth: index.depth(id),
            parent,
            size: entry.size,
            modified: entry.modified_display.clone(),
        });

        stack.extend(
            index
                .children(id)
                .iter()
                .rev()
                .filter(|child| visible[child.index()])
                .map(|&child| (child, Some(row))),
        );
    }

    set
}
