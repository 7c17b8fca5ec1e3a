//! Keep strategies for duplicate groups.
//!
//! Given confirmed groups, work out which copy (or copies) to keep and which
//! paths a cleanup would remove. Nothing here touches the filesystem beyond
//! reading modification times; executing removals belongs to the caller,
//! which must invalidate the index cache afterwards.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::groups::{DuplicateGroup, GroupKey};

/// Which copy of each group survives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeepStrategy {
    /// Keep the most recently modified file.
    Newest,
    /// Keep the least recently modified file.
    Oldest,
    /// Keep the first file of the group (path order).
    First,
    /// Keep every file under this directory; the first file when none is.
    InLocation(PathBuf),
}

/// Errors from selection validation.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SelectionError {
    /// Every member of a group was selected for removal.
    #[error("Selection would remove every copy of the group")]
    AllCopiesWouldBeRemoved,
}

/// Outcome for one group.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct GroupPlan {
    /// Group the plan is for
    pub key: GroupKey,
    /// Paths that stay
    pub keep: Vec<PathBuf>,
    /// Paths that would be removed
    pub remove: Vec<PathBuf>,
}

impl GroupPlan {
    /// Bytes freed if the plan were carried out.
    #[must_use]
    pub fn reclaimed(&self, group: &DuplicateGroup) -> u64 {
        group.size * self.remove.len() as u64
    }
}

/// Check that `selected` leaves at least one member of `group_paths`.
///
/// # Errors
///
/// Returns [`SelectionError::AllCopiesWouldBeRemoved`] otherwise.
///
/// # Example
///
/// ```
/// use cleanscan::duplicates::selection::validate_preserves_copy;
/// use std::path::PathBuf;
///
/// let group = vec![PathBuf::from("/original.txt"), PathBuf::from("/copy1.txt")];
///
/// assert!(validate_preserves_copy(&[PathBuf::from("/copy1.txt")], &group).is_ok());
/// assert!(validate_preserves_copy(&group, &group).is_err());
/// ```
pub fn validate_preserves_copy(
    selected_paths: &[PathBuf],
    group_paths: &[PathBuf],
) -> Result<(), SelectionError> {
    let selected: HashSet<&PathBuf> = selected_paths.iter().collect();
    let preserved = group_paths.iter().filter(|p| !selected.contains(p)).count();

    if preserved == 0 {
        log::error!(
            "Selection covers all {} copies of a duplicate group",
            group_paths.len()
        );
        Err(SelectionError::AllCopiesWouldBeRemoved)
    } else {
        Ok(())
    }
}

/// Plan one group.
///
/// For the time-based strategies, files whose modification time cannot be
/// read (deleted since the search) are neither kept nor removed.
#[must_use]
pub fn plan_group(group: &DuplicateGroup, strategy: &KeepStrategy) -> GroupPlan {
    plan_group_with(group, strategy, modified_time)
}

/// Plan every group.
#[must_use]
pub fn plan_removals<'a>(
    groups: impl IntoIterator<Item = &'a DuplicateGroup>,
    strategy: &KeepStrategy,
) -> Vec<GroupPlan> {
    groups
        .into_iter()
        .map(|group| plan_group(group, strategy))
        .collect()
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn plan_group_with<F>(group: &DuplicateGroup, strategy: &KeepStrategy, mtime: F) -> GroupPlan
where
    F: Fn(&Path) -> Option<SystemTime>,
{
    let (keep, remove) = match strategy {
        KeepStrategy::Newest | KeepStrategy::Oldest => {
            let mut dated: Vec<(SystemTime, &PathBuf)> = group
                .files
                .iter()
                .filter_map(|p| mtime(p).map(|t| (t, p)))
                .collect();
            if *strategy == KeepStrategy::Newest {
                dated.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
            } else {
                dated.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
            }
            let mut paths = dated.into_iter().map(|(_, p)| p.clone());
            match paths.next() {
                Some(first) => (vec![first], paths.collect()),
                None => (group.files.clone(), Vec::new()),
            }
        }
        KeepStrategy::First => split_keep(group, |i, _| i == 0),
        KeepStrategy::InLocation(dir) => {
            if group.files.iter().any(|p| p.starts_with(dir)) {
                split_keep(group, |_, p| p.starts_with(dir))
            } else {
                log::debug!("No member of {} under {}, keeping the first", group.key, dir.display());
                split_keep(group, |i, _| i == 0)
            }
        }
    };

    if validate_preserves_copy(&remove, &group.files).is_err() {
        return GroupPlan {
            key: group.key.clone(),
            keep: group.files.clone(),
            remove: Vec::new(),
        };
    }

    GroupPlan {
        key: group.key.clone(),
        keep,
        remove,
    }
}

fn split_keep<F>(group: &DuplicateGroup, keep_if: F) -> (Vec<PathBuf>, Vec<PathBuf>)
where
    F: Fn(usize, &Path) -> bool,
{
    let mut keep = Vec::new();
    let mut remove = Vec::new();
    for (i, path) in group.files.iter().enumerate() {
        if keep_if(i, path) {
            keep.push(path.clone());
        } else {
            remove.push(path.clone());
        }
    }
    (keep, remove)
}
