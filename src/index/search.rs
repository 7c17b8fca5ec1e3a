//! Bounded substring index over lowercased names.
//!
//! Every substring of a name up to [`MAX_SUBSTRING_LEN`] characters maps to
//! the entries whose name contains it, so a short search term is a single
//! hash lookup. Longer terms are answered by a linear scan in
//! [`Index::lookup_ids`](super::Index::lookup_ids).

use std::collections::HashMap;

use crate::scanner::EntryId;

/// Longest substring (in characters) stored as a key.
pub const MAX_SUBSTRING_LEN: usize = 20;

/// Map from substring to the entries whose lowercased name contains it.
#[derive(Debug, Clone, Default)]
pub struct SubstringIndex {
    map: HashMap<String, Vec<EntryId>>,
}

impl SubstringIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every bounded substring of `name_lower` for `id`.
    ///
    /// Ids must be inserted in ascending order; postings stay sorted and a
    /// name containing the same substring twice is listed once.
    pub fn insert(&mut self, name_lower: &str, id: EntryId) {
        for key in substrings(name_lower) {
            let list = self.map.entry(key.to_string()).or_default();
            if list.last() != Some(&id) {
                list.push(id);
            }
        }
    }

    /// Postings for an exact key.
    #[must_use]
    pub fn get(&self, key: &str) -> &[EntryId] {
        self.map.get(key).map_or(&[], Vec::as_slice)
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.map.len()
    }
}

/// All substrings of `name` of 1..=[`MAX_SUBSTRING_LEN`] characters, cut on
/// char boundaries. May yield the same slice more than once.
pub fn substrings(name: &str) -> impl Iterator<Item = &str> {
    let bounds: Vec<usize> = name
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(name.len()))
        .collect();
    let chars = bounds.len() - 1;

    (0..chars).flat_map(move |start| {
        let end_max = (start + MAX_SUBSTRING_LEN).min(chars);
        let from = bounds[start];
        let ends: Vec<usize> = bounds[start + 1..=end_max].to_vec();
        ends.into_iter().map(move |to| &name[from..to])
    })
}
