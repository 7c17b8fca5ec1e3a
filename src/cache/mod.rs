//! Session cache for the current index.
//!
//! The cache holds at most one [`Index`], for the root that was scanned
//! last. It is reused while the same root is requested within the TTL and
//! rebuilt lazily otherwise.
//!
//! # Invalidation
//!
//! The index cannot notice changes made behind its back. Whatever deletes,
//! moves or renames files must call [`IndexCache::invalidate`] afterwards;
//! the cache never infers it.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::index::{Index, DEFAULT_TTL};
use crate::scanner::{ScanError, Scanner};

/// Cache of the most recent index.
#[derive(Debug)]
pub struct IndexCache {
    ttl: Duration,
    current: Option<Arc<Index>>,
}

impl Default for IndexCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl IndexCache {
    /// Create an empty cache with the given TTL.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, current: None }
    }

    /// Configured time-to-live.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Root of the cached index, if any.
    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        self.current.as_deref().map(Index::root)
    }

    /// Whether the cached index can serve `root` at `now`.
    #[must_use]
    pub fn is_valid(&self, root: &Path, now: SystemTime) -> bool {
        self.current
            .as_ref()
            .is_some_and(|index| index.is_valid_for(root, now, self.ttl))
    }

    /// The cached index when it is valid for `root` at `now`.
    #[must_use]
    pub fn get(&self, root: &Path, now: SystemTime) -> Option<Arc<Index>> {
        if self.is_valid(root, now) {
            self.current.clone()
        } else {
            None
        }
    }

    /// Publish a freshly built index, replacing any previous one.
    pub fn store(&mut self, index: Index) -> Arc<Index> {
        log::debug!("Caching index for {}", index.root().display());
        let index = Arc::new(index);
        self.current = Some(Arc::clone(&index));
        index
    }

    /// Drop the cached index unconditionally.
    ///
    /// Must be called after any delete, move or rename performed outside
    /// the scanner.
    pub fn invalidate(&mut self) {
        if self.current.take().is_some() {
            log::debug!("Index cache invalidated");
        }
    }

    /// Return the cached index for `root` or scan it.
    ///
    /// A failed or cancelled scan leaves the cache empty.
    ///
    /// # Errors
    ///
    /// Propagates the [`ScanError`] of the rescan.
    pub fn get_or_scan(&mut self, root: &Path, scanner: &Scanner) -> Result<Arc<Index>, ScanError> {
        self.get_or_insert_with(root, SystemTime::now(), |root| scanner.scan(root))
    }

    /// Like [`get_or_scan`](Self::get_or_scan) with an explicit clock and
    /// index source.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `build`.
    pub fn get_or_insert_with<F>(
        &mut self,
        root: &Path,
        now: SystemTime,
        build: F,
    ) -> Result<Arc<Index>, ScanError>
    where
        F: FnOnce(&Path) -> Result<Index, ScanError>,
    {
        if let Some(index) = self.get(root, now) {
            log::debug!("Index cache hit for {}", root.display());
            return Ok(index);
        }

        log::debug!("Index cache miss for {}", root.display());
        self.invalidate();
        let index = build(root)?;
        Ok(self.store(index))
    }
}
