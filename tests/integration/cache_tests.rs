use cleanscan::cache::IndexCache;
use cleanscan::scanner::{ScanConfig, Scanner};
use std::fs;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::tempdir;

#[test]
fn test_index_ttl_boundaries() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "a").unwrap();
    let index = Scanner::new(ScanConfig::default()).scan(dir.path()).unwrap();
    let t0 = index.scanned_at();

    assert!(index.is_valid(dir.path(), t0 + Duration::from_secs(100)));
    assert!(!index.is_valid(dir.path(), t0 + Duration::from_secs(301)));
    assert!(!index.is_valid(&dir.path().join("other"), t0));
}

#[test]
fn test_get_or_scan_reuses_until_invalidated() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "a").unwrap();
    let scanner = Scanner::new(ScanConfig::default());
    let mut cache = IndexCache::default();

    let first = cache.get_or_scan(dir.path(), &scanner).unwrap();
    fs::write(dir.path().join("b.txt"), "b").unwrap();
    let cached = cache.get_or_scan(dir.path(), &scanner).unwrap();
    assert!(Arc::ptr_eq(&first, &cached));
    assert_eq!(cached.len(), 1);

    cache.invalidate();
    let rescanned = cache.get_or_scan(dir.path(), &scanner).unwrap();
    assert_eq!(rescanned.len(), 2);
}

#[test]
fn test_different_root_replaces_cached_index() {
    let one = tempdir().unwrap();
    let two = tempdir().unwrap();
    let scanner = Scanner::new(ScanConfig::default());
    let mut cache = IndexCache::default();

    cache.get_or_scan(one.path(), &scanner).unwrap();
    cache.get_or_scan(two.path(), &scanner).unwrap();

    assert!(cache.get(one.path(), SystemTime::now()).is_none());
    assert!(cache.get(two.path(), SystemTime::now()).is_some());
}

#[test]
fn test_failed_rescan_leaves_cache_empty() {
    let dir = tempdir().unwrap();
    let scanner = Scanner::new(ScanConfig::default());
    let mut cache = IndexCache::new(Duration::from_secs(60));

    cache.get_or_scan(dir.path(), &scanner).unwrap();
    assert!(cache.get_or_scan(&dir.path().join("gone"), &scanner).is_err());
    assert!(cache.root().is_none());
}
