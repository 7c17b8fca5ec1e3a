use cleanscan::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use cleanscan::scanner::{ItemError, ScanConfig, Scanner, UNKNOWN_MODIFIED};
use cleanscan::signal::CancelFlag;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_missing_inputs_are_skipped() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    fs::write(&a, "same").unwrap();
    fs::write(&b, "same").unwrap();

    let paths = vec![
        a.clone(),
        PathBuf::from("nonexistent_1.txt"),
        b.clone(),
        PathBuf::from("nonexistent_2.txt"),
    ];
    let (groups, stats) = DuplicateFinder::with_defaults()
        .find_duplicates(&paths, true)
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(stats.unreadable_files, 2);
    assert!(stats.is_partial());
}

#[test]
fn test_directories_in_input_are_ignored() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    let (groups, stats) = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path().join("sub")], true)
        .unwrap();
    assert!(groups.is_empty());
    assert_eq!(stats.non_files, 1);
}

#[test]
fn test_duplicate_input_paths_count_once() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    fs::write(&a, "alone").unwrap();

    let (groups, stats) = DuplicateFinder::with_defaults()
        .find_duplicates(&[a.clone(), a.clone(), a], true)
        .unwrap();
    assert!(groups.is_empty());
    assert_eq!(stats.input_paths, 1);
}

#[test]
fn test_cancelled_search_returns_interrupted() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    fs::write(&a, "same").unwrap();
    fs::write(&b, "same").unwrap();

    let flag = CancelFlag::new();
    flag.cancel();
    let finder = DuplicateFinder::new(FinderConfig::default().with_cancel_flag(flag));
    assert!(matches!(
        finder.find_duplicates(&[a, b], true),
        Err(FinderError::Interrupted)
    ));
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_does_not_abort_scan() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("inside.txt"), "x").unwrap();
    fs::write(dir.path().join("visible.txt"), "y").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Root ignores permission bits; nothing to observe then.
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let result = Scanner::new(ScanConfig::default()).scan(dir.path());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    let index = result.unwrap();

    assert!(index.get(&index.root().join("visible.txt")).is_some());
    assert!(index.get(&index.root().join("locked")).is_some());
    assert!(index.get(&index.root().join("locked/inside.txt")).is_none());
    assert!(index
        .stats()
        .errors
        .iter()
        .any(|e| matches!(e, ItemError::DirectoryUnreadable { .. } | ItemError::PermissionDenied(_))));
    assert!(index.stats().is_partial());
}

#[cfg(unix)]
#[test]
fn test_unreadable_metadata_keeps_entry_with_unknown_fields() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("f.txt"), "x").unwrap();
    fs::write(dir.path().join("visible.txt"), "y").unwrap();
    // Listable but not traversable: names are readable, metadata is not.
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    if fs::metadata(locked.join("f.txt")).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let result = Scanner::new(ScanConfig::default()).scan(dir.path());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    let index = result.unwrap();

    let entry = index.get(&index.root().join("locked/f.txt")).unwrap();
    assert!(!entry.is_dir);
    assert_eq!(entry.size, None);
    assert_eq!(entry.modified, None);
    assert_eq!(entry.modified_display, UNKNOWN_MODIFIED);

    let visible = index.get(&index.root().join("visible.txt")).unwrap();
    assert_eq!(visible.size, Some(1));
    assert!(index.get(&index.root().join("locked")).is_some_and(|e| e.is_dir));

    assert!(index.stats().unreadable_entries > 0);
    assert!(index
        .stats()
        .errors
        .iter()
        .any(|e| matches!(e, ItemError::PermissionDenied(_) | ItemError::Metadata { .. })));
    assert_eq!(index.lookup_substring("f.txt").len(), 1);
}
