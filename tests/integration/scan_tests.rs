use cleanscan::scanner::{ScanConfig, ScanError, Scanner};
use filetime::{set_file_mtime, FileTime};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn build_tree(root: &Path) {
    fs::create_dir_all(root.join("Projects/rust/src")).unwrap();
    fs::create_dir_all(root.join("Photos")).unwrap();
    File::create(root.join("Projects/rust/src/main.rs"))
        .unwrap()
        .write_all(b"fn main() {}")
        .unwrap();
    File::create(root.join("Projects/notes.md"))
        .unwrap()
        .write_all(b"# notes")
        .unwrap();
    File::create(root.join("Photos/Holiday.JPG"))
        .unwrap()
        .write_all(&[0xff; 64])
        .unwrap();
    File::create(root.join("empty.txt")).unwrap();
}

fn relative(root: &Path, paths: impl IntoIterator<Item = PathBuf>) -> BTreeSet<String> {
    paths
        .into_iter()
        .map(|p| {
            p.strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect()
}

#[test]
fn test_scan_indexes_every_reachable_item() {
    let dir = tempdir().unwrap();
    build_tree(dir.path());

    let index = Scanner::new(ScanConfig::default()).scan(dir.path()).unwrap();
    let root = index.root().to_path_buf();

    let indexed = relative(&root, index.entries().map(|(_, e)| e.path.clone()));
    let expected: BTreeSet<String> = [
        "Photos",
        "Photos/Holiday.JPG",
        "Projects",
        "Projects/notes.md",
        "Projects/rust",
        "Projects/rust/src",
        "Projects/rust/src/main.rs",
        "empty.txt",
    ]
    .into_iter()
    .map(String::from)
    .collect();
    assert_eq!(indexed, expected);
    assert_eq!(index.stats().files, 4);
    assert_eq!(index.stats().directories, 4);
    assert!(!index.stats().is_partial());
}

#[test]
fn test_scan_records_sizes_and_mtimes() {
    let dir = tempdir().unwrap();
    build_tree(dir.path());
    let photo = dir.path().join("Photos/Holiday.JPG");
    set_file_mtime(&photo, FileTime::from_unix_time(1_600_000_000, 0)).unwrap();

    let index = Scanner::new(ScanConfig::default()).scan(dir.path()).unwrap();
    let entry = index.get(&index.root().join("Photos/Holiday.JPG")).unwrap();

    assert_eq!(entry.size, Some(64));
    assert_eq!(entry.modified, Some(1_600_000_000));
    assert_eq!(entry.name_lower, "holiday.jpg");
    assert_eq!(entry.extension(), Some(".jpg"));
    assert_ne!(entry.modified_display, "unknown");
}

#[test]
fn test_every_substring_resolves() {
    let dir = tempdir().unwrap();
    build_tree(dir.path());
    let index = Scanner::new(ScanConfig::default()).scan(dir.path()).unwrap();
    let target = index.root().join("Projects/notes.md");

    let name = "notes.md";
    for start in 0..name.len() {
        for end in start + 1..=name.len() {
            let hits = index.lookup_substring(&name[start..end]);
            assert!(hits.contains(target.as_path()), "missing for {}", &name[start..end]);
        }
    }
    assert!(index.lookup_substring("NOTES").contains(target.as_path()));
    assert!(index.lookup_substring("zzz").is_empty());
}

#[test]
fn test_children_are_directories_first_then_by_name() {
    let dir = tempdir().unwrap();
    build_tree(dir.path());
    let index = Scanner::new(ScanConfig::default()).scan(dir.path()).unwrap();

    let top: Vec<&str> = index
        .top_level()
        .iter()
        .map(|&id| index.entry(id).name.as_str())
        .collect();
    assert_eq!(top, vec!["Photos", "Projects", "empty.txt"]);

    let projects = index.id_of(&index.root().join("Projects")).unwrap();
    let names: Vec<&str> = index
        .children(projects)
        .iter()
        .map(|&id| index.entry(id).name.as_str())
        .collect();
    assert_eq!(names, vec!["rust", "notes.md"]);
}

#[test]
fn test_scan_root_errors() {
    let dir = tempdir().unwrap();
    let scanner = Scanner::new(ScanConfig::default());

    assert!(matches!(
        scanner.scan(&dir.path().join("missing")),
        Err(ScanError::RootNotFound(_))
    ));

    let file = dir.path().join("file.txt");
    fs::write(&file, "x").unwrap();
    assert!(matches!(scanner.scan(&file), Err(ScanError::NotADirectory(_))));
}

#[cfg(unix)]
#[test]
fn test_symlinked_directories_are_not_followed_by_default() {
    let dir = tempdir().unwrap();
    let outside = tempdir().unwrap();
    fs::write(outside.path().join("secret.txt"), "s").unwrap();
    std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();

    let index = Scanner::new(ScanConfig::default()).scan(dir.path()).unwrap();
    assert!(index.lookup_substring("secret").is_empty());

    let followed = Scanner::new(ScanConfig::default().with_follow_symlinks(true))
        .scan(dir.path())
        .unwrap();
    assert_eq!(followed.lookup_substring("secret").len(), 1);
}

#[cfg(unix)]
#[test]
fn test_symlink_loop_is_recorded_not_fatal() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("a")).unwrap();
    std::os::unix::fs::symlink(dir.path(), dir.path().join("a/back")).unwrap();

    let index = Scanner::new(ScanConfig::default().with_follow_symlinks(true))
        .scan(dir.path())
        .unwrap();
    assert!(index.get(&index.root().join("a")).is_some());
    assert!(!index.stats().errors.is_empty());
    let back = index.get(&index.root().join("a/back")).unwrap();
    assert!(!back.is_dir);
    assert_eq!(back.size, None);
}
