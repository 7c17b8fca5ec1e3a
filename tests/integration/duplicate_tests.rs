use cleanscan::duplicates::selection::plan_removals;
use cleanscan::duplicates::{DuplicateFinder, FinderConfig, GroupKey, KeepStrategy};
use cleanscan::progress::ProgressCallback;
use cleanscan::scanner::{ScanConfig, Scanner};
use filetime::{set_file_mtime, FileTime};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

/// `a/x.txt` and `a/b/y.txt` share content, `a/b/z.txt` has the same size.
fn scenario(root: &Path) -> [PathBuf; 3] {
    fs::create_dir_all(root.join("a/b")).unwrap();
    let x = root.join("a/x.txt");
    let y = root.join("a/b/y.txt");
    let z = root.join("a/b/z.txt");
    fs::write(&x, "hello").unwrap();
    fs::write(&y, "hello").unwrap();
    fs::write(&z, "world").unwrap();
    [x, y, z]
}

#[test]
fn test_content_comparison_separates_same_size_files() {
    let dir = tempdir().unwrap();
    let [x, y, z] = scenario(dir.path());

    let finder = DuplicateFinder::with_defaults();
    let (groups, stats) = finder
        .find_duplicates(&[x.clone(), y.clone(), z.clone()], true)
        .unwrap();

    assert_eq!(groups.len(), 1);
    let group = groups.values().next().unwrap();
    assert!(group.is_content_match());
    assert!(group.contains(&x));
    assert!(group.contains(&y));
    assert!(!groups.values().any(|g| g.contains(&z)));
    assert_eq!(stats.hashed_files, 3);
    assert_eq!(stats.reclaimable_space, 5);
}

#[test]
fn test_size_only_groups_all_three() {
    let dir = tempdir().unwrap();
    let paths = scenario(dir.path());

    let (groups, stats) = DuplicateFinder::with_defaults()
        .find_duplicates(&paths, false)
        .unwrap();

    assert_eq!(groups.len(), 1);
    let (key, group) = groups.iter().next().unwrap();
    assert_eq!(*key, GroupKey::Size(5));
    assert_eq!(group.len(), 3);
    assert_eq!(stats.hashed_files, 0);
}

#[test]
fn test_groups_are_idempotent() {
    let dir = tempdir().unwrap();
    let paths = scenario(dir.path());
    let finder = DuplicateFinder::with_defaults();

    let (first, _) = finder.find_duplicates(&paths, true).unwrap();
    let (second, _) = finder.find_duplicates(&paths, true).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_zero_byte_files_never_group() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.empty");
    let b = dir.path().join("b.empty");
    fs::write(&a, "").unwrap();
    fs::write(&b, "").unwrap();

    let (groups, stats) = DuplicateFinder::with_defaults()
        .find_duplicates(&[a, b], false)
        .unwrap();
    assert!(groups.is_empty());
    assert_eq!(stats.grouping.empty_files, 2);
}

#[test]
fn test_min_size_excludes_small_files() {
    let dir = tempdir().unwrap();
    let paths = scenario(dir.path());
    let big_a = dir.path().join("big_a.bin");
    let big_b = dir.path().join("big_b.bin");
    fs::write(&big_a, vec![7u8; 4096]).unwrap();
    fs::write(&big_b, vec![7u8; 4096]).unwrap();

    let mut all = paths.to_vec();
    all.push(big_a.clone());
    all.push(big_b);

    let finder = DuplicateFinder::new(FinderConfig::default().with_min_size(1024));
    let (groups, stats) = finder.find_duplicates(&all, true).unwrap();
    assert_eq!(groups.len(), 1);
    assert!(groups.values().next().unwrap().contains(&big_a));
    assert_eq!(stats.grouping.below_min_size, 3);
}

#[test]
fn test_whole_subtree_search_from_index() {
    let dir = tempdir().unwrap();
    scenario(dir.path());
    fs::write(dir.path().join("copy.txt"), "hello").unwrap();

    let index = Scanner::new(ScanConfig::default()).scan(dir.path()).unwrap();
    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates_in_index(&index, true)
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups.values().next().unwrap().len(), 3);
}

#[derive(Default)]
struct Collector {
    percents: Mutex<Vec<u8>>,
    groups: Mutex<Vec<GroupKey>>,
    completions: Mutex<usize>,
}

impl ProgressCallback for Collector {
    fn on_progress(&self, percent: u8, _message: &str) {
        self.percents.lock().unwrap().push(percent);
    }

    fn on_group_found(&self, group: &cleanscan::duplicates::DuplicateGroup) {
        self.groups.lock().unwrap().push(group.key.clone());
    }

    fn on_complete(&self) {
        *self.completions.lock().unwrap() += 1;
    }
}

#[test]
fn test_callbacks_stream_groups_and_complete_once() {
    let dir = tempdir().unwrap();
    let mut paths = scenario(dir.path()).to_vec();
    for i in 0..20 {
        let p = dir.path().join(format!("n{i}.dat"));
        fs::write(&p, format!("file number {i:03}")).unwrap();
        paths.push(p);
    }

    let collector = Arc::new(Collector::default());
    let finder = DuplicateFinder::new(
        FinderConfig::default()
            .with_io_threads(3)
            .with_progress_callback(collector.clone()),
    );
    let (groups, _) = finder.find_duplicates(&paths, true).unwrap();

    let percents = collector.percents.lock().unwrap();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(percents.last(), Some(&100));

    let streamed = collector.groups.lock().unwrap();
    assert_eq!(streamed.len(), groups.len());
    assert!(streamed.iter().all(|k| groups.contains_key(k)));
    assert_eq!(*collector.completions.lock().unwrap(), 1);
}

#[test]
fn test_many_small_buckets_are_hashed_in_one_pass() {
    let dir = tempdir().unwrap();
    let mut paths = Vec::new();
    // Bucket n holds files of n+1 bytes: two copies and one odd file.
    for n in 0..12usize {
        let same = "s".repeat(n + 1);
        let odd = "o".repeat(n + 1);
        for (name, content) in [("a", &same), ("b", &same), ("c", &odd)] {
            let p = dir.path().join(format!("{name}{n}.bin"));
            fs::write(&p, content).unwrap();
            paths.push(p);
        }
    }

    let collector = Arc::new(Collector::default());
    let finder = DuplicateFinder::new(
        FinderConfig::default()
            .with_io_threads(4)
            .with_progress_callback(collector.clone()),
    );
    let (groups, stats) = finder.find_duplicates(&paths, true).unwrap();

    assert_eq!(groups.len(), 12);
    assert_eq!(stats.hashed_files, 36);
    for group in groups.values() {
        assert_eq!(group.len(), 2);
        assert!(group
            .files
            .iter()
            .all(|f| !f.file_name().unwrap().to_string_lossy().starts_with('c')));
    }
    let sizes: std::collections::BTreeSet<u64> = groups.values().map(|g| g.size).collect();
    assert_eq!(sizes.len(), 12);

    let mut streamed = collector.groups.lock().unwrap().clone();
    streamed.sort();
    let keys: Vec<GroupKey> = groups.keys().cloned().collect();
    assert_eq!(streamed, keys);
    assert_eq!(collector.percents.lock().unwrap().last(), Some(&100));
}

#[test]
fn test_keep_newest_plan_on_real_files() {
    let dir = tempdir().unwrap();
    let [x, y, z] = scenario(dir.path());
    set_file_mtime(&x, FileTime::from_unix_time(1_000_000, 0)).unwrap();
    set_file_mtime(&y, FileTime::from_unix_time(2_000_000, 0)).unwrap();

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(&[x.clone(), y.clone(), z], true)
        .unwrap();
    let plans = plan_removals(groups.values(), &KeepStrategy::Newest);

    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].keep, vec![y]);
    assert_eq!(plans[0].remove, vec![x]);
}
