use cleanscan::duplicates::FinderConfig;
use cleanscan::scanner::ScanConfig;
use cleanscan::worker::{spawn_duplicates, spawn_scan, Outcome, WorkerEvent};
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn test_scan_then_duplicates_in_background() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("a.bin"), vec![1u8; 2048]).unwrap();
    fs::write(dir.path().join("sub/b.bin"), vec![1u8; 2048]).unwrap();
    fs::write(dir.path().join("sub/c.bin"), vec![2u8; 2048]).unwrap();

    let index = spawn_scan(dir.path().to_path_buf(), ScanConfig::default())
        .wait()
        .completed()
        .unwrap();

    let mut groups_seen = 0;
    let mut last_percent = 0;
    let outcome = spawn_duplicates(index.file_paths(), true, FinderConfig::default()).wait_with(
        |event| match event {
            WorkerEvent::GroupFound(_) => groups_seen += 1,
            WorkerEvent::Progress { percent, .. } => {
                assert!(percent >= last_percent);
                last_percent = percent;
            }
            _ => {}
        },
    );

    let (groups, stats) = outcome.completed().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups_seen, 1);
    assert_eq!(last_percent, 100);
    assert_eq!(stats.reclaimable_space, 2048);
}

#[test]
fn test_cancel_from_coordinator() {
    let dir = tempdir().unwrap();
    for i in 0..2000 {
        fs::write(dir.path().join(format!("f{i:04}.txt")), "x").unwrap();
    }

    let worker = spawn_scan(dir.path().to_path_buf(), ScanConfig::default());
    worker.cancel();
    match worker.wait() {
        // The scan may finish before the flag is observed.
        Outcome::Cancelled | Outcome::Completed(_) => {}
        Outcome::Failed(msg) => panic!("unexpected failure: {msg}"),
    }
}

#[test]
fn test_events_can_be_polled() {
    let dir = tempdir().unwrap();
    let worker = spawn_scan(dir.path().to_path_buf(), ScanConfig::default());

    let mut finished = false;
    for _ in 0..100 {
        match worker.next_event(Duration::from_millis(100)) {
            Some(WorkerEvent::Finished(outcome)) => {
                assert!(outcome.is_completed());
                finished = true;
                break;
            }
            Some(_) | None => {}
        }
    }
    assert!(finished);
}
