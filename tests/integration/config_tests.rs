use cleanscan::config::Config;
use std::fs;
use std::sync::Mutex;
use tempfile::tempdir;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Clear all CLEANSCAN_* environment variables to avoid interference.
fn clear_env() {
    for (key, _) in std::env::vars() {
        if key.starts_with("CLEANSCAN_") {
            std::env::remove_var(key);
        }
    }
}

#[test]
fn test_missing_file_uses_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();

    let config = Config::load_from_path(&dir.path().join("nonexistent.toml")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_load_from_toml() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
cache_ttl_secs = 60
follow_symlinks = true
io_threads = 8
min_duplicate_size = 4096

[report]
old_file_days = 30
"#,
    )
    .unwrap();

    let config = Config::load_from_path(&path).unwrap();
    assert_eq!(config.cache_ttl_secs, 60);
    assert!(config.follow_symlinks);
    assert_eq!(config.io_threads, 8);
    assert_eq!(config.min_duplicate_size, 4096);
    assert_eq!(config.report.old_file_days, 30);
    assert_eq!(config.report.top_n, 20);
    assert!(config.compare_content);
}

#[test]
fn test_environment_overrides_file() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "io_threads = 8\ncompare_content = true\n").unwrap();

    std::env::set_var("CLEANSCAN_IO_THREADS", "2");
    std::env::set_var("CLEANSCAN_COMPARE_CONTENT", "false");
    std::env::set_var("CLEANSCAN_REPORT__TOP_N", "5");
    let result = Config::load_from_path(&path);
    clear_env();

    let config = result.unwrap();
    assert_eq!(config.io_threads, 2);
    assert!(!config.compare_content);
    assert_eq!(config.report.top_n, 5);
}

#[test]
fn test_invalid_toml_is_an_error() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "io_threads = \"many\"").unwrap();

    assert!(Config::load_from_path(&path).is_err());
}

#[test]
fn test_zero_threads_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "io_threads = 0").unwrap();

    let err = Config::load_from_path(&path).unwrap_err();
    assert!(format!("{err:#}").contains("io_threads"));
}

#[test]
fn test_save_round_trips() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested/config.toml");

    let mut config = Config::default();
    config.io_threads = 3;
    config.report.large_file_threshold = 1_000;
    config.save(&path).unwrap();

    let saved = fs::read_to_string(&path).unwrap();
    assert!(saved.contains("io_threads = 3"));
    assert!(saved.contains("[report]"));
    assert_eq!(Config::load_from_path(&path).unwrap(), config);
}
