//! Application configuration management.
//!
//! Settings are merged from three layers, later ones winning:
//!
//! 1. Built-in defaults
//! 2. A TOML file (`<config_dir>/cleanscan/config.toml`, or `--config <FILE>`)
//! 3. Environment variables prefixed with `CLEANSCAN_`, `__` for nesting
//!    (`CLEANSCAN_REPORT__TOP_N=5`)
//!
//! A missing file is not an error; a malformed one is.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::analytics::ReportConfig;
use crate::duplicates::FinderConfig;
use crate::index::DEFAULT_TTL;
use crate::scanner::{ScanConfig, DEFAULT_CHUNK_SIZE};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "CLEANSCAN_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How long an index stays valid, in seconds.
    pub cache_ttl_secs: u64,
    /// Descend into symlinked directories while scanning.
    pub follow_symlinks: bool,
    /// Skip dot-files and dot-directories while scanning.
    pub skip_hidden: bool,
    /// Confirm duplicates by content hash rather than size alone.
    pub compare_content: bool,
    /// Threads in the hashing pool.
    pub io_threads: usize,
    /// Read buffer for hashing, in bytes.
    pub hash_chunk_size: usize,
    /// Smallest file considered for duplicates, in bytes.
    pub min_duplicate_size: u64,
    /// Analytics thresholds.
    pub report: ReportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_ttl_secs: DEFAULT_TTL.as_secs(),
            follow_symlinks: false,
            skip_hidden: false,
            compare_content: true,
            io_threads: 4,
            hash_chunk_size: DEFAULT_CHUNK_SIZE,
            min_duplicate_size: 1,
            report: ReportConfig::default(),
        }
    }
}

impl Config {
    /// Load from the given file, or the platform default location.
    ///
    /// # Errors
    ///
    /// Fails on a malformed file, bad environment values, or settings
    /// rejected by [`validate`](Self::validate).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Ok(p) => p,
                Err(e) => {
                    log::debug!("No config directory ({e}), using defaults and environment");
                    return Self::extract(Self::figment(None));
                }
            },
        };
        Self::load_from_path(&path)
    }

    /// Load with `path` as the file layer.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if path.exists() {
            log::debug!("Loading configuration from {}", path.display());
        } else {
            log::debug!("No configuration file at {}", path.display());
        }
        Self::extract(Self::figment(Some(path)))
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// The layered provider stack without extracting it.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn extract(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().context("Failed to read configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no operation can run with.
    ///
    /// # Errors
    ///
    /// Returns an error naming the offending key.
    pub fn validate(&self) -> Result<()> {
        if self.io_threads == 0 {
            bail!("io_threads must be at least 1");
        }
        if self.hash_chunk_size == 0 {
            bail!("hash_chunk_size must be at least 1");
        }
        if self.cache_ttl_secs == 0 {
            bail!("cache_ttl_secs must be at least 1");
        }
        Ok(())
    }

    /// Write as TOML, creating parent directories.
    ///
    /// # Errors
    ///
    /// Fails when serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Platform-specific configuration path.
    ///
    /// # Errors
    ///
    /// Fails when no home directory can be determined.
    pub fn default_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("", "", "cleanscan")
            .context("Failed to determine project directories")?;
        Ok(project_dirs.config_dir().join("config.toml"))
    }

    /// Index time-to-live.
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Scanner settings.
    #[must_use]
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig::default()
            .with_follow_symlinks(self.follow_symlinks)
            .with_skip_hidden(self.skip_hidden)
    }

    /// Duplicate finder settings, without cancellation or progress.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_io_threads(self.io_threads)
            .with_min_size(self.min_duplicate_size)
            .with_hash_chunk_size(self.hash_chunk_size)
    }
}
