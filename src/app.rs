//! Command orchestration.
//!
//! [`App`] owns what lives for a whole session: the configuration, the
//! cancel flag and the index cache. Scans and duplicate searches run on
//! background workers while the calling thread drives the progress bar.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use anyhow::{anyhow, bail, Context, Result};

use crate::analytics::IndexReport;
use crate::cache::IndexCache;
use crate::cli::{Cli, Commands, DupesArgs, IndexArgs, KeepArg, LookupArgs, OutputFormat, ScanArgs, SearchArgs};
use crate::config::Config;
use crate::duplicates::selection::plan_removals;
use crate::duplicates::{FinderError, KeepStrategy};
use crate::error::ExitCode;
use crate::index::Index;
use crate::logging::init_logging;
use crate::output::{self, text, DupesJson, IndexJson, LookupJson, SearchJson};
use crate::progress::{Progress, ProgressCallback};
use crate::scanner::{epoch_seconds, ScanConfig, ScanError};
use crate::signal::{install_ctrlc, CancelFlag};
use crate::view::{build_view, DateRange, ViewFilter};
use crate::worker::{spawn_duplicates, spawn_scan_with_cancel, Outcome, WorkerEvent};

/// Parse-independent entry point for the binary.
///
/// # Errors
///
/// Returns configuration, scan and output failures. Cancellation surfaces
/// as [`ScanError::Interrupted`] or [`FinderError::Interrupted`] in the
/// error chain.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    let config = Config::load(cli.config.as_deref())?;
    let cancel = match install_ctrlc() {
        Ok(flag) => flag,
        Err(e) => {
            log::warn!("{e}; Ctrl+C will not stop gracefully");
            CancelFlag::new()
        }
    };

    let mut app = App::new(config, cancel, cli.quiet);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    app.run(cli.command, &mut out)
}

/// Session state shared by commands.
#[derive(Debug)]
pub struct App {
    config: Config,
    cancel: CancelFlag,
    cache: IndexCache,
    cached_with: Option<ScanConfig>,
    quiet: bool,
}

impl App {
    /// Create a session. `quiet` hides progress bars.
    #[must_use]
    pub fn new(config: Config, cancel: CancelFlag, quiet: bool) -> Self {
        let cache = IndexCache::new(config.cache_ttl());
        Self {
            config,
            cancel,
            cache,
            cached_with: None,
            quiet,
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Forget the cached index. Call after changing files under its root.
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
        self.cached_with = None;
    }

    /// Index for `root`, from the cache when still valid.
    ///
    /// # Errors
    ///
    /// Fails when the scan fails or is cancelled.
    pub fn index(&mut self, root: &Path, scan: &ScanArgs) -> Result<Arc<Index>> {
        let scan_config = self.scan_config(scan);
        if self.cached_with.as_ref() == Some(&scan_config) {
            if let Some(index) = self.cache.get(root, SystemTime::now()) {
                log::debug!("Reusing index of {}", root.display());
                return Ok(index);
            }
        }

        self.invalidate();
        let index = self
            .scan(root, scan_config.clone())
            .with_context(|| format!("Failed to scan {}", root.display()))?;
        self.cached_with = Some(scan_config);
        Ok(self.cache.store(index))
    }

    /// Run one command, writing results to `out`.
    ///
    /// # Errors
    ///
    /// See [`run_app`].
    pub fn run<W: Write>(&mut self, command: Commands, out: &mut W) -> Result<ExitCode> {
        match command {
            Commands::Index(args) => self.run_index(&args, out),
            Commands::Search(args) => self.run_search(&args, out),
            Commands::Lookup(args) => self.run_lookup(&args, out),
            Commands::Dupes(args) => self.run_dupes(&args, out),
        }
    }

    fn run_index<W: Write>(&mut self, args: &IndexArgs, out: &mut W) -> Result<ExitCode> {
        let index = self.index(&args.path, &args.scan)?;
        let report = IndexReport::from_index(&index, &self.config.report, SystemTime::now());
        let code = if index.stats().is_partial() {
            ExitCode::PartialSuccess
        } else {
            ExitCode::Success
        };

        match args.output {
            OutputFormat::Json => {
                output::write_json(out, &IndexJson::new(&report, index.stats(), code), true)?;
            }
            OutputFormat::Text => text::write_index_report(out, &report, index.stats())?,
        }
        Ok(code)
    }

    fn run_search<W: Write>(&mut self, args: &SearchArgs, out: &mut W) -> Result<ExitCode> {
        let filter = search_filter(args, epoch_seconds(SystemTime::now()));
        let index = self.index(&args.path, &args.scan)?;
        let view = build_view(&index, &filter);
        log::debug!("{} of {} entries visible", view.len(), index.len());

        let code = if filter.is_active() && view.file_count() == 0 {
            ExitCode::NothingFound
        } else if index.stats().is_partial() {
            ExitCode::PartialSuccess
        } else {
            ExitCode::Success
        };

        match args.output {
            OutputFormat::Json => {
                let doc = SearchJson::new(index.root(), &filter, &view, index.stats(), code);
                output::write_json(out, &doc, true)?;
            }
            OutputFormat::Text => {
                text::write_view(out, &view)?;
                text::write_scan_problems(out, index.stats())?;
            }
        }
        Ok(code)
    }

    fn run_lookup<W: Write>(&mut self, args: &LookupArgs, out: &mut W) -> Result<ExitCode> {
        let index = self.index(&args.path, &args.scan)?;
        let matches: Vec<&Path> = index.lookup_substring(&args.term).into_iter().collect();
        let code = if matches.is_empty() {
            ExitCode::NothingFound
        } else {
            ExitCode::Success
        };

        match args.output {
            OutputFormat::Json => {
                output::write_json(out, &LookupJson::new(&args.term, matches, code), true)?;
            }
            OutputFormat::Text => text::write_lookup(out, &args.term, &matches)?,
        }
        Ok(code)
    }

    fn run_dupes<W: Write>(&mut self, args: &DupesArgs, out: &mut W) -> Result<ExitCode> {
        let (paths, scan_partial) = self.collect_paths(&args.paths, &args.scan)?;
        let compare_content = self.config.compare_content && !args.size_only;

        let mut finder_config = self.config.finder_config().with_cancel_flag(self.cancel.clone());
        if let Some(min_size) = args.min_size {
            finder_config = finder_config.with_min_size(min_size);
        }
        if let Some(threads) = args.io_threads {
            finder_config = finder_config.with_io_threads(threads);
        }

        let progress = Progress::new(self.quiet);
        let outcome = spawn_duplicates(paths, compare_content, finder_config).wait_with(|event| {
            if let WorkerEvent::GroupFound(ref group) = event {
                log::debug!("Confirmed group {} ({} files)", group.key, group.len());
            }
            forward(&progress, event);
        });
        progress.on_complete();

        let (groups, stats) = match outcome {
            Outcome::Completed(result) => result,
            Outcome::Cancelled => return Err(FinderError::Interrupted.into()),
            Outcome::Failed(msg) => bail!("Duplicate search failed: {msg}"),
        };

        let strategy = match (&args.keep, &args.keep_in) {
            (Some(KeepArg::Newest), _) => Some(KeepStrategy::Newest),
            (Some(KeepArg::Oldest), _) => Some(KeepStrategy::Oldest),
            (Some(KeepArg::First), _) => Some(KeepStrategy::First),
            (None, Some(dir)) => Some(KeepStrategy::InLocation(absolute(dir)?)),
            (None, None) => None,
        };
        let plans = strategy.map(|s| plan_removals(groups.values(), &s));

        let code = if groups.is_empty() {
            ExitCode::NothingFound
        } else if scan_partial || stats.is_partial() {
            ExitCode::PartialSuccess
        } else {
            ExitCode::Success
        };

        match args.output {
            OutputFormat::Json => {
                let doc = DupesJson::new(&groups, &stats, plans.as_deref(), code);
                output::write_json(out, &doc, true)?;
            }
            OutputFormat::Text => {
                text::write_duplicates(out, &groups, &stats, plans.as_deref())?;
            }
        }
        Ok(code)
    }

    /// Directories contribute every indexed file, files themselves.
    fn collect_paths(&mut self, inputs: &[PathBuf], scan: &ScanArgs) -> Result<(Vec<PathBuf>, bool)> {
        let mut paths = Vec::new();
        let mut partial = false;
        for input in inputs {
            if input.is_dir() {
                let index = self.index(input, scan)?;
                partial |= index.stats().is_partial();
                paths.extend(index.file_paths());
            } else if input.exists() {
                paths.push(absolute(input)?);
            } else {
                bail!("Path not found: {}", input.display());
            }
        }
        Ok((paths, partial))
    }

    fn scan_config(&self, scan: &ScanArgs) -> ScanConfig {
        self.config
            .scan_config()
            .with_follow_symlinks(self.config.follow_symlinks || scan.follow_symlinks)
            .with_skip_hidden(self.config.skip_hidden || scan.skip_hidden)
    }

    fn scan(&self, root: &Path, config: ScanConfig) -> Result<Index> {
        let progress = Progress::new(self.quiet);
        let worker = spawn_scan_with_cancel(root.to_path_buf(), config, self.cancel.clone());
        let outcome = worker.wait_with(|event| forward(&progress, event));
        progress.on_complete();

        match outcome {
            Outcome::Completed(index) => Ok(index),
            Outcome::Cancelled => Err(ScanError::Interrupted.into()),
            Outcome::Failed(msg) => Err(anyhow!(msg)),
        }
    }
}

fn forward<T>(progress: &Progress, event: WorkerEvent<T>) {
    match event {
        WorkerEvent::Progress { percent, message } => progress.on_progress(percent, &message),
        WorkerEvent::Diagnostic(message) => progress.on_diagnostic(&message),
        WorkerEvent::GroupFound(_) | WorkerEvent::Finished(_) => {}
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("Cannot resolve {}", path.display()))
}

/// Filter described by `search` arguments, with date presets relative to `now`.
#[must_use]
pub fn search_filter(args: &SearchArgs, now: i64) -> ViewFilter {
    let mut filter = ViewFilter::new().with_extensions(&args.extensions);
    if let Some(term) = &args.term {
        filter = filter.with_search_term(term.as_str());
    }
    if let Some(preset) = args.preset {
        filter = filter.with_extensions(preset.extensions());
    }
    if let Some(preset) = args.date_preset {
        filter = filter.with_date_range(preset.range(now));
    } else if args.since.is_some() || args.until.is_some() {
        let min = args
            .since
            .map_or(i64::MIN, |day| DateRange::from_days(day, day).min);
        let max = args
            .until
            .map_or(i64::MAX, |day| DateRange::from_days(day, day).max);
        filter = filter.with_date_range(DateRange::new(min, max));
    }
    filter
}
