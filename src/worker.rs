//! Background execution.
//!
//! A scan or duplicate search runs on its own thread and talks to the
//! coordinator only through a channel of [`WorkerEvent`]s. Every job ends
//! with exactly one [`WorkerEvent::Finished`], even when the job body
//! panics.
//!
//! ```no_run
//! use cleanscan::scanner::ScanConfig;
//! use cleanscan::worker::{spawn_scan, Outcome, WorkerEvent};
//!
//! let worker = spawn_scan("/home/me/Downloads".into(), ScanConfig::default());
//! let outcome = worker.wait_with(|event| {
//!     if let WorkerEvent::Progress { percent, message } = event {
//!         println!("{percent:>3}% {message}");
//!     }
//! });
//! if let Outcome::Completed(index) = outcome {
//!     println!("{} entries", index.len());
//! }
//! ```

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::duplicates::{DuplicateFinder, DuplicateGroup, DuplicateMap, FinderConfig, FinderError, FinderStats};
use crate::index::Index;
use crate::progress::ProgressCallback;
use crate::scanner::{ScanConfig, ScanError, Scanner};
use crate::signal::CancelFlag;

/// Result of a duplicate search job.
pub type DuplicateResult = (DuplicateMap, FinderStats);

/// How a job ended.
#[derive(Debug)]
pub enum Outcome<T> {
    /// The job produced a result.
    Completed(T),
    /// The job stopped because the cancel flag was set.
    Cancelled,
    /// The job failed as a whole.
    Failed(String),
}

impl<T> Outcome<T> {
    /// Whether this is [`Outcome::Completed`].
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// The result, if any.
    #[must_use]
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            _ => None,
        }
    }
}

/// Messages from a worker thread.
#[derive(Debug)]
pub enum WorkerEvent<T> {
    /// Overall progress, non-decreasing within a job.
    Progress {
        /// 0..=100
        percent: u8,
        /// Status line
        message: String,
    },
    /// A confirmed duplicate group (duplicate searches only).
    GroupFound(DuplicateGroup),
    /// A whole-job problem, sent before the terminal event.
    Diagnostic(String),
    /// Terminal event, sent exactly once.
    Finished(Outcome<T>),
}

/// Forwards callbacks into the channel. Send failures mean the coordinator
/// has gone away and are ignored.
struct ChannelReporter<T> {
    tx: Sender<WorkerEvent<T>>,
}

impl<T: Send> ProgressCallback for ChannelReporter<T> {
    fn on_progress(&self, percent: u8, message: &str) {
        let _ = self.tx.send(WorkerEvent::Progress {
            percent,
            message: message.to_string(),
        });
    }

    fn on_group_found(&self, group: &DuplicateGroup) {
        let _ = self.tx.send(WorkerEvent::GroupFound(group.clone()));
    }

    fn on_diagnostic(&self, message: &str) {
        let _ = self.tx.send(WorkerEvent::Diagnostic(message.to_string()));
    }
}

/// Sends the terminal event; reports a failure if dropped without one.
struct FinishGuard<T> {
    tx: Sender<WorkerEvent<T>>,
    sent: bool,
}

impl<T> FinishGuard<T> {
    fn finish(mut self, outcome: Outcome<T>) {
        let _ = self.tx.send(WorkerEvent::Finished(outcome));
        self.sent = true;
    }
}

impl<T> Drop for FinishGuard<T> {
    fn drop(&mut self) {
        if !self.sent {
            log::error!("Worker stopped without a result");
            let _ = self
                .tx
                .send(WorkerEvent::Finished(Outcome::Failed("worker panicked".to_string())));
        }
    }
}

/// Handle to a running job.
#[derive(Debug)]
pub struct Worker<T> {
    cancel: CancelFlag,
    events: Receiver<WorkerEvent<T>>,
    handle: Option<JoinHandle<()>>,
}

impl<T> Worker<T> {
    /// Ask the job to stop. It finishes with [`Outcome::Cancelled`] unless
    /// it was already done.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The flag the job polls.
    #[must_use]
    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    /// Raw event stream.
    #[must_use]
    pub fn events(&self) -> &Receiver<WorkerEvent<T>> {
        &self.events
    }

    /// Wait up to `timeout` for the next event.
    ///
    /// Returns `None` on timeout or once the job's channel is closed.
    pub fn next_event(&self, timeout: Duration) -> Option<WorkerEvent<T>> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Block until the job ends, passing every non-terminal event to
    /// `on_event`, and return the outcome.
    pub fn wait_with<F>(mut self, mut on_event: F) -> Outcome<T>
    where
        F: FnMut(WorkerEvent<T>),
    {
        let mut outcome = None;
        for event in self.events.iter() {
            match event {
                WorkerEvent::Finished(o) => {
                    outcome = Some(o);
                    break;
                }
                other => on_event(other),
            }
        }
        self.join();
        outcome.unwrap_or_else(|| Outcome::Failed("worker channel closed".to_string()))
    }

    /// Block until the job ends, discarding intermediate events.
    pub fn wait(self) -> Outcome<T> {
        self.wait_with(|_| {})
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::debug!("Worker thread panicked");
            }
        }
    }
}

fn spawn_job<T, F>(name: &str, cancel: CancelFlag, job: F) -> Worker<T>
where
    T: Send + 'static,
    F: FnOnce(Arc<ChannelReporter<T>>, CancelFlag) -> Outcome<T> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let reporter = Arc::new(ChannelReporter { tx: tx.clone() });
    let guard = FinishGuard { tx, sent: false };
    let flag = cancel.clone();

    let spawned = thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            let outcome = job(reporter, flag);
            guard.finish(outcome);
        });

    let handle = match spawned {
        Ok(handle) => Some(handle),
        Err(e) => {
            // The closure, and with it the guard, is dropped on failure, so
            // the receiver still gets a terminal event.
            log::error!("Failed to start {name} thread: {e}");
            None
        }
    };

    Worker {
        cancel,
        events: rx,
        handle,
    }
}

/// Scan `root` on a background thread.
#[must_use]
pub fn spawn_scan(root: PathBuf, config: ScanConfig) -> Worker<Index> {
    spawn_scan_with_cancel(root, config, CancelFlag::new())
}

/// [`spawn_scan`] polling an existing flag, e.g. one wired to Ctrl+C.
#[must_use]
pub fn spawn_scan_with_cancel(root: PathBuf, config: ScanConfig, cancel: CancelFlag) -> Worker<Index> {
    spawn_job("cleanscan-scan", cancel, move |reporter, flag| {
        let scanner = Scanner::new(config)
            .with_cancel_flag(flag)
            .with_progress_callback(reporter);
        match scanner.scan(&root) {
            Ok(index) => Outcome::Completed(index),
            Err(ScanError::Interrupted) => Outcome::Cancelled,
            Err(e) => Outcome::Failed(e.to_string()),
        }
    })
}

/// Search `paths` for duplicates on a background thread.
///
/// Uses `config.cancel` when set, otherwise a fresh flag. Any progress
/// callback in `config` is replaced by the channel.
#[must_use]
pub fn spawn_duplicates(
    paths: Vec<PathBuf>,
    compare_content: bool,
    config: FinderConfig,
) -> Worker<DuplicateResult> {
    let cancel = config.cancel.clone().unwrap_or_default();
    spawn_job("cleanscan-dupes", cancel, move |reporter, flag| {
        let finder = DuplicateFinder::new(
            config
                .with_cancel_flag(flag)
                .with_progress_callback(reporter),
        );
        match finder.find_duplicates(&paths, compare_content) {
            Ok(result) => Outcome::Completed(result),
            Err(FinderError::Interrupted) => Outcome::Cancelled,
            Err(e) => Outcome::Failed(e.to_string()),
        }
    })
}
