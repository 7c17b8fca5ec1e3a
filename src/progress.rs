//! Progress reporting.
//!
//! Every long-running operation reports a `(percent, message)` pair through a
//! [`ProgressCallback`]. The duplicate finder additionally streams each group
//! as soon as it is confirmed, surfaces at most one diagnostic for a
//! catastrophic failure, and always signals completion.
//!
//! Two implementations ship with the crate:
//! - [`Progress`]: an indicatif bar for the CLI.
//! - [`crate::worker`]'s channel reporter, which forwards everything as
//!   messages to the coordinating thread.

use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};

use crate::duplicates::DuplicateGroup;

/// Receiver of progress notifications.
///
/// Implementations must be cheap; they are called from worker threads
/// (including rayon pool threads while hashing).
pub trait ProgressCallback: Send + Sync {
    /// Overall progress of the operation.
    ///
    /// # Arguments
    ///
    /// * `percent` - 0..=100, never decreasing within one operation
    /// * `message` - Short human-readable status
    fn on_progress(&self, percent: u8, message: &str);

    /// A duplicate group was confirmed. Every group in the final result is
    /// reported here exactly once, before [`on_complete`](Self::on_complete).
    fn on_group_found(&self, _group: &DuplicateGroup) {}

    /// A whole-operation failure, reported once.
    fn on_diagnostic(&self, _message: &str) {}

    /// The operation is over (success, failure or cancellation).
    fn on_complete(&self) {}
}

/// Serializes percent updates so callers observe a non-decreasing sequence,
/// even when items finish out of order on a thread pool.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    last: Mutex<Option<u8>>,
}

impl ProgressTracker {
    /// Create a tracker that has not emitted anything yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `done / total` into the `[start, end]` percent band.
    #[must_use]
    pub fn scale(done: usize, total: usize, start: u8, end: u8) -> u8 {
        if total == 0 {
            return end;
        }
        let span = u64::from(end.saturating_sub(start));
        let done = done.min(total) as u64;
        start + (span * done / total as u64) as u8
    }

    /// Forward `percent` to `callback` unless it would go backwards or repeat
    /// the previous value.
    ///
    /// Returns whether the update was emitted.
    pub fn report(&self, callback: &dyn ProgressCallback, percent: u8, message: &str) -> bool {
        let percent = percent.min(100);
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if last.is_some_and(|prev| percent <= prev) {
            return false;
        }
        *last = Some(percent);
        // Held across the call so concurrent reporters cannot reorder.
        callback.on_progress(percent, message);
        true
    }

    /// Like [`report`](Self::report) but also emits repeats of the current
    /// percentage, for message-only updates.
    pub fn report_message(&self, callback: &dyn ProgressCallback, percent: u8, message: &str) {
        let percent = percent.min(100);
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let percent = last.map_or(percent, |prev| percent.max(prev));
        *last = Some(percent);
        callback.on_progress(percent, message);
    }
}

/// Terminal progress bar.
///
/// A single bar covers the whole operation since percentages are already
/// global; the message shows what is being processed.
pub struct Progress {
    bar: Option<ProgressBar>,
}

impl Progress {
    /// Create a reporter. With `quiet` nothing is drawn.
    ///
    /// # Examples
    ///
    /// ```
    /// use cleanscan::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        if quiet {
            return Self { bar: None };
        }
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template(
                "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█>-"),
        );
        Self { bar: Some(bar) }
    }
}

impl ProgressCallback for Progress {
    fn on_progress(&self, percent: u8, message: &str) {
        if let Some(ref bar) = self.bar {
            bar.set_position(u64::from(percent));
            bar.set_message(truncate_path(message, 40));
        }
    }

    fn on_diagnostic(&self, message: &str) {
        if let Some(ref bar) = self.bar {
            bar.println(format!("error: {message}"));
        }
    }

    fn on_complete(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

/// Shorten a status line that ends in a path, keeping the file name.
fn truncate_path(message: &str, max_len: usize) -> String {
    if message.chars().count() <= max_len {
        return message.to_string();
    }

    let file_name = std::path::Path::new(message)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let chars: Vec<char> = file_name.chars().collect();
    if chars.len() + 4 > max_len {
        let keep = max_len.saturating_sub(3);
        let tail: String = chars[chars.len().saturating_sub(keep)..].iter().collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}
