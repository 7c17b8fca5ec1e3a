//! Cooperative cancellation.
//!
//! Long-running operations ([`Scanner::scan`](crate::scanner::Scanner::scan),
//! [`DuplicateFinder::find_duplicates`](crate::duplicates::DuplicateFinder::find_duplicates))
//! never get interrupted preemptively. Instead the coordinator flips a shared
//! [`CancelFlag`] and the worker polls it at well-defined points: the head of
//! each directory, after each entry, and between files/chunks while hashing.
//!
//! # Usage
//!
//! ```rust
//! use cleanscan::signal::CancelFlag;
//!
//! let flag = CancelFlag::new();
//! let worker_side = flag.clone();
//!
//! assert!(!worker_side.is_cancelled());
//! flag.cancel();
//! assert!(worker_side.is_cancelled());
//! ```
//!
//! The CLI additionally wires Ctrl+C to a flag via [`install_ctrlc`]; a run
//! stopped that way exits with [`EXIT_CODE_INTERRUPTED`].

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Exit code for SIGINT (128 + 2).
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Shared, clonable cancellation flag.
///
/// All clones observe the same state. Cancellation is sticky until
/// [`reset`](Self::reset) is called.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    flag: Arc<AtomicBool>,
}

impl CancelFlag {
    /// Create a flag in the "not cancelled" state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing atomic, e.g. one owned by an embedding application.
    #[must_use]
    pub fn from_arc(flag: Arc<AtomicBool>) -> Self {
        Self { flag }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Clear the flag so the same handle can drive another operation.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    /// The underlying atomic, for APIs that take `Arc<AtomicBool>` directly.
    #[must_use]
    pub fn as_arc(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

/// Errors from installing the Ctrl+C hook.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// The platform refused the handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_FLAG: OnceLock<CancelFlag> = OnceLock::new();

/// Install a process-wide Ctrl+C handler that cancels the returned flag.
///
/// `ctrlc` only accepts one handler per process, so repeated calls (tests,
/// embedding) hand back the already-registered flag after resetting it.
///
/// # Errors
///
/// Returns [`SignalError::InstallFailed`] when the handler cannot be
/// registered and no earlier registration exists.
pub fn install_ctrlc() -> Result<CancelFlag, SignalError> {
    if let Some(flag) = GLOBAL_FLAG.get() {
        flag.reset();
        return Ok(flag.clone());
    }

    let flag = CancelFlag::new();
    let hook = flag.clone();

    ctrlc::set_handler(move || {
        hook.cancel();
        let _ = writeln!(std::io::stderr(), "\nInterrupted, stopping...");
        let _ = std::io::stderr().flush();
        log::info!("Cancellation requested by signal");
    })?;

    let _ = GLOBAL_FLAG.set(flag.clone());
    Ok(flag)
}
