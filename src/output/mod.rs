//! Output formatters for command results.
//!
//! - [`json`]: machine-readable documents for scripting
//! - [`text`]: colored, human-readable listings
//!
//! # Example
//!
//! ```no_run
//! use cleanscan::error::ExitCode;
//! use cleanscan::output::json::DupesJson;
//! use cleanscan::duplicates::DuplicateFinder;
//! use std::path::PathBuf;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let (groups, stats) = finder
//!     .find_duplicates(&[PathBuf::from("a.txt"), PathBuf::from("b.txt")], true)
//!     .unwrap();
//!
//! let doc = DupesJson::new(&groups, &stats, None, ExitCode::Success);
//! cleanscan::output::write_json(&mut std::io::stdout(), &doc, true).unwrap();
//! ```

pub mod json;
pub mod text;

use std::io::Write;

use serde::Serialize;

pub use json::{DupesJson, IndexJson, LookupJson, ScanSummaryJson, SearchJson};

/// Errors that can occur while writing output.
#[derive(thiserror::Error, Debug)]
pub enum OutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error while writing output: {0}")]
    Io(#[from] std::io::Error),
}

/// Serialize `value` to `writer`, followed by a newline.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<W: Write, T: Serialize>(
    writer: &mut W,
    value: &T,
    pretty: bool,
) -> Result<(), OutputError> {
    if pretty {
        serde_json::to_writer_pretty(&mut *writer, value)?;
    } else {
        serde_json::to_writer(&mut *writer, value)?;
    }
    writer.write_all(b"\n")?;
    Ok(())
}
