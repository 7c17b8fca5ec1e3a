//! cleanscan - filesystem indexing, search and duplicate detection
//!
//! The library scans a directory tree once into an in-memory [`index::Index`],
//! answers substring lookups and filtered tree views from it, and finds
//! duplicate files by size and then SHA-256 content hash. Long operations
//! report progress through [`progress::ProgressCallback`], stop cooperatively
//! through [`signal::CancelFlag`], and can run on background threads via
//! [`worker`].
//!
//! ```no_run
//! use cleanscan::duplicates::DuplicateFinder;
//! use cleanscan::scanner::{ScanConfig, Scanner};
//! use cleanscan::view::{build_view, ViewFilter};
//! use std::path::Path;
//!
//! let index = Scanner::new(ScanConfig::default()).scan(Path::new("/data")).unwrap();
//!
//! let view = build_view(&index, &ViewFilter::new().with_extensions(["pdf"]));
//! println!("{} PDFs", view.file_count());
//!
//! let (groups, _stats) = DuplicateFinder::with_defaults()
//!     .find_duplicates_in_index(&index, true)
//!     .unwrap();
//! println!("{} duplicate groups", groups.len());
//! ```

pub mod analytics;
pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod index;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;
pub mod view;
pub mod worker;

pub use app::run_app;
