//! Command-line interface definitions.
//!
//! Global options (verbosity, color, config file) apply to every subcommand.
//!
//! ```bash
//! # Scan a tree and print a summary
//! cleanscan index ~/Downloads
//!
//! # Filtered tree view
//! cleanscan search ~/Downloads --term invoice --ext pdf --since 2024-01-01
//!
//! # Duplicates in a tree, with a removal plan keeping the newest copy
//! cleanscan dupes ~/Downloads --keep newest --output json
//! ```

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::view::presets::{DatePreset, QuickFilter};

/// Index, search and find duplicates in a directory tree.
#[derive(Debug, Parser)]
#[command(name = "cleanscan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a directory and summarize it
    Index(IndexArgs),
    /// Show the tree filtered by name, extension and date
    Search(SearchArgs),
    /// List entries whose name contains a substring
    Lookup(LookupArgs),
    /// Find duplicate files
    Dupes(DupesArgs),
}

/// Traversal options shared by the scanning subcommands.
#[derive(Debug, Clone, Default, Args)]
pub struct ScanArgs {
    /// Follow symbolic links during scan
    ///
    /// Symlink loops are detected and skipped.
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,
}

/// Arguments for `index`.
#[derive(Debug, Args)]
pub struct IndexArgs {
    /// Directory to scan
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    #[command(flatten)]
    pub scan: ScanArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for `search`.
#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Directory to scan
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Case-insensitive name substring
    #[arg(short, long, value_name = "TEXT")]
    pub term: Option<String>,

    /// Allowed extensions, comma separated or repeated (e.g. pdf,.docx)
    #[arg(short, long = "ext", value_name = "EXT", value_delimiter = ',')]
    pub extensions: Vec<String>,

    /// Predefined extension list, combined with --ext
    #[arg(long, value_enum)]
    pub preset: Option<QuickFilter>,

    /// Modified on or after this day (YYYY-MM-DD, local time)
    #[arg(long, value_name = "DATE", value_parser = parse_date, conflicts_with = "date_preset")]
    pub since: Option<NaiveDate>,

    /// Modified on or before this day (YYYY-MM-DD, local time)
    #[arg(long, value_name = "DATE", value_parser = parse_date, conflicts_with = "date_preset")]
    pub until: Option<NaiveDate>,

    /// Relative date window
    #[arg(long, value_enum)]
    pub date_preset: Option<DatePreset>,

    #[command(flatten)]
    pub scan: ScanArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for `lookup`.
#[derive(Debug, Args)]
pub struct LookupArgs {
    /// Directory to scan
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Substring to look up (case-insensitive)
    #[arg(value_name = "TERM")]
    pub term: String,

    #[command(flatten)]
    pub scan: ScanArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for `dupes`.
#[derive(Debug, Args)]
pub struct DupesArgs {
    /// Directories (searched as a whole) or individual files
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Treat same-size files as duplicates without reading them
    #[arg(long)]
    pub size_only: bool,

    /// Minimum file size to consider (e.g., 1KB, 1MB, 1GB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Number of I/O threads for hashing
    ///
    /// Lower values reduce disk thrashing on HDDs.
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Show which copies a cleanup would remove, keeping one per group
    #[arg(long, value_enum, conflicts_with = "keep_in")]
    pub keep: Option<KeepArg>,

    /// Show a removal plan keeping the copies under this directory
    #[arg(long, value_name = "DIR")]
    pub keep_in: Option<PathBuf>,

    #[command(flatten)]
    pub scan: ScanArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Which copy `--keep` preserves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KeepArg {
    /// Most recently modified
    Newest,
    /// Least recently modified
    Oldest,
    /// First in path order
    First,
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a `YYYY-MM-DD` day.
///
/// # Errors
///
/// Returns a message when the string is not a valid calendar date.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| format!("Invalid date '{s}' (expected YYYY-MM-DD): {e}"))
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use cleanscan::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// assert_eq!(parse_size("1MiB").unwrap(), 1_048_576);
/// ```
///
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    if num < 0.0 {
        return Err("Size cannot be negative".to_string());
    }

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
