//! Human-readable output.
//!
//! Colors come from `yansi` and follow its global switch, so `--no-color`
//! (or `NO_COLOR`) only has to call [`yansi::disable`].

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use bytesize::ByteSize;
use yansi::Paint;

use crate::analytics::IndexReport;
use crate::duplicates::{DuplicateMap, FinderStats, GroupPlan};
use crate::index::ScanStats;
use crate::view::VisibleSet;

/// Extensions listed in the index summary.
const TOP_EXTENSIONS: usize = 10;

/// Format a byte count with binary units.
#[must_use]
pub fn format_size(bytes: u64) -> String {
    ByteSize::b(bytes).to_string()
}

/// Summary of an index.
///
/// # Errors
///
/// Propagates write failures.
pub fn write_index_report<W: Write>(w: &mut W, report: &IndexReport, stats: &ScanStats) -> io::Result<()> {
    writeln!(w, "{}", report.root.display().bold())?;
    writeln!(
        w,
        "  {} files, {} directories, {}",
        report.files,
        report.directories,
        format_size(report.total_size).bold()
    )?;
    writeln!(w, "  scanned in {:.2?}", stats.duration)?;

    if !report.by_extension.is_empty() {
        writeln!(w)?;
        writeln!(w, "{}", "Largest extensions".underline())?;
        for (ext, ext_stats) in report.top_extensions(TOP_EXTENSIONS) {
            let label = if ext.is_empty() { "(none)" } else { ext };
            writeln!(
                w,
                "  {:<12} {:>7} files  {:>12}",
                label,
                ext_stats.count,
                format_size(ext_stats.size)
            )?;
        }
    }

    if !report.by_category.is_empty() {
        writeln!(w)?;
        writeln!(w, "{}", "Categories".underline())?;
        for (category, cat_stats) in &report.by_category {
            writeln!(
                w,
                "  {:<12} {:>7} files  {:>12}",
                category.label(),
                cat_stats.count,
                format_size(cat_stats.size)
            )?;
        }
    }

    if report.large_file_count > 0 {
        writeln!(w)?;
        writeln!(w, "{} ({})", "Large files".underline(), report.large_file_count)?;
        for file in &report.large_files {
            writeln!(w, "  {:>12}  {}", format_size(file.size).yellow(), file.path.display())?;
        }
    }

    if report.old_file_count > 0 {
        writeln!(w)?;
        writeln!(w, "{} ({})", "Old files".underline(), report.old_file_count)?;
        for file in &report.old_files {
            writeln!(w, "  {}  {}", file.modified.dim(), file.path.display())?;
        }
    }

    write_scan_problems(w, stats)
}

/// Warn about unreadable entries, if any.
///
/// # Errors
///
/// Propagates write failures.
pub fn write_scan_problems<W: Write>(w: &mut W, stats: &ScanStats) -> io::Result<()> {
    if !stats.is_partial() {
        return Ok(());
    }
    writeln!(w)?;
    writeln!(
        w,
        "{} {} entries unreadable, {} directories skipped",
        "warning:".yellow().bold(),
        stats.unreadable_entries,
        stats.skipped_directories
    )?;
    for error in stats.errors.iter().take(5) {
        writeln!(w, "  {}", error.dim())?;
    }
    if stats.errors.len() > 5 {
        writeln!(w, "  ... and {} more", stats.errors.len() - 5)?;
    }
    Ok(())
}

/// Indented tree listing of a view.
///
/// # Errors
///
/// Propagates write failures.
pub fn write_view<W: Write>(w: &mut W, view: &VisibleSet) -> io::Result<()> {
    for row in view.rows() {
        let indent = "  ".repeat(row.depth);
        if row.is_dir {
            writeln!(w, "{indent}{}/", row.name.blue().bold())?;
        } else {
            let size = row.size.map_or_else(|| "?".to_string(), format_size);
            writeln!(w, "{indent}{}  {}  {}", row.name, size.dim(), row.modified.dim())?;
        }
    }
    writeln!(w, "{} files shown", view.file_count())
}

/// Paths matching a lookup.
///
/// # Errors
///
/// Propagates write failures.
pub fn write_lookup<W: Write>(w: &mut W, term: &str, matches: &[&Path]) -> io::Result<()> {
    for path in matches {
        writeln!(w, "{}", path.display())?;
    }
    writeln!(w, "{} entries contain \"{}\"", matches.len(), term.bold())
}

/// Duplicate groups, with removal marks when a plan is given.
///
/// # Errors
///
/// Propagates write failures.
pub fn write_duplicates<W: Write>(
    w: &mut W,
    groups: &DuplicateMap,
    stats: &FinderStats,
    plans: Option<&[GroupPlan]>,
) -> io::Result<()> {
    let removals: HashMap<&PathBuf, bool> = plans
        .unwrap_or_default()
        .iter()
        .flat_map(|p| {
            p.keep
                .iter()
                .map(|k| (k, false))
                .chain(p.remove.iter().map(|r| (r, true)))
        })
        .collect();

    for (n, group) in groups.values().enumerate() {
        let label = if group.is_content_match() {
            "identical"
        } else {
            "same size"
        };
        writeln!(
            w,
            "{} {} files, {} each, {}",
            format!("Group {}:", n + 1).bold(),
            group.len(),
            format_size(group.size),
            label.dim()
        )?;
        for path in &group.files {
            match removals.get(path) {
                Some(true) => writeln!(w, "  {} {}", "remove".red(), path.display())?,
                Some(false) => writeln!(w, "  {}   {}", "keep".green(), path.display())?,
                None => writeln!(w, "  {}", path.display())?,
            }
        }
        writeln!(w)?;
    }

    writeln!(
        w,
        "{} duplicate groups, {} redundant files, {} reclaimable",
        stats.duplicate_groups,
        stats.duplicate_files,
        format_size(stats.reclaimable_space).bold()
    )?;
    if let Some(plans) = plans {
        let planned: usize = plans.iter().map(|p| p.remove.len()).sum();
        let freed: u64 = plans
            .iter()
            .filter_map(|p| groups.get(&p.key).map(|g| p.reclaimed(g)))
            .sum();
        writeln!(w, "plan removes {planned} files, freeing {}", format_size(freed))?;
    }
    if stats.is_partial() {
        writeln!(
            w,
            "{} {} files could not be read",
            "warning:".yellow().bold(),
            stats.unreadable_files + stats.failed_hashes
        )?;
    }
    Ok(())
}
