//! Ready-made filters: file categories, quick extension filters and date
//! presets.

use chrono::{Local, NaiveDate, NaiveTime, TimeZone};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::DateRange;
use crate::scanner::extension_of;

const DAY: i64 = 24 * 60 * 60;

/// Broad file kind derived from the extension.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    /// Office documents and PDFs
    Documents,
    /// Raster and vector images
    Images,
    /// Video containers
    Videos,
    /// Audio files
    Audio,
    /// Compressed archives
    Archives,
    /// Installers and executables
    Programs,
    /// Plain text, markup and config files
    Text,
    /// Everything else
    Other,
}

impl FileCategory {
    /// Every category, in display order.
    pub const ALL: [Self; 8] = [
        Self::Documents,
        Self::Images,
        Self::Videos,
        Self::Audio,
        Self::Archives,
        Self::Programs,
        Self::Text,
        Self::Other,
    ];

    /// Extensions (lowercase, with dot) belonging to this category.
    #[must_use]
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Documents => &[
                ".pdf", ".doc", ".docx", ".txt", ".rtf", ".odt", ".xls", ".xlsx", ".ppt", ".pptx",
                ".ods", ".odp",
            ],
            Self::Images => &[
                ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".svg", ".webp", ".ico",
            ],
            Self::Videos => &[
                ".mp4", ".avi", ".mkv", ".mov", ".wmv", ".flv", ".webm", ".m4v", ".3gp",
            ],
            Self::Audio => &[".mp3", ".wav", ".flac", ".aac", ".ogg", ".wma", ".m4a", ".opus"],
            Self::Archives => &[".zip", ".rar", ".7z", ".tar", ".gz", ".bz2", ".xz"],
            Self::Programs => &[".exe", ".msi", ".deb", ".rpm", ".dmg", ".pkg", ".app"],
            Self::Text => &[
                ".md", ".rst", ".log", ".ini", ".cfg", ".conf", ".yaml", ".yml", ".json", ".xml",
                ".csv",
            ],
            Self::Other => &[],
        }
    }

    /// Category of a file name. The first matching category wins.
    ///
    /// # Example
    ///
    /// ```
    /// use cleanscan::view::presets::FileCategory;
    ///
    /// assert_eq!(FileCategory::of("Holiday.JPG"), FileCategory::Images);
    /// assert_eq!(FileCategory::of("notes.txt"), FileCategory::Documents);
    /// assert_eq!(FileCategory::of("Makefile"), FileCategory::Other);
    /// ```
    #[must_use]
    pub fn of(name: &str) -> Self {
        let lower = name.to_lowercase();
        let Some(ext) = extension_of(&lower) else {
            return Self::Other;
        };
        Self::ALL
            .into_iter()
            .find(|c| c.extensions().contains(&ext))
            .unwrap_or(Self::Other)
    }

    /// Human-readable name.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Documents => "Documents",
            Self::Images => "Images",
            Self::Videos => "Videos",
            Self::Audio => "Audio",
            Self::Archives => "Archives",
            Self::Programs => "Programs",
            Self::Text => "Text",
            Self::Other => "Other",
        }
    }
}

/// One-click extension filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuickFilter {
    /// Pictures, including camera raw and layered formats
    Images,
    /// Documents, spreadsheets, presentations
    Documents,
    /// Video files
    Video,
    /// Archives; `x.tar.gz` is matched through `.gz`
    Archives,
    /// Audio files
    Audio,
}

impl QuickFilter {
    /// Extension allow list for [`ViewFilter::extensions`](super::ViewFilter::extensions).
    #[must_use]
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Images => &[
                ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".tif", ".svg", ".webp", ".ico",
                ".psd", ".raw", ".heic", ".heif",
            ],
            Self::Documents => &[
                ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".txt", ".rtf", ".odt",
                ".ods", ".odp", ".pages", ".numbers", ".key", ".md",
            ],
            Self::Video => &[
                ".mp4", ".avi", ".mov", ".wmv", ".mkv", ".flv", ".webm", ".m4v", ".3gp", ".mpg",
                ".mpeg", ".vob", ".ts", ".mts", ".m2ts",
            ],
            Self::Archives => &[
                ".zip", ".rar", ".7z", ".tar", ".gz", ".bz2", ".xz", ".7zip", ".ace", ".arj", ".cab",
                ".lzh", ".z", ".tgz", ".tbz2",
            ],
            Self::Audio => FileCategory::Audio.extensions(),
        }
    }
}

/// Relative date windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DatePreset {
    /// Modified within the last 7 days
    LastWeek,
    /// Modified within the last 30 days
    LastMonth,
    /// Modified within the last 365 days
    LastYear,
    /// Not modified for more than 365 days
    OlderThanYear,
}

impl DatePreset {
    /// Window relative to `now` (epoch seconds).
    #[must_use]
    pub fn range(self, now: i64) -> DateRange {
        match self {
            Self::LastWeek => DateRange::new(now - 7 * DAY, now),
            Self::LastMonth => DateRange::new(now - 30 * DAY, now),
            Self::LastYear => DateRange::new(now - 365 * DAY, now),
            Self::OlderThanYear => DateRange::new(i64::MIN, now - 365 * DAY),
        }
    }
}

impl DateRange {
    /// Whole local days from `from` 00:00:00 to `to` 23:59:59.
    ///
    /// # Example
    ///
    /// ```
    /// use cleanscan::view::DateRange;
    /// use chrono::NaiveDate;
    ///
    /// let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    /// let range = DateRange::from_days(day, day);
    /// assert_eq!(range.max - range.min, 24 * 60 * 60 - 1);
    /// ```
    #[must_use]
    pub fn from_days(from: NaiveDate, to: NaiveDate) -> Self {
        let start = local_timestamp(from, NaiveTime::MIN);
        let end = NaiveTime::from_hms_opt(23, 59, 59).map_or(start, |t| local_timestamp(to, t));
        Self::new(start, end)
    }
}

/// Epoch seconds of a local wall-clock time; ambiguous times take the
/// earlier instant, nonexistent ones fall back to UTC.
fn local_timestamp(date: NaiveDate, time: NaiveTime) -> i64 {
    let naive = date.and_time(time);
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map_or_else(|| naive.and_utc().timestamp(), |dt| dt.timestamp())
}
