//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-based bucketing (Phase 1)
//! - Content hashing and grouping (Phase 2)
//! - Keep strategies for cleaning up confirmed groups

pub mod finder;
pub mod groups;
pub mod selection;

pub use finder::{DuplicateFinder, DuplicateMap, FinderConfig, FinderError, FinderStats};
pub use groups::{group_by_size, DuplicateGroup, GroupKey, GroupingStats};
pub use selection::{plan_removals, validate_preserves_copy, GroupPlan, KeepStrategy};
