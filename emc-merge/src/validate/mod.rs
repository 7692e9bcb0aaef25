//! Pre-merge data-quality annotation

pub mod conflict_detector;

pub use conflict_detector::{ConflictDetector, ConflictSummary, GroupingKey};
