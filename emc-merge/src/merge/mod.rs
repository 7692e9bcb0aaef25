//! Grouping, merging and post-merge audit of resolved rows

pub mod best_measurement;
pub mod binning;
pub mod group_merger;
pub mod post_merge_auditor;

pub use group_merger::{display_name, GroupMerger};
pub use post_merge_auditor::{split_known_brown_dwarfs, PostMergeAuditor};
