pub mod deletion_plan;
pub mod group;
pub mod grouping;
pub mod missing_files;
pub mod ranking;
pub mod similarity;

pub use deletion_plan::{DeletionPlan, EntryAction, PlannedEntry};
pub use group::{DuplicateGroup, GroupId, GroupMember, KeepState};
pub use grouping::DuplicateGrouper;
pub use missing_files::{file_exists, find_missing_files, MissingEntry};
pub use ranking::{region_score, CandidateRanker};
pub use similarity::{ComparableItem, CompareStats, ItemId, Similarity, SimilarityGraph};
