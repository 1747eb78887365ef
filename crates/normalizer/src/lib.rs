pub mod accumulator;
pub mod classify;
pub mod dataset;
pub mod payloads;
pub mod transform;

pub use accumulator::EntityAccumulator;
pub use classify::{StreamKind, TransformError};
pub use dataset::{
    NormalizedBranch, NormalizedCommit, NormalizedDataset, NormalizedIssue, NormalizedMilestone,
    NormalizedPullRequest, NormalizedRepository, NormalizedUser,
};
pub use transform::{transform, StreamBatch, TransformOutput, TransformStats};
