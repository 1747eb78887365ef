use async_trait::async_trait;

use crate::errors::Result;
use crate::models::{
    BranchRow, InsertOutcome, IssueRow, MilestoneRow, NewBranch, NewCommit, PullRequestRow,
    RepositoryRow, UserRow,
};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: UserRow) -> Result<InsertOutcome>;
    async fn get_by_id(&self, id: i64) -> Result<Option<UserRow>>;
}

#[async_trait]
pub trait RepositoryStore: Send + Sync {
    /// Inserts by name; returns the generated id, or `None` when the name is
    /// already present.
    async fn insert(&self, name: &str) -> Result<Option<i64>>;
    async fn get_by_name(&self, name: &str) -> Result<Option<RepositoryRow>>;
}

#[async_trait]
pub trait BranchStore: Send + Sync {
    async fn insert(&self, branch: NewBranch) -> Result<Option<i64>>;
    async fn get(&self, repository_id: i64, name: &str) -> Result<Option<BranchRow>>;
}

#[async_trait]
pub trait MilestoneStore: Send + Sync {
    async fn insert(&self, milestone: MilestoneRow) -> Result<InsertOutcome>;
}

#[async_trait]
pub trait IssueStore: Send + Sync {
    async fn insert(&self, issue: IssueRow) -> Result<InsertOutcome>;
    async fn add_assignee(&self, issue_id: i64, user_id: i64) -> Result<()>;
}

#[async_trait]
pub trait PullRequestStore: Send + Sync {
    async fn insert(&self, pull_request: PullRequestRow) -> Result<InsertOutcome>;
    async fn add_assignee(&self, pull_request_id: i64, user_id: i64) -> Result<()>;
}

#[async_trait]
pub trait CommitStore: Send + Sync {
    /// Inserts by sha; returns the surrogate id, or `None` when the sha is
    /// already present.
    async fn insert(&self, commit: NewCommit) -> Result<Option<i64>>;
    async fn add_parent(&self, parent_sha: &str, commit_id: i64) -> Result<()>;
}

/// The store surface the loader works against, one sub-store per table group.
pub trait Stores: Send + Sync {
    fn users(&self) -> &dyn UserStore;
    fn repositories(&self) -> &dyn RepositoryStore;
    fn branches(&self) -> &dyn BranchStore;
    fn milestones(&self) -> &dyn MilestoneStore;
    fn issues(&self) -> &dyn IssueStore;
    fn pull_requests(&self) -> &dyn PullRequestStore;
    fn commits(&self) -> &dyn CommitStore;
}
