use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Outcome of a natural-key insert. `AlreadyExists` is how a rerun (or a
/// concurrent run) observes a row it does not need to write again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub login: String,
    pub html_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RepositoryRow {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BranchRow {
    pub id: i64,
    pub name: String,
    pub repository_id: i64,
}

#[derive(Debug, Clone)]
pub struct NewBranch {
    pub name: String,
    pub repository_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MilestoneRow {
    pub id: i64,
    pub repository_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub number: i64,
    pub state: String,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    pub creator: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct IssueRow {
    pub id: i64,
    pub title: String,
    pub body: Option<String>,
    pub number: i64,
    pub html_url: String,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    pub created_by: i64,
    pub repository_id: i64,
    pub milestone_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PullRequestRow {
    pub id: i64,
    pub created_by: i64,
    pub repository_id: i64,
    pub number: i64,
    pub state: String,
    pub title: String,
    pub body: Option<String>,
    pub html_url: String,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    pub merged_at: Option<DateTime<FixedOffset>>,
    pub milestone_id: Option<i64>,
}

/// Commit rows take a store-generated surrogate id; sha is the logical key.
#[derive(Debug, Clone)]
pub struct NewCommit {
    pub user_id: i64,
    pub branch_id: Option<i64>,
    pub created_at: DateTime<FixedOffset>,
    pub message: String,
    pub sha: String,
    pub html_url: String,
}
