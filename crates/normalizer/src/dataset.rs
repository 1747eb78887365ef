use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedUser {
    pub id: i64,
    /// Lowercased; the first casing seen during transform wins.
    pub login: String,
    pub html_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedRepository {
    /// Lowercased name, the natural key; no source-assigned id survives.
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedBranch {
    pub repository: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedMilestone {
    pub id: i64,
    pub repository: String,
    pub title: String,
    pub description: Option<String>,
    pub number: i64,
    pub state: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub creator: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedIssue {
    pub id: i64,
    pub title: String,
    pub body: Option<String>,
    pub number: i64,
    pub html_url: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub created_by: i64,
    pub repository: String,
    pub milestone_id: Option<i64>,
    pub assignees: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedPullRequest {
    pub id: i64,
    pub created_by: i64,
    pub repository: String,
    pub number: i64,
    pub state: String,
    pub title: String,
    pub body: Option<String>,
    pub html_url: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub merged_at: Option<NaiveDateTime>,
    pub milestone_id: Option<i64>,
    pub assignees: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedCommit {
    /// Author id; author-less commits never reach the dataset.
    pub user_id: i64,
    pub repository: String,
    pub branch: Option<String>,
    pub created_at: NaiveDateTime,
    pub message: String,
    pub sha: String,
    pub parents: Vec<String>,
    pub html_url: String,
}

/// The seven entity collections produced by one transform run, in the order
/// records were first observed. Handed to the loader and then discarded.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NormalizedDataset {
    pub users: Vec<NormalizedUser>,
    pub repositories: Vec<NormalizedRepository>,
    pub branches: Vec<NormalizedBranch>,
    pub milestones: Vec<NormalizedMilestone>,
    pub issues: Vec<NormalizedIssue>,
    pub pull_requests: Vec<NormalizedPullRequest>,
    pub commits: Vec<NormalizedCommit>,
}
