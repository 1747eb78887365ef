use std::sync::Arc;

use common::tz::TimezoneNormalizer;
use db::models::{
    InsertOutcome, IssueRow, MilestoneRow, NewBranch, NewCommit, PullRequestRow, UserRow,
};
use db::stores::Stores;
use normalizer::dataset::{
    NormalizedBranch, NormalizedCommit, NormalizedDataset, NormalizedIssue, NormalizedMilestone,
    NormalizedPullRequest, NormalizedRepository, NormalizedUser,
};
use tracing::{debug, info, instrument, warn};

use crate::errors::LoadError;
use crate::report::{Collection, CollectionReport, Counts, LoadReport};

/// Persists one normalized dataset into the relational store.
///
/// Collections go in strict dependency order; within a collection every row
/// is an idempotent natural-key insert (`ON CONFLICT DO NOTHING`), so reruns
/// skip rows that already exist instead of duplicating or failing on them. A
/// row-level error abandons the rest of its collection, is recorded in the
/// report, and the loader moves on to the next collection.
pub struct Loader {
    stores: Arc<dyn Stores>,
    tz: TimezoneNormalizer,
}

impl Loader {
    pub fn new(stores: Arc<dyn Stores>, tz: TimezoneNormalizer) -> Self {
        Self { stores, tz }
    }

    #[instrument(skip(self, dataset))]
    pub async fn load(&self, dataset: &NormalizedDataset) -> LoadReport {
        let mut report = LoadReport::default();

        let outcome = self.load_users(&dataset.users).await;
        push(&mut report, outcome);
        let outcome = self.load_repositories(&dataset.repositories).await;
        push(&mut report, outcome);
        let outcome = self.load_milestones(&dataset.milestones).await;
        push(&mut report, outcome);
        let outcome = self.load_branches(&dataset.branches).await;
        push(&mut report, outcome);
        let outcome = self.load_issues(&dataset.issues).await;
        push(&mut report, outcome);
        let outcome = self.load_pull_requests(&dataset.pull_requests).await;
        push(&mut report, outcome);
        let outcome = self.load_commits(&dataset.commits).await;
        push(&mut report, outcome);

        report
    }

    async fn load_users(&self, users: &[NormalizedUser]) -> CollectionReport {
        let mut counts = Counts::default();
        for user in users {
            let result = self
                .stores
                .users()
                .insert(UserRow {
                    id: user.id,
                    login: user.login.clone(),
                    html_url: user.html_url.clone(),
                })
                .await
                .map_err(LoadError::from);
            match result {
                Ok(InsertOutcome::Inserted) => counts.inserted += 1,
                Ok(InsertOutcome::AlreadyExists) => {
                    debug!(login = %user.login, "user already exists");
                    counts.skipped += 1;
                }
                Err(err) => return CollectionReport::failed(Collection::Users, counts, &err),
            }
        }
        CollectionReport::ok(Collection::Users, counts)
    }

    async fn load_repositories(&self, repositories: &[NormalizedRepository]) -> CollectionReport {
        let mut counts = Counts::default();
        for repository in repositories {
            match self.stores.repositories().insert(&repository.name).await {
                Ok(Some(_)) => counts.inserted += 1,
                Ok(None) => {
                    debug!(name = %repository.name, "repository already exists");
                    counts.skipped += 1;
                }
                Err(err) => {
                    return CollectionReport::failed(
                        Collection::Repositories,
                        counts,
                        &LoadError::from(err),
                    )
                }
            }
        }
        CollectionReport::ok(Collection::Repositories, counts)
    }

    async fn load_milestones(&self, milestones: &[NormalizedMilestone]) -> CollectionReport {
        let mut counts = Counts::default();
        for milestone in milestones {
            match self.load_milestone(milestone).await {
                Ok(InsertOutcome::Inserted) => counts.inserted += 1,
                Ok(InsertOutcome::AlreadyExists) => counts.skipped += 1,
                Err(err) => return CollectionReport::failed(Collection::Milestones, counts, &err),
            }
        }
        CollectionReport::ok(Collection::Milestones, counts)
    }

    async fn load_milestone(
        &self,
        milestone: &NormalizedMilestone,
    ) -> Result<InsertOutcome, LoadError> {
        let repository_id = self.repository_id(&milestone.repository).await?;
        self.stores
            .milestones()
            .insert(MilestoneRow {
                id: milestone.id,
                repository_id,
                title: milestone.title.clone(),
                description: milestone.description.clone(),
                number: milestone.number,
                state: milestone.state.clone(),
                created_at: self.tz.localize(milestone.created_at),
                updated_at: self.tz.localize(milestone.updated_at),
                creator: milestone.creator,
            })
            .await
            .map_err(LoadError::from)
    }

    async fn load_branches(&self, branches: &[NormalizedBranch]) -> CollectionReport {
        let mut counts = Counts::default();
        for branch in branches {
            match self.load_branch(branch).await {
                Ok(InsertOutcome::Inserted) => counts.inserted += 1,
                Ok(InsertOutcome::AlreadyExists) => counts.skipped += 1,
                Err(err) => return CollectionReport::failed(Collection::Branches, counts, &err),
            }
        }
        CollectionReport::ok(Collection::Branches, counts)
    }

    async fn load_branch(&self, branch: &NormalizedBranch) -> Result<InsertOutcome, LoadError> {
        let repository_id = self.repository_id(&branch.repository).await?;
        let inserted = self
            .stores
            .branches()
            .insert(NewBranch {
                name: branch.name.clone(),
                repository_id,
            })
            .await?;
        Ok(match inserted {
            Some(_) => InsertOutcome::Inserted,
            None => InsertOutcome::AlreadyExists,
        })
    }

    async fn load_issues(&self, issues: &[NormalizedIssue]) -> CollectionReport {
        let mut counts = Counts::default();
        for issue in issues {
            match self.load_issue(issue).await {
                Ok(InsertOutcome::Inserted) => counts.inserted += 1,
                Ok(InsertOutcome::AlreadyExists) => {
                    debug!(id = issue.id, "issue already exists");
                    counts.skipped += 1;
                }
                Err(err) => return CollectionReport::failed(Collection::Issues, counts, &err),
            }
        }
        CollectionReport::ok(Collection::Issues, counts)
    }

    async fn load_issue(&self, issue: &NormalizedIssue) -> Result<InsertOutcome, LoadError> {
        let repository_id = self.repository_id(&issue.repository).await?;
        let outcome = self
            .stores
            .issues()
            .insert(IssueRow {
                id: issue.id,
                title: issue.title.clone(),
                body: issue.body.clone(),
                number: issue.number,
                html_url: issue.html_url.clone(),
                created_at: self.tz.localize(issue.created_at),
                updated_at: self.tz.localize(issue.updated_at),
                created_by: issue.created_by,
                repository_id,
                milestone_id: issue.milestone_id,
            })
            .await?;
        if outcome == InsertOutcome::Inserted {
            // Join rows are written without validating the referenced user;
            // a user never loaded surfaces as this collection's FK error.
            for user_id in &issue.assignees {
                self.stores.issues().add_assignee(issue.id, *user_id).await?;
            }
        }
        Ok(outcome)
    }

    async fn load_pull_requests(
        &self,
        pull_requests: &[NormalizedPullRequest],
    ) -> CollectionReport {
        let mut counts = Counts::default();
        for pull_request in pull_requests {
            match self.load_pull_request(pull_request).await {
                Ok(InsertOutcome::Inserted) => counts.inserted += 1,
                Ok(InsertOutcome::AlreadyExists) => {
                    debug!(id = pull_request.id, "pull request already exists");
                    counts.skipped += 1;
                }
                Err(err) => {
                    return CollectionReport::failed(Collection::PullRequests, counts, &err)
                }
            }
        }
        CollectionReport::ok(Collection::PullRequests, counts)
    }

    async fn load_pull_request(
        &self,
        pull_request: &NormalizedPullRequest,
    ) -> Result<InsertOutcome, LoadError> {
        let repository_id = self.repository_id(&pull_request.repository).await?;
        let outcome = self
            .stores
            .pull_requests()
            .insert(PullRequestRow {
                id: pull_request.id,
                created_by: pull_request.created_by,
                repository_id,
                number: pull_request.number,
                state: pull_request.state.clone(),
                title: pull_request.title.clone(),
                body: pull_request.body.clone(),
                html_url: pull_request.html_url.clone(),
                created_at: self.tz.localize(pull_request.created_at),
                updated_at: self.tz.localize(pull_request.updated_at),
                merged_at: self.tz.localize_opt(pull_request.merged_at),
                milestone_id: pull_request.milestone_id,
            })
            .await?;
        if outcome == InsertOutcome::Inserted {
            for user_id in &pull_request.assignees {
                self.stores
                    .pull_requests()
                    .add_assignee(pull_request.id, *user_id)
                    .await?;
            }
        }
        Ok(outcome)
    }

    async fn load_commits(&self, commits: &[NormalizedCommit]) -> CollectionReport {
        let mut counts = Counts::default();
        for commit in commits {
            match self.load_commit(commit).await {
                Ok(InsertOutcome::Inserted) => counts.inserted += 1,
                Ok(InsertOutcome::AlreadyExists) => {
                    debug!(sha = %commit.sha, "commit already exists");
                    counts.skipped += 1;
                }
                Err(err) => return CollectionReport::failed(Collection::Commits, counts, &err),
            }
        }
        CollectionReport::ok(Collection::Commits, counts)
    }

    async fn load_commit(&self, commit: &NormalizedCommit) -> Result<InsertOutcome, LoadError> {
        let branch_id = match &commit.branch {
            Some(branch) => {
                let repository_id = self.repository_id(&commit.repository).await?;
                let row = self
                    .stores
                    .branches()
                    .get(repository_id, branch)
                    .await?
                    .ok_or_else(|| LoadError::MissingBranch {
                        repository: commit.repository.clone(),
                        branch: branch.clone(),
                    })?;
                Some(row.id)
            }
            None => None,
        };

        let inserted = self
            .stores
            .commits()
            .insert(NewCommit {
                user_id: commit.user_id,
                branch_id,
                created_at: self.tz.localize(commit.created_at),
                message: commit.message.clone(),
                sha: commit.sha.clone(),
                html_url: commit.html_url.clone(),
            })
            .await?;

        match inserted {
            Some(commit_id) => {
                for parent_sha in &commit.parents {
                    self.stores.commits().add_parent(parent_sha, commit_id).await?;
                }
                Ok(InsertOutcome::Inserted)
            }
            // An existing sha keeps its ancestry rows from the run that
            // inserted it; nothing more to write.
            None => Ok(InsertOutcome::AlreadyExists),
        }
    }

    async fn repository_id(&self, name: &str) -> Result<i64, LoadError> {
        self.stores
            .repositories()
            .get_by_name(name)
            .await?
            .map(|row| row.id)
            .ok_or_else(|| LoadError::MissingRepository(name.to_string()))
    }
}

fn push(report: &mut LoadReport, outcome: CollectionReport) {
    match &outcome.error {
        None => info!(
            collection = %outcome.collection,
            inserted = outcome.inserted,
            skipped = outcome.skipped,
            "collection loaded"
        ),
        Some(error) => warn!(
            collection = %outcome.collection,
            inserted = outcome.inserted,
            skipped = outcome.skipped,
            error = %error,
            "collection failed; continuing with next collection"
        ),
    }
    report.collections.push(outcome);
}
