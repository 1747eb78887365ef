use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tokio::time::{sleep, Duration};
use tracing::{instrument, warn};

use crate::errors::{DbError, Result};
use crate::models::{
    BranchRow, InsertOutcome, IssueRow, MilestoneRow, NewBranch, NewCommit, PullRequestRow,
    RepositoryRow, UserRow,
};
use crate::stores::{
    BranchStore, CommitStore, IssueStore, MilestoneStore, PullRequestStore, RepositoryStore,
    Stores, UserStore,
};

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(DbError::Migration)
}

#[derive(Clone)]
pub struct PgDatabase {
    pool: PgPool,
    user_store: Arc<PgUserStore>,
    repository_store: Arc<PgRepositoryStore>,
    branch_store: Arc<PgBranchStore>,
    milestone_store: Arc<PgMilestoneStore>,
    issue_store: Arc<PgIssueStore>,
    pull_request_store: Arc<PgPullRequestStore>,
    commit_store: Arc<PgCommitStore>,
}

impl PgDatabase {
    pub async fn connect(database_url: &str) -> Result<Self> {
        const MAX_ATTEMPTS: u32 = 5;
        const BASE_DELAY_MS: u64 = 500;

        let mut attempts = 0;
        loop {
            match PgPoolOptions::new()
                .max_connections(10)
                .connect(database_url)
                .await
            {
                Ok(pool) => {
                    run_migrations(&pool).await?;
                    return Ok(Self::from_pool(pool));
                }
                Err(err) => {
                    attempts += 1;
                    if attempts >= MAX_ATTEMPTS {
                        return Err(DbError::Query(err));
                    }

                    let exp = (attempts - 1).min(5);
                    let backoff = Duration::from_millis(BASE_DELAY_MS * (1u64 << exp));
                    warn!(
                        attempts,
                        error = %err,
                        wait_ms = backoff.as_millis(),
                        "database connection failed; retrying"
                    );
                    sleep(backoff).await;
                }
            }
        }
    }

    pub fn from_pool(pool: PgPool) -> Self {
        let user_store = Arc::new(PgUserStore { pool: pool.clone() });
        let repository_store = Arc::new(PgRepositoryStore { pool: pool.clone() });
        let branch_store = Arc::new(PgBranchStore { pool: pool.clone() });
        let milestone_store = Arc::new(PgMilestoneStore { pool: pool.clone() });
        let issue_store = Arc::new(PgIssueStore { pool: pool.clone() });
        let pull_request_store = Arc::new(PgPullRequestStore { pool: pool.clone() });
        let commit_store = Arc::new(PgCommitStore { pool: pool.clone() });

        Self {
            pool,
            user_store,
            repository_store,
            branch_store,
            milestone_store,
            issue_store,
            pull_request_store,
            commit_store,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl Stores for PgDatabase {
    fn users(&self) -> &dyn UserStore {
        &*self.user_store
    }

    fn repositories(&self) -> &dyn RepositoryStore {
        &*self.repository_store
    }

    fn branches(&self) -> &dyn BranchStore {
        &*self.branch_store
    }

    fn milestones(&self) -> &dyn MilestoneStore {
        &*self.milestone_store
    }

    fn issues(&self) -> &dyn IssueStore {
        &*self.issue_store
    }

    fn pull_requests(&self) -> &dyn PullRequestStore {
        &*self.pull_request_store
    }

    fn commits(&self) -> &dyn CommitStore {
        &*self.commit_store
    }
}

fn outcome(rows_affected: u64) -> InsertOutcome {
    if rows_affected > 0 {
        InsertOutcome::Inserted
    } else {
        InsertOutcome::AlreadyExists
    }
}

#[derive(Clone)]
struct PgUserStore {
    pool: PgPool,
}

#[async_trait]
impl UserStore for PgUserStore {
    #[instrument(skip(self, user), fields(login = %user.login))]
    async fn insert(&self, user: UserRow) -> Result<InsertOutcome> {
        sqlx::query(
            r#"
            INSERT INTO "user" (id, login, html_url)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(user.id)
        .bind(user.login)
        .bind(user.html_url)
        .execute(&self.pool)
        .await
        .map(|done| outcome(done.rows_affected()))
        .map_err(DbError::Query)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, login, html_url
            FROM "user"
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::Query)
    }
}

#[derive(Clone)]
struct PgRepositoryStore {
    pool: PgPool,
}

#[async_trait]
impl RepositoryStore for PgRepositoryStore {
    #[instrument(skip(self))]
    async fn insert(&self, name: &str) -> Result<Option<i64>> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO repository (name)
            VALUES ($1)
            ON CONFLICT (name) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::Query)
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<RepositoryRow>> {
        sqlx::query_as::<_, RepositoryRow>(
            r#"
            SELECT id, name
            FROM repository
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::Query)
    }
}

#[derive(Clone)]
struct PgBranchStore {
    pool: PgPool,
}

#[async_trait]
impl BranchStore for PgBranchStore {
    async fn insert(&self, branch: NewBranch) -> Result<Option<i64>> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO branch (name, repository_id)
            VALUES ($1, $2)
            ON CONFLICT (name, repository_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(branch.name)
        .bind(branch.repository_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::Query)
    }

    async fn get(&self, repository_id: i64, name: &str) -> Result<Option<BranchRow>> {
        sqlx::query_as::<_, BranchRow>(
            r#"
            SELECT id, name, repository_id
            FROM branch
            WHERE repository_id = $1 AND name = $2
            "#,
        )
        .bind(repository_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::Query)
    }
}

#[derive(Clone)]
struct PgMilestoneStore {
    pool: PgPool,
}

#[async_trait]
impl MilestoneStore for PgMilestoneStore {
    async fn insert(&self, milestone: MilestoneRow) -> Result<InsertOutcome> {
        sqlx::query(
            r#"
            INSERT INTO milestone (
                id, repository_id, title, description, number, state,
                created_at, updated_at, creator
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(milestone.id)
        .bind(milestone.repository_id)
        .bind(milestone.title)
        .bind(milestone.description)
        .bind(milestone.number)
        .bind(milestone.state)
        .bind(milestone.created_at)
        .bind(milestone.updated_at)
        .bind(milestone.creator)
        .execute(&self.pool)
        .await
        .map(|done| outcome(done.rows_affected()))
        .map_err(DbError::Query)
    }
}

#[derive(Clone)]
struct PgIssueStore {
    pool: PgPool,
}

#[async_trait]
impl IssueStore for PgIssueStore {
    async fn insert(&self, issue: IssueRow) -> Result<InsertOutcome> {
        sqlx::query(
            r#"
            INSERT INTO issue (
                id, title, body, number, html_url, created_at, updated_at,
                created_by, repository_id, milestone_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(issue.id)
        .bind(issue.title)
        .bind(issue.body)
        .bind(issue.number)
        .bind(issue.html_url)
        .bind(issue.created_at)
        .bind(issue.updated_at)
        .bind(issue.created_by)
        .bind(issue.repository_id)
        .bind(issue.milestone_id)
        .execute(&self.pool)
        .await
        .map(|done| outcome(done.rows_affected()))
        .map_err(DbError::Query)
    }

    async fn add_assignee(&self, issue_id: i64, user_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO issue_assignees (issue_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (issue_id, user_id) DO NOTHING
            "#,
        )
        .bind(issue_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map(|_| ())
        .map_err(DbError::Query)
    }
}

#[derive(Clone)]
struct PgPullRequestStore {
    pool: PgPool,
}

#[async_trait]
impl PullRequestStore for PgPullRequestStore {
    async fn insert(&self, pull_request: PullRequestRow) -> Result<InsertOutcome> {
        sqlx::query(
            r#"
            INSERT INTO pull_requests (
                id, created_by, repository_id, number, state, title, body,
                html_url, created_at, updated_at, merged_at, milestone_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(pull_request.id)
        .bind(pull_request.created_by)
        .bind(pull_request.repository_id)
        .bind(pull_request.number)
        .bind(pull_request.state)
        .bind(pull_request.title)
        .bind(pull_request.body)
        .bind(pull_request.html_url)
        .bind(pull_request.created_at)
        .bind(pull_request.updated_at)
        .bind(pull_request.merged_at)
        .bind(pull_request.milestone_id)
        .execute(&self.pool)
        .await
        .map(|done| outcome(done.rows_affected()))
        .map_err(DbError::Query)
    }

    async fn add_assignee(&self, pull_request_id: i64, user_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO pull_request_assignees (pull_request_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (pull_request_id, user_id) DO NOTHING
            "#,
        )
        .bind(pull_request_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map(|_| ())
        .map_err(DbError::Query)
    }
}

#[derive(Clone)]
struct PgCommitStore {
    pool: PgPool,
}

#[async_trait]
impl CommitStore for PgCommitStore {
    #[instrument(skip(self, commit), fields(sha = %commit.sha))]
    async fn insert(&self, commit: NewCommit) -> Result<Option<i64>> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO commits (user_id, branch_id, created_at, message, sha, html_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (sha) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(commit.user_id)
        .bind(commit.branch_id)
        .bind(commit.created_at)
        .bind(commit.message)
        .bind(commit.sha)
        .bind(commit.html_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::Query)
    }

    async fn add_parent(&self, parent_sha: &str, commit_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO parents_commits (parent_sha, commit_id)
            VALUES ($1, $2)
            ON CONFLICT (parent_sha, commit_id) DO NOTHING
            "#,
        )
        .bind(parent_sha)
        .bind(commit_id)
        .execute(&self.pool)
        .await
        .map(|_| ())
        .map_err(DbError::Query)
    }
}
