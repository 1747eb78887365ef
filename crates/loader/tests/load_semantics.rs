use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use common::tz::TimezoneNormalizer;
use db::errors::{DbError, Result as DbResult};
use db::models::{
    BranchRow, InsertOutcome, IssueRow, MilestoneRow, NewBranch, NewCommit, PullRequestRow,
    RepositoryRow, UserRow,
};
use db::stores::{
    BranchStore, CommitStore, IssueStore, MilestoneStore, PullRequestStore, RepositoryStore,
    Stores, UserStore,
};
use loader::{Collection, Loader};
use normalizer::dataset::{NormalizedCommit, NormalizedDataset, NormalizedIssue};
use normalizer::{transform, StreamBatch};
use serde_json::json;

#[derive(Default)]
struct State {
    users: HashMap<i64, UserRow>,
    repositories: HashMap<String, i64>,
    branches: HashMap<(i64, String), i64>,
    milestones: HashMap<i64, MilestoneRow>,
    issues: HashMap<i64, IssueRow>,
    issue_assignees: HashSet<(i64, i64)>,
    pull_requests: HashMap<i64, PullRequestRow>,
    pull_request_assignees: HashSet<(i64, i64)>,
    commits: HashMap<String, i64>,
    parents: HashSet<(String, i64)>,
    next_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory stand-in for the Postgres store, with the one foreign key the
/// loader knowingly leaves unvalidated (assignee user) enforced so the
/// documented failure path is exercisable.
#[derive(Default)]
struct MemStores {
    state: Mutex<State>,
}

impl MemStores {
    fn snapshot<T>(&self, f: impl FnOnce(&State) -> T) -> T {
        f(&self.state.lock().unwrap())
    }
}

#[async_trait]
impl UserStore for MemStores {
    async fn insert(&self, user: UserRow) -> DbResult<InsertOutcome> {
        let mut state = self.state.lock().unwrap();
        if state.users.contains_key(&user.id) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        state.users.insert(user.id, user);
        Ok(InsertOutcome::Inserted)
    }

    async fn get_by_id(&self, id: i64) -> DbResult<Option<UserRow>> {
        Ok(self.state.lock().unwrap().users.get(&id).cloned())
    }
}

#[async_trait]
impl RepositoryStore for MemStores {
    async fn insert(&self, name: &str) -> DbResult<Option<i64>> {
        let mut state = self.state.lock().unwrap();
        if state.repositories.contains_key(name) {
            return Ok(None);
        }
        let id = state.next_id();
        state.repositories.insert(name.to_string(), id);
        Ok(Some(id))
    }

    async fn get_by_name(&self, name: &str) -> DbResult<Option<RepositoryRow>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .repositories
            .get(name)
            .map(|&id| RepositoryRow {
                id,
                name: name.to_string(),
            }))
    }
}

#[async_trait]
impl BranchStore for MemStores {
    async fn insert(&self, branch: NewBranch) -> DbResult<Option<i64>> {
        let mut state = self.state.lock().unwrap();
        let key = (branch.repository_id, branch.name.clone());
        if state.branches.contains_key(&key) {
            return Ok(None);
        }
        let id = state.next_id();
        state.branches.insert(key, id);
        Ok(Some(id))
    }

    async fn get(&self, repository_id: i64, name: &str) -> DbResult<Option<BranchRow>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .branches
            .get(&(repository_id, name.to_string()))
            .map(|&id| BranchRow {
                id,
                name: name.to_string(),
                repository_id,
            }))
    }
}

#[async_trait]
impl MilestoneStore for MemStores {
    async fn insert(&self, milestone: MilestoneRow) -> DbResult<InsertOutcome> {
        let mut state = self.state.lock().unwrap();
        if state.milestones.contains_key(&milestone.id) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        state.milestones.insert(milestone.id, milestone);
        Ok(InsertOutcome::Inserted)
    }
}

#[async_trait]
impl IssueStore for MemStores {
    async fn insert(&self, issue: IssueRow) -> DbResult<InsertOutcome> {
        let mut state = self.state.lock().unwrap();
        if state.issues.contains_key(&issue.id) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        state.issues.insert(issue.id, issue);
        Ok(InsertOutcome::Inserted)
    }

    async fn add_assignee(&self, issue_id: i64, user_id: i64) -> DbResult<()> {
        let mut state = self.state.lock().unwrap();
        if !state.users.contains_key(&user_id) {
            return Err(DbError::NotFound);
        }
        state.issue_assignees.insert((issue_id, user_id));
        Ok(())
    }
}

#[async_trait]
impl PullRequestStore for MemStores {
    async fn insert(&self, pull_request: PullRequestRow) -> DbResult<InsertOutcome> {
        let mut state = self.state.lock().unwrap();
        if state.pull_requests.contains_key(&pull_request.id) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        state.pull_requests.insert(pull_request.id, pull_request);
        Ok(InsertOutcome::Inserted)
    }

    async fn add_assignee(&self, pull_request_id: i64, user_id: i64) -> DbResult<()> {
        let mut state = self.state.lock().unwrap();
        if !state.users.contains_key(&user_id) {
            return Err(DbError::NotFound);
        }
        state
            .pull_request_assignees
            .insert((pull_request_id, user_id));
        Ok(())
    }
}

#[async_trait]
impl CommitStore for MemStores {
    async fn insert(&self, commit: NewCommit) -> DbResult<Option<i64>> {
        let mut state = self.state.lock().unwrap();
        if state.commits.contains_key(&commit.sha) {
            return Ok(None);
        }
        let id = state.next_id();
        state.commits.insert(commit.sha.clone(), id);
        Ok(Some(id))
    }

    async fn add_parent(&self, parent_sha: &str, commit_id: i64) -> DbResult<()> {
        self.state
            .lock()
            .unwrap()
            .parents
            .insert((parent_sha.to_string(), commit_id));
        Ok(())
    }
}

impl Stores for MemStores {
    fn users(&self) -> &dyn UserStore {
        self
    }
    fn repositories(&self) -> &dyn RepositoryStore {
        self
    }
    fn branches(&self) -> &dyn BranchStore {
        self
    }
    fn milestones(&self) -> &dyn MilestoneStore {
        self
    }
    fn issues(&self) -> &dyn IssueStore {
        self
    }
    fn pull_requests(&self) -> &dyn PullRequestStore {
        self
    }
    fn commits(&self) -> &dyn CommitStore {
        self
    }
}

fn loader(stores: &Arc<MemStores>) -> Loader {
    let tz = TimezoneNormalizer::parse("-03:00").unwrap();
    Loader::new(stores.clone() as Arc<dyn Stores>, tz)
}

fn scenario_batch() -> StreamBatch {
    StreamBatch::new().with_stream(
        "issues",
        vec![json!({
            "id": 1,
            "title": "first issue",
            "body": "body",
            "number": 1,
            "html_url": "http://example/issue/1",
            "created_at": "2024-01-01T00:00:00",
            "updated_at": "2024-01-01T00:00:00",
            "user": {"id": 9, "login": "Bob", "html_url": "u"},
            "repository": "r",
            "milestone": null,
            "assignees": []
        })],
    )
}

#[tokio::test]
async fn scenario_single_issue_loads_one_of_each() {
    let stores = Arc::new(MemStores::default());
    let dataset = transform(&scenario_batch()).unwrap().dataset;
    let report = loader(&stores).load(&dataset).await;

    assert!(report.is_success());
    assert_eq!(report.collection(Collection::Users).unwrap().inserted, 1);
    assert_eq!(
        report.collection(Collection::Repositories).unwrap().inserted,
        1
    );
    assert_eq!(report.collection(Collection::Issues).unwrap().inserted, 1);
    assert_eq!(report.total_inserted(), 3);
    assert!(stores.snapshot(|s| s.issue_assignees.is_empty()));
}

#[tokio::test]
async fn reload_of_identical_dataset_only_skips() {
    let stores = Arc::new(MemStores::default());
    let dataset = transform(&scenario_batch()).unwrap().dataset;
    let loader = loader(&stores);

    let first = loader.load(&dataset).await;
    let second = loader.load(&dataset).await;

    assert!(second.is_success());
    assert_eq!(second.total_inserted(), 0);
    assert_eq!(second.total_skipped(), first.total_inserted());
    assert_eq!(stores.snapshot(|s| s.issues.len()), 1);
}

#[tokio::test]
async fn timestamps_keep_wall_clock_with_configured_offset() {
    let stores = Arc::new(MemStores::default());
    let dataset = transform(&scenario_batch()).unwrap().dataset;
    loader(&stores).load(&dataset).await;

    let created_at = stores.snapshot(|s| s.issues[&1].created_at);
    let expected_naive = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    assert_eq!(created_at.naive_local(), expected_naive);
    assert_eq!(created_at.offset().local_minus_utc(), -3 * 3600);
}

#[tokio::test]
async fn issue_referencing_unloaded_repository_fails_its_collection_only() {
    let stores = Arc::new(MemStores::default());
    let mut dataset = NormalizedDataset::default();
    dataset.issues.push(NormalizedIssue {
        id: 1,
        title: "orphan".into(),
        body: None,
        number: 1,
        html_url: "u".into(),
        created_at: NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
        updated_at: NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
        created_by: 9,
        repository: "ghost".into(),
        milestone_id: None,
        assignees: vec![],
    });

    let report = loader(&stores).load(&dataset).await;

    let issues = report.collection(Collection::Issues).unwrap();
    assert!(issues.error.as_deref().unwrap().contains("ghost"));
    assert_eq!(issues.inserted, 0);
    // The loader still advances to the collections after the failed one.
    assert!(report.collection(Collection::PullRequests).unwrap().is_ok());
    assert!(report.collection(Collection::Commits).unwrap().is_ok());
    assert!(!report.is_success());
}

#[tokio::test]
async fn assignee_referencing_unloaded_user_fails_the_issue_collection() {
    let stores = Arc::new(MemStores::default());
    let batch = StreamBatch::new().with_stream(
        "issues",
        vec![json!({
            "id": 1,
            "title": "t",
            "number": 1,
            "html_url": "u",
            "created_at": "2024-01-01T00:00:00",
            "updated_at": "2024-01-01T00:00:00",
            "user": {"id": 9, "login": "bob", "html_url": "u"},
            "repository": "r",
            "assignees": [{"id": 404, "login": "nobody", "html_url": "u"}]
        })],
    );
    let dataset = transform(&batch).unwrap().dataset;
    let report = loader(&stores).load(&dataset).await;

    assert!(report.collection(Collection::Users).unwrap().is_ok());
    assert!(report.collection(Collection::Repositories).unwrap().is_ok());
    assert!(!report.collection(Collection::Issues).unwrap().is_ok());
}

#[tokio::test]
async fn commit_ancestry_rows_follow_a_fresh_commit_only() {
    let stores = Arc::new(MemStores::default());
    let batch = StreamBatch::new().with_stream(
        "commits",
        vec![json!({
            "author": {"id": 4, "login": "dev", "html_url": "u"},
            "repository": "r",
            "branch": "main",
            "created_at": "2024-03-01T10:00:00",
            "commit": {"message": "fix"},
            "sha": "abc",
            "parents": [{"sha": "p1"}, {"sha": "p2"}],
            "html_url": "http://example/c"
        })],
    );
    let dataset = transform(&batch).unwrap().dataset;
    let loader = loader(&stores);

    let first = loader.load(&dataset).await;
    assert!(first.is_success());
    assert_eq!(first.collection(Collection::Commits).unwrap().inserted, 1);
    assert_eq!(stores.snapshot(|s| s.parents.len()), 2);

    let second = loader.load(&dataset).await;
    assert_eq!(second.collection(Collection::Commits).unwrap().skipped, 1);
    assert_eq!(stores.snapshot(|s| s.parents.len()), 2);
}

#[tokio::test]
async fn commit_referencing_unloaded_branch_is_a_referential_gap() {
    let stores = Arc::new(MemStores::default());
    let mut dataset = NormalizedDataset::default();
    dataset
        .repositories
        .push(normalizer::NormalizedRepository { name: "r".into() });
    dataset.commits.push(NormalizedCommit {
        user_id: 4,
        repository: "r".into(),
        branch: Some("missing".into()),
        created_at: NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap(),
        message: "m".into(),
        sha: "abc".into(),
        parents: vec![],
        html_url: "u".into(),
    });

    let report = loader(&stores).load(&dataset).await;

    let commits = report.collection(Collection::Commits).unwrap();
    assert!(commits.error.as_deref().unwrap().contains("missing"));
    assert_eq!(stores.snapshot(|s| s.commits.len()), 0);
}
