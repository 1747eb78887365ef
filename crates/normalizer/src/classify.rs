use serde_json::Value;

use crate::accumulator::EntityAccumulator;
use crate::dataset::{
    NormalizedBranch, NormalizedCommit, NormalizedDataset, NormalizedIssue, NormalizedMilestone,
    NormalizedPullRequest, NormalizedRepository, NormalizedUser,
};
use crate::payloads::{
    AssigneePayload, CommitPayload, IssuePayload, MilestonePayload, PullRequestPayload,
    SideChannel, UserRef,
};
use crate::transform::TransformStats;

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("malformed record in stream '{stream}': {source}")]
    Malformed {
        stream: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The streams this core understands beyond the generic side-channel fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Issues,
    PullRequests,
    Commits,
    IssueMilestones,
    Assignees,
    /// Recognized only for its side-channel `user`/`repository`/`branch`
    /// fields (repositories, branches, teams, users, ...).
    Other,
}

impl StreamKind {
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "issues" => Self::Issues,
            "pull_requests" => Self::PullRequests,
            "commits" => Self::Commits,
            "issue_milestones" => Self::IssueMilestones,
            "assignees" => Self::Assignees,
            _ => Self::Other,
        }
    }
}

fn parse<T: serde::de::DeserializeOwned>(stream: &str, record: &Value) -> Result<T, TransformError> {
    serde_json::from_value(record.clone()).map_err(|source| TransformError::Malformed {
        stream: stream.to_string(),
        source,
    })
}

fn push_user(acc: &mut EntityAccumulator, out: &mut NormalizedDataset, user: &UserRef) {
    if acc.insert_login(&user.login) {
        out.users.push(NormalizedUser {
            id: user.id,
            login: user.login.to_lowercase(),
            html_url: user.html_url.clone(),
        });
    }
}

fn push_repository(acc: &mut EntityAccumulator, out: &mut NormalizedDataset, name: &str) {
    if acc.insert_repository(name) {
        out.repositories.push(NormalizedRepository {
            name: name.to_lowercase(),
        });
    }
}

fn push_branch(acc: &mut EntityAccumulator, out: &mut NormalizedDataset, repo: &str, branch: &str) {
    if acc.insert_branch(repo, branch) {
        out.branches.push(NormalizedBranch {
            repository: repo.to_lowercase(),
            name: branch.to_lowercase(),
        });
    }
}

/// Routes one raw record into zero or more normalized entity fragments.
///
/// The side-channel fields (`user`, `repository`, `branch`) are consumed from
/// every record regardless of stream; the stream-specific arm then emits the
/// record's own entity. Malformed records of a recognized stream abort the
/// transform with a typed error rather than being skipped.
pub(crate) fn classify(
    kind: StreamKind,
    stream: &str,
    record: &Value,
    acc: &mut EntityAccumulator,
    out: &mut NormalizedDataset,
    stats: &mut TransformStats,
) -> Result<(), TransformError> {
    let side: SideChannel = parse(stream, record)?;
    if let Some(user) = &side.user {
        push_user(acc, out, user);
    }
    if let Some(repository) = side.repository.as_deref() {
        push_repository(acc, out, repository);
        if let Some(branch) = side.branch.as_deref() {
            push_branch(acc, out, repository, branch);
        }
    }

    match kind {
        StreamKind::Issues => {
            let payload: IssuePayload = parse(stream, record)?;
            out.issues.push(NormalizedIssue {
                id: payload.id,
                title: payload.title,
                body: payload.body,
                number: payload.number,
                html_url: payload.html_url,
                created_at: payload.created_at,
                updated_at: payload.updated_at,
                created_by: payload.user.id,
                repository: payload.repository.to_lowercase(),
                milestone_id: payload.milestone.map(|m| m.id),
                assignees: payload.assignees.iter().map(|a| a.id).collect(),
            });
        }
        StreamKind::PullRequests => {
            let payload: PullRequestPayload = parse(stream, record)?;
            out.pull_requests.push(NormalizedPullRequest {
                id: payload.id,
                created_by: payload.user.id,
                repository: payload.repository.to_lowercase(),
                number: payload.number,
                state: payload.state,
                title: payload.title,
                body: payload.body,
                html_url: payload.html_url,
                created_at: payload.created_at,
                updated_at: payload.updated_at,
                merged_at: payload.merged_at,
                milestone_id: payload.milestone.map(|m| m.id),
                assignees: payload.assignees.iter().map(|a| a.id).collect(),
            });
        }
        StreamKind::Commits => {
            let payload: CommitPayload = parse(stream, record)?;
            match payload.author {
                None => {
                    // Author-less commits cannot be linked to a user row and
                    // are excluded outright; the count keeps the loss visible.
                    stats.commits_dropped_no_author += 1;
                }
                Some(author) => {
                    push_user(acc, out, &author);
                    out.commits.push(NormalizedCommit {
                        user_id: author.id,
                        repository: payload.repository.to_lowercase(),
                        branch: payload.branch.map(|b| b.to_lowercase()),
                        created_at: payload.created_at,
                        message: payload.commit.message,
                        sha: payload.sha,
                        parents: payload.parents.into_iter().map(|p| p.sha).collect(),
                        html_url: payload.html_url,
                    });
                }
            }
        }
        StreamKind::IssueMilestones => {
            let payload: MilestonePayload = parse(stream, record)?;
            out.milestones.push(NormalizedMilestone {
                id: payload.id,
                repository: payload.repository.to_lowercase(),
                title: payload.title,
                description: payload.description,
                number: payload.number,
                state: payload.state,
                created_at: payload.created_at,
                updated_at: payload.updated_at,
                creator: payload.creator.id,
            });
        }
        StreamKind::Assignees => {
            let payload: AssigneePayload = parse(stream, record)?;
            push_user(
                acc,
                out,
                &UserRef {
                    id: payload.id,
                    login: payload.login,
                    html_url: payload.html_url,
                },
            );
        }
        StreamKind::Other => {}
    }

    Ok(())
}
