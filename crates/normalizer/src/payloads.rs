use chrono::NaiveDateTime;
use serde::Deserialize;

/// Source timestamps arrive without zone information; some connectors tack a
/// literal `Z` on the end anyway. Parse both forms to the naive wall clock
/// and leave zone attachment to the loader.
pub(crate) mod naive_ts {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer};

    pub(crate) fn parse(value: &str) -> chrono::format::ParseResult<NaiveDateTime> {
        value.strip_suffix('Z').unwrap_or(value).parse()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }
}

pub(crate) mod naive_ts_opt {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|value| super::naive_ts::parse(&value).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// An embedded user object as it appears nested inside issue, pull request
/// and commit records.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRef {
    pub id: i64,
    pub login: String,
    pub html_url: String,
}

/// Fields read generically off every record of every stream, recognized or
/// not. Each one is opportunistic; absence is not an error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SideChannel {
    #[serde(default)]
    pub user: Option<UserRef>,
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
}

/// Milestones embedded in issues/pull requests are only consulted for their
/// id; the full milestone rows come from the `issue_milestones` stream.
#[derive(Debug, Clone, Deserialize)]
pub struct MilestoneRef {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssuePayload {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub number: i64,
    pub html_url: String,
    #[serde(with = "naive_ts")]
    pub created_at: NaiveDateTime,
    #[serde(with = "naive_ts")]
    pub updated_at: NaiveDateTime,
    pub user: UserRef,
    pub repository: String,
    #[serde(default)]
    pub milestone: Option<MilestoneRef>,
    #[serde(default)]
    pub assignees: Vec<UserRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestPayload {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub number: i64,
    pub state: String,
    pub html_url: String,
    #[serde(with = "naive_ts")]
    pub created_at: NaiveDateTime,
    #[serde(with = "naive_ts")]
    pub updated_at: NaiveDateTime,
    #[serde(default, with = "naive_ts_opt")]
    pub merged_at: Option<NaiveDateTime>,
    pub user: UserRef,
    pub repository: String,
    #[serde(default)]
    pub milestone: Option<MilestoneRef>,
    #[serde(default)]
    pub assignees: Vec<UserRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetail {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParentRef {
    pub sha: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitPayload {
    /// Null or absent for commits whose author has no platform account;
    /// those records are dropped during transform.
    #[serde(default)]
    pub author: Option<UserRef>,
    pub repository: String,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(with = "naive_ts")]
    pub created_at: NaiveDateTime,
    pub commit: CommitDetail,
    pub sha: String,
    #[serde(default)]
    pub parents: Vec<ParentRef>,
    pub html_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatorRef {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MilestonePayload {
    pub id: i64,
    pub repository: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub number: i64,
    pub state: String,
    #[serde(with = "naive_ts")]
    pub created_at: NaiveDateTime,
    #[serde(with = "naive_ts")]
    pub updated_at: NaiveDateTime,
    pub creator: CreatorRef,
}

/// The `assignees` stream carries user fields at the top level rather than
/// nested under a `user` key.
#[derive(Debug, Clone, Deserialize)]
pub struct AssigneePayload {
    pub id: i64,
    pub login: String,
    pub html_url: String,
}
