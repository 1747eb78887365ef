use std::fmt;

use serde::Serialize;

use crate::errors::LoadError;

/// Entity collections in their load order. The order is dictated by
/// foreign-key dependencies, never by arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Collection {
    Users,
    Repositories,
    Milestones,
    Branches,
    Issues,
    PullRequests,
    Commits,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Repositories => "repositories",
            Self::Milestones => "milestones",
            Self::Branches => "branches",
            Self::Issues => "issues",
            Self::PullRequests => "pull_requests",
            Self::Commits => "commits",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub inserted: u64,
    pub skipped: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionReport {
    pub collection: Collection,
    pub inserted: u64,
    pub skipped: u64,
    pub error: Option<String>,
}

impl CollectionReport {
    pub(crate) fn ok(collection: Collection, counts: Counts) -> Self {
        Self {
            collection,
            inserted: counts.inserted,
            skipped: counts.skipped,
            error: None,
        }
    }

    pub(crate) fn failed(collection: Collection, counts: Counts, error: &LoadError) -> Self {
        Self {
            collection,
            inserted: counts.inserted,
            skipped: counts.skipped,
            error: Some(error.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// What one load run did, collection by collection, in load order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub collections: Vec<CollectionReport>,
}

impl LoadReport {
    pub fn is_success(&self) -> bool {
        self.collections.iter().all(CollectionReport::is_ok)
    }

    pub fn collection(&self, collection: Collection) -> Option<&CollectionReport> {
        self.collections
            .iter()
            .find(|report| report.collection == collection)
    }

    pub fn total_inserted(&self) -> u64 {
        self.collections.iter().map(|report| report.inserted).sum()
    }

    pub fn total_skipped(&self) -> u64 {
        self.collections.iter().map(|report| report.skipped).sum()
    }

    pub fn failed_collections(&self) -> impl Iterator<Item = &CollectionReport> {
        self.collections.iter().filter(|report| !report.is_ok())
    }
}
