use common::errors::EtlError;
use loader::{LoadReport, Loader};
use normalizer::{transform, TransformStats};
use tracing::{info, instrument};

use crate::connector::Connector;

/// What one full-refresh run produced: the transform-side counters and the
/// per-collection load results.
#[derive(Debug)]
pub struct RunReport {
    pub stats: TransformStats,
    pub load: LoadReport,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.load.is_success()
    }
}

/// One extract → transform → load run. Extraction and transform failures are
/// fatal to the run; load failures are scoped per collection and land in the
/// report instead.
pub struct Pipeline {
    connector: Box<dyn Connector>,
    loader: Loader,
    streams: Vec<String>,
}

impl Pipeline {
    pub fn new(connector: Box<dyn Connector>, loader: Loader, streams: Vec<String>) -> Self {
        Self {
            connector,
            loader,
            streams,
        }
    }

    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<RunReport, EtlError> {
        let batch = self
            .connector
            .extract(&self.streams)
            .await
            .map_err(EtlError::extraction)?;

        let output = transform(&batch).map_err(EtlError::transform)?;
        info!(
            records = output.stats.records_seen,
            users = output.dataset.users.len(),
            repositories = output.dataset.repositories.len(),
            branches = output.dataset.branches.len(),
            milestones = output.dataset.milestones.len(),
            issues = output.dataset.issues.len(),
            pull_requests = output.dataset.pull_requests.len(),
            commits = output.dataset.commits.len(),
            commits_dropped_no_author = output.stats.commits_dropped_no_author,
            "transform complete"
        );

        let load = self.loader.load(&output.dataset).await;
        Ok(RunReport {
            stats: output.stats,
            load,
        })
    }
}
