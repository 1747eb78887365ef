use std::path::{Path, PathBuf};

use async_trait::async_trait;
use normalizer::StreamBatch;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("failed to read stream file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("stream file {path} is not a JSON array of records: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The source side of the pipeline. The real extraction (GitHub via a sync
/// connector) lives outside this system; anything that can hand over a
/// `StreamBatch` can feed the pipeline.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn extract(&self, streams: &[String]) -> Result<StreamBatch, ExtractionError>;
}

/// Reads one `<stream>.json` array per selected stream from a directory, the
/// shape the upstream extraction dumps its full-refresh batches in. A stream
/// with no file simply contributes nothing; an unreadable or undecodable
/// file fails the whole extraction.
pub struct JsonFileConnector {
    root: PathBuf,
}

impl JsonFileConnector {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn stream_path(&self, stream: &str) -> PathBuf {
        self.root.join(format!("{stream}.json"))
    }
}

async fn read_records(path: &Path) -> Result<Option<Vec<Value>>, ExtractionError> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(ExtractionError::Io {
                path: path.display().to_string(),
                source: err,
            })
        }
    };
    let records = serde_json::from_str::<Vec<Value>>(&raw).map_err(|err| {
        ExtractionError::Decode {
            path: path.display().to_string(),
            source: err,
        }
    })?;
    Ok(Some(records))
}

#[async_trait]
impl Connector for JsonFileConnector {
    async fn extract(&self, streams: &[String]) -> Result<StreamBatch, ExtractionError> {
        let mut batch = StreamBatch::new();
        for stream in streams {
            let path = self.stream_path(stream);
            match read_records(&path).await? {
                Some(records) => {
                    debug!(stream = %stream, records = records.len(), "extracted stream");
                    batch.push_stream(stream.clone(), records);
                }
                None => debug!(stream = %stream, "no stream file; skipping"),
            }
        }
        Ok(batch)
    }
}
