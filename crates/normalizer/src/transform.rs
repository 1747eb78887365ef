use serde_json::Value;
use tracing::debug;

use crate::accumulator::EntityAccumulator;
use crate::classify::{classify, StreamKind, TransformError};
use crate::dataset::NormalizedDataset;

/// The raw extraction output: one ordered record sequence per stream name.
/// Stream order decides which duplicate representation of a cross-cutting
/// entity wins, nothing else.
#[derive(Debug, Clone, Default)]
pub struct StreamBatch {
    streams: Vec<(String, Vec<Value>)>,
}

impl StreamBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_stream(&mut self, name: impl Into<String>, records: Vec<Value>) {
        self.streams.push((name.into(), records));
    }

    pub fn with_stream(mut self, name: impl Into<String>, records: Vec<Value>) -> Self {
        self.push_stream(name, records);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.streams
            .iter()
            .map(|(name, records)| (name.as_str(), records.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformStats {
    pub records_seen: u64,
    /// Commits excluded because their author was null or absent.
    pub commits_dropped_no_author: u64,
}

#[derive(Debug)]
pub struct TransformOutput {
    pub dataset: NormalizedDataset,
    pub stats: TransformStats,
}

/// Normalizes a full extraction batch into the seven entity collections.
///
/// Pure and deterministic: no I/O, and the same batch in the same stream
/// order yields the same dataset. A malformed record of a recognized stream
/// aborts the whole transform.
pub fn transform(batch: &StreamBatch) -> Result<TransformOutput, TransformError> {
    let mut acc = EntityAccumulator::default();
    let mut dataset = NormalizedDataset::default();
    let mut stats = TransformStats::default();

    for (name, records) in batch.iter() {
        let kind = StreamKind::from_name(name);
        debug!(stream = name, records = records.len(), "transforming stream");
        for record in records {
            classify(kind, name, record, &mut acc, &mut dataset, &mut stats)?;
            stats.records_seen += 1;
        }
    }

    Ok(TransformOutput { dataset, stats })
}
