//! In-memory [`AuditSink`] backend. Keeps every appended batch under its key
//! for inspection — intended for local development and integration tests,
//! not production use.

use async_trait::async_trait;
use dashmap::DashMap;
use iam_audit::{AuditSink, SinkError};

/// Stores appended batches keyed by the sink key they were appended under,
/// preserving append order within a key.
#[derive(Debug, Default)]
pub struct InMemorySink {
    batches: DashMap<String, Vec<Vec<u8>>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records appended under `key`, across every batch.
    pub fn count(&self, key: &str) -> usize {
        self.batches.get(key).map_or(0, |records| records.len())
    }

    /// A snapshot copy of every record appended under `key`, in append order.
    pub fn records(&self, key: &str) -> Vec<Vec<u8>> {
        self.batches.get(key).map(|records| records.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl AuditSink for InMemorySink {
    async fn append_batch(&self, key: &str, records: Vec<Vec<u8>>) -> Result<(), SinkError> {
        self.batches.entry(key.to_owned()).or_default().extend(records);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appends_accumulate_under_the_same_key() {
        let sink = InMemorySink::new();
        sink.append_batch("k", vec![vec![1], vec![2]]).await.unwrap();
        sink.append_batch("k", vec![vec![3]]).await.unwrap();

        assert_eq!(sink.count("k"), 3);
        assert_eq!(sink.records("k"), vec![vec![1], vec![2], vec![3]]);
    }

    #[tokio::test]
    async fn distinct_keys_do_not_share_storage() {
        let sink = InMemorySink::new();
        sink.append_batch("a", vec![vec![1]]).await.unwrap();
        sink.append_batch("b", vec![vec![2], vec![3]]).await.unwrap();

        assert_eq!(sink.count("a"), 1);
        assert_eq!(sink.count("b"), 2);
        assert_eq!(sink.count("missing"), 0);
    }
}
