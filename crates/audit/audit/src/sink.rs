use async_trait::async_trait;
use thiserror::Error;

/// Failure appending a batch to the analytics sink. Always logged and the
/// batch dropped — the audit stream is observational, not transactional.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

/// The key/list store the analytics pipeline flushes batches to. Records
/// arrive pre-serialized (compact binary form of [`iam_core::AuditRecord`]);
/// the sink only needs to append them under `key`.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append_batch(&self, key: &str, records: Vec<Vec<u8>>) -> Result<(), SinkError>;
}
