use std::time::Duration;

/// Tuning knobs for [`crate::AuditPipeline::start`].
#[derive(Debug, Clone)]
pub struct AuditPipelineConfig {
    /// Number of worker tasks pulling from the shared queue.
    pub pool_size: usize,
    /// Capacity of the shared queue; also determines each worker's batch
    /// size as `buffer_capacity / pool_size`.
    pub buffer_capacity: usize,
    /// Per-worker timer that marks a batch ready to send, independent of
    /// size. The 1-second forced bound applies regardless of this value.
    pub flush_interval: Duration,
    /// Key the sink's batches are appended under.
    pub sink_key: String,
}

impl AuditPipelineConfig {
    /// Per-worker batch size, `buffer_capacity / pool_size`, floored at 1 so
    /// a misconfigured pool of size larger than the buffer still makes
    /// progress.
    pub fn batch_capacity(&self) -> usize {
        (self.buffer_capacity / self.pool_size.max(1)).max(1)
    }
}

impl Default for AuditPipelineConfig {
    fn default() -> Self {
        Self {
            pool_size: 4,
            buffer_capacity: 1024,
            flush_interval: Duration::from_millis(500),
            sink_key: "iam.audit.records".to_owned(),
        }
    }
}
