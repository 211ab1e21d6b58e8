//! Audit analytics pipeline (C7): a bounded, batched, gracefully-draining
//! worker pool that records every authorization decision to an external
//! sink without ever blocking the decision path on sink latency.

mod config;
mod pipeline;
mod sink;

pub use config::AuditPipelineConfig;
pub use pipeline::AuditPipeline;
pub use sink::{AuditSink, SinkError};
