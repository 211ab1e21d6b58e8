//! HTTP wiring for the IAM authorization decision path (C6) and the
//! background loops (C3/C4/C7) that keep it fed.
//!
//! This crate is the "thin HTTP handler layer" the specification treats as
//! glue: decoding, routing, and process lifetime. The decision logic itself
//! lives in `iam-policy`; the cache in `iam-catalog-store`; the audit
//! pipeline in `iam-audit`.

pub mod api;
pub mod config;
pub mod error;
pub mod startup;

use std::sync::Arc;

use iam_audit::AuditPipeline;
use iam_catalog_store::CatalogStore;
use iam_policy::PolicyEvaluator;

/// Shared application state passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: CatalogStore,
    pub evaluator: PolicyEvaluator,
    pub audit: Arc<AuditPipeline>,
}
