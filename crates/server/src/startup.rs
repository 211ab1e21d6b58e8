//! Wires the decision path's collaborators together and drives the
//! shutdown sequence described in the specification's concurrency model:
//! (i) stop accepting new HTTP requests, (ii) cancel the root context so
//! C3/C4 exit, (iii) drain the analytics pipeline, (iv) return so the
//! process can exit.

use std::sync::Arc;
use std::time::Duration;

use iam_audit::{AuditPipeline, AuditSink};
use iam_catalog_client::HttpCatalogClient;
use iam_catalog_store::CatalogStore;
use iam_notify::NotificationBus;
use iam_policy::PolicyEvaluator;
use iam_reload::ReloadCoordinator;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{AuditConfig, IamConfig};
use crate::AppState;

/// Everything [`bootstrap`] started, bundled so [`Bootstrapped::shutdown`]
/// can unwind it in the right order.
pub struct Bootstrapped {
    pub state: AppState,
    cancel: CancellationToken,
    background: JoinHandle<()>,
    notify: JoinHandle<()>,
    audit_workers: Vec<JoinHandle<()>>,
    shutdown_timeout: Duration,
}

/// Capacity of the channel carrying accepted notification-bus events to the
/// reload coordinator's bus loop. Generous relative to the 1-second tick so
/// a burst of edits never backs up into the bus loop.
const BUS_CHANNEL_CAPACITY: usize = 256;

impl Bootstrapped {
    /// Build the catalog client, perform the initial fetch, start the
    /// notification bus and reload coordinator, and spin up the analytics
    /// pipeline. Per the spec's open question, a failed initial fetch is not
    /// fatal: the store stays empty and the evaluator denies by default
    /// until the first successful reload.
    pub async fn bootstrap(config: &IamConfig, node_id: String) -> Self {
        let catalog_client: Arc<HttpCatalogClient> = Arc::new(HttpCatalogClient::new(
            config.catalog.base_url.clone(),
            config.catalog.bearer_token.clone(),
        ));

        let store = CatalogStore::new();
        match iam_catalog_client::CatalogClient::fetch_all(catalog_client.as_ref()).await {
            Ok(snapshot) => {
                tracing::info!(
                    secrets = snapshot.secret_count(),
                    policies = snapshot.policy_count(),
                    "initial catalog fetch succeeded"
                );
                store.replace(snapshot);
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    "initial catalog fetch failed, starting with an empty snapshot (deny-by-default)"
                );
            }
        }

        let cancel = CancellationToken::new();

        let bus = NotificationBus::new(config.notify.redis_url.clone(), node_id);
        let (bus_tx, bus_rx) = mpsc::channel(BUS_CHANNEL_CAPACITY);
        let notify = tokio::spawn(bus.run(bus_tx, cancel.clone()));

        let coordinator = ReloadCoordinator::new(catalog_client, store.clone());
        let background = coordinator.spawn(bus_rx, cancel.clone());

        let sink = build_sink(&config.audit).await;
        let pipeline_config = iam_audit::AuditPipelineConfig {
            pool_size: config.audit.pool_size,
            buffer_capacity: config.audit.buffer_capacity,
            flush_interval: Duration::from_millis(config.audit.flush_interval_ms),
            sink_key: config.audit.sink_key.clone(),
        };
        let (audit, audit_workers) = AuditPipeline::start(pipeline_config, sink);

        let state = AppState {
            store,
            evaluator: PolicyEvaluator::new(),
            audit: Arc::new(audit),
        };

        Self {
            state,
            cancel,
            background,
            notify,
            audit_workers,
            shutdown_timeout: Duration::from_secs(config.server.shutdown_timeout_seconds),
        }
    }

    /// Cancel the background loops and drain the analytics pipeline. Callers
    /// invoke this after the HTTP listener has stopped accepting new
    /// connections (e.g. after `axum::serve(...).with_graceful_shutdown`
    /// resolves).
    pub async fn shutdown(self) {
        self.cancel.cancel();

        if let Err(err) = self.notify.await {
            tracing::error!(error = %err, "notification bus task panicked during shutdown");
        }
        if let Err(err) = self.background.await {
            tracing::error!(error = %err, "reload coordinator task panicked during shutdown");
        }

        let drain = self.state.audit.stop(self.audit_workers);
        if tokio::time::timeout(self.shutdown_timeout, drain).await.is_err() {
            tracing::error!(
                timeout_seconds = self.shutdown_timeout.as_secs(),
                "audit pipeline did not drain within the shutdown timeout"
            );
        }
    }
}

async fn build_sink(config: &AuditConfig) -> Arc<dyn AuditSink> {
    match config.sink_backend.as_str() {
        #[cfg(feature = "redis-audit-sink")]
        "redis" => {
            let url = config
                .redis_url
                .clone()
                .unwrap_or_else(|| "redis://127.0.0.1:6379".to_owned());
            match iam_audit_redis::RedisListSink::connect(&url).await {
                Ok(sink) => Arc::new(sink),
                Err(err) => {
                    tracing::error!(error = %err, "failed to connect redis audit sink, falling back to in-memory");
                    Arc::new(iam_audit_memory::InMemorySink::new())
                }
            }
        }
        _ => Arc::new(iam_audit_memory::InMemorySink::new()),
    }
}
