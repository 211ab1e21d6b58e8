//! Reload coordinator (C4): debounces and serializes catalog reloads.
//!
//! Three cooperating loops, per the design this mirrors: a queue (just a
//! mutex-protected list — enqueuing is cheap and synchronous), a tick loop
//! that wakes once a second and drains the queue into at most one fetch, and
//! a bus loop that turns accepted notification-bus events into queue
//! entries.

use std::sync::Arc;
use std::time::Duration;

use iam_catalog_client::CatalogClient;
use iam_catalog_store::CatalogStore;
use iam_core::NotificationEvent;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// The 1-second quantum the tick loop drains `pending` on.
const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Serializes and debounces reloads of a [`CatalogStore`] from a
/// [`CatalogClient`]. Cheap to clone — all state lives behind the inner
/// `Arc`.
#[derive(Clone)]
pub struct ReloadCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    client: Arc<dyn CatalogClient>,
    store: CatalogStore,
    pending: Mutex<Vec<Option<oneshot::Sender<bool>>>>,
}

impl ReloadCoordinator {
    pub fn new(client: Arc<dyn CatalogClient>, store: CatalogStore) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                store,
                pending: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Queue a reload request. Returns immediately; the next tick (at most
    /// [`TICK_INTERVAL`] away) performs the actual fetch.
    pub async fn request_reload(&self) {
        self.inner.pending.lock().await.push(None);
    }

    /// Queue a reload request and return a receiver that resolves to whether
    /// the reload that drained it succeeded. Intended for tests that need to
    /// observe completion deterministically rather than polling the store.
    pub async fn request_reload_awaiting(&self) -> oneshot::Receiver<bool> {
        let (tx, rx) = oneshot::channel();
        self.inner.pending.lock().await.push(Some(tx));
        rx
    }

    /// Spawn the tick loop and the bus loop as background tasks. Both exit
    /// when `cancel` fires; the returned handle resolves once both have.
    pub fn spawn(
        self,
        bus_rx: mpsc::Receiver<NotificationEvent>,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let tick = self.clone();
        let tick_cancel = cancel.clone();
        let bus = self;

        tokio::spawn(async move {
            tokio::join!(
                tick.tick_loop(tick_cancel),
                bus.bus_loop(bus_rx, cancel),
            );
        })
    }

    async fn tick_loop(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    tracing::debug!("reload coordinator tick loop shutting down");
                    return;
                }
                _ = interval.tick() => {
                    self.drain_and_reload().await;
                }
            }
        }
    }

    async fn bus_loop(&self, mut bus_rx: mpsc::Receiver<NotificationEvent>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    tracing::debug!("reload coordinator bus loop shutting down");
                    return;
                }
                event = bus_rx.recv() => {
                    match event {
                        Some(event) if event.triggers_reload() => {
                            tracing::debug!(kind = ?event.kind, "queuing reload from notification bus");
                            self.request_reload().await;
                        }
                        Some(_) => {}
                        None => return,
                    }
                }
            }
        }
    }

    /// Drain whatever is currently pending and, if anything was queued, run
    /// exactly one fetch-and-replace. Any number of requests queued within
    /// one tick collapse into a single fetch.
    async fn drain_and_reload(&self) {
        let callbacks: Vec<Option<oneshot::Sender<bool>>> = {
            let mut pending = self.inner.pending.lock().await;
            std::mem::take(&mut *pending)
        };

        if callbacks.is_empty() {
            return;
        }

        let success = match self.inner.client.fetch_all().await {
            Ok(snapshot) => {
                self.inner.store.replace(snapshot);
                true
            }
            Err(err) => {
                tracing::error!(error = %err, "catalog reload failed, keeping previous snapshot");
                false
            }
        };

        for callback in callbacks.into_iter().flatten() {
            let _ = callback.send(success);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use iam_core::{CatalogSnapshot, EventKind, IamError, Policy, PolicyName, Username};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingClient {
        fetches: AtomicUsize,
        fail_next: std::sync::atomic::AtomicBool,
    }

    impl CountingClient {
        fn new() -> Self {
            Self {
                fetches: AtomicUsize::new(0),
                fail_next: std::sync::atomic::AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl CatalogClient for CountingClient {
        async fn fetch_all(&self) -> Result<CatalogSnapshot, IamError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(IamError::CatalogUnavailable("boom".to_owned()));
            }
            let policy = Policy {
                name: PolicyName::new("p1"),
                owner_username: Username::new("alice"),
                subjects: vec!["users:alice".to_owned()],
                actions: vec!["read".to_owned()],
                resources: vec!["doc:1".to_owned()],
                effect: iam_core::Effect::Allow,
                conditions: HashMap::new(),
                description: None,
            };
            Ok(CatalogSnapshot::build(Vec::new(), vec![policy]).unwrap())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn multiple_requests_within_one_tick_collapse_to_one_fetch() {
        let client = Arc::new(CountingClient::new());
        let store = CatalogStore::new();
        let coordinator = ReloadCoordinator::new(client.clone(), store.clone());

        let cancel = CancellationToken::new();
        let (_tx, rx) = mpsc::channel(8);
        let handle = coordinator.clone().spawn(rx, cancel.clone());

        let mut receivers = Vec::new();
        for _ in 0..5 {
            receivers.push(coordinator.request_reload_awaiting().await);
        }

        tokio::time::advance(Duration::from_secs(2)).await;

        for receiver in receivers {
            assert!(receiver.await.unwrap());
        }

        assert_eq!(client.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(store.get_policies_for("alice").len(), 1);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn bus_event_that_triggers_reload_queues_a_fetch() {
        let client = Arc::new(CountingClient::new());
        let store = CatalogStore::new();
        let coordinator = ReloadCoordinator::new(client.clone(), store.clone());

        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel(8);
        let handle = coordinator.clone().spawn(rx, cancel.clone());

        tx.send(NotificationEvent::new(EventKind::PolicyChanged, "node-b"))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        // give the bus_loop/tick_loop tasks a chance to run after the clock jump
        tokio::task::yield_now().await;

        assert_eq!(client.fetches.load(Ordering::SeqCst), 1);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn no_op_events_never_queue_a_reload() {
        let client = Arc::new(CountingClient::new());
        let store = CatalogStore::new();
        let coordinator = ReloadCoordinator::new(client.clone(), store.clone());

        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel(8);
        let handle = coordinator.clone().spawn(rx, cancel.clone());

        tx.send(NotificationEvent::new(EventKind::NoOp, "node-b"))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(3)).await;
        tokio::task::yield_now().await;

        assert_eq!(client.fetches.load(Ordering::SeqCst), 0);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_failure_keeps_previous_snapshot_and_reports_failure() {
        let client = Arc::new(CountingClient::new());
        client.fail_next.store(true, Ordering::SeqCst);
        let store = CatalogStore::new();
        let coordinator = ReloadCoordinator::new(client.clone(), store.clone());

        let cancel = CancellationToken::new();
        let (_tx, rx) = mpsc::channel(8);
        let handle = coordinator.clone().spawn(rx, cancel.clone());

        let receiver = coordinator.request_reload_awaiting().await;
        tokio::time::advance(Duration::from_secs(2)).await;

        assert!(!receiver.await.unwrap());
        assert!(store.get_policies_for("alice").is_empty());

        cancel.cancel();
        handle.await.unwrap();
    }
}
