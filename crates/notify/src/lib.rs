//! Notification bus (C3): subscribes to the cluster's pub/sub invalidation
//! channel and forwards accepted events to a typed channel consumed by the
//! reload coordinator's bus loop.

use std::time::Duration;

use futures::StreamExt;
use iam_core::NotificationEvent;
use redis::AsyncCommands;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Channel name carrying cluster-wide cache invalidation events.
pub const CHANNEL: &str = "iam.cluster.notifications";

/// Fixed backoff applied between reconnect attempts when the broker is
/// unreachable or a subscription drops.
const RECONNECT_BACKOFF: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("pub/sub connection closed")]
    ConnectionClosed,
}

/// Subscribes to [`CHANNEL`] and forwards decoded [`NotificationEvent`]s to
/// `tx`. Owns no decision logic of its own — the reload coordinator decides
/// what to do with what it receives.
pub struct NotificationBus {
    redis_url: String,
    node_id: String,
}

impl NotificationBus {
    pub fn new(redis_url: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self {
            redis_url: redis_url.into(),
            node_id: node_id.into(),
        }
    }

    /// Publish `event` to [`CHANNEL`]. Used by tests and by any collaborator
    /// that needs to announce a change from within this process.
    pub async fn publish(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        let client = redis::Client::open(self.redis_url.clone())?;
        let mut conn = client.get_multiplexed_async_connection().await?;
        let payload = serde_json::to_string(event).expect("NotificationEvent always serializes");
        conn.publish::<_, _, ()>(CHANNEL, payload).await?;
        Ok(())
    }

    /// Run the bus loop until `cancel` fires, reconnecting with a fixed
    /// backoff whenever the connection drops. Accepted events (not loopback,
    /// not malformed) are sent on `tx`; a full or closed `tx` ends the loop.
    pub async fn run(self, tx: mpsc::Sender<NotificationEvent>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    tracing::debug!("notification bus shutting down");
                    return;
                }
                result = self.subscribe_loop(&tx, &cancel) => {
                    if let Err(err) = result {
                        tracing::error!(error = %err, "notification bus connection lost, reconnecting");
                    } else {
                        // tx closed, or cancellation already handled inside.
                        return;
                    }
                }
            }

            tokio::select! {
                () = cancel.cancelled() => return,
                () = tokio::time::sleep(RECONNECT_BACKOFF) => {}
            }
        }
    }

    async fn subscribe_loop(
        &self,
        tx: &mpsc::Sender<NotificationEvent>,
        cancel: &CancellationToken,
    ) -> Result<(), NotifyError> {
        let client = redis::Client::open(self.redis_url.clone())?;
        let pubsub_conn = client.get_async_pubsub().await?;
        let mut pubsub = pubsub_conn;
        pubsub.subscribe(CHANNEL).await?;
        tracing::info!(channel = CHANNEL, "subscribed to notification bus");

        let mut stream = pubsub.on_message();
        loop {
            tokio::select! {
                () = cancel.cancelled() => return Ok(()),
                message = stream.next() => {
                    let Some(message) = message else {
                        return Err(NotifyError::ConnectionClosed);
                    };
                    self.handle_message(message, tx).await;
                }
            }
        }
    }

    async fn handle_message(&self, message: redis::Msg, tx: &mpsc::Sender<NotificationEvent>) {
        let payload: String = match message.get_payload() {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read notification payload");
                return;
            }
        };

        let event: NotificationEvent = match serde_json::from_str(&payload) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(error = %err, payload = %payload, "dropping malformed notification event");
                return;
            }
        };

        if event.source_node_id == self.node_id {
            tracing::trace!("suppressing loopback notification");
            return;
        }

        if tx.send(event).await.is_err() {
            tracing::debug!("notification receiver dropped, bus has nothing left to forward to");
        }
    }
}
