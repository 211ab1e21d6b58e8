use serde::{Deserialize, Serialize};

/// The kind of change a [`NotificationEvent`] announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum EventKind {
    PolicyChanged,
    SecretChanged,
    /// A keepalive/heartbeat message carrying no actionable change.
    NoOp,
}

/// A message carried on the cluster notification channel
/// (`iam.cluster.notifications`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub kind: EventKind,
    /// Identifies the process that published the event, so a node can
    /// suppress its own loopback notifications.
    pub source_node_id: String,
}

impl NotificationEvent {
    pub fn new(kind: EventKind, source_node_id: impl Into<String>) -> Self {
        Self {
            kind,
            source_node_id: source_node_id.into(),
        }
    }

    /// Whether this event should trigger a reload request.
    pub fn triggers_reload(&self) -> bool {
        matches!(self.kind, EventKind::PolicyChanged | EventKind::SecretChanged)
    }
}
