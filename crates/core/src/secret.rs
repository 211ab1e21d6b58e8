use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{SecretId, Username};

/// Lifecycle state of a [`Secret`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum SecretStatus {
    /// Usable for authentication.
    Normal,
    /// Administratively disabled; JWT validation upstream must reject it.
    Disabled,
}

/// An API credential owned by a user. Secrets are identified by `id` and are
/// consulted by the upstream JWT-verification collaborator, not by this
/// server directly; the authz path only needs them to enumerate the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Secret {
    /// Unique identifier; this is the secret's identity.
    pub id: SecretId,
    /// Username of the owning principal.
    pub owner_username: Username,
    /// The credential material itself.
    pub key: String,
    /// Whether the secret may currently be used.
    pub status: SecretStatus,
    /// Optional expiry; `None` means the secret never expires on its own.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Secret {
    /// Whether the secret is usable right now: status is `Normal` and, if an
    /// expiry is set, it has not yet passed.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status == SecretStatus::Normal && self.expires_at.is_none_or(|exp| exp > now)
    }
}
