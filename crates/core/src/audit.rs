use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::policy::Effect;

/// A TTL of zero means "effectively never expires"; we represent that as a
/// 100-year horizon rather than modeling a true infinite TTL, matching the
/// upstream analytics pipeline this design is derived from.
const EFFECTIVELY_NEVER_DAYS: i64 = 365 * 100;

/// One row of the audit stream: a complete summary of a single authorization
/// decision, destined for the analytics pipeline's sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub username: String,
    pub effect: Effect,
    pub conclusion: String,
    pub request_json: Value,
    pub matched_policies_json: Value,
    pub deciders_json: Value,
    pub expire_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Build a record with `expire_at` derived from `ttl`. `ttl == 0`
    /// resolves to a 100-year horizon rather than a literal "never".
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        timestamp: DateTime<Utc>,
        username: impl Into<String>,
        effect: Effect,
        conclusion: impl Into<String>,
        request_json: Value,
        matched_policies_json: Value,
        deciders_json: Value,
        ttl: Duration,
    ) -> Self {
        let ttl = if ttl <= Duration::zero() {
            Duration::days(EFFECTIVELY_NEVER_DAYS)
        } else {
            ttl
        };

        Self {
            timestamp,
            username: username.into(),
            effect,
            conclusion: conclusion.into(),
            request_json,
            matched_policies_json,
            deciders_json,
            expire_at: timestamp + ttl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn zero_ttl_resolves_to_a_century() {
        let now = Utc::now();
        let record = AuditRecord::new(
            now,
            "alice",
            Effect::Allow,
            "allowed",
            json!({}),
            json!([]),
            json!([]),
            Duration::zero(),
        );
        let years = (record.expire_at - now).num_days() / 365;
        assert!(years >= 99);
    }

    #[test]
    fn nonzero_ttl_is_respected() {
        let now = Utc::now();
        let record = AuditRecord::new(
            now,
            "alice",
            Effect::Deny,
            "explicit deny",
            json!({}),
            json!([]),
            json!([]),
            Duration::hours(1),
        );
        assert_eq!(record.expire_at, now + Duration::hours(1));
    }
}
