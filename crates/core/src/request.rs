use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An incoming authorization request, decoded from the decision endpoint's
/// JSON body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AccessRequest {
    pub subject: String,
    pub action: String,
    pub resource: String,
    /// Arbitrary request context. The decision frontend injects `"username"`
    /// from the resolved principal before evaluation.
    #[serde(default)]
    pub context: HashMap<String, Value>,
}

impl AccessRequest {
    /// The `username` the frontend is expected to have injected into
    /// `context`, if present.
    pub fn username(&self) -> Option<&str> {
        self.context.get("username").and_then(Value::as_str)
    }
}

/// The outcome of evaluating an [`AccessRequest`] against a policy set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AuthzResponse {
    pub allowed: bool,
    pub reason: String,
    /// Every policy whose subject/action/resource matched, regardless of
    /// conditions — kept for diagnostic rationale.
    pub matched_policies: Vec<String>,
    /// Policies that actually contributed to the final decision.
    pub deciders: Vec<String>,
}

impl AuthzResponse {
    /// No policies at all were registered for the principal.
    pub fn no_policies() -> Self {
        Self {
            allowed: false,
            reason: "no policies".to_owned(),
            matched_policies: Vec::new(),
            deciders: Vec::new(),
        }
    }
}
