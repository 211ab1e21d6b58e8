//! Policy evaluation engine (C5): matches an [`AccessRequest`] against the
//! requesting principal's policy set and decides allow/deny with rationale.

use iam_core::{AccessRequest, AuthzResponse, CatalogSnapshot, CompiledPolicy, Effect, pattern};

/// Stateless evaluator. Holds no data of its own — every call reads from
/// whatever [`CatalogSnapshot`] the caller hands it, so the evaluator never
/// has to know about reloads.
#[derive(Debug, Default, Clone, Copy)]
pub struct PolicyEvaluator;

impl PolicyEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate `request` against `snapshot`. Never fails: a request that
    /// cannot be satisfied (no policies, nothing matched) simply decides
    /// deny, per the spec's "always produce a decision" rule.
    pub fn authorize(&self, request: &AccessRequest, snapshot: &CatalogSnapshot) -> AuthzResponse {
        let Some(username) = request.username() else {
            return AuthzResponse::no_policies();
        };

        let policies = snapshot.get_policies_for(username);
        if policies.is_empty() {
            return AuthzResponse::no_policies();
        }

        let mut matched: Vec<&CompiledPolicy> = Vec::new();
        for policy in policies {
            if policy_matches_sar(policy, request) {
                matched.push(policy);
            }
        }

        if matched.is_empty() {
            return AuthzResponse {
                allowed: false,
                reason: "no matching policy".to_owned(),
                matched_policies: Vec::new(),
                deciders: Vec::new(),
            };
        }

        let matched_policies: Vec<String> = matched.iter().map(|p| p.name.to_string()).collect();

        let condition_holders: Vec<&CompiledPolicy> = matched
            .iter()
            .copied()
            .filter(|p| conditions_hold(p, request))
            .collect();

        // Deciders are only the policies whose effect matches the winning
        // decision: an allow overridden by a co-matching deny did not
        // contribute to the final outcome, and vice versa.
        let winning_effect = if condition_holders.iter().any(|p| p.effect == Effect::Deny) {
            Some(Effect::Deny)
        } else if condition_holders.iter().any(|p| p.effect == Effect::Allow) {
            Some(Effect::Allow)
        } else {
            None
        };

        let decider_names: Vec<String> = condition_holders
            .iter()
            .filter(|p| Some(p.effect) == winning_effect)
            .map(|p| p.name.to_string())
            .collect();

        match winning_effect {
            Some(Effect::Deny) => AuthzResponse {
                allowed: false,
                reason: "explicit deny".to_owned(),
                matched_policies,
                deciders: decider_names,
            },
            Some(Effect::Allow) => AuthzResponse {
                allowed: true,
                reason: "allowed".to_owned(),
                matched_policies,
                deciders: decider_names,
            },
            None => AuthzResponse {
                allowed: false,
                reason: "deny by default".to_owned(),
                matched_policies,
                deciders: decider_names,
            },
        }
    }
}

/// Subject/action/resource match, ignoring conditions — used for the
/// diagnostic `matched_policies` list.
fn policy_matches_sar(policy: &CompiledPolicy, request: &AccessRequest) -> bool {
    pattern::matches_any(&policy.subjects, &request.subject)
        && pattern::matches_any(&policy.actions, &request.action)
        && pattern::matches_any(&policy.resources, &request.resource)
}

/// All of a policy's named conditions evaluate true, in sorted-name order.
fn conditions_hold(policy: &CompiledPolicy, request: &AccessRequest) -> bool {
    policy
        .conditions
        .iter()
        .all(|(name, condition)| condition.evaluate(request.context.get(name)))
}
