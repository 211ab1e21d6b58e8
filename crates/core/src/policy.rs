use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::condition::{CompiledCondition, ConditionSpec, compile_condition};
use crate::error::PolicyCompileError;
use crate::pattern::{self, Pattern};
use crate::types::{PolicyName, Username};

/// Whether a matched policy permits or forbids the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Effect {
    Allow,
    Deny,
}

/// An authorization policy as stored and transmitted by the API server.
///
/// Subjects, actions, and resources are glob-or-regex patterns (see
/// [`crate::pattern`]); conditions are named predicates (see
/// [`crate::condition`]) keyed by the context field they inspect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Policy {
    pub name: PolicyName,
    pub owner_username: Username,
    pub subjects: Vec<String>,
    pub actions: Vec<String>,
    pub resources: Vec<String>,
    pub effect: Effect,
    #[serde(default)]
    pub conditions: HashMap<String, ConditionSpec>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A [`Policy`] with every pattern and condition precompiled. Built once per
/// snapshot install, shared read-only by every subsequent decision.
#[derive(Debug, Clone)]
pub struct CompiledPolicy {
    pub name: PolicyName,
    pub owner_username: Username,
    pub subjects: Vec<Pattern>,
    pub actions: Vec<Pattern>,
    pub resources: Vec<Pattern>,
    pub effect: Effect,
    /// Conditions sorted by name for deterministic evaluation order.
    pub conditions: Vec<(String, CompiledCondition)>,
    pub description: Option<String>,
}

/// Compile a raw [`Policy`] into a [`CompiledPolicy`].
pub fn compile_policy(policy: &Policy) -> Result<CompiledPolicy, PolicyCompileError> {
    let subjects = pattern::compile_all(&policy.subjects).map_err(|source| PolicyCompileError::Pattern {
        policy: policy.name.to_string(),
        source,
    })?;
    let actions = pattern::compile_all(&policy.actions).map_err(|source| PolicyCompileError::Pattern {
        policy: policy.name.to_string(),
        source,
    })?;
    let resources = pattern::compile_all(&policy.resources).map_err(|source| PolicyCompileError::Pattern {
        policy: policy.name.to_string(),
        source,
    })?;

    let mut conditions: Vec<(String, CompiledCondition)> = policy
        .conditions
        .iter()
        .map(|(name, spec)| (name.clone(), compile_condition(spec)))
        .collect();
    conditions.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(CompiledPolicy {
        name: policy.name.clone(),
        owner_username: policy.owner_username.clone(),
        subjects,
        actions,
        resources,
        effect: policy.effect,
        conditions,
        description: policy.description.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_policy(effect: Effect) -> Policy {
        Policy {
            name: PolicyName::new("p1"),
            owner_username: Username::new("alice"),
            subjects: vec!["users:alice".to_owned()],
            actions: vec!["read".to_owned()],
            resources: vec!["doc:1".to_owned()],
            effect,
            conditions: HashMap::new(),
            description: None,
        }
    }

    #[test]
    fn compiles_simple_policy() {
        let compiled = compile_policy(&sample_policy(Effect::Allow)).unwrap();
        assert!(pattern::matches_any(&compiled.subjects, "users:alice"));
        assert!(pattern::matches_any(&compiled.actions, "read"));
        assert!(pattern::matches_any(&compiled.resources, "doc:1"));
    }

    #[test]
    fn bad_pattern_fails_compilation_not_the_whole_evaluator() {
        let mut policy = sample_policy(Effect::Allow);
        policy.subjects = vec!["users:<unterminated".to_owned()];
        assert!(compile_policy(&policy).is_err());
    }

    #[test]
    fn conditions_are_sorted_by_name() {
        let mut policy = sample_policy(Effect::Allow);
        policy.conditions.insert(
            "zeta".to_owned(),
            ConditionSpec {
                kind: "BoolEqualsCondition".to_owned(),
                options: serde_json::json!({ "value": true }),
            },
        );
        policy.conditions.insert(
            "alpha".to_owned(),
            ConditionSpec {
                kind: "BoolEqualsCondition".to_owned(),
                options: serde_json::json!({ "value": true }),
            },
        );
        let compiled = compile_policy(&policy).unwrap();
        let names: Vec<&str> = compiled.conditions.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }
}
