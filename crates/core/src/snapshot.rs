use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::PolicyCompileError;
use crate::policy::{CompiledPolicy, Policy, compile_policy};
use crate::secret::Secret;

/// An immutable bundle of every secret and policy known at one evaluation
/// epoch. Built wholesale by [`CatalogSnapshot::build`] and never mutated in
/// place — a reload replaces it outright.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    secrets_by_id: HashMap<String, Secret>,
    policies_by_owner: HashMap<String, Vec<Arc<CompiledPolicy>>>,
    installed_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    /// Compile `policies` and index both collections. Fails atomically: if
    /// any policy fails to compile, no snapshot is produced — the caller
    /// must keep serving the previous one.
    pub fn build(secrets: Vec<Secret>, policies: Vec<Policy>) -> Result<Self, PolicyCompileError> {
        let secrets_by_id = secrets.into_iter().map(|s| (s.id.to_string(), s)).collect();

        let mut policies_by_owner: HashMap<String, Vec<Arc<CompiledPolicy>>> = HashMap::new();
        for policy in &policies {
            let owner = policy.owner_username.to_string();
            let compiled = Arc::new(compile_policy(policy)?);
            policies_by_owner.entry(owner).or_default().push(compiled);
        }

        Ok(Self {
            secrets_by_id,
            policies_by_owner,
            installed_at: Utc::now(),
        })
    }

    /// An empty snapshot: no secrets, no policies. Used at startup when the
    /// initial catalog fetch fails, so the evaluator can still deny by
    /// default instead of refusing to start.
    pub fn empty() -> Self {
        Self {
            secrets_by_id: HashMap::new(),
            policies_by_owner: HashMap::new(),
            installed_at: Utc::now(),
        }
    }

    pub fn get_secret(&self, id: &str) -> Option<&Secret> {
        self.secrets_by_id.get(id)
    }

    /// Policies owned by `username`, in the order they were installed.
    /// Empty (never `None`) when the user owns no policies.
    pub fn get_policies_for(&self, username: &str) -> &[Arc<CompiledPolicy>] {
        self.policies_by_owner
            .get(username)
            .map_or(&[], Vec::as_slice)
    }

    pub fn installed_at(&self) -> DateTime<Utc> {
        self.installed_at
    }

    pub fn secret_count(&self) -> usize {
        self.secrets_by_id.len()
    }

    pub fn policy_count(&self) -> usize {
        self.policies_by_owner.values().map(Vec::len).sum()
    }
}
