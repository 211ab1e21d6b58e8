//! In-memory catalog store (C2): holds the current [`CatalogSnapshot`] behind
//! a swap-on-publish lock so readers never block on a writer for longer than
//! an `Arc` clone.

use std::sync::Arc;
use std::sync::RwLock;

use iam_core::{CatalogSnapshot, CompiledPolicy, Secret};

/// Shared handle to the current snapshot. Cheap to clone — internally it is
/// an `Arc` around the lock, so every holder sees the same store.
#[derive(Clone)]
pub struct CatalogStore {
    inner: Arc<RwLock<Arc<CatalogSnapshot>>>,
}

impl CatalogStore {
    /// Start with an empty snapshot: no secrets, no policies, deny-by-default.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(CatalogSnapshot::empty()))),
        }
    }

    /// Seed the store with an already-built snapshot, e.g. one fetched at
    /// startup before the HTTP server begins serving traffic.
    pub fn with_snapshot(snapshot: CatalogSnapshot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(snapshot))),
        }
    }

    pub fn get_secret(&self, id: &str) -> Option<Secret> {
        self.current().get_secret(id).cloned()
    }

    pub fn get_policies_for(&self, username: &str) -> Vec<Arc<CompiledPolicy>> {
        self.current().get_policies_for(username).to_vec()
    }

    /// A snapshot reference good for the lifetime of one decision: reads
    /// taken from it never observe a concurrent `replace`.
    pub fn current(&self) -> Arc<CatalogSnapshot> {
        Arc::clone(&self.inner.read().expect("catalog store lock poisoned"))
    }

    /// Atomic swap-on-publish: install `snapshot` as the current one. Callers
    /// already in flight against the old snapshot keep their `Arc` alive and
    /// finish against it; every `current()` after this returns observes the
    /// new one.
    pub fn replace(&self, snapshot: CatalogSnapshot) {
        let mut guard = self.inner.write().expect("catalog store lock poisoned");
        *guard = Arc::new(snapshot);
        tracing::debug!("catalog snapshot replaced");
    }
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iam_core::{Effect, Policy, PolicyName, Username};
    use std::collections::HashMap;
    use std::thread;

    fn policy(owner: &str, name: &str) -> Policy {
        Policy {
            name: PolicyName::new(name),
            owner_username: Username::new(owner),
            subjects: vec!["users:alice".to_owned()],
            actions: vec!["read".to_owned()],
            resources: vec!["doc:1".to_owned()],
            effect: Effect::Allow,
            conditions: HashMap::new(),
            description: None,
        }
    }

    #[test]
    fn starts_empty_and_denies_by_having_nothing() {
        let store = CatalogStore::new();
        assert!(store.get_policies_for("alice").is_empty());
        assert!(store.get_secret("any").is_none());
    }

    #[test]
    fn replace_is_visible_to_subsequent_reads() {
        let store = CatalogStore::new();
        assert!(store.get_policies_for("alice").is_empty());

        let snapshot = CatalogSnapshot::build(Vec::new(), vec![policy("alice", "p1")]).unwrap();
        store.replace(snapshot);

        assert_eq!(store.get_policies_for("alice").len(), 1);
    }

    #[test]
    fn in_flight_reader_keeps_old_snapshot_across_a_replace() {
        let store = CatalogStore::new();
        let snapshot = CatalogSnapshot::build(Vec::new(), vec![policy("alice", "p1")]).unwrap();
        store.replace(snapshot);

        let held = store.current();
        store.replace(CatalogSnapshot::empty());

        // The handle taken before the second replace still sees the old data.
        assert_eq!(held.get_policies_for("alice").len(), 1);
        // But a fresh read sees the new, empty snapshot.
        assert!(store.get_policies_for("alice").is_empty());
    }

    #[test]
    fn concurrent_readers_never_observe_a_torn_snapshot() {
        let store = CatalogStore::new();
        store
            .replace(CatalogSnapshot::build(Vec::new(), vec![policy("alice", "p1")]).unwrap());

        let readers: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        let count = store.get_policies_for("alice").len();
                        assert!(count == 0 || count == 1);
                    }
                })
            })
            .collect();

        for _ in 0..5 {
            store.replace(CatalogSnapshot::build(Vec::new(), vec![policy("alice", "p1")]).unwrap());
            store.replace(CatalogSnapshot::empty());
        }

        for reader in readers {
            reader.join().unwrap();
        }
    }
}
