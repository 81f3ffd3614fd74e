//! In-memory baseline owner.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::{AppError, Result};
use crate::models::{Fingerprint, StateMap};
use crate::pipeline::{Decision, detect_change};
use crate::storage::StateStorage;

/// Result of reconciling one fresh fingerprint with the stored baseline.
#[derive(Debug)]
pub struct Reconciliation {
    pub decision: Decision,
    /// Set when the new baseline was kept in memory but not written to disk
    pub persist_error: Option<AppError>,
}

/// Authoritative baselines for the running process.
///
/// Every read-compare-write for a target runs under one lock, durable save
/// included. Cycles additionally hold the per-target step lock from
/// [`StateStore::lock_target`] across fetch and reconcile, so a slow fetch
/// can never be compared against a baseline written after it started.
pub struct StateStore {
    storage: Arc<dyn StateStorage>,
    state: Mutex<StateMap>,
    target_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl StateStore {
    /// Load baselines from `storage`.
    ///
    /// Unreadable storage is treated as having no history.
    pub async fn open(storage: Arc<dyn StateStorage>) -> Self {
        let state = match storage.load().await {
            Ok(state) => {
                log::info!("Loaded {} stored baselines", state.len());
                state
            }
            Err(e) => {
                log::warn!("State unreadable, starting without history: {}", e);
                StateMap::new()
            }
        };

        Self {
            storage,
            state: Mutex::new(state),
            target_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Exclusive access to one target's fetch-to-reconcile step.
    ///
    /// Other targets are not blocked.
    pub async fn lock_target(&self, target: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.target_locks.lock().await;
            Arc::clone(locks.entry(target.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    pub async fn get(&self, target: &str) -> Option<Fingerprint> {
        self.state.lock().await.get(target).cloned()
    }

    pub async fn snapshot(&self) -> StateMap {
        self.state.lock().await.clone()
    }

    /// Targets from `targets` that have no baseline yet.
    pub async fn missing(&self, targets: &[String]) -> Vec<String> {
        let state = self.state.lock().await;
        targets
            .iter()
            .filter(|target| !state.contains_key(target.as_str()))
            .cloned()
            .collect()
    }

    /// Compare `current` with the stored baseline and adopt it when needed.
    ///
    /// Persistence failures are logged and reported but never undo the
    /// in-memory update.
    pub async fn reconcile(&self, target: &str, current: Fingerprint) -> Reconciliation {
        let mut state = self.state.lock().await;
        let decision = detect_change(state.get(target), &current);

        let mut persist_error = None;
        if decision.writes_baseline() {
            state.insert(target.to_string(), current);
            if let Err(e) = self.storage.save(&state).await {
                log::error!("[{}] Failed to save baseline for {}: {}", e.kind(), target, e);
                persist_error = Some(e);
            }
        }

        Reconciliation {
            decision,
            persist_error,
        }
    }

    /// Write the full in-memory state to storage.
    pub async fn persist(&self) -> Result<()> {
        let state = self.state.lock().await;
        self.storage.save(&state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStorage;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct BrokenStorage;

    #[async_trait]
    impl StateStorage for BrokenStorage {
        async fn load(&self) -> Result<StateMap> {
            Err(AppError::persistence("unreadable"))
        }

        async fn save(&self, _state: &StateMap) -> Result<()> {
            Err(AppError::persistence("read-only"))
        }
    }

    fn docs(items: &[&str]) -> Fingerprint {
        Fingerprint::from_documents(items.iter().map(|s| s.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_unreadable_storage_starts_empty() {
        let store = StateStore::open(Arc::new(BrokenStorage)).await;
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_reconcile_writes_first_and_changed_baselines() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.json");
        let store = StateStore::open(Arc::new(LocalStorage::new(&path))).await;

        let first = store.reconcile("https://x.test/p", docs(&["a.pdf"])).await;
        assert_eq!(first.decision, Decision::FirstObservation);
        assert!(first.persist_error.is_none());

        let again = store.reconcile("https://x.test/p", docs(&["a.pdf"])).await;
        assert_eq!(again.decision, Decision::Unchanged);

        let changed = store
            .reconcile("https://x.test/p", docs(&["a.pdf", "b.pdf"]))
            .await;
        assert!(changed.decision.is_change());

        let on_disk = LocalStorage::new(&path).load().await.unwrap();
        assert_eq!(on_disk, store.snapshot().await);
        assert_eq!(
            on_disk["https://x.test/p"].documents,
            vec!["a.pdf".to_string(), "b.pdf".to_string()]
        );
    }

    #[tokio::test]
    async fn test_save_failure_keeps_memory_state() {
        let store = StateStore::open(Arc::new(BrokenStorage)).await;

        let result = store.reconcile("https://x.test/p", docs(&["a.pdf"])).await;
        assert_eq!(result.decision, Decision::FirstObservation);
        assert!(result.persist_error.is_some());

        let repeat = store.reconcile("https://x.test/p", docs(&["a.pdf"])).await;
        assert_eq!(repeat.decision, Decision::Unchanged);
        assert_eq!(store.get("https://x.test/p").await, Some(docs(&["a.pdf"])));
    }

    #[tokio::test]
    async fn test_target_lock_is_exclusive_per_target() {
        let store = StateStore::open(Arc::new(BrokenStorage)).await;

        let held = store.lock_target("https://x.test/a").await;
        let other = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            store.lock_target("https://x.test/b"),
        )
        .await;
        assert!(other.is_ok());

        let same = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            store.lock_target("https://x.test/a"),
        )
        .await;
        assert!(same.is_err());

        drop(held);
        let _again = store.lock_target("https://x.test/a").await;
    }

    #[tokio::test]
    async fn test_missing_targets() {
        let tmp = TempDir::new().unwrap();
        let store =
            StateStore::open(Arc::new(LocalStorage::new(tmp.path().join("s.json")))).await;
        store.reconcile("https://x.test/a", docs(&["a.pdf"])).await;

        let targets = vec!["https://x.test/a".to_string(), "https://x.test/b".to_string()];
        assert_eq!(store.missing(&targets).await, vec!["https://x.test/b"]);
    }
}
