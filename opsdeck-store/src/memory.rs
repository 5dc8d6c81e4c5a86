//! In-process keyed store.
//!
//! Backs tests and local development with the same contract as a remote
//! store: per-path snapshots, push notifications after every mutation,
//! time-ordered generated keys. Permission denials and one-shot failures
//! can be injected so callers can exercise their error paths.

use crate::error::{StoreError, StoreResult};
use crate::keyed::{
    FieldMap, KeyedStore, Snapshot, SnapshotEvent, SubscriptionEvent, SubscriptionHandle,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

struct Subscriber {
    id: u64,
    tx: mpsc::UnboundedSender<SubscriptionEvent>,
}

#[derive(Default)]
struct Inner {
    data: HashMap<String, BTreeMap<String, FieldMap>>,
    subscribers: HashMap<String, Vec<Subscriber>>,
    denied: HashSet<String>,
    fail_next: Option<StoreError>,
    next_subscriber_id: u64,
}

impl Inner {
    fn check_denied(&self, path: &str) -> StoreResult<()> {
        if self.denied.contains(path) {
            return Err(StoreError::PermissionDenied {
                path: path.to_string(),
            });
        }
        Ok(())
    }

    fn take_injected_failure(&mut self) -> StoreResult<()> {
        match self.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn snapshot(&self, path: &str) -> Snapshot {
        self.data.get(path).cloned()
    }

    /// Pushes the current snapshot of `path` to every live subscriber,
    /// pruning subscribers whose receiver has gone away.
    fn broadcast(&mut self, path: &str) {
        let snapshot = self.snapshot(path);
        if let Some(subs) = self.subscribers.get_mut(path) {
            subs.retain(|sub| {
                sub.tx
                    .send(SubscriptionEvent::Snapshot(SnapshotEvent {
                        path: path.to_string(),
                        snapshot: snapshot.clone(),
                    }))
                    .is_ok()
            });
        }
    }
}

/// An in-memory [`KeyedStore`].
///
/// Clones share the same underlying data, like handles to one process-wide
/// store connection.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a path as permission-denied. Subsequent subscribes, reads,
    /// and mutations on that path fail with
    /// [`StoreError::PermissionDenied`].
    pub fn deny(&self, path: &str) {
        self.inner.lock().unwrap().denied.insert(path.to_string());
    }

    /// Clears a previous [`MemoryStore::deny`].
    pub fn allow(&self, path: &str) {
        self.inner.lock().unwrap().denied.remove(path);
    }

    /// Injects a failure into the next store operation (subscribe, read,
    /// append, merge, delete).
    pub fn fail_next(&self, err: StoreError) {
        self.inner.lock().unwrap().fail_next = Some(err);
    }

    /// Inserts a record under an explicit key and notifies subscribers.
    /// Seeding helper for tests that need known keys.
    pub fn insert(&self, path: &str, key: &str, fields: FieldMap) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .data
            .entry(path.to_string())
            .or_default()
            .insert(key.to_string(), fields);
        inner.broadcast(path);
    }

    /// Fails every live subscriber on a path with `err` and revokes them,
    /// the way a remote store revokes listeners when its security rules
    /// change mid-subscription. Each stream ends after the error event.
    pub fn fail_subscribers(&self, path: &str, err: StoreError) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(subs) = inner.subscribers.remove(path) {
            for sub in subs {
                let _ = sub.tx.send(SubscriptionEvent::Error(err.clone()));
            }
        }
    }

    /// Number of live subscribers on a path.
    pub fn subscriber_count(&self, path: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .subscribers
            .get(path)
            .map_or(0, |subs| subs.len())
    }
}

#[async_trait]
impl KeyedStore for MemoryStore {
    async fn subscribe(&self, path: &str) -> StoreResult<SubscriptionHandle> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = {
            let mut inner = self.inner.lock().unwrap();
            inner.take_injected_failure()?;
            inner.check_denied(path)?;

            let id = inner.next_subscriber_id;
            inner.next_subscriber_id += 1;

            // Initial snapshot is the first delivered event.
            let _ = tx.send(SubscriptionEvent::Snapshot(SnapshotEvent {
                path: path.to_string(),
                snapshot: inner.snapshot(path),
            }));
            inner
                .subscribers
                .entry(path.to_string())
                .or_default()
                .push(Subscriber { id, tx });
            id
        };
        debug!(path, id, "subscribed");

        let registry = Arc::clone(&self.inner);
        let owned_path = path.to_string();
        Ok(SubscriptionHandle::new(rx, move || {
            let mut inner = registry.lock().unwrap();
            if let Some(subs) = inner.subscribers.get_mut(&owned_path) {
                subs.retain(|sub| sub.id != id);
            }
            debug!(path = %owned_path, id, "unsubscribed");
        }))
    }

    async fn read(&self, path: &str) -> StoreResult<Snapshot> {
        let mut inner = self.inner.lock().unwrap();
        inner.take_injected_failure()?;
        inner.check_denied(path)?;
        Ok(inner.snapshot(path))
    }

    async fn append(&self, path: &str, fields: FieldMap) -> StoreResult<String> {
        let mut inner = self.inner.lock().unwrap();
        inner.take_injected_failure()?;
        inner.check_denied(path)?;

        // v7 keys are time-ordered, so key order matches insertion order.
        let key = Uuid::now_v7().to_string();
        inner
            .data
            .entry(path.to_string())
            .or_default()
            .insert(key.clone(), fields);
        inner.broadcast(path);
        Ok(key)
    }

    async fn merge_update(&self, path: &str, key: &str, partial: FieldMap) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.take_injected_failure()?;
        inner.check_denied(path)?;

        // Merge-on-path: a missing key is created, matching the remote
        // store's behavior. Only supplied top-level fields are touched.
        let record = inner
            .data
            .entry(path.to_string())
            .or_default()
            .entry(key.to_string())
            .or_default();
        for (field, value) in partial {
            record.insert(field, value);
        }
        inner.broadcast(path);
        Ok(())
    }

    async fn delete(&self, path: &str, key: &str) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.take_injected_failure()?;
        inner.check_denied(path)?;

        let now_empty = match inner.data.get_mut(path) {
            Some(records) => {
                records.remove(key);
                records.is_empty()
            }
            None => false,
        };
        if now_empty {
            // An empty path is an absent path.
            inner.data.remove(path);
        }
        inner.broadcast(path);
        Ok(())
    }
}
