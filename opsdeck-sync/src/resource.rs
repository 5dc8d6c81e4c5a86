//! The resource synchronizer.
//!
//! One [`ResourceSync`] mirrors one store resource path into an ordered
//! list of typed records. The list is derived, never authoritative: it is
//! rebuilt in full from every snapshot the store pushes, and mutations go
//! to the store without touching it.

use crate::error::{SyncError, SyncResult};
use crate::notice::NoticeSender;
use opsdeck_store::{FieldMap, KeyedStore, Snapshot, StoreError, SubscriptionEvent};
use opsdeck_types::{Keyed, Resource};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Lifecycle phase of a synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    /// No subscription has been established.
    #[default]
    Idle,
    /// Subscription requested, first snapshot not yet applied.
    Subscribing,
    /// Live — the projection reflects the last pushed snapshot.
    Synced,
    /// The subscription failed; the projection retains the last
    /// successful snapshot (empty if none arrived).
    Failed,
}

/// The state a synchronizer publishes to its consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState<R> {
    /// The projected, ordered record list.
    pub records: Vec<Keyed<R>>,
    /// Whether the first snapshot is still outstanding.
    pub loading: bool,
    /// Lifecycle phase.
    pub phase: SyncPhase,
}

impl<R> Default for ResourceState<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            loading: true,
            phase: SyncPhase::Idle,
        }
    }
}

/// Projects a snapshot into an ordered record list.
///
/// Every `(key, fields)` entry becomes a [`Keyed`] record; entries whose
/// fields do not decode into `R` are skipped with a warning rather than
/// poisoning the rest of the resource. The list is stable-sorted by
/// [`Resource::sort_key`] ascending (case-sensitive lexical, missing or
/// empty key first), ties keeping snapshot iteration order.
pub fn project_snapshot<R: Resource>(path: &str, snapshot: &Snapshot) -> Vec<Keyed<R>> {
    let mut records: Vec<Keyed<R>> = Vec::new();
    if let Some(entries) = snapshot {
        for (key, fields) in entries {
            match serde_json::from_value::<R>(Value::Object(fields.clone())) {
                Ok(record) => records.push(Keyed::new(key.clone(), record)),
                Err(err) => {
                    warn!(path, key = %key, %err, "skipping undecodable record");
                }
            }
        }
    }
    records.sort_by(|a, b| a.fields.sort_key().cmp(b.fields.sort_key()));
    records
}

/// Bidirectional sync between one store resource path and one local
/// ordered list, parameterized by record type.
///
/// Exactly one logical subscription is active per synchronizer;
/// [`ResourceSync::subscribe`] releases any previous one first, and
/// [`ResourceSync::release`] (or drop) cancels it deterministically.
///
/// Built with `None` for the store, the synchronizer runs in the
/// degrade-safe unconfigured mode: subscribing publishes an empty,
/// non-loading projection and mutations silently succeed.
pub struct ResourceSync<R: Resource> {
    store: Option<Arc<dyn KeyedStore>>,
    notices: NoticeSender,
    state: Arc<watch::Sender<ResourceState<R>>>,
    drain: Option<JoinHandle<()>>,
}

impl<R: Resource> ResourceSync<R> {
    /// Creates a synchronizer for `R`'s resource path.
    ///
    /// Collaborators are injected here, never ambient; pass `None` for an
    /// unconfigured store.
    pub fn new(store: Option<Arc<dyn KeyedStore>>, notices: NoticeSender) -> Self {
        let (state, _) = watch::channel(ResourceState::default());
        Self {
            store,
            notices,
            state: Arc::new(state),
            drain: None,
        }
    }

    /// The resource path this synchronizer mirrors.
    pub fn path(&self) -> &'static str {
        R::PATH
    }

    /// The current published state.
    pub fn state(&self) -> ResourceState<R> {
        self.state.borrow().clone()
    }

    /// A receiver that observes every published state change.
    pub fn watcher(&self) -> watch::Receiver<ResourceState<R>> {
        self.state.subscribe()
    }

    /// Establishes the store subscription and starts applying pushed
    /// snapshots. Any previous subscription is released first, so at most
    /// one is ever live.
    ///
    /// On subscription failure the loading flag is cleared, the phase
    /// becomes [`SyncPhase::Failed`], and a notice distinguishing a
    /// permission denial from a generic failure is emitted; the error is
    /// also returned.
    pub async fn subscribe(&mut self) -> SyncResult<()> {
        self.release().await;

        let Some(store) = self.store.clone() else {
            debug!(path = R::PATH, "store not configured; publishing empty projection");
            self.state.send_replace(ResourceState {
                records: Vec::new(),
                loading: false,
                phase: SyncPhase::Idle,
            });
            return Ok(());
        };

        self.state.send_modify(|s| {
            s.loading = true;
            s.phase = SyncPhase::Subscribing;
        });

        let mut handle = match store.subscribe(R::PATH).await {
            Ok(handle) => handle,
            Err(err) => {
                report_subscribe_failure::<R>(&self.notices, &self.state, &err);
                return Err(err.into());
            }
        };

        let state = Arc::clone(&self.state);
        let notices = self.notices.clone();
        self.drain = Some(tokio::spawn(async move {
            while let Some(event) = handle.recv().await {
                match event {
                    SubscriptionEvent::Snapshot(event) => {
                        let records = project_snapshot::<R>(&event.path, &event.snapshot);
                        debug!(path = %event.path, count = records.len(), "applied snapshot");
                        state.send_replace(ResourceState {
                            records,
                            loading: false,
                            phase: SyncPhase::Synced,
                        });
                    }
                    SubscriptionEvent::Error(err) => {
                        // Terminal for the stream. The last successful
                        // projection stays in place.
                        report_subscribe_failure::<R>(&notices, &state, &err);
                        break;
                    }
                }
            }
        }));
        Ok(())
    }

    /// Releases the active subscription, if any. The projection is owned
    /// by the subscription, so releasing discards it and the published
    /// state returns to its initial value.
    ///
    /// Deterministic: once this returns, no further snapshot is applied
    /// and no further state is published. In-flight mutations are not
    /// cancelled; their outcome reports are safely dropped.
    pub async fn release(&mut self) {
        if let Some(drain) = self.drain.take() {
            drain.abort();
            // Wait out the abort so nothing publishes after we return.
            let _ = drain.await;
            self.state.send_replace(ResourceState::default());
            debug!(path = R::PATH, "subscription released");
        }
    }

    // ── Mutations ────────────────────────────────────────────────
    //
    // None of these touch the projection. The visible effect of a
    // mutation arrives through the next snapshot push.

    /// Appends a new record under a store-generated key.
    ///
    /// Validates before any store call; a validation failure costs no
    /// network round-trip. Silently succeeds when the store is
    /// unconfigured.
    pub async fn create(&self, record: R) -> SyncResult<()> {
        if let Err(err) = record.validate() {
            self.notices.error(err.to_string());
            return Err(err.into());
        }
        let Some(store) = &self.store else {
            return Ok(());
        };
        let fields = to_field_map(&record)?;
        match store.append(R::PATH, fields).await {
            Ok(key) => {
                debug!(path = R::PATH, key = %key, "record created");
                self.notices
                    .info(format!("Item in {} created successfully.", R::PATH));
                Ok(())
            }
            Err(err) => {
                warn!(path = R::PATH, %err, "create failed");
                self.notices
                    .error(format!("Failed to create item: {err}"));
                Err(err.into())
            }
        }
    }

    /// Merges only the supplied fields into the record at `key`;
    /// unspecified fields are untouched. Whether a missing key is created
    /// or ignored is the store's contract, not redefined here.
    pub async fn update(&self, key: &str, partial: FieldMap) -> SyncResult<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        match store.merge_update(R::PATH, key, partial).await {
            Ok(()) => {
                debug!(path = R::PATH, key, "record updated");
                self.notices
                    .info(format!("Item in {} updated successfully.", R::PATH));
                Ok(())
            }
            Err(err) => {
                warn!(path = R::PATH, key, %err, "update failed");
                self.notices
                    .error(format!("Failed to update item: {err}"));
                Err(err.into())
            }
        }
    }

    /// Removes the record at `key` entirely.
    pub async fn delete(&self, key: &str) -> SyncResult<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        match store.delete(R::PATH, key).await {
            Ok(()) => {
                debug!(path = R::PATH, key, "record deleted");
                self.notices
                    .info(format!("Item from {} deleted successfully.", R::PATH));
                Ok(())
            }
            Err(err) => {
                warn!(path = R::PATH, key, %err, "delete failed");
                self.notices
                    .error(format!("Failed to delete item: {err}"));
                Err(err.into())
            }
        }
    }

}

/// Publishes a subscription failure, whether it happens at attach time or
/// mid-stream. Clears the loading flag, moves the phase to
/// [`SyncPhase::Failed`], leaves the records untouched, and emits a notice
/// that tells a permission denial apart from a generic failure.
fn report_subscribe_failure<R: Resource>(
    notices: &NoticeSender,
    state: &watch::Sender<ResourceState<R>>,
    err: &StoreError,
) {
    warn!(path = R::PATH, %err, "subscription failed");
    let message = if err.is_permission_denied() {
        format!(
            "Access to {} denied. Check the store security rules.",
            R::PATH
        )
    } else {
        format!("Failed to load {} data.", R::PATH)
    };
    notices.error(message);
    state.send_modify(|s| {
        s.loading = false;
        s.phase = SyncPhase::Failed;
    });
}

impl<R: Resource> Drop for ResourceSync<R> {
    fn drop(&mut self) {
        if let Some(drain) = self.drain.take() {
            drain.abort();
        }
    }
}

pub(crate) fn to_field_map<R: Resource>(record: &R) -> SyncResult<FieldMap> {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(SyncError::Serialization(format!(
            "record did not serialize to an object: {other}"
        ))),
        Err(err) => Err(SyncError::Serialization(err.to_string())),
    }
}
