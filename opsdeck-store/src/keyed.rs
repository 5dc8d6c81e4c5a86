//! The keyed-store trait and subscription types.
//!
//! Defines the narrow interface the rest of opsdeck sees: a path-addressed
//! mapping with push-based snapshot delivery. Backends implement
//! [`KeyedStore`]; consumers hold a [`SubscriptionHandle`] for as long as
//! they want snapshots and cancel it when they unmount.

use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::mpsc;

/// One record's stored fields, as a flat JSON object.
pub type FieldMap = serde_json::Map<String, Value>;

/// The complete state of one resource path: `None` when the path is
/// absent, otherwise a key→fields mapping.
///
/// Iteration order is key order. Store-generated keys are time-ordered
/// (UUIDv7), so key order is insertion order.
pub type Snapshot = Option<BTreeMap<String, FieldMap>>;

/// One push notification for a subscribed path.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotEvent {
    /// The resource path the snapshot belongs to.
    pub path: String,
    /// The complete current state of that path.
    pub snapshot: Snapshot,
}

/// What a live subscription delivers.
///
/// A subscription can fail at any point in its life, not only at attach
/// time: security rules change, the connection drops. The error variant is
/// terminal for the stream — no further events follow it.
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionEvent {
    /// A full snapshot push.
    Snapshot(SnapshotEvent),
    /// The store-side listener failed and was revoked.
    Error(StoreError),
}

/// A live subscription to one resource path.
///
/// Yields [`SubscriptionEvent`]s in the order the store emits them. The
/// first event is the snapshot current at subscribe time. Cancelling (or
/// dropping) the handle deterministically unregisters the subscriber: once
/// [`SubscriptionHandle::cancel`] returns, no further event is delivered.
/// A cancelled subscription cannot be restarted; call
/// [`KeyedStore::subscribe`] again for a fresh one.
pub struct SubscriptionHandle {
    events: mpsc::UnboundedReceiver<SubscriptionEvent>,
    unregister: Option<Box<dyn FnOnce() + Send>>,
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle").finish_non_exhaustive()
    }
}

impl SubscriptionHandle {
    /// Builds a handle from a receiver and an unregister action.
    /// Backend implementations call this from `subscribe`.
    pub fn new(
        events: mpsc::UnboundedReceiver<SubscriptionEvent>,
        unregister: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            events,
            unregister: Some(Box::new(unregister)),
        }
    }

    /// Receives the next subscription event.
    ///
    /// Returns `None` when the store side has gone away.
    pub async fn recv(&mut self) -> Option<SubscriptionEvent> {
        self.events.recv().await
    }

    /// Cancels the subscription, releasing the store-side listener.
    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(unregister) = self.unregister.take() {
            unregister();
        }
        self.events.close();
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.release();
    }
}

/// An addressable, path-based keyed store with push notifications.
///
/// All operations are asynchronous and may fail; errors distinguish at
/// least permission denials from other failures. The store is the sole
/// source of truth — mutations do not report the resulting state, it
/// arrives through the subscription.
#[async_trait]
pub trait KeyedStore: Send + Sync {
    /// Subscribes to a resource path. The current snapshot is delivered
    /// as the first event.
    async fn subscribe(&self, path: &str) -> StoreResult<SubscriptionHandle>;

    /// Reads the current snapshot of a path once, without subscribing.
    async fn read(&self, path: &str) -> StoreResult<Snapshot>;

    /// Appends a new record under a store-generated unique key.
    /// Returns the generated key.
    async fn append(&self, path: &str, fields: FieldMap) -> StoreResult<String>;

    /// Merges only the supplied top-level fields into the record at
    /// `path/key`. Fields not present in `partial` are untouched.
    async fn merge_update(&self, path: &str, key: &str, partial: FieldMap) -> StoreResult<()>;

    /// Removes the record at `path/key`.
    async fn delete(&self, path: &str, key: &str) -> StoreResult<()>;
}
