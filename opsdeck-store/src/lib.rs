//! Remote keyed store abstraction for opsdeck.
//!
//! The store is an addressable, path-based key-value collaborator: each
//! resource path (e.g. `"users"`) holds a mapping from store-generated key
//! to a flat field record. The store pushes the complete snapshot of a path
//! to its subscribers after every change.
//!
//! # Components
//!
//! - **[`KeyedStore`]**: the trait every store backend implements —
//!   path-scoped subscriptions, one-shot reads, appends with generated
//!   keys, partial-field merge updates, and deletions
//! - **[`SubscriptionHandle`]**: a cancellable stream of snapshot and
//!   failure events
//! - **[`MemoryStore`]**: the in-process backend used by tests and local
//!   development, with injectable permission denials and failures

mod error;
mod keyed;
mod memory;

pub use error::{StoreError, StoreResult};
pub use keyed::{FieldMap, KeyedStore, Snapshot, SnapshotEvent, SubscriptionEvent, SubscriptionHandle};
pub use memory::MemoryStore;
