//! Resource synchronization for opsdeck.
//!
//! Keeps a local ordered list of typed records mirrored against a resource
//! path in a remote keyed store, and exposes the mutation surface the
//! admin console calls.
//!
//! # Components
//!
//! - **[`ResourceSync`]**: one synchronizer per mounted consumer per
//!   resource — owns the subscription lifecycle, rebuilds the projected
//!   list on every snapshot push, and performs create/update/delete
//! - **Notices**: user-visible outcome reporting, decoupled from any UI
//! - **[`SessionManager`]**: joins the identity provider's current
//!   identity to its linked `users` record
//!
//! # Sync model
//!
//! The store is the sole source of truth. Mutations never touch the local
//! projection; their visible effect arrives through the next snapshot
//! push on the same subscription. The projection is a disposable cache,
//! rebuilt in full from every snapshot and discarded on release.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use opsdeck_store::{KeyedStore, MemoryStore};
//! use opsdeck_sync::{notice_channel, ResourceSync};
//! use opsdeck_types::ProductRecord;
//!
//! # async fn demo() -> opsdeck_sync::SyncResult<()> {
//! let store: Arc<dyn KeyedStore> = Arc::new(MemoryStore::new());
//! let (notices, _notice_rx) = notice_channel();
//!
//! let mut products: ResourceSync<ProductRecord> =
//!     ResourceSync::new(Some(store), notices);
//! products.subscribe().await?;
//!
//! let state = products.state();
//! println!("{} products, loading={}", state.records.len(), state.loading);
//! # Ok(())
//! # }
//! ```

mod error;
mod notice;
mod resource;
mod session;

pub use error::{SyncError, SyncResult};
pub use notice::{notice_channel, Notice, NoticeReceiver, NoticeSender, NoticeSeverity};
pub use resource::{project_snapshot, ResourceState, ResourceSync, SyncPhase};
pub use session::{
    AuthError, AuthResult, Identity, IdentityProvider, MemoryIdentityProvider, Session,
    SessionManager, SessionState,
};
