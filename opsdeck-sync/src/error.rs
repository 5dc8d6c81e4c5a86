//! Error types for the sync layer.

use crate::session::AuthError;
use opsdeck_store::StoreError;
use opsdeck_types::ValidationError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
///
/// Nothing here is fatal: every failure is also reported through the
/// notice channel, and the projection keeps its last-known state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    /// A record failed validation before any store call.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The store rejected or failed the operation.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The identity provider rejected or failed the operation.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// A record could not be serialized into a store field map.
    #[error("serialization error: {0}")]
    Serialization(String),
}
