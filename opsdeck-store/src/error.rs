//! Error types for the store layer.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur at the keyed-store boundary.
///
/// A permission denial is a distinct variant so callers can surface it
/// differently from a generic failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// Store-side security rules rejected the operation.
    #[error("permission denied for path {path}")]
    PermissionDenied {
        /// The resource path that was refused.
        path: String,
    },

    /// The addressed path or key does not exist.
    #[error("not found: {path}")]
    NotFound { path: String },

    /// The store is not configured or not reachable at all.
    #[error("store unavailable")]
    Unavailable,

    /// Transport-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// A field record could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The store connection was closed.
    #[error("store connection closed")]
    Closed,
}

impl StoreError {
    /// Whether this error is a store-side permission denial.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
