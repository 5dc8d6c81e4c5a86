//! Error types for the insight layer.

use thiserror::Error;

/// Result type for insight operations.
pub type InsightResult<T> = Result<T, InsightError>;

/// Errors that can occur when summarizing dashboard metrics.
#[derive(Debug, Error)]
pub enum InsightError {
    /// The metrics failed validation; no request was sent.
    #[error("invalid metrics: {field} must be non-negative (got {value})")]
    InvalidMetric {
        /// The offending metric field.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// The HTTP request itself failed.
    #[error("summary request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("summary endpoint returned status {status}")]
    Status {
        /// The HTTP status code.
        status: u16,
    },

    /// The service answered 2xx but with an empty summary.
    #[error("summary endpoint returned an empty summary")]
    EmptySummary,
}
