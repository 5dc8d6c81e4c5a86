//! Validation errors raised before any store round-trip.

use thiserror::Error;

/// A record failed validation at the typed boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required text field was empty.
    #[error("{resource}: {field} must not be empty")]
    EmptyField {
        /// The resource path the record belongs to.
        resource: &'static str,
        /// The offending field name.
        field: &'static str,
    },

    /// A numeric field was not a positive finite number.
    #[error("{resource}: {field} must be a positive number (got {value})")]
    InvalidNumber {
        /// The resource path the record belongs to.
        resource: &'static str,
        /// The offending field name.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },
}
