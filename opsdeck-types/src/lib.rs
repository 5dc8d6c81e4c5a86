//! Domain record types for opsdeck.
//!
//! Defines the types shared by every opsdeck subsystem:
//! - [`UserRecord`] / [`ProductRecord`] — the two admin-console record types
//! - [`Role`] — user authorization role
//! - [`Keyed`] — a record with its store key reattached at the projection boundary
//! - [`Resource`] — the contract a record type implements to be synchronized
//!
//! Store keys are never part of a record's stored field set; they exist only
//! on the [`Keyed`] wrapper produced when a snapshot is projected.

mod error;
mod record;

pub use error::ValidationError;
pub use record::{Keyed, ProductRecord, Resource, Role, UserRecord};
