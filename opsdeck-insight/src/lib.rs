//! Dashboard metrics and the AI summary collaborator.
//!
//! Aggregates the console's record projections into [`DashboardMetrics`]
//! and asks a hosted text-generation service for a natural-language
//! summary of them. The service is an opaque, potentially slow,
//! potentially failing remote call: one request, one response, no retries
//! and no streaming.

mod client;
mod error;
mod metrics;

pub use client::{SummaryClient, SummaryConfig, SummaryRequest, SummaryResponse};
pub use error::{InsightError, InsightResult};
pub use metrics::DashboardMetrics;
