//! Aggregate dashboard metrics.

use crate::error::{InsightError, InsightResult};
use opsdeck_types::{Keyed, ProductRecord, UserRecord};
use serde::{Deserialize, Serialize};

/// The key metrics summarized for the admin dashboard.
///
/// Serialized camelCase — this is the wire shape the text-generation
/// service receives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    /// Total number of users in the application.
    pub user_count: i64,
    /// Total number of products in the inventory.
    pub product_count: i64,
    /// Average product price; 0 when the inventory is empty.
    pub average_product_price: f64,
}

impl DashboardMetrics {
    /// Computes metrics from the current record projections.
    pub fn from_projections(
        users: &[Keyed<UserRecord>],
        products: &[Keyed<ProductRecord>],
    ) -> Self {
        let average_product_price = if products.is_empty() {
            0.0
        } else {
            products.iter().map(|p| p.fields.price).sum::<f64>() / products.len() as f64
        };
        Self {
            user_count: users.len() as i64,
            product_count: products.len() as i64,
            average_product_price,
        }
    }

    /// Checks the metrics before any network call.
    pub fn validate(&self) -> InsightResult<()> {
        if self.user_count < 0 {
            return Err(InsightError::InvalidMetric {
                field: "userCount",
                value: self.user_count as f64,
            });
        }
        if self.product_count < 0 {
            return Err(InsightError::InvalidMetric {
                field: "productCount",
                value: self.product_count as f64,
            });
        }
        if !self.average_product_price.is_finite() || self.average_product_price < 0.0 {
            return Err(InsightError::InvalidMetric {
                field: "averageProductPrice",
                value: self.average_product_price,
            });
        }
        Ok(())
    }
}
