//! # Delivery Query Service
//!
//! Read-only queries over the delivery store: filtered pagination, per-customer
//! listings, and the "most recent active delivery" lookup. `Ok(None)` from
//! [`DeliveryQueryService::active_for_customer`] is a normal no-content
//! outcome, typed distinctly from `NotFound` so the boundary can answer 204
//! rather than 404.

use sqlx::PgPool;
use tracing::debug;

use crate::error::Result;
use crate::models::Delivery;
use crate::services::lifecycle::DeliveryResponse;
use crate::state_machine::DeliveryStatus;

/// Default page size for listings
pub const DEFAULT_LIST_LIMIT: i64 = 10;

/// Read-only consumer of the delivery store
#[derive(Clone)]
pub struct DeliveryQueryService {
    pool: PgPool,
}

impl DeliveryQueryService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Paginated listing with an optional status filter, in store order.
    /// `limit` defaults to [`DEFAULT_LIST_LIMIT`] and `offset` to 0.
    pub async fn list(
        &self,
        status: Option<DeliveryStatus>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<DeliveryResponse>> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT);
        let offset = offset.unwrap_or(0);
        debug!(?status, limit, offset, "Listing deliveries");

        let deliveries = Delivery::list(&self.pool, status, limit, offset).await?;
        Ok(deliveries.into_iter().map(Into::into).collect())
    }

    /// Every delivery for a customer, capped at the store adapter's
    /// per-customer limit, in store order.
    pub async fn list_by_customer(&self, customer_name: &str) -> Result<Vec<DeliveryResponse>> {
        debug!(customer_name, "Listing deliveries by customer");

        let deliveries = Delivery::list_by_customer(&self.pool, customer_name).await?;
        Ok(deliveries.into_iter().map(Into::into).collect())
    }

    /// The most recently updated in-transit delivery for a customer.
    ///
    /// Returns `Ok(None)` when the customer has no active delivery; that is a
    /// normal outcome, not an error.
    pub async fn active_for_customer(
        &self,
        customer_name: &str,
    ) -> Result<Option<DeliveryResponse>> {
        debug!(customer_name, "Looking up active delivery for customer");

        let delivery = Delivery::find_active_by_customer(&self.pool, customer_name).await?;
        Ok(delivery.map(Into::into))
    }
}
