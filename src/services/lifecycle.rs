//! # Delivery Lifecycle Manager
//!
//! Owns the delivery state machine: assigns tracking identifiers at creation,
//! validates status transitions against the configured policy, and produces
//! the canonical response representation.
//!
//! The manager does not touch the notification queue. Geolocation publishing
//! is a separate flow over [`crate::messaging::NotificationPublisher`]; the
//! two are not causally linked, so the manager is testable with nothing but a
//! store pool.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{CourierError, Result};
use crate::models::{Delivery, NewDelivery};
use crate::state_machine::{DeliveryStatus, TransitionPolicy};

/// Inbound payload for creating a delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRequest {
    pub order_id: String,
    pub customer_name: String,
    pub origin_address: String,
    pub delivery_address: String,
    pub delivery_date: DateTime<Utc>,
    pub estimated_delivery_time: DateTime<Utc>,
    /// Defaults to `pending` when the caller does not supply one
    #[serde(default)]
    pub status: Option<DeliveryStatus>,
}

/// Inbound payload for a status update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryUpdate {
    pub status: DeliveryStatus,
    /// Caller-supplied update time; the current UTC time is used when absent.
    /// A stamp older than the record's current `last_updated` is clamped so
    /// the stored value never decreases.
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Canonical response representation of a delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryResponse {
    pub tracking_id: Uuid,
    pub order_id: String,
    pub customer_name: String,
    pub origin_address: String,
    pub delivery_address: String,
    pub delivery_date: DateTime<Utc>,
    pub estimated_delivery_time: DateTime<Utc>,
    pub status: DeliveryStatus,
    pub last_updated: Option<DateTime<Utc>>,
}

impl From<Delivery> for DeliveryResponse {
    fn from(delivery: Delivery) -> Self {
        Self {
            tracking_id: delivery.tracking_id,
            order_id: delivery.order_id,
            customer_name: delivery.customer_name,
            origin_address: delivery.origin_address,
            delivery_address: delivery.delivery_address,
            delivery_date: delivery.delivery_date,
            estimated_delivery_time: delivery.estimated_delivery_time,
            status: delivery.status,
            last_updated: delivery.last_updated,
        }
    }
}

/// Confirmation returned by a successful status update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateConfirmation {
    pub tracking_id: Uuid,
    pub status: DeliveryStatus,
    pub message: String,
}

/// Confirmation returned by a successful deletion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletionConfirmation {
    pub tracking_id: Uuid,
    pub message: String,
}

/// Owns the delivery lifecycle over an injected store pool
#[derive(Clone)]
pub struct DeliveryLifecycleManager {
    pool: PgPool,
    policy: TransitionPolicy,
}

impl DeliveryLifecycleManager {
    /// Create a manager with the default permissive transition policy
    pub fn new(pool: PgPool) -> Self {
        Self::with_policy(pool, TransitionPolicy::default())
    }

    /// Create a manager with an explicit transition policy
    pub fn with_policy(pool: PgPool, policy: TransitionPolicy) -> Self {
        Self { pool, policy }
    }

    /// Transition policy this manager enforces
    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Register a new delivery: generate a fresh tracking id, default the
    /// status to `pending` unless the request overrides it, persist, and
    /// return the canonical response. No queue publish happens on creation.
    #[instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn create(&self, request: DeliveryRequest) -> Result<DeliveryResponse> {
        if request.order_id.trim().is_empty() {
            return Err(CourierError::validation("order_id must not be empty"));
        }
        if request.customer_name.trim().is_empty() {
            return Err(CourierError::validation("customer_name must not be empty"));
        }

        let new_delivery = NewDelivery {
            tracking_id: Uuid::new_v4(),
            order_id: request.order_id,
            customer_name: request.customer_name,
            origin_address: request.origin_address,
            delivery_address: request.delivery_address,
            delivery_date: request.delivery_date,
            estimated_delivery_time: request.estimated_delivery_time,
            status: request.status.unwrap_or_default(),
        };

        let delivery = Delivery::create(&self.pool, new_delivery).await?;

        info!(
            tracking_id = %delivery.tracking_id,
            status = %delivery.status,
            "Delivery registered"
        );
        Ok(delivery.into())
    }

    /// Update the status of an existing delivery.
    ///
    /// The transition is validated against the configured policy before the
    /// write; `last_updated` is stamped with the caller-supplied time or the
    /// current UTC time, clamped against the record's current stamp so it is
    /// monotonically non-decreasing. A matched count of zero from the store
    /// maps to `NotFound` even if the record vanished between lookup and
    /// write.
    #[instrument(skip(self, update), fields(status = %update.status))]
    pub async fn update_status(
        &self,
        tracking_id: Uuid,
        update: DeliveryUpdate,
    ) -> Result<StatusUpdateConfirmation> {
        let current = Delivery::find_by_tracking_id(&self.pool, tracking_id)
            .await?
            .ok_or_else(|| CourierError::not_found(tracking_id))?;

        self.policy.validate(current.status, update.status)?;

        // last_updated never moves backwards for a tracking id.
        let mut timestamp = update.last_updated.unwrap_or_else(Utc::now);
        if let Some(previous) = current.last_updated {
            timestamp = timestamp.max(previous);
        }
        let matched =
            Delivery::update_status(&self.pool, tracking_id, update.status, timestamp).await?;
        if matched == 0 {
            return Err(CourierError::not_found(tracking_id));
        }

        info!(
            tracking_id = %tracking_id,
            from = %current.status,
            to = %update.status,
            "Delivery status updated"
        );
        Ok(StatusUpdateConfirmation {
            tracking_id,
            status: update.status,
            message: format!("Delivery {tracking_id} updated to {}", update.status),
        })
    }

    /// Fetch the canonical response for a tracking id
    pub async fn get(&self, tracking_id: Uuid) -> Result<DeliveryResponse> {
        let delivery = Delivery::find_by_tracking_id(&self.pool, tracking_id)
            .await?
            .ok_or_else(|| CourierError::not_found(tracking_id))?;

        Ok(delivery.into())
    }

    /// Remove a delivery record
    #[instrument(skip(self))]
    pub async fn delete(&self, tracking_id: Uuid) -> Result<DeletionConfirmation> {
        let deleted = Delivery::delete(&self.pool, tracking_id).await?;
        if deleted == 0 {
            return Err(CourierError::not_found(tracking_id));
        }

        info!(tracking_id = %tracking_id, "Delivery deleted");
        Ok(DeletionConfirmation {
            tracking_id,
            message: format!("Delivery {tracking_id} deleted successfully"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_status_defaults_to_pending() {
        let json = r#"{
            "order_id": "order123",
            "customer_name": "João Sousa",
            "origin_address": "Rua Exemplo, 123, Lisboa",
            "delivery_address": "Avenida Exemplo, 456, Porto",
            "delivery_date": "2025-03-11T15:00:00Z",
            "estimated_delivery_time": "2025-03-11T15:00:00Z"
        }"#;

        let request: DeliveryRequest = serde_json::from_str(json).unwrap();
        assert!(request.status.is_none());
        assert_eq!(request.status.unwrap_or_default(), DeliveryStatus::Pending);
    }

    #[test]
    fn test_request_status_override() {
        let json = r#"{
            "order_id": "order123",
            "customer_name": "João Sousa",
            "origin_address": "a",
            "delivery_address": "b",
            "delivery_date": "2025-03-11T15:00:00Z",
            "estimated_delivery_time": "2025-03-11T15:00:00Z",
            "status": "in_transit"
        }"#;

        let request: DeliveryRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.status, Some(DeliveryStatus::InTransit));
    }

    #[test]
    fn test_update_payload_timestamp_is_optional() {
        let update: DeliveryUpdate = serde_json::from_str(r#"{"status": "delivered"}"#).unwrap();
        assert_eq!(update.status, DeliveryStatus::Delivered);
        assert!(update.last_updated.is_none());
    }

    #[test]
    fn test_response_mirrors_delivery() {
        let delivery = Delivery {
            tracking_id: Uuid::new_v4(),
            order_id: "order123".to_string(),
            customer_name: "João Sousa".to_string(),
            origin_address: "Rua Exemplo, 123, Lisboa".to_string(),
            delivery_address: "Avenida Exemplo, 456, Porto".to_string(),
            delivery_date: Utc::now(),
            estimated_delivery_time: Utc::now(),
            status: DeliveryStatus::InTransit,
            last_updated: Some(Utc::now()),
            created_at: Utc::now(),
        };

        let response = DeliveryResponse::from(delivery.clone());
        assert_eq!(response.tracking_id, delivery.tracking_id);
        assert_eq!(response.status, DeliveryStatus::InTransit);
        assert_eq!(response.last_updated, delivery.last_updated);
    }
}
