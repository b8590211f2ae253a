//! # Delivery Model
//!
//! The delivery record and its store adapter. Each operation is a single
//! atomic statement against the `deliveries` table; there are no transactions
//! and no cross-record consistency guarantees. Concurrent updates to the same
//! tracking id are last-write-wins by arrival order.
//!
//! ## Schema
//!
//! ```sql
//! CREATE TABLE deliveries (
//!   tracking_id UUID PRIMARY KEY,
//!   order_id VARCHAR NOT NULL,
//!   customer_name VARCHAR NOT NULL,
//!   origin_address VARCHAR NOT NULL,
//!   delivery_address VARCHAR NOT NULL,
//!   delivery_date TIMESTAMPTZ NOT NULL,
//!   estimated_delivery_time TIMESTAMPTZ NOT NULL,
//!   status TEXT NOT NULL,
//!   last_updated TIMESTAMPTZ,
//!   created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! `status` is stored as TEXT and parsed into [`DeliveryStatus`] at the row
//! boundary; a row carrying an unknown status string surfaces as a store
//! failure instead of leaking a free-text status into the crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{CourierError, Result};
use crate::state_machine::DeliveryStatus;

/// Cap on per-customer listings
pub const CUSTOMER_LIST_CAP: i64 = 100;

const DELIVERY_COLUMNS: &str = "tracking_id, order_id, customer_name, origin_address, \
     delivery_address, delivery_date, estimated_delivery_time, status, last_updated, created_at";

/// A delivery record as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub tracking_id: Uuid,
    pub order_id: String,
    pub customer_name: String,
    pub origin_address: String,
    pub delivery_address: String,
    pub delivery_date: DateTime<Utc>,
    pub estimated_delivery_time: DateTime<Utc>,
    pub status: DeliveryStatus,
    pub last_updated: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// New delivery for insertion (tracking id already assigned by the caller)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDelivery {
    pub tracking_id: Uuid,
    pub order_id: String,
    pub customer_name: String,
    pub origin_address: String,
    pub delivery_address: String,
    pub delivery_date: DateTime<Utc>,
    pub estimated_delivery_time: DateTime<Utc>,
    pub status: DeliveryStatus,
}

/// Raw row with status as text, parsed into [`Delivery`] at the boundary
#[derive(Debug, FromRow)]
struct DeliveryRow {
    tracking_id: Uuid,
    order_id: String,
    customer_name: String,
    origin_address: String,
    delivery_address: String,
    delivery_date: DateTime<Utc>,
    estimated_delivery_time: DateTime<Utc>,
    status: String,
    last_updated: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<DeliveryRow> for Delivery {
    type Error = CourierError;

    fn try_from(row: DeliveryRow) -> Result<Delivery> {
        let status = row
            .status
            .parse()
            .map_err(|_| CourierError::store("row", format!("Invalid status in store: {}", row.status)))?;

        Ok(Delivery {
            tracking_id: row.tracking_id,
            order_id: row.order_id,
            customer_name: row.customer_name,
            origin_address: row.origin_address,
            delivery_address: row.delivery_address,
            delivery_date: row.delivery_date,
            estimated_delivery_time: row.estimated_delivery_time,
            status,
            last_updated: row.last_updated,
            created_at: row.created_at,
        })
    }
}

impl Delivery {
    /// Insert a new delivery record
    pub async fn create(pool: &PgPool, new_delivery: NewDelivery) -> Result<Delivery> {
        let row = sqlx::query_as::<_, DeliveryRow>(
            "INSERT INTO deliveries (
                tracking_id, order_id, customer_name, origin_address,
                delivery_address, delivery_date, estimated_delivery_time, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING tracking_id, order_id, customer_name, origin_address,
                      delivery_address, delivery_date, estimated_delivery_time,
                      status, last_updated, created_at",
        )
        .bind(new_delivery.tracking_id)
        .bind(&new_delivery.order_id)
        .bind(&new_delivery.customer_name)
        .bind(&new_delivery.origin_address)
        .bind(&new_delivery.delivery_address)
        .bind(new_delivery.delivery_date)
        .bind(new_delivery.estimated_delivery_time)
        .bind(new_delivery.status.to_string())
        .fetch_one(pool)
        .await
        .map_err(|e| CourierError::store("insert", e))?;

        row.try_into()
    }

    /// Find a delivery by tracking id
    pub async fn find_by_tracking_id(pool: &PgPool, tracking_id: Uuid) -> Result<Option<Delivery>> {
        let row = sqlx::query_as::<_, DeliveryRow>(&format!(
            "SELECT {DELIVERY_COLUMNS} FROM deliveries WHERE tracking_id = $1"
        ))
        .bind(tracking_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| CourierError::store("find_by_tracking_id", e))?;

        row.map(Delivery::try_from).transpose()
    }

    /// Atomically set `status` and `last_updated` for the matching record.
    ///
    /// Returns the number of matched rows; 0 means the tracking id does not
    /// exist and the caller reports `NotFound`. A same-status re-update still
    /// counts as matched, so repeated updates stay idempotent.
    pub async fn update_status(
        pool: &PgPool,
        tracking_id: Uuid,
        status: DeliveryStatus,
        timestamp: DateTime<Utc>,
    ) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE deliveries SET status = $2, last_updated = $3 WHERE tracking_id = $1",
        )
        .bind(tracking_id)
        .bind(status.to_string())
        .bind(timestamp)
        .execute(pool)
        .await
        .map_err(|e| CourierError::store("update_status", e))?;

        Ok(result.rows_affected())
    }

    /// Remove a delivery record, returning the deleted count (0 ⇒ NotFound)
    pub async fn delete(pool: &PgPool, tracking_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM deliveries WHERE tracking_id = $1")
            .bind(tracking_id)
            .execute(pool)
            .await
            .map_err(|e| CourierError::store("delete", e))?;

        Ok(result.rows_affected())
    }

    /// List deliveries with an optional status filter, in insertion order,
    /// skipping `offset` rows and returning at most `limit`.
    pub async fn list(
        pool: &PgPool,
        status: Option<DeliveryStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Delivery>> {
        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, DeliveryRow>(&format!(
                    "SELECT {DELIVERY_COLUMNS} FROM deliveries
                     WHERE status = $1
                     ORDER BY created_at ASC
                     LIMIT $2 OFFSET $3"
                ))
                .bind(status.to_string())
                .bind(limit)
                .bind(offset)
                .fetch_all(pool)
                .await
            }
            None => {
                sqlx::query_as::<_, DeliveryRow>(&format!(
                    "SELECT {DELIVERY_COLUMNS} FROM deliveries
                     ORDER BY created_at ASC
                     LIMIT $1 OFFSET $2"
                ))
                .bind(limit)
                .bind(offset)
                .fetch_all(pool)
                .await
            }
        }
        .map_err(|e| CourierError::store("list", e))?;

        rows.into_iter().map(Delivery::try_from).collect()
    }

    /// Every delivery for a customer, in insertion order, capped at
    /// [`CUSTOMER_LIST_CAP`] rows.
    pub async fn list_by_customer(pool: &PgPool, customer_name: &str) -> Result<Vec<Delivery>> {
        let rows = sqlx::query_as::<_, DeliveryRow>(&format!(
            "SELECT {DELIVERY_COLUMNS} FROM deliveries
             WHERE customer_name = $1
             ORDER BY created_at ASC
             LIMIT $2"
        ))
        .bind(customer_name)
        .bind(CUSTOMER_LIST_CAP)
        .fetch_all(pool)
        .await
        .map_err(|e| CourierError::store("list_by_customer", e))?;

        rows.into_iter().map(Delivery::try_from).collect()
    }

    /// The most recently updated in-transit delivery for a customer, if any.
    /// Ties break by the latest `last_updated`.
    pub async fn find_active_by_customer(
        pool: &PgPool,
        customer_name: &str,
    ) -> Result<Option<Delivery>> {
        let row = sqlx::query_as::<_, DeliveryRow>(&format!(
            "SELECT {DELIVERY_COLUMNS} FROM deliveries
             WHERE customer_name = $1 AND status = $2
             ORDER BY last_updated DESC NULLS LAST
             LIMIT 1"
        ))
        .bind(customer_name)
        .bind(DeliveryStatus::InTransit.to_string())
        .fetch_optional(pool)
        .await
        .map_err(|e| CourierError::store("find_active_by_customer", e))?;

        row.map(Delivery::try_from).transpose()
    }

    /// Verify the record store is reachable
    pub async fn ping(pool: &PgPool) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(pool)
            .await
            .map_err(|e| CourierError::store("ping", e))?;

        Ok(())
    }
}
