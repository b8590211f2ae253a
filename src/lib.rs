#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Courier Core
//!
//! Delivery lifecycle tracking core: a status state machine over delivery
//! records, a query/filter/pagination contract over the record store, and an
//! at-least-once publish protocol for geolocation events over a durable
//! queue with bounded connection retry.
//!
//! ## Module Organization
//!
//! - [`models`] - Delivery record and its store adapter (single-statement
//!   atomic operations over Postgres)
//! - [`state_machine`] - Closed delivery status enum and transition policy
//! - [`services`] - Lifecycle manager and read-only query service
//! - [`messaging`] - Geolocation event payload, durable queue transport, and
//!   the retrying notification publisher
//! - [`config`] - Environment-driven configuration
//! - [`error`] - Structured error handling
//! - [`logging`] - Tracing bootstrap
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use courier_core::config::CourierConfig;
//! use courier_core::services::{DeliveryLifecycleManager, DeliveryQueryService};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CourierConfig::from_env()?;
//! let pool = config.database.connect().await?;
//!
//! let lifecycle = DeliveryLifecycleManager::new(pool.clone());
//! let queries = DeliveryQueryService::new(pool);
//!
//! let page = queries.list(None, None, None).await?;
//! println!("{} deliveries", page.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Delivery Semantics
//!
//! The store and the queue are not transactionally linked: a committed status
//! update is never rolled back by a later publish failure, and the consumer
//! acknowledges messages before processing them (an accepted at-most-once
//! trade-off on the consumer side).

pub mod config;
pub mod error;
pub mod logging;
pub mod messaging;
pub mod models;
pub mod services;
pub mod state_machine;

pub use config::{CourierConfig, DatabaseConfig, MessagingConfig};
pub use error::{CourierError, Result};
pub use messaging::{
    GeolocationEvent, GeolocationQueue, MessagingError, NoopQueue, NotificationPublisher,
    PgmqTransport, RecordingQueue, RetryPolicy,
};
pub use models::{Delivery, NewDelivery};
pub use services::{
    DeletionConfirmation, DeliveryLifecycleManager, DeliveryQueryService, DeliveryRequest,
    DeliveryResponse, DeliveryUpdate, StatusUpdateConfirmation,
};
pub use state_machine::{DeliveryStatus, TransitionPolicy};
