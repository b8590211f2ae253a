//! # Messaging Module
//!
//! PostgreSQL message queue (pgmq) based delivery of geolocation events.
//! The publisher side lives here; the companion consumer process is
//! `src/bin/geolocation_consumer.rs`.

pub mod errors;
pub mod events;
pub mod publisher;

pub use errors::MessagingError;
pub use events::GeolocationEvent;
pub use publisher::{
    GeolocationQueue, NoopQueue, NotificationPublisher, PgmqTransport, RecordingQueue,
    RetryPolicy, GEOLOCATION_QUEUE,
};
