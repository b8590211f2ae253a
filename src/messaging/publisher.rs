//! # Geolocation Notification Publisher
//!
//! Delivers [`GeolocationEvent`] snapshots to a durable named queue for
//! asynchronous consumption. The queue transport is an injectable trait so
//! callers can substitute a no-op or recording implementation and be tested
//! without a live broker.
//!
//! The publisher is fire-and-forget from the lifecycle's point of view: a
//! publish failure never rolls back or blocks a store mutation that already
//! committed, and the retry loop holds no resource belonging to any other
//! component while it waits.

use async_trait::async_trait;
use pgmq::PGMQueue;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::errors::MessagingError;
use super::events::GeolocationEvent;
use crate::error::Result;

/// Default queue name for geolocation events
pub const GEOLOCATION_QUEUE: &str = "geolocation";

/// Bounded retry for queue connection and send failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Fixed delay between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(5),
        }
    }
}

/// Transport seam for the geolocation queue
#[async_trait]
pub trait GeolocationQueue: Send + Sync {
    /// Declare the durable queue so messages survive a broker restart
    async fn ensure_queue(&self) -> std::result::Result<(), MessagingError>;

    /// Send one event, returning the broker-assigned message id
    async fn send(&self, event: &GeolocationEvent) -> std::result::Result<i64, MessagingError>;

    /// Queue name this transport sends to
    fn queue_name(&self) -> &str;
}

/// pgmq-backed transport for the geolocation queue
///
/// pgmq queues are Postgres tables, so a declared queue is durable across
/// broker restarts by construction. The transport owns its own connection and
/// shares nothing with the record store pool.
#[derive(Clone)]
pub struct PgmqTransport {
    pgmq: PGMQueue,
    queue_name: String,
}

impl PgmqTransport {
    /// Connect to the broker, retrying per `retry` on connection failure,
    /// and declare the queue before first use.
    pub async fn connect(
        broker_url: &str,
        queue_name: impl Into<String>,
        retry: RetryPolicy,
    ) -> std::result::Result<Self, MessagingError> {
        let queue_name = queue_name.into();
        let mut attempt = 1;

        let pgmq = loop {
            match PGMQueue::new(broker_url.to_string()).await {
                Ok(pgmq) => break pgmq,
                Err(e) if attempt < retry.max_attempts => {
                    warn!(
                        attempt,
                        max_attempts = retry.max_attempts,
                        error = %e,
                        "Waiting for message broker to become reachable"
                    );
                    tokio::time::sleep(retry.delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(MessagingError::retries_exhausted(
                        retry.max_attempts,
                        e.to_string(),
                    ))
                }
            }
        };

        let transport = Self { pgmq, queue_name };
        transport.ensure_queue().await?;

        info!(queue = %transport.queue_name, "Connected to geolocation queue");
        Ok(transport)
    }

    /// Read the next pending message, if any, making it invisible to other
    /// consumers for `visibility_timeout_secs`.
    pub async fn read_next(
        &self,
        visibility_timeout_secs: i32,
    ) -> std::result::Result<Option<pgmq::types::Message<serde_json::Value>>, MessagingError> {
        self.pgmq
            .read::<serde_json::Value>(&self.queue_name, Some(visibility_timeout_secs))
            .await
            .map_err(|e| {
                MessagingError::queue_operation(&self.queue_name, "read", e.to_string())
            })
    }

    /// Acknowledge a message by deleting it from the queue
    pub async fn ack(&self, message_id: i64) -> std::result::Result<(), MessagingError> {
        self.pgmq
            .delete(&self.queue_name, message_id)
            .await
            .map_err(|e| {
                MessagingError::queue_operation(&self.queue_name, "delete", e.to_string())
            })?;

        debug!(message_id, queue = %self.queue_name, "Message acknowledged");
        Ok(())
    }
}

#[async_trait]
impl GeolocationQueue for PgmqTransport {
    async fn ensure_queue(&self) -> std::result::Result<(), MessagingError> {
        debug!(queue = %self.queue_name, "Declaring durable queue");

        self.pgmq.create(&self.queue_name).await.map_err(|e| {
            MessagingError::queue_operation(&self.queue_name, "create", e.to_string())
        })?;

        Ok(())
    }

    async fn send(&self, event: &GeolocationEvent) -> std::result::Result<i64, MessagingError> {
        let payload = serde_json::to_value(event)?;

        let message_id = self
            .pgmq
            .send(&self.queue_name, &payload)
            .await
            .map_err(|e| {
                MessagingError::queue_operation(&self.queue_name, "send", e.to_string())
            })?;

        debug!(message_id, queue = %self.queue_name, "Event sent to queue");
        Ok(message_id)
    }

    fn queue_name(&self) -> &str {
        &self.queue_name
    }
}

/// Transport that discards every event; for wiring the core without a broker
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopQueue;

#[async_trait]
impl GeolocationQueue for NoopQueue {
    async fn ensure_queue(&self) -> std::result::Result<(), MessagingError> {
        Ok(())
    }

    async fn send(&self, _event: &GeolocationEvent) -> std::result::Result<i64, MessagingError> {
        Ok(0)
    }

    fn queue_name(&self) -> &str {
        GEOLOCATION_QUEUE
    }
}

/// Transport that records events in memory, optionally failing the first N
/// sends, for exercising the publisher's retry behavior in tests.
#[derive(Debug, Default)]
pub struct RecordingQueue {
    sent: Mutex<Vec<GeolocationEvent>>,
    failures_remaining: Mutex<u32>,
}

impl RecordingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the first `n` sends with a connection error, then succeed
    pub fn failing_first(n: u32) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failures_remaining: Mutex::new(n),
        }
    }

    /// Events successfully sent so far
    pub fn sent(&self) -> Vec<GeolocationEvent> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl GeolocationQueue for RecordingQueue {
    async fn ensure_queue(&self) -> std::result::Result<(), MessagingError> {
        Ok(())
    }

    async fn send(&self, event: &GeolocationEvent) -> std::result::Result<i64, MessagingError> {
        {
            let mut remaining = self
                .failures_remaining
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            if *remaining > 0 {
                *remaining -= 1;
                return Err(MessagingError::connection("simulated broker outage"));
            }
        }

        let mut sent = self.sent.lock().unwrap_or_else(|e| e.into_inner());
        sent.push(event.clone());
        Ok(sent.len() as i64)
    }

    fn queue_name(&self) -> &str {
        GEOLOCATION_QUEUE
    }
}

/// Publishes geolocation events with bounded retry on transport failure
#[derive(Clone)]
pub struct NotificationPublisher {
    queue: Arc<dyn GeolocationQueue>,
    retry: RetryPolicy,
}

impl NotificationPublisher {
    /// Create a publisher over an injected queue transport
    pub fn new(queue: Arc<dyn GeolocationQueue>, retry: RetryPolicy) -> Self {
        Self { queue, retry }
    }

    /// Publish one event, retrying transport failures up to the policy bound
    /// with a fixed delay between attempts. Succeeds with the broker message
    /// id, or fails with `Publish` once every attempt is spent. No partial
    /// message is ever delivered: each attempt either lands the whole payload
    /// or nothing.
    pub async fn publish(&self, event: &GeolocationEvent) -> Result<i64> {
        let queue_name = self.queue.queue_name().to_string();
        let mut last_error = None;

        for attempt in 1..=self.retry.max_attempts {
            match self.queue.send(event).await {
                Ok(message_id) => {
                    info!(message_id, queue = %queue_name, attempt, "Geolocation event published");
                    return Ok(message_id);
                }
                Err(e) if !e.is_retryable() => return Err(e.into()),
                Err(e) => {
                    warn!(
                        queue = %queue_name,
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        error = %e,
                        "Publish attempt failed"
                    );
                    last_error = Some(e);
                    if attempt < self.retry.max_attempts {
                        tokio::time::sleep(self.retry.delay).await;
                    }
                }
            }
        }

        let message = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempts were made".to_string());
        Err(MessagingError::retries_exhausted(self.retry.max_attempts, message).into())
    }

    /// Queue name events are published to
    pub fn queue_name(&self) -> &str {
        self.queue.queue_name()
    }
}
