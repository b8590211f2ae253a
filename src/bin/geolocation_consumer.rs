//! Companion consumer for the geolocation queue.
//!
//! Subscribes to the durable queue, logs each payload, and acknowledges every
//! message immediately on receipt. Acknowledge-before-processing means a
//! crash between receipt and processing drops the message; that at-most-once
//! trade-off is intentional for this subsystem.

use anyhow::Context;
use tokio::time::Duration;
use tracing::{error, info};

use courier_core::config::CourierConfig;
use courier_core::messaging::PgmqTransport;

const READ_VISIBILITY_TIMEOUT_SECS: i32 = 30;
const IDLE_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    courier_core::logging::init_structured_logging();

    let config = CourierConfig::from_env().context("loading configuration")?;
    let transport = PgmqTransport::connect(
        &config.messaging.broker_url,
        config.messaging.queue_name.clone(),
        config.retry_policy(),
    )
    .await
    .context("connecting to geolocation queue")?;

    info!(queue = %config.messaging.queue_name, "Waiting for messages");

    loop {
        match transport.read_next(READ_VISIBILITY_TIMEOUT_SECS).await {
            Ok(Some(message)) => {
                // Ack first, then process: messages never redeliver. A failed
                // ack leaves the message to reappear after its visibility
                // timeout; the loop keeps running either way.
                if let Err(e) = transport.ack(message.msg_id).await {
                    error!(
                        message_id = message.msg_id,
                        error = %e,
                        "Failed to acknowledge message, continuing"
                    );
                    continue;
                }

                info!(
                    message_id = message.msg_id,
                    payload = %message.message,
                    "Received message"
                );
            }
            Ok(None) => tokio::time::sleep(IDLE_POLL_INTERVAL).await,
            Err(e) => {
                error!(error = %e, "Failed to read from queue, retrying");
                tokio::time::sleep(IDLE_POLL_INTERVAL).await;
            }
        }
    }
}
