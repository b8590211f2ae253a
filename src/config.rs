//! # Configuration
//!
//! Environment-driven configuration for the store connection and the
//! notification queue. Connection handles are constructed from this at
//! process start and injected into the components that need them; nothing in
//! the crate reads the environment after startup.

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

use crate::error::{CourierError, Result};
use crate::messaging::{RetryPolicy, GEOLOCATION_QUEUE};

/// Root configuration for the delivery tracking core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourierConfig {
    pub database: DatabaseConfig,
    pub messaging: MessagingConfig,
}

/// Record store connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection URI
    pub url: String,
    /// Maximum pool connections
    pub max_connections: u32,
}

/// Notification queue settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingConfig {
    /// Broker connection URI; falls back to the database URI when unset
    pub broker_url: String,
    /// Durable queue name for geolocation events
    pub queue_name: String,
    /// Publish attempts before giving up, including the first
    pub publish_max_attempts: u32,
    /// Fixed delay between publish attempts, in seconds
    pub publish_retry_delay_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost:5432/tracking_db".to_string(),
            max_connections: 10,
        }
    }
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            broker_url: DatabaseConfig::default().url,
            queue_name: GEOLOCATION_QUEUE.to_string(),
            publish_max_attempts: 5,
            publish_retry_delay_secs: 5,
        }
    }
}

impl Default for CourierConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            messaging: MessagingConfig::default(),
        }
    }
}

impl CourierConfig {
    /// Load configuration from environment variables, validating the result.
    ///
    /// Recognized variables: `DATABASE_URL`, `DATABASE_MAX_CONNECTIONS`,
    /// `BROKER_URL` (defaults to `DATABASE_URL`), `GEOLOCATION_QUEUE`,
    /// `PUBLISH_MAX_ATTEMPTS`, `PUBLISH_RETRY_DELAY_SECS`.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| defaults.database.url.clone());
        let max_connections = parse_env("DATABASE_MAX_CONNECTIONS")?
            .unwrap_or(defaults.database.max_connections);

        let broker_url = std::env::var("BROKER_URL").unwrap_or_else(|_| database_url.clone());
        let queue_name = std::env::var("GEOLOCATION_QUEUE")
            .unwrap_or_else(|_| defaults.messaging.queue_name.clone());
        let publish_max_attempts =
            parse_env("PUBLISH_MAX_ATTEMPTS")?.unwrap_or(defaults.messaging.publish_max_attempts);
        let publish_retry_delay_secs = parse_env("PUBLISH_RETRY_DELAY_SECS")?
            .unwrap_or(defaults.messaging.publish_retry_delay_secs);

        let config = Self {
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            messaging: MessagingConfig {
                broker_url,
                queue_name,
                publish_max_attempts,
                publish_retry_delay_secs,
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Explicit validation: no silent fallbacks past this point
    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            return Err(CourierError::configuration(
                "database",
                "connection URL must not be empty",
            ));
        }
        if self.database.max_connections == 0 {
            return Err(CourierError::configuration(
                "database",
                "max_connections must be at least 1",
            ));
        }
        if self.messaging.queue_name.trim().is_empty() {
            return Err(CourierError::configuration(
                "messaging",
                "queue name must not be empty",
            ));
        }
        if self.messaging.publish_max_attempts == 0 {
            return Err(CourierError::configuration(
                "messaging",
                "publish_max_attempts must be at least 1",
            ));
        }
        Ok(())
    }

    /// Record store connection URI
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// Retry policy for the notification publisher
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.messaging.publish_max_attempts,
            delay: Duration::from_secs(self.messaging.publish_retry_delay_secs),
        }
    }
}

impl DatabaseConfig {
    /// Build the record store pool this configuration describes
    pub async fn connect(&self) -> Result<PgPool> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .connect(&self.url)
            .await
            .map_err(|e| CourierError::store("connect", e))
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw.parse().map(Some).map_err(|_| {
            CourierError::configuration(name, format!("could not parse value: {raw}"))
        }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = CourierConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.messaging.queue_name, GEOLOCATION_QUEUE);
        assert_eq!(config.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn test_validation_rejects_empty_url() {
        let mut config = CourierConfig::default();
        config.database.url = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(CourierError::Configuration { .. })
        ));
    }

    #[test]
    fn test_validation_rejects_zero_attempts() {
        let mut config = CourierConfig::default();
        config.messaging.publish_max_attempts = 0;
        assert!(config.validate().is_err());
    }
}
