//! Geolocation event payload handed to the notification queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of a geolocation reading.
///
/// Ephemeral: the event has no identity beyond its enqueue occurrence and is
/// never persisted by this core. Every field is optional because the upstream
/// lookup may return partial data or an error marker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeolocationEvent {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub ip: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl GeolocationEvent {
    /// Stamp the event with the current UTC time if the lookup supplied none
    pub fn with_timestamp_now(mut self) -> Self {
        if self.timestamp.is_none() {
            self.timestamp = Some(Utc::now());
        }
        self
    }
}
