use serde::{Deserialize, Serialize};
use std::fmt;

/// Delivery status definitions
///
/// This is the only representation of delivery status in the crate. Status
/// strings coming from the store or from callers are parsed into this enum at
/// the boundary, so no other value is representable past that point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Initial status when a delivery is created
    Pending,
    /// Delivery is on its way to the destination
    InTransit,
    /// Delivery reached the destination
    Delivered,
    /// Delivery was canceled
    Canceled,
}

impl DeliveryStatus {
    /// Check if this is a terminal status (the delivery run is over)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Canceled)
    }

    /// Check if this is an active status (delivery currently moving)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::InTransit)
    }
}

impl Default for DeliveryStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InTransit => write!(f, "in_transit"),
            Self::Delivered => write!(f, "delivered"),
            Self::Canceled => write!(f, "canceled"),
        }
    }
}

impl std::str::FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_transit" => Ok(Self::InTransit),
            "delivered" => Ok(Self::Delivered),
            "canceled" => Ok(Self::Canceled),
            _ => Err(format!("Invalid delivery status: {s}")),
        }
    }
}
