//! # Structured Error Handling
//!
//! Crate-wide error taxonomy. Store and queue failures carry the failing
//! operation so callers can log something actionable; `NotFound` is the only
//! client-visible variant and is never retried.

use crate::messaging::errors::MessagingError;
use crate::state_machine::DeliveryStatus;
use thiserror::Error;

/// Errors surfaced by the delivery tracking core
#[derive(Error, Debug)]
pub enum CourierError {
    #[error("Delivery not found: {tracking_id}")]
    NotFound { tracking_id: String },

    #[error("Record store failure: {operation}: {message}")]
    Store { operation: String, message: String },

    #[error("Notification publish failed: {0}")]
    Publish(#[from] MessagingError),

    #[error("Validation failure: {message}")]
    Validation { message: String },

    #[error("Illegal status transition: {from} -> {to}")]
    InvalidTransition {
        from: DeliveryStatus,
        to: DeliveryStatus,
    },

    #[error("Configuration error: {component}: {message}")]
    Configuration { component: String, message: String },
}

impl CourierError {
    /// Create a not-found error for a tracking id
    pub fn not_found(tracking_id: impl ToString) -> Self {
        Self::NotFound {
            tracking_id: tracking_id.to_string(),
        }
    }

    /// Create a record store error for a failed operation
    pub fn store(operation: impl Into<String>, message: impl ToString) -> Self {
        Self::Store {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Whether this error maps to a client-visible 404 at the boundary
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, CourierError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_formats() {
        let err = CourierError::not_found("track123");
        assert_eq!(err.to_string(), "Delivery not found: track123");
        assert!(err.is_not_found());

        let err = CourierError::store("insert", "connection refused");
        assert_eq!(
            err.to_string(),
            "Record store failure: insert: connection refused"
        );
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_messaging_error_converts_to_publish() {
        let err: CourierError = MessagingError::connection("broker down").into();
        assert!(matches!(err, CourierError::Publish(_)));
    }
}
