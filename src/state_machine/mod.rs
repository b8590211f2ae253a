//! # Delivery State Machine
//!
//! Status definitions and transition validation for the delivery lifecycle.
//!
//! Transition legality is an explicit policy choice rather than an implicit
//! property of the update path: [`TransitionPolicy::Permissive`] reproduces
//! the historical behavior (any status may overwrite any other), while
//! [`TransitionPolicy::ForwardOnly`] enforces a strict forward ordering with
//! cancellation from any non-terminal status.

pub mod states;

pub use states::DeliveryStatus;

use crate::error::{CourierError, Result};

/// Policy governing which status transitions `update_status` accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// Any status may transition to any other status
    #[default]
    Permissive,
    /// pending → in_transit → delivered, cancellation from any
    /// non-terminal status, no transitions out of terminal statuses
    ForwardOnly,
}

impl TransitionPolicy {
    /// Validate a transition, returning `InvalidTransition` on rejection.
    ///
    /// Re-applying the current status is legal under both policies so that
    /// repeated updates stay idempotent.
    pub fn validate(&self, from: DeliveryStatus, to: DeliveryStatus) -> Result<()> {
        if from == to {
            return Ok(());
        }

        let allowed = match self {
            Self::Permissive => true,
            Self::ForwardOnly => match (from, to) {
                (DeliveryStatus::Pending, DeliveryStatus::InTransit) => true,
                (DeliveryStatus::Pending, DeliveryStatus::Delivered) => true,
                (DeliveryStatus::InTransit, DeliveryStatus::Delivered) => true,
                (from, DeliveryStatus::Canceled) => !from.is_terminal(),
                _ => false,
            },
        };

        if allowed {
            Ok(())
        } else {
            Err(CourierError::InvalidTransition { from, to })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permissive_allows_everything() {
        let policy = TransitionPolicy::Permissive;
        let all = [
            DeliveryStatus::Pending,
            DeliveryStatus::InTransit,
            DeliveryStatus::Delivered,
            DeliveryStatus::Canceled,
        ];
        for from in all {
            for to in all {
                assert!(policy.validate(from, to).is_ok(), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_forward_only_permits_forward_movement() {
        let policy = TransitionPolicy::ForwardOnly;

        assert!(policy
            .validate(DeliveryStatus::Pending, DeliveryStatus::InTransit)
            .is_ok());
        assert!(policy
            .validate(DeliveryStatus::InTransit, DeliveryStatus::Delivered)
            .is_ok());
        assert!(policy
            .validate(DeliveryStatus::Pending, DeliveryStatus::Canceled)
            .is_ok());
        assert!(policy
            .validate(DeliveryStatus::InTransit, DeliveryStatus::Canceled)
            .is_ok());
    }

    #[test]
    fn test_forward_only_rejects_backward_movement() {
        let policy = TransitionPolicy::ForwardOnly;

        let rejected = policy.validate(DeliveryStatus::Delivered, DeliveryStatus::Pending);
        assert!(matches!(
            rejected,
            Err(CourierError::InvalidTransition {
                from: DeliveryStatus::Delivered,
                to: DeliveryStatus::Pending,
            })
        ));

        assert!(policy
            .validate(DeliveryStatus::InTransit, DeliveryStatus::Pending)
            .is_err());
        assert!(policy
            .validate(DeliveryStatus::Canceled, DeliveryStatus::InTransit)
            .is_err());
        assert!(policy
            .validate(DeliveryStatus::Delivered, DeliveryStatus::Canceled)
            .is_err());
    }

    #[test]
    fn test_same_status_is_idempotent_under_both_policies() {
        for policy in [TransitionPolicy::Permissive, TransitionPolicy::ForwardOnly] {
            assert!(policy
                .validate(DeliveryStatus::Delivered, DeliveryStatus::Delivered)
                .is_ok());
        }
    }
}
