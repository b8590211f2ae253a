//! Service layer: the delivery lifecycle manager and the read-only query
//! service consumed by the inbound boundary.

pub mod lifecycle;
pub mod queries;

pub use lifecycle::{
    DeletionConfirmation, DeliveryLifecycleManager, DeliveryRequest, DeliveryResponse,
    DeliveryUpdate, StatusUpdateConfirmation,
};
pub use queries::{DeliveryQueryService, DEFAULT_LIST_LIMIT};
