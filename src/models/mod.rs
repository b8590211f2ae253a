//! Data layer: the delivery record and its store adapter.

pub mod delivery;

pub use delivery::{Delivery, NewDelivery, CUSTOMER_LIST_CAP};
