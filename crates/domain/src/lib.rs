//! Domain layer for the order synchronization engine.
//!
//! This crate provides the pure parts of the order lifecycle:
//! - `OrderStatus` and `OrderEventName`, the closed sets of statuses and events
//! - `Order`, the aggregate as persisted by the order store
//! - `IncomingOrderEvent`, the validated payload of one delivery message
//! - The transition policy deciding how an event moves an order's status

pub mod order;

pub use order::{
    IncomingOrderEvent, MAX_UNITS, Money, Order, OrderError, OrderEventData, OrderEventName,
    OrderStatus, ParseStatusError, Sku, TransitionError, TransitionErrorKind, UserId,
    compute_next_status,
};
