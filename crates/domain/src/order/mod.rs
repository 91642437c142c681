//! Order aggregate and related types.

mod aggregate;
mod events;
mod state;
mod transition;
mod value_objects;

pub use aggregate::Order;
pub use events::{IncomingOrderEvent, MAX_UNITS, OrderEventData, OrderEventName};
pub use state::{OrderStatus, ParseStatusError};
pub use transition::{TransitionError, TransitionErrorKind, compute_next_status};
pub use value_objects::{Money, Sku, UserId};

use thiserror::Error;

/// Reasons an incoming order event is structurally invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// The event carries no order identifier.
    #[error("Order ID is required")]
    OrderIdRequired,

    /// The event carries no SKU.
    #[error("SKU is required")]
    SkuRequired,

    /// The event carries no user identifier.
    #[error("User ID is required")]
    UserIdRequired,

    /// Units must be strictly positive and fit a signed 32-bit column.
    #[error("Invalid units: {units} (must be between 1 and {max})", max = MAX_UNITS)]
    InvalidUnits { units: u32 },

    /// Price must not be negative.
    #[error("Invalid price: {price} (must not be negative)")]
    InvalidPrice { price: i64 },

    /// Text fields must not contain NUL, which no text column accepts.
    #[error("{field} contains a NUL character")]
    NulCharacter { field: &'static str },
}
