//! Order status state machine.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The status of an order in its lifecycle.
///
/// Forward path, with cancellation possible from every non-terminal status:
/// ```text
/// Created ──┬──► StockAllocated ──┬──► PaymentAccepted ──► Shipped ──► Delivered
///           │                     │
///           └──► StockDepleted    └──► PaymentRejected
///
/// (any non-terminal) ──► Canceled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// The order was placed and persisted.
    Created,

    /// Stock could not be allocated for the order.
    StockDepleted,

    /// Stock was allocated, awaiting payment.
    StockAllocated,

    /// Payment was rejected.
    PaymentRejected,

    /// Payment was accepted, awaiting shipment.
    PaymentAccepted,

    /// The order left the warehouse.
    Shipped,

    /// The order reached the customer (terminal state).
    Delivered,

    /// The order was canceled (terminal state).
    Canceled,
}

impl OrderStatus {
    /// Number of statuses.
    pub const COUNT: usize = 8;

    /// Every status, in declaration order.
    pub const ALL: [OrderStatus; Self::COUNT] = [
        OrderStatus::Created,
        OrderStatus::StockDepleted,
        OrderStatus::StockAllocated,
        OrderStatus::PaymentRejected,
        OrderStatus::PaymentAccepted,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Canceled,
    ];

    /// Row of this status in the transition table.
    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    /// Returns true if this is a terminal status (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Canceled)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "Created",
            OrderStatus::StockDepleted => "StockDepleted",
            OrderStatus::StockAllocated => "StockAllocated",
            OrderStatus::PaymentRejected => "PaymentRejected",
            OrderStatus::PaymentAccepted => "PaymentAccepted",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Canceled => "Canceled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returned when a stored status string names no known status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown order status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for OrderStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}
