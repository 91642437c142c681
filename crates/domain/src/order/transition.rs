//! Order status transition policy.
//!
//! Every (status, event) pair has exactly one outcome, stored in a matrix
//! indexed by the enums' ordinals. The array type guarantees each row and
//! column is populated, so totality is a compile-time property.

use thiserror::Error;

use super::{OrderEventName, OrderStatus};

/// Why an event cannot be applied to an order in its current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionErrorKind {
    /// The event contradicts lifecycle facts already recorded.
    Forbidden,

    /// The event duplicates the status the order already reached.
    Redundant,

    /// The event belongs to a lifecycle stage the order has already passed.
    Stale,

    /// The event's prerequisite status has not been reached yet. It may
    /// simply not have been processed, so redelivery can succeed.
    NotReady,
}

impl TransitionErrorKind {
    /// Returns true if redelivering the event may succeed later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransitionErrorKind::NotReady)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionErrorKind::Forbidden => "forbidden",
            TransitionErrorKind::Redundant => "redundant",
            TransitionErrorKind::Stale => "stale",
            TransitionErrorKind::NotReady => "not_ready",
        }
    }
}

impl std::fmt::Display for TransitionErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A rejected transition, classified by cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid transition ({kind}): cannot apply {event} to order in {status} status")]
pub struct TransitionError {
    pub kind: TransitionErrorKind,
    pub status: OrderStatus,
    pub event: OrderEventName,
}

impl TransitionError {
    /// Returns true if redelivering the event may succeed later.
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Advance(OrderStatus),
    Reject(TransitionErrorKind),
}

const FORBIDDEN: Outcome = Outcome::Reject(TransitionErrorKind::Forbidden);
const REDUNDANT: Outcome = Outcome::Reject(TransitionErrorKind::Redundant);
const STALE: Outcome = Outcome::Reject(TransitionErrorKind::Stale);
const NOT_READY: Outcome = Outcome::Reject(TransitionErrorKind::NotReady);

const fn to(status: OrderStatus) -> Outcome {
    Outcome::Advance(status)
}

use OrderStatus::{
    Canceled, Delivered, PaymentAccepted, PaymentRejected, Shipped, StockAllocated, StockDepleted,
};

// Columns: Placed, Created, StockDepleted, StockAllocated, PaymentRejected,
//          PaymentAccepted, Shipped, Delivered, Canceled
#[rustfmt::skip]
const TRANSITIONS: [[Outcome; OrderEventName::COUNT]; OrderStatus::COUNT] = [
    // Created
    [STALE, REDUNDANT, to(StockDepleted), to(StockAllocated), NOT_READY, NOT_READY, NOT_READY, NOT_READY, to(Canceled)],
    // StockDepleted
    [STALE, STALE, REDUNDANT, FORBIDDEN, FORBIDDEN, FORBIDDEN, FORBIDDEN, FORBIDDEN, to(Canceled)],
    // StockAllocated
    [STALE, STALE, FORBIDDEN, REDUNDANT, to(PaymentRejected), to(PaymentAccepted), NOT_READY, NOT_READY, to(Canceled)],
    // PaymentRejected
    [STALE, STALE, FORBIDDEN, STALE, REDUNDANT, FORBIDDEN, FORBIDDEN, FORBIDDEN, to(Canceled)],
    // PaymentAccepted
    [STALE, STALE, FORBIDDEN, STALE, FORBIDDEN, REDUNDANT, to(Shipped), NOT_READY, to(Canceled)],
    // Shipped
    [STALE, STALE, FORBIDDEN, STALE, FORBIDDEN, STALE, REDUNDANT, to(Delivered), to(Canceled)],
    // Delivered
    [STALE, STALE, FORBIDDEN, STALE, FORBIDDEN, STALE, STALE, REDUNDANT, FORBIDDEN],
    // Canceled
    [STALE, STALE, STALE, STALE, STALE, STALE, STALE, STALE, REDUNDANT],
];

/// Computes the status an order moves to when `event` is applied to it.
pub fn compute_next_status(
    status: OrderStatus,
    event: OrderEventName,
) -> Result<OrderStatus, TransitionError> {
    match TRANSITIONS[status.index()][event.index()] {
        Outcome::Advance(next) => Ok(next),
        Outcome::Reject(kind) => Err(TransitionError {
            kind,
            status,
            event,
        }),
    }
}
