//! Synchronization error types.

use common::OrderId;
use domain::{OrderError, OrderEventName, TransitionError};
use event_store::EventStoreError;
use order_store::OrderStoreError;
use thiserror::Error;

/// Errors that can occur while synchronizing one order event.
///
/// Every variant knows whether redelivering the event may succeed; the batch
/// controller decides redelivery from [`SyncError::is_retryable`] alone.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The event is structurally malformed.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] OrderError),

    /// A non-`Placed` event references an order that was never placed.
    #[error("Invalid operation: {event_name} event for order {order_id}, which does not exist")]
    InvalidOperation {
        order_id: OrderId,
        event_name: OrderEventName,
    },

    /// The transition policy rejected the event.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// An order store failure.
    #[error("Order store failure: {0}")]
    OrderStore(#[from] OrderStoreError),

    /// An event store failure.
    #[error("Event store failure: {0}")]
    EventStore(#[from] EventStoreError),
}

impl SyncError {
    /// Returns true if redelivering the event may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::InvalidInput(_) | SyncError::InvalidOperation { .. } => false,
            SyncError::Transition(err) => err.is_retryable(),
            SyncError::OrderStore(err) => err.is_retryable(),
            SyncError::EventStore(err) => err.is_retryable(),
        }
    }

    /// Short label identifying the error class, for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::InvalidInput(_) => "invalid_input",
            SyncError::InvalidOperation { .. } => "invalid_operation",
            SyncError::Transition(err) => err.kind.as_str(),
            SyncError::OrderStore(OrderStoreError::CorruptRecord { .. }) => "corrupt_record",
            SyncError::EventStore(EventStoreError::InvalidEvent(_)) => "invalid_event",
            SyncError::OrderStore(_) | SyncError::EventStore(_) => "unrecognized",
        }
    }
}

/// Convenience type alias for synchronization results.
pub type Result<T> = std::result::Result<T, SyncError>;
