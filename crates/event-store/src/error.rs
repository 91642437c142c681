use thiserror::Error;

use crate::OrderId;

/// Errors that can occur when interacting with the event store.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// An event of this type is already recorded for the aggregate.
    #[error("Event {event_type} already recorded for aggregate {aggregate_id}")]
    DuplicateEvent {
        aggregate_id: OrderId,
        event_type: String,
    },

    /// The event is missing its aggregate id or event type.
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    /// The backing store could not be reached.
    #[error("Event store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EventStoreError {
    /// Returns true if this is the "already recorded" outcome of an append.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, EventStoreError::DuplicateEvent { .. })
    }

    /// Returns true if repeating the operation may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            EventStoreError::DuplicateEvent { .. } | EventStoreError::InvalidEvent(_)
        )
    }
}

/// Result type for event store operations.
pub type Result<T> = std::result::Result<T, EventStoreError>;
