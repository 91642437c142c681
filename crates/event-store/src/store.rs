use async_trait::async_trait;

use crate::{EventEnvelope, EventStoreError, OrderId, Result};

/// Core trait for event store implementations.
///
/// All implementations must be thread-safe (Send + Sync) and must make the
/// duplicate check and the insert a single atomic step, so that concurrent
/// writers of the same (aggregate id, event type) pair see exactly one
/// success.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Records an event.
    ///
    /// Fails with `DuplicateEvent` if an event of the same type is already
    /// recorded for the aggregate. Any other failure is retryable.
    async fn append(&self, event: EventEnvelope) -> Result<()>;

    /// Retrieves all events for a specific aggregate, oldest first.
    async fn get_events_for_aggregate(&self, aggregate_id: &OrderId) -> Result<Vec<EventEnvelope>>;

    /// Retrieves all events of one type, oldest first.
    async fn get_events_by_type(&self, event_type: &str) -> Result<Vec<EventEnvelope>>;
}

/// Extension trait providing convenience methods for event stores.
#[async_trait]
pub trait EventStoreExt: EventStore {
    /// Checks whether an event of the given type is recorded for the aggregate.
    async fn has_event(&self, aggregate_id: &OrderId, event_type: &str) -> Result<bool> {
        Ok(self
            .get_events_for_aggregate(aggregate_id)
            .await?
            .iter()
            .any(|e| e.event_type == event_type))
    }
}

// Blanket implementation for all EventStore implementations
impl<T: EventStore + ?Sized> EventStoreExt for T {}

/// Validates an event before appending.
pub fn validate_event_for_append(event: &EventEnvelope) -> Result<()> {
    if event.aggregate_id.is_blank() {
        return Err(EventStoreError::InvalidEvent(
            "aggregate id is required".to_string(),
        ));
    }
    if event.event_type.trim().is_empty() {
        return Err(EventStoreError::InvalidEvent(
            "event type is required".to_string(),
        ));
    }
    Ok(())
}
