use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    EventEnvelope, EventStoreError, OrderId, Result,
    store::{EventStore, validate_event_for_append},
};

#[derive(Debug, Default)]
struct InMemoryState {
    events: Vec<EventEnvelope>,
    unavailable: bool,
}

/// In-memory event store implementation for testing and local runs.
///
/// Provides the same idempotency guarantee as the PostgreSQL implementation:
/// the duplicate check and the insert happen under one write lock.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventStore {
    state: Arc<RwLock<InMemoryState>>,
}

impl InMemoryEventStore {
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events stored.
    pub async fn event_count(&self) -> usize {
        self.state.read().await.events.len()
    }

    /// Makes every subsequent operation fail with a retryable error until reset.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    /// Clears all events.
    pub async fn clear(&self) {
        self.state.write().await.events.clear();
    }
}

fn unavailable() -> EventStoreError {
    EventStoreError::Unavailable("in-memory event store marked unavailable".to_string())
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    #[tracing::instrument(skip(self, event), fields(aggregate_id = %event.aggregate_id, event_type = %event.event_type))]
    async fn append(&self, event: EventEnvelope) -> Result<()> {
        validate_event_for_append(&event)?;

        let mut state = self.state.write().await;
        if state.unavailable {
            return Err(unavailable());
        }

        let exists = state
            .events
            .iter()
            .any(|e| e.aggregate_id == event.aggregate_id && e.event_type == event.event_type);
        if exists {
            tracing::debug!("event already recorded");
            return Err(EventStoreError::DuplicateEvent {
                aggregate_id: event.aggregate_id,
                event_type: event.event_type,
            });
        }

        state.events.push(event);
        metrics::counter!("event_store_appends_total").increment(1);
        Ok(())
    }

    async fn get_events_for_aggregate(&self, aggregate_id: &OrderId) -> Result<Vec<EventEnvelope>> {
        let state = self.state.read().await;
        if state.unavailable {
            return Err(unavailable());
        }
        let mut events: Vec<_> = state
            .events
            .iter()
            .filter(|e| &e.aggregate_id == aggregate_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.timestamp);
        Ok(events)
    }

    async fn get_events_by_type(&self, event_type: &str) -> Result<Vec<EventEnvelope>> {
        let state = self.state.read().await;
        if state.unavailable {
            return Err(unavailable());
        }
        let mut events: Vec<_> = state
            .events
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.timestamp);
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::EventStoreExt;

    fn create_test_event(aggregate_id: &str, event_type: &str) -> EventEnvelope {
        EventEnvelope::new(
            event_type,
            OrderId::new(aggregate_id),
            serde_json::json!({"test": true}),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn append_single_event() {
        let store = InMemoryEventStore::new();

        store
            .append(create_test_event("order-1", "Created"))
            .await
            .unwrap();

        let events = store
            .get_events_for_aggregate(&OrderId::new("order-1"))
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "Created");
    }

    #[tokio::test]
    async fn second_append_of_same_pair_is_duplicate() {
        let store = InMemoryEventStore::new();

        store
            .append(create_test_event("order-1", "Created"))
            .await
            .unwrap();
        let result = store.append(create_test_event("order-1", "Created")).await;

        assert!(matches!(
            result,
            Err(EventStoreError::DuplicateEvent { ref event_type, .. }) if event_type == "Created"
        ));
        assert_eq!(store.event_count().await, 1);
    }

    #[tokio::test]
    async fn same_type_on_other_aggregate_is_accepted() {
        let store = InMemoryEventStore::new();

        store
            .append(create_test_event("order-1", "Created"))
            .await
            .unwrap();
        store
            .append(create_test_event("order-2", "Created"))
            .await
            .unwrap();

        assert_eq!(store.event_count().await, 2);
    }

    #[tokio::test]
    async fn concurrent_appends_record_once() {
        let store = InMemoryEventStore::new();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.append(create_test_event("order-1", "Created")).await })
            })
            .collect();

        let mut successes = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => successes += 1,
                Err(e) if e.is_duplicate() => duplicates += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(duplicates, 7);
        assert_eq!(store.event_count().await, 1);
    }

    #[tokio::test]
    async fn unavailable_store_fails_retryably() {
        let store = InMemoryEventStore::new();
        store.set_unavailable(true).await;

        let err = store
            .append(create_test_event("order-1", "Created"))
            .await
            .unwrap_err();
        assert!(err.is_retryable());

        store.set_unavailable(false).await;
        assert!(store.append(create_test_event("order-1", "Created")).await.is_ok());
    }

    #[tokio::test]
    async fn get_events_by_type_sorted_by_timestamp() {
        let store = InMemoryEventStore::new();
        let now = Utc::now();

        let later = EventEnvelope::new(
            "Created",
            OrderId::new("order-2"),
            serde_json::json!({}),
            now + Duration::seconds(5),
        );
        let earlier = EventEnvelope::new("Created", OrderId::new("order-1"), serde_json::json!({}), now);

        store.append(later).await.unwrap();
        store.append(earlier).await.unwrap();
        store
            .append(create_test_event("order-1", "Shipped"))
            .await
            .unwrap();

        let created = store.get_events_by_type("Created").await.unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(created[0].aggregate_id, OrderId::new("order-1"));
        assert_eq!(created[1].aggregate_id, OrderId::new("order-2"));
    }

    #[tokio::test]
    async fn has_event_extension() {
        let store = InMemoryEventStore::new();
        let id = OrderId::new("order-1");

        assert!(!store.has_event(&id, "Created").await.unwrap());
        store.append(create_test_event("order-1", "Created")).await.unwrap();
        assert!(store.has_event(&id, "Created").await.unwrap());
    }

    #[tokio::test]
    async fn clear_removes_all_events() {
        let store = InMemoryEventStore::new();
        store.append(create_test_event("order-1", "Created")).await.unwrap();
        store.clear().await;
        assert_eq!(store.event_count().await, 0);
    }
}
