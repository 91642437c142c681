use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::OrderId;

/// Unique identifier for a recorded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random event ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an event ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An event together with the metadata needed to store it.
///
/// The pair (`aggregate_id`, `event_type`) is the idempotency key: the store
/// accepts at most one envelope per pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique identifier for this event.
    pub event_id: EventId,

    /// The type of the event (e.g., "Created").
    pub event_type: String,

    /// The aggregate this event belongs to.
    pub aggregate_id: OrderId,

    /// When the event happened.
    pub timestamp: DateTime<Utc>,

    /// The event payload as JSON.
    pub payload: serde_json::Value,
}

impl EventEnvelope {
    /// Creates an envelope with a fresh event ID.
    pub fn new(
        event_type: impl Into<String>,
        aggregate_id: OrderId,
        payload: serde_json::Value,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: EventId::new(),
            event_type: event_type.into(),
            aggregate_id,
            timestamp,
            payload,
        }
    }

    /// Creates an envelope from a serializable payload.
    pub fn from_payload<T: Serialize>(
        event_type: impl Into<String>,
        aggregate_id: OrderId,
        payload: &T,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(
            event_type,
            aggregate_id,
            serde_json::to_value(payload)?,
            timestamp,
        ))
    }

    /// Replaces the generated event ID.
    pub fn with_event_id(mut self, event_id: EventId) -> Self {
        self.event_id = event_id;
        self
    }
}
