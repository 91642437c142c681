//! Append-only event store for order domain events.
//!
//! Each event is recorded at most once per (aggregate id, event type) pair.
//! A second append of the same pair fails with
//! [`EventStoreError::DuplicateEvent`] rather than a generic error, so callers
//! can treat redelivery as the steady state it is.

pub mod error;
pub mod event;
pub mod memory;
pub mod postgres;
pub mod store;

pub use common::OrderId;
pub use error::{EventStoreError, Result};
pub use event::{EventEnvelope, EventId};
pub use memory::InMemoryEventStore;
pub use postgres::PostgresEventStore;
pub use store::{EventStore, EventStoreExt};
