use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    EventEnvelope, EventId, EventStoreError, OrderId, Result,
    store::{EventStore, validate_event_for_append},
};

/// Name of the unique constraint on (aggregate_id, event_type).
const UNIQUE_EVENT_CONSTRAINT: &str = "unique_aggregate_event_type";

/// PostgreSQL-backed event store implementation.
#[derive(Clone)]
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    /// Creates a new PostgreSQL event store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_event(row: PgRow) -> Result<EventEnvelope> {
        Ok(EventEnvelope {
            event_id: EventId::from_uuid(row.try_get::<Uuid, _>("id")?),
            event_type: row.try_get("event_type")?,
            aggregate_id: OrderId::new(row.try_get::<String, _>("aggregate_id")?),
            timestamp: row.try_get("timestamp")?,
            payload: row.try_get("payload")?,
        })
    }
}

#[async_trait]
impl EventStore for PostgresEventStore {
    #[tracing::instrument(skip(self, event), fields(aggregate_id = %event.aggregate_id, event_type = %event.event_type))]
    async fn append(&self, event: EventEnvelope) -> Result<()> {
        validate_event_for_append(&event)?;

        sqlx::query(
            r#"
            INSERT INTO order_events (id, event_type, aggregate_id, timestamp, payload)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(event.event_id.as_uuid())
        .bind(&event.event_type)
        .bind(event.aggregate_id.as_str())
        .bind(event.timestamp)
        .bind(&event.payload)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some(UNIQUE_EVENT_CONSTRAINT)
            {
                tracing::debug!("event already recorded");
                return EventStoreError::DuplicateEvent {
                    aggregate_id: event.aggregate_id.clone(),
                    event_type: event.event_type.clone(),
                };
            }
            EventStoreError::Database(e)
        })?;

        metrics::counter!("event_store_appends_total").increment(1);
        Ok(())
    }

    async fn get_events_for_aggregate(&self, aggregate_id: &OrderId) -> Result<Vec<EventEnvelope>> {
        let rows = sqlx::query(
            r#"
            SELECT id, event_type, aggregate_id, timestamp, payload
            FROM order_events
            WHERE aggregate_id = $1
            ORDER BY timestamp ASC, sequence ASC
            "#,
        )
        .bind(aggregate_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_event).collect()
    }

    async fn get_events_by_type(&self, event_type: &str) -> Result<Vec<EventEnvelope>> {
        let rows = sqlx::query(
            r#"
            SELECT id, event_type, aggregate_id, timestamp, payload
            FROM order_events
            WHERE event_type = $1
            ORDER BY timestamp ASC, sequence ASC
            "#,
        )
        .bind(event_type)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_event).collect()
    }
}
