//! The order synchronization engine.

use domain::{IncomingOrderEvent, Order, OrderEventName, OrderStatus, compute_next_status};
use event_store::{EventEnvelope, EventStore, EventStoreError};
use order_store::{OrderStore, WriteOutcome};

use crate::error::{Result, SyncError};

/// Whether the downstream `Created` event was written by this call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emission {
    /// The event was recorded now.
    Emitted,

    /// The event was already recorded by an earlier delivery.
    AlreadyRecorded,
}

/// What a successful synchronization did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A `Placed` event for an absent order created it.
    ///
    /// `created` is false when a concurrent creator won the race; the
    /// downstream event is then derived from the winner's order.
    OrderCreated { created: bool, emission: Emission },

    /// A `Placed` event for an existing order re-emitted its `Created` event.
    CreatedEventReemitted { emission: Emission },

    /// The order moved to a new status.
    StatusUpdated { from: OrderStatus, to: OrderStatus },

    /// A concurrent writer had already set the target status.
    StatusAlreadySet { status: OrderStatus },
}

/// Applies incoming order events to the order store and the event store.
///
/// The engine is the sole mutator of orders and the sole emitter of the
/// downstream `Created` event. It never retries; every failure is returned
/// to the caller classified as retryable or not.
pub struct SyncEngine<O, E>
where
    O: OrderStore,
    E: EventStore,
{
    orders: O,
    events: E,
}

impl<O, E> SyncEngine<O, E>
where
    O: OrderStore,
    E: EventStore,
{
    /// Creates a new engine over the given stores.
    pub fn new(orders: O, events: E) -> Self {
        Self { orders, events }
    }

    /// Returns a reference to the underlying order store.
    pub fn orders(&self) -> &O {
        &self.orders
    }

    /// Returns a reference to the underlying event store.
    pub fn events(&self) -> &E {
        &self.events
    }

    /// Synchronizes the order store with one incoming event.
    #[tracing::instrument(
        skip(self, event),
        fields(order_id = %event.order_id(), event_name = %event.event_name)
    )]
    pub async fn sync_order(&self, event: &IncomingOrderEvent) -> Result<SyncOutcome> {
        event.validate()?;

        let order_id = event.order_id();
        let existing = self.orders.get(order_id).await?;

        match (event.is_placed(), existing) {
            (true, None) => {
                let outcome = self.orders.create_if_absent(Order::from_placed(event)).await?;
                let created = outcome.is_applied();
                if created {
                    tracing::info!("order created");
                    metrics::counter!("sync_orders_created_total").increment(1);
                } else {
                    tracing::debug!("order created concurrently, emitting from stored order");
                }

                let emission = self.emit_created(outcome.order()).await?;
                Ok(SyncOutcome::OrderCreated { created, emission })
            }
            (true, Some(order)) => {
                tracing::debug!(status = %order.order_status, "order exists, re-emitting created event");
                let emission = self.emit_created(&order).await?;
                Ok(SyncOutcome::CreatedEventReemitted { emission })
            }
            (false, Some(order)) => self.apply_transition(event, order).await,
            (false, None) => Err(SyncError::InvalidOperation {
                order_id: order_id.clone(),
                event_name: event.event_name,
            }),
        }
    }

    async fn apply_transition(
        &self,
        event: &IncomingOrderEvent,
        order: Order,
    ) -> Result<SyncOutcome> {
        let from = order.order_status;
        let to = compute_next_status(from, event.event_name).inspect_err(|err| {
            metrics::counter!("sync_transition_rejected_total", "kind" => err.kind.as_str())
                .increment(1);
        })?;

        match self
            .orders
            .update_status(&order.order_id, to, event.updated_at)
            .await?
        {
            WriteOutcome::Applied(_) => {
                tracing::info!(%from, %to, "order status updated");
                metrics::counter!("sync_transitions_applied_total").increment(1);
                Ok(SyncOutcome::StatusUpdated { from, to })
            }
            WriteOutcome::Conflict(current) => {
                tracing::debug!(status = %current.order_status, "status set by a concurrent writer");
                Ok(SyncOutcome::StatusAlreadySet {
                    status: current.order_status,
                })
            }
        }
    }

    /// Records the downstream `Created` event for an order.
    ///
    /// An already recorded event counts as success.
    async fn emit_created(&self, order: &Order) -> Result<Emission> {
        let envelope = EventEnvelope::from_payload(
            OrderEventName::Created.as_str(),
            order.order_id.clone(),
            order,
            order.created_at,
        )
        .map_err(EventStoreError::from)?;

        match self.events.append(envelope).await {
            Ok(()) => {
                metrics::counter!("sync_created_events_emitted_total").increment(1);
                Ok(Emission::Emitted)
            }
            Err(err) if err.is_duplicate() => {
                tracing::debug!("created event already recorded");
                metrics::counter!("sync_duplicate_events_total").increment(1);
                Ok(Emission::AlreadyRecorded)
            }
            Err(err) => Err(err.into()),
        }
    }
}
