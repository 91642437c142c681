//! Batch ingestion controller.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::time::Duration;

use common::OrderId;
use domain::IncomingOrderEvent;
use event_store::EventStore;
use futures_util::{StreamExt, stream};
use order_store::OrderStore;
use tokio::time::{Instant, timeout_at};

use crate::engine::{SyncEngine, SyncOutcome};
use crate::message::{BatchResponse, Message};

/// Limits applied to one batch invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Time budget for the whole batch. Messages still running when it
    /// expires are reported for redelivery.
    ///
    /// An expired message's in-flight store call is dropped. Every store
    /// write is conditional, so the redelivered message finds either the
    /// completed write or none and converges to the same state.
    pub deadline: Duration,

    /// Maximum number of messages processed at once.
    pub concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(25),
            concurrency: 10,
        }
    }
}

/// Final state of one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    /// The event was applied.
    Synced(SyncOutcome),

    /// The message can never succeed and is acknowledged without effect.
    Dropped { reason: String },

    /// The message failed transiently and must be redelivered.
    Redeliver { reason: String },
}

impl MessageOutcome {
    fn label(&self) -> &'static str {
        match self {
            MessageOutcome::Synced(_) => "synced",
            MessageOutcome::Dropped { .. } => "dropped",
            MessageOutcome::Redeliver { .. } => "redeliver",
        }
    }
}

/// Feeds delivery batches through the synchronization engine.
///
/// Each message is parsed and synchronized on its own, and only transient
/// failures end up in the report. Structural validation is left to the
/// engine, whose `InvalidInput` error drops the message.
pub struct BatchProcessor<O, E>
where
    O: OrderStore,
    E: EventStore,
{
    engine: SyncEngine<O, E>,
    config: BatchConfig,
}

impl<O, E> BatchProcessor<O, E>
where
    O: OrderStore,
    E: EventStore,
{
    /// Creates a new processor around an engine.
    pub fn new(engine: SyncEngine<O, E>, config: BatchConfig) -> Self {
        Self { engine, config }
    }

    /// Returns a reference to the underlying engine.
    pub fn engine(&self) -> &SyncEngine<O, E> {
        &self.engine
    }

    /// Returns the batch limits.
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Processes a batch and reports the messages to redeliver.
    #[tracing::instrument(skip(self, messages), fields(batch_size = messages.len()))]
    pub async fn process_batch(&self, messages: Vec<Message>) -> BatchResponse {
        let started = std::time::Instant::now();
        let outcomes = self.process_messages(messages).await;

        let mut response = BatchResponse::default();
        for (message_id, outcome) in outcomes {
            if let MessageOutcome::Redeliver { .. } = outcome {
                response.push_failure(message_id);
            }
        }

        metrics::histogram!("batch_duration_seconds").record(started.elapsed().as_secs_f64());
        tracing::info!(
            redeliver = response.batch_item_failures.len(),
            "batch processed"
        );
        response
    }

    /// Processes a batch, returning every message's outcome in batch order.
    ///
    /// Messages for the same order run one after another in batch order;
    /// different orders run concurrently.
    pub async fn process_messages(&self, messages: Vec<Message>) -> Vec<(String, MessageOutcome)> {
        let deadline = Instant::now() + self.config.deadline;

        let groups: Vec<Vec<(usize, String, MessageOutcome)>> =
            stream::iter(group_by_order(messages))
                .map(|group| self.process_group(group, deadline))
                .buffer_unordered(self.config.concurrency.max(1))
                .collect()
                .await;

        let mut outcomes: Vec<_> = groups.into_iter().flatten().collect();
        outcomes.sort_unstable_by_key(|(position, ..)| *position);
        outcomes
            .into_iter()
            .map(|(_, message_id, outcome)| (message_id, outcome))
            .collect()
    }

    async fn process_group(
        &self,
        group: Vec<PendingMessage>,
        deadline: Instant,
    ) -> Vec<(usize, String, MessageOutcome)> {
        let mut outcomes = Vec::with_capacity(group.len());
        let mut expired = false;

        for pending in group {
            // Later messages of an order must not overtake one cut off by the deadline.
            let outcome = if expired {
                deadline_exceeded(&pending.message_id)
            } else {
                match timeout_at(deadline, self.process_message(&pending)).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        expired = true;
                        deadline_exceeded(&pending.message_id)
                    }
                }
            };
            metrics::counter!("batch_messages_total", "outcome" => outcome.label()).increment(1);
            outcomes.push((pending.position, pending.message_id, outcome));
        }

        outcomes
    }

    #[tracing::instrument(skip(self, pending), fields(message_id = %pending.message_id))]
    async fn process_message(&self, pending: &PendingMessage) -> MessageOutcome {
        let event = match &pending.event {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(error = %err, "dropping unparsable message");
                return MessageOutcome::Dropped {
                    reason: format!("unparsable body: {err}"),
                };
            }
        };

        match self.engine.sync_order(event).await {
            Ok(outcome) => MessageOutcome::Synced(outcome),
            Err(err) if err.is_retryable() => {
                tracing::warn!(error = %err, kind = err.kind(), "transient failure, requesting redelivery");
                MessageOutcome::Redeliver {
                    reason: err.to_string(),
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, kind = err.kind(), "dropping poison message");
                MessageOutcome::Dropped {
                    reason: err.to_string(),
                }
            }
        }
    }
}

/// A message with its body parsed and its position in the batch.
struct PendingMessage {
    position: usize,
    message_id: String,
    event: std::result::Result<IncomingOrderEvent, serde_json::Error>,
}

/// Splits a batch into per-order groups, each in batch order.
///
/// Unparsable messages have no order and each form a group of their own.
fn group_by_order(messages: Vec<Message>) -> Vec<Vec<PendingMessage>> {
    let mut groups: Vec<Vec<PendingMessage>> = Vec::new();
    let mut by_order: HashMap<OrderId, usize> = HashMap::new();

    for (position, message) in messages.into_iter().enumerate() {
        let event = serde_json::from_str::<IncomingOrderEvent>(&message.body);
        let order_id = event.as_ref().ok().map(|event| event.order_id().clone());
        let pending = PendingMessage {
            position,
            message_id: message.message_id,
            event,
        };

        match order_id {
            Some(order_id) => match by_order.entry(order_id) {
                Entry::Occupied(slot) => groups[*slot.get()].push(pending),
                Entry::Vacant(slot) => {
                    slot.insert(groups.len());
                    groups.push(vec![pending]);
                }
            },
            None => groups.push(vec![pending]),
        }
    }

    groups
}

fn deadline_exceeded(message_id: &str) -> MessageOutcome {
    tracing::warn!(message_id, "batch deadline exceeded");
    MessageOutcome::Redeliver {
        reason: "batch deadline exceeded".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use event_store::InMemoryEventStore;
    use order_store::InMemoryOrderStore;

    use super::*;

    fn processor() -> BatchProcessor<InMemoryOrderStore, InMemoryEventStore> {
        BatchProcessor::new(
            SyncEngine::new(InMemoryOrderStore::new(), InMemoryEventStore::new()),
            BatchConfig::default(),
        )
    }

    fn body(order_id: &str, event_name: &str) -> String {
        serde_json::json!({
            "eventName": event_name,
            "eventData": {
                "orderId": order_id,
                "sku": "SKU-001",
                "units": 1,
                "price": 500,
                "userId": "user-1"
            },
            "createdAt": "2024-05-01T12:00:00Z",
            "updatedAt": "2024-05-01T12:00:00Z"
        })
        .to_string()
    }

    #[tokio::test]
    async fn unparsable_message_is_dropped() {
        let processor = processor();

        let outcomes = processor
            .process_messages(vec![Message::new("msg-1", "not json")])
            .await;

        assert!(matches!(outcomes[0].1, MessageOutcome::Dropped { .. }));
    }

    #[tokio::test]
    async fn invalid_message_is_dropped_without_writes() {
        let processor = processor();
        let message = Message::new("msg-1", body("", "Placed"));

        let response = processor.process_batch(vec![message]).await;

        assert!(response.is_empty());
        assert_eq!(processor.engine().orders().order_count().await, 0);
    }

    #[tokio::test]
    async fn outcomes_keep_batch_order() {
        let processor = processor();
        let messages = vec![
            Message::new("msg-1", body("order-1", "Placed")),
            Message::new("msg-2", body("order-2", "Placed")),
            Message::new("msg-3", "garbage"),
        ];

        let outcomes = processor.process_messages(messages).await;
        let ids: Vec<_> = outcomes.iter().map(|(id, _)| id.as_str()).collect();

        assert_eq!(ids, vec!["msg-1", "msg-2", "msg-3"]);
        assert!(matches!(outcomes[0].1, MessageOutcome::Synced(_)));
        assert!(matches!(outcomes[2].1, MessageOutcome::Dropped { .. }));
    }

    #[tokio::test]
    async fn zero_concurrency_still_processes() {
        let processor = BatchProcessor::new(
            SyncEngine::new(InMemoryOrderStore::new(), InMemoryEventStore::new()),
            BatchConfig {
                concurrency: 0,
                ..BatchConfig::default()
            },
        );

        let response = processor
            .process_batch(vec![Message::new("msg-1", body("order-1", "Placed"))])
            .await;

        assert!(response.is_empty());
        assert_eq!(processor.engine().orders().order_count().await, 1);
    }

    #[test]
    fn groups_follow_order_id_and_keep_batch_order() {
        let messages = vec![
            Message::new("msg-1", body("order-1", "Placed")),
            Message::new("msg-2", body("order-2", "Placed")),
            Message::new("msg-3", "garbage"),
            Message::new("msg-4", body("order-1", "StockAllocated")),
            Message::new("msg-5", body("order-1", "PaymentAccepted")),
        ];

        let grouped = group_by_order(messages);
        let groups: Vec<Vec<&str>> = grouped
            .iter()
            .map(|group| group.iter().map(|m| m.message_id.as_str()).collect())
            .collect();

        assert_eq!(
            groups,
            vec![
                vec!["msg-1", "msg-4", "msg-5"],
                vec!["msg-2"],
                vec!["msg-3"],
            ]
        );
    }

    #[tokio::test]
    async fn same_order_messages_apply_in_batch_order() {
        let processor = processor();
        let messages = vec![
            Message::new("msg-1", body("order-1", "Placed")),
            Message::new("msg-2", body("order-1", "StockAllocated")),
            Message::new("msg-3", body("order-1", "PaymentAccepted")),
            Message::new("msg-4", body("order-1", "Shipped")),
        ];

        let outcomes = processor.process_messages(messages).await;

        assert!(
            outcomes
                .iter()
                .all(|(_, outcome)| matches!(outcome, MessageOutcome::Synced(_)))
        );
        let order = processor
            .engine()
            .orders()
            .get(&OrderId::new("order-1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(order.order_status, domain::OrderStatus::Shipped);
    }
}
