use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{Order, OrderStatus};

use crate::{OrderId, Result};

/// Outcome of a conditional write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The precondition held and the write took effect.
    Applied(Order),

    /// The precondition failed; carries the order as currently stored.
    Conflict(Order),
}

impl WriteOutcome {
    /// Returns true if the write took effect.
    pub fn is_applied(&self) -> bool {
        matches!(self, WriteOutcome::Applied(_))
    }

    /// Returns the order the store holds after the operation.
    pub fn order(&self) -> &Order {
        match self {
            WriteOutcome::Applied(order) | WriteOutcome::Conflict(order) => order,
        }
    }

    /// Consumes the outcome, returning the stored order.
    pub fn into_order(self) -> Order {
        match self {
            WriteOutcome::Applied(order) | WriteOutcome::Conflict(order) => order,
        }
    }
}

/// Capability interface over any store able to perform conditional writes
/// keyed by order id.
///
/// Implementations must evaluate each precondition and its write atomically.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Reads an order. Absence is `Ok(None)`.
    async fn get(&self, order_id: &OrderId) -> Result<Option<Order>>;

    /// Inserts the order unless one with the same id exists.
    ///
    /// On conflict, returns the existing order.
    async fn create_if_absent(&self, order: Order) -> Result<WriteOutcome>;

    /// Sets the order's status, conditioned on the stored status differing
    /// from `status`.
    ///
    /// On conflict, returns the order as stored. Fails with `NotFound` if no
    /// order has the id.
    async fn update_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<WriteOutcome>;
}
