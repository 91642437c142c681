//! Order aggregate as persisted by the order store.

use chrono::{DateTime, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};

use super::{IncomingOrderEvent, Money, OrderStatus, Sku, UserId};

/// Current authoritative state of one order.
///
/// An order is created once, from its `Placed` event, and afterwards only its
/// status and `updated_at` change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: OrderId,
    pub order_status: OrderStatus,
    pub sku: Sku,
    pub units: u32,
    pub price: Money,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Builds the initial aggregate for a placed order.
    ///
    /// The event is expected to have passed `IncomingOrderEvent::validate`.
    pub fn from_placed(event: &IncomingOrderEvent) -> Self {
        let data = &event.event_data;
        Self {
            order_id: data.order_id.clone(),
            order_status: OrderStatus::Created,
            sku: data.sku.clone(),
            units: data.units,
            price: data.price,
            user_id: data.user_id.clone(),
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }

    /// Returns true if the order can no longer change status.
    pub fn is_terminal(&self) -> bool {
        self.order_status.is_terminal()
    }

    /// Total amount charged for the order.
    pub fn total(&self) -> Money {
        Money::from_cents(self.price.cents() * i64::from(self.units))
    }
}
