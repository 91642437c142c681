use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{Order, OrderStatus};
use tokio::sync::RwLock;

use crate::{
    OrderId, OrderStoreError, Result,
    store::{OrderStore, WriteOutcome},
};

#[derive(Debug, Default)]
struct InMemoryState {
    orders: HashMap<OrderId, Order>,
    unavailable: bool,
}

/// In-memory order store for testing and local runs.
///
/// Each conditional write holds the write lock across its check and its
/// mutation, matching the atomicity of the PostgreSQL implementation.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<InMemoryState>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Makes every subsequent operation fail with a retryable error until reset.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }
}

fn unavailable() -> OrderStoreError {
    OrderStoreError::Unavailable("in-memory order store marked unavailable".to_string())
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn get(&self, order_id: &OrderId) -> Result<Option<Order>> {
        let state = self.state.read().await;
        if state.unavailable {
            return Err(unavailable());
        }
        Ok(state.orders.get(order_id).cloned())
    }

    #[tracing::instrument(skip(self, order), fields(order_id = %order.order_id))]
    async fn create_if_absent(&self, order: Order) -> Result<WriteOutcome> {
        let mut state = self.state.write().await;
        if state.unavailable {
            return Err(unavailable());
        }

        if let Some(existing) = state.orders.get(&order.order_id) {
            tracing::debug!("order already exists");
            return Ok(WriteOutcome::Conflict(existing.clone()));
        }

        state.orders.insert(order.order_id.clone(), order.clone());
        Ok(WriteOutcome::Applied(order))
    }

    #[tracing::instrument(skip(self))]
    async fn update_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<WriteOutcome> {
        let mut state = self.state.write().await;
        if state.unavailable {
            return Err(unavailable());
        }

        let order = state
            .orders
            .get_mut(order_id)
            .ok_or_else(|| OrderStoreError::NotFound(order_id.clone()))?;

        if order.order_status == status {
            tracing::debug!("status already set");
            return Ok(WriteOutcome::Conflict(order.clone()));
        }

        order.order_status = status;
        order.updated_at = updated_at;
        Ok(WriteOutcome::Applied(order.clone()))
    }
}
