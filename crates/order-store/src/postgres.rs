use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{Money, Order, OrderStatus, Sku, UserId};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    OrderId, OrderStoreError, Result,
    store::{OrderStore, WriteOutcome},
};

const ORDER_COLUMNS: &str =
    "order_id, order_status, sku, units, price, user_id, created_at, updated_at";

/// PostgreSQL-backed order store implementation.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
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

    fn row_to_order(row: PgRow) -> Result<Order> {
        let order_id: String = row.try_get("order_id")?;
        let corrupt = |reason: String| OrderStoreError::CorruptRecord {
            order_id: order_id.clone(),
            reason,
        };

        let status: String = row.try_get("order_status")?;
        let order_status = status
            .parse::<OrderStatus>()
            .map_err(|e| corrupt(e.to_string()))?;
        let units: i32 = row.try_get("units")?;
        let units = u32::try_from(units).map_err(|e| corrupt(e.to_string()))?;

        Ok(Order {
            order_id: OrderId::new(order_id.clone()),
            order_status,
            sku: Sku::new(row.try_get::<String, _>("sku")?),
            units,
            price: Money::from_cents(row.try_get("price")?),
            user_id: UserId::new(row.try_get::<String, _>("user_id")?),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    async fn current_or_not_found(&self, order_id: &OrderId) -> Result<Order> {
        self.get(order_id)
            .await?
            .ok_or_else(|| OrderStoreError::NotFound(order_id.clone()))
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn get(&self, order_id: &OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = $1"
        ))
        .bind(order_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    #[tracing::instrument(skip(self, order), fields(order_id = %order.order_id))]
    async fn create_if_absent(&self, order: Order) -> Result<WriteOutcome> {
        let units = i32::try_from(order.units).map_err(|e| OrderStoreError::CorruptRecord {
            order_id: order.order_id.to_string(),
            reason: e.to_string(),
        })?;

        let inserted = sqlx::query(&format!(
            r#"
            INSERT INTO orders ({ORDER_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (order_id) DO NOTHING
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order.order_id.as_str())
        .bind(order.order_status.as_str())
        .bind(order.sku.as_str())
        .bind(units)
        .bind(order.price.cents())
        .bind(order.user_id.as_str())
        .bind(order.created_at)
        .bind(order.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(row) => Ok(WriteOutcome::Applied(Self::row_to_order(row)?)),
            None => {
                tracing::debug!("order already exists");
                let existing = self.current_or_not_found(&order.order_id).await?;
                Ok(WriteOutcome::Conflict(existing))
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn update_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<WriteOutcome> {
        let updated = sqlx::query(&format!(
            r#"
            UPDATE orders
            SET order_status = $2, updated_at = $3
            WHERE order_id = $1 AND order_status <> $2
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order_id.as_str())
        .bind(status.as_str())
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(row) => Ok(WriteOutcome::Applied(Self::row_to_order(row)?)),
            None => {
                tracing::debug!("status already set");
                let current = self.current_or_not_found(order_id).await?;
                Ok(WriteOutcome::Conflict(current))
            }
        }
    }
}
