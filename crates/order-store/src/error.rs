use thiserror::Error;

use crate::OrderId;

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum OrderStoreError {
    /// A conditional update targeted an order that does not exist.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// A stored row could not be mapped back to an order.
    #[error("Corrupt order record {order_id}: {reason}")]
    CorruptRecord { order_id: String, reason: String },

    /// The backing store could not be reached.
    #[error("Order store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl OrderStoreError {
    /// Returns true if repeating the operation may succeed.
    ///
    /// A record the store cannot represent fails the same way every time.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, OrderStoreError::CorruptRecord { .. })
    }
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, OrderStoreError>;
