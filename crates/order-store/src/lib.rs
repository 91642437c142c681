//! Current-state store for order aggregates.
//!
//! The store exposes two conditional writes. Both return data on conflict
//! instead of failing, because a concurrent winner's result is as valid as
//! the caller's own:
//! - [`OrderStore::create_if_absent`] inserts only if no order has the key
//! - [`OrderStore::update_status`] writes only if the stored status differs

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use common::OrderId;
pub use error::{OrderStoreError, Result};
pub use memory::InMemoryOrderStore;
pub use postgres::PostgresOrderStore;
pub use store::{OrderStore, WriteOutcome};
