//! Identifier types shared by every layer of the order synchronization engine.

mod types;

pub use types::OrderId;
