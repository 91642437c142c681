//! Order synchronization engine and batch ingestion controller.
//!
//! - [`SyncEngine`] applies one incoming order event: it creates the order on
//!   `Placed`, re-emits the downstream `Created` event on a redelivered
//!   `Placed`, and otherwise moves the order through the transition policy.
//! - [`BatchProcessor`] feeds a delivery batch through the engine and reports
//!   which messages failed transiently and must be redelivered.

pub mod batch;
pub mod engine;
pub mod error;
pub mod message;

pub use batch::{BatchConfig, BatchProcessor, MessageOutcome};
pub use engine::{Emission, SyncEngine, SyncOutcome};
pub use error::{Result, SyncError};
pub use message::{BatchItemFailure, BatchResponse, Message};
