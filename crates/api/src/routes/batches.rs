//! Batch ingestion endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use event_store::EventStore;
use order_store::OrderStore;
use order_sync::{BatchProcessor, BatchResponse, Message};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub messages: Vec<Message>,
}

/// POST /batches: runs a delivery batch and returns the messages to redeliver.
pub async fn process<O, E>(
    State(processor): State<Arc<BatchProcessor<O, E>>>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<BatchResponse>, ApiError>
where
    O: OrderStore + 'static,
    E: EventStore + 'static,
{
    let Json(request) = payload?;
    let response = processor.process_batch(request.messages).await;
    Ok(Json(response))
}
