//! HTTP transport for the order synchronization engine.
//!
//! Accepts delivery batches on `POST /batches` and answers with the partial
//! failure report, alongside health and Prometheus metrics endpoints.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use event_store::{EventStore, InMemoryEventStore};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::{InMemoryOrderStore, OrderStore};
use order_sync::{BatchConfig, BatchProcessor, SyncEngine};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<O, E>(processor: Arc<BatchProcessor<O, E>>, metrics_handle: PrometheusHandle) -> Router
where
    O: OrderStore + 'static,
    E: EventStore + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/batches", post(routes::batches::process::<O, E>))
        .with_state(processor)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Builds a processor over fresh in-memory stores.
pub fn create_in_memory_processor(
    config: BatchConfig,
) -> Arc<BatchProcessor<InMemoryOrderStore, InMemoryEventStore>> {
    let engine = SyncEngine::new(InMemoryOrderStore::new(), InMemoryEventStore::new());
    Arc::new(BatchProcessor::new(engine, config))
}
