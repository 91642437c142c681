//! API server entry point.

use std::sync::Arc;

use api::config::{Config, LogFormat};
use event_store::{EventStore, PostgresEventStore};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::{OrderStore, PostgresOrderStore};
use order_sync::{BatchProcessor, SyncEngine};
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn serve<O, E>(
    config: &Config,
    processor: Arc<BatchProcessor<O, E>>,
    metrics_handle: PrometheusHandle,
) -> Result<(), BoxError>
where
    O: OrderStore + 'static,
    E: EventStore + 'static,
{
    let app = api::create_app(processor, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shut down gracefully");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env();
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    // 3. Pick the storage backend and serve
    match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(url)
                .await?;

            let events = PostgresEventStore::new(pool.clone());
            events.run_migrations().await?;
            tracing::info!("connected to Postgres, migrations applied");

            let engine = SyncEngine::new(PostgresOrderStore::new(pool), events);
            let processor = Arc::new(BatchProcessor::new(engine, config.batch_config()));
            serve(&config, processor, metrics_handle).await
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory stores");
            let processor = api::create_in_memory_processor(config.batch_config());
            serve(&config, processor, metrics_handle).await
        }
    }
}
