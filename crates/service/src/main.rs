//! Fare service - ride fare estimation over HTTP
//!
//! Serves fare predictions from a pricing curve trained on completed-ride
//! history, falling back to flat linear pricing whenever the model is
//! untrained or unusable.

use anyhow::Result;
use fare_lib::{training, FareEstimator, FareMetrics, PgRideHistory, RideHistory, StructuredLogger};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting fare-service");

    let config = config::ServiceConfig::load()?;
    info!(
        http_port = config.http_port,
        db_host = %config.db_host,
        "Service configured"
    );

    let metrics = FareMetrics::new();
    let logger = StructuredLogger::new("fare-service");
    logger.log_startup(SERVICE_VERSION);

    let estimator = Arc::new(FareEstimator::new());
    let history: Arc<dyn RideHistory> = Arc::new(PgRideHistory::new(config.db_config()));

    // Train on startup; an unreachable or sparse history only means
    // fallback pricing until a retrain succeeds.
    let outcome = training::train_from_history(&estimator, history.as_ref()).await;
    metrics.record_training(&outcome);
    logger.log_training(&outcome);

    let state = Arc::new(api::AppState::new(
        estimator,
        history,
        metrics,
        logger.clone(),
    ));

    let _api_server = tokio::spawn(api::serve(config.http_port, state));

    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");
    info!("Shutting down");

    Ok(())
}
