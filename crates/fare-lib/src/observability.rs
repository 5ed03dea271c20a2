//! Observability infrastructure for the fare service
//!
//! Provides:
//! - Prometheus metrics (prediction latency, predictions by model kind,
//!   training runs, surge multiplier)
//! - Structured JSON logging with tracing

use crate::estimator::TrainOutcome;
use crate::models::FareEstimate;
use prometheus::{
    register_gauge, register_histogram, register_int_counter, register_int_counter_vec,
    register_int_gauge, Gauge, Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<FareMetricsInner> = OnceLock::new();

struct FareMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_total: IntCounterVec,
    training_runs_total: IntCounter,
    training_failures_total: IntCounter,
    training_samples: IntGauge,
    model_trained: IntGauge,
    surge_multiplier: Gauge,
}

impl FareMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "fare_service_prediction_latency_seconds",
                "Time spent computing a fare estimate",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter_vec!(
                "fare_service_predictions_total",
                "Fare predictions served, by producing model kind",
                &["model"]
            )
            .expect("Failed to register predictions_total"),

            training_runs_total: register_int_counter!(
                "fare_service_training_runs_total",
                "Training runs attempted (startup and retrain)"
            )
            .expect("Failed to register training_runs_total"),

            training_failures_total: register_int_counter!(
                "fare_service_training_failures_total",
                "Training runs that failed to fit or reach the history"
            )
            .expect("Failed to register training_failures_total"),

            training_samples: register_int_gauge!(
                "fare_service_training_samples",
                "Sample count of the last successful training run"
            )
            .expect("Failed to register training_samples"),

            model_trained: register_int_gauge!(
                "fare_service_model_trained",
                "Whether a fitted pricing curve is active (1) or fallback pricing is in use (0)"
            )
            .expect("Failed to register model_trained"),

            surge_multiplier: register_gauge!(
                "fare_service_surge_multiplier",
                "Current surge pricing multiplier"
            )
            .expect("Failed to register surge_multiplier"),
        }
    }
}

/// Fare service metrics for Prometheus exposition
///
/// A lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct FareMetrics {
    _private: (),
}

impl Default for FareMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl FareMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(FareMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &FareMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner()
            .prediction_latency_seconds
            .observe(duration_secs);
    }

    pub fn inc_prediction(&self, model: &str) {
        self.inner()
            .predictions_total
            .with_label_values(&[model])
            .inc();
    }

    /// Record a training run's outcome
    pub fn record_training(&self, outcome: &TrainOutcome) {
        let inner = self.inner();
        inner.training_runs_total.inc();
        match outcome {
            TrainOutcome::Trained { samples } => {
                inner.training_samples.set(*samples as i64);
                inner.model_trained.set(1);
            }
            TrainOutcome::InsufficientData { .. } => {}
            TrainOutcome::FitFailed { .. } | TrainOutcome::HistoryUnavailable { .. } => {
                inner.training_failures_total.inc();
            }
        }
    }

    pub fn set_surge_multiplier(&self, multiplier: f64) {
        self.inner().surge_multiplier.set(multiplier);
    }
}

/// Structured logger for fare service events
///
/// Provides consistent JSON-formatted records for estimates, training runs,
/// and surge updates.
#[derive(Clone)]
pub struct StructuredLogger {
    service: String,
}

impl StructuredLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn log_startup(&self, version: &str) {
        info!(
            event = "service_started",
            service = %self.service,
            version = %version,
            "Fare service started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service,
            reason = %reason,
            "Fare service shutting down"
        );
    }

    pub fn log_estimate(&self, distance_km: f64, estimate: &FareEstimate) {
        info!(
            event = "fare_estimated",
            service = %self.service,
            distance_km = distance_km,
            min_fare = estimate.min_fare,
            max_fare = estimate.max_fare,
            average_fare = estimate.average_fare,
            model = %estimate.model.as_str(),
            "Fare estimate served"
        );
    }

    pub fn log_training(&self, outcome: &TrainOutcome) {
        match outcome {
            TrainOutcome::Trained { samples } => {
                info!(
                    event = "model_trained",
                    service = %self.service,
                    samples = samples,
                    "Model trained successfully"
                );
            }
            TrainOutcome::InsufficientData { count } => {
                warn!(
                    event = "training_skipped",
                    service = %self.service,
                    samples = count,
                    "Not enough ride history to train model, using fallback pricing"
                );
            }
            TrainOutcome::FitFailed { reason } => {
                warn!(
                    event = "training_failed",
                    service = %self.service,
                    reason = %reason,
                    "Model training failed, keeping previous state"
                );
            }
            TrainOutcome::HistoryUnavailable { reason } => {
                warn!(
                    event = "training_failed",
                    service = %self.service,
                    reason = %reason,
                    "Ride history unavailable, keeping previous state"
                );
            }
        }
    }

    pub fn log_surge_update(&self, requested: f64, applied: f64) {
        info!(
            event = "surge_updated",
            service = %self.service,
            requested = requested,
            applied = applied,
            "Surge multiplier updated"
        );
    }
}
