//! Core library for the ride fare estimation service
//!
//! This crate provides:
//! - The fare estimator (trained and fallback pricing paths)
//! - Least-squares training over completed-ride history
//! - Ride history access (Postgres)
//! - Metrics and structured logging

pub mod estimator;
pub mod history;
pub mod models;
pub mod observability;
pub mod training;

pub use estimator::{
    EstimatorStats, EvaluateError, FareEstimator, FitError, QuadraticFit, TrainOutcome,
    MAX_TRAINING_SAMPLES, MIN_TRAINING_SAMPLES,
};
pub use history::{DbConfig, HistoryError, PgRideHistory, RideHistory};
pub use models::*;
pub use observability::{FareMetrics, StructuredLogger};
