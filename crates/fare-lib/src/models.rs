//! Core data models for the fare service

use serde::{Deserialize, Serialize};

/// A completed ride used as a training sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RideSample {
    pub distance_km: f64,
    pub fare: f64,
}

/// Which pricing path produced an estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    MlTrained,
    Fallback,
    ErrorFallback,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::MlTrained => "ml_trained",
            ModelKind::Fallback => "fallback",
            ModelKind::ErrorFallback => "error_fallback",
        }
    }
}

/// Fare range produced by a single prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FareEstimate {
    pub min_fare: f64,
    pub max_fare: f64,
    pub average_fare: f64,
    pub model: ModelKind,
}

/// Aggregate fare statistics over completed rides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FareStats {
    pub total_rides: i64,
    pub avg_fare: f64,
    pub min_fare: f64,
    pub max_fare: f64,
    pub avg_distance: f64,
}

/// Round a monetary amount to two decimal places
pub fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
