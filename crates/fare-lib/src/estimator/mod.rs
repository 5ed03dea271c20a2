//! Fare estimation engine
//!
//! Holds the fitted pricing curve and surge state shared by every request
//! handler. A successful training run publishes the new curve as a single
//! whole-value swap, so a concurrent estimate observes either the previous
//! curve or the new one, never a mix of coefficients.

mod fit;

pub use fit::{FitError, QuadraticFit};

use crate::models::{round_to_cents, FareEstimate, ModelKind, RideSample};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use thiserror::Error;
use tracing::{debug, warn};

/// Base fare for fallback linear pricing
pub const DEFAULT_BASE_FARE: f64 = 2.5;
/// Per-kilometre rate for fallback linear pricing
pub const DEFAULT_PER_KM_RATE: f64 = 1.5;
/// Minimum fare enforced on the trained path
pub const MINIMUM_FARE: f64 = 2.0;
/// Lower bound for the surge multiplier
pub const SURGE_FLOOR: f64 = 1.0;
/// Upper bound for the surge multiplier
pub const SURGE_CEILING: f64 = 3.0;
/// Fewest samples a training run will fit against
pub const MIN_TRAINING_SAMPLES: usize = 10;
/// Most samples requested from the ride history per training run
pub const MAX_TRAINING_SAMPLES: usize = 1000;

/// Outcome of a training run
#[derive(Debug, Clone, PartialEq)]
pub enum TrainOutcome {
    /// A new pricing curve was fitted and published
    Trained { samples: usize },
    /// Too few samples; the prior state is untouched
    InsufficientData { count: usize },
    /// The fit failed numerically; the prior state is untouched
    FitFailed { reason: String },
    /// The ride history could not be queried; the prior state is untouched
    HistoryUnavailable { reason: String },
}

impl TrainOutcome {
    pub fn is_trained(&self) -> bool {
        matches!(self, TrainOutcome::Trained { .. })
    }
}

/// Failure to evaluate the fitted curve for a given input
#[derive(Debug, Error)]
pub enum EvaluateError {
    #[error("fitted curve produced a non-finite fare for distance {distance_km}")]
    NonFinitePrediction { distance_km: f64 },
}

/// Counters and current state, for health reporting and logs
#[derive(Debug, Clone, Copy)]
pub struct EstimatorStats {
    pub is_trained: bool,
    pub surge_multiplier: f64,
    pub predictions: u64,
    pub fallback_predictions: u64,
}

/// Shared fare estimator with trained and fallback pricing paths
pub struct FareEstimator {
    base_fare: f64,
    per_km_rate: f64,
    /// Published curve; replaced wholesale on retrain
    fit: RwLock<Option<QuadraticFit>>,
    /// Surge multiplier stored as f64 bits for lock-free reads
    surge_bits: AtomicU64,
    predictions: AtomicU64,
    fallback_predictions: AtomicU64,
}

impl Default for FareEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl FareEstimator {
    pub fn new() -> Self {
        Self::with_fallback_pricing(DEFAULT_BASE_FARE, DEFAULT_PER_KM_RATE)
    }

    pub fn with_fallback_pricing(base_fare: f64, per_km_rate: f64) -> Self {
        Self {
            base_fare,
            per_km_rate,
            fit: RwLock::new(None),
            surge_bits: AtomicU64::new(SURGE_FLOOR.to_bits()),
            predictions: AtomicU64::new(0),
            fallback_predictions: AtomicU64::new(0),
        }
    }

    pub fn is_trained(&self) -> bool {
        self.fit
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn surge_multiplier(&self) -> f64 {
        f64::from_bits(self.surge_bits.load(Ordering::Relaxed))
    }

    /// Clamp and publish a new surge multiplier.
    ///
    /// The max/min chain lands non-finite input on a bound: NaN and
    /// negative infinity on the floor, positive infinity on the ceiling.
    pub fn update_surge(&self, multiplier: f64) {
        let clamped = multiplier.max(SURGE_FLOOR).min(SURGE_CEILING);
        self.surge_bits.store(clamped.to_bits(), Ordering::Relaxed);
    }

    /// Fit the pricing curve against completed-ride samples.
    ///
    /// Fewer than [`MIN_TRAINING_SAMPLES`] samples or a failed fit leave the
    /// previously published curve (or its absence) in place.
    pub fn train(&self, samples: &[RideSample]) -> TrainOutcome {
        if samples.len() < MIN_TRAINING_SAMPLES {
            return TrainOutcome::InsufficientData {
                count: samples.len(),
            };
        }

        match fit::fit_quadratic(samples) {
            Ok(curve) => {
                debug!(coefficients = ?curve.coefficients(), "Fitted pricing curve");
                let mut published = self.fit.write().unwrap_or_else(PoisonError::into_inner);
                *published = Some(curve);
                TrainOutcome::Trained {
                    samples: samples.len(),
                }
            }
            Err(err) => TrainOutcome::FitFailed {
                reason: err.to_string(),
            },
        }
    }

    /// Estimate a fare range for the given trip distance.
    ///
    /// Never fails: an untrained model, a non-positive distance, and a
    /// degenerate fitted curve all resolve to linear fallback pricing.
    pub fn predict(&self, distance_km: f64) -> FareEstimate {
        self.predictions.fetch_add(1, Ordering::Relaxed);

        let published = *self.fit.read().unwrap_or_else(PoisonError::into_inner);
        match published {
            Some(curve) if distance_km > 0.0 => {
                match self.trained_estimate(&curve, distance_km) {
                    Ok(estimate) => estimate,
                    Err(err) => {
                        warn!(distance_km, error = %err, "Curve evaluation failed, using fallback pricing");
                        self.fallback_predictions.fetch_add(1, Ordering::Relaxed);
                        self.fallback_estimate(distance_km, ModelKind::ErrorFallback)
                    }
                }
            }
            _ => {
                self.fallback_predictions.fetch_add(1, Ordering::Relaxed);
                self.fallback_estimate(distance_km, ModelKind::Fallback)
            }
        }
    }

    pub fn stats(&self) -> EstimatorStats {
        EstimatorStats {
            is_trained: self.is_trained(),
            surge_multiplier: self.surge_multiplier(),
            predictions: self.predictions.load(Ordering::Relaxed),
            fallback_predictions: self.fallback_predictions.load(Ordering::Relaxed),
        }
    }

    fn trained_estimate(
        &self,
        curve: &QuadraticFit,
        distance_km: f64,
    ) -> Result<FareEstimate, EvaluateError> {
        let base_prediction = curve.evaluate(distance_km);
        if !base_prediction.is_finite() {
            return Err(EvaluateError::NonFinitePrediction { distance_km });
        }

        let surge = self.surge_multiplier();
        let min_fare = (base_prediction * 0.85 * surge).max(MINIMUM_FARE);
        let max_fare = base_prediction * 1.15 * surge;
        let average_fare = base_prediction * surge;

        Ok(FareEstimate {
            min_fare: round_to_cents(min_fare),
            max_fare: round_to_cents(max_fare),
            average_fare: round_to_cents(average_fare),
            model: ModelKind::MlTrained,
        })
    }

    // Fallback pricing is not surge-scaled; only the trained path applies
    // the multiplier.
    fn fallback_estimate(&self, distance_km: f64, model: ModelKind) -> FareEstimate {
        let estimated = self.base_fare + distance_km * self.per_km_rate;
        FareEstimate {
            min_fare: round_to_cents(estimated * 0.8),
            max_fare: round_to_cents(estimated * 1.2),
            average_fare: round_to_cents(estimated),
            model,
        }
    }
}
