//! Startup and on-demand training against the ride history

use crate::estimator::{FareEstimator, TrainOutcome, MAX_TRAINING_SAMPLES};
use crate::history::RideHistory;
use tracing::warn;

/// Load recent completed rides and retrain the estimator.
///
/// History failures are absorbed: the estimator keeps whatever state it had
/// and the outcome reports why nothing was fitted.
pub async fn train_from_history(
    estimator: &FareEstimator,
    history: &dyn RideHistory,
) -> TrainOutcome {
    let samples = match history.recent_completed(MAX_TRAINING_SAMPLES).await {
        Ok(samples) => samples,
        Err(err) => {
            warn!(error = %err, "Could not load ride history for training");
            return TrainOutcome::HistoryUnavailable {
                reason: err.to_string(),
            };
        }
    };

    estimator.train(&samples)
}
