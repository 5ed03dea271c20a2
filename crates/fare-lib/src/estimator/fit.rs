//! Least-squares fitting of the quadratic pricing curve
//!
//! Expands each trip distance into a `[1, x, x^2]` feature basis and solves
//! the normal equations for the ordinary least squares coefficients.

use crate::models::RideSample;
use nalgebra::{DMatrix, DVector};
use thiserror::Error;

/// Width of the polynomial feature basis (degree 2)
const BASIS_LEN: usize = 3;

/// Errors from the least-squares fit
#[derive(Debug, Error)]
pub enum FitError {
    /// The normal equations have no unique solution, e.g. every sample
    /// shares the same distance.
    #[error("normal equations are singular, no unique fit")]
    SingularSystem,
    #[error("fit produced non-finite coefficients")]
    NonFiniteCoefficients,
}

/// Fitted pricing curve `fare = c0 + c1*d + c2*d^2`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadraticFit {
    coefficients: [f64; BASIS_LEN],
}

impl QuadraticFit {
    /// Evaluate the curve at the given distance
    pub fn evaluate(&self, distance_km: f64) -> f64 {
        let [c0, c1, c2] = self.coefficients;
        c0 + distance_km * (c1 + distance_km * c2)
    }

    pub fn coefficients(&self) -> [f64; BASIS_LEN] {
        self.coefficients
    }
}

/// Fit the quadratic curve to the samples with ordinary least squares
pub(crate) fn fit_quadratic(samples: &[RideSample]) -> Result<QuadraticFit, FitError> {
    let design = DMatrix::from_fn(samples.len(), BASIS_LEN, |row, col| {
        samples[row].distance_km.powi(col as i32)
    });
    let targets = DVector::from_iterator(samples.len(), samples.iter().map(|s| s.fare));

    let gram = design.transpose() * &design;
    let moment = design.transpose() * targets;

    let solution = gram.lu().solve(&moment).ok_or(FitError::SingularSystem)?;

    let coefficients = [solution[0], solution[1], solution[2]];
    if coefficients.iter().any(|c| !c.is_finite()) {
        return Err(FitError::NonFiniteCoefficients);
    }

    Ok(QuadraticFit { coefficients })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples_from(pricing: impl Fn(f64) -> f64, distances: &[f64]) -> Vec<RideSample> {
        distances
            .iter()
            .map(|&distance_km| RideSample {
                distance_km,
                fare: pricing(distance_km),
            })
            .collect()
    }

    #[test]
    fn test_recovers_exact_quadratic() {
        let distances: Vec<f64> = (1..=12).map(|d| d as f64).collect();
        let samples = samples_from(|d| 1.0 + 2.0 * d + 0.5 * d * d, &distances);

        let fit = fit_quadratic(&samples).unwrap();
        let [c0, c1, c2] = fit.coefficients();

        assert!((c0 - 1.0).abs() < 1e-6, "c0 was {}", c0);
        assert!((c1 - 2.0).abs() < 1e-6, "c1 was {}", c1);
        assert!((c2 - 0.5).abs() < 1e-6, "c2 was {}", c2);
        assert!((fit.evaluate(20.0) - 241.0).abs() < 1e-4);
    }

    #[test]
    fn test_recovers_line_with_near_zero_curvature() {
        let distances: Vec<f64> = (1..=10).map(|d| d as f64).collect();
        let samples = samples_from(|d| 2.0 + 1.2 * d, &distances);

        let fit = fit_quadratic(&samples).unwrap();
        let [_, _, c2] = fit.coefficients();

        assert!(c2.abs() < 1e-6, "curvature was {}", c2);
        assert!((fit.evaluate(5.0) - 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_identical_distances_are_singular() {
        let samples: Vec<RideSample> = (0..10)
            .map(|i| RideSample {
                distance_km: 5.0,
                fare: 8.0 + i as f64,
            })
            .collect();

        assert!(matches!(
            fit_quadratic(&samples),
            Err(FitError::SingularSystem)
        ));
    }

    #[test]
    fn test_noisy_samples_fit_within_tolerance() {
        // Alternating +/-0.05 noise around a known line
        let samples: Vec<RideSample> = (1..=20)
            .map(|d| {
                let noise = if d % 2 == 0 { 0.05 } else { -0.05 };
                RideSample {
                    distance_km: d as f64,
                    fare: 2.5 + 1.5 * d as f64 + noise,
                }
            })
            .collect();

        let fit = fit_quadratic(&samples).unwrap();
        assert!((fit.evaluate(10.0) - 17.5).abs() < 0.2);
    }
}
