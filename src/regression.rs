//! Ordinary least-squares linear regression.
//!
//! # Examples
//!
//! ```
//! use lab_analytics::regression::linear_regression;
//!
//! let x = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let y = [2.1, 3.9, 6.1, 7.9, 10.1];
//! let fit = linear_regression(&x, &y).unwrap();
//! assert!((fit.slope - 2.0).abs() < 0.1);
//! assert!((fit.intercept - 0.1).abs() < 0.2);
//! assert!(fit.r_squared > 0.99);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{require_len, require_same_len, AnalysisError, Result};
use crate::stats;

/// Result of a simple linear regression: y = intercept + slope · x.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegressionResult {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination, 1 − RSS/TSS (0 when TSS is 0).
    pub r_squared: f64,
    /// 1 − (1−R²)(n−1)/(n−2); `None` for two points.
    pub adjusted_r_squared: Option<f64>,
    /// yᵢ − ŷᵢ, aligned with the input.
    pub residuals: Vec<f64>,
    /// ŷᵢ, aligned with the input.
    pub predictions: Vec<f64>,
}

impl RegressionResult {
    /// Fitted value at `x`.
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Fits y = β₀ + β₁x by least squares.
///
/// β₁ = Σ(xᵢ − x̄)(yᵢ − ȳ) / Σ(xᵢ − x̄)², β₀ = ȳ − β₁x̄.
///
/// # Errors
///
/// - [`AnalysisError::DimensionMismatch`] if lengths differ.
/// - [`AnalysisError::InsufficientData`] for fewer than 2 points.
/// - [`AnalysisError::DegenerateData`] if every `x` is identical.
///
/// # References
///
/// Draper & Smith (1998). "Applied Regression Analysis", 3rd edition.
pub fn linear_regression(x: &[f64], y: &[f64]) -> Result<RegressionResult> {
    require_same_len(x.len(), y.len())?;
    let n = x.len();
    require_len("linear regression", n, 2)?;

    let x_mean = stats::mean(x)?;
    let y_mean = stats::mean(y)?;
    let (sxy, sxx) = x
        .iter()
        .zip(y)
        .fold((0.0, 0.0), |(sxy, sxx), (&xi, &yi)| {
            let dx = xi - x_mean;
            (sxy + dx * (yi - y_mean), sxx + dx * dx)
        });
    if sxx == 0.0 {
        return Err(AnalysisError::DegenerateData {
            analysis: "linear regression",
        });
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let predictions: Vec<f64> = x.iter().map(|&xi| intercept + slope * xi).collect();
    let residuals: Vec<f64> = y
        .iter()
        .zip(&predictions)
        .map(|(&yi, &fi)| yi - fi)
        .collect();

    let ss_res: f64 = residuals.iter().map(|r| r * r).sum();
    let ss_tot: f64 = y.iter().map(|&yi| (yi - y_mean).powi(2)).sum();
    let r_squared = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else {
        0.0
    };

    let nf = n as f64;
    let adjusted_r_squared = (n > 2).then(|| 1.0 - (1.0 - r_squared) * (nf - 1.0) / (nf - 2.0));

    Ok(RegressionResult {
        slope,
        intercept,
        r_squared,
        adjusted_r_squared,
        residuals,
        predictions,
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn noiseless_line_round_trips(
            slope in -50.0_f64..50.0,
            intercept in -100.0_f64..100.0,
            n in 2_usize..=30,
        ) {
            let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
            let y: Vec<f64> = x.iter().map(|v| slope * v + intercept).collect();
            let fit = linear_regression(&x, &y).unwrap();
            prop_assert!((fit.slope - slope).abs() < 1e-8);
            prop_assert!((fit.intercept - intercept).abs() < 1e-7);
            if slope.abs() > 1e-6 {
                prop_assert!((fit.r_squared - 1.0).abs() < 1e-9);
            }
        }
    }
}
