//! Normality diagnostics.
//!
//! The summary attaches a moment-based *approximation*: a heuristic score
//! built from skewness and excess kurtosis. It is not a Shapiro–Wilk test
//! and is labelled accordingly. The Jarque–Bera test is available as a
//! proper large-sample alternative.
//!
//! # References
//!
//! - Jarque & Bera (1987). "A test for normality of observations and
//!   regression residuals". International Statistical Review, 55(2), 163–172.

use serde::{Deserialize, Serialize};

use crate::error::{require_len, Result};
use crate::special;
use crate::stats;

/// Default threshold below which a sample is judged non-normal.
pub const DEFAULT_NORMALITY_THRESHOLD: f64 = 0.05;

/// Label of the heuristic test.
pub const MOMENT_APPROXIMATION: &str = "Moment-based normality approximation";

/// Outcome of a normality assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionTest {
    pub test_name: String,
    pub statistic: f64,
    /// Approximate p-value (a heuristic score for the moment approximation).
    pub p_value: f64,
    pub is_normal: bool,
    pub recommendation: String,
}

/// Heuristic normality score from skewness and excess kurtosis.
///
/// `score = exp(−(|skewness| + |kurtosis|) / 2)`; the sample is judged
/// normal when the score exceeds [`DEFAULT_NORMALITY_THRESHOLD`]. A missing
/// kurtosis (fewer than four values) contributes nothing.
///
/// # Examples
///
/// ```
/// use lab_analytics::normality::moment_approximation;
///
/// let t = moment_approximation(0.1, Some(-0.3));
/// assert!(t.is_normal);
/// assert!((t.p_value - (-0.2_f64).exp()).abs() < 1e-12);
/// ```
pub fn moment_approximation(skewness: f64, kurtosis: Option<f64>) -> DistributionTest {
    moment_approximation_with_threshold(skewness, kurtosis, DEFAULT_NORMALITY_THRESHOLD)
}

/// [`moment_approximation`] with a caller-chosen threshold.
pub fn moment_approximation_with_threshold(
    skewness: f64,
    kurtosis: Option<f64>,
    threshold: f64,
) -> DistributionTest {
    let statistic = skewness.abs() + kurtosis.map_or(0.0, f64::abs);
    let p_value = (-statistic / 2.0).exp();
    let is_normal = p_value > threshold;
    DistributionTest {
        test_name: MOMENT_APPROXIMATION.to_string(),
        statistic,
        p_value,
        is_normal,
        recommendation: recommendation(is_normal),
    }
}

/// Jarque–Bera test for normality.
///
/// `JB = n/6 · (S² + K²/4)` with population skewness `S` and excess
/// kurtosis `K`; the p-value is the χ²(2) upper tail.
///
/// # Errors
///
/// - [`crate::AnalysisError::InsufficientData`] for fewer than 8 values.
/// - [`crate::AnalysisError::DegenerateData`] when all values are equal.
pub fn jarque_bera(data: &[f64]) -> Result<DistributionTest> {
    jarque_bera_with_threshold(data, DEFAULT_NORMALITY_THRESHOLD)
}

/// [`jarque_bera`] with a caller-chosen significance threshold.
pub fn jarque_bera_with_threshold(data: &[f64], threshold: f64) -> Result<DistributionTest> {
    require_len("Jarque-Bera test", data.len(), 8)?;
    let n = data.len() as f64;
    let s = stats::skewness_moment(data)?;
    let k = stats::kurtosis_moment(data)?;
    let statistic = n / 6.0 * (s * s + k * k / 4.0);
    let p_value = special::chi_squared_sf(statistic, 2.0);
    let is_normal = p_value > threshold;

    Ok(DistributionTest {
        test_name: "Jarque-Bera".to_string(),
        statistic,
        p_value,
        is_normal,
        recommendation: recommendation(is_normal),
    })
}

fn recommendation(is_normal: bool) -> String {
    if is_normal {
        "Data are approximately normal; parametric methods such as t-tests and \
         Shewhart control charts are appropriate."
            .to_string()
    } else {
        "Data deviate from normality; consider a transformation or non-parametric \
         methods before relying on t-tests or capability indices."
            .to_string()
    }
}
