//! Two-sample comparison.
//!
//! Student's independent two-sample t-test with pooled variance, plus
//! Cohen's d as the effect size.
//!
//! # Examples
//!
//! ```
//! use lab_analytics::testing::two_sample_t_test;
//!
//! let control = [5.1, 4.9, 5.2, 5.0, 4.8];
//! let treated = [7.1, 6.9, 7.2, 7.0, 6.8];
//! let r = two_sample_t_test(&control, &treated).unwrap();
//! assert!(r.significant);
//! assert!(r.t_statistic < 0.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{require_len, AnalysisError, Result};
use crate::special;
use crate::stats;

/// Significance level used by [`two_sample_t_test`].
pub const DEFAULT_SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Result of a two-sample t-test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TTestResult {
    pub t_statistic: f64,
    pub degrees_of_freedom: f64,
    /// Two-tailed p-value.
    pub p_value: f64,
    /// `p_value < significance level`.
    pub significant: bool,
    /// Cohen's d with the pooled standard deviation.
    pub effect_size: f64,
    /// mean(a) − mean(b).
    pub mean_difference: f64,
}

/// Pooled-variance t-test at the 0.05 level.
///
/// # Algorithm
///
/// s²ₚ = ((n₁−1)s₁² + (n₂−1)s₂²) / (n₁+n₂−2)
/// t = (x̄₁ − x̄₂) / √(s²ₚ(1/n₁ + 1/n₂)), df = n₁+n₂−2
/// d = (x̄₁ − x̄₂) / sₚ
///
/// # Errors
///
/// - [`AnalysisError::InsufficientData`] if either sample has fewer than 2 values.
/// - [`AnalysisError::DegenerateData`] if the pooled variance is zero.
/// - [`AnalysisError::InvalidParameter`] for non-finite input.
pub fn two_sample_t_test(a: &[f64], b: &[f64]) -> Result<TTestResult> {
    two_sample_t_test_with_alpha(a, b, DEFAULT_SIGNIFICANCE_LEVEL)
}

/// [`two_sample_t_test`] with a caller-chosen significance level.
///
/// # Errors
///
/// As [`two_sample_t_test`], plus [`AnalysisError::InvalidParameter`] when
/// `alpha` is not in `(0, 1)`.
pub fn two_sample_t_test_with_alpha(a: &[f64], b: &[f64], alpha: f64) -> Result<TTestResult> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(AnalysisError::InvalidParameter(format!(
            "significance level must be in (0, 1), got {alpha}"
        )));
    }
    stats::ensure_finite("t-test", a)?;
    stats::ensure_finite("t-test", b)?;
    require_len("t-test", a.len(), 2)?;
    require_len("t-test", b.len(), 2)?;

    let n1 = a.len() as f64;
    let n2 = b.len() as f64;
    let mean1 = stats::mean(a)?;
    let mean2 = stats::mean(b)?;
    let var1 = stats::variance(a)?;
    let var2 = stats::variance(b)?;

    let df = n1 + n2 - 2.0;
    let pooled_variance = ((n1 - 1.0) * var1 + (n2 - 1.0) * var2) / df;
    if pooled_variance <= 0.0 {
        return Err(AnalysisError::DegenerateData { analysis: "t-test" });
    }

    let mean_difference = mean1 - mean2;
    let standard_error = (pooled_variance * (1.0 / n1 + 1.0 / n2)).sqrt();
    let t_statistic = mean_difference / standard_error;
    let p_value = special::t_two_sided_p(t_statistic, df);

    Ok(TTestResult {
        t_statistic,
        degrees_of_freedom: df,
        p_value,
        significant: p_value < alpha,
        effect_size: mean_difference / pooled_variance.sqrt(),
        mean_difference,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_values() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [3.0, 4.0, 5.0, 6.0, 7.0];
        let r = two_sample_t_test(&a, &b).unwrap();
        // s²ₚ = 2.5, SE = 1
        assert!((r.t_statistic + 2.0).abs() < 1e-12);
        assert_eq!(r.degrees_of_freedom, 8.0);
        assert!((r.p_value - 0.0805).abs() < 1e-3, "p = {}", r.p_value);
        assert!(!r.significant);
        assert!((r.effect_size + 2.0 / 2.5_f64.sqrt()).abs() < 1e-12);
        assert!((r.mean_difference + 2.0).abs() < 1e-12);
    }

    #[test]
    fn clearly_different_means() {
        let a = [1.0, 2.0, 3.0, 2.0, 1.5, 2.5];
        let b = [10.0, 11.0, 12.0, 10.5, 11.5, 10.5];
        let r = two_sample_t_test(&a, &b).unwrap();
        assert!(r.p_value < 0.001, "p = {}", r.p_value);
        assert!(r.significant);
    }

    #[test]
    fn same_distribution_not_significant() {
        let a = [5.0, 5.1, 4.9, 5.0, 5.1, 4.9, 5.0, 5.0];
        let b = [5.0, 5.2, 4.8, 5.1, 4.9, 5.0, 5.1, 4.9];
        let r = two_sample_t_test(&a, &b).unwrap();
        assert!(r.p_value > 0.3, "p = {}", r.p_value);
    }

    #[test]
    fn unequal_sizes() {
        let r = two_sample_t_test(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0, 7.0, 8.0]).unwrap();
        assert_eq!(r.degrees_of_freedom, 6.0);
        assert!(r.p_value < 0.05);
    }

    #[test]
    fn custom_alpha_changes_decision() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [3.0, 4.0, 5.0, 6.0, 7.0];
        assert!(two_sample_t_test_with_alpha(&a, &b, 0.10).unwrap().significant);
        assert!(two_sample_t_test_with_alpha(&a, &b, 0.0).is_err());
        assert!(two_sample_t_test_with_alpha(&a, &b, 1.0).is_err());
    }

    #[test]
    fn edge_cases() {
        assert!(matches!(
            two_sample_t_test(&[1.0], &[2.0, 3.0]),
            Err(AnalysisError::InsufficientData { .. })
        ));
        assert!(matches!(
            two_sample_t_test(&[2.0, 2.0], &[2.0, 2.0, 2.0]),
            Err(AnalysisError::DegenerateData { .. })
        ));
        assert!(matches!(
            two_sample_t_test(&[1.0, f64::NAN], &[2.0, 3.0]),
            Err(AnalysisError::InvalidParameter(_))
        ));
    }
}
