//! Shared numeric primitives.
//!
//! Thin layer over `u_numflow::stats` (Kahan mean, Welford variance, R-7
//! quantiles, bias-corrected moments). The backend signals every failure
//! with `None`; here the cause is recovered and reported as an
//! [`AnalysisError`] naming the analysis that asked.

use u_numflow::stats as backend;

use crate::error::{require_len, AnalysisError, Result};

pub use u_numflow::stats::kahan_sum;

/// Arithmetic mean.
///
/// # Errors
///
/// - [`AnalysisError::InsufficientData`] if `data` is empty.
/// - [`AnalysisError::InvalidParameter`] for non-finite values.
///
/// # Examples
///
/// ```
/// use lab_analytics::stats::mean;
///
/// assert!((mean(&[1.0, 2.0, 3.0, 4.0]).unwrap() - 2.5).abs() < 1e-15);
/// assert!(mean(&[]).is_err());
/// ```
pub fn mean(data: &[f64]) -> Result<f64> {
    require_len("mean", data.len(), 1)?;
    resolve("mean", data, backend::mean(data))
}

/// Sample variance (denominator `n − 1`).
///
/// A single observation has no sample variance; this is reported as an
/// error rather than coerced to zero.
///
/// # Errors
///
/// - [`AnalysisError::InsufficientData`] if `data.len() < 2`.
/// - [`AnalysisError::InvalidParameter`] for non-finite values.
pub fn variance(data: &[f64]) -> Result<f64> {
    require_len("variance", data.len(), 2)?;
    resolve("variance", data, backend::variance(data))
}

/// Sample standard deviation, `sqrt(variance)`.
///
/// # Errors
///
/// As [`variance`].
pub fn std_dev(data: &[f64]) -> Result<f64> {
    variance(data).map(f64::sqrt)
}

/// Smallest and largest value of a non-empty slice.
///
/// # Errors
///
/// - [`AnalysisError::InsufficientData`] if `data` is empty.
/// - [`AnalysisError::InvalidParameter`] for NaN.
pub fn min_max(data: &[f64]) -> Result<(f64, f64)> {
    require_len("range", data.len(), 1)?;
    let min = resolve("range", data, backend::min(data))?;
    let max = resolve("range", data, backend::max(data))?;
    Ok((min, max))
}

/// Returns an ascending copy of `data`; the caller's slice is left untouched.
pub fn sorted_copy(data: &[f64]) -> Vec<f64> {
    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// R-7 quantile of already-sorted data; `p` is clamped to `[0, 1]`.
///
/// # Errors
///
/// [`AnalysisError::InsufficientData`] if `sorted` is empty.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> Result<f64> {
    require_len("quantile", sorted.len(), 1)?;
    resolve(
        "quantile",
        sorted,
        backend::quantile_sorted(sorted, p.clamp(0.0, 1.0)),
    )
}

/// Adjusted Fisher–Pearson skewness G₁.
///
/// # Errors
///
/// - [`AnalysisError::InsufficientData`] for fewer than 3 values.
/// - [`AnalysisError::DegenerateData`] for zero variance.
pub fn skewness(data: &[f64]) -> Result<f64> {
    require_len("skewness", data.len(), 3)?;
    resolve("skewness", data, backend::skewness(data))
}

/// Bias-corrected excess kurtosis G₂.
///
/// # Errors
///
/// - [`AnalysisError::InsufficientData`] for fewer than 4 values.
/// - [`AnalysisError::DegenerateData`] for zero variance.
pub fn kurtosis(data: &[f64]) -> Result<f64> {
    require_len("kurtosis", data.len(), 4)?;
    resolve("kurtosis", data, backend::kurtosis(data))
}

/// Moment skewness `m₃ / m₂^(3/2)` without bias correction.
///
/// # Errors
///
/// As [`skewness`].
pub fn skewness_moment(data: &[f64]) -> Result<f64> {
    require_len("skewness", data.len(), 3)?;
    resolve("skewness", data, backend::skewness_moment(data))
}

/// Moment excess kurtosis `m₄ / m₂² − 3` without bias correction.
///
/// # Errors
///
/// As [`kurtosis`].
pub fn kurtosis_moment(data: &[f64]) -> Result<f64> {
    require_len("kurtosis", data.len(), 4)?;
    resolve("kurtosis", data, backend::kurtosis_moment(data))
}

/// Rejects NaN and infinite values.
///
/// # Errors
///
/// [`AnalysisError::InvalidParameter`] naming the first offending index.
pub fn ensure_finite(analysis: &str, data: &[f64]) -> Result<()> {
    match data.iter().position(|x| !x.is_finite()) {
        Some(i) => Err(AnalysisError::InvalidParameter(format!(
            "{analysis}: non-finite value at index {i}"
        ))),
        None => Ok(()),
    }
}

/// Maps a backend `None` to its cause. Sizes are checked by the callers, so
/// what remains is a non-finite value or zero spread.
fn resolve(analysis: &'static str, data: &[f64], value: Option<f64>) -> Result<f64> {
    match value {
        Some(v) => Ok(v),
        None => {
            ensure_finite(analysis, data)?;
            Err(AnalysisError::DegenerateData { analysis })
        }
    }
}
