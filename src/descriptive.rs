//! Descriptive statistics for a single numeric sample.
//!
//! [`describe`] produces a [`StatisticalSummary`]: central tendency,
//! dispersion, quantiles, shape, a 95 % confidence interval for the mean,
//! Tukey outliers and a normality approximation. The individual
//! primitives are public for callers that need just one of them.
//!
//! # Examples
//!
//! ```
//! use lab_analytics::descriptive::describe;
//!
//! let s = describe("systolic", &[118.0, 122.0, 121.0, 119.0, 125.0, 120.0]).unwrap();
//! assert_eq!(s.count, 6);
//! assert!((s.mean - 120.8333).abs() < 1e-3);
//! assert_eq!(s.quartiles.q2, s.median);
//! ```
//!
//! # References
//!
//! - Joanes & Gill (1998). "Comparing measures of sample skewness and
//!   kurtosis". *The Statistician* 47(1), 183–189.
//! - Tukey (1977). *Exploratory Data Analysis*.

use serde::{Deserialize, Serialize};

use crate::error::{require_len, AnalysisError, Result};
use crate::normality::{self, DistributionTest};
use crate::special;
use crate::stats;

/// Multiplier of the interquartile range used for outlier fences.
pub const TUKEY_FENCE: f64 = 1.5;

/// Minimum sample size for [`describe`].
pub const MIN_SUMMARY_SIZE: usize = 3;

/// Smallest and largest value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

/// First, second and third quartiles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quartiles {
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
}

impl Quartiles {
    /// Interquartile range `q3 − q1`.
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

/// Tail percentiles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p5: f64,
    pub p95: f64,
    pub p99: f64,
}

/// Confidence interval for the mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
    /// Confidence level, e.g. `0.95`.
    pub level: f64,
}

/// Summary of one parameter's sample. Computed fresh per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticalSummary {
    pub parameter_name: String,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Most frequent value, only when some value occurs more than once.
    pub mode: Option<f64>,
    /// Sample standard deviation (denominator `n − 1`).
    pub standard_deviation: f64,
    pub variance: f64,
    pub range: ValueRange,
    pub quartiles: Quartiles,
    pub percentiles: Percentiles,
    /// Adjusted Fisher–Pearson skewness.
    pub skewness: f64,
    /// Bias-adjusted excess kurtosis; `None` below four values.
    pub kurtosis: Option<f64>,
    pub confidence_interval: ConfidenceInterval,
    /// Values outside the Tukey fences, in input order.
    pub outliers: Vec<f64>,
    pub distribution_test: DistributionTest,
}

/// Computes the full summary for `data`.
///
/// # Errors
///
/// - [`AnalysisError::InvalidParameter`] if `data` contains NaN or infinity.
/// - [`AnalysisError::InsufficientData`] for fewer than [`MIN_SUMMARY_SIZE`] values.
/// - [`AnalysisError::DegenerateData`] if every value is identical.
pub fn describe(parameter_name: &str, data: &[f64]) -> Result<StatisticalSummary> {
    describe_with_threshold(parameter_name, data, normality::DEFAULT_NORMALITY_THRESHOLD)
}

/// [`describe`] with a caller-chosen normality threshold.
pub fn describe_with_threshold(
    parameter_name: &str,
    data: &[f64],
    normality_threshold: f64,
) -> Result<StatisticalSummary> {
    stats::ensure_finite("descriptive summary", data)?;
    require_len("descriptive summary", data.len(), MIN_SUMMARY_SIZE)?;

    let sorted = stats::sorted_copy(data);
    let n = sorted.len();
    let mean = stats::mean(data)?;
    let variance = stats::variance(data)?;
    let standard_deviation = variance.sqrt();
    if standard_deviation == 0.0 {
        return Err(AnalysisError::DegenerateData {
            analysis: "descriptive summary",
        });
    }

    let median = median_sorted(&sorted);
    let quartiles = Quartiles {
        q1: percentile(&sorted, 25.0)?,
        q2: median,
        q3: percentile(&sorted, 75.0)?,
    };
    let percentiles = Percentiles {
        p5: percentile(&sorted, 5.0)?,
        p95: percentile(&sorted, 95.0)?,
        p99: percentile(&sorted, 99.0)?,
    };

    let skewness = stats::skewness(data)?;
    let kurtosis = if n >= 4 {
        Some(stats::kurtosis(data)?)
    } else {
        None
    };

    Ok(StatisticalSummary {
        parameter_name: parameter_name.to_string(),
        count: n,
        mean,
        median,
        mode: mode_sorted(&sorted),
        standard_deviation,
        variance,
        range: ValueRange {
            min: sorted[0],
            max: sorted[n - 1],
        },
        quartiles,
        percentiles,
        skewness,
        kurtosis,
        confidence_interval: mean_interval(mean, standard_deviation, n),
        outliers: tukey_outliers(data, &quartiles),
        distribution_test: normality::moment_approximation_with_threshold(
            skewness,
            kurtosis,
            normality_threshold,
        ),
    })
}

/// Percentile `p` (0–100) of sorted data by linear interpolation.
///
/// # Errors
///
/// [`AnalysisError::InsufficientData`] if `sorted` is empty.
pub fn percentile(sorted: &[f64], p: f64) -> Result<f64> {
    stats::quantile_sorted(sorted, p / 100.0)
}

/// Median; the average of the two middle values for an even count.
///
/// # Errors
///
/// [`AnalysisError::InsufficientData`] if `data` is empty.
pub fn median(data: &[f64]) -> Result<f64> {
    require_len("median", data.len(), 1)?;
    Ok(median_sorted(&stats::sorted_copy(data)))
}

/// Most frequent value, or `None` when no value repeats.
///
/// Ties go to the smallest value.
pub fn mode(data: &[f64]) -> Option<f64> {
    mode_sorted(&stats::sorted_copy(data))
}

/// Adjusted Fisher–Pearson skewness `n/((n−1)(n−2)) · Σz³`.
///
/// # Errors
///
/// - [`AnalysisError::InsufficientData`] for fewer than 3 values.
/// - [`AnalysisError::DegenerateData`] for zero variance.
pub fn skewness(data: &[f64]) -> Result<f64> {
    stats::skewness(data)
}

/// Bias-adjusted excess kurtosis.
///
/// `n(n+1)/((n−1)(n−2)(n−3)) · Σz⁴ − 3(n−1)²/((n−2)(n−3))`
///
/// # Errors
///
/// - [`AnalysisError::InsufficientData`] for fewer than 4 values.
/// - [`AnalysisError::DegenerateData`] for zero variance.
pub fn kurtosis(data: &[f64]) -> Result<f64> {
    stats::kurtosis(data)
}

/// 95 % confidence interval for the mean, `mean ± t(0.975, n−1) · sd/√n`.
///
/// # Errors
///
/// [`AnalysisError::InsufficientData`] for fewer than 2 values.
pub fn confidence_interval_95(data: &[f64]) -> Result<ConfidenceInterval> {
    require_len("confidence interval", data.len(), 2)?;
    let mean = stats::mean(data)?;
    let sd = stats::std_dev(data)?;
    Ok(mean_interval(mean, sd, data.len()))
}

/// Values below `q1 − 1.5·IQR` or above `q3 + 1.5·IQR`, in input order.
///
/// # Errors
///
/// [`AnalysisError::InsufficientData`] if `data` is empty.
///
/// # Examples
///
/// ```
/// use lab_analytics::descriptive::outliers;
///
/// assert_eq!(outliers(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]).unwrap(), vec![100.0]);
/// ```
pub fn outliers(data: &[f64]) -> Result<Vec<f64>> {
    let sorted = stats::sorted_copy(data);
    let quartiles = Quartiles {
        q1: percentile(&sorted, 25.0)?,
        q2: median_sorted(&sorted),
        q3: percentile(&sorted, 75.0)?,
    };
    Ok(tukey_outliers(data, &quartiles))
}

fn median_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

fn mode_sorted(sorted: &[f64]) -> Option<f64> {
    let mut best: Option<(f64, usize)> = None;
    let mut i = 0;
    while i < sorted.len() {
        let run = sorted[i..].iter().take_while(|&&v| v == sorted[i]).count();
        if run > 1 && best.map_or(0, |(_, count)| count) < run {
            best = Some((sorted[i], run));
        }
        i += run.max(1);
    }
    best.map(|(value, _)| value)
}

fn tukey_outliers(data: &[f64], quartiles: &Quartiles) -> Vec<f64> {
    let iqr = quartiles.iqr();
    let lower = quartiles.q1 - TUKEY_FENCE * iqr;
    let upper = quartiles.q3 + TUKEY_FENCE * iqr;
    data.iter()
        .copied()
        .filter(|&x| x < lower || x > upper)
        .collect()
}

fn mean_interval(mean: f64, sd: f64, n: usize) -> ConfidenceInterval {
    let half_width = special::t_critical_95(n.saturating_sub(1)) * sd / (n as f64).sqrt();
    ConfidenceInterval {
        lower: mean - half_width,
        upper: mean + half_width,
        level: 0.95,
    }
}
