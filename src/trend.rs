//! Trend classification for time-ordered samples.
//!
//! A straight line is fitted against the synthetic index 1..n and the slope
//! and R² decide the category. Consecutive-run counting complements the fit:
//! a long strictly monotone run signals drift even when the overall line is
//! weak.
//!
//! # Examples
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use lab_analytics::trend::{analyze_trend, TimeSeriesPoint, TrendCategory};
//!
//! let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let points: Vec<TimeSeriesPoint> = (0..10)
//!     .map(|i| TimeSeriesPoint::new(t0 + Duration::days(i), 5.0 + 0.5 * i as f64))
//!     .collect();
//! let trend = analyze_trend("glucose", &points).unwrap();
//! assert_eq!(trend.trend, TrendCategory::Increasing);
//! assert!((trend.trend_strength - 1.0).abs() < 1e-12);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{require_len, AnalysisError, Result};
use crate::regression::linear_regression;

/// Minimum number of points for [`analyze_trend`].
pub const MIN_TREND_POINTS: usize = 3;

/// Slopes within ±this are flat.
pub const SLOPE_THRESHOLD: f64 = 0.01;

/// R² at or below this is a weak linear fit.
pub const MIN_TREND_STRENGTH: f64 = 0.3;

/// Run length that counts as a sustained trend in [`run_trend`].
pub const SUSTAINED_RUN_LENGTH: usize = 7;

/// Trend category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendCategory {
    Increasing,
    Decreasing,
    Stable,
    /// The line explains little of the variation.
    Cyclical,
}

impl TrendCategory {
    /// Classifies a fitted line.
    pub fn classify(slope: f64, r_squared: f64) -> Self {
        if r_squared <= MIN_TREND_STRENGTH {
            Self::Cyclical
        } else if slope > SLOPE_THRESHOLD {
            Self::Increasing
        } else if slope < -SLOPE_THRESHOLD {
            Self::Decreasing
        } else {
            Self::Stable
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunDirection {
    Increasing,
    Decreasing,
}

/// A strictly monotone stretch of consecutive points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonotoneRun {
    pub direction: RunDirection,
    /// Zero-based index of the first point.
    pub start: usize,
    /// Number of points in the run (steps + 1).
    pub length: usize,
}

/// Result of [`analyze_trend`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendResult {
    pub parameter: String,
    /// Input points in time order.
    pub points: Vec<TimeSeriesPoint>,
    pub trend: TrendCategory,
    /// R² of the line against 1..n.
    pub trend_strength: f64,
    /// Change per step.
    pub slope: f64,
    pub longest_run: Option<MonotoneRun>,
    /// Reserved; always empty.
    pub change_points: Vec<usize>,
}

/// Classifies the trend of a time-ordered sample.
///
/// Points are ordered by timestamp first (stable, so equal timestamps keep
/// their input order).
///
/// # Errors
///
/// - [`AnalysisError::InsufficientData`] for fewer than 3 points.
/// - [`AnalysisError::InvalidParameter`] for non-finite values.
pub fn analyze_trend(parameter: &str, points: &[TimeSeriesPoint]) -> Result<TrendResult> {
    analyze_trend_with_min_points(parameter, points, MIN_TREND_POINTS)
}

/// [`analyze_trend`] with a larger minimum sample size.
///
/// # Errors
///
/// As [`analyze_trend`]; `min_points` below 3 is raised to 3.
pub fn analyze_trend_with_min_points(
    parameter: &str,
    points: &[TimeSeriesPoint],
    min_points: usize,
) -> Result<TrendResult> {
    require_len("trend analysis", points.len(), min_points.max(MIN_TREND_POINTS))?;
    if let Some(i) = points.iter().position(|p| !p.value.is_finite()) {
        return Err(AnalysisError::InvalidParameter(format!(
            "trend analysis: non-finite value at index {i}"
        )));
    }

    let mut ordered = points.to_vec();
    ordered.sort_by_key(|p| p.timestamp);

    let index: Vec<f64> = (1..=ordered.len()).map(|i| i as f64).collect();
    let values: Vec<f64> = ordered.iter().map(|p| p.value).collect();
    let fit = linear_regression(&index, &values)?;

    Ok(TrendResult {
        parameter: parameter.to_string(),
        trend: TrendCategory::classify(fit.slope, fit.r_squared),
        trend_strength: fit.r_squared,
        slope: fit.slope,
        longest_run: longest_monotone_run(&values),
        change_points: Vec::new(),
        points: ordered,
    })
}

/// Longest strictly increasing or decreasing run. Ties end a run.
///
/// Returns `None` when no two consecutive values differ. The earliest run
/// wins among equally long ones.
pub fn longest_monotone_run(values: &[f64]) -> Option<MonotoneRun> {
    let mut best: Option<MonotoneRun> = None;
    let mut current: Option<MonotoneRun> = None;

    for (i, w) in values.windows(2).enumerate() {
        let direction = if w[1] > w[0] {
            Some(RunDirection::Increasing)
        } else if w[1] < w[0] {
            Some(RunDirection::Decreasing)
        } else {
            None
        };

        current = match (direction, current) {
            (Some(d), Some(run)) if run.direction == d => Some(MonotoneRun {
                length: run.length + 1,
                ..run
            }),
            (Some(d), _) => Some(MonotoneRun {
                direction: d,
                start: i,
                length: 2,
            }),
            (None, _) => None,
        };

        if let Some(run) = current {
            if best.map_or(0, |b| b.length) < run.length {
                best = Some(run);
            }
        }
    }
    best
}

/// Seven-point run check.
///
/// Returns the longest monotone run when it spans at least
/// [`SUSTAINED_RUN_LENGTH`] points, `None` otherwise.
///
/// # Errors
///
/// [`AnalysisError::InsufficientData`] for fewer than 7 values.
///
/// ```
/// use lab_analytics::trend::run_trend;
///
/// let drifting = [1.0, 1.1, 1.3, 1.4, 1.6, 1.7, 1.9];
/// assert_eq!(run_trend(&drifting).unwrap().unwrap().length, 7);
/// assert!(run_trend(&[1.0, 2.0, 1.0, 2.0, 1.0, 2.0, 1.0]).unwrap().is_none());
/// ```
pub fn run_trend(values: &[f64]) -> Result<Option<MonotoneRun>> {
    require_len("run trend", values.len(), SUSTAINED_RUN_LENGTH)?;
    Ok(longest_monotone_run(values).filter(|run| run.length >= SUSTAINED_RUN_LENGTH))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn series(values: &[f64]) -> Vec<TimeSeriesPoint> {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| TimeSeriesPoint::new(t0 + Duration::hours(i as i64), v))
            .collect()
    }

    #[test]
    fn increasing_and_decreasing() {
        let up = analyze_trend("x", &series(&[1.0, 2.1, 2.9, 4.2, 5.0])).unwrap();
        assert_eq!(up.trend, TrendCategory::Increasing);
        assert!(up.trend_strength > 0.9);
        assert!(up.change_points.is_empty());

        let down = analyze_trend("x", &series(&[9.0, 7.0, 5.5, 3.0, 1.0])).unwrap();
        assert_eq!(down.trend, TrendCategory::Decreasing);
        assert!(down.slope < 0.0);
    }

    #[test]
    fn stable_needs_a_good_fit() {
        // Tiny positive slope explained well by the line
        let values: Vec<f64> = (0..10).map(|i| 100.0 + 0.005 * i as f64).collect();
        let r = analyze_trend("x", &series(&values)).unwrap();
        assert_eq!(r.trend, TrendCategory::Stable);
    }

    #[test]
    fn weak_fit_is_cyclical() {
        let r = analyze_trend("x", &series(&[1.0, 5.0, 1.0, 5.0, 1.0, 5.0])).unwrap();
        assert!(r.trend_strength <= MIN_TREND_STRENGTH);
        assert_eq!(r.trend, TrendCategory::Cyclical);
    }

    #[test]
    fn constant_series_has_no_fit() {
        let r = analyze_trend("x", &series(&[4.0, 4.0, 4.0])).unwrap();
        assert_eq!(r.trend_strength, 0.0);
        assert_eq!(r.trend, TrendCategory::Cyclical);
        assert!(r.longest_run.is_none());
    }

    #[test]
    fn points_are_time_ordered() {
        let mut pts = series(&[1.0, 2.0, 3.0, 4.0]);
        pts.reverse();
        let r = analyze_trend("x", &pts).unwrap();
        let values: Vec<f64> = r.points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(r.trend, TrendCategory::Increasing);
    }

    #[test]
    fn too_few_points() {
        assert!(matches!(
            analyze_trend("x", &series(&[1.0, 2.0])),
            Err(AnalysisError::InsufficientData { required: 3, actual: 2, .. })
        ));
        assert!(matches!(
            analyze_trend_with_min_points("x", &series(&[1.0, 2.0, 3.0]), 5),
            Err(AnalysisError::InsufficientData { required: 5, .. })
        ));
        assert!(analyze_trend("x", &series(&[1.0, f64::NAN, 3.0])).is_err());
    }

    #[test]
    fn longest_run_picks_earliest_longest() {
        let run = longest_monotone_run(&[1.0, 2.0, 3.0, 2.0, 1.0, 1.0]).unwrap();
        assert_eq!(run.direction, RunDirection::Increasing);
        assert_eq!(run.start, 0);
        assert_eq!(run.length, 3);

        let run = longest_monotone_run(&[5.0, 5.0, 4.0, 3.0, 2.0, 2.0]).unwrap();
        assert_eq!(run.direction, RunDirection::Decreasing);
        assert_eq!(run.start, 1);
        assert_eq!(run.length, 4);

        assert!(longest_monotone_run(&[2.0, 2.0, 2.0]).is_none());
        assert!(longest_monotone_run(&[]).is_none());
    }

    #[test]
    fn run_trend_seven_points() {
        let drop = [9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 3.5];
        let run = run_trend(&drop).unwrap().unwrap();
        assert_eq!(run.direction, RunDirection::Decreasing);
        assert_eq!(run.length, 7);

        // a tie splits the run
        assert!(run_trend(&[1.0, 2.0, 3.0, 3.0, 4.0, 5.0, 6.0]).unwrap().is_none());
        assert!(matches!(
            run_trend(&[1.0, 2.0, 3.0]),
            Err(AnalysisError::InsufficientData { required: 7, .. })
        ));
    }

    #[test]
    fn serializes_category() {
        let r = analyze_trend("weight", &series(&[1.0, 2.0, 3.0])).unwrap();
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["trend"], "increasing");
        assert_eq!(json["parameter"], "weight");
        assert!(json["changePoints"].as_array().unwrap().is_empty());
        assert!(json["trendStrength"].is_number());
    }
}
