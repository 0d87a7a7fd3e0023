//! Variables control charts: X-bar/R and Individuals/Moving-Range.
//!
//! Builders are configured once (subgroup size, optional specification
//! limits) and turn a data set into an immutable [`QualityControlChart`].
//! Building is a pure function of the input, so rebuilding from the same
//! data reproduces the same limits.
//!
//! Factor constants live in [`super::factors`].
//!
//! # References
//!
//! - Montgomery, D.C. (2019). *Introduction to Statistical Quality Control*, 8th ed.,
//!   Chapter 6.
//! - ASTM E2587, Standard Practice for Use of Control Charts

use chrono::{DateTime, Utc};

use super::chart::{
    ChartType, ControlLimits, DispersionChart, QualityControlChart, QualityControlPoint,
};
use super::factors::{factors, D2_MR, D4_MR, E2};
use super::rules::{evaluate, evaluate_rules, interpret_rules, RuleEvaluation, WesternElectricRule};
use crate::capability::{compute_capability, SpecificationLimits};
use crate::error::{require_len, require_same_len, AnalysisError, Result};
use crate::stats;

/// Subgroup size used when none is configured.
pub const DEFAULT_SUBGROUP_SIZE: usize = 5;

const IN_CONTROL: &str = "Process is in statistical control; continue routine monitoring.";
const DISPERSION_OUT: &str =
    "Process variation is out of control: investigate changes in spread before interpreting the mean chart.";

// ---------------------------------------------------------------------------
// X-bar/R Chart
// ---------------------------------------------------------------------------

/// X-bar and Range chart builder.
///
/// # Algorithm
///
/// 1. For each subgroup, compute the mean (X-bar) and range (R).
/// 2. Grand mean X̿ = mean of subgroup means, R̄ = mean of ranges.
/// 3. X-bar limits: X̿ ± A2·R̄. R limits: [D3·R̄, D4·R̄].
/// 4. Short-term sigma: R̄ / d2.
///
/// # Examples
///
/// ```
/// use lab_analytics::spc::XBarRChart;
///
/// let chart = XBarRChart::new(5).unwrap().build(&[
///     vec![25.0, 26.0, 24.5, 25.5, 25.0],
///     vec![25.2, 24.8, 25.1, 24.9, 25.3],
///     vec![25.1, 25.0, 24.7, 25.3, 24.9],
/// ]).unwrap();
/// assert!(chart.upper_control_limit > chart.center_line);
/// assert!(chart.center_line > chart.lower_control_limit);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct XBarRChart {
    subgroup_size: usize,
    spec_limits: Option<SpecificationLimits>,
}

impl XBarRChart {
    /// Builder for subgroups of `subgroup_size` observations.
    ///
    /// Sizes above 10 use the n = 10 factor row.
    ///
    /// # Errors
    ///
    /// [`crate::AnalysisError::InvalidParameter`] when `subgroup_size < 2`.
    pub fn new(subgroup_size: usize) -> Result<Self> {
        factors(subgroup_size)?;
        Ok(Self {
            subgroup_size,
            spec_limits: None,
        })
    }

    /// Attaches specification limits; the chart then carries capability.
    pub fn with_spec_limits(mut self, limits: SpecificationLimits) -> Self {
        self.spec_limits = Some(limits);
        self
    }

    pub fn subgroup_size(&self) -> usize {
        self.subgroup_size
    }

    /// Builds the chart from complete subgroups.
    ///
    /// # Errors
    ///
    /// - [`crate::AnalysisError::InsufficientData`] for fewer than 2 subgroups.
    /// - [`crate::AnalysisError::DimensionMismatch`] if a subgroup's length differs
    ///   from the configured size.
    /// - [`crate::AnalysisError::InvalidParameter`] for non-finite values.
    /// - [`crate::AnalysisError::DegenerateData`] when every subgroup has zero range.
    /// - Capability errors when specification limits are attached.
    pub fn build(&self, subgroups: &[Vec<f64>]) -> Result<QualityControlChart> {
        self.build_inner(subgroups, None)
    }

    /// [`XBarRChart::build`] with one timestamp per subgroup.
    ///
    /// # Errors
    ///
    /// As [`XBarRChart::build`], plus [`crate::AnalysisError::DimensionMismatch`]
    /// when the timestamp count differs from the subgroup count.
    pub fn build_at(
        &self,
        subgroups: &[Vec<f64>],
        timestamps: &[DateTime<Utc>],
    ) -> Result<QualityControlChart> {
        require_same_len(subgroups.len(), timestamps.len())?;
        self.build_inner(subgroups, Some(timestamps))
    }

    fn build_inner(
        &self,
        subgroups: &[Vec<f64>],
        timestamps: Option<&[DateTime<Utc>]>,
    ) -> Result<QualityControlChart> {
        require_len("x-bar/r chart", subgroups.len(), 2)?;
        let f = factors(self.subgroup_size)?;

        let mut means = Vec::with_capacity(subgroups.len());
        let mut ranges = Vec::with_capacity(subgroups.len());
        for subgroup in subgroups {
            require_same_len(self.subgroup_size, subgroup.len())?;
            stats::ensure_finite("x-bar/r chart", subgroup)?;
            let (min, max) = stats::min_max(subgroup)?;
            means.push(stats::mean(subgroup)?);
            ranges.push(max - min);
        }

        let grand_mean = stats::mean(&means)?;
        let r_bar = stats::mean(&ranges)?;
        if r_bar == 0.0 {
            return Err(AnalysisError::DegenerateData {
                analysis: "x-bar/r chart",
            });
        }

        let xbar_limits = ControlLimits {
            ucl: grand_mean + f.a2 * r_bar,
            cl: grand_mean,
            lcl: grand_mean - f.a2 * r_bar,
        };
        let r_limits = ControlLimits {
            ucl: f.d4 * r_bar,
            cl: r_bar,
            lcl: f.d3 * r_bar,
        };

        let all: Vec<f64> = subgroups.iter().flatten().copied().collect();
        assemble(ChartInput {
            chart_type: ChartType::XBarR,
            values: &means,
            limits: xbar_limits,
            dispersion: &ranges,
            dispersion_limits: r_limits,
            dispersion_offset: 1,
            subgroup_size: Some(self.subgroup_size),
            timestamps,
            sigma_estimate: r_bar / f.d2,
            raw: &all,
            spec_limits: self.spec_limits,
        })
    }
}

impl Default for XBarRChart {
    fn default() -> Self {
        Self {
            subgroup_size: DEFAULT_SUBGROUP_SIZE,
            spec_limits: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Individual-MR Chart
// ---------------------------------------------------------------------------

/// Individuals and Moving-Range chart builder.
///
/// # Algorithm
///
/// 1. Moving ranges MRᵢ = |xᵢ − xᵢ₋₁|.
/// 2. Individuals limits: x̄ ± 2.66·MR̄.
/// 3. MR limits: [0, 3.267·MR̄].
/// 4. Short-term sigma: MR̄ / 1.128.
///
/// # Examples
///
/// ```
/// use lab_analytics::spc::IndividualMRChart;
///
/// let chart = IndividualMRChart::new()
///     .build(&[10.0, 10.2, 9.8, 10.1, 9.9, 10.3, 9.7, 10.0])
///     .unwrap();
/// assert!(chart.is_in_control());
/// assert_eq!(chart.dispersion.points.len(), 7);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndividualMRChart {
    spec_limits: Option<SpecificationLimits>,
}

impl IndividualMRChart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches specification limits; the chart then carries capability.
    pub fn with_spec_limits(mut self, limits: SpecificationLimits) -> Self {
        self.spec_limits = Some(limits);
        self
    }

    /// Builds the chart from an ordered stream.
    ///
    /// # Errors
    ///
    /// - [`crate::AnalysisError::InsufficientData`] for fewer than 2 values.
    /// - [`crate::AnalysisError::InvalidParameter`] for non-finite values.
    /// - [`crate::AnalysisError::DegenerateData`] when every moving range is zero.
    /// - Capability errors when specification limits are attached.
    pub fn build(&self, values: &[f64]) -> Result<QualityControlChart> {
        self.build_inner(values, None)
    }

    /// [`IndividualMRChart::build`] with one timestamp per value.
    ///
    /// # Errors
    ///
    /// As [`IndividualMRChart::build`], plus
    /// [`crate::AnalysisError::DimensionMismatch`] for a timestamp count mismatch.
    pub fn build_at(
        &self,
        values: &[f64],
        timestamps: &[DateTime<Utc>],
    ) -> Result<QualityControlChart> {
        require_same_len(values.len(), timestamps.len())?;
        self.build_inner(values, Some(timestamps))
    }

    fn build_inner(
        &self,
        values: &[f64],
        timestamps: Option<&[DateTime<Utc>]>,
    ) -> Result<QualityControlChart> {
        require_len("individuals chart", values.len(), 2)?;
        stats::ensure_finite("individuals chart", values)?;

        let moving_ranges: Vec<f64> = values.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
        let x_bar = stats::mean(values)?;
        let mr_bar = stats::mean(&moving_ranges)?;
        if mr_bar == 0.0 {
            return Err(AnalysisError::DegenerateData {
                analysis: "individuals chart",
            });
        }

        let i_limits = ControlLimits {
            ucl: x_bar + E2 * mr_bar,
            cl: x_bar,
            lcl: x_bar - E2 * mr_bar,
        };
        let mr_limits = ControlLimits {
            ucl: D4_MR * mr_bar,
            cl: mr_bar,
            lcl: 0.0,
        };

        assemble(ChartInput {
            chart_type: ChartType::IndividualsMovingRange,
            values,
            limits: i_limits,
            dispersion: &moving_ranges,
            dispersion_limits: mr_limits,
            // MR₁ belongs to the second observation
            dispersion_offset: 2,
            subgroup_size: None,
            timestamps,
            sigma_estimate: mr_bar / D2_MR,
            raw: values,
            spec_limits: self.spec_limits,
        })
    }
}

/// Splits a stream into consecutive subgroups of `size`.
///
/// A trailing partial subgroup is dropped; `size == 0` yields nothing.
///
/// ```
/// use lab_analytics::spc::subgroups;
///
/// let groups = subgroups(&[1.0, 2.0, 3.0, 4.0, 5.0], 2);
/// assert_eq!(groups, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
/// ```
pub fn subgroups(values: &[f64], size: usize) -> Vec<Vec<f64>> {
    if size == 0 {
        return Vec::new();
    }
    values.chunks_exact(size).map(<[f64]>::to_vec).collect()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct ChartInput<'a> {
    chart_type: ChartType,
    values: &'a [f64],
    limits: ControlLimits,
    dispersion: &'a [f64],
    dispersion_limits: ControlLimits,
    /// 1-based index of the first dispersion point.
    dispersion_offset: usize,
    subgroup_size: Option<usize>,
    timestamps: Option<&'a [DateTime<Utc>]>,
    sigma_estimate: f64,
    raw: &'a [f64],
    spec_limits: Option<SpecificationLimits>,
}

fn assemble(input: ChartInput<'_>) -> Result<QualityControlChart> {
    let main_rules = evaluate(input.values, &input.limits);
    let dispersion_rules = evaluate_rules(
        input.dispersion,
        &input.dispersion_limits,
        &[WesternElectricRule::BeyondLimits],
    );

    let points = annotate(
        input.values,
        &input.limits,
        &main_rules,
        1,
        input.subgroup_size,
        input.timestamps,
    );
    let dispersion_points = annotate(
        input.dispersion,
        &input.dispersion_limits,
        &dispersion_rules,
        input.dispersion_offset,
        input.subgroup_size,
        input.timestamps,
    );

    let capability = match input.spec_limits {
        Some(limits) => Some(compute_capability(
            input.raw,
            input.limits.cl,
            input.sigma_estimate,
            &limits,
        )?),
        None => None,
    };

    let mut recommendations = interpret_rules(&main_rules.summary.triggered);
    if dispersion_rules.summary.any() {
        recommendations.push(DISPERSION_OUT.to_string());
    }
    if recommendations.is_empty() {
        recommendations.push(IN_CONTROL.to_string());
    }
    if let Some(c) = &capability {
        recommendations.extend(c.recommendations());
    }

    Ok(QualityControlChart {
        chart_type: input.chart_type,
        center_line: input.limits.cl,
        upper_control_limit: input.limits.ucl,
        lower_control_limit: input.limits.lcl,
        spec_limits: input.spec_limits,
        points,
        dispersion: DispersionChart {
            limits: input.dispersion_limits,
            points: dispersion_points,
        },
        sigma_estimate: input.sigma_estimate,
        rule_summary: main_rules.summary,
        capability,
        recommendations,
    })
}

/// Builds chart points. Only a point outside `limits` is out of control;
/// pattern rules are listed on the point without flagging it.
fn annotate(
    values: &[f64],
    limits: &ControlLimits,
    evaluation: &RuleEvaluation,
    first_index: usize,
    subgroup_size: Option<usize>,
    timestamps: Option<&[DateTime<Utc>]>,
) -> Vec<QualityControlPoint> {
    values
        .iter()
        .zip(&evaluation.per_point)
        .enumerate()
        .map(|(i, (&value, rules))| {
            let index = i + first_index;
            QualityControlPoint {
                index,
                value,
                subgroup_size,
                out_of_control: !limits.contains(value),
                rules: rules.clone(),
                timestamp: timestamps.and_then(|ts| ts.get(index - 1).copied()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::CapabilityRating;
    use crate::AnalysisError;
    use chrono::TimeZone;

    fn example_subgroups() -> Vec<Vec<f64>> {
        vec![
            vec![10.0, 11.0, 9.0, 10.0, 12.0],
            vec![11.0, 10.0, 10.0, 9.0, 11.0],
            vec![12.0, 11.0, 10.0, 11.0, 10.0],
        ]
    }

    // -----------------------------------------------------------------------
    // X-bar/R
    // -----------------------------------------------------------------------

    #[test]
    fn xbar_r_reference_scenario() {
        let chart = XBarRChart::new(5).unwrap().build(&example_subgroups()).unwrap();
        // Subgroup means 10.4, 10.2, 10.8; ranges 3, 2, 2
        let grand_mean = (10.4 + 10.2 + 10.8) / 3.0;
        let r_bar = 7.0 / 3.0;
        assert_eq!(chart.chart_type, ChartType::XBarR);
        assert!((chart.center_line - grand_mean).abs() < 1e-12);
        assert!((chart.upper_control_limit - (grand_mean + 0.577 * r_bar)).abs() < 1e-12);
        assert!((chart.lower_control_limit - (grand_mean - 0.577 * r_bar)).abs() < 1e-12);
        assert!((chart.dispersion.limits.cl - r_bar).abs() < 1e-12);
        assert!((chart.dispersion.limits.ucl - 2.114 * r_bar).abs() < 1e-12);
        assert_eq!(chart.dispersion.limits.lcl, 0.0);
        assert!((chart.sigma_estimate - r_bar / 2.326).abs() < 1e-12);
        assert!(chart.is_in_control());
        assert_eq!(chart.recommendations, vec![IN_CONTROL.to_string()]);
    }

    #[test]
    fn xbar_r_points_are_one_based() {
        let chart = XBarRChart::default().build(&example_subgroups()).unwrap();
        let indices: Vec<usize> = chart.points.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert!(chart.points.iter().all(|p| p.subgroup_size == Some(5)));
        assert!((chart.points[0].value - 10.4).abs() < 1e-12);
        assert_eq!(chart.dispersion.points[0].value, 3.0);
    }

    #[test]
    fn xbar_r_flags_shifted_subgroup() {
        let mut groups: Vec<Vec<f64>> = (0..10)
            .map(|i| {
                let o = (i % 3) as f64 * 0.1;
                vec![10.0 + o, 10.5, 9.5, 10.2 - o, 9.8]
            })
            .collect();
        groups.push(vec![20.0, 20.5, 19.5, 20.2, 19.8]);
        let chart = XBarRChart::new(5).unwrap().build(&groups).unwrap();
        let last = chart.points.last().unwrap();
        assert!(last.out_of_control);
        assert!(last.rules.contains(&WesternElectricRule::BeyondLimits));
        assert!(!chart.is_in_control());
        assert!(chart.recommendations[0].starts_with("Rule 1"));
    }

    #[test]
    fn xbar_r_errors() {
        let chart = XBarRChart::new(5).unwrap();
        assert!(matches!(
            chart.build(&[]),
            Err(AnalysisError::InsufficientData { required: 2, actual: 0, .. })
        ));
        assert!(matches!(
            chart.build(&[vec![1.0, 2.0, 3.0, 4.0, 5.0]]),
            Err(AnalysisError::InsufficientData { .. })
        ));
        assert!(matches!(
            chart.build(&[vec![1.0; 5], vec![1.0; 4]]),
            Err(AnalysisError::DimensionMismatch { expected: 5, actual: 4 })
        ));
        assert!(matches!(
            chart.build(&[vec![1.0; 5], vec![1.0, 2.0, f64::NAN, 4.0, 5.0]]),
            Err(AnalysisError::InvalidParameter(_))
        ));
        assert!(XBarRChart::new(1).is_err());
    }

    #[test]
    fn xbar_r_large_subgroups_use_last_row() {
        let groups: Vec<Vec<f64>> = (0..3)
            .map(|g| (0..12).map(|i| (i + g) as f64).collect())
            .collect();
        let chart = XBarRChart::new(12).unwrap().build(&groups).unwrap();
        let r_bar = 11.0;
        assert!((chart.upper_control_limit - chart.center_line - 0.308 * r_bar).abs() < 1e-12);
    }

    #[test]
    fn xbar_r_with_capability() {
        let limits = SpecificationLimits::new(Some(5.0), Some(16.0)).unwrap();
        let chart = XBarRChart::new(5)
            .unwrap()
            .with_spec_limits(limits)
            .build(&example_subgroups())
            .unwrap();
        let cap = chart.capability.as_ref().unwrap();
        assert!((cap.center - chart.center_line).abs() < 1e-12);
        assert!((cap.sigma_within - chart.sigma_estimate).abs() < 1e-12);
        let expected_cp = 11.0 / (6.0 * chart.sigma_estimate);
        assert!((cap.cp.unwrap() - expected_cp).abs() < 1e-12);
        assert_eq!(chart.spec_limits, Some(limits));
        assert_eq!(cap.rating, CapabilityRating::from_cpk(cap.cpk));
        assert!(chart.recommendations.len() >= 2);
    }

    #[test]
    fn xbar_r_timestamps() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let ts: Vec<DateTime<Utc>> = (0..3).map(|h| t0 + chrono::Duration::hours(h)).collect();
        let chart = XBarRChart::default().build_at(&example_subgroups(), &ts).unwrap();
        assert_eq!(chart.points[2].timestamp, Some(ts[2]));
        assert!(XBarRChart::default()
            .build_at(&example_subgroups(), &ts[..2])
            .is_err());
    }

    // -----------------------------------------------------------------------
    // Individuals/MR
    // -----------------------------------------------------------------------

    #[test]
    fn imr_limits() {
        let values = [10.0, 12.0, 11.0, 13.0, 12.0];
        let chart = IndividualMRChart::new().build(&values).unwrap();
        // MR = 2, 1, 2, 1 → MR̄ = 1.5; x̄ = 11.6
        assert_eq!(chart.chart_type, ChartType::IndividualsMovingRange);
        assert!((chart.center_line - 11.6).abs() < 1e-12);
        assert!((chart.upper_control_limit - (11.6 + 2.66 * 1.5)).abs() < 1e-12);
        assert!((chart.lower_control_limit - (11.6 - 2.66 * 1.5)).abs() < 1e-12);
        assert!((chart.dispersion.limits.ucl - 3.267 * 1.5).abs() < 1e-12);
        assert_eq!(chart.dispersion.limits.lcl, 0.0);
        assert!((chart.sigma_estimate - 1.5 / 1.128).abs() < 1e-12);
    }

    #[test]
    fn imr_moving_range_indices() {
        let chart = IndividualMRChart::new().build(&[1.0, 2.0, 4.0]).unwrap();
        let idx: Vec<usize> = chart.dispersion.points.iter().map(|p| p.index).collect();
        assert_eq!(idx, vec![2, 3]);
        assert!(chart.points.iter().all(|p| p.subgroup_size.is_none()));
    }

    #[test]
    fn imr_point_beyond_ucl() {
        let mut values = vec![10.0, 10.2, 9.8, 10.1, 9.9, 10.0, 10.1, 9.9, 10.0, 10.2];
        values.push(15.0);
        let chart = IndividualMRChart::new().build(&values).unwrap();
        let last = chart.points.last().unwrap();
        assert!(last.value > chart.upper_control_limit);
        assert!(last.out_of_control);
        assert!(last.rules.contains(&WesternElectricRule::BeyondLimits));
        // The jump also blows the MR chart
        assert!(chart.dispersion.points.last().unwrap().out_of_control);
        assert!(chart.recommendations.iter().any(|r| r == DISPERSION_OUT));
    }

    #[test]
    fn imr_pattern_rules_do_not_flag_points_inside_limits() {
        let values = [5.0, 10.2, 10.3, 10.1, 10.4, 10.2, 10.3, 10.1, 10.2, 10.3];
        let chart = IndividualMRChart::new().build(&values).unwrap();
        let limits = chart.limits();

        // Points 2..=9 sit above the center line, so rule 4 completes on 9 and 10
        for p in &chart.points[8..] {
            assert!(limits.contains(p.value));
            assert_eq!(p.rules, vec![WesternElectricRule::EightSameSide]);
            assert!(!p.out_of_control);
        }
        let flagged: Vec<usize> = chart.out_of_control_points().map(|p| p.index).collect();
        assert_eq!(flagged, vec![1]);
        assert!(chart
            .rule_summary
            .is_triggered(WesternElectricRule::EightSameSide));
    }

    #[test]
    fn imr_trend_inside_limits_stays_in_control() {
        let values = [9.0, 11.0, 9.0, 11.0, 9.4, 9.6, 9.8, 10.0, 10.2, 10.4];
        let chart = IndividualMRChart::new().build(&values).unwrap();
        assert_eq!(chart.rule_summary.triggered, vec![WesternElectricRule::SixTrend]);
        assert_eq!(chart.points[9].rules, vec![WesternElectricRule::SixTrend]);
        assert!(chart.points.iter().all(|p| !p.out_of_control));
        assert!(chart.is_in_control());
        assert!(chart.recommendations[0].starts_with("Rule 5"));
    }

    #[test]
    fn constant_data_is_degenerate() {
        let groups = vec![vec![7.0; 5], vec![7.0; 5], vec![7.0; 5]];
        assert!(matches!(
            XBarRChart::default().build(&groups),
            Err(AnalysisError::DegenerateData {
                analysis: "x-bar/r chart"
            })
        ));
        assert!(matches!(
            IndividualMRChart::new().build(&[7.0; 15]),
            Err(AnalysisError::DegenerateData {
                analysis: "individuals chart"
            })
        ));
    }

    #[test]
    fn imr_errors() {
        assert!(matches!(
            IndividualMRChart::new().build(&[1.0]),
            Err(AnalysisError::InsufficientData { required: 2, actual: 1, .. })
        ));
        assert!(IndividualMRChart::new().build(&[1.0, f64::INFINITY]).is_err());
    }

    #[test]
    fn imr_constant_data_with_limits_is_degenerate() {
        let limits = SpecificationLimits::new(Some(0.0), Some(10.0)).unwrap();
        let result = IndividualMRChart::new()
            .with_spec_limits(limits)
            .build(&[5.0, 5.0, 5.0, 5.0]);
        assert!(matches!(result, Err(AnalysisError::DegenerateData { .. })));
    }

    #[test]
    fn subgroup_helper() {
        assert_eq!(subgroups(&[1.0, 2.0, 3.0], 3), vec![vec![1.0, 2.0, 3.0]]);
        assert!(subgroups(&[1.0, 2.0], 3).is_empty());
        assert!(subgroups(&[1.0, 2.0], 0).is_empty());
    }
}
