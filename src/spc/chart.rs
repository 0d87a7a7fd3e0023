//! Control chart result types.
//!
//! A built chart is an immutable value: the primary (X-bar or individuals)
//! series with its limits, the paired dispersion (R or MR) series, the rule
//! annotations, and optional capability.
//!
//! # References
//!
//! - Montgomery, D.C. (2019). *Introduction to Statistical Quality Control*, 8th ed.
//! - ASTM E2587, Standard Practice for Use of Control Charts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::rules::{RuleSummary, WesternElectricRule};
use crate::capability::{ProcessCapability, SpecificationLimits};

/// Control limits for one chart series.
///
/// # Invariants
///
/// - `lcl <= cl <= ucl`
/// - All values are finite
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlLimits {
    /// Upper control limit.
    pub ucl: f64,
    /// Center line.
    pub cl: f64,
    /// Lower control limit.
    pub lcl: f64,
}

impl ControlLimits {
    /// Whether `value` lies within `[lcl, ucl]`.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lcl && value <= self.ucl
    }
}

/// Chart family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChartType {
    /// Subgroup means with subgroup ranges.
    #[serde(rename = "xbar-r")]
    XBarR,
    /// Individual values with moving ranges.
    #[serde(rename = "x-mr")]
    IndividualsMovingRange,
}

/// One plotted statistic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityControlPoint {
    /// 1-based position in the series.
    pub index: usize,
    pub value: f64,
    /// Observations behind the point; `None` for individual values.
    pub subgroup_size: Option<usize>,
    pub out_of_control: bool,
    /// Rules completed at this point.
    pub rules: Vec<WesternElectricRule>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// The R or MR companion chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispersionChart {
    pub limits: ControlLimits,
    pub points: Vec<QualityControlPoint>,
}

/// A fully built Shewhart chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityControlChart {
    pub chart_type: ChartType,
    pub center_line: f64,
    pub upper_control_limit: f64,
    pub lower_control_limit: f64,
    pub spec_limits: Option<SpecificationLimits>,
    pub points: Vec<QualityControlPoint>,
    pub dispersion: DispersionChart,
    /// Short-term sigma: R̄/d2 or MR̄/1.128.
    pub sigma_estimate: f64,
    pub rule_summary: RuleSummary,
    pub capability: Option<ProcessCapability>,
    pub recommendations: Vec<String>,
}

impl QualityControlChart {
    pub fn limits(&self) -> ControlLimits {
        ControlLimits {
            ucl: self.upper_control_limit,
            cl: self.center_line,
            lcl: self.lower_control_limit,
        }
    }

    /// No point on either series is out of control.
    pub fn is_in_control(&self) -> bool {
        !self
            .points
            .iter()
            .chain(&self.dispersion.points)
            .any(|p| p.out_of_control)
    }

    /// Out-of-control points of the primary series.
    pub fn out_of_control_points(&self) -> impl Iterator<Item = &QualityControlPoint> {
        self.points.iter().filter(|p| p.out_of_control)
    }
}
