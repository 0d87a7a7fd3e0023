//! Batch analysis across parameters.
//!
//! [`AnalysisEngine`] runs the full per-parameter pipeline: preparation,
//! descriptive summary, control chart (with capability when limits are
//! configured) and trend. Parameters are independent, so they are analyzed
//! in parallel with rayon. A failing analysis is recorded on its parameter's
//! report and never aborts the batch.
//!
//! # Examples
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use lab_analytics::engine::AnalysisEngine;
//! use lab_analytics::preparation::{Measurement, MeasurementCategory};
//!
//! let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
//! let values = [72.0, 74.0, 71.0, 73.0, 75.0, 72.0, 70.0, 74.0];
//! let measurements: Vec<Measurement> = values
//!     .iter()
//!     .enumerate()
//!     .map(|(i, &v)| {
//!         Measurement::new("heart_rate", v, MeasurementCategory::Physiological, "s1",
//!             t0 + Duration::minutes(i as i64))
//!     })
//!     .collect();
//!
//! let report = AnalysisEngine::default().analyze(&measurements);
//! let hr = &report.parameters["heart_rate"];
//! assert_eq!(hr.summary.as_ref().unwrap().count, 8);
//! assert!(hr.chart.is_some());
//! assert!(hr.failures.is_empty());
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span};

use crate::config::AnalysisConfig;
use crate::descriptive::{describe_with_threshold, StatisticalSummary};
use crate::error::Result;
use crate::preparation::{
    prepare, DataQualityIssue, Measurement, MeasurementCategory, ParameterSample,
};
use crate::spc::{subgroups, IndividualMRChart, QualityControlChart, XBarRChart};
use crate::testing::{two_sample_t_test_with_alpha, TTestResult};
use crate::trend::{analyze_trend_with_min_points, TimeSeriesPoint, TrendResult};

/// Stage of the per-parameter pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStage {
    Summary,
    ControlChart,
    Trend,
}

/// A stage that could not be computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisFailure {
    pub stage: AnalysisStage,
    pub message: String,
}

/// Everything computed for one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterReport {
    pub parameter_name: String,
    pub category: MeasurementCategory,
    pub unit: Option<String>,
    pub summary: Option<StatisticalSummary>,
    pub chart: Option<QualityControlChart>,
    pub trend: Option<TrendResult>,
    pub failures: Vec<AnalysisFailure>,
}

/// Result of [`AnalysisEngine::analyze`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub parameters: BTreeMap<String, ParameterReport>,
    pub issues: Vec<DataQualityIssue>,
    pub total_measurements: usize,
    pub excluded_measurements: usize,
}

impl AnalysisReport {
    /// Parameters whose chart shows special-cause variation.
    pub fn out_of_control_parameters(&self) -> Vec<&str> {
        self.parameters
            .values()
            .filter(|r| r.chart.as_ref().is_some_and(|c| !c.is_in_control()))
            .map(|r| r.parameter_name.as_str())
            .collect()
    }
}

/// Stateless analysis pipeline driven by an [`AnalysisConfig`].
#[derive(Debug, Clone, Default)]
pub struct AnalysisEngine {
    config: AnalysisConfig,
}

impl AnalysisEngine {
    /// # Errors
    ///
    /// Any [`AnalysisConfig::validate`] error.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Prepares `measurements` and analyzes every parameter in parallel.
    pub fn analyze(&self, measurements: &[Measurement]) -> AnalysisReport {
        let prepared = prepare(measurements);
        let samples: Vec<&ParameterSample> = prepared.parameters.values().collect();

        let parameters: BTreeMap<String, ParameterReport> = samples
            .par_iter()
            .map(|sample| (sample.parameter_name.clone(), self.analyze_parameter(sample)))
            .collect();

        let failed = parameters.values().filter(|r| !r.failures.is_empty()).count();
        info!(
            parameters = parameters.len(),
            failed,
            excluded = prepared.excluded,
            "Analysis batch complete"
        );

        AnalysisReport {
            parameters,
            issues: prepared.issues,
            total_measurements: prepared.total,
            excluded_measurements: prepared.excluded,
        }
    }

    /// Runs summary, chart and trend for one prepared sample.
    pub fn analyze_parameter(&self, sample: &ParameterSample) -> ParameterReport {
        let name = sample.parameter_name.as_str();
        let _span = info_span!("parameter", name).entered();
        let mut failures = Vec::new();

        let summary = record(
            &mut failures,
            AnalysisStage::Summary,
            describe_with_threshold(name, &sample.values, self.config.normality_threshold),
        );
        let chart = record(&mut failures, AnalysisStage::ControlChart, self.chart(sample));
        let trend = record(&mut failures, AnalysisStage::Trend, self.trend(sample));

        if let Some(c) = &chart {
            if c.is_in_control() && !c.rule_summary.any() {
                debug!(chart = ?c.chart_type, "Process in control");
            } else if c.is_in_control() {
                info!(
                    chart = ?c.chart_type,
                    rules = ?c.rule_summary.triggered,
                    "Pattern signals within control limits"
                );
            } else {
                info!(
                    chart = ?c.chart_type,
                    rules = ?c.rule_summary.triggered,
                    "Process out of control"
                );
            }
            if let Some(cap) = &c.capability {
                debug!(cpk = cap.cpk, rating = ?cap.rating, "Capability computed");
            }
        }

        ParameterReport {
            parameter_name: sample.parameter_name.clone(),
            category: sample.category,
            unit: sample.unit.clone(),
            summary,
            chart,
            trend,
            failures,
        }
    }

    /// Two-sample t-test at the configured significance level.
    ///
    /// # Errors
    ///
    /// See [`crate::testing::two_sample_t_test`].
    pub fn compare(&self, a: &[f64], b: &[f64]) -> Result<TTestResult> {
        two_sample_t_test_with_alpha(a, b, self.config.significance_level)
    }

    /// X-bar/R when there are at least two full subgroups, I-MR otherwise.
    fn chart(&self, sample: &ParameterSample) -> Result<QualityControlChart> {
        let size = self.config.subgroup_size;
        let limits = self.config.limits_for(&sample.parameter_name).copied();

        if sample.len() / size >= 2 {
            let mut builder = XBarRChart::new(size)?;
            if let Some(l) = limits {
                builder = builder.with_spec_limits(l);
            }
            let groups = subgroups(&sample.values, size);
            let starts: Vec<DateTime<Utc>> = sample
                .timestamps
                .chunks_exact(size)
                .map(|c| c[0])
                .collect();
            builder.build_at(&groups, &starts)
        } else {
            let mut builder = IndividualMRChart::new();
            if let Some(l) = limits {
                builder = builder.with_spec_limits(l);
            }
            builder.build_at(&sample.values, &sample.timestamps)
        }
    }

    fn trend(&self, sample: &ParameterSample) -> Result<TrendResult> {
        let points: Vec<TimeSeriesPoint> = sample
            .timestamps
            .iter()
            .zip(&sample.values)
            .map(|(&t, &v)| TimeSeriesPoint::new(t, v))
            .collect();
        analyze_trend_with_min_points(
            &sample.parameter_name,
            &points,
            self.config.min_trend_points,
        )
    }
}

fn record<T>(
    failures: &mut Vec<AnalysisFailure>,
    stage: AnalysisStage,
    result: Result<T>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(?stage, error = %e, "Analysis stage skipped");
            failures.push(AnalysisFailure {
                stage,
                message: e.to_string(),
            });
            None
        }
    }
}
