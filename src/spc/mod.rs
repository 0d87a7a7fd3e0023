//! Statistical Process Control (SPC) charts.
//!
//! # Variables Charts
//!
//! - [`XBarRChart`]: X-bar and Range chart for subgrouped data
//! - [`IndividualMRChart`]: Individuals and Moving-Range chart for a single stream
//!
//! # Run Rules
//!
//! - [`WesternElectricRule`]: the eight zone tests, applied by [`evaluate`]
//! - [`interpret_rules`]: explanations for triggered rules
//!
//! # References
//!
//! - Montgomery, D.C. (2019). *Introduction to Statistical Quality Control*, 8th ed.
//! - ASTM E2587, Standard Practice for Use of Control Charts
//! - Western Electric (1956). *Statistical Quality Control Handbook*.

mod chart;
mod factors;
mod rules;
mod variables;

pub use chart::{
    ChartType, ControlLimits, DispersionChart, QualityControlChart, QualityControlPoint,
};
pub use factors::{factors, ControlChartFactors, D2_MR, D4_MR, E2, MAX_TABULATED_SIZE};
pub use rules::{
    evaluate, evaluate_rules, interpret_rules, RuleEvaluation, RuleSummary, WesternElectricRule,
};
pub use variables::{subgroups, IndividualMRChart, XBarRChart, DEFAULT_SUBGROUP_SIZE};
