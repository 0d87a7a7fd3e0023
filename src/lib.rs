//! # lab-analytics
//!
//! Statistical analysis and quality control for laboratory study
//! measurements.
//!
//! The crate turns raw numeric measurements into descriptive statistics,
//! normality diagnostics, correlation and regression results, two-sample
//! comparisons, Shewhart control charts with Western Electric pattern
//! detection, process capability indices, and trend classifications. Every
//! analysis is a pure function of its input; nothing is retained between
//! calls.
//!
//! ## Modules
//!
//! - [`preparation`]: validate and group tagged measurements per parameter
//! - [`descriptive`]: summary statistics, quantiles, shape, outliers
//! - [`normality`]: moment-based normality approximation and Jarque–Bera
//! - [`correlation`]: Pearson correlation with significance
//! - [`regression`]: simple least-squares regression
//! - [`testing`]: pooled two-sample t-test with Cohen's d
//! - [`spc`]: X̄-R and I-MR control charts with the eight Western Electric rules
//! - [`capability`]: Cp, Cpk, Pp, Ppk and sigma level
//! - [`trend`]: linear trend classification and run checks
//! - [`engine`]: parallel batch analysis over many parameters
//! - [`config`]: TOML configuration
//!
//! ## Design Philosophy
//!
//! - **Pure computation**: no I/O except [`config::AnalysisConfig::load`]
//! - **Explicit failures**: degenerate input returns an [`AnalysisError`]
//!   instead of NaN or infinity
//! - **Research-backed**: algorithms cite their references

pub mod capability;
pub mod config;
pub mod correlation;
pub mod descriptive;
pub mod engine;
pub mod error;
pub mod normality;
pub mod preparation;
pub mod regression;
pub mod spc;
pub mod special;
pub mod stats;
pub mod testing;
pub mod trend;

pub use error::{AnalysisError, Result};
