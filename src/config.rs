//! Analysis configuration.
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration. Example:
//!
//! ```toml
//! subgroup_size = 4
//! significance_level = 0.01
//!
//! [specification_limits.heart_rate]
//! lsl = 50.0
//! usl = 100.0
//!
//! [specification_limits.glucose]
//! usl = 7.8
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::capability::SpecificationLimits;
use crate::error::{AnalysisError, Result};
use crate::normality::DEFAULT_NORMALITY_THRESHOLD;
use crate::spc::DEFAULT_SUBGROUP_SIZE;
use crate::testing::DEFAULT_SIGNIFICANCE_LEVEL;
use crate::trend::MIN_TREND_POINTS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Observations per X-bar/R subgroup.
    pub subgroup_size: usize,
    /// Alpha for t-tests.
    pub significance_level: f64,
    /// Minimum normality score treated as normal.
    pub normality_threshold: f64,
    /// Minimum points before a trend is classified (at least 3).
    pub min_trend_points: usize,
    /// Per-parameter specification limits.
    pub specification_limits: BTreeMap<String, SpecificationLimits>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            subgroup_size: DEFAULT_SUBGROUP_SIZE,
            significance_level: DEFAULT_SIGNIFICANCE_LEVEL,
            normality_threshold: DEFAULT_NORMALITY_THRESHOLD,
            min_trend_points: MIN_TREND_POINTS,
            specification_limits: BTreeMap::new(),
        }
    }
}

impl AnalysisConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::Config`] for malformed TOML, or any
    /// [`AnalysisConfig::validate`] error.
    ///
    /// # Examples
    ///
    /// ```
    /// use lab_analytics::config::AnalysisConfig;
    ///
    /// let cfg = AnalysisConfig::from_toml_str("subgroup_size = 3").unwrap();
    /// assert_eq!(cfg.subgroup_size, 3);
    /// assert_eq!(cfg.significance_level, 0.05);
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| AnalysisError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::Config`] when the file cannot be read or parsed, or
    /// any [`AnalysisConfig::validate`] error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            warn!(path = %path.display(), error = %e, "Failed to read analysis config");
            AnalysisError::Config(format!("{}: {e}", path.display()))
        })?;
        let config = Self::from_toml_str(&contents).inspect_err(|e| {
            warn!(path = %path.display(), error = %e, "Invalid analysis config");
        })?;
        info!(
            path = %path.display(),
            subgroup_size = config.subgroup_size,
            parameters_with_limits = config.specification_limits.len(),
            "Loaded analysis config"
        );
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::InvalidParameter`] for a subgroup size below 2, a
    ///   significance level or normality threshold outside (0, 1), or fewer
    ///   than 3 trend points.
    /// - [`AnalysisError::InvalidSpecification`] for bad limits.
    pub fn validate(&self) -> Result<()> {
        if self.subgroup_size < 2 {
            return Err(AnalysisError::InvalidParameter(format!(
                "subgroup_size must be at least 2, got {}",
                self.subgroup_size
            )));
        }
        for (name, value) in [
            ("significance_level", self.significance_level),
            ("normality_threshold", self.normality_threshold),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(AnalysisError::InvalidParameter(format!(
                    "{name} must be in (0, 1), got {value}"
                )));
            }
        }
        if self.min_trend_points < MIN_TREND_POINTS {
            return Err(AnalysisError::InvalidParameter(format!(
                "min_trend_points must be at least {MIN_TREND_POINTS}, got {}",
                self.min_trend_points
            )));
        }
        for limits in self.specification_limits.values() {
            limits.validate()?;
        }
        Ok(())
    }

    /// Limits configured for `parameter`.
    pub fn limits_for(&self, parameter: &str) -> Option<&SpecificationLimits> {
        self.specification_limits.get(parameter)
    }
}
