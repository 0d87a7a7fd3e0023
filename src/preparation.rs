//! Measurement validation and grouping.
//!
//! Turns raw tagged measurements into one numeric sample per parameter.
//! Non-finite values never reach a calculation: they are excluded here and
//! the exclusion is reported as a [`DataQualityIssue`].
//!
//! # Examples
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use lab_analytics::preparation::{prepare, Measurement, MeasurementCategory};
//!
//! let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
//! let m = |v: f64| Measurement::new("heart_rate", v, MeasurementCategory::Physiological, "s1", at);
//!
//! let prepared = prepare(&[m(72.0), m(f64::NAN), m(75.0), m(71.0)]);
//! let sample = prepared.get("heart_rate").unwrap();
//! assert_eq!(sample.values, vec![72.0, 75.0, 71.0]);
//! assert_eq!(prepared.issues.len(), 1);
//! ```

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Smallest per-parameter sample the descriptive summary accepts.
pub const MIN_DESCRIPTIVE_VALUES: usize = 3;

/// Kind of quantity a measurement records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementCategory {
    Physiological,
    Biochemical,
    Behavioral,
    Cognitive,
    Environmental,
    Anthropometric,
    Other,
}

/// One recorded value taken during a study session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    pub parameter_name: String,
    pub value: f64,
    #[serde(default)]
    pub unit: Option<String>,
    pub category: MeasurementCategory,
    #[serde(default)]
    pub sample_id: Option<String>,
    pub session_id: String,
    pub measured_at: DateTime<Utc>,
    #[serde(default)]
    pub measured_by: String,
    #[serde(default)]
    pub uncertainty: Option<f64>,
}

impl Measurement {
    /// Creates a measurement with the optional fields left empty.
    pub fn new(
        parameter_name: impl Into<String>,
        value: f64,
        category: MeasurementCategory,
        session_id: impl Into<String>,
        measured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            parameter_name: parameter_name.into(),
            value,
            unit: None,
            category,
            sample_id: None,
            session_id: session_id.into(),
            measured_at,
            measured_by: String::new(),
            uncertainty: None,
        }
    }

    /// Sets the unit.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

/// Problems found while preparing measurements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DataQualityIssue {
    /// NaN or infinite values were dropped.
    NonFiniteExcluded { parameter: String, count: usize },
    /// The parameter was recorded in more than one unit.
    MixedUnits {
        parameter: String,
        units: Vec<String>,
    },
    /// The parameter was tagged with more than one category. The sample keeps
    /// the category of its first measurement.
    MixedCategories {
        parameter: String,
        categories: Vec<MeasurementCategory>,
    },
    /// Fewer finite values than a descriptive summary needs.
    TooFewValues {
        parameter: String,
        count: usize,
        required: usize,
    },
}

/// Finite values of one parameter, ordered by measurement time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSample {
    pub parameter_name: String,
    pub category: MeasurementCategory,
    pub unit: Option<String>,
    pub values: Vec<f64>,
    pub timestamps: Vec<DateTime<Utc>>,
}

impl ParameterSample {
    /// Number of finite values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the sample holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Output of [`prepare`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedData {
    /// One sample per parameter name, in name order.
    pub parameters: BTreeMap<String, ParameterSample>,
    pub issues: Vec<DataQualityIssue>,
    /// Measurements received.
    pub total: usize,
    /// Measurements dropped as non-finite.
    pub excluded: usize,
}

impl PreparedData {
    /// Sample for a parameter name.
    pub fn get(&self, parameter: &str) -> Option<&ParameterSample> {
        self.parameters.get(parameter)
    }

    /// Samples grouped by category.
    pub fn by_category(&self) -> BTreeMap<MeasurementCategory, Vec<&ParameterSample>> {
        let mut groups: BTreeMap<MeasurementCategory, Vec<&ParameterSample>> = BTreeMap::new();
        for sample in self.parameters.values() {
            groups.entry(sample.category).or_default().push(sample);
        }
        groups
    }
}

#[derive(Default)]
struct Accumulator<'a> {
    category: Option<MeasurementCategory>,
    categories: BTreeSet<MeasurementCategory>,
    finite: Vec<&'a Measurement>,
    non_finite: usize,
    units: BTreeSet<String>,
}

/// Validates measurements and groups them by parameter name.
///
/// The input is not modified. Values within a parameter are stably ordered
/// by `measured_at`, so equal timestamps keep their input order.
pub fn prepare(measurements: &[Measurement]) -> PreparedData {
    let mut groups: BTreeMap<&str, Accumulator<'_>> = BTreeMap::new();

    for m in measurements {
        let acc = groups.entry(m.parameter_name.as_str()).or_default();
        acc.category.get_or_insert(m.category);
        acc.categories.insert(m.category);
        if let Some(unit) = &m.unit {
            acc.units.insert(unit.clone());
        }
        if m.value.is_finite() {
            acc.finite.push(m);
        } else {
            acc.non_finite += 1;
        }
    }

    let mut prepared = PreparedData {
        total: measurements.len(),
        ..PreparedData::default()
    };

    for (name, mut acc) in groups {
        if acc.non_finite > 0 {
            warn!(
                parameter = name,
                excluded = acc.non_finite,
                "Excluded non-finite measurement values"
            );
            prepared.excluded += acc.non_finite;
            prepared.issues.push(DataQualityIssue::NonFiniteExcluded {
                parameter: name.to_string(),
                count: acc.non_finite,
            });
        }
        if acc.units.len() > 1 {
            prepared.issues.push(DataQualityIssue::MixedUnits {
                parameter: name.to_string(),
                units: acc.units.iter().cloned().collect(),
            });
        }
        if acc.categories.len() > 1 {
            warn!(parameter = name, "Parameter recorded under several categories");
            prepared.issues.push(DataQualityIssue::MixedCategories {
                parameter: name.to_string(),
                categories: acc.categories.iter().copied().collect(),
            });
        }
        if acc.finite.len() < MIN_DESCRIPTIVE_VALUES {
            prepared.issues.push(DataQualityIssue::TooFewValues {
                parameter: name.to_string(),
                count: acc.finite.len(),
                required: MIN_DESCRIPTIVE_VALUES,
            });
        }
        if acc.finite.is_empty() {
            continue;
        }

        acc.finite.sort_by_key(|m| m.measured_at);
        let sample = ParameterSample {
            parameter_name: name.to_string(),
            category: acc.category.unwrap_or(MeasurementCategory::Other),
            unit: acc.units.iter().next().cloned(),
            values: acc.finite.iter().map(|m| m.value).collect(),
            timestamps: acc.finite.iter().map(|m| m.measured_at).collect(),
        };
        prepared.parameters.insert(name.to_string(), sample);
    }

    debug!(
        total = prepared.total,
        parameters = prepared.parameters.len(),
        excluded = prepared.excluded,
        "Prepared measurements"
    );
    prepared
}
