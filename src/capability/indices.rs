//! Process capability indices (Cp, Cpk, Pp, Ppk) and sigma level.
//!
//! Short-term indices (Cp, Cpk) use the within-subgroup sigma estimated from
//! a control chart; long-term indices (Pp, Ppk) use the sample's own
//! standard deviation.
//!
//! # References
//!
//! - Montgomery (2019), *Introduction to Statistical Quality Control*, 8th ed.,
//!   Chapter 8.
//! - Kane (1986), "Process Capability Indices", *Journal of Quality Technology*
//!   18(1), pp. 41--52.

use serde::{Deserialize, Serialize};

use crate::error::{require_len, AnalysisError, Result};
use crate::stats;

/// `cp − cpk` above this flags a de-centered process.
pub const CENTERING_GAP: f64 = 0.2;

/// `pp − ppk` above this flags long-term drift.
pub const LONG_TERM_GAP: f64 = 0.2;

/// Cpk below this is reported as insufficient capability.
pub const MIN_CAPABLE_CPK: f64 = 1.33;

/// Lower and/or upper specification limit.
///
/// # Examples
///
/// ```
/// use lab_analytics::capability::SpecificationLimits;
///
/// assert!(SpecificationLimits::new(Some(9.0), Some(11.0)).is_ok());
/// assert!(SpecificationLimits::new(None, Some(11.0)).is_ok());
/// assert!(SpecificationLimits::new(None, None).is_err());
/// assert!(SpecificationLimits::new(Some(11.0), Some(9.0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SpecificationLimits {
    #[serde(default)]
    pub lsl: Option<f64>,
    #[serde(default)]
    pub usl: Option<f64>,
}

impl SpecificationLimits {
    /// Creates validated limits.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::InvalidSpecification`] if both limits are missing,
    /// either is non-finite, or `usl <= lsl`.
    pub fn new(lsl: Option<f64>, usl: Option<f64>) -> Result<Self> {
        let limits = Self { lsl, usl };
        limits.validate()?;
        Ok(limits)
    }

    /// Checks the invariants enforced by [`SpecificationLimits::new`].
    ///
    /// # Errors
    ///
    /// See [`SpecificationLimits::new`].
    pub fn validate(&self) -> Result<()> {
        match (self.lsl, self.usl) {
            (None, None) => Err(AnalysisError::InvalidSpecification(
                "at least one specification limit (LSL or USL) is required",
            )),
            (Some(l), _) if !l.is_finite() => {
                Err(AnalysisError::InvalidSpecification("LSL must be finite"))
            }
            (_, Some(u)) if !u.is_finite() => {
                Err(AnalysisError::InvalidSpecification("USL must be finite"))
            }
            (Some(l), Some(u)) if u <= l => Err(AnalysisError::InvalidSpecification(
                "USL must be greater than LSL",
            )),
            _ => Ok(()),
        }
    }

    /// Capability using the sample mean as center and the given short-term sigma.
    ///
    /// # Errors
    ///
    /// See [`compute_capability`].
    pub fn capability(&self, data: &[f64], sigma_within: f64) -> Result<ProcessCapability> {
        let center = stats::mean(data)?;
        compute_capability(data, center, sigma_within, self)
    }

    /// Capability with the overall standard deviation used for both the
    /// short- and long-term estimate, so Cp == Pp and Cpk == Ppk.
    ///
    /// # Errors
    ///
    /// See [`compute_capability`].
    pub fn capability_overall(&self, data: &[f64]) -> Result<ProcessCapability> {
        require_len("process capability", data.len(), 2)?;
        let center = stats::mean(data)?;
        let sigma = stats::std_dev(data)?;
        compute_capability(data, center, sigma, self)
    }
}

/// Rating bucket for Cpk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityRating {
    Excellent,
    VeryGood,
    Good,
    Acceptable,
    Poor,
    Unacceptable,
}

impl CapabilityRating {
    /// Bucket for a Cpk value.
    pub fn from_cpk(cpk: f64) -> Self {
        if cpk >= 2.0 {
            Self::Excellent
        } else if cpk >= 1.67 {
            Self::VeryGood
        } else if cpk >= 1.33 {
            Self::Good
        } else if cpk >= 1.0 {
            Self::Acceptable
        } else if cpk >= 0.67 {
            Self::Poor
        } else {
            Self::Unacceptable
        }
    }

    /// Human-readable interpretation.
    pub fn description(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent (6σ)",
            Self::VeryGood => "Very good (5σ)",
            Self::Good => "Good (4σ)",
            Self::Acceptable => "Acceptable (3σ)",
            Self::Poor => "Poor: needs improvement",
            Self::Unacceptable => "Unacceptable: urgent action required",
        }
    }
}

/// Computed capability indices.
///
/// Indices that need a limit which was not supplied stay `None`; nothing
/// defaults to zero. Cpk and Ppk are always defined because at least one
/// limit is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessCapability {
    /// (USL − LSL) / 6σ_within. Requires both limits.
    pub cp: Option<f64>,
    /// min of the defined one-sided ratios.
    pub cpk: f64,
    /// (USL − center) / 3σ_within.
    pub cpu: Option<f64>,
    /// (center − LSL) / 3σ_within.
    pub cpl: Option<f64>,
    /// (USL − LSL) / 6σ_overall. Requires both limits.
    pub pp: Option<f64>,
    pub ppk: f64,
    /// Sigma level, 3 · Cpk.
    #[serde(rename = "sigma")]
    pub sigma_level: f64,
    pub rating: CapabilityRating,
    pub interpretation: String,
    pub recommendation: String,
    pub center: f64,
    pub sigma_within: f64,
    pub sigma_overall: f64,
}

impl ProcessCapability {
    /// Indices from already-estimated center and sigmas.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::InvalidSpecification`] for invalid limits.
    /// - [`AnalysisError::DegenerateData`] if either sigma is not positive and finite.
    ///
    /// # Examples
    ///
    /// ```
    /// use lab_analytics::capability::{ProcessCapability, SpecificationLimits};
    ///
    /// let limits = SpecificationLimits::new(Some(7.0), Some(13.0)).unwrap();
    /// let c = ProcessCapability::from_estimates(10.0, 1.0, 1.0, &limits).unwrap();
    /// assert!((c.cp.unwrap() - 1.0).abs() < 1e-12);
    /// assert!((c.cpk - 1.0).abs() < 1e-12);
    /// ```
    pub fn from_estimates(
        center: f64,
        sigma_within: f64,
        sigma_overall: f64,
        limits: &SpecificationLimits,
    ) -> Result<Self> {
        limits.validate()?;
        for sigma in [sigma_within, sigma_overall] {
            if !sigma.is_finite() || sigma <= 0.0 {
                return Err(AnalysisError::DegenerateData {
                    analysis: "process capability",
                });
            }
        }

        let (cp, cpu, cpl, cpk) = indices(center, sigma_within, limits);
        let (pp, _, _, ppk) = indices(center, sigma_overall, limits);
        let rating = CapabilityRating::from_cpk(cpk);

        let mut capability = Self {
            cp,
            cpk,
            cpu,
            cpl,
            pp,
            ppk,
            sigma_level: 3.0 * cpk,
            rating,
            interpretation: rating.description().to_string(),
            recommendation: String::new(),
            center,
            sigma_within,
            sigma_overall,
        };
        capability.recommendation = capability.recommendations().join(" ");
        Ok(capability)
    }

    /// Whether `cp − cpk` shows the process is off-center.
    pub fn is_off_center(&self) -> bool {
        self.cp.is_some_and(|cp| cp - self.cpk > CENTERING_GAP)
    }

    /// Whether `pp − ppk` shows long-term instability.
    pub fn is_drifting(&self) -> bool {
        self.pp.is_some_and(|pp| pp - self.ppk > LONG_TERM_GAP)
    }

    /// Individual recommendation sentences.
    pub fn recommendations(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.is_off_center() {
            out.push(
                "Process is off-center: adjust the mean toward the middle of the specification range."
                    .to_string(),
            );
        }
        if self.cpk < MIN_CAPABLE_CPK {
            out.push(format!(
                "Capability is insufficient (Cpk = {:.2} < {MIN_CAPABLE_CPK}): reduce process variation.",
                self.cpk
            ));
        }
        if self.is_drifting() {
            out.push(
                "Long-term performance lags short-term capability: investigate shifts between subgroups."
                    .to_string(),
            );
        }
        if out.is_empty() {
            out.push("Process is capable; maintain current controls.".to_string());
        }
        out
    }
}

/// Capability of `data` around `center` with short-term sigma `sigma_within`.
///
/// Pp/Ppk use the sample standard deviation of `data`.
///
/// # Errors
///
/// - [`AnalysisError::InsufficientData`] for fewer than 2 values.
/// - [`AnalysisError::InvalidSpecification`] for invalid limits.
/// - [`AnalysisError::DegenerateData`] for a zero or non-finite sigma.
pub fn compute_capability(
    data: &[f64],
    center: f64,
    sigma_within: f64,
    limits: &SpecificationLimits,
) -> Result<ProcessCapability> {
    require_len("process capability", data.len(), 2)?;
    stats::ensure_finite("process capability", data)?;
    let sigma_overall = stats::std_dev(data)?;
    ProcessCapability::from_estimates(center, sigma_within, sigma_overall, limits)
}

/// `(spread, upper, lower, worst)` ratios for one sigma.
fn indices(
    center: f64,
    sigma: f64,
    limits: &SpecificationLimits,
) -> (Option<f64>, Option<f64>, Option<f64>, f64) {
    let upper = limits.usl.map(|u| (u - center) / (3.0 * sigma));
    let lower = limits.lsl.map(|l| (center - l) / (3.0 * sigma));
    let spread = match (limits.usl, limits.lsl) {
        (Some(u), Some(l)) => Some((u - l) / (6.0 * sigma)),
        _ => None,
    };
    let worst = match (upper, lower) {
        (Some(u), Some(l)) => u.min(l),
        (Some(u), None) => u,
        (None, Some(l)) => l,
        // validate() guarantees at least one limit
        (None, None) => f64::NAN,
    };
    (spread, upper, lower, worst)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_sided(lsl: f64, usl: f64) -> SpecificationLimits {
        SpecificationLimits::new(Some(lsl), Some(usl)).unwrap()
    }

    // -----------------------------------------------------------------------
    // Limits
    // -----------------------------------------------------------------------

    #[test]
    fn limits_validation() {
        assert!(SpecificationLimits::new(None, None).is_err());
        assert!(SpecificationLimits::new(Some(5.0), Some(5.0)).is_err());
        assert!(SpecificationLimits::new(Some(f64::NAN), Some(5.0)).is_err());
        assert!(SpecificationLimits::new(Some(1.0), Some(f64::INFINITY)).is_err());
        assert!(SpecificationLimits::new(Some(1.0), None).is_ok());
    }

    // -----------------------------------------------------------------------
    // Centered and shifted process
    // -----------------------------------------------------------------------

    #[test]
    fn centered_process() {
        let c = ProcessCapability::from_estimates(10.0, 1.0, 1.0, &two_sided(7.0, 13.0)).unwrap();
        assert!((c.cp.unwrap() - 1.0).abs() < 1e-12);
        assert!((c.cpk - 1.0).abs() < 1e-12);
        assert!((c.sigma_level - 3.0).abs() < 1e-12);
        assert_eq!(c.rating, CapabilityRating::Acceptable);
        assert!(!c.is_off_center());
    }

    #[test]
    fn shifted_process_is_off_center() {
        let c = ProcessCapability::from_estimates(11.0, 1.0, 1.0, &two_sided(7.0, 13.0)).unwrap();
        assert!((c.cp.unwrap() - 1.0).abs() < 1e-12);
        assert!((c.cpk - 2.0 / 3.0).abs() < 1e-12);
        assert!(c.is_off_center());
        // 0.667 falls just under the 0.67 boundary
        assert_eq!(c.rating, CapabilityRating::Unacceptable);
        assert!(c.recommendation.contains("off-center"));
        assert!(c.recommendation.contains("insufficient"));
    }

    #[test]
    fn long_term_indices_use_overall_sigma() {
        let c = ProcessCapability::from_estimates(10.0, 0.5, 1.0, &two_sided(7.0, 13.0)).unwrap();
        assert!((c.cp.unwrap() - 2.0).abs() < 1e-12);
        assert!((c.pp.unwrap() - 1.0).abs() < 1e-12);
        assert!((c.ppk - 1.0).abs() < 1e-12);
        assert_eq!(c.rating, CapabilityRating::Excellent);
    }

    #[test]
    fn drift_detection() {
        // Pp = 1.0, Ppk = 0.667 with the mean shifted by one sigma
        let c = ProcessCapability::from_estimates(11.0, 0.25, 1.0, &two_sided(7.0, 13.0)).unwrap();
        assert!(c.is_drifting());
        assert!(c.recommendation.contains("Long-term"));
    }

    // -----------------------------------------------------------------------
    // One-sided specifications
    // -----------------------------------------------------------------------

    #[test]
    fn upper_only() {
        let limits = SpecificationLimits::new(None, Some(13.0)).unwrap();
        let c = ProcessCapability::from_estimates(10.0, 1.0, 1.0, &limits).unwrap();
        assert!(c.cp.is_none());
        assert!(c.pp.is_none());
        assert!(c.cpl.is_none());
        assert!((c.cpk - c.cpu.unwrap()).abs() < 1e-15);
        assert!(!c.is_off_center());
    }

    #[test]
    fn lower_only() {
        let limits = SpecificationLimits::new(Some(4.0), None).unwrap();
        let c = ProcessCapability::from_estimates(10.0, 1.0, 1.0, &limits).unwrap();
        assert!(c.cpu.is_none());
        assert!((c.cpk - 2.0).abs() < 1e-12);
        assert_eq!(c.rating, CapabilityRating::Excellent);
        assert_eq!(c.recommendation, "Process is capable; maintain current controls.");
    }

    // -----------------------------------------------------------------------
    // From data
    // -----------------------------------------------------------------------

    #[test]
    fn compute_from_data() {
        let data = [4.0, 4.5, 5.0, 5.5, 6.0, 4.0, 5.0, 6.0, 5.0, 5.0];
        let limits = two_sided(0.0, 10.0);
        let c = limits.capability(&data, 1.0).unwrap();
        let mean = stats::mean(&data).unwrap();
        assert!((c.cp.unwrap() - 10.0 / 6.0).abs() < 1e-10);
        assert!((c.cpu.unwrap() - (10.0 - mean) / 3.0).abs() < 1e-10);
        assert!((c.cpl.unwrap() - mean / 3.0).abs() < 1e-10);
        let sd = stats::std_dev(&data).unwrap();
        assert!((c.pp.unwrap() - 10.0 / (6.0 * sd)).abs() < 1e-10);
    }

    #[test]
    fn overall_capability_matches_pp() {
        let data = [208.0, 209.0, 210.0, 211.0, 212.0, 208.5, 209.5, 210.5, 211.5, 210.0];
        let c = two_sided(200.0, 220.0).capability_overall(&data).unwrap();
        assert!((c.cp.unwrap() - c.pp.unwrap()).abs() < 1e-15);
        assert!((c.cpk - c.ppk).abs() < 1e-15);
    }

    #[test]
    fn degenerate_inputs() {
        let limits = two_sided(0.0, 10.0);
        assert!(matches!(
            limits.capability(&[5.0, 5.0, 5.0], 1.0),
            Err(AnalysisError::DegenerateData { .. })
        ));
        assert!(matches!(
            limits.capability(&[4.0, 5.0, 6.0], 0.0),
            Err(AnalysisError::DegenerateData { .. })
        ));
        assert!(matches!(
            limits.capability(&[5.0], 1.0),
            Err(AnalysisError::InsufficientData { .. })
        ));
    }

    #[test]
    fn rating_buckets() {
        assert_eq!(CapabilityRating::from_cpk(2.5), CapabilityRating::Excellent);
        assert_eq!(CapabilityRating::from_cpk(1.7), CapabilityRating::VeryGood);
        assert_eq!(CapabilityRating::from_cpk(1.4), CapabilityRating::Good);
        assert_eq!(CapabilityRating::from_cpk(1.0), CapabilityRating::Acceptable);
        assert_eq!(CapabilityRating::from_cpk(0.7), CapabilityRating::Poor);
        assert_eq!(CapabilityRating::from_cpk(0.2), CapabilityRating::Unacceptable);
        assert_eq!(CapabilityRating::from_cpk(-1.0), CapabilityRating::Unacceptable);
    }
}
