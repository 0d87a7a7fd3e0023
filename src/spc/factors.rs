//! Control chart constants indexed by subgroup size.
//!
//! Values for n = 2..=10 from ASTM E2587 and Montgomery (2019), Appendix VI.
//! Subgroup sizes above 10 use the n = 10 row.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Largest subgroup size with its own row; larger sizes clamp to it.
pub const MAX_TABULATED_SIZE: usize = 10;

/// Individuals chart multiplier, 3/d2 for n = 2.
pub const E2: f64 = 2.660;

/// Moving-range upper limit multiplier, D4 for n = 2.
pub const D4_MR: f64 = 3.267;

/// d2 for n = 2, converts the mean moving range into sigma.
pub const D2_MR: f64 = 1.128;

/// One row of the factor table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlChartFactors {
    pub n: usize,
    pub a2: f64,
    pub a3: f64,
    pub d2: f64,
    pub d3: f64,
    pub d4: f64,
    pub b3: f64,
    pub b4: f64,
}

#[allow(clippy::too_many_arguments)]
const fn row(
    n: usize,
    a2: f64,
    a3: f64,
    d2: f64,
    d3: f64,
    d4: f64,
    b3: f64,
    b4: f64,
) -> ControlChartFactors {
    ControlChartFactors {
        n,
        a2,
        a3,
        d2,
        d3,
        d4,
        b3,
        b4,
    }
}

const TABLE: [ControlChartFactors; 9] = [
    row(2, 1.880, 2.659, 1.128, 0.0, 3.267, 0.0, 3.267),
    row(3, 1.023, 1.954, 1.693, 0.0, 2.575, 0.0, 2.568),
    row(4, 0.729, 1.628, 2.059, 0.0, 2.282, 0.0, 2.266),
    row(5, 0.577, 1.427, 2.326, 0.0, 2.114, 0.0, 2.089),
    row(6, 0.483, 1.287, 2.534, 0.0, 2.004, 0.030, 1.970),
    row(7, 0.419, 1.182, 2.704, 0.076, 1.924, 0.118, 1.882),
    row(8, 0.373, 1.099, 2.847, 0.136, 1.864, 0.185, 1.815),
    row(9, 0.337, 1.032, 2.970, 0.184, 1.816, 0.239, 1.761),
    row(10, 0.308, 0.975, 3.078, 0.223, 1.777, 0.284, 1.716),
];

/// Factors for subgroup size `n`.
///
/// Sizes above [`MAX_TABULATED_SIZE`] return the n = 10 row; the `n` field
/// of the result then reports 10, not the requested size.
///
/// # Errors
///
/// [`AnalysisError::InvalidParameter`] when `n < 2`.
///
/// # Examples
///
/// ```
/// use lab_analytics::spc::factors;
///
/// let f = factors(5).unwrap();
/// assert_eq!(f.a2, 0.577);
/// assert_eq!(factors(25).unwrap(), factors(10).unwrap());
/// assert!(factors(1).is_err());
/// ```
pub fn factors(n: usize) -> Result<ControlChartFactors> {
    if n < 2 {
        return Err(AnalysisError::InvalidParameter(format!(
            "subgroup size must be at least 2, got {n}"
        )));
    }
    Ok(TABLE[n.min(MAX_TABULATED_SIZE) - 2])
}
