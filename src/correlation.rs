//! Pearson correlation.
//!
//! # Examples
//!
//! ```
//! use lab_analytics::correlation::{correlation, correlation_test};
//!
//! let x = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let y = [2.0, 4.0, 5.0, 4.0, 5.0];
//!
//! let r = correlation(&x, &y).unwrap();
//! assert!(r > 0.7);
//!
//! let t = correlation_test(&x, &y).unwrap();
//! assert_eq!(t.r, r);
//! assert!(t.p_value < 0.2);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{require_len, require_same_len, Result};
use crate::special;
use crate::stats;

/// Correlation coefficient with its significance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationResult {
    /// Pearson's r in [-1, 1].
    pub r: f64,
    /// Two-tailed p-value for H₀: ρ = 0.
    pub p_value: f64,
    pub n: usize,
}

/// Pearson product-moment correlation from centered sums.
///
/// r = Σ(xᵢ − x̄)(yᵢ − ȳ) / √(Σ(xᵢ − x̄)² · Σ(yᵢ − ȳ)²)
///
/// Returns 0 when the denominator is zero (a constant series).
///
/// # Errors
///
/// - [`crate::AnalysisError::DimensionMismatch`] if lengths differ.
/// - [`crate::AnalysisError::InsufficientData`] for fewer than 2 pairs.
///
/// # References
///
/// Pearson (1895). "Note on regression and inheritance in the case of
/// two parents". Proceedings of the Royal Society of London, 58, 240–242.
pub fn correlation(x: &[f64], y: &[f64]) -> Result<f64> {
    require_same_len(x.len(), y.len())?;
    require_len("correlation", x.len(), 2)?;

    let x_mean = stats::mean(x)?;
    let y_mean = stats::mean(y)?;
    let (sxy, sxx, syy) = x
        .iter()
        .zip(y)
        .fold((0.0, 0.0, 0.0), |(sxy, sxx, syy), (&xi, &yi)| {
            let dx = xi - x_mean;
            let dy = yi - y_mean;
            (sxy + dx * dy, sxx + dx * dx, syy + dy * dy)
        });

    let denominator = (sxx * syy).sqrt();
    if denominator == 0.0 {
        return Ok(0.0);
    }
    Ok((sxy / denominator).clamp(-1.0, 1.0))
}

/// Pearson's r with a two-tailed p-value.
///
/// t = r·√(n−2) / √(1−r²), df = n − 2.
///
/// # Errors
///
/// - [`crate::AnalysisError::DimensionMismatch`] if lengths differ.
/// - [`crate::AnalysisError::InsufficientData`] for fewer than 3 pairs.
pub fn correlation_test(x: &[f64], y: &[f64]) -> Result<CorrelationResult> {
    require_same_len(x.len(), y.len())?;
    require_len("correlation test", x.len(), 3)?;
    let r = correlation(x, y)?;
    let n = x.len();
    Ok(CorrelationResult {
        r,
        p_value: correlation_p_value(r, n),
        n,
    })
}

fn correlation_p_value(r: f64, n: usize) -> f64 {
    let df = (n - 2) as f64;
    let r2 = r * r;
    if r2 >= 1.0 {
        return 0.0;
    }
    let t = r * (df / (1.0 - r2)).sqrt();
    special::t_two_sided_p(t, df)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn r_is_bounded_and_symmetric(
            pairs in proptest::collection::vec((-1e3_f64..1e3, -1e3_f64..1e3), 2..=30)
        ) {
            let (x, y): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
            let rxy = correlation(&x, &y).unwrap();
            let ryx = correlation(&y, &x).unwrap();
            prop_assert!((-1.0..=1.0).contains(&rxy));
            prop_assert!((rxy - ryx).abs() < 1e-12);
        }
    }
}
