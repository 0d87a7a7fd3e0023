//! Distribution functions used for intervals and p-values.
//!
//! Critical values for the 95 % confidence interval of a mean come from a
//! fixed table of two-sided Student's t quantiles for small degrees of
//! freedom; from 30 degrees of freedom on the standard normal quantile is
//! used instead. P-values use the exact Student's t CDF from `statrs`.

use statrs::distribution::{ChiSquared, ContinuousCDF, Normal, StudentsT};

/// Two-sided 95 % Student's t critical values, `t(0.975, df)` for df = 1..=29.
const T_CRITICAL_95: [f64; 29] = [
    12.706, 4.303, 3.182, 2.776, 2.571, 2.447, 2.365, 2.306, 2.262, 2.228, 2.201, 2.179, 2.160,
    2.145, 2.131, 2.120, 2.110, 2.101, 2.093, 2.086, 2.080, 2.074, 2.069, 2.064, 2.060, 2.056,
    2.052, 2.048, 2.045,
];

/// Critical value for a two-sided 95 % interval with `df` degrees of freedom.
///
/// Table lookup for `df < 30`, normal approximation (≈ 1.96) above.
/// Returns NaN for `df == 0`.
///
/// # Examples
///
/// ```
/// use lab_analytics::special::t_critical_95;
///
/// assert_eq!(t_critical_95(4), 2.776);
/// assert!((t_critical_95(120) - 1.959964).abs() < 1e-5);
/// ```
pub fn t_critical_95(df: usize) -> f64 {
    match df {
        0 => f64::NAN,
        1..=29 => T_CRITICAL_95[df - 1],
        _ => normal_quantile(0.975),
    }
}

/// Inverse CDF of the standard normal distribution.
pub fn normal_quantile(p: f64) -> f64 {
    Normal::new(0.0, 1.0).map_or(f64::NAN, |n| n.inverse_cdf(p))
}

/// CDF of the standard normal distribution.
pub fn normal_cdf(x: f64) -> f64 {
    Normal::new(0.0, 1.0).map_or(f64::NAN, |n| n.cdf(x))
}

/// CDF of Student's t distribution with `df` degrees of freedom.
pub fn t_cdf(t: f64, df: f64) -> f64 {
    if t.is_infinite() {
        return if t > 0.0 { 1.0 } else { 0.0 };
    }
    StudentsT::new(0.0, 1.0, df).map_or(f64::NAN, |d| d.cdf(t))
}

/// Two-sided p-value for a t statistic, clamped to `[0, 1]`.
pub fn t_two_sided_p(t: f64, df: f64) -> f64 {
    (2.0 * (1.0 - t_cdf(t.abs(), df))).clamp(0.0, 1.0)
}

/// Upper-tail probability of the chi-squared distribution.
pub fn chi_squared_sf(x: f64, df: f64) -> f64 {
    ChiSquared::new(df).map_or(f64::NAN, |d| (1.0 - d.cdf(x)).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_covers_small_df() {
        assert_eq!(t_critical_95(1), 12.706);
        assert_eq!(t_critical_95(29), 2.045);
    }

    #[test]
    fn large_df_uses_normal_quantile() {
        assert!((t_critical_95(30) - 1.959964).abs() < 1e-5);
    }

    #[test]
    fn zero_df_is_undefined() {
        assert!(t_critical_95(0).is_nan());
    }

    #[test]
    fn t_cdf_symmetry() {
        let df = 7.0;
        assert!((t_cdf(0.0, df) - 0.5).abs() < 1e-12);
        assert!((t_cdf(1.3, df) + t_cdf(-1.3, df) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn t_two_sided_p_matches_table() {
        // t(0.975, 10) = 2.228 → p ≈ 0.05
        let p = t_two_sided_p(2.228, 10.0);
        assert!((p - 0.05).abs() < 1e-3, "p = {p}");
    }

    #[test]
    fn t_two_sided_p_infinite_statistic() {
        assert_eq!(t_two_sided_p(f64::INFINITY, 5.0), 0.0);
    }

    #[test]
    fn normal_quantile_and_cdf_invert() {
        let z = normal_quantile(0.9);
        assert!((normal_cdf(z) - 0.9).abs() < 1e-9);
    }

    #[test]
    fn chi_squared_sf_known_value() {
        // P(χ²₂ > 5.991) ≈ 0.05
        assert!((chi_squared_sf(5.991, 2.0) - 0.05).abs() < 1e-3);
    }
}
