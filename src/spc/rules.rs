//! Western Electric run rules.
//!
//! Eight zone tests for special-cause variation. Zone boundaries come from
//! the chart's own limits: σ = (UCL − CL) / 3, with zones at 1σ and 2σ from
//! the center line. Every rule is evaluated independently and a violation is
//! annotated on the last point of the pattern that completes it.
//!
//! # References
//!
//! - Western Electric (1956). *Statistical Quality Control Handbook*.
//! - Nelson, L.S. (1984). "The Shewhart Control Chart: Tests for Special Causes",
//!   *Journal of Quality Technology* 16(4), pp. 237-239.
//! - Montgomery, D.C. (2019). *Introduction to Statistical Quality Control*, 8th ed.

use serde::{Deserialize, Serialize};

use super::chart::ControlLimits;

/// One of the eight zone tests.
///
/// Serialized as its rule number (`"1"` .. `"8"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WesternElectricRule {
    /// A point beyond UCL or LCL.
    #[serde(rename = "1")]
    BeyondLimits,
    /// 2 of 3 consecutive points beyond 2σ on the same side.
    #[serde(rename = "2")]
    TwoOfThreeBeyond2Sigma,
    /// 4 of 5 consecutive points beyond 1σ on the same side.
    #[serde(rename = "3")]
    FourOfFiveBeyond1Sigma,
    /// 8 consecutive points on the same side of the center line.
    #[serde(rename = "4")]
    EightSameSide,
    /// 6 consecutive points strictly increasing or decreasing.
    #[serde(rename = "5")]
    SixTrend,
    /// 15 consecutive points within ±1σ.
    #[serde(rename = "6")]
    FifteenWithin1Sigma,
    /// 14 consecutive points alternating up and down.
    #[serde(rename = "7")]
    FourteenAlternating,
    /// 8 consecutive points beyond ±1σ with both sides represented.
    #[serde(rename = "8")]
    EightBeyond1SigmaBothSides,
}

impl WesternElectricRule {
    pub const ALL: [Self; 8] = [
        Self::BeyondLimits,
        Self::TwoOfThreeBeyond2Sigma,
        Self::FourOfFiveBeyond1Sigma,
        Self::EightSameSide,
        Self::SixTrend,
        Self::FifteenWithin1Sigma,
        Self::FourteenAlternating,
        Self::EightBeyond1SigmaBothSides,
    ];

    /// Rule number, 1..=8.
    pub fn number(self) -> u8 {
        match self {
            Self::BeyondLimits => 1,
            Self::TwoOfThreeBeyond2Sigma => 2,
            Self::FourOfFiveBeyond1Sigma => 3,
            Self::EightSameSide => 4,
            Self::SixTrend => 5,
            Self::FifteenWithin1Sigma => 6,
            Self::FourteenAlternating => 7,
            Self::EightBeyond1SigmaBothSides => 8,
        }
    }

    /// Explanation of what a violation suggests.
    pub fn interpretation(self) -> &'static str {
        match self {
            Self::BeyondLimits => "Point outside control limits: special cause variation likely",
            Self::TwoOfThreeBeyond2Sigma => {
                "2 of 3 points beyond 2 sigma: possible process shift"
            }
            Self::FourOfFiveBeyond1Sigma => {
                "4 of 5 points beyond 1 sigma: small sustained shift in the mean"
            }
            Self::EightSameSide => {
                "8 consecutive points on one side of the center line: process mean has shifted"
            }
            Self::SixTrend => {
                "6 points trending in one direction: gradual drift, check for wear or degradation"
            }
            Self::FifteenWithin1Sigma => {
                "15 points within 1 sigma: stratification or overestimated variation"
            }
            Self::FourteenAlternating => {
                "14 points alternating: systematic variation, e.g. two alternating sources"
            }
            Self::EightBeyond1SigmaBothSides => {
                "8 points avoiding the center zone: mixture of two distributions"
            }
        }
    }

    /// Runs this rule alone and reports whether any point violates it.
    pub fn check(self, values: &[f64], limits: &ControlLimits) -> bool {
        !self.violations(values, limits).is_empty()
    }

    /// Zero-based indices of the points that complete a violation.
    pub fn violations(self, values: &[f64], limits: &ControlLimits) -> Vec<usize> {
        let zones = Zones::new(limits);
        match self {
            Self::BeyondLimits => beyond_limits(values, limits),
            Self::TwoOfThreeBeyond2Sigma => k_of_m_same_side(values, &zones, 2.0, 2, 3),
            Self::FourOfFiveBeyond1Sigma => k_of_m_same_side(values, &zones, 1.0, 4, 5),
            Self::EightSameSide => same_side_run(values, limits.cl, 8),
            Self::SixTrend => monotone_run(values, 6),
            Self::FifteenWithin1Sigma => within_one_sigma_run(values, &zones, 15),
            Self::FourteenAlternating => alternating_run(values, 14),
            Self::EightBeyond1SigmaBothSides => mixture_run(values, &zones, 8),
        }
    }
}

impl std::fmt::Display for WesternElectricRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rule {}", self.number())
    }
}

/// Which rules fired anywhere on a chart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSummary {
    /// Triggered rules in rule-number order.
    pub triggered: Vec<WesternElectricRule>,
}

impl RuleSummary {
    pub fn is_triggered(&self, rule: WesternElectricRule) -> bool {
        self.triggered.contains(&rule)
    }

    pub fn any(&self) -> bool {
        !self.triggered.is_empty()
    }
}

/// Output of [`evaluate`]: per-point rule annotations plus the summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleEvaluation {
    /// `per_point[i]` lists the rules completed at point `i`.
    pub per_point: Vec<Vec<WesternElectricRule>>,
    pub summary: RuleSummary,
}

/// Evaluates all eight rules against `values`.
///
/// # Examples
///
/// ```
/// use lab_analytics::spc::{evaluate, ControlLimits, WesternElectricRule};
///
/// let limits = ControlLimits { ucl: 13.0, cl: 10.0, lcl: 7.0 };
/// let eval = evaluate(&[10.0, 9.5, 14.0, 10.2], &limits);
/// assert_eq!(eval.per_point[2], vec![WesternElectricRule::BeyondLimits]);
/// assert!(eval.summary.is_triggered(WesternElectricRule::BeyondLimits));
/// ```
pub fn evaluate(values: &[f64], limits: &ControlLimits) -> RuleEvaluation {
    evaluate_rules(values, limits, &WesternElectricRule::ALL)
}

/// Evaluates only the given rules.
pub fn evaluate_rules(
    values: &[f64],
    limits: &ControlLimits,
    rules: &[WesternElectricRule],
) -> RuleEvaluation {
    let mut per_point = vec![Vec::new(); values.len()];
    let mut triggered = Vec::new();
    for &rule in rules {
        let hits = rule.violations(values, limits);
        if hits.is_empty() {
            continue;
        }
        triggered.push(rule);
        for i in hits {
            per_point[i].push(rule);
        }
    }
    triggered.sort();
    triggered.dedup();
    for point_rules in &mut per_point {
        point_rules.sort();
        point_rules.dedup();
    }
    RuleEvaluation {
        per_point,
        summary: RuleSummary { triggered },
    }
}

/// Maps triggered rules to explanations, one line per rule.
pub fn interpret_rules(rules: &[WesternElectricRule]) -> Vec<String> {
    let mut sorted = rules.to_vec();
    sorted.sort();
    sorted.dedup();
    sorted
        .into_iter()
        .map(|r| format!("Rule {}: {}", r.number(), r.interpretation()))
        .collect()
}

// ---------------------------------------------------------------------------
// Zone helpers
// ---------------------------------------------------------------------------

struct Zones {
    cl: f64,
    sigma: f64,
}

impl Zones {
    fn new(limits: &ControlLimits) -> Self {
        Self {
            cl: limits.cl,
            sigma: (limits.ucl - limits.cl) / 3.0,
        }
    }

    /// +1 beyond `k`σ above, -1 beyond `k`σ below, 0 otherwise.
    fn beyond(&self, value: f64, k: f64) -> i8 {
        if value > self.cl + k * self.sigma {
            1
        } else if value < self.cl - k * self.sigma {
            -1
        } else {
            0
        }
    }
}

fn side(value: f64, cl: f64) -> i8 {
    if value > cl {
        1
    } else if value < cl {
        -1
    } else {
        0
    }
}

fn directions(values: &[f64]) -> Vec<i8> {
    values.windows(2).map(|w| side(w[1], w[0])).collect()
}

// ---------------------------------------------------------------------------
// Rule implementations
// ---------------------------------------------------------------------------

fn beyond_limits(values: &[f64], limits: &ControlLimits) -> Vec<usize> {
    values
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v > limits.ucl || v < limits.lcl)
        .map(|(i, _)| i)
        .collect()
}

fn k_of_m_same_side(values: &[f64], zones: &Zones, k_sigma: f64, k: usize, m: usize) -> Vec<usize> {
    if values.len() < m {
        return Vec::new();
    }
    let flags: Vec<i8> = values.iter().map(|&v| zones.beyond(v, k_sigma)).collect();
    (m - 1..values.len())
        .filter(|&i| {
            let window = &flags[i + 1 - m..=i];
            let above = window.iter().filter(|&&f| f > 0).count();
            let below = window.iter().filter(|&&f| f < 0).count();
            above >= k || below >= k
        })
        .collect()
}

fn same_side_run(values: &[f64], cl: f64, length: usize) -> Vec<usize> {
    let mut hits = Vec::new();
    let mut run = 0_usize;
    let mut prev = 0_i8;
    for (i, &v) in values.iter().enumerate() {
        let s = side(v, cl);
        run = if s != 0 && s == prev { run + 1 } else { usize::from(s != 0) };
        prev = s;
        if run >= length {
            hits.push(i);
        }
    }
    hits
}

fn monotone_run(values: &[f64], length: usize) -> Vec<usize> {
    let mut hits = Vec::new();
    let mut run = 0_usize;
    let mut prev = 0_i8;
    for (i, d) in directions(values).into_iter().enumerate() {
        // A tie breaks the run in both directions.
        run = if d != 0 && d == prev { run + 1 } else { usize::from(d != 0) };
        prev = d;
        // `run` steps span `run + 1` points, ending at values[i + 1].
        if run + 1 >= length {
            hits.push(i + 1);
        }
    }
    hits
}

fn within_one_sigma_run(values: &[f64], zones: &Zones, length: usize) -> Vec<usize> {
    let mut hits = Vec::new();
    let mut run = 0_usize;
    for (i, &v) in values.iter().enumerate() {
        run = if zones.beyond(v, 1.0) == 0 { run + 1 } else { 0 };
        if run >= length {
            hits.push(i);
        }
    }
    hits
}

fn alternating_run(values: &[f64], length: usize) -> Vec<usize> {
    let mut hits = Vec::new();
    let mut run = 0_usize;
    let mut prev = 0_i8;
    for (i, d) in directions(values).into_iter().enumerate() {
        run = if d != 0 && d == -prev { run + 1 } else { usize::from(d != 0) };
        prev = d;
        if run + 1 >= length {
            hits.push(i + 1);
        }
    }
    hits
}

fn mixture_run(values: &[f64], zones: &Zones, length: usize) -> Vec<usize> {
    if values.len() < length {
        return Vec::new();
    }
    let flags: Vec<i8> = values.iter().map(|&v| zones.beyond(v, 1.0)).collect();
    (length - 1..values.len())
        .filter(|&i| {
            let window = &flags[i + 1 - length..=i];
            window.iter().all(|&f| f != 0)
                && window.iter().any(|&f| f > 0)
                && window.iter().any(|&f| f < 0)
        })
        .collect()
}
