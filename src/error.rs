//! Error types shared by every analysis.
//!
//! Failures are local to a single call and carry only a classification plus
//! the numbers needed to explain it. Presenting a user-facing message is the
//! caller's job.

use thiserror::Error;

/// Classification of analysis failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// The sample is smaller than the analysis requires.
    #[error("insufficient data for {analysis}: need at least {required} values, got {actual}")]
    InsufficientData {
        analysis: &'static str,
        required: usize,
        actual: usize,
    },

    /// Paired inputs (or a subgroup against its nominal size) differ in length.
    #[error("dimension mismatch: expected {expected} values, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// All values are identical, so standardized statistics are undefined.
    #[error("degenerate data for {analysis}: zero variance")]
    DegenerateData { analysis: &'static str },

    /// Specification limits are missing, non-finite, or inverted.
    #[error("invalid specification limits: {0}")]
    InvalidSpecification(&'static str),

    /// An analysis parameter (subgroup size, significance level, ...) is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Configuration could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Fails with [`AnalysisError::InsufficientData`] when `actual < required`.
pub(crate) fn require_len(analysis: &'static str, actual: usize, required: usize) -> Result<()> {
    if actual < required {
        return Err(AnalysisError::InsufficientData {
            analysis,
            required,
            actual,
        });
    }
    Ok(())
}

/// Fails with [`AnalysisError::DimensionMismatch`] when the lengths differ.
pub(crate) fn require_same_len(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(AnalysisError::DimensionMismatch { expected, actual });
    }
    Ok(())
}
