//! Process capability analysis.
//!
//! Compares process spread and centering against specification limits.
//!
//! # Indices
//!
//! - **Cp**: potential capability, tolerance width over 6σ
//! - **Cpk**: actual capability, worst one-sided distance over 3σ
//! - **Pp**, **Ppk**: the same with the overall standard deviation
//!
//! One-sided specifications are supported; indices that need the missing
//! limit are `None`.
//!
//! # References
//!
//! - Montgomery (2019), *Introduction to Statistical Quality Control*, 8th ed.

mod indices;

pub use indices::{
    compute_capability, CapabilityRating, ProcessCapability, SpecificationLimits, CENTERING_GAP,
    LONG_TERM_GAP, MIN_CAPABLE_CPK,
};
