
//! Error estimators and collectors.
//!
//! A collector produces the per-plane residual table of one level.
//! An estimator lifts those residuals into one accumulated error scalar
//! across levels, and prices the gain of consuming one more plane.

use crate::math::shift_exponent;


/// The metric an estimator works in. The refactor driver dispatches on this:
/// max-error tables are recomputed from the level error bound alone,
/// squared-error tables come out of the bit-plane encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMetric {

    /// Worst-case absolute error over all elements.
    Max,

    /// Summed squared error over all elements.
    Squared,
}


/// Lifts per-plane residuals into an accumulated error value,
/// and evaluates how much accumulated error the next plane of a level
/// would remove.
pub trait ErrorEstimator {

    /// Which residual tables this estimator expects.
    fn metric(&self) -> ErrorMetric;

    /// The contribution of one level's current residual to the accumulated
    /// error. May weight by level.
    fn estimate(&self, level_error: f64, level: usize) -> f64;

    /// The expected decrease of the accumulated error when one level's
    /// residual transitions from `before` to `after`, while the accumulated
    /// error currently is `accumulated`. Separate from `estimate` because
    /// the accumulation may be non-linear.
    fn estimate_gain(&self, accumulated: f64, before: f64, after: f64, level: usize) -> f64;
}


/// Accumulates worst-case absolute errors by summing them over the levels,
/// the triangle-inequality bound of the hierarchical basis.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxErrorEstimator;

impl ErrorEstimator for MaxErrorEstimator {

    fn metric(&self) -> ErrorMetric { ErrorMetric::Max }

    fn estimate(&self, level_error: f64, _level: usize) -> f64 {
        level_error
    }

    fn estimate_gain(&self, _accumulated: f64, before: f64, after: f64, level: usize) -> f64 {
        self.estimate(before, level) - self.estimate(after, level)
    }
}


/// Accumulates squared errors linearly, but prices gains in the root metric,
/// so levels compete on how much they move the root-sum-square error.
#[derive(Debug, Clone, Copy, Default)]
pub struct SquaredErrorEstimator;

impl ErrorEstimator for SquaredErrorEstimator {

    fn metric(&self) -> ErrorMetric { ErrorMetric::Squared }

    fn estimate(&self, level_error: f64, _level: usize) -> f64 {
        level_error
    }

    fn estimate_gain(&self, accumulated: f64, before: f64, after: f64, _level: usize) -> f64 {
        // clamp: floating-point cancellation may drive the remainder
        // slightly below zero
        let remaining = (accumulated - before + after).max(0.0);
        accumulated.max(0.0).sqrt() - remaining.sqrt()
    }
}


/// Recomputes a level's worst-case residual table without touching the
/// coefficients: each plane halves the bound.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxErrorCollector;

impl MaxErrorCollector {

    /// The residual table of a level with the given error bound,
    /// one entry more than there are planes.
    pub fn collect(&self, num_bit_planes: u8, level_error_bound: f64) -> Vec<f64> {
        (0 ..= num_bit_planes as i32)
            .map(|plane| shift_exponent(level_error_bound, -plane))
            .collect()
    }
}
