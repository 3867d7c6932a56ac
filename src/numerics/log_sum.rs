//! Stable log-sum-exp reductions.
//!
//! The EM engine normalizes responsibilities and categorical distributions in
//! log-space. Both helpers here use the max-subtract form of log-sum-exp:
//! `log Σ exp(xᵢ) = m + log Σ exp(xᵢ − m)` with `m = max(x)`, which keeps the
//! exponentials in `[0, 1]` and therefore free of overflow. A lane that is
//! entirely `-∞` (all probabilities zero) reduces to `-∞` rather than NaN.

use ndarray::{Array1, Array2, ArrayView1, Axis};

/// Log of the sum of exponentials of a 1-D log-domain lane.
///
/// Satisfies `log_sum([ln a, ln b]) == ln(a + b)` to floating-point precision
/// for all non-negative `a`, `b`. `-∞` entries are identity elements: they
/// contribute `exp(-∞) = 0` to the inner sum. An all-`-∞` input returns `-∞`.
pub fn log_sum(values: ArrayView1<'_, f64>) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        // exp of every entry underflows to exactly zero; log(0) = -inf.
        return f64::NEG_INFINITY;
    }
    if max.is_infinite() {
        return f64::INFINITY;
    }
    let shifted: f64 = values.iter().map(|&v| (v - max).exp()).sum();
    max + shifted.ln()
}

/// Log-sum-exp of a 2-D log-domain array along `axis`.
///
/// Reducing along `Axis(0)` collapses rows (one output per column); reducing
/// along `Axis(1)` collapses columns (one output per row). Each lane is
/// reduced independently with [`log_sum`], so the permutation-invariance and
/// `-∞` identity semantics carry over lane by lane.
pub fn log_sum_axis(values: &Array2<f64>, axis: Axis) -> Array1<f64> {
    values.map_axis(axis, |lane| log_sum(lane))
}
