//! The per-feature deviation objective solved inside every M-step.
//!
//! Purpose
//! -------
//! [`EtaProblem`] is the [`PenalizedLikelihood`] maximized once per feature
//! per EM iteration: find the k x V deviation matrix `h` maximizing
//!
//! ```text
//! l(h) = sum_{z,v} wc[z,v] * log beta(h)[z,v] - lambda * sum |h|
//! ```
//!
//! where `beta(h)` is the row-normalized exponential of `m + h`, `m` is the
//! fixed global log base-rate vector, and `wc = phi * X` are the
//! responsibility-weighted occurrence counts, precomputed once per EM
//! iteration so the inner optimization loop never touches the sparse data.
//!
//! The analytic gradient is
//!
//! ```text
//! grad l(h) = wc - E (.) beta(h) - lambda * sign(h)
//! ```
//!
//! with `E` the row sums of `wc` broadcast across each row. `sign(0)` is
//! taken as exactly 0, so a deviation resting at zero feels no penalty pull;
//! elsewhere the sign is the true derivative of the L1 term. This generalized
//! gradient is an approximation at sign crossings and is relied on as such.
//!
//! Conventions
//! -----------
//! - The optimizer works on the row-major flattening of `h`; this module
//!   owns the reshape in both directions.
//! - `Data = ()`: everything the objective needs is captured at
//!   construction.
use crate::numerics::log_sum_axis;
use crate::optimization::{
    errors::{OptError, OptResult},
    eta::{
        traits::PenalizedLikelihood,
        types::{Cost, Eta, Grad},
    },
};
use ndarray::{Array1, Array2, ArrayView2, Axis};

/// Sign function with numpy semantics: `sign(0) = 0`.
///
/// `f64::signum` returns 1.0 at +0.0, which would add a spurious penalty
/// gradient to deviations resting exactly at zero (the warm-start state of
/// every entry in the first EM iteration).
pub(crate) fn l1_sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Penalized log-linear deviation objective for one feature.
///
/// Holds everything the objective and its gradient need, precomputed:
/// the base rates `m`, the weighted counts `wc = phi * X`, their row sums
/// `E`, and the sparsity weight `lambda`. Construction validates shapes and
/// value ranges so `value`/`grad` stay check-free on the hot path.
#[derive(Debug, Clone)]
pub struct EtaProblem {
    num_topics: usize,
    vocab_size: usize,
    base_rates: Array1<f64>,
    weighted_counts: Array2<f64>,
    /// Row sums of `weighted_counts`; the expected total count per topic.
    expected_totals: Array1<f64>,
    lambda: f64,
}

impl EtaProblem {
    /// Build the objective for one feature.
    ///
    /// # Parameters
    /// - `base_rates`: the fixed global log base-rate vector `m` (length V).
    /// - `weighted_counts`: `wc = phi * X` (k x V), responsibility-weighted
    ///   occurrence counts.
    /// - `lambda`: L1 sparsity weight, finite and >= 0.
    ///
    /// # Errors
    /// - [`OptError::BaseRateDimMismatch`] if `m` does not match the
    ///   weighted-count columns.
    /// - [`OptError::InvalidWeightedCount`] for negative or non-finite
    ///   weighted counts.
    /// - [`OptError::InvalidLambda`] for a negative or non-finite `lambda`.
    pub fn new(
        base_rates: Array1<f64>, weighted_counts: Array2<f64>, lambda: f64,
    ) -> OptResult<Self> {
        if !lambda.is_finite() || lambda < 0.0 {
            return Err(OptError::InvalidLambda { value: lambda });
        }
        let (num_topics, vocab_size) = weighted_counts.dim();
        if base_rates.len() != vocab_size {
            return Err(OptError::BaseRateDimMismatch {
                expected: vocab_size,
                actual: base_rates.len(),
            });
        }
        for ((z, v), &wc) in weighted_counts.indexed_iter() {
            if !wc.is_finite() || wc < 0.0 {
                return Err(OptError::InvalidWeightedCount { topic: z, entry: v, value: wc });
            }
        }
        let expected_totals = weighted_counts.sum_axis(Axis(1));
        Ok(Self { num_topics, vocab_size, base_rates, weighted_counts, expected_totals, lambda })
    }

    /// Number of free parameters (k x V) in the flattened deviation vector.
    pub fn dim(&self) -> usize {
        self.num_topics * self.vocab_size
    }

    /// Log of the row-normalized categorical distribution `beta(h)`.
    ///
    /// Computed entirely in log-space: `m + h` minus the per-row log-sum,
    /// so each row exponentiates to a distribution summing to 1 regardless
    /// of the magnitude of `h`.
    fn log_beta(&self, h: &ArrayView2<'_, f64>) -> Array2<f64> {
        let mut scores = h.to_owned();
        scores += &self.base_rates;
        let norms = log_sum_axis(&scores, Axis(1));
        scores - norms.insert_axis(Axis(1))
    }

    /// Reinterpret a flattened optimizer vector as the k x V matrix.
    fn as_matrix<'h>(&self, eta: &'h Eta) -> OptResult<ArrayView2<'h, f64>> {
        eta.view().into_shape((self.num_topics, self.vocab_size)).map_err(|_| {
            OptError::EtaDimMismatch { expected: self.dim(), actual: eta.len() }
        })
    }
}

impl PenalizedLikelihood for EtaProblem {
    type Data = ();

    /// Evaluate `l(h) = sum(wc (.) log beta(h)) - lambda * sum |h|`.
    fn value(&self, eta: &Eta, _data: &()) -> OptResult<Cost> {
        let h = self.as_matrix(eta)?;
        let log_beta = self.log_beta(&h);
        let fit = (&log_beta * &self.weighted_counts).sum();
        let penalty = self.lambda * eta.iter().map(|v| v.abs()).sum::<f64>();
        Ok(fit - penalty)
    }

    /// Analytic gradient `grad l(h) = wc - E (.) beta(h) - lambda * sign(h)`.
    fn grad(&self, eta: &Eta, _data: &()) -> OptResult<Grad> {
        let h = self.as_matrix(eta)?;
        let beta = self.log_beta(&h).mapv(f64::exp);

        let mut grad = self.weighted_counts.clone();
        grad -= &(&beta * &self.expected_totals.view().insert_axis(Axis(1)));
        grad.zip_mut_with(&h, |g, &hv| *g -= self.lambda * l1_sign(hv));

        grad.into_shape(self.dim())
            .map_err(|_| OptError::EtaDimMismatch { expected: self.dim(), actual: 0 })
    }

    /// Reject deviation vectors of the wrong length or with non-finite
    /// entries before optimization starts.
    fn check(&self, eta: &Eta, _data: &()) -> OptResult<()> {
        if eta.len() != self.dim() {
            return Err(OptError::EtaDimMismatch { expected: self.dim(), actual: eta.len() });
        }
        for (index, &value) in eta.iter().enumerate() {
            if !value.is_finite() {
                return Err(OptError::InvalidEtaInput { index, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Construction validation (lambda, dimensions, weighted counts).
    // - Agreement of the analytic gradient with central finite differences
    //   away from h = 0.
    // - The sign(0) = 0 convention at the warm-start point, where the L1
    //   term's generalized gradient deliberately drops the penalty pull.
    // -------------------------------------------------------------------------

    fn toy_problem(lambda: f64) -> EtaProblem {
        // 2 topics, 3 vocabulary entries.
        let m = array![0.7, 0.1, 0.3];
        let wc = array![[2.0, 0.0, 1.0], [0.5, 3.0, 0.0]];
        EtaProblem::new(m, wc, lambda).unwrap()
    }

    fn central_diff(problem: &EtaProblem, eta: &Eta) -> Grad {
        let eps = 1e-6;
        let mut grad = Eta::zeros(eta.len());
        for i in 0..eta.len() {
            let mut plus = eta.clone();
            let mut minus = eta.clone();
            plus[i] += eps;
            minus[i] -= eps;
            let fp = problem.value(&plus, &()).unwrap();
            let fm = problem.value(&minus, &()).unwrap();
            grad[i] = (fp - fm) / (2.0 * eps);
        }
        grad
    }

    #[test]
    // Purpose
    // -------
    // Malformed inputs are rejected at construction, not at evaluation.
    fn construction_validates_inputs() {
        let m = array![0.0, 0.0];
        let wc = array![[1.0, 2.0]];
        assert!(matches!(
            EtaProblem::new(m.clone(), wc.clone(), -0.5),
            Err(OptError::InvalidLambda { .. })
        ));
        assert!(matches!(
            EtaProblem::new(array![0.0], wc.clone(), 1.0),
            Err(OptError::BaseRateDimMismatch { .. })
        ));
        assert!(matches!(
            EtaProblem::new(m, array![[1.0, -2.0]], 1.0),
            Err(OptError::InvalidWeightedCount { topic: 0, entry: 1, .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Away from zero crossings the analytic gradient must agree with a
    // central finite-difference gradient of the full penalized objective.
    fn analytic_gradient_matches_finite_differences_away_from_zero() {
        let problem = toy_problem(0.8);
        let eta = array![0.4, -0.3, 0.9, -1.1, 0.2, 0.6];

        let analytic = problem.grad(&eta, &()).unwrap();
        let numeric = central_diff(&problem, &eta);

        for i in 0..eta.len() {
            assert!(
                (analytic[i] - numeric[i]).abs() < 1e-4,
                "index {i}: analytic {} vs numeric {}",
                analytic[i],
                numeric[i]
            );
        }
    }

    #[test]
    // Purpose
    // -------
    // At h = 0 the generalized gradient takes sign(0) = 0: the penalty
    // contributes nothing, so the gradient equals the smooth part
    // wc - E (.) beta alone even for large lambda.
    fn gradient_at_zero_drops_the_penalty_term() {
        let smooth = toy_problem(0.0);
        let penalized = toy_problem(10.0);
        let zero = Eta::zeros(6);

        let g_smooth = smooth.grad(&zero, &()).unwrap();
        let g_penalized = penalized.grad(&zero, &()).unwrap();

        for i in 0..6 {
            assert!(
                (g_smooth[i] - g_penalized[i]).abs() < 1e-12,
                "index {i}: {} vs {}",
                g_smooth[i],
                g_penalized[i]
            );
        }
    }

    #[test]
    // Purpose
    // -------
    // Objective sanity: with lambda = 0 and weighted counts concentrated on
    // one entry per topic, pushing h toward that entry must increase l(h).
    fn objective_rewards_deviations_toward_observed_mass() {
        let problem = toy_problem(0.0);
        let zero = Eta::zeros(6);
        // Raise topic 0's first entry and topic 1's second entry, where the
        // weighted counts concentrate.
        let toward = array![1.0, 0.0, 0.0, 0.0, 1.0, 0.0];

        let at_zero = problem.value(&zero, &()).unwrap();
        let at_toward = problem.value(&toward, &()).unwrap();
        assert!(at_toward > at_zero);
    }

    #[test]
    // Purpose
    // -------
    // `check` rejects wrong-length and non-finite warm starts.
    fn check_rejects_malformed_warm_starts() {
        let problem = toy_problem(1.0);
        assert!(matches!(
            problem.check(&array![0.0, 0.0], &()),
            Err(OptError::EtaDimMismatch { expected: 6, actual: 2 })
        ));
        let mut bad = Eta::zeros(6);
        bad[3] = f64::NAN;
        assert!(matches!(
            problem.check(&bad, &()),
            Err(OptError::InvalidEtaInput { index: 3, .. })
        ));
    }
}
