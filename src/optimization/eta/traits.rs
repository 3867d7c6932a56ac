//! Optimizer-facing interface: the problem trait and its configuration.
//!
//! A problem implements [`PenalizedLikelihood`] (objective plus optional
//! analytic gradient); [`EtaOptions`], [`Tolerances`], and [`LineSearcher`]
//! configure a run; [`OptimOutcome`] is what `fit_eta` hands back.
//!
//! Sign convention: callers maximize `l(h)` while the machinery minimizes
//! `c(h) = -l(h)`. Analytic gradients are expressed in likelihood terms;
//! the adapter owns the flip.
use crate::optimization::{
    errors::{OptError, OptResult},
    eta::{
        types::{Cost, DEFAULT_SEGMENT_ITERS, Eta, FnEvalMap, Grad},
        validation::{validate_eta_hat, validate_value, verify_tol_cost, verify_tol_grad},
    },
};
use argmin::core::TerminationStatus;
use argmin_math::ArgminL2Norm;
use std::str::FromStr;

/// Objective interface for the deviation sub-problem.
///
/// Implementors supply the penalized likelihood `l(h)` to maximize and may
/// supply its analytic gradient; without one the optimizer falls back to
/// finite differences. Gradients are the likelihood's (the adapter negates
/// them for the minimized cost).
///
/// - `type Data`: per-problem payload threaded into every call.
/// - `value`: evaluate `l(h)`.
/// - `check`: pre-flight rejection of an invalid `(h, data)` pair, called
///   once before any solver work.
/// - `grad` (optional): analytic `grad l(h)`.
pub trait PenalizedLikelihood {
    type Data: 'static;

    // Required methods
    fn value(&self, eta: &Eta, data: &Self::Data) -> OptResult<Cost>;
    fn check(&self, eta: &Eta, data: &Self::Data) -> OptResult<()>;

    // Optional methods
    fn grad(&self, _eta: &Eta, _data: &Self::Data) -> OptResult<Grad> {
        Err(OptError::GradientNotImplemented)
    }
}

/// Line search driving the nonlinear CG solver.
///
/// The configured variant runs first; the segmented runner retries with
/// the other one when the line search breaks down away from a stationary
/// point. Parses case-insensitively from `"MoreThuente"` /
/// `"HagerZhang"`; anything else is `OptError::InvalidLineSearch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    /// Parse a line-search choice from a string (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Per-run configuration for the deviation optimizer.
///
/// - `tols`: stopping rules (see [`Tolerances`]).
/// - `line_searcher`: primary line search for nonlinear CG.
/// - `segment_iters`: solver iterations per runner segment. The CG solver
///   has no tolerance hooks, so the runner checks tolerances at segment
///   boundaries; each boundary also restarts the CG direction.
/// - `verbose`: print per-segment progress to stderr.
///
/// Defaults: gradient tolerance `1e-10` (infinity norm), no objective
/// tolerance, a 500-iteration cap, More-Thuente line search,
/// [`DEFAULT_SEGMENT_ITERS`]-iteration segments, quiet.
#[derive(Debug, Clone, PartialEq)]
pub struct EtaOptions {
    pub tols: Tolerances,
    pub line_searcher: LineSearcher,
    pub segment_iters: usize,
    pub verbose: bool,
}

impl EtaOptions {
    /// Create a new set of optimizer options.
    ///
    /// Numeric validation of the tolerances happens inside
    /// [`Tolerances::new`]; this constructor only rejects a zero segment
    /// length.
    pub fn new(
        tols: Tolerances, line_searcher: LineSearcher, segment_iters: usize, verbose: bool,
    ) -> OptResult<Self> {
        if segment_iters == 0 {
            return Err(OptError::InvalidSegmentIters {
                iters: segment_iters,
                reason: "Segment length must be greater than zero.",
            });
        }
        Ok(Self { tols, line_searcher, segment_iters, verbose })
    }
}

impl Default for EtaOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances::new(Some(1e-10), None, Some(500)).unwrap(),
            line_searcher: LineSearcher::MoreThuente,
            segment_iters: DEFAULT_SEGMENT_ITERS,
            verbose: false,
        }
    }
}

/// Stopping rules for the segmented runner.
///
/// - `tol_grad`: infinity-norm threshold on the likelihood gradient,
///   checked between segments.
/// - `tol_cost`: minimum objective improvement per segment.
/// - `max_iter`: cap on total solver iterations; hitting it reports
///   `converged = false`.
///
/// Each rule is optional, but [`Tolerances::new`] insists on at least one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Rules
    /// - At least one of `tol_grad`, `tol_cost`, or `max_iter` must be `Some`.
    /// - If provided, tolerances must be **finite and strictly positive**.
    /// - If provided, `max_iter` must be `> 0`.
    ///
    /// # Errors
    /// - [`OptError::NoTolerancesProvided`] if all three are `None`.
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] for
    ///   non-finite or non-positive tolerances.
    /// - `OptError::InvalidMaxIter` if `max_iter == 0`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol_cost(tol_cost)?;
        verify_tol_grad(tol_grad)?;
        if let Some(max_iter) = max_iter {
            if max_iter == 0 {
                return Err(OptError::InvalidMaxIter {
                    max_iter,
                    reason: "Maximum iterations must be greater than zero.",
                });
            }
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

/// What a deviation fit hands back.
///
/// `value` is the best penalized likelihood `l(eta_hat)`, not the
/// minimized cost. `converged` is `true` only when a tolerance was met;
/// budget exhaustion and unrecoverable solver breakdown report `false`
/// with the story in `status`. `fn_evals` accumulates solver counters
/// across segments, and `grad_norm` is the L2 norm of the last gradient
/// evaluated at `eta_hat`, when one was available.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub eta_hat: Eta,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl OptimOutcome {
    /// Validate raw solver state into an outcome.
    ///
    /// Requires a present, all-finite `eta_hat` and a finite `value`; maps
    /// `TerminationStatus::NotTerminated` to `converged = false` and any
    /// terminated status to `true`.
    ///
    /// # Errors
    /// Whatever `validate_eta_hat` or `validate_value` rejects.
    pub fn new(
        eta_hat_opt: Option<Eta>, value: f64, converged: TerminationStatus, iterations: u64,
        fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> OptResult<Self> {
        let eta_hat = validate_eta_hat(eta_hat_opt)?;
        validate_value(value)?;
        let status: String;
        let converged = match converged {
            TerminationStatus::NotTerminated => {
                status = "Not terminated".to_string();
                false
            }
            _ => {
                status = format!("{converged:?}");
                true
            }
        };
        let iterations = iterations as usize;
        let grad_norm = grad.map(|g| g.l2_norm());
        Ok(Self { eta_hat, value, converged, status, iterations, fn_evals, grad_norm })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::collections::HashMap;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - `LineSearcher` parsing (case-insensitivity and rejection).
    // - `Tolerances` and `EtaOptions` construction rules and defaults.
    // - `OptimOutcome::new` validation and status mapping.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Both line-search names parse case-insensitively; anything else is an
    // `InvalidLineSearch` error.
    fn line_searcher_parses_case_insensitively() {
        assert_eq!("morethuente".parse::<LineSearcher>(), Ok(LineSearcher::MoreThuente));
        assert_eq!("HAGERZHANG".parse::<LineSearcher>(), Ok(LineSearcher::HagerZhang));
        assert!(matches!(
            "newton".parse::<LineSearcher>(),
            Err(OptError::InvalidLineSearch { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // At least one tolerance must be given, and a zero segment length is
    // rejected by `EtaOptions::new`.
    fn options_constructors_enforce_rules() {
        assert_eq!(Tolerances::new(None, None, None), Err(OptError::NoTolerancesProvided));
        assert!(Tolerances::new(Some(1e-10), None, Some(500)).is_ok());
        assert!(matches!(
            Tolerances::new(None, None, Some(0)),
            Err(OptError::InvalidMaxIter { .. })
        ));

        let tols = Tolerances::new(Some(1e-10), None, Some(500)).unwrap();
        assert!(matches!(
            EtaOptions::new(tols, LineSearcher::MoreThuente, 0, false),
            Err(OptError::InvalidSegmentIters { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // The documented defaults match the reference configuration: infinity
    // norm gradient tolerance 1e-10 and a 500-iteration cap.
    fn default_options_match_documented_values() {
        let opts = EtaOptions::default();
        assert_eq!(opts.tols.tol_grad, Some(1e-10));
        assert_eq!(opts.tols.tol_cost, None);
        assert_eq!(opts.tols.max_iter, Some(500));
        assert_eq!(opts.line_searcher, LineSearcher::MoreThuente);
        assert_eq!(opts.segment_iters, DEFAULT_SEGMENT_ITERS);
        assert!(!opts.verbose);
    }

    #[test]
    // Purpose
    // -------
    // `OptimOutcome::new` rejects a missing iterate and a non-finite value,
    // and maps `NotTerminated` to `converged = false`.
    fn optim_outcome_validates_solver_state() {
        let evals: FnEvalMap = HashMap::new();

        assert_eq!(
            OptimOutcome::new(
                None,
                0.0,
                TerminationStatus::NotTerminated,
                0,
                evals.clone(),
                None
            ),
            Err(OptError::MissingEtaHat)
        );

        let h = array![0.1, -0.1];
        assert!(matches!(
            OptimOutcome::new(
                Some(h.clone()),
                f64::NAN,
                TerminationStatus::NotTerminated,
                0,
                evals.clone(),
                None
            ),
            Err(OptError::NonFiniteCost { .. })
        ));

        let out = OptimOutcome::new(
            Some(h.clone()),
            -3.5,
            TerminationStatus::NotTerminated,
            7,
            evals,
            Some(array![3.0, 4.0]),
        )
        .unwrap();
        assert_eq!(out.eta_hat, h);
        assert!(!out.converged);
        assert_eq!(out.iterations, 7);
        assert_eq!(out.grad_norm, Some(5.0));
    }
}
