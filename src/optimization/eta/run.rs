//! Segmented execution of an `argmin` nonlinear CG solver.
//!
//! Argmin's nonlinear conjugate-gradient solver exposes no tolerance hooks,
//! so termination is handled here: the solver runs in short segments
//! (`opts.segment_iters` iterations each) and the runner checks the gradient
//! infinity norm and objective improvement between segments, warm-starting
//! each segment from the best iterate so far. Each segment boundary also
//! resets the CG search direction, acting as a periodic restart.
//!
//! Line-search breakdown needs special care. The More-Thuente search aborts
//! with "not a descent direction" precisely when the iterate is numerically
//! stationary, and argmin returns `Err` with no state, discarding every
//! iteration of the failed segment. The runner therefore:
//!
//! - checks the gradient tolerance at the warm start before launching any
//!   segment (a warm start that is already optimal would only trip the line
//!   search);
//! - on a solver `Err`, re-evaluates the gradient at the best committed
//!   iterate and finishes **converged** if the tolerance is met;
//! - otherwise drops to one-iteration segments so progress commits between
//!   runs, and finally retries with the fallback line search before giving
//!   up.
//!
//! Failure handling matches the EM engine's contract: a solver or
//! line-search failure is never an error. The runner returns the best
//! iterate found so far (falling back to the warm start), marked
//! `converged = false` with the failure recorded in `status`.
use crate::optimization::{
    errors::{OptError, OptResult},
    eta::{
        adapter::ArgMinAdapter,
        traits::{EtaOptions, OptimOutcome, PenalizedLikelihood},
        types::{Eta, FnEvalMap, Grad},
    },
};
use argmin::core::{CostFunction, Error, Executor, Gradient, IterState, Solver, State};
use argmin_math::ArgminL2Norm;

/// Solver state type threaded through the executor.
type NlcgState = IterState<Eta, Grad, (), (), (), f64>;

/// Run a segmented nonlinear CG optimization for a penalized-likelihood
/// problem.
///
/// # Arguments
/// - `eta0`: Warm-start deviation vector. Consumed; becomes the first
///   segment's initial parameter and the fallback best iterate.
/// - `opts`: Optimizer options (tolerances, segment length, verbosity).
/// - `problem`: An [`ArgMinAdapter`] wrapping the problem and its data.
/// - `make_solver`: Factory producing a fresh primary solver per segment
///   (CG state does not survive segment boundaries).
/// - `make_fallback`: Factory for the alternate-line-search solver used
///   when the primary's line search breaks down away from a stationary
///   point.
///
/// # Returns
/// An [`OptimOutcome`] with the best deviation vector, best likelihood value
/// `l(h_hat)`, a convergence flag, status text, total iterations, and
/// accumulated function-evaluation counts.
///
/// # Errors
/// Only configuration and validation errors surface as `Err`. Solver
/// runtime failures produce an `Ok` outcome: converged when the gradient
/// tolerance holds at the best iterate (breakdown at a stationary point is
/// convergence), non-converged with the best iterate otherwise.
pub fn run_nlcg<'a, F, S, T, B, C>(
    eta0: Eta, opts: &EtaOptions, problem: ArgMinAdapter<'a, F>, make_solver: B,
    make_fallback: C,
) -> OptResult<OptimOutcome>
where
    F: PenalizedLikelihood,
    S: Solver<ArgMinAdapter<'a, F>, NlcgState> + Send + 'static,
    T: Solver<ArgMinAdapter<'a, F>, NlcgState> + Send + 'static,
    B: Fn() -> S,
    C: Fn() -> T,
{
    let mut best_eta = eta0;
    // The warm start may sit outside the objective's finite range; keep -inf
    // so the first finite segment value always replaces it.
    let mut best_value = match problem.cost(&best_eta) {
        Ok(cost) => -cost,
        Err(_) => f64::NEG_INFINITY,
    };
    let mut total_iters: u64 = 0;
    let mut fn_evals: FnEvalMap = FnEvalMap::new();
    let max_iter = opts.tols.max_iter.unwrap_or(usize::MAX) as u64;
    let mut segment_len = opts.segment_iters as u64;
    let mut on_fallback = false;

    // Launching CG from a stationary warm start only trips the line search.
    if grad_within_tol(&problem, &best_eta, opts.tols.tol_grad) {
        return Ok(finish(
            &problem,
            best_eta,
            best_value,
            true,
            "Gradient tolerance reached at warm start".to_string(),
            0,
            fn_evals,
        ));
    }

    loop {
        let remaining = max_iter.saturating_sub(total_iters);
        let segment = segment_len.min(remaining);
        if segment == 0 {
            return Ok(finish(
                &problem,
                best_eta,
                best_value,
                false,
                "Iteration budget exhausted".to_string(),
                total_iters,
                fn_evals,
            ));
        }

        let run: Result<NlcgState, Error> = if on_fallback {
            Executor::new(problem.clone(), make_fallback())
                .configure(|state| state.param(best_eta.clone()).max_iters(segment))
                .run()
                .map(|result| result.state().clone())
        } else {
            Executor::new(problem.clone(), make_solver())
                .configure(|state| state.param(best_eta.clone()).max_iters(segment))
                .run()
                .map(|result| result.state().clone())
        };

        let mut state = match run {
            Ok(state) => state,
            Err(err) => {
                // An `Err` carries no state: every iteration of the failed
                // segment is lost and `best_eta` is the last committed
                // iterate. Breakdown at a stationary point is convergence.
                if grad_within_tol(&problem, &best_eta, opts.tols.tol_grad) {
                    return Ok(finish(
                        &problem,
                        best_eta,
                        best_value,
                        true,
                        "Gradient tolerance reached".to_string(),
                        total_iters,
                        fn_evals,
                    ));
                }
                if segment_len > 1 {
                    // Re-run one iteration at a time so progress commits
                    // before the line search can break down again.
                    segment_len = 1;
                    continue;
                }
                if !on_fallback {
                    on_fallback = true;
                    continue;
                }
                let status = format!("Solver failure: {}", OptError::from(err));
                return Ok(finish(
                    &problem, best_eta, best_value, false, status, total_iters, fn_evals,
                ));
            }
        };

        let seg_iters = state.get_iter();
        total_iters += seg_iters;
        accumulate_counts(&mut fn_evals, state.get_func_counts());

        let previous_value = best_value;
        let seg_value = -state.get_best_cost();
        if seg_value.is_finite() && seg_value >= best_value {
            if let Some(param) = state.take_best_param() {
                best_value = seg_value;
                best_eta = param;
            }
        }

        if opts.verbose {
            eprintln!(
                "eta segment done: total iters = {total_iters}, l(h) = {best_value:.6}"
            );
        }

        if grad_within_tol(&problem, &best_eta, opts.tols.tol_grad) {
            return Ok(finish(
                &problem,
                best_eta,
                best_value,
                true,
                "Gradient tolerance reached".to_string(),
                total_iters,
                fn_evals,
            ));
        }
        if let Some(tol) = opts.tols.tol_cost {
            if previous_value.is_finite() && (best_value - previous_value).abs() < tol {
                return Ok(finish(
                    &problem,
                    best_eta,
                    best_value,
                    true,
                    "Objective change tolerance reached".to_string(),
                    total_iters,
                    fn_evals,
                ));
            }
        }
        if seg_iters == 0 {
            // Solver terminated before taking a step; re-running the same
            // segment cannot make progress. Try the alternate line search
            // once before giving up.
            if !on_fallback {
                on_fallback = true;
                continue;
            }
            let status = format!("{:?}", state.get_termination_status());
            return Ok(finish(
                &problem, best_eta, best_value, false, status, total_iters, fn_evals,
            ));
        }
    }
}

/// Assemble an [`OptimOutcome`] without re-validating the value.
///
/// Failure paths legitimately carry `-inf` (warm start never evaluated), so
/// this constructor bypasses `OptimOutcome::new`'s finiteness check and fills
/// the gradient norm opportunistically.
fn finish<F: PenalizedLikelihood>(
    problem: &ArgMinAdapter<'_, F>, eta_hat: Eta, value: f64, converged: bool, status: String,
    iterations: u64, fn_evals: FnEvalMap,
) -> OptimOutcome {
    let grad_norm = problem.gradient(&eta_hat).ok().map(|g| g.l2_norm());
    OptimOutcome {
        eta_hat,
        value,
        converged,
        status,
        iterations: iterations as usize,
        fn_evals,
        grad_norm,
    }
}

/// Whether the likelihood gradient at `eta` meets the infinity-norm
/// tolerance. `None` tolerance or an unevaluable gradient both count as
/// "no".
fn grad_within_tol<F: PenalizedLikelihood>(
    problem: &ArgMinAdapter<'_, F>, eta: &Eta, tol: Option<f64>,
) -> bool {
    match (tol, problem.gradient(eta)) {
        (Some(tol), Ok(grad)) => inf_norm(&grad) < tol,
        _ => false,
    }
}

/// Merge a segment's function-evaluation counters into the running totals.
fn accumulate_counts(totals: &mut FnEvalMap, segment: &FnEvalMap) {
    for (name, count) in segment {
        *totals.entry(name.clone()).or_insert(0) += count;
    }
}

/// Infinity norm of a gradient vector.
fn inf_norm(grad: &Grad) -> f64 {
    grad.iter().fold(0.0_f64, |acc, &v| acc.max(v.abs()))
}
