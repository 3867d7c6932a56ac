//! High-level entry point for maximizing a [`PenalizedLikelihood`].
//!
//! This selects a nonlinear CG solver with either Hager-Zhang or
//! More-Thuente line search, wraps the problem in an `ArgMinAdapter` (which
//! *minimizes* `-l(h)`), and delegates the run to the segmented runner
//! `run_nlcg`.
use crate::optimization::{
    errors::OptResult,
    eta::{
        OptimOutcome,
        adapter::ArgMinAdapter,
        builders::{build_solver_hager_zhang, build_solver_more_thuente},
        run::run_nlcg,
        traits::{EtaOptions, LineSearcher, PenalizedLikelihood},
        types::Eta,
    },
};

/// Maximize a penalized likelihood `l(h)` with nonlinear CG.
///
/// # Behavior
/// - Validates the warm start via `f.check(eta0, data)`.
/// - Wraps `(f, data)` in an `ArgMinAdapter` that exposes a *minimization*
///   problem `c(h) = -l(h)` to `argmin`.
/// - Builds a Polak-Ribiere CG solver with the configured line search and
///   runs it in segments, checking tolerances between segments. The other
///   line search serves as the runner's fallback when the configured one
///   breaks down away from a stationary point.
///
/// # Parameters
/// - `f`: The problem implementing [`PenalizedLikelihood`].
/// - `eta0`: Warm-start deviation vector (the previous EM iteration's `h`
///   in the engine's usage; continuity across iterations is what makes the
///   nested optimization cheap).
/// - `data`: Problem data passed through to `value`/`grad`.
/// - `opts`: Optimizer options (tolerances, line search, segment length).
///
/// # Errors
/// - Propagates any error from `f.check`.
/// - Solver runtime failures do NOT surface here; the runner folds them
///   into an `Ok` outcome carrying the best iterate.
pub fn fit_eta<F: PenalizedLikelihood>(
    f: &F, eta0: Eta, data: &F::Data, opts: &EtaOptions,
) -> OptResult<OptimOutcome> {
    f.check(&eta0, data)?;
    let problem = ArgMinAdapter::new(f, data);
    match opts.line_searcher {
        LineSearcher::MoreThuente => run_nlcg(
            eta0,
            opts,
            problem,
            build_solver_more_thuente,
            build_solver_hager_zhang,
        ),
        LineSearcher::HagerZhang => run_nlcg(
            eta0,
            opts,
            problem,
            build_solver_hager_zhang,
            build_solver_more_thuente,
        ),
    }
}
