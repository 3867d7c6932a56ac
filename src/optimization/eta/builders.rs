//! eta::builders — nonlinear CG solver construction helpers.
//!
//! Purpose
//! -------
//! Provide small, focused builders for the nonlinear conjugate-gradient
//! solvers used by the deviation optimizer. These helpers hide Argmin's
//! generic wiring so that higher-level code can request a configured solver
//! without touching Argmin-specific types.
//!
//! Key behaviors
//! -------------
//! - Construct Polak-Ribiere CG solvers with either Hager-Zhang or
//!   More-Thuente line search based on crate-level aliases.
//! - Leave the initial parameter vector and iteration limits to the
//!   runner/executor layer, keeping these builders side-effect free.
//!
//! Conventions
//! -----------
//! - Unlike quasi-Newton solvers, Argmin's nonlinear CG exposes no tolerance
//!   hooks; all tolerance handling lives in the segmented runner
//!   (`run_nlcg`), so these builders take no options at all.
//! - The runner constructs a fresh solver per segment, which doubles as a
//!   periodic CG restart.
use argmin::solver::conjugategradient::{NonlinearConjugateGradient, beta::PolakRibiere};

use crate::optimization::eta::types::{HagerZhangLS, MoreThuenteLS, NlcgHagerZhang, NlcgMoreThuente};

/// Construct a Polak-Ribiere nonlinear CG solver with Hager-Zhang line
/// search.
///
/// The solver carries no tolerances; termination is managed by the segmented
/// runner. Never fails.
pub fn build_solver_hager_zhang() -> NlcgHagerZhang {
    NonlinearConjugateGradient::new(HagerZhangLS::new(), PolakRibiere::new())
}

/// Construct a Polak-Ribiere nonlinear CG solver with More-Thuente line
/// search.
///
/// The solver carries no tolerances; termination is managed by the segmented
/// runner. Never fails.
pub fn build_solver_more_thuente() -> NlcgMoreThuente {
    NonlinearConjugateGradient::new(MoreThuenteLS::new(), PolakRibiere::new())
}
