//! optimization — the nested solver layer beneath the EM engine.
//!
//! Purpose
//! -------
//! House the gradient-based sub-optimization invoked inside every M-step:
//! fitting each feature's sparse log-linear deviation matrix by maximizing a
//! penalized likelihood with nonlinear conjugate gradient. The EM engine
//! depends only on this module's [`eta`] surface and its [`errors`].
//!
//! Layout
//! ------
//! - [`errors`]: `OptError` / `OptResult`, including normalized wrappers for
//!   argmin backend failures.
//! - [`eta`]: the optimizer itself — trait, adapter, solver builders, the
//!   segmented runner, and the canonical per-feature problem.

pub mod errors;
pub mod eta;

pub use self::errors::{OptError, OptResult};
pub use self::eta::{
    EtaOptions, EtaProblem, LineSearcher, OptimOutcome, PenalizedLikelihood, Tolerances, fit_eta,
};
