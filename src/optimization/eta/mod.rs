//! eta — argmin-powered optimizer for sparse log-linear deviations.
//!
//! Purpose
//! -------
//! Provide the nested optimization layer the EM engine invokes once per
//! feature per M-step: **maximize a penalized likelihood** `l(h)` over a
//! k x V deviation matrix, using nonlinear conjugate gradient with an
//! analytic gradient and an L1 sparsity penalty. Callers implement
//! [`PenalizedLikelihood`] (or use the canonical [`problem::EtaProblem`])
//! and invoke [`fit_eta`].
//!
//! Key behaviors
//! -------------
//! - Convert a penalized likelihood `l(h)` into an Argmin-compatible cost
//!   `c(h) = -l(h)` via [`adapter::ArgMinAdapter`], with finite-difference
//!   gradient fallback when no analytic gradient exists.
//! - Run Polak-Ribiere nonlinear CG in segments ([`run::run_nlcg`]),
//!   checking the gradient infinity norm and objective improvement between
//!   segments, since the CG solver itself carries no tolerance hooks.
//! - Treat solver failures as non-fatal: the best iterate found (falling
//!   back to the warm start) is always returned, so the EM loop can proceed
//!   with a possibly-suboptimal but valid deviation matrix.
//!
//! Invariants & assumptions
//! ------------------------
//! - The optimizer **always maximizes**; user code implements `l(h)` and
//!   `grad l(h)`, never the cost directly.
//! - The deviation matrix travels through the solver as a row-major
//!   flattened [`Eta`]; the problem layer owns the reshape.
//! - Configuration types ([`Tolerances`], [`EtaOptions`]) are validated on
//!   construction and treated as internally consistent downstream.
//!
//! Downstream usage
//! ----------------
//! - The EM engine builds one [`problem::EtaProblem`] per feature per
//!   iteration (precomputing the weighted counts) and calls [`fit_eta`]
//!   with the previous iteration's deviations as the warm start.
//! - Front-end code interacts only with the re-exported surface:
//!   [`fit_eta`], [`PenalizedLikelihood`], [`EtaOptions`], [`Tolerances`],
//!   [`OptimOutcome`], plus the numeric aliases from [`types`].
//!
//! Testing notes
//! -------------
//! - Unit tests in submodules cover sign conventions and FD fallback
//!   ([`adapter`]), gradient correctness including the sign(0) convention
//!   ([`problem`]), runner convergence and budget behavior ([`run`]), and
//!   configuration invariants ([`traits`]).

pub mod adapter;
pub mod api;
pub mod builders;
pub mod problem;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::fit_eta;
pub use self::problem::EtaProblem;
pub use self::traits::{EtaOptions, LineSearcher, OptimOutcome, PenalizedLikelihood, Tolerances};
pub use self::types::{Cost, DEFAULT_SEGMENT_ITERS, Eta, FnEvalMap, Grad};
