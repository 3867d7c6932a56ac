//! eta::types — shared numeric aliases and solver wiring.
//!
//! Purpose
//! -------
//! Centralize the numeric types and solver aliases used by the deviation
//! optimizer. The rest of the optimization code stays agnostic to `ndarray`
//! and Argmin generics by importing these aliases.
//!
//! Key behaviors
//! -------------
//! - Define canonical aliases for the flattened deviation vector, its
//!   gradient, and the scalar cost (`Eta`, `Grad`, `Cost`).
//! - Provide the standard map type for Argmin function-evaluation counters
//!   (`FnEvalMap`).
//! - Expose pre-wired nonlinear conjugate-gradient solver aliases (Polak
//!   Ribiere beta update) for both line-search strategies.
//!
//! Conventions
//! -----------
//! - `Eta` holds a k x V deviation matrix flattened row-major; the problem
//!   layer owns the reshape in both directions.
//! - `Cost` is a scalar `f64`; the adapter layer handles the sign flip
//!   between the penalized likelihood and the minimized cost.
//! - `DEFAULT_SEGMENT_ITERS` is the number of solver iterations run between
//!   convergence checks in the segmented runner; callers may override it via
//!   per-run options.
use argmin::solver::{
    conjugategradient::{NonlinearConjugateGradient, beta::PolakRibiere},
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
};
use ndarray::Array1;
use std::collections::HashMap;

/// Flattened deviation vector `h` (k x V, row-major) for the eta optimizer.
///
/// Alias for `ndarray::Array1<f64>`, used as the canonical parameter type
/// throughout the optimizer.
pub type Eta = Array1<f64>;

/// Gradient vector matching the shape of [`Eta`].
pub type Grad = Array1<f64>;

/// Scalar objective value used by the optimizer.
///
/// In this crate, this is the cost `c(h) = -l(h)` derived from a penalized
/// likelihood `l(h)`.
pub type Cost = f64;

/// Function-evaluation counters as reported by the solver.
///
/// Maps human-readable counter names (e.g., `"cost_count"`) to counts.
pub type FnEvalMap = HashMap<String, u64>;

/// Default number of solver iterations per runner segment.
pub const DEFAULT_SEGMENT_ITERS: usize = 25;

/// Hager-Zhang line search specialized to this crate's numeric types.
pub type HagerZhangLS = HagerZhangLineSearch<Eta, Grad, Cost>;

/// More-Thuente line search specialized to this crate's numeric types.
pub type MoreThuenteLS = MoreThuenteLineSearch<Eta, Grad, Cost>;

/// Nonlinear CG (Polak-Ribiere) wired to the Hager-Zhang line search.
pub type NlcgHagerZhang = NonlinearConjugateGradient<Eta, HagerZhangLS, PolakRibiere, Cost>;

/// Nonlinear CG (Polak-Ribiere) wired to the More-Thuente line search.
pub type NlcgMoreThuente = NonlinearConjugateGradient<Eta, MoreThuenteLS, PolakRibiere, Cost>;
