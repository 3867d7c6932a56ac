//! numerics — log-domain reductions and tolerant density evaluation.
//!
//! Purpose
//! -------
//! Provide the small set of numerical primitives the EM engine leans on
//! everywhere: stable log-sum-exp reductions over `ndarray` containers and a
//! bivariate Gaussian log-density that tolerates singular covariance
//! matrices instead of failing.
//!
//! Key behaviors
//! -------------
//! - [`log_sum`] / [`log_sum_axis`] compute `log(Σ exp(xᵢ))` without overflow
//!   or underflow by subtracting the running maximum; `-∞` inputs act as the
//!   identity element of the reduction.
//! - [`GeoDensity`] evaluates a 2-D Gaussian log-density through `statrs`
//!   when the covariance is positive-definite and falls back to a
//!   pseudo-inverse evaluation (symmetric eigendecomposition) when it is
//!   degenerate, so the E-step never aborts on a collapsed region.
//!
//! Conventions
//! -----------
//! - All inputs and outputs live in log-space unless a name says otherwise
//!   (`GeoDensity::pdf` is the only probability-space accessor).
//! - These helpers never return errors; degenerate covariances evaluate the
//!   density of the projection onto their support instead of failing.

pub mod gaussian;
pub mod log_sum;

pub use self::gaussian::GeoDensity;
pub use self::log_sum::{log_sum, log_sum_axis};
