//! Shared input checks for the deviation optimizer.
//!
//! Everything the optimizer hands to or receives from the solver passes
//! through one of these helpers: tolerance values at configuration time
//! ([`verify_tol_grad`], [`verify_tol_cost`]), gradients and candidate
//! iterates during a run ([`validate_grad`], [`validate_eta_hat`]), and
//! objective values on the way out ([`validate_value`]). Each check maps a
//! bad input to a specific [`OptError`] variant so failures read the same
//! everywhere.
use crate::optimization::{
    errors::{OptError, OptResult},
    eta::types::{Eta, Grad},
};

/// Check an optional gradient-norm tolerance.
///
/// `None` simply disables the gradient stopping rule. A provided value
/// must be finite and strictly positive.
///
/// # Errors
/// [`OptError::InvalidTolGrad`] for non-finite or non-positive values.
pub fn verify_tol_grad(tol: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(OptError::InvalidTolGrad { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(OptError::InvalidTolGrad { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

/// Check an optional objective-change tolerance.
///
/// Same rules as [`verify_tol_grad`]: `None` disables the rule, anything
/// provided must be finite and strictly positive.
///
/// # Errors
/// [`OptError::InvalidTolCost`] for non-finite or non-positive values.
pub fn verify_tol_cost(tol: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(OptError::InvalidTolCost { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(OptError::InvalidTolCost { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

/// Check a gradient against the expected dimension and finiteness.
///
/// # Errors
/// - [`OptError::GradientDimMismatch`] when the length is not `dim`.
/// - [`OptError::InvalidGradient`] naming the first non-finite entry.
pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    for (index, &value) in grad.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidGradient {
                index,
                value,
                reason: "Gradient elements must be finite.",
            });
        }
    }
    Ok(())
}

/// Unwrap a candidate best iterate, requiring it to exist and be finite
/// throughout.
///
/// # Errors
/// - [`OptError::MissingEtaHat`] when the solver produced no iterate.
/// - [`OptError::InvalidEtaHat`] naming the first non-finite entry.
pub fn validate_eta_hat(eta_hat: Option<Eta>) -> OptResult<Eta> {
    match eta_hat {
        Some(h) => {
            for (index, &value) in h.iter().enumerate() {
                if !value.is_finite() {
                    return Err(OptError::InvalidEtaHat {
                        index,
                        value,
                        reason: "Deviation estimates must be finite.",
                    });
                }
            }
            Ok(h)
        }
        None => Err(OptError::MissingEtaHat),
    }
}

/// Check that a likelihood value is finite. The sign is unconstrained;
/// log-likelihoods are usually negative.
///
/// # Errors
/// [`OptError::NonFiniteCost`] for `NaN` or infinite values.
pub fn validate_value(value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::NonFiniteCost { value });
    }
    Ok(())
}
