//! Bridge between [`PenalizedLikelihood`] and `argmin`'s problem traits.
//!
//! `argmin` minimizes; this crate maximizes a penalized likelihood `l(h)`.
//! The adapter presents the cost `c(h) = -l(h)` and negates analytic
//! gradients to match. When a problem declines to provide a gradient, the
//! adapter finite-differences the cost closure directly, so that branch
//! needs no sign handling at all.
use std::cell::RefCell;

use crate::optimization::{
    errors::OptError,
    eta::{
        traits::PenalizedLikelihood,
        types::{Cost, Eta, Grad},
        validation::validate_grad,
    },
};
use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

/// Presents a [`PenalizedLikelihood`] to `argmin` as a cost-plus-gradient
/// minimization problem. Holds references only; see `Clone` below.
pub struct ArgMinAdapter<'a, F: PenalizedLikelihood> {
    pub f: &'a F,
    pub data: &'a F::Data,
}

// Both fields are shared references, so cloning is a bit copy regardless of
// whether `F` or `F::Data` implement `Clone`. A derive would demand those
// bounds and make the adapter unusable with non-`Clone` problems.
impl<'a, F: PenalizedLikelihood> Clone for ArgMinAdapter<'a, F> {
    fn clone(&self) -> Self {
        Self { f: self.f, data: self.data }
    }
}

impl<'a, F: PenalizedLikelihood> CostFunction for ArgMinAdapter<'a, F> {
    type Param = Eta;
    type Output = Cost;

    /// Cost of the minimization problem, `c(h) = -l(h)`.
    ///
    /// # Errors
    /// Propagates the problem's own failures and rejects a non-finite
    /// likelihood with `NonFiniteCost`.
    fn cost(&self, eta: &Self::Param) -> Result<Self::Output, Error> {
        let output = self.f.value(eta, self.data)?;
        if !output.is_finite() {
            return Err((OptError::NonFiniteCost { value: output }).into());
        }
        Ok(-output)
    }
}

impl<'a, F: PenalizedLikelihood> Gradient for ArgMinAdapter<'a, F> {
    type Param = Eta;
    type Gradient = Grad;

    /// Gradient of the cost at `h`.
    ///
    /// Prefers the problem's analytic gradient, validated and negated to
    /// match the cost. Without one, falls back to finite differences over
    /// the cost closure: central differences first, re-run with forward
    /// differences if a cost evaluation failed mid-stencil or the result
    /// fails validation.
    ///
    /// The finite-difference closure cannot return `Result`, so the first
    /// error raised by a cost evaluation is parked in `closure_err` and the
    /// closure yields `NaN`; once the stencil completes the parked error is
    /// surfaced or the forward retry triggered.
    ///
    /// # Errors
    /// - Problem errors other than `GradientNotImplemented` from `grad`.
    /// - Errors raised by cost evaluations inside the stencil.
    /// - Validation failures for dimension or non-finite entries.
    fn gradient(&self, eta: &Self::Param) -> Result<Self::Gradient, Error> {
        let dim = eta.len();
        match self.f.grad(eta, self.data) {
            Ok(g) => {
                validate_grad(&g, dim)?;
                Ok(-g)
            }
            Err(e) => {
                let closure_err: RefCell<Option<Error>> = RefCell::new(None);
                match e {
                    OptError::GradientNotImplemented => {
                        let cost_func = |eta: &Eta| -> f64 {
                            match self.cost(eta) {
                                Ok(val) => val,
                                Err(e) => {
                                    let mut slot = closure_err.borrow_mut();
                                    if slot.is_none() {
                                        *slot = Some(e);
                                    }
                                    f64::NAN
                                }
                            }
                        };
                        let mut fd_grad = eta.central_diff(&cost_func);
                        if closure_err.borrow().is_some() {
                            fd_grad = run_fd_diff(eta, &cost_func, &closure_err)?;
                            return Ok(fd_grad);
                        }
                        match validate_grad(&fd_grad, dim) {
                            Ok(()) => Ok(fd_grad),
                            Err(_) => {
                                fd_grad = run_fd_diff(eta, &cost_func, &closure_err)?;
                                Ok(fd_grad)
                            }
                        }
                    }
                    _ => Err(e.into()),
                }
            }
        }
    }
}

impl<'a, F: PenalizedLikelihood> ArgMinAdapter<'a, F> {
    /// Construct a new adapter over a problem and its data.
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data }
    }
}

/// Forward-difference gradient of `func` at `eta` with error capture.
///
/// Clears `closure_err`, runs the stencil, and surfaces any error the
/// closure parked there; otherwise validates the gradient and returns it.
///
/// # Errors
/// The parked evaluation error, or a validation failure on the result.
fn run_fd_diff<G: Fn(&Eta) -> f64>(
    eta: &Eta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> Result<Grad, Error> {
    closure_err.replace(None);
    let fd_grad = eta.forward_diff(func);
    let dim = eta.len();
    if let Some(err) = closure_err.take() {
        return Err(err);
    }
    validate_grad(&fd_grad, dim)?;
    Ok(fd_grad)
}
