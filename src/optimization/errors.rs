//! Errors for the penalized-likelihood optimization layer (configuration
//! checks, gradient/iterate validation, and argmin backend failures).
//!
//! This module defines [`OptError`] and the crate-wide [`OptResult`] alias used
//! throughout the eta sub-optimizer.
//!
//! ## Conventions
//! - Configuration values (tolerances, iteration caps, segment lengths) are
//!   validated on construction; invalid values are reported here rather than
//!   deferred to the solver.
//! - Solver/backend errors from `argmin` are normalized into the wrapper
//!   variants at the module boundary; `argmin::core::Error` never leaks.
//! - A solver that merely fails to converge is NOT an error: the runner
//!   reports that through `OptimOutcome::converged`. `OptError` covers
//!   malformed problems and hard backend failures only.
use argmin::core::{ArgminError, Error};

/// Crate-wide result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

/// Unified error type for the eta optimization layer.
///
/// Covers gradient validation, option/tolerance validation, problem-shape
/// checks, and wrapped argmin backend errors.
#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Gradient ----
    /// Implies that finite differences should be used.
    GradientNotImplemented,

    /// Gradient dimensions do not match parameter dimensions.
    GradientDimMismatch { expected: usize, found: usize },

    /// Gradient elements need to be finite.
    InvalidGradient { index: usize, value: f64, reason: &'static str },

    // ---- Options validation ----
    /// Gradient tolerance needs to be positive and finite.
    InvalidTolGrad { tol: f64, reason: &'static str },

    /// Objective change tolerance needs to be positive and finite.
    InvalidTolCost { tol: f64, reason: &'static str },

    /// Maximum iterations needs to be positive.
    InvalidMaxIter { max_iter: usize, reason: &'static str },

    /// At least one tolerance must be provided.
    NoTolerancesProvided,

    /// Invalid line searcher name.
    InvalidLineSearch { name: String, reason: &'static str },

    /// Segment length for the conjugate-gradient runner must be at least 1.
    InvalidSegmentIters { iters: usize, reason: &'static str },

    // ---- Problem shape ----
    /// Sparsity weight must be finite and non-negative.
    InvalidLambda { value: f64 },

    /// Base-rate vector length does not match the weighted-count columns.
    BaseRateDimMismatch { expected: usize, actual: usize },

    /// Weighted counts must be finite and non-negative.
    InvalidWeightedCount { topic: usize, entry: usize, value: f64 },

    /// Flattened deviation vector length does not match k x V.
    EtaDimMismatch { expected: usize, actual: usize },

    /// Deviation entries fed to the objective must be finite.
    InvalidEtaInput { index: usize, value: f64 },

    // ---- Cost function ----
    /// Objective returned a non-finite value.
    NonFiniteCost { value: f64 },

    // ---- Optimizer outcome ----
    /// Estimated deviations must be finite.
    InvalidEtaHat { index: usize, value: f64, reason: &'static str },

    /// Best iterate is missing from the solver state.
    MissingEtaHat,

    // ---- Argmin ----
    /// Wrapper for argmin::InvalidParameter
    InvalidParameter { text: String },
    /// Wrapper for argmin::NotImplemented
    NotImplemented { text: String },
    /// Wrapper for argmin::NotInitialized
    NotInitialized { text: String },
    /// Wrapper for argmin::ConditionViolated
    ConditionViolated { text: String },
    /// Wrapper for argmin::CheckPointNotFound
    CheckPointNotFound { text: String },
    /// Wrapper for argmin::PotentialBug
    PotentialBug { text: String },
    /// Wrapper for argmin::ImpossibleError
    ImpossibleError { text: String },
    /// Wrapper for other argmin::Error types
    BackendError { text: String },

    // ---- Fallback ----
    UnknownError,
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Gradient ----
            OptError::GradientNotImplemented => {
                write!(f, "Gradient optimization not implemented")
            }
            OptError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient dimension mismatch: expected {expected}, found {found}")
            }
            OptError::InvalidGradient { index, value, reason } => {
                write!(f, "Invalid gradient at index {index}: {value}: {reason}")
            }

            // ---- Options validation ----
            OptError::InvalidTolGrad { tol, reason } => {
                write!(f, "Invalid gradient tolerance {tol}: {reason}")
            }
            OptError::InvalidTolCost { tol, reason } => {
                write!(f, "Invalid objective change tolerance {tol}: {reason}")
            }
            OptError::InvalidMaxIter { max_iter, reason } => {
                write!(f, "Invalid maximum iterations {max_iter}: {reason}")
            }
            OptError::NoTolerancesProvided => {
                write!(f, "No tolerances provided")
            }
            OptError::InvalidLineSearch { name, reason } => {
                write!(f, "Invalid line searcher '{name}': {reason}")
            }
            OptError::InvalidSegmentIters { iters, reason } => {
                write!(f, "Invalid segment length {iters}: {reason}")
            }

            // ---- Problem shape ----
            OptError::InvalidLambda { value } => {
                write!(f, "Sparsity weight must be finite and >= 0; got {value}")
            }
            OptError::BaseRateDimMismatch { expected, actual } => {
                write!(f, "Base-rate length mismatch: expected {expected}, got {actual}")
            }
            OptError::InvalidWeightedCount { topic, entry, value } => {
                write!(
                    f,
                    "Weighted count for topic {topic}, vocabulary entry {entry} must be finite and >= 0; got {value}"
                )
            }
            OptError::EtaDimMismatch { expected, actual } => {
                write!(f, "Deviation vector length mismatch: expected {expected}, got {actual}")
            }
            OptError::InvalidEtaInput { index, value } => {
                write!(f, "Deviation entry at index {index} must be finite; got {value}")
            }

            // ---- Cost function ----
            OptError::NonFiniteCost { value } => {
                write!(f, "Non-finite objective value: {value}")
            }

            // ---- Optimizer outcome ----
            OptError::InvalidEtaHat { index, value, reason } => {
                write!(f, "Invalid estimated deviation at index {index}: {value}: {reason}")
            }
            OptError::MissingEtaHat => {
                write!(f, "Missing estimated deviations (eta hat)")
            }

            // ---- Argmin ----
            OptError::InvalidParameter { text } => {
                write!(f, "Invalid parameter: {text}")
            }
            OptError::NotImplemented { text } => {
                write!(f, "Not implemented: {text}")
            }
            OptError::NotInitialized { text } => {
                write!(f, "Not initialized: {text}")
            }
            OptError::ConditionViolated { text } => {
                write!(f, "Condition violated: {text}")
            }
            OptError::CheckPointNotFound { text } => {
                write!(f, "Checkpoint not found: {text}")
            }
            OptError::PotentialBug { text } => {
                write!(f, "Potential bug: {text}")
            }
            OptError::ImpossibleError { text } => {
                write!(f, "Impossible error: {text}")
            }
            OptError::BackendError { text } => {
                write!(f, "Backend error: {text}")
            }

            // ---- Fallback ----
            OptError::UnknownError => {
                write!(f, "Unknown error")
            }
        }
    }
}

impl From<Error> for OptError {
    fn from(original_err: Error) -> Self {
        match original_err.downcast() {
            Ok(opt_err) => match opt_err {
                ArgminError::InvalidParameter { text } => OptError::InvalidParameter { text },
                ArgminError::NotImplemented { text } => OptError::NotImplemented { text },
                ArgminError::NotInitialized { text } => OptError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => OptError::ConditionViolated { text },
                ArgminError::CheckpointNotFound { text } => OptError::CheckPointNotFound { text },
                ArgminError::PotentialBug { text } => OptError::PotentialBug { text },
                ArgminError::ImpossibleError { text } => OptError::ImpossibleError { text },
                _ => OptError::UnknownError,
            },
            Err(err) => OptError::BackendError { text: err.to_string() },
        }
    }
}
