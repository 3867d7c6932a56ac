//! Errors for the geographic topic model (data validation, hyperparameter
//! checks, likelihood failures, and optimizer propagation).
//!
//! This module defines [`ModelError`] and the crate-wide [`ModelResult`]
//! alias used across the EM engine and its data types.
//!
//! ## Conventions
//! - **Indices are 0-based.**
//! - Malformed inputs fail fast at construction time (data and options
//!   constructors), before the engine mutates any state.
//! - `LikelihoodNotComputable` / `NonFiniteLikelihood` mark the fatal
//!   condition that halts an EM run; the loop keeps the last committed
//!   parameters and `fit` still returns `Ok`, so these variants only cross
//!   the public API through prediction entry points.
//! - Sub-optimizer configuration errors are normalized to
//!   [`ModelError::Optimization`] with a human-readable status.
use crate::optimization::errors::OptError;

/// Crate-wide result alias for model operations that may produce
/// [`ModelError`].
pub type ModelResult<T> = Result<T, ModelError>;

/// Unified error type for the geographic topic model.
///
/// Covers input/data validation, hyperparameter checks, region prior
/// checks, fatal likelihood conditions, and optimizer propagation.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    // ---- Input/data validation ----
    /// Dataset has no points.
    EmptyData,

    /// Coordinates must be an N x 2 matrix.
    CoordinateDimension { cols: usize },

    /// A coordinate is NaN or infinite.
    NonFiniteCoordinate { row: usize, col: usize, value: f64 },

    /// A feature matrix disagrees with the coordinates on the row count.
    FeatureRowMismatch { feature: String, expected: usize, actual: usize },

    /// A feature's vocabulary length disagrees with its matrix columns.
    VocabularySizeMismatch { feature: String, expected: usize, actual: usize },

    /// A feature's aggregate count list disagrees with its vocabulary.
    CountsLengthMismatch { feature: String, expected: usize, actual: usize },

    /// A feature matrix was supplied without a vocabulary.
    MissingVocabulary { feature: String },

    /// A feature matrix was supplied without aggregate counts.
    MissingCounts { feature: String },

    /// A feature named in a query is not part of the model.
    UnknownFeature { feature: String },

    /// Venue identifiers must be empty or match the point count.
    VenueIdMismatch { expected: usize, actual: usize },

    // ---- Sparse matrix validation ----
    /// Occurrence entry addresses a column past the vocabulary.
    ColumnOutOfRange { row: usize, col: usize, num_cols: usize },

    /// Occurrence counts must be non-negative.
    NegativeCount { row: usize, col: usize, value: f64 },

    /// Occurrence counts must be integer-valued.
    NonIntegerCount { row: usize, col: usize, value: f64 },

    // ---- Hyperparameter validation ----
    /// Sparsity weight must be finite and >= 0.
    InvalidLambda { value: f64 },

    /// Number of regions must be at least 1.
    InvalidTopicCount { value: usize },

    /// Iteration budget must be at least 1.
    InvalidIterationBudget { value: usize },

    /// Convergence threshold must be finite and > 0.
    InvalidRelativeChange { value: f64 },

    /// Verbosity levels are 0, 1, and 2.
    InvalidVerbosity { value: u8 },

    /// Restart count must be at least 1.
    InvalidRestartCount { value: usize },

    // ---- Region prior validation ----
    /// Supplied centers must be k x 2 and covariances k x 2 x 2.
    RegionPriorShape { expected_topics: usize, centers: usize, covariances: usize },

    /// Region prior entries must be finite.
    RegionPriorValue { topic: usize, value: f64 },

    // ---- Likelihood (fatal for the current fit) ----
    /// A region covariance determinant is non-positive.
    LikelihoodNotComputable { topic: usize, determinant: f64 },

    /// The penalized likelihood evaluated to NaN or infinity.
    NonFiniteLikelihood { value: f64 },

    // ---- Lifecycle / optimizer ----
    /// Model hasn't been fitted yet.
    ModelNotFitted,

    /// Sub-optimizer failed; include a human-readable status.
    Optimization { status: String },
}

impl std::error::Error for ModelError {}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Input/data validation ----
            ModelError::EmptyData => {
                write!(f, "Dataset contains no points.")
            }
            ModelError::CoordinateDimension { cols } => {
                write!(f, "Coordinates must have exactly 2 columns; got {cols}")
            }
            ModelError::NonFiniteCoordinate { row, col, value } => {
                write!(f, "Coordinate at ({row}, {col}) is non-finite: {value}")
            }
            ModelError::FeatureRowMismatch { feature, expected, actual } => {
                write!(
                    f,
                    "Feature '{feature}' row count mismatch: expected {expected}, got {actual}"
                )
            }
            ModelError::VocabularySizeMismatch { feature, expected, actual } => {
                write!(
                    f,
                    "Feature '{feature}' vocabulary length mismatch: expected {expected}, got {actual}"
                )
            }
            ModelError::CountsLengthMismatch { feature, expected, actual } => {
                write!(
                    f,
                    "Feature '{feature}' counts length mismatch: expected {expected}, got {actual}"
                )
            }
            ModelError::MissingVocabulary { feature } => {
                write!(f, "Feature '{feature}' has no vocabulary list")
            }
            ModelError::MissingCounts { feature } => {
                write!(f, "Feature '{feature}' has no aggregate counts")
            }
            ModelError::UnknownFeature { feature } => {
                write!(f, "Feature '{feature}' is not part of the model")
            }
            ModelError::VenueIdMismatch { expected, actual } => {
                write!(f, "Venue id count mismatch: expected {expected} (or 0), got {actual}")
            }

            // ---- Sparse matrix validation ----
            ModelError::ColumnOutOfRange { row, col, num_cols } => {
                write!(
                    f,
                    "Occurrence entry at row {row} addresses column {col}, but the vocabulary has {num_cols} entries"
                )
            }
            ModelError::NegativeCount { row, col, value } => {
                write!(f, "Occurrence count at ({row}, {col}) is negative: {value}")
            }
            ModelError::NonIntegerCount { row, col, value } => {
                write!(f, "Occurrence count at ({row}, {col}) is not integer-valued: {value}")
            }

            // ---- Hyperparameter validation ----
            ModelError::InvalidLambda { value } => {
                write!(f, "Sparsity weight must be finite and >= 0; got {value}")
            }
            ModelError::InvalidTopicCount { value } => {
                write!(f, "Number of regions must be at least 1; got {value}")
            }
            ModelError::InvalidIterationBudget { value } => {
                write!(f, "Iteration budget must be at least 1; got {value}")
            }
            ModelError::InvalidRelativeChange { value } => {
                write!(f, "Convergence threshold must be finite and > 0; got {value}")
            }
            ModelError::InvalidVerbosity { value } => {
                write!(f, "Verbosity must be 0, 1, or 2; got {value}")
            }
            ModelError::InvalidRestartCount { value } => {
                write!(f, "Restart count must be at least 1; got {value}")
            }

            // ---- Region prior validation ----
            ModelError::RegionPriorShape { expected_topics, centers, covariances } => {
                write!(
                    f,
                    "Region prior must supply {expected_topics} centers and covariances; got {centers} centers and {covariances} covariances"
                )
            }
            ModelError::RegionPriorValue { topic, value } => {
                write!(f, "Region prior for topic {topic} contains a non-finite value: {value}")
            }

            // ---- Likelihood ----
            ModelError::LikelihoodNotComputable { topic, determinant } => {
                write!(
                    f,
                    "Likelihood not computable: covariance determinant for topic {topic} is {determinant}"
                )
            }
            ModelError::NonFiniteLikelihood { value } => {
                write!(f, "Penalized likelihood is non-finite: {value}")
            }

            // ---- Lifecycle / optimizer ----
            ModelError::ModelNotFitted => {
                write!(f, "Model hasn't been fitted yet.")
            }
            ModelError::Optimization { status } => {
                write!(f, "Sub-optimizer failed with status: {status}")
            }
        }
    }
}

impl From<OptError> for ModelError {
    fn from(err: OptError) -> ModelError {
        ModelError::Optimization { status: err.to_string() }
    }
}
