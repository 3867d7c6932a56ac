//! model — the geographic topic model and its EM engine.
//!
//! Purpose
//! -------
//! Everything between the raw dataset and the fitted parameters: the
//! validated data and configuration types ([`core`]), the EM engine itself
//! ([`em`]), the shared penalized-likelihood evaluation ([`likelihood`]),
//! held-out scoring and location queries ([`predict`]), and human-readable
//! region labels ([`labels`]).
//!
//! Layout
//! ------
//! - [`core`]: `TopicData`, `FeatureMatrix`, `ModelOptions`,
//!   `ModelParameters`, `Statistics`/`StatisticsTrace`, initialization.
//! - [`em`]: `GeoTopicModel` with `fit` and the parameter/statistics
//!   queries, plus the shared E-step routines.
//! - [`likelihood`]: the single likelihood implementation used by both the
//!   M-step commit decision and held-out scoring.
//! - [`predict`] / [`labels`]: query surface over a fitted model.
//! - [`errors`]: `ModelError` / `ModelResult`.

pub mod core;
pub mod em;
pub mod errors;
pub mod labels;
pub mod likelihood;
pub mod predict;

pub use self::core::{
    CovarianceMode, FeatureMatrix, ModelOptions, ModelParameters, RegionPrior, Statistics,
    StatisticsTrace, TopicData,
};
pub use self::em::GeoTopicModel;
pub use self::errors::{ModelError, ModelResult};
pub use self::labels::{LABEL_MASS_THRESHOLD, LABEL_MAX_ENTRIES};
