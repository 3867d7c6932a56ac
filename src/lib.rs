//! geotopics — a probabilistic geographic topic model fit by EM.
//!
//! Purpose
//! -------
//! Jointly explain where point-of-interest visits happen and which
//! categorical features they carry (category, time of day, day of week,
//! visitor) as draws from a small number of latent regions. Each region has
//! a 2-D Gaussian geographic footprint and, per feature, a categorical
//! distribution expressed as an L1-regularized log-linear deviation from a
//! global base rate.
//!
//! Key behaviors
//! -------------
//! - [`model::GeoTopicModel::fit`] runs EM: a log-space E-step computing
//!   soft region assignments, an M-step updating mixture weights, region
//!   geometry, and the per-feature deviations through a nested
//!   conjugate-gradient optimizer, and a commit-or-halt decision driven by
//!   the penalized likelihood.
//! - [`restarts::fit_restarts`] runs independently seeded fits on a rayon
//!   pool and keeps the best by final likelihood.
//! - A fitted model answers held-out scoring queries and location queries
//!   (`predict_log_probs*`, `compute_prob_for_loc`, `compute_beta_for_loc`)
//!   and produces human-readable region labels.
//!
//! Conventions
//! -----------
//! - All probability arithmetic that can underflow runs in log-space through
//!   [`numerics::log_sum`] / [`numerics::log_sum_axis`].
//! - Constructors validate; the engine trusts validated inputs and reports
//!   numerical failures through [`model::ModelError`], never panics.
//! - Datasets are consumed as-is: coordinates are expected standardized and
//!   finite, feature matrices non-negative integer counts. Loading, feature
//!   extraction, and persistence belong to external collaborators
//!   ([`model::ModelParameters`] is serde-serializable for that purpose).
//!
//! Downstream usage
//! ----------------
//! Build a [`model::TopicData`] and validated [`model::ModelOptions`],
//! then either fit one [`model::GeoTopicModel`] directly or go through
//! [`restarts::fit_restarts`].

pub mod model;
pub mod numerics;
pub mod optimization;
pub mod restarts;

pub use crate::model::{
    CovarianceMode, FeatureMatrix, GeoTopicModel, ModelError, ModelOptions, ModelParameters,
    ModelResult, RegionPrior, Statistics, StatisticsTrace, TopicData,
};
pub use crate::optimization::{EtaOptions, LineSearcher, OptError, OptResult, Tolerances};
pub use crate::restarts::fit_restarts;
