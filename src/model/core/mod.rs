//! core — data, configuration, and plain records for the topic model.
//!
//! Purpose
//! -------
//! Everything the EM engine consumes and produces that is not the engine
//! itself: the validated dataset ([`data::TopicData`]), the sparse feature
//! matrices ([`sparse::FeatureMatrix`]), hyperparameters
//! ([`options::ModelOptions`]), the fitted snapshot
//! ([`params::ModelParameters`]), per-iteration statistics and their
//! retention policy ([`statistics`]), and the random initialization routines
//! ([`init`]).
//!
//! Conventions
//! -----------
//! - Constructors validate; the engine trusts what it receives.
//! - Records ([`params::ModelParameters`], [`statistics::Statistics`]) are
//!   plain serializable data with public fields; everything else keeps its
//!   fields private behind accessors.

pub mod data;
pub mod init;
pub mod options;
pub mod params;
pub mod sparse;
pub mod statistics;

pub use self::data::TopicData;
pub use self::options::{CovarianceMode, ModelOptions, RegionPrior};
pub use self::params::ModelParameters;
pub use self::sparse::FeatureMatrix;
pub use self::statistics::{Statistics, StatisticsTrace};
