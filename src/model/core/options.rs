//! Hyperparameters and fit configuration for the geographic topic model.
//!
//! Purpose
//! -------
//! Define [`ModelOptions`] (everything the EM engine reads besides the data),
//! the [`RegionPrior`] carrying caller-supplied fixed geographic parameters,
//! and the [`CovarianceMode`] switch between full and axis-aligned region
//! shapes.
//!
//! Key behaviors
//! ------------
//! - All constructors validate and fail fast; downstream code treats the
//!   configuration as internally consistent.
//! - When a [`RegionPrior`] is supplied, the fit holds the geographic
//!   parameters fixed for its whole duration (fixed-regions mode).
//!
//! Invariants
//! ----------
//! - `lambda` is finite and >= 0; `num_topics` and `max_iterations` are >= 1;
//!   `min_relative_change` is finite and > 0; `verbose` is 0, 1, or 2.
//! - A region prior, when present, matches `num_topics` in both the center
//!   and the covariance block count, and is entirely finite.
use ndarray::{Array2, Array3};

use crate::{
    model::errors::{ModelError, ModelResult},
    optimization::eta::traits::EtaOptions,
};

/// Shape of the per-region covariance update.
///
/// `Full` recomputes the complete 2 x 2 matrix each M-step; `Diagonal`
/// zeroes the off-diagonal terms after each update, constraining regions to
/// axis-aligned ellipses (the shape the random initialization starts from).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CovarianceMode {
    /// General 2 x 2 covariance per region.
    #[default]
    Full,
    /// Axis-aligned covariance; off-diagonal terms forced to zero.
    Diagonal,
}

/// Caller-supplied geographic parameters, held fixed for a whole fit.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionPrior {
    /// k x 2 region centers.
    pub centers: Array2<f64>,
    /// k x 2 x 2 region covariances.
    pub covariances: Array3<f64>,
}

impl RegionPrior {
    /// Validate the prior against the configured region count.
    ///
    /// # Errors
    /// - [`ModelError::RegionPriorShape`] when the block counts or the inner
    ///   dimensions disagree with `num_topics` x 2 (x 2).
    /// - [`ModelError::RegionPriorValue`] for any non-finite entry.
    pub fn new(
        centers: Array2<f64>, covariances: Array3<f64>, num_topics: usize,
    ) -> ModelResult<Self> {
        let shape_ok = centers.dim() == (num_topics, 2)
            && covariances.dim() == (num_topics, 2, 2);
        if !shape_ok {
            return Err(ModelError::RegionPriorShape {
                expected_topics: num_topics,
                centers: centers.nrows(),
                covariances: covariances.dim().0,
            });
        }
        for ((topic, _), &value) in centers.indexed_iter() {
            if !value.is_finite() {
                return Err(ModelError::RegionPriorValue { topic, value });
            }
        }
        for ((topic, _, _), &value) in covariances.indexed_iter() {
            if !value.is_finite() {
                return Err(ModelError::RegionPriorValue { topic, value });
            }
        }
        Ok(Self { centers, covariances })
    }
}

/// Validated hyperparameters for one model.
///
/// Construct via [`ModelOptions::new`]; fields are read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOptions {
    /// L1 sparsity weight on the deviation matrices.
    lambda: f64,
    /// Number of latent regions k.
    num_topics: usize,
    /// EM iteration budget.
    max_iterations: usize,
    /// Relative likelihood change below which the fit converges.
    min_relative_change: f64,
    /// Fixed geographic parameters; `Some` activates fixed-regions mode.
    initial_regions: Option<RegionPrior>,
    /// Full vs. axis-aligned covariance updates.
    covariance_mode: CovarianceMode,
    /// Retain the full per-iteration statistics history.
    track_params: bool,
    /// Diagnostic volume: 0 silent, 1 per-iteration, 2 per-feature.
    verbose: u8,
    /// RNG seed for deterministic initialization.
    seed: Option<u64>,
    /// Sub-optimizer configuration for the per-feature deviation fits.
    eta_options: EtaOptions,
}

impl ModelOptions {
    /// Validate and assemble a configuration.
    ///
    /// # Errors
    /// One of the hyperparameter-validation variants of [`ModelError`]; the
    /// region prior (when supplied) is checked against `num_topics` here, so
    /// a mismatched prior never reaches the engine.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        lambda: f64, num_topics: usize, max_iterations: usize, min_relative_change: f64,
        initial_regions: Option<RegionPrior>, covariance_mode: CovarianceMode,
        track_params: bool, verbose: u8, seed: Option<u64>, eta_options: EtaOptions,
    ) -> ModelResult<Self> {
        if !lambda.is_finite() || lambda < 0.0 {
            return Err(ModelError::InvalidLambda { value: lambda });
        }
        if num_topics == 0 {
            return Err(ModelError::InvalidTopicCount { value: num_topics });
        }
        if max_iterations == 0 {
            return Err(ModelError::InvalidIterationBudget { value: max_iterations });
        }
        if !min_relative_change.is_finite() || min_relative_change <= 0.0 {
            return Err(ModelError::InvalidRelativeChange { value: min_relative_change });
        }
        if verbose > 2 {
            return Err(ModelError::InvalidVerbosity { value: verbose });
        }
        if let Some(prior) = &initial_regions {
            // Priors built directly (struct literal) re-validate here.
            RegionPrior::new(prior.centers.clone(), prior.covariances.clone(), num_topics)?;
        }
        Ok(Self {
            lambda,
            num_topics,
            max_iterations,
            min_relative_change,
            initial_regions,
            covariance_mode,
            track_params,
            verbose,
            seed,
            eta_options,
        })
    }

    /// Minimal configuration: everything else at its default.
    pub fn with_defaults(lambda: f64, num_topics: usize) -> ModelResult<Self> {
        Self::new(
            lambda,
            num_topics,
            100,
            1e-5,
            None,
            CovarianceMode::default(),
            false,
            0,
            None,
            EtaOptions::default(),
        )
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn num_topics(&self) -> usize {
        self.num_topics
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn min_relative_change(&self) -> f64 {
        self.min_relative_change
    }

    pub fn initial_regions(&self) -> Option<&RegionPrior> {
        self.initial_regions.as_ref()
    }

    pub fn covariance_mode(&self) -> CovarianceMode {
        self.covariance_mode
    }

    pub fn track_params(&self) -> bool {
        self.track_params
    }

    pub fn verbose(&self) -> u8 {
        self.verbose
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn eta_options(&self) -> &EtaOptions {
        &self.eta_options
    }

    /// Same configuration with a different seed; used by the restart pool to
    /// give each restart its own deterministic stream.
    pub fn reseeded(&self, seed: Option<u64>) -> Self {
        let mut options = self.clone();
        options.seed = seed;
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Hyperparameter validation boundaries.
    // - Region prior shape and finiteness checks, including the cross-check
    //   against the configured region count.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Each invalid hyperparameter is rejected with its matching variant.
    fn hyperparameters_validate() {
        assert!(matches!(
            ModelOptions::with_defaults(-0.5, 2),
            Err(ModelError::InvalidLambda { .. })
        ));
        assert!(matches!(
            ModelOptions::with_defaults(1.0, 0),
            Err(ModelError::InvalidTopicCount { value: 0 })
        ));
        assert!(matches!(
            ModelOptions::new(
                1.0,
                2,
                0,
                1e-5,
                None,
                CovarianceMode::Full,
                false,
                0,
                None,
                EtaOptions::default()
            ),
            Err(ModelError::InvalidIterationBudget { value: 0 })
        ));
        assert!(matches!(
            ModelOptions::new(
                1.0,
                2,
                10,
                0.0,
                None,
                CovarianceMode::Full,
                false,
                0,
                None,
                EtaOptions::default()
            ),
            Err(ModelError::InvalidRelativeChange { .. })
        ));
        assert!(matches!(
            ModelOptions::new(
                1.0,
                2,
                10,
                1e-5,
                None,
                CovarianceMode::Full,
                false,
                3,
                None,
                EtaOptions::default()
            ),
            Err(ModelError::InvalidVerbosity { value: 3 })
        ));

        let opts = ModelOptions::with_defaults(0.0, 3).unwrap();
        assert_eq!(opts.num_topics(), 3);
        assert_eq!(opts.covariance_mode(), CovarianceMode::Full);
    }

    #[test]
    // Purpose
    // -------
    // A region prior must match the region count and be finite.
    fn region_prior_validates() {
        let centers = Array2::<f64>::zeros((2, 2));
        let covariances = Array3::<f64>::from_shape_fn((2, 2, 2), |(_, i, j)| {
            if i == j { 1.0 } else { 0.0 }
        });

        assert!(RegionPrior::new(centers.clone(), covariances.clone(), 2).is_ok());
        assert!(matches!(
            RegionPrior::new(centers.clone(), covariances.clone(), 3),
            Err(ModelError::RegionPriorShape { expected_topics: 3, .. })
        ));

        let mut bad_centers = centers;
        bad_centers[[1, 0]] = f64::INFINITY;
        assert!(matches!(
            RegionPrior::new(bad_centers, covariances, 2),
            Err(ModelError::RegionPriorValue { topic: 1, .. })
        ));
    }
}
