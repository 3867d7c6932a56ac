//! The EM engine: fitting a geographic topic model.
//!
//! Purpose
//! -------
//! [`GeoTopicModel`] owns the full fit lifecycle: random (or caller-fixed)
//! initialization, the E-step computing soft region assignments, the M-step
//! updating mixture weights, geographic parameters, and per-feature
//! log-linear deviations through the nested eta optimizer, and the
//! commit-or-halt decision driven by the penalized likelihood.
//!
//! Key behaviors
//! -------------
//! - Every iteration computes a full candidate parameter set, evaluates the
//!   likelihood on the candidates, and only then commits. A likelihood
//!   failure (non-positive covariance determinant, non-finite total) halts
//!   the loop keeping the last committed state; `fit` still returns `Ok`,
//!   since a shorter run is a valid fit.
//! - Convergence is `|delta L / L| < min_relative_change`, checked once per
//!   committed iteration, never mid-iteration.
//! - In fixed-regions mode the caller-supplied centers and covariances are
//!   never touched; the geographic M-step is skipped entirely.
//!
//! Invariants
//! ----------
//! - `theta` sums to 1, each `phi` column sums to 1, and each `beta` row
//!   sums to 1 after every commit (all three are produced by explicit
//!   normalizations).
//! - The committed `Statistics` always describes the committed parameters.
use std::collections::BTreeMap;

use ndarray::{Array1, Array2, Array3, Axis};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{
    model::{
        core::{
            CovarianceMode, ModelOptions, ModelParameters, Statistics, StatisticsTrace, TopicData,
            init,
        },
        errors::{ModelError, ModelResult},
        likelihood::compute_likelihood,
    },
    numerics::{GeoDensity, log_sum_axis},
    optimization::eta::{api::fit_eta, problem::EtaProblem, types::Eta},
};

/// Weight-sum regularizer in the covariance update, guarding against a
/// region whose total responsibility collapses toward zero.
const COVAR_STABILIZER: f64 = 4.0;

/// A geographic topic model: latent regions with 2-D Gaussian footprints and
/// per-feature categorical distributions.
///
/// Construct with validated [`ModelOptions`], call
/// [`fit`](GeoTopicModel::fit), then query [`params`](GeoTopicModel::params)
/// and the prediction operations.
#[derive(Debug, Clone)]
pub struct GeoTopicModel {
    pub(crate) options: ModelOptions,
    pub(crate) params: Option<ModelParameters>,
    pub(crate) trace: StatisticsTrace,
}

impl GeoTopicModel {
    /// Create an unfitted model from a validated configuration.
    pub fn new(options: ModelOptions) -> Self {
        let trace = StatisticsTrace::new(options.track_params());
        Self { options, params: None, trace }
    }

    /// The configuration this model was built with.
    pub fn options(&self) -> &ModelOptions {
        &self.options
    }

    /// The fitted parameter snapshot.
    ///
    /// # Errors
    /// [`ModelError::ModelNotFitted`] before the first successful `fit`.
    pub fn params(&self) -> ModelResult<&ModelParameters> {
        self.params.as_ref().ok_or(ModelError::ModelNotFitted)
    }

    /// The most recently committed iteration statistics, if any.
    pub fn latest_statistics(&self) -> Option<&Statistics> {
        self.trace.latest()
    }

    /// The full committed history (empty unless `track_params` was set).
    pub fn statistics_history(&self) -> &[Statistics] {
        self.trace.history()
    }

    /// Run EM to convergence (or the iteration budget) on `data`.
    ///
    /// Refitting resets the statistics trace and draws a fresh
    /// initialization.
    ///
    /// # Errors
    /// Only configuration and data inconsistencies surface here; numerical
    /// likelihood failures halt the loop internally and keep the last
    /// committed state.
    pub fn fit(&mut self, data: &TopicData) -> ModelResult<()> {
        self.trace.reset();
        let mut params = self.initialize(data)?;
        let fixed_regions = self.options.initial_regions().is_some();
        let mut latest = f64::NEG_INFINITY;

        for iteration in 0..self.options.max_iterations() {
            // E-step.
            let scores = assignment_scores(&params, data)?;
            let phi = posterior_phi(&scores);

            // M-step candidates.
            let theta = update_theta(&phi);
            let (centers, covariances) = if fixed_regions {
                (params.topic_centers.clone(), params.topic_covar.clone())
            } else {
                update_regions(&phi, data.coordinates(), self.options.covariance_mode())
            };

            let mut h_arrays = BTreeMap::new();
            let mut beta_arrays = BTreeMap::new();
            for (name, matrix) in data.features() {
                let base_rates = params
                    .m_arrays
                    .get(name)
                    .ok_or_else(|| ModelError::UnknownFeature { feature: name.clone() })?;
                let weighted = matrix.weighted_counts(phi.view());
                let problem =
                    EtaProblem::new(base_rates.clone(), weighted, self.options.lambda())?;
                // Warm-start from the previous iteration's deviations.
                let previous = params
                    .h_arrays
                    .get(name)
                    .ok_or_else(|| ModelError::UnknownFeature { feature: name.clone() })?;
                let warm = Eta::from_iter(previous.iter().copied());

                let outcome = fit_eta(&problem, warm, &(), self.options.eta_options())?;
                if self.options.verbose() >= 2 {
                    eprintln!(
                        "[geotopics] iteration {iteration}, feature '{name}': {} after {} solver iterations",
                        outcome.status, outcome.iterations
                    );
                }

                let shape = previous.dim();
                let h = outcome.eta_hat.into_shape(shape).map_err(|_| {
                    ModelError::Optimization {
                        status: format!("deviation result for feature '{name}' has the wrong length"),
                    }
                })?;
                let beta = derive_beta(base_rates, &h);
                h_arrays.insert(name.clone(), h);
                beta_arrays.insert(name.clone(), beta);
            }

            // Evaluate on the candidates, then commit or halt.
            match compute_likelihood(
                self.options.lambda(),
                data,
                &phi,
                &theta,
                &centers,
                &covariances,
                &h_arrays,
                &beta_arrays,
            ) {
                Ok(stats) => {
                    params.phi = phi;
                    params.theta = theta;
                    if !fixed_regions {
                        params.topic_centers = centers;
                        params.topic_covar = covariances;
                    }
                    params.h_arrays = h_arrays;
                    params.beta_arrays = beta_arrays;

                    let new_likelihood = stats.likelihood;
                    if self.options.verbose() >= 1 {
                        eprintln!(
                            "[geotopics] iteration {iteration}: likelihood {new_likelihood:.6}"
                        );
                    }
                    self.trace.record(stats);

                    let delta = (new_likelihood - latest).abs();
                    let converged = delta / new_likelihood.abs()
                        < self.options.min_relative_change();
                    latest = new_likelihood;
                    if converged {
                        break;
                    }
                }
                Err(err) => {
                    log::warn!("EM halted at iteration {iteration}: {err}");
                    break;
                }
            }
        }

        self.params = Some(params);
        Ok(())
    }

    /// Draw the starting state: random (or fixed) geographic parameters,
    /// uniform theta, zero phi, base rates `ln(1 + count)`, zero deviations.
    fn initialize(&self, data: &TopicData) -> ModelResult<ModelParameters> {
        let num_topics = self.options.num_topics();
        let num_points = data.num_points();

        let mut rng = match self.options.seed() {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let (topic_centers, topic_covar) = match self.options.initial_regions() {
            Some(prior) => (prior.centers.clone(), prior.covariances.clone()),
            None => (
                init::random_centers(data.coordinates().view(), num_topics, &mut rng),
                init::random_covariances(num_topics, &mut rng),
            ),
        };

        let theta = Array1::from_elem(num_topics, 1.0 / num_topics as f64);
        let phi = Array2::zeros((num_topics, num_points));

        let mut m_arrays = BTreeMap::new();
        let mut h_arrays = BTreeMap::new();
        let mut beta_arrays = BTreeMap::new();
        for (name, matrix) in data.features() {
            let counts = data
                .counts(name)
                .ok_or_else(|| ModelError::MissingCounts { feature: name.clone() })?;
            let base_rates = init::base_rates(counts);
            let deviations = Array2::zeros((num_topics, matrix.num_cols()));
            let beta = derive_beta(&base_rates, &deviations);
            m_arrays.insert(name.clone(), base_rates);
            h_arrays.insert(name.clone(), deviations);
            beta_arrays.insert(name.clone(), beta);
        }

        Ok(ModelParameters {
            num_topics,
            num_points,
            theta,
            phi,
            m_arrays,
            h_arrays,
            beta_arrays,
            topic_centers,
            topic_covar,
            venue_ids: data.venue_ids().to_vec(),
        })
    }
}

/// Per-region Gaussian log-densities at every point (k x N).
pub(crate) fn location_log_densities(
    centers: &Array2<f64>, covariances: &Array3<f64>, coordinates: &Array2<f64>,
) -> Array2<f64> {
    let num_topics = centers.nrows();
    let num_points = coordinates.nrows();
    let mut densities = Array2::<f64>::zeros((num_topics, num_points));
    for z in 0..num_topics {
        let density = GeoDensity::new(centers.row(z), covariances.index_axis(Axis(0), z));
        for (n, point) in coordinates.rows().into_iter().enumerate() {
            densities[[z, n]] = density.log_pdf(point);
        }
    }
    densities
}

/// Unnormalized log posterior assignment scores (k x N):
/// `ln theta[z] + ln N(x_n; center_z, covar_z) + sum_f sum_v X_f[n,v] ln beta_f[z,v]`.
///
/// Shared by the E-step and the held-out prediction operations; validates
/// that every feature in `data` is known to the model with a matching
/// vocabulary size, so held-out data cannot silently misalign columns.
pub(crate) fn assignment_scores(
    params: &ModelParameters, data: &TopicData,
) -> ModelResult<Array2<f64>> {
    let mut scores =
        location_log_densities(&params.topic_centers, &params.topic_covar, data.coordinates());
    for (z, mut row) in scores.rows_mut().into_iter().enumerate() {
        row += params.theta[z].ln();
    }

    for (name, matrix) in data.features() {
        let beta = params
            .beta_arrays
            .get(name)
            .ok_or_else(|| ModelError::UnknownFeature { feature: name.clone() })?;
        if beta.ncols() != matrix.num_cols() {
            return Err(ModelError::VocabularySizeMismatch {
                feature: name.clone(),
                expected: beta.ncols(),
                actual: matrix.num_cols(),
            });
        }
        let log_beta = beta.mapv(f64::ln);
        matrix.accumulate_scores(log_beta.view(), &mut scores);
    }
    Ok(scores)
}

/// Soft assignments from log scores: normalize each column in log-space and
/// exponentiate, so every column of the result sums to 1.
pub(crate) fn posterior_phi(scores: &Array2<f64>) -> Array2<f64> {
    let norms = log_sum_axis(scores, Axis(0));
    let mut phi = scores.clone();
    phi -= &norms;
    phi.mapv_into(f64::exp)
}

/// Categorical distributions from base rates and deviations: row-normalized
/// `exp(m + h)`, normalized in log-space so rows sum to 1 regardless of the
/// magnitude of `h`.
pub(crate) fn derive_beta(base_rates: &Array1<f64>, deviations: &Array2<f64>) -> Array2<f64> {
    let mut scores = deviations.clone();
    scores += base_rates;
    let norms = log_sum_axis(&scores, Axis(1));
    (scores - norms.insert_axis(Axis(1))).mapv_into(f64::exp)
}

fn update_theta(phi: &Array2<f64>) -> Array1<f64> {
    let row_sums = phi.sum_axis(Axis(1));
    let total = row_sums.sum();
    row_sums / total
}

fn update_regions(
    phi: &Array2<f64>, coordinates: &Array2<f64>, mode: CovarianceMode,
) -> (Array2<f64>, Array3<f64>) {
    let num_topics = phi.nrows();
    let mut centers = Array2::<f64>::zeros((num_topics, 2));
    let mut covariances = Array3::<f64>::zeros((num_topics, 2, 2));

    for z in 0..num_topics {
        let weights = phi.row(z);
        let weight_sum = weights.sum();

        let mut center = [0.0; 2];
        for (n, point) in coordinates.rows().into_iter().enumerate() {
            center[0] += weights[n] * point[0];
            center[1] += weights[n] * point[1];
        }
        center[0] /= weight_sum;
        center[1] /= weight_sum;
        centers[[z, 0]] = center[0];
        centers[[z, 1]] = center[1];

        let mut covar = [[0.0; 2]; 2];
        for (n, point) in coordinates.rows().into_iter().enumerate() {
            let diff = [point[0] - center[0], point[1] - center[1]];
            for i in 0..2 {
                for j in 0..2 {
                    covar[i][j] += weights[n] * diff[i] * diff[j];
                }
            }
        }
        let denominator = weight_sum + COVAR_STABILIZER;
        for i in 0..2 {
            for j in 0..2 {
                covariances[[z, i, j]] = covar[i][j] / denominator;
            }
        }
        if mode == CovarianceMode::Diagonal {
            covariances[[z, 0, 1]] = 0.0;
            covariances[[z, 1, 0]] = 0.0;
        }
    }
    (centers, covariances)
}
