//! Prediction operations on a fitted model.
//!
//! Purpose
//! -------
//! Score held-out data and query the fitted mixture at arbitrary locations.
//! The held-out operations reuse the training E-step (shared
//! `assignment_scores` / `posterior_phi`) and the single likelihood routine,
//! so training and prediction can never disagree on the formulas.
//!
//! Key behaviors
//! -------------
//! - `predict_log_probs` marginalizes regions per point via `log_sum`; it is
//!   a true log-probability of the held-out observations under the mixture.
//! - The variational variants re-run the E-step on the held-out data and
//!   strip the penalty terms (and, for the without-geo variant, the
//!   location term) from the penalized likelihood.
//! - The location queries apply Bayes' rule to the mixture: theta-weighted,
//!   geographic-density-weighted combinations of per-region parameters.
use ndarray::{Array1, Array2, ArrayView1, Axis};

use crate::{
    model::{
        core::{Statistics, TopicData},
        em::{GeoTopicModel, assignment_scores, posterior_phi},
        errors::{ModelError, ModelResult},
        likelihood::compute_likelihood,
    },
    numerics::{GeoDensity, log_sum_axis},
};

impl GeoTopicModel {
    /// Total log-probability of held-out data under the fitted mixture:
    /// `sum_n ln sum_z theta[z] * N(x_n; z) * prod_f beta_f[z]^counts`.
    ///
    /// # Errors
    /// [`ModelError::ModelNotFitted`], or a feature/vocabulary mismatch
    /// between `data` and the fitted parameters.
    pub fn predict_log_probs(&self, data: &TopicData) -> ModelResult<f64> {
        let params = self.params()?;
        let scores = assignment_scores(params, data)?;
        Ok(log_sum_axis(&scores, Axis(0)).sum())
    }

    /// Variational bound on the held-out log-probability: the penalized
    /// likelihood of the held-out E-step with the covariance and sparsity
    /// penalties stripped.
    pub fn predict_log_probs_variational(&self, data: &TopicData) -> ModelResult<f64> {
        let (stats, _) = self.held_out_statistics(data)?;
        Ok(stats.likelihood + 2.0 * stats.sigma - stats.eta_penalty)
    }

    /// The variational bound with the geographic term additionally removed,
    /// scoring the behavioral features alone. Also returns the held-out soft
    /// assignments, since callers comparing with/without geography need them.
    pub fn predict_log_probs_without_geo(
        &self, data: &TopicData,
    ) -> ModelResult<(f64, Array2<f64>)> {
        let (stats, phi) = self.held_out_statistics(data)?;
        let value = stats.likelihood + 2.0 * stats.sigma - stats.eta_penalty - stats.location;
        Ok((value, phi))
    }

    /// Marginal probability density of observing a point at `location`:
    /// `sum_z theta[z] * N(location; center_z, covar_z)`.
    pub fn compute_prob_for_loc(&self, location: ArrayView1<'_, f64>) -> ModelResult<f64> {
        let params = self.params()?;
        validate_location(&location)?;
        let mut total = 0.0;
        for z in 0..params.num_topics {
            let density = GeoDensity::new(
                params.topic_centers.row(z),
                params.topic_covar.index_axis(Axis(0), z),
            );
            total += params.theta[z] * density.pdf(location);
        }
        Ok(total)
    }

    /// The categorical distribution a feature implies at a location: the
    /// per-region beta rows combined with weights `theta[z] * N(location; z)`
    /// and renormalized.
    ///
    /// # Errors
    /// [`ModelError::UnknownFeature`] for a feature the model wasn't fitted
    /// with, in addition to the usual lifecycle and dimension checks.
    pub fn compute_beta_for_loc(
        &self, location: ArrayView1<'_, f64>, feature: &str,
    ) -> ModelResult<Array1<f64>> {
        let params = self.params()?;
        validate_location(&location)?;
        let beta = params
            .beta_arrays
            .get(feature)
            .ok_or_else(|| ModelError::UnknownFeature { feature: feature.to_string() })?;

        let mut combined = Array1::<f64>::zeros(beta.ncols());
        for z in 0..params.num_topics {
            let density = GeoDensity::new(
                params.topic_centers.row(z),
                params.topic_covar.index_axis(Axis(0), z),
            );
            let weight = params.theta[z] * density.pdf(location);
            combined.scaled_add(weight, &beta.row(z));
        }
        let total = combined.sum();
        Ok(combined / total)
    }

    /// Shared held-out evaluation: E-step on `data` against the fitted
    /// parameters, then the penalized likelihood of the result.
    fn held_out_statistics(&self, data: &TopicData) -> ModelResult<(Statistics, Array2<f64>)> {
        let params = self.params()?;
        let scores = assignment_scores(params, data)?;
        let phi = posterior_phi(&scores);
        let stats = compute_likelihood(
            self.options.lambda(),
            data,
            &phi,
            &params.theta,
            &params.topic_centers,
            &params.topic_covar,
            &params.h_arrays,
            &params.beta_arrays,
        )?;
        Ok((stats, phi))
    }
}

fn validate_location(location: &ArrayView1<'_, f64>) -> ModelResult<()> {
    if location.len() != 2 {
        return Err(ModelError::CoordinateDimension { cols: location.len() });
    }
    Ok(())
}
