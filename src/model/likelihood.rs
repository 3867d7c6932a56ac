//! The penalized likelihood: the single evaluation shared by the M-step's
//! commit decision and the held-out prediction operations.
//!
//! The total decomposes as
//!
//! ```text
//! L = feature + location + topic - 2 * sigma - entropy + eta_penalty
//! ```
//!
//! where `feature` sums `wc (.) ln(beta)` over features, `location` weights
//! the per-region Gaussian log-densities by phi, `topic` weights `ln(theta)`
//! by phi, `sigma` sums the log covariance determinants, `entropy` is
//! `sum phi ln(phi)` with exact zeros contributing nothing, and
//! `eta_penalty` is the (non-positive) L1 term.
//!
//! A non-positive determinant or a non-finite total is the fatal condition
//! for an EM run: the caller pattern-matches on the `Err` to halt, keeping
//! its last committed state.
use std::collections::BTreeMap;

use ndarray::{Array1, Array2, Array3, Axis};

use crate::model::{
    core::{Statistics, TopicData},
    em::location_log_densities,
    errors::{ModelError, ModelResult},
};

/// Evaluate the penalized likelihood of a candidate parameter set.
///
/// # Errors
/// - [`ModelError::LikelihoodNotComputable`] when a region covariance has a
///   non-positive determinant.
/// - [`ModelError::NonFiniteLikelihood`] when the total evaluates to NaN or
///   infinity.
/// - [`ModelError::UnknownFeature`] when `data` carries a feature absent
///   from `beta_arrays`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn compute_likelihood(
    lambda: f64, data: &TopicData, phi: &Array2<f64>, theta: &Array1<f64>,
    centers: &Array2<f64>, covariances: &Array3<f64>,
    h_arrays: &BTreeMap<String, Array2<f64>>, beta_arrays: &BTreeMap<String, Array2<f64>>,
) -> ModelResult<Statistics> {
    let num_topics = phi.nrows();

    // Covariance penalty first: a collapsed region is fatal before any
    // other term is worth computing.
    let mut sigma = 0.0;
    for z in 0..num_topics {
        let covar = covariances.index_axis(Axis(0), z);
        let determinant = covar[[0, 0]] * covar[[1, 1]] - covar[[0, 1]] * covar[[1, 0]];
        if determinant <= 0.0 {
            return Err(ModelError::LikelihoodNotComputable { topic: z, determinant });
        }
        sigma += determinant.ln();
    }

    let mut feature = 0.0;
    for (name, matrix) in data.features() {
        let beta = beta_arrays
            .get(name)
            .ok_or_else(|| ModelError::UnknownFeature { feature: name.clone() })?;
        let weighted = matrix.weighted_counts(phi.view());
        feature += (&beta.mapv(f64::ln) * &weighted).sum();
    }

    let densities = location_log_densities(centers, covariances, data.coordinates());
    let location = (phi * &densities).sum();

    let mut topic = 0.0;
    for z in 0..num_topics {
        topic += phi.row(z).sum() * theta[z].ln();
    }

    // Responsibility entropy; 0 * ln(0) produces NaN and counts as zero.
    let mut entropy = 0.0;
    for &p in phi.iter() {
        let term = p * p.ln();
        if !term.is_nan() {
            entropy += term;
        }
    }

    let mut eta_penalty = 0.0;
    for deviations in h_arrays.values() {
        eta_penalty -= lambda * deviations.iter().map(|v| v.abs()).sum::<f64>();
    }

    let likelihood = feature + location + topic - 2.0 * sigma - entropy + eta_penalty;
    if !likelihood.is_finite() {
        return Err(ModelError::NonFiniteLikelihood { value: likelihood });
    }

    Ok(Statistics {
        likelihood,
        feature,
        location,
        topic,
        sigma,
        entropy,
        eta_penalty,
        phi: phi.clone(),
        centers: centers.clone(),
        covariances: covariances.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::core::FeatureMatrix;
    use ndarray::{Array3, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Term-by-term agreement with a hand-computed single-region case.
    // - The fatal paths: non-positive determinant and non-finite total.
    // - The entropy convention for exact-zero responsibilities.
    // -------------------------------------------------------------------------

    fn unit_covariances(num_topics: usize) -> Array3<f64> {
        Array3::from_shape_fn((num_topics, 2, 2), |(_, i, j)| if i == j { 1.0 } else { 0.0 })
    }

    fn two_point_data() -> TopicData {
        let mut features = std::collections::BTreeMap::new();
        features.insert(
            "category".to_string(),
            FeatureMatrix::from_dense(array![[1.0, 0.0], [0.0, 2.0]].view()).unwrap(),
        );
        let mut unigrams = std::collections::BTreeMap::new();
        unigrams.insert("category".to_string(), vec!["a".to_string(), "b".to_string()]);
        let mut counts = std::collections::BTreeMap::new();
        counts.insert("category".to_string(), vec![1.0, 2.0]);
        TopicData::new(array![[0.0, 0.0], [1.0, 0.0]], features, unigrams, counts, vec![])
            .unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Single region, unit covariance, uniform beta: every term has a closed
    // form, and the total must assemble them with the documented signs.
    fn single_region_matches_hand_computation() {
        let data = two_point_data();
        let phi = array![[1.0, 1.0]];
        let theta = array![1.0];
        let centers = array![[0.0, 0.0]];
        let covariances = unit_covariances(1);
        let mut h_arrays = std::collections::BTreeMap::new();
        h_arrays.insert("category".to_string(), array![[0.5, -0.5]]);
        let mut beta_arrays = std::collections::BTreeMap::new();
        beta_arrays.insert("category".to_string(), array![[0.5, 0.5]]);

        let lambda = 2.0;
        let stats = compute_likelihood(
            lambda,
            &data,
            &phi,
            &theta,
            &centers,
            &covariances,
            &h_arrays,
            &beta_arrays,
        )
        .unwrap();

        // feature: counts (1, 2) against ln(0.5) each.
        let want_feature = 3.0 * 0.5_f64.ln();
        assert!((stats.feature - want_feature).abs() < 1e-12);

        // location: standard normal log-densities at (0,0) and (1,0).
        let ln_2pi = 1.837_877_066_409_345_5;
        let want_location = -ln_2pi + (-ln_2pi - 0.5);
        assert!((stats.location - want_location).abs() < 1e-12);

        // topic: ln(1) = 0; sigma: ln(det I) = 0; entropy: 1 * ln(1) = 0.
        assert_eq!(stats.topic, 0.0);
        assert_eq!(stats.sigma, 0.0);
        assert_eq!(stats.entropy, 0.0);

        // eta penalty: -lambda * (0.5 + 0.5).
        assert!((stats.eta_penalty + 2.0).abs() < 1e-12);

        let want_total = want_feature + want_location - 2.0;
        assert!((stats.likelihood - want_total).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // A zero-determinant covariance is fatal with the offending region
    // index and determinant in the error.
    fn non_positive_determinant_is_fatal() {
        let data = two_point_data();
        let phi = array![[0.5, 0.5], [0.5, 0.5]];
        let theta = array![0.5, 0.5];
        let centers = array![[0.0, 0.0], [1.0, 0.0]];
        let mut covariances = unit_covariances(2);
        covariances[[1, 0, 0]] = 0.0;
        covariances[[1, 1, 1]] = 0.0;

        let err = compute_likelihood(
            0.0,
            &data,
            &phi,
            &theta,
            &centers,
            &covariances,
            &std::collections::BTreeMap::new(),
            &std::collections::BTreeMap::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::LikelihoodNotComputable { topic: 1, .. }));
    }

    #[test]
    // Purpose
    // -------
    // Zero-responsibility entries contribute nothing to the entropy rather
    // than poisoning the total with NaN, and a genuinely non-finite total
    // (here via a zero mixture weight carrying mass) is reported as such.
    fn entropy_zeros_and_non_finite_totals() {
        let data = two_point_data();
        let phi = array![[1.0, 0.0], [0.0, 1.0]];
        let centers = array![[0.0, 0.0], [1.0, 0.0]];
        let covariances = unit_covariances(2);
        let mut beta_arrays = std::collections::BTreeMap::new();
        beta_arrays.insert("category".to_string(), array![[0.5, 0.5], [0.5, 0.5]]);

        let stats = compute_likelihood(
            0.0,
            &data,
            &phi,
            &array![0.5, 0.5],
            &centers,
            &covariances,
            &std::collections::BTreeMap::new(),
            &beta_arrays,
        )
        .unwrap();
        assert_eq!(stats.entropy, 0.0);
        assert!(stats.likelihood.is_finite());

        // theta[1] = 0 with phi mass on region 1 drives topic to -inf.
        let err = compute_likelihood(
            0.0,
            &data,
            &phi,
            &array![1.0, 0.0],
            &centers,
            &covariances,
            &std::collections::BTreeMap::new(),
            &beta_arrays,
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::NonFiniteLikelihood { .. }));
    }
}
