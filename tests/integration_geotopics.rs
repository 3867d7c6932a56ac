//! Integration tests for the geographic topic model.
//!
//! Purpose
//! -------
//! - Validate the end-to-end pipeline: from a validated dataset through EM
//!   fitting (with restarts) to the prediction and labeling queries.
//! - Exercise a realistic recovery scenario — two well-separated clusters
//!   with disjoint category tokens — rather than toy edge cases only.
//!
//! Coverage
//! --------
//! - `model::core`: `TopicData` / `FeatureMatrix` construction,
//!   `ModelOptions` with and without a `RegionPrior`.
//! - `model::em::GeoTopicModel`: fitting, convergence/termination behavior,
//!   the probability-simplex invariants of the committed parameters, and
//!   seeded determinism.
//! - `restarts::fit_restarts`: parallel best-of-N selection.
//! - Prediction and labeling on the fitted model.
//!
//! Exclusions
//! ----------
//! - Fine-grained validation of the numerical building blocks (log-sum,
//!   density fallbacks, the eta optimizer) — covered by unit tests.
//! - Performance over large N and vocabularies.
use std::collections::BTreeMap;

use geotopics::{
    CovarianceMode, EtaOptions, FeatureMatrix, GeoTopicModel, ModelOptions, RegionPrior,
    TopicData, fit_restarts,
};
use ndarray::{Array2, Array3, array};

/// Purpose
/// -------
/// Build the recovery scenario: 200 points in two well-separated clusters,
/// each cluster uniformly emitting its own category token.
///
/// Returns
/// -------
/// - The dataset, plus the two true cluster means for recovery checks.
///
/// Invariants
/// ----------
/// - Points are laid out on deterministic 10 x 10 grids (spacing 0.1)
///   centered on the true means, so the test needs no RNG of its own.
/// - Points 0..100 emit token "alpha", points 100..200 emit token "beta".
fn two_cluster_data() -> (TopicData, [[f64; 2]; 2]) {
    let means = [[0.0, 0.0], [10.0, 10.0]];
    let mut coords = Array2::<f64>::zeros((200, 2));
    let mut triplets = Vec::with_capacity(200);

    for cluster in 0..2 {
        for i in 0..100 {
            let n = cluster * 100 + i;
            let dx = (i % 10) as f64 * 0.1 - 0.45;
            let dy = (i / 10) as f64 * 0.1 - 0.45;
            coords[[n, 0]] = means[cluster][0] + dx;
            coords[[n, 1]] = means[cluster][1] + dy;
            triplets.push((n, cluster, 1.0));
        }
    }

    let mut features = BTreeMap::new();
    features.insert(
        "category".to_string(),
        FeatureMatrix::from_triplets(200, 2, &triplets).unwrap(),
    );
    let mut unigrams = BTreeMap::new();
    unigrams.insert("category".to_string(), vec!["alpha".to_string(), "beta".to_string()]);
    let mut counts = BTreeMap::new();
    counts.insert("category".to_string(), vec![100.0, 100.0]);

    let data = TopicData::new(coords, features, unigrams, counts, vec![]).unwrap();
    (data, means)
}

fn options(seed: u64, max_iterations: usize, min_relative_change: f64, track: bool) -> ModelOptions {
    ModelOptions::new(
        0.0,
        2,
        max_iterations,
        min_relative_change,
        None,
        CovarianceMode::Full,
        track,
        0,
        Some(seed),
        EtaOptions::default(),
    )
    .unwrap()
}

#[test]
/// Purpose
/// -------
/// End-to-end recovery: best-of-N restarts on the two-cluster scenario must
/// place the region centers near the true cluster means, concentrate each
/// region's category distribution on its cluster's token, and satisfy the
/// probability-simplex invariants.
fn recovers_two_separated_clusters() {
    let (data, means) = two_cluster_data();
    let opts = options(42, 50, 1e-5, false);

    let model = fit_restarts(&opts, &data, 8).unwrap();
    let params = model.params().unwrap();

    // Simplex invariants.
    assert!((params.theta.sum() - 1.0).abs() < 1e-9);
    for n in 0..200 {
        let column: f64 = (0..2).map(|z| params.phi[[z, n]]).sum();
        assert!((column - 1.0).abs() < 1e-9, "phi column {n} sums to {column}");
    }
    let beta = &params.beta_arrays["category"];
    for z in 0..2 {
        let row: f64 = (0..2).map(|v| beta[[z, v]]).sum();
        assert!((row - 1.0).abs() < 1e-9, "beta row {z} sums to {row}");
    }

    // Match each true mean to its nearest fitted center.
    let mut assigned = [usize::MAX; 2];
    for (cluster, mean) in means.iter().enumerate() {
        let mut best = (f64::INFINITY, 0);
        for z in 0..2 {
            let dx = params.topic_centers[[z, 0]] - mean[0];
            let dy = params.topic_centers[[z, 1]] - mean[1];
            let dist = (dx * dx + dy * dy).sqrt();
            if dist < best.0 {
                best = (dist, z);
            }
        }
        assert!(best.0 < 0.5, "cluster {cluster} center off by {}", best.0);
        assigned[cluster] = best.1;
    }
    assert_ne!(assigned[0], assigned[1], "both clusters mapped to one region");

    // Each region's distribution concentrates on its cluster's token.
    assert!(beta[[assigned[0], 0]] > 0.9, "region for cluster 0: {}", beta[[assigned[0], 0]]);
    assert!(beta[[assigned[1], 1]] > 0.9, "region for cluster 1: {}", beta[[assigned[1], 1]]);

    // The fitted mixture should consider the training data far more likely
    // than points in the empty space between the clusters.
    let at_cluster = model.compute_prob_for_loc(array![0.0, 0.0].view()).unwrap();
    let between = model.compute_prob_for_loc(array![5.0, 5.0].view()).unwrap();
    assert!(at_cluster > between);

    // Labels: each region's category label is its cluster's single token.
    let labels = model.topic_labels(&data).unwrap();
    let label = labels[assigned[0]]["category"].as_ref().unwrap();
    assert_eq!(label[0].0, "alpha");
}

#[test]
/// Purpose
/// -------
/// A budget of one iteration commits exactly one statistics snapshot, and
/// successive committed likelihoods on the recovery scenario never decrease
/// beyond numerical tolerance.
fn iteration_budget_and_monotonicity() {
    let (data, _) = two_cluster_data();

    let mut single = GeoTopicModel::new(options(7, 1, 1e-6, true));
    single.fit(&data).unwrap();
    assert_eq!(single.statistics_history().len(), 1);

    let mut tracked = GeoTopicModel::new(options(7, 40, 1e-6, true));
    tracked.fit(&data).unwrap();
    let history = tracked.statistics_history();
    assert!(!history.is_empty());
    for pair in history.windows(2) {
        let tolerance = 1e-6 * pair[0].likelihood.abs().max(1.0);
        assert!(
            pair[1].likelihood >= pair[0].likelihood - tolerance,
            "likelihood decreased: {} -> {}",
            pair[0].likelihood,
            pair[1].likelihood
        );
    }
}

#[test]
/// Purpose
/// -------
/// A loose convergence threshold terminates in no more iterations than a
/// strict one on the same data and seed.
fn loose_threshold_terminates_no_later_than_strict() {
    let (data, _) = two_cluster_data();

    let mut loose = GeoTopicModel::new(options(11, 40, 0.5, true));
    loose.fit(&data).unwrap();

    let mut strict = GeoTopicModel::new(options(11, 40, 1e-6, true));
    strict.fit(&data).unwrap();

    assert!(
        loose.statistics_history().len() <= strict.statistics_history().len(),
        "loose took {} iterations, strict {}",
        loose.statistics_history().len(),
        strict.statistics_history().len()
    );
}

#[test]
/// Purpose
/// -------
/// Fixed-regions mode: caller-supplied centers and covariances come back
/// bit-identical after the fit.
fn fixed_regions_remain_bit_identical() {
    let (data, means) = two_cluster_data();

    let centers = array![[means[0][0], means[0][1]], [means[1][0], means[1][1]]];
    let covariances =
        Array3::from_shape_fn((2, 2, 2), |(_, i, j)| if i == j { 1.0 } else { 0.0 });
    let prior = RegionPrior::new(centers.clone(), covariances.clone(), 2).unwrap();

    let opts = ModelOptions::new(
        0.0,
        2,
        10,
        1e-5,
        Some(prior),
        CovarianceMode::Full,
        false,
        0,
        Some(3),
        EtaOptions::default(),
    )
    .unwrap();

    let mut model = GeoTopicModel::new(opts);
    model.fit(&data).unwrap();
    let params = model.params().unwrap();

    assert_eq!(params.topic_centers, centers);
    assert_eq!(params.topic_covar, covariances);
}

#[test]
/// Purpose
/// -------
/// Two fits with the same seed, data, and hyperparameters produce identical
/// fitted parameters.
fn seeded_fits_are_deterministic() {
    let (data, _) = two_cluster_data();

    let mut first = GeoTopicModel::new(options(99, 15, 1e-5, false));
    first.fit(&data).unwrap();
    let mut second = GeoTopicModel::new(options(99, 15, 1e-5, false));
    second.fit(&data).unwrap();

    let a = first.params().unwrap();
    let b = second.params().unwrap();
    assert_eq!(a.theta, b.theta);
    assert_eq!(a.topic_centers, b.topic_centers);
    assert_eq!(a.topic_covar, b.topic_covar);
    assert_eq!(a.beta_arrays, b.beta_arrays);
}
