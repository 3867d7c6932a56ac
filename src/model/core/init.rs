//! Random initialization of the EM state.
//!
//! Purpose
//! -------
//! Draw the starting geographic parameters and derive the per-feature log
//! base rates. Region centers are sampled from a bivariate normal matched to
//! the empirical mean and covariance of the coordinates, so initial regions
//! land where the data is; covariances start diagonal with uniformly drawn
//! scales. All draws go through the caller's RNG, so a seeded
//! `ChaCha8Rng` makes initialization fully reproducible.
use ndarray::{Array1, Array2, Array3, ArrayView2};
use nalgebra::{Matrix2, SymmetricEigen, Vector2};
use rand::Rng;
use rand_distr::StandardNormal;

/// Sample k region centers from `N(mean(coords), cov(coords))`.
///
/// The empirical covariance is mapped through its symmetric square root
/// (eigenvalues clamped at zero), so a degenerate coordinate cloud still
/// yields valid draws on its support.
pub fn random_centers<R: Rng>(
    coordinates: ArrayView2<'_, f64>, num_topics: usize, rng: &mut R,
) -> Array2<f64> {
    let (mean, covariance) = empirical_moments(coordinates);

    let eigen = SymmetricEigen::new(covariance);
    let mut sqrt = Matrix2::zeros();
    for i in 0..2 {
        let scale = eigen.eigenvalues[i].max(0.0).sqrt();
        let basis = eigen.eigenvectors.column(i);
        sqrt += scale * basis * basis.transpose();
    }

    let mut centers = Array2::<f64>::zeros((num_topics, 2));
    for z in 0..num_topics {
        let draw = Vector2::new(rng.sample(StandardNormal), rng.sample(StandardNormal));
        let center = mean + sqrt * draw;
        centers[[z, 0]] = center[0];
        centers[[z, 1]] = center[1];
    }
    centers
}

/// Sample k diagonal starting covariances `diag((2u)^2, (2v)^2)`,
/// `u, v ~ U(0, 1)`.
pub fn random_covariances<R: Rng>(num_topics: usize, rng: &mut R) -> Array3<f64> {
    let mut covariances = Array3::<f64>::zeros((num_topics, 2, 2));
    for z in 0..num_topics {
        for i in 0..2 {
            let scale: f64 = 2.0 * rng.gen::<f64>();
            covariances[[z, i, i]] = scale * scale;
        }
    }
    covariances
}

/// Log base rates `m[v] = ln(1 + count[v])` for one feature.
pub fn base_rates(counts: &[f64]) -> Array1<f64> {
    counts.iter().map(|&c| (1.0 + c).ln()).collect()
}

fn empirical_moments(coordinates: ArrayView2<'_, f64>) -> (Vector2<f64>, Matrix2<f64>) {
    let n = coordinates.nrows() as f64;
    let mut mean = Vector2::zeros();
    for row in coordinates.rows() {
        mean += Vector2::new(row[0], row[1]);
    }
    mean /= n;

    let mut covariance = Matrix2::zeros();
    if coordinates.nrows() > 1 {
        for row in coordinates.rows() {
            let diff = Vector2::new(row[0], row[1]) - mean;
            covariance += diff * diff.transpose();
        }
        covariance /= n - 1.0;
    }
    (mean, covariance)
}
