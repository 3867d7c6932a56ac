//! Singular-tolerant bivariate Gaussian log-density.
//!
//! Region covariances produced by the M-step are symmetric and positive
//! semi-definite but not always positive-definite: a region whose
//! responsibility mass collapses onto a line (or a point) yields a singular
//! covariance. The E-step still needs a usable density for such a region, so
//! [`GeoDensity`] evaluates through [`statrs::distribution::MultivariateNormal`]
//! in the regular case and degrades to a pseudo-inverse / pseudo-determinant
//! evaluation over the symmetric eigendecomposition when `statrs` rejects the
//! matrix. The degenerate branch annihilates deviation components along
//! null directions (the density of the projection onto the support), which
//! mirrors an `allow_singular` evaluation.

use nalgebra::{DVector, Matrix2, Vector2};
use statrs::distribution::{Continuous, MultivariateNormal};

use ndarray::{ArrayView1, ArrayView2};

const LN_2PI: f64 = 1.837_877_066_409_345_5;

/// Bivariate Gaussian with a degenerate-covariance fallback.
///
/// Construction never fails: a covariance `statrs` refuses (non-PD) selects
/// the eigendecomposition branch, whose pseudo-rank, pseudo-determinant and
/// scaled eigenvectors are precomputed so per-point evaluation stays cheap.
#[derive(Debug, Clone)]
pub struct GeoDensity {
    mean: Vector2<f64>,
    /// Fast path when the covariance is positive-definite.
    mvn: Option<MultivariateNormal>,
    /// Eigenvectors of the covariance (columns), used by the fallback.
    basis: Matrix2<f64>,
    /// Eigenvalues paired with `basis`, clamped at the rank cutoff.
    eigenvalues: Vector2<f64>,
    /// Number of eigenvalues above the rank cutoff.
    rank: usize,
    /// Log pseudo-determinant (sum of logs of retained eigenvalues).
    log_pdet: f64,
    /// Eigenvalues at or below this threshold are treated as exact zeros.
    cutoff: f64,
}

impl GeoDensity {
    /// Build a density from a region center (length-2) and a 2×2 covariance.
    ///
    /// The covariance is assumed symmetric (the M-step constructs it as a
    /// weighted outer product, which is). Positive-definite inputs use the
    /// `statrs` evaluator; anything else precomputes the eigendecomposition
    /// fallback.
    pub fn new(center: ArrayView1<'_, f64>, covar: ArrayView2<'_, f64>) -> Self {
        let mean = Vector2::new(center[0], center[1]);
        let cov = Matrix2::new(covar[[0, 0]], covar[[0, 1]], covar[[1, 0]], covar[[1, 1]]);

        let mvn = MultivariateNormal::new(
            vec![mean.x, mean.y],
            vec![cov[(0, 0)], cov[(0, 1)], cov[(1, 0)], cov[(1, 1)]],
        )
        .ok();

        let eigen = cov.symmetric_eigen();
        let max_eig = eigen.eigenvalues.iter().copied().fold(0.0_f64, f64::max);
        let cutoff = 2.0 * f64::EPSILON * max_eig.max(f64::EPSILON);

        let mut rank = 0;
        let mut log_pdet = 0.0;
        for &lambda in eigen.eigenvalues.iter() {
            if lambda > cutoff {
                rank += 1;
                log_pdet += lambda.ln();
            }
        }

        GeoDensity {
            mean,
            mvn,
            basis: eigen.eigenvectors,
            eigenvalues: eigen.eigenvalues,
            rank,
            log_pdet,
            cutoff,
        }
    }

    /// Log-density at a length-2 point.
    pub fn log_pdf(&self, point: ArrayView1<'_, f64>) -> f64 {
        if let Some(mvn) = &self.mvn {
            return mvn.ln_pdf(&DVector::from_vec(vec![point[0], point[1]]));
        }

        // Degenerate branch: Mahalanobis distance through the pseudo-inverse.
        let diff = Vector2::new(point[0] - self.mean.x, point[1] - self.mean.y);
        let projected = self.basis.transpose() * diff;
        let mut mahalanobis = 0.0;
        for i in 0..2 {
            let lambda = self.eigenvalues[i];
            if lambda > self.cutoff {
                mahalanobis += projected[i] * projected[i] / lambda;
            }
        }
        -0.5 * (self.rank as f64 * LN_2PI + self.log_pdet + mahalanobis)
    }

    /// Probability-space density at a length-2 point.
    pub fn pdf(&self, point: ArrayView1<'_, f64>) -> f64 {
        self.log_pdf(point).exp()
    }
}
