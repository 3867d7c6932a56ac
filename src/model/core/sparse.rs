//! Sparse occurrence matrices for large-vocabulary categorical features.
//!
//! Purpose
//! -------
//! Hold one feature's N x V occurrence counts in a row-major sparse layout
//! and provide exactly the two contractions the engine performs against it:
//! scoring points under per-region log-categorical distributions (E-step and
//! prediction) and forming responsibility-weighted counts (M-step and
//! likelihood). Keeping both contractions here means the dense k x N and
//! k x V working matrices are the only dense state the engine ever holds.
//!
//! Invariants & assumptions
//! ------------------------
//! - Counts are finite, non-negative, and integer-valued; column indices
//!   are within the vocabulary. Both are enforced at construction, so the
//!   contraction methods skip per-entry checks.
//! - Rows may be empty (a point with no occurrences for this feature).
//!
//! Conventions
//! -----------
//! - Row = data point, column = vocabulary entry, matching the external
//!   contract for feature matrices.
use ndarray::{Array2, ArrayView2};

use crate::model::errors::{ModelError, ModelResult};

/// Row-major sparse count matrix for one categorical feature.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    /// Per-row `(column, count)` pairs; counts are strictly positive.
    rows: Vec<Vec<(usize, f64)>>,
    num_cols: usize,
}

impl FeatureMatrix {
    /// Build a sparse matrix from `(row, col, count)` triplets.
    ///
    /// Zero counts are dropped; duplicate `(row, col)` pairs accumulate.
    ///
    /// # Errors
    /// - [`ModelError::ColumnOutOfRange`] for a triplet addressing a column
    ///   `>= num_cols` or a row `>= num_rows`.
    /// - [`ModelError::NegativeCount`] / [`ModelError::NonIntegerCount`] for
    ///   invalid count values (counts are occurrence tallies, never
    ///   fractions).
    pub fn from_triplets(
        num_rows: usize, num_cols: usize, triplets: &[(usize, usize, f64)],
    ) -> ModelResult<Self> {
        let mut rows: Vec<Vec<(usize, f64)>> = vec![Vec::new(); num_rows];
        for &(row, col, count) in triplets {
            if row >= num_rows || col >= num_cols {
                return Err(ModelError::ColumnOutOfRange { row, col, num_cols });
            }
            validate_count(row, col, count)?;
            if count == 0.0 {
                continue;
            }
            match rows[row].iter_mut().find(|(c, _)| *c == col) {
                Some((_, existing)) => *existing += count,
                None => rows[row].push((col, count)),
            }
        }
        Ok(Self { rows, num_cols })
    }

    /// Build a sparse matrix from a dense count array.
    ///
    /// # Errors
    /// Same count validation as [`FeatureMatrix::from_triplets`].
    pub fn from_dense(dense: ArrayView2<'_, f64>) -> ModelResult<Self> {
        let (num_rows, num_cols) = dense.dim();
        let mut rows: Vec<Vec<(usize, f64)>> = vec![Vec::new(); num_rows];
        for ((row, col), &count) in dense.indexed_iter() {
            validate_count(row, col, count)?;
            if count > 0.0 {
                rows[row].push((col, count));
            }
        }
        Ok(Self { rows, num_cols })
    }

    /// Number of data points (rows).
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Vocabulary size (columns).
    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    /// The `(column, count)` pairs of one row.
    pub fn row(&self, n: usize) -> &[(usize, f64)] {
        &self.rows[n]
    }

    /// Accumulate `log_beta . X^T` into a k x N score matrix:
    /// `scores[z, n] += sum_v log_beta[z, v] * X[n, v]`.
    ///
    /// This is the per-point log-likelihood contribution of this feature
    /// under each region's categorical distribution, used by the E-step and
    /// by prediction. `scores` must be k x N; `log_beta` must be k x V.
    pub fn accumulate_scores(
        &self, log_beta: ArrayView2<'_, f64>, scores: &mut Array2<f64>,
    ) {
        let num_topics = log_beta.nrows();
        for (n, row) in self.rows.iter().enumerate() {
            for &(v, count) in row {
                for z in 0..num_topics {
                    scores[[z, n]] += log_beta[[z, v]] * count;
                }
            }
        }
    }

    /// Responsibility-weighted counts `phi . X` (k x V):
    /// `wc[z, v] = sum_n phi[z, n] * X[n, v]`.
    ///
    /// Precomputed once per EM iteration and handed to the eta optimizer and
    /// the likelihood computation, so neither touches the sparse data again.
    pub fn weighted_counts(&self, phi: ArrayView2<'_, f64>) -> Array2<f64> {
        let num_topics = phi.nrows();
        let mut wc = Array2::<f64>::zeros((num_topics, self.num_cols));
        for (n, row) in self.rows.iter().enumerate() {
            for &(v, count) in row {
                for z in 0..num_topics {
                    wc[[z, v]] += phi[[z, n]] * count;
                }
            }
        }
        wc
    }
}

fn validate_count(row: usize, col: usize, count: f64) -> ModelResult<()> {
    if !count.is_finite() || count < 0.0 {
        return Err(ModelError::NegativeCount { row, col, value: count });
    }
    if count.fract() != 0.0 {
        return Err(ModelError::NonIntegerCount { row, col, value: count });
    }
    Ok(())
}
