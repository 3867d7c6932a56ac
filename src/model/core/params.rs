//! The fitted-parameter snapshot returned by the EM engine.
//!
//! [`ModelParameters`] is a plain serializable record: a complete,
//! self-consistent snapshot sufficient for every prediction operation
//! without re-access to the training data. External collaborators persist
//! it however they like; no on-disk format is fixed here.
use std::collections::BTreeMap;

use ndarray::{Array1, Array2, Array3};
use serde::{Deserialize, Serialize};

/// Complete fitted state of a geographic topic model.
///
/// Shapes (k regions, N points, V_f vocabulary entries per feature `f`):
/// - `theta`: k, sums to 1.
/// - `phi`: k x N, each column sums to 1.
/// - `m_arrays[f]`: V_f log base rates (shared across regions).
/// - `h_arrays[f]`: k x V_f log-linear deviations.
/// - `beta_arrays[f]`: k x V_f categorical distributions, rows sum to 1.
/// - `topic_centers`: k x 2; `topic_covar`: k x 2 x 2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    pub num_topics: usize,
    pub num_points: usize,
    pub theta: Array1<f64>,
    pub phi: Array2<f64>,
    pub m_arrays: BTreeMap<String, Array1<f64>>,
    pub h_arrays: BTreeMap<String, Array2<f64>>,
    pub beta_arrays: BTreeMap<String, Array2<f64>>,
    pub topic_centers: Array2<f64>,
    pub topic_covar: Array3<f64>,
    pub venue_ids: Vec<String>,
}
