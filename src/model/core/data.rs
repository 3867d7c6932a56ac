//! The immutable per-fit dataset consumed by the EM engine.
//!
//! Purpose
//! -------
//! [`TopicData`] bundles everything one fit (or one prediction call) reads:
//! standardized 2-D coordinates, per-feature sparse occurrence matrices,
//! each feature's ordered vocabulary, the aggregate per-vocabulary counts
//! used at initialization, and venue identifiers carried for traceability.
//!
//! Key behaviors
//! -------------
//! - The constructor validates every dimension agreement and value
//!   constraint up front and fails fast with a descriptive [`ModelError`];
//!   the engine never re-validates.
//! - Feature names live in ordered maps, so iteration order is fixed at
//!   construction and identical across the E-step, M-step, and likelihood
//!   paths. The engine iterates this declared key set rather than
//!   discovering keys dynamically.
//!
//! Invariants
//! ----------
//! - `coordinates` is N x 2 with all entries finite, N >= 1.
//! - Every feature has a vocabulary and a counts list of matching length V,
//!   and its matrix is N x V.
//! - `venue_ids` is either empty or of length N.
//! - The struct is read-only after construction; the engine borrows it for
//!   the duration of a fit and never mutates it.
use std::collections::BTreeMap;

use ndarray::Array2;

use crate::model::{
    core::sparse::FeatureMatrix,
    errors::{ModelError, ModelResult},
};

/// Immutable training or held-out dataset for the geographic topic model.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicData {
    coordinates: Array2<f64>,
    features: BTreeMap<String, FeatureMatrix>,
    unigrams: BTreeMap<String, Vec<String>>,
    counts: BTreeMap<String, Vec<f64>>,
    venue_ids: Vec<String>,
}

impl TopicData {
    /// Assemble and validate a dataset.
    ///
    /// # Parameters
    /// - `coordinates`: N x 2 matrix of standardized positions, all finite.
    /// - `features`: feature name -> sparse N x V occurrence matrix.
    /// - `unigrams`: feature name -> ordered vocabulary (length V); defines
    ///   the column index semantics of the matching matrix.
    /// - `counts`: feature name -> aggregate per-vocabulary occurrence
    ///   counts (length V); consumed only at initialization.
    /// - `venue_ids`: identifiers carried through for traceability; empty
    ///   or length N.
    ///
    /// # Errors
    /// Any dimension disagreement or invalid value is reported with the
    /// offending feature name and indices; see the input-validation variants
    /// of [`ModelError`].
    pub fn new(
        coordinates: Array2<f64>, features: BTreeMap<String, FeatureMatrix>,
        unigrams: BTreeMap<String, Vec<String>>, counts: BTreeMap<String, Vec<f64>>,
        venue_ids: Vec<String>,
    ) -> ModelResult<Self> {
        let num_points = coordinates.nrows();
        if num_points == 0 {
            return Err(ModelError::EmptyData);
        }
        if coordinates.ncols() != 2 {
            return Err(ModelError::CoordinateDimension { cols: coordinates.ncols() });
        }
        for ((row, col), &value) in coordinates.indexed_iter() {
            if !value.is_finite() {
                return Err(ModelError::NonFiniteCoordinate { row, col, value });
            }
        }

        for (feature, matrix) in &features {
            if matrix.num_rows() != num_points {
                return Err(ModelError::FeatureRowMismatch {
                    feature: feature.clone(),
                    expected: num_points,
                    actual: matrix.num_rows(),
                });
            }
            let vocabulary = unigrams.get(feature).ok_or_else(|| {
                ModelError::MissingVocabulary { feature: feature.clone() }
            })?;
            if vocabulary.len() != matrix.num_cols() {
                return Err(ModelError::VocabularySizeMismatch {
                    feature: feature.clone(),
                    expected: matrix.num_cols(),
                    actual: vocabulary.len(),
                });
            }
            let feature_counts = counts
                .get(feature)
                .ok_or_else(|| ModelError::MissingCounts { feature: feature.clone() })?;
            if feature_counts.len() != vocabulary.len() {
                return Err(ModelError::CountsLengthMismatch {
                    feature: feature.clone(),
                    expected: vocabulary.len(),
                    actual: feature_counts.len(),
                });
            }
        }

        if !venue_ids.is_empty() && venue_ids.len() != num_points {
            return Err(ModelError::VenueIdMismatch {
                expected: num_points,
                actual: venue_ids.len(),
            });
        }

        Ok(Self { coordinates, features, unigrams, counts, venue_ids })
    }

    /// Number of data points N.
    pub fn num_points(&self) -> usize {
        self.coordinates.nrows()
    }

    /// The N x 2 coordinate matrix.
    pub fn coordinates(&self) -> &Array2<f64> {
        &self.coordinates
    }

    /// Ordered feature name -> sparse matrix map.
    pub fn features(&self) -> &BTreeMap<String, FeatureMatrix> {
        &self.features
    }

    /// One feature's sparse matrix, if present.
    pub fn feature(&self, name: &str) -> Option<&FeatureMatrix> {
        self.features.get(name)
    }

    /// Ordered feature name -> vocabulary map.
    pub fn unigrams(&self) -> &BTreeMap<String, Vec<String>> {
        &self.unigrams
    }

    /// One feature's aggregate per-vocabulary counts, if present.
    pub fn counts(&self, name: &str) -> Option<&[f64]> {
        self.counts.get(name).map(|c| c.as_slice())
    }

    /// Venue identifiers (empty when not supplied).
    pub fn venue_ids(&self) -> &[String] {
        &self.venue_ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Fail-fast validation: row mismatches, missing metadata, length
    //   disagreements, venue id mismatch, non-finite coordinates.
    // - A fully consistent dataset constructing cleanly.
    // -------------------------------------------------------------------------

    fn feature(matrix: &[(usize, usize, f64)], rows: usize, cols: usize) -> FeatureMatrix {
        FeatureMatrix::from_triplets(rows, cols, matrix).unwrap()
    }

    fn singleton<T>(name: &str, value: T) -> BTreeMap<String, T> {
        let mut map = BTreeMap::new();
        map.insert(name.to_string(), value);
        map
    }

    #[test]
    // Purpose
    // -------
    // A consistent dataset validates and reports the expected point count.
    fn consistent_dataset_constructs() {
        let coords = array![[0.0, 1.0], [2.0, -1.0]];
        let data = TopicData::new(
            coords,
            singleton("category", feature(&[(0, 0, 1.0), (1, 1, 2.0)], 2, 2)),
            singleton("category", vec!["bar".to_string(), "cafe".to_string()]),
            singleton("category", vec![1.0, 2.0]),
            vec![],
        )
        .unwrap();
        assert_eq!(data.num_points(), 2);
        assert!(data.feature("category").is_some());
        assert!(data.feature("missing").is_none());
    }

    #[test]
    // Purpose
    // -------
    // Each dimension disagreement is rejected with the matching variant.
    fn mismatches_fail_fast() {
        let coords = array![[0.0, 1.0], [2.0, -1.0]];

        // Feature row count disagrees with the coordinates.
        let err = TopicData::new(
            coords.clone(),
            singleton("category", feature(&[], 3, 2)),
            singleton("category", vec!["a".to_string(), "b".to_string()]),
            singleton("category", vec![0.0, 0.0]),
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::FeatureRowMismatch { expected: 2, actual: 3, .. }));

        // Vocabulary shorter than the matrix columns.
        let err = TopicData::new(
            coords.clone(),
            singleton("category", feature(&[], 2, 2)),
            singleton("category", vec!["a".to_string()]),
            singleton("category", vec![0.0]),
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::VocabularySizeMismatch { .. }));

        // Missing counts for a declared feature.
        let err = TopicData::new(
            coords.clone(),
            singleton("category", feature(&[], 2, 1)),
            singleton("category", vec!["a".to_string()]),
            BTreeMap::new(),
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::MissingCounts { .. }));

        // Venue ids of the wrong length.
        let err = TopicData::new(
            coords,
            BTreeMap::new(),
            BTreeMap::new(),
            BTreeMap::new(),
            vec!["v1".to_string()],
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::VenueIdMismatch { expected: 2, actual: 1 }));
    }

    #[test]
    // Purpose
    // -------
    // Non-finite coordinates and empty datasets are rejected.
    fn coordinate_validation() {
        let err = TopicData::new(
            Array2::<f64>::zeros((0, 2)),
            BTreeMap::new(),
            BTreeMap::new(),
            BTreeMap::new(),
            vec![],
        )
        .unwrap_err();
        assert_eq!(err, ModelError::EmptyData);

        let err = TopicData::new(
            array![[0.0, f64::NAN]],
            BTreeMap::new(),
            BTreeMap::new(),
            BTreeMap::new(),
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::NonFiniteCoordinate { row: 0, col: 1, .. }));
    }
}
