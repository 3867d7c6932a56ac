//! Human-readable region labels from the fitted categorical distributions.
//!
//! For each region and feature, the label is the shortest prefix of the
//! probability-sorted vocabulary covering [`LABEL_MASS_THRESHOLD`] of the
//! mass. A region whose distribution is too diffuse for the feature (more
//! than [`LABEL_MAX_ENTRIES`] entries needed) gets no label for it, since a
//! twenty-plus-token "label" describes nothing.
use std::collections::BTreeMap;

use crate::model::{
    core::TopicData,
    em::GeoTopicModel,
    errors::{ModelError, ModelResult},
};

/// Cumulative probability mass a label must cover.
pub const LABEL_MASS_THRESHOLD: f64 = 0.8;

/// Labels longer than this are dropped as uninformative.
pub const LABEL_MAX_ENTRIES: usize = 20;

impl GeoTopicModel {
    /// Per-region, per-feature labels: the highest-probability vocabulary
    /// entries (with their probabilities) covering 0.8 cumulative mass, or
    /// `None` when more than 20 entries would be needed.
    ///
    /// `data` supplies the vocabularies; it must agree with the fitted
    /// parameters on feature names and vocabulary sizes.
    pub fn topic_labels(
        &self, data: &TopicData,
    ) -> ModelResult<Vec<BTreeMap<String, Option<Vec<(String, f64)>>>>> {
        let params = self.params()?;
        let mut labels = Vec::with_capacity(params.num_topics);

        for z in 0..params.num_topics {
            let mut per_feature = BTreeMap::new();
            for (name, vocabulary) in data.unigrams() {
                let beta = params
                    .beta_arrays
                    .get(name)
                    .ok_or_else(|| ModelError::UnknownFeature { feature: name.clone() })?;
                if beta.ncols() != vocabulary.len() {
                    return Err(ModelError::VocabularySizeMismatch {
                        feature: name.clone(),
                        expected: beta.ncols(),
                        actual: vocabulary.len(),
                    });
                }

                let row = beta.row(z);
                let mut order: Vec<usize> = (0..row.len()).collect();
                order.sort_by(|&a, &b| row[b].total_cmp(&row[a]));

                let mut cumulative = 0.0;
                let mut cut = None;
                for (rank, &index) in order.iter().enumerate() {
                    cumulative += row[index];
                    if cumulative >= LABEL_MASS_THRESHOLD {
                        cut = Some(rank);
                        break;
                    }
                }

                let label = match cut {
                    Some(rank) if rank <= LABEL_MAX_ENTRIES => Some(
                        order[..=rank]
                            .iter()
                            .map(|&index| (vocabulary[index].clone(), row[index]))
                            .collect(),
                    ),
                    _ => None,
                };
                per_feature.insert(name.clone(), label);
            }
            labels.push(per_feature);
        }
        Ok(labels)
    }
}
