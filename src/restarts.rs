//! Parallel-restart orchestration.
//!
//! EM converges to a local optimum of the penalized likelihood, so a
//! production fit runs several independently initialized restarts and keeps
//! the best. Each restart owns a private model (and, with a base seed, its
//! own deterministic stream derived as `seed + restart_index`); the only
//! shared state is the read-only dataset, so the restarts run on a rayon
//! pool with no synchronization. The EM engine itself stays
//! single-threaded.
use rayon::prelude::*;

use crate::model::{
    core::{ModelOptions, TopicData},
    em::GeoTopicModel,
    errors::{ModelError, ModelResult},
};

/// Fit `num_restarts` independently initialized models in parallel and
/// return the one with the highest final likelihood.
///
/// Restarts that halted early on a numerical failure still participate with
/// whatever likelihood they last committed; a restart that committed nothing
/// ranks below every one that did.
///
/// # Errors
/// - [`ModelError::InvalidRestartCount`] for zero restarts.
/// - Any configuration or data error from an individual fit.
pub fn fit_restarts(
    options: &ModelOptions, data: &TopicData, num_restarts: usize,
) -> ModelResult<GeoTopicModel> {
    if num_restarts == 0 {
        return Err(ModelError::InvalidRestartCount { value: num_restarts });
    }

    let fitted: Vec<ModelResult<GeoTopicModel>> = (0..num_restarts)
        .into_par_iter()
        .map(|restart| {
            let seed = options.seed().map(|base| base + restart as u64);
            let mut model = GeoTopicModel::new(options.reseeded(seed));
            model.fit(data)?;
            Ok(model)
        })
        .collect();

    let mut best: Option<(f64, GeoTopicModel)> = None;
    for result in fitted {
        let model = result?;
        let likelihood = model
            .latest_statistics()
            .map(|stats| stats.likelihood)
            .unwrap_or(f64::NEG_INFINITY);
        let replace = match &best {
            Some((current, _)) => likelihood.total_cmp(current).is_gt(),
            None => true,
        };
        if replace {
            best = Some((likelihood, model));
        }
    }

    // num_restarts >= 1, so at least one model reached the fold.
    best.map(|(_, model)| model).ok_or(ModelError::InvalidRestartCount { value: num_restarts })
}
