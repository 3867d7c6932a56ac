//! Per-iteration likelihood statistics and the tracking policy.
//!
//! Purpose
//! -------
//! [`Statistics`] records one committed iteration's penalized likelihood,
//! its additive decomposition, and the parameter snapshot that produced it.
//! [`StatisticsTrace`] fixes the retention policy once at construction:
//! either only the newest snapshot survives, or every committed snapshot is
//! appended to a history. The EM loop always calls [`StatisticsTrace::record`]
//! and never branches on a tracking flag.
use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};

/// One committed iteration's likelihood decomposition and snapshot.
///
/// The total satisfies
/// `likelihood = feature + location + topic - 2 * sigma - entropy + eta_penalty`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Total penalized likelihood.
    pub likelihood: f64,
    /// Categorical-feature term: sum over features of `wc (.) ln(beta)`.
    pub feature: f64,
    /// Geographic term: responsibility-weighted Gaussian log-densities.
    pub location: f64,
    /// Mixture term: responsibility-weighted `ln(theta)`.
    pub topic: f64,
    /// Covariance penalty: sum over regions of `ln(det(covar))`.
    pub sigma: f64,
    /// Responsibility entropy `sum phi * ln(phi)` (zero-responsibility
    /// entries contribute 0).
    pub entropy: f64,
    /// L1 sparsity penalty, `sum_f -lambda * sum |h|` (non-positive).
    pub eta_penalty: f64,
    /// Responsibilities that produced this evaluation (k x N).
    pub phi: Array2<f64>,
    /// Region centers at this evaluation (k x 2).
    pub centers: Array2<f64>,
    /// Region covariances at this evaluation (k x 2 x 2).
    pub covariances: Array3<f64>,
}

/// Retention policy for committed statistics, chosen once per fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatisticsTrace {
    /// Keep only the newest committed snapshot.
    LatestOnly { latest: Option<Statistics> },
    /// Keep every committed snapshot in commit order.
    Tracked { history: Vec<Statistics> },
}

impl StatisticsTrace {
    /// Select the policy: `track` keeps the full history.
    pub fn new(track: bool) -> Self {
        if track {
            StatisticsTrace::Tracked { history: Vec::new() }
        } else {
            StatisticsTrace::LatestOnly { latest: None }
        }
    }

    /// Record one committed iteration.
    pub fn record(&mut self, stats: Statistics) {
        match self {
            StatisticsTrace::LatestOnly { latest } => *latest = Some(stats),
            StatisticsTrace::Tracked { history } => history.push(stats),
        }
    }

    /// The most recently committed snapshot, if any.
    pub fn latest(&self) -> Option<&Statistics> {
        match self {
            StatisticsTrace::LatestOnly { latest } => latest.as_ref(),
            StatisticsTrace::Tracked { history } => history.last(),
        }
    }

    /// The full history (empty slice under the latest-only policy).
    pub fn history(&self) -> &[Statistics] {
        match self {
            StatisticsTrace::LatestOnly { .. } => &[],
            StatisticsTrace::Tracked { history } => history,
        }
    }

    /// Drop all recorded snapshots, keeping the policy.
    pub fn reset(&mut self) {
        match self {
            StatisticsTrace::LatestOnly { latest } => *latest = None,
            StatisticsTrace::Tracked { history } => history.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    fn stats(likelihood: f64) -> Statistics {
        Statistics {
            likelihood,
            feature: 0.0,
            location: 0.0,
            topic: 0.0,
            sigma: 0.0,
            entropy: 0.0,
            eta_penalty: 0.0,
            phi: Array2::zeros((1, 1)),
            centers: Array2::zeros((1, 2)),
            covariances: Array3::zeros((1, 2, 2)),
        }
    }

    #[test]
    // Purpose
    // -------
    // LatestOnly holds exactly the newest snapshot; Tracked accumulates one
    // entry per record in commit order. Both expose the same `latest`.
    fn retention_policies() {
        let mut latest_only = StatisticsTrace::new(false);
        let mut tracked = StatisticsTrace::new(true);

        for value in [1.0, 2.0, 3.0] {
            latest_only.record(stats(value));
            tracked.record(stats(value));
        }

        assert_eq!(latest_only.latest().map(|s| s.likelihood), Some(3.0));
        assert!(latest_only.history().is_empty());

        assert_eq!(tracked.latest().map(|s| s.likelihood), Some(3.0));
        let history: Vec<f64> = tracked.history().iter().map(|s| s.likelihood).collect();
        assert_eq!(history, vec![1.0, 2.0, 3.0]);

        latest_only.reset();
        tracked.reset();
        assert!(latest_only.latest().is_none());
        assert!(tracked.latest().is_none());
    }
}
