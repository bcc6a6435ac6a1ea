//! Scoring functions plugged into the greedy set-cover loop.
//!
//! Every strategy scores a worker over its still-uncovered tasks, and the loop
//! picks the lowest weight.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::{AlgorithmKind, CombinedWeights};
use crate::coverage::{CoverageRelation, WorkerCoverage};
use crate::model::{TaskId, TimeInstance};

/// Outcome of scoring one worker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Score {
    /// Lower is better.
    Weight(f64),
    /// Select this worker now without scoring the rest.
    Force,
}

/// Greedy selection rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverStrategy {
    /// Classic greedy: the worker covering most uncovered tasks.
    MostUncovered,
    /// The worker with the smallest total coverage set, keeping flexible
    /// workers for later rounds.
    SmallestAssociatedSet,
    /// The worker holding the most urgent uncovered task. A task due at the
    /// next time instance forces its worker in immediately.
    WaitTillDeadline,
    /// `alpha * ATD / T + (1 - alpha) * ARE / entropy_scale`, where ATD is the
    /// average time-to-deadline and ARE the region entropy divided by the
    /// number of uncovered tasks.
    CombinedDeadline {
        alpha: f64,
        deadline_horizon: f64,
        /// Zero drops the entropy term.
        entropy_scale: f64,
    },
}

impl CoverStrategy {
    /// Strategy for a set-cover algorithm kind, resolving normalization
    /// against `relation`. `None` for matching kinds.
    pub fn for_kind(
        kind: AlgorithmKind,
        weights: &CombinedWeights,
        relation: &CoverageRelation,
    ) -> Option<Self> {
        match kind {
            AlgorithmKind::GreedySetCover => Some(Self::MostUncovered),
            AlgorithmKind::SmallestAssociatedSet => Some(Self::SmallestAssociatedSet),
            AlgorithmKind::WaitTillDeadline => Some(Self::WaitTillDeadline),
            AlgorithmKind::CombinedDeadline => Some(Self::CombinedDeadline {
                alpha: weights.alpha,
                deadline_horizon: weights.deadline_horizon,
                entropy_scale: weights.entropy_scale(relation),
            }),
            AlgorithmKind::Exact | AlgorithmKind::Online => None,
        }
    }

    /// Score `worker` against the tasks not yet completed.
    ///
    /// `None` when the worker covers no uncovered task, so averages are never
    /// taken over an empty set. A weight that is not a finite number is also
    /// `None`: it would never compare below another candidate.
    pub fn score(
        &self,
        worker: &WorkerCoverage,
        current: TimeInstance,
        completed: &BTreeSet<TaskId>,
    ) -> Option<Score> {
        let mut uncovered = 0usize;
        let mut min_remaining = u32::MAX;
        let mut total_remaining = 0u64;
        for (task, deadline) in worker.tasks() {
            if completed.contains(task) {
                continue;
            }
            let remaining = deadline.saturating_sub(current);
            uncovered += 1;
            min_remaining = min_remaining.min(remaining);
            total_remaining += u64::from(remaining);
        }
        if uncovered == 0 {
            return None;
        }

        let score = match *self {
            Self::MostUncovered => Score::Weight(-(uncovered as f64)),
            Self::SmallestAssociatedSet => Score::Weight(worker.len() as f64),
            Self::WaitTillDeadline => {
                if min_remaining <= 1 {
                    Score::Force
                } else {
                    Score::Weight(f64::from(min_remaining))
                }
            }
            Self::CombinedDeadline {
                alpha,
                deadline_horizon,
                entropy_scale,
            } => {
                let average_deadline = total_remaining as f64 / uncovered as f64;
                let average_entropy = worker.region_entropy / uncovered as f64;
                let deadline_term = alpha * average_deadline / deadline_horizon;
                let entropy_term = if entropy_scale > 0.0 {
                    (1.0 - alpha) * average_entropy / entropy_scale
                } else {
                    0.0
                };
                Score::Weight(deadline_term + entropy_term)
            }
        };
        match score {
            Score::Weight(weight) if !weight.is_finite() => None,
            score => Some(score),
        }
    }
}
