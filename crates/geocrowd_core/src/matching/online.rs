//! Randomized online bipartite matching (RANKING, Karp-Vazirani-Vazirani).
//!
//! Workers are known up front and receive a uniformly random rank. Tasks
//! arrive one at a time; each goes to its highest-priority (smallest rank)
//! eligible worker that is still free, or is skipped for good. The random
//! ranking is what gives the 1 - 1/e competitive ratio against any arrival
//! order.

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::coverage::CoverageRelation;
use crate::error::{AssignmentError, Result};
use crate::model::{TaskId, WorkerId};

use super::algorithm::MatchingAlgorithm;
use super::types::{Assignment, MatchResult};

/// Stateful ranking matcher for one task stream.
///
/// Decisions are irrevocable: a matched worker leaves both rank tables and
/// never comes back.
#[derive(Debug, Clone)]
pub struct OnlineMatcher {
    rank_by_worker: HashMap<WorkerId, usize>,
    /// Indexed by rank; `None` once the worker is matched.
    worker_by_rank: Vec<Option<WorkerId>>,
    matched: HashSet<WorkerId>,
}

impl OnlineMatcher {
    /// Rank `workers` with a full shuffle drawn from `rng`.
    pub fn new<R: Rng + ?Sized>(workers: impl IntoIterator<Item = WorkerId>, rng: &mut R) -> Self {
        let mut order = dedup(workers);
        order.shuffle(rng);
        Self::with_ranking(order)
    }

    /// Rank `workers` with a shuffle seeded by `seed` (reproducible).
    pub fn from_seed(workers: impl IntoIterator<Item = WorkerId>, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::new(workers, &mut rng)
    }

    /// Use a fixed ranking: the first worker has the highest priority.
    pub fn with_ranking(order: Vec<WorkerId>) -> Self {
        let order = dedup(order);
        let rank_by_worker = order.iter().enumerate().map(|(rank, w)| (*w, rank)).collect();
        Self {
            rank_by_worker,
            worker_by_rank: order.into_iter().map(Some).collect(),
            matched: HashSet::new(),
        }
    }

    /// Rank of a still-free worker.
    pub fn rank_of(&self, worker: WorkerId) -> Option<usize> {
        self.rank_by_worker.get(&worker).copied()
    }

    /// Free worker holding `rank`.
    pub fn worker_at(&self, rank: usize) -> Option<WorkerId> {
        self.worker_by_rank.get(rank).copied().flatten()
    }

    pub fn free_workers(&self) -> usize {
        self.rank_by_worker.len()
    }

    pub fn matched_workers(&self) -> usize {
        self.matched.len()
    }

    /// Decide one arriving task given its eligible workers.
    ///
    /// Returns the chosen worker, or `None` when every eligible worker is
    /// already taken. Naming a worker that was never ranked is an error.
    pub fn assign(&mut self, eligible: &[WorkerId]) -> Result<Option<WorkerId>> {
        let mut best: Option<(usize, WorkerId)> = None;
        for worker in eligible {
            match self.rank_by_worker.get(worker) {
                Some(&rank) => {
                    if best.map_or(true, |(r, _)| rank < r) {
                        best = Some((rank, *worker));
                    }
                }
                None if self.matched.contains(worker) => {}
                None => return Err(AssignmentError::UnknownWorker(*worker)),
            }
        }

        Ok(best.map(|(rank, worker)| {
            self.rank_by_worker.remove(&worker);
            self.worker_by_rank[rank] = None;
            self.matched.insert(worker);
            worker
        }))
    }

    /// Feed a stream of `(task, eligible workers)` arrivals.
    pub fn run<'a>(
        &mut self,
        arrivals: impl IntoIterator<Item = (TaskId, &'a [WorkerId])>,
    ) -> Result<Assignment> {
        let mut matches = Vec::new();
        let mut unassigned_tasks = Vec::new();
        for (task, eligible) in arrivals {
            match self.assign(eligible)? {
                Some(worker) => matches.push(MatchResult { worker, task }),
                None => unassigned_tasks.push(task),
            }
        }

        let mut unassigned_workers: Vec<WorkerId> = self.rank_by_worker.keys().copied().collect();
        unassigned_workers.sort_by_key(|w| self.rank_by_worker[w]);
        Ok(Assignment::new(matches, unassigned_workers, unassigned_tasks))
    }
}

impl MatchingAlgorithm for OnlineMatcher {
    /// Stream the relation's live tasks in ascending id order.
    fn match_relation(&mut self, relation: &CoverageRelation) -> Result<Assignment> {
        let arrivals = relation.tasks().map(|t| (t.id, t.workers()));
        let assignment = self.run(arrivals)?;
        debug!(
            tasks = relation.task_count(),
            matched = assignment.len(),
            free_workers = self.free_workers(),
            "online matching pass finished"
        );
        Ok(assignment)
    }
}

fn dedup(workers: impl IntoIterator<Item = WorkerId>) -> Vec<WorkerId> {
    let mut seen = HashSet::new();
    workers.into_iter().filter(|w| seen.insert(*w)).collect()
}
