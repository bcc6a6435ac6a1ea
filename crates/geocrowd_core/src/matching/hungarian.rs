//! Hungarian (Kuhn-Munkres) algorithm for minimum-cost bipartite assignment.
//!
//! Runs in O(n^3) on an n x n matrix. Each phase grows the matching by one
//! along an augmenting path of zero-slack edges, adjusting the labeling when
//! no such edge is reachable. The labeling stays feasible throughout:
//! `cost[w][j] >= label_by_worker[w] + label_by_job[j]` for every pair.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cost::{CostMatrix, CoverageCostMatrix};
use crate::coverage::CoverageRelation;
use crate::error::Result;

use super::algorithm::MatchingAlgorithm;
use super::types::{Assignment, MatchResult, MatrixAssignment};

/// How the exact matcher prices eligible pairs when given a relation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CostPolicy {
    /// Haversine distance between worker and task.
    #[default]
    TravelDistance,
    /// Every eligible pair costs the same (maximum-cardinality matching).
    Unit,
}

/// Exact matcher: maximum number of eligible pairs, then minimum total cost.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatcher {
    pub cost_policy: CostPolicy,
}

impl ExactMatcher {
    pub fn new(cost_policy: CostPolicy) -> Self {
        Self { cost_policy }
    }

    /// Solve a square matrix. Rows and columns in the padded region come back
    /// unassigned.
    pub fn solve(matrix: &CostMatrix) -> MatrixAssignment {
        let mut hungarian = Hungarian::new(matrix);
        hungarian.run();
        hungarian.into_assignment(matrix)
    }

    /// Solve raw rows, rejecting non-square or non-finite input.
    pub fn solve_rows(rows: Vec<Vec<f64>>) -> Result<MatrixAssignment> {
        Ok(Self::solve(&CostMatrix::new(rows)?))
    }

    /// Map a coverage matrix solution back to worker and task ids, dropping
    /// pairs that are not edges of the relation.
    pub fn assign(relation: &CoverageRelation, costs: &CoverageCostMatrix) -> Assignment {
        let solution = Self::solve(&costs.matrix);
        let matches: Vec<MatchResult> = solution
            .assigned()
            .filter(|&(w, j)| costs.is_eligible(w, j))
            .map(|(w, j)| MatchResult {
                worker: costs.workers[w],
                task: costs.tasks[j],
            })
            .collect();
        let assignment = Assignment::new(matches, Vec::new(), Vec::new());

        let unassigned_workers = relation
            .workers()
            .iter()
            .map(|w| w.id)
            .filter(|id| assignment.task_for(*id).is_none())
            .collect();
        let unassigned_tasks = relation
            .tasks()
            .map(|t| t.id)
            .filter(|id| assignment.worker_for(*id).is_none())
            .collect();
        Assignment::new(assignment.matches().to_vec(), unassigned_workers, unassigned_tasks)
    }
}

impl MatchingAlgorithm for ExactMatcher {
    fn match_relation(&mut self, relation: &CoverageRelation) -> Result<Assignment> {
        let costs = match self.cost_policy {
            CostPolicy::TravelDistance => CoverageCostMatrix::travel_distance(relation)?,
            CostPolicy::Unit => CoverageCostMatrix::unit(relation)?,
        };
        let assignment = Self::assign(relation, &costs);
        debug!(
            workers = costs.workers.len(),
            tasks = costs.tasks.len(),
            matched = assignment.len(),
            "exact matching finished"
        );
        Ok(assignment)
    }
}

/// Working state of one solve. Owns a reduced copy of the matrix.
struct Hungarian {
    dim: usize,
    cost: Vec<f64>,
    label_by_worker: Vec<f64>,
    label_by_job: Vec<f64>,
    min_slack_worker_by_job: Vec<usize>,
    min_slack_value_by_job: Vec<f64>,
    match_job_by_worker: Vec<Option<usize>>,
    match_worker_by_job: Vec<Option<usize>>,
    parent_worker_by_committed_job: Vec<Option<usize>>,
    committed_workers: Vec<bool>,
    phases: usize,
    #[cfg(test)]
    labeling_updates: usize,
}

impl Hungarian {
    fn new(matrix: &CostMatrix) -> Self {
        let dim = matrix.dim();
        let mut cost = Vec::with_capacity(dim * dim);
        for w in 0..dim {
            cost.extend_from_slice(matrix.row(w));
        }
        Self {
            dim,
            cost,
            label_by_worker: vec![0.0; dim],
            label_by_job: vec![0.0; dim],
            min_slack_worker_by_job: vec![0; dim],
            min_slack_value_by_job: vec![0.0; dim],
            match_job_by_worker: vec![None; dim],
            match_worker_by_job: vec![None; dim],
            parent_worker_by_committed_job: vec![None; dim],
            committed_workers: vec![false; dim],
            phases: 0,
            #[cfg(test)]
            labeling_updates: 0,
        }
    }

    fn at(&self, w: usize, j: usize) -> f64 {
        self.cost[w * self.dim + j]
    }

    fn slack(&self, w: usize, j: usize) -> f64 {
        self.at(w, j) - self.label_by_worker[w] - self.label_by_job[j]
    }

    fn run(&mut self) {
        self.reduce();
        self.compute_initial_labeling();
        self.greedy_match();

        while let Some(w) = self.fetch_unmatched_worker() {
            self.initialize_phase(w);
            self.execute_phase();
        }
        debug!(dim = self.dim, phases = self.phases, "hungarian solve finished");
    }

    /// Subtract each row's minimum from the row, then each column's minimum
    /// from the column. Optimal assignments are unchanged.
    fn reduce(&mut self) {
        let dim = self.dim;
        for w in 0..dim {
            let row = &mut self.cost[w * dim..(w + 1) * dim];
            let min = row.iter().copied().fold(f64::INFINITY, f64::min);
            row.iter_mut().for_each(|c| *c -= min);
        }
        for j in 0..dim {
            let min = (0..dim)
                .map(|w| self.cost[w * dim + j])
                .fold(f64::INFINITY, f64::min);
            for w in 0..dim {
                self.cost[w * dim + j] -= min;
            }
        }
    }

    /// Worker labels start at zero, job labels at their column minimum.
    fn compute_initial_labeling(&mut self) {
        for j in 0..self.dim {
            self.label_by_job[j] = (0..self.dim)
                .map(|w| self.at(w, j))
                .fold(f64::INFINITY, f64::min);
        }
    }

    /// Match every free zero-slack pair in index order.
    fn greedy_match(&mut self) {
        for w in 0..self.dim {
            for j in 0..self.dim {
                if self.match_job_by_worker[w].is_none()
                    && self.match_worker_by_job[j].is_none()
                    && self.slack(w, j) == 0.0
                {
                    self.matched(w, j);
                }
            }
        }
    }

    fn fetch_unmatched_worker(&self) -> Option<usize> {
        self.match_job_by_worker.iter().position(Option::is_none)
    }

    /// Clear the committed sets and seed slacks from root worker `w`.
    fn initialize_phase(&mut self, w: usize) {
        self.phases += 1;
        self.committed_workers.fill(false);
        self.parent_worker_by_committed_job.fill(None);
        self.committed_workers[w] = true;
        for j in 0..self.dim {
            self.min_slack_value_by_job[j] = self.slack(w, j);
            self.min_slack_worker_by_job[j] = w;
        }
    }

    /// Grow the committed tree until an augmenting path is found, then flip it.
    fn execute_phase(&mut self) {
        loop {
            let mut best: Option<(usize, f64)> = None;
            for j in 0..self.dim {
                if self.parent_worker_by_committed_job[j].is_none()
                    && best.map_or(true, |(_, v)| self.min_slack_value_by_job[j] < v)
                {
                    best = Some((j, self.min_slack_value_by_job[j]));
                }
            }
            // Committed workers always outnumber committed jobs by one, so an
            // uncommitted job exists.
            let Some((job, slack)) = best else {
                debug_assert!(false, "phase ran out of uncommitted jobs");
                return;
            };
            let worker = self.min_slack_worker_by_job[job];

            if slack > 0.0 {
                self.update_labeling(slack);
                #[cfg(test)]
                self.check_labeling();
            }
            self.parent_worker_by_committed_job[job] = Some(worker);

            match self.match_worker_by_job[job] {
                None => {
                    self.augment(job);
                    return;
                }
                Some(matched_worker) => {
                    self.committed_workers[matched_worker] = true;
                    for j in 0..self.dim {
                        if self.parent_worker_by_committed_job[j].is_none() {
                            let slack = self.slack(matched_worker, j);
                            if self.min_slack_value_by_job[j] > slack {
                                self.min_slack_value_by_job[j] = slack;
                                self.min_slack_worker_by_job[j] = matched_worker;
                            }
                        }
                    }
                }
            }
        }
    }

    /// Flip the alternating path ending at free job `job` back to the root.
    fn augment(&mut self, job: usize) {
        let mut committed_job = job;
        let Some(mut parent_worker) = self.parent_worker_by_committed_job[committed_job] else {
            return;
        };
        loop {
            let previous_job = self.match_job_by_worker[parent_worker];
            self.matched(parent_worker, committed_job);
            let Some(next_job) = previous_job else {
                break;
            };
            committed_job = next_job;
            match self.parent_worker_by_committed_job[committed_job] {
                Some(w) => parent_worker = w,
                None => {
                    debug_assert!(false, "matched job on the path was never committed");
                    break;
                }
            }
        }
    }

    /// Raise committed worker labels and lower committed job labels by
    /// `slack`; remaining slacks drop by the same amount.
    fn update_labeling(&mut self, slack: f64) {
        for w in 0..self.dim {
            if self.committed_workers[w] {
                self.label_by_worker[w] += slack;
            }
        }
        for j in 0..self.dim {
            if self.parent_worker_by_committed_job[j].is_some() {
                self.label_by_job[j] -= slack;
            } else {
                self.min_slack_value_by_job[j] -= slack;
            }
        }
    }

    fn matched(&mut self, w: usize, j: usize) {
        self.match_job_by_worker[w] = Some(j);
        self.match_worker_by_job[j] = Some(w);
    }

    fn into_assignment(self, matrix: &CostMatrix) -> MatrixAssignment {
        let jobs = matrix.job_count();
        MatrixAssignment {
            job_by_worker: self
                .match_job_by_worker
                .into_iter()
                .take(matrix.worker_count())
                .map(|j| j.filter(|&j| j < jobs))
                .collect(),
        }
    }
}

#[cfg(test)]
const TOLERANCE: f64 = 1e-9;

#[cfg(test)]
impl Hungarian {
    /// Slack tolerance scaled to the magnitudes involved in `(w, j)`.
    fn tolerance(&self, w: usize, j: usize) -> f64 {
        let scale = 1.0
            + self.at(w, j).abs()
            + self.label_by_worker[w].abs()
            + self.label_by_job[j].abs();
        TOLERANCE * scale
    }

    fn is_feasible(&self) -> bool {
        (0..self.dim).all(|w| (0..self.dim).all(|j| self.slack(w, j) >= -self.tolerance(w, j)))
    }

    fn matched_edges_are_tight(&self) -> bool {
        self.match_job_by_worker
            .iter()
            .enumerate()
            .filter_map(|(w, j)| j.map(|j| (w, j)))
            .all(|(w, j)| self.slack(w, j).abs() <= self.tolerance(w, j))
    }

    /// Runs after every labeling update inside a phase.
    fn check_labeling(&mut self) {
        self.labeling_updates += 1;
        assert!(
            self.is_feasible(),
            "labeling infeasible after update {} in phase {}",
            self.labeling_updates,
            self.phases
        );
        assert!(self.matched_edges_are_tight());
    }
}
