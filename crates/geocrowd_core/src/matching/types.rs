use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::model::{TaskId, WorkerId};

/// A worker-task pair chosen by a matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub worker: WorkerId,
    pub task: TaskId,
}

/// Terminal output of the matching algorithms: each worker holds at most one
/// task and each task at most one worker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    matches: Vec<MatchResult>,
    unassigned_workers: Vec<WorkerId>,
    unassigned_tasks: Vec<TaskId>,
}

impl Assignment {
    pub fn new(
        matches: Vec<MatchResult>,
        unassigned_workers: Vec<WorkerId>,
        unassigned_tasks: Vec<TaskId>,
    ) -> Self {
        Self {
            matches,
            unassigned_workers,
            unassigned_tasks,
        }
    }

    /// Matches in the order they were decided.
    pub fn matches(&self) -> &[MatchResult] {
        &self.matches
    }

    pub fn unassigned_workers(&self) -> &[WorkerId] {
        &self.unassigned_workers
    }

    pub fn unassigned_tasks(&self) -> &[TaskId] {
        &self.unassigned_tasks
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn task_for(&self, worker: WorkerId) -> Option<TaskId> {
        self.matches
            .iter()
            .find(|m| m.worker == worker)
            .map(|m| m.task)
    }

    pub fn worker_for(&self, task: TaskId) -> Option<WorkerId> {
        self.matches
            .iter()
            .find(|m| m.task == task)
            .map(|m| m.worker)
    }

    /// `worker -> task` view of the matches.
    pub fn by_worker(&self) -> BTreeMap<WorkerId, TaskId> {
        self.matches.iter().map(|m| (m.worker, m.task)).collect()
    }

    /// No worker and no task appears in two matches.
    pub fn is_partial_injection(&self) -> bool {
        let mut workers = BTreeSet::new();
        let mut tasks = BTreeSet::new();
        self.matches
            .iter()
            .all(|m| workers.insert(m.worker) && tasks.insert(m.task))
    }
}

/// Row-indexed solution of a square cost matrix.
///
/// `job_by_worker[w]` is `None` when worker row `w` is matched to a padded
/// column or was never matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixAssignment {
    pub job_by_worker: Vec<Option<usize>>,
}

impl MatrixAssignment {
    pub fn assigned(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.job_by_worker
            .iter()
            .enumerate()
            .filter_map(|(w, j)| j.map(|j| (w, j)))
    }

    /// Total cost of the real pairs under `matrix`.
    pub fn total_cost(&self, matrix: &crate::cost::CostMatrix) -> f64 {
        self.assigned().map(|(w, j)| matrix.at(w, j)).sum()
    }
}
