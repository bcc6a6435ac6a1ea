//! Per-instance algorithm selection and summary statistics.
//!
//! The caller owns the time loop and any running totals; this module turns one
//! coverage relation plus a config into one outcome.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{AlgorithmKind, AssignmentConfig};
use crate::coverage::CoverageRelation;
use crate::error::Result;
use crate::matching::{Assignment, ExactMatcher, MatchingAlgorithm, OnlineMatcher};
use crate::model::{distance_km, TaskId, TimeInstance, WorkerId};
use crate::setcover::{min_set_cover, CoverOutcome, CoverStrategy};

/// What the selected algorithm produced.
#[derive(Debug, Clone, PartialEq)]
pub enum InstanceResult {
    Matching(Assignment),
    Cover(CoverOutcome),
}

/// Scalar metrics of one time instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InstanceSummary {
    pub time_instance: TimeInstance,
    pub algorithm: AlgorithmKind,
    /// Live tasks in the relation.
    pub tasks: usize,
    /// Workers in the relation.
    pub workers: usize,
    /// Matched workers, or selected workers for set cover.
    pub assigned_workers: usize,
    /// Matched tasks, or covered tasks for set cover.
    pub assigned_tasks: usize,
    /// Summed worker-to-task distance of the assigned pairs: matched pairs,
    /// or every task credited to a selected worker for set cover.
    pub travel_distance_km: f64,
}

impl InstanceSummary {
    /// Tasks per assigned worker, `None` when nobody was assigned.
    pub fn tasks_per_worker(&self) -> Option<f64> {
        (self.assigned_workers > 0)
            .then(|| self.assigned_tasks as f64 / self.assigned_workers as f64)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstanceOutcome {
    pub result: InstanceResult,
    pub summary: InstanceSummary,
}

/// Run the configured algorithm on one time instance.
///
/// The online matcher is seeded with `config.seed` offset by the time
/// instance, so repeated runs are reproducible.
pub fn run_instance(
    relation: &CoverageRelation,
    config: &AssignmentConfig,
) -> Result<InstanceOutcome> {
    config.validate()?;

    let result = match CoverStrategy::for_kind(config.algorithm, &config.combined, relation) {
        Some(strategy) => InstanceResult::Cover(min_set_cover(relation, strategy)),
        None => {
            let mut matcher: Box<dyn MatchingAlgorithm> = match config.algorithm {
                AlgorithmKind::Online => Box::new(OnlineMatcher::from_seed(
                    relation.workers().iter().map(|w| w.id),
                    config.seed.wrapping_add(u64::from(relation.current())),
                )),
                _ => Box::new(ExactMatcher::new(config.cost_policy)),
            };
            InstanceResult::Matching(matcher.match_relation(relation)?)
        }
    };

    let (assigned_workers, assigned_tasks, travel_distance_km) = match &result {
        InstanceResult::Matching(assignment) => (
            assignment.len(),
            assignment.len(),
            travel_distance(relation, assignment.matches().iter().map(|m| (m.worker, m.task))),
        ),
        InstanceResult::Cover(outcome) => (
            outcome.selected_count(),
            outcome.covered_count(),
            travel_distance(
                relation,
                outcome
                    .selections()
                    .iter()
                    .flat_map(|s| s.tasks.iter().map(move |t| (s.worker, *t))),
            ),
        ),
    };
    let summary = InstanceSummary {
        time_instance: relation.current(),
        algorithm: config.algorithm,
        tasks: relation.task_count(),
        workers: relation.worker_count(),
        assigned_workers,
        assigned_tasks,
        travel_distance_km,
    };
    info!(
        time_instance = summary.time_instance,
        algorithm = ?summary.algorithm,
        tasks = summary.tasks,
        workers = summary.workers,
        assigned_workers,
        assigned_tasks,
        travel_distance_km,
        "instance assigned"
    );
    Ok(InstanceOutcome { result, summary })
}

fn travel_distance(
    relation: &CoverageRelation,
    pairs: impl Iterator<Item = (WorkerId, TaskId)>,
) -> f64 {
    pairs
        .filter_map(|(worker, task)| {
            let worker = relation.worker(worker)?;
            let task = relation.task(task)?;
            Some(distance_km(worker.position, task.position))
        })
        .sum()
}

/// Run independent instances on the rayon pool. Output order follows input.
pub fn run_instances_parallel(
    relations: &[CoverageRelation],
    config: &AssignmentConfig,
) -> Result<Vec<InstanceOutcome>> {
    relations
        .par_iter()
        .map(|relation| run_instance(relation, config))
        .collect()
}

/// Running totals across time instances, owned by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunTotals {
    pub instances: usize,
    pub total_assigned_workers: usize,
    pub total_tasks_assigned: usize,
    pub total_travel_distance_km: f64,
    /// Sum of per-instance tasks-per-worker ratios (instances without
    /// assigned workers add nothing).
    pub summed_tasks_per_worker: f64,
}

impl RunTotals {
    pub fn record(&mut self, summary: &InstanceSummary) {
        self.instances += 1;
        self.total_assigned_workers += summary.assigned_workers;
        self.total_tasks_assigned += summary.assigned_tasks;
        self.total_travel_distance_km += summary.travel_distance_km;
        if let Some(ratio) = summary.tasks_per_worker() {
            self.summed_tasks_per_worker += ratio;
        }
    }

    /// Mean tasks-per-worker ratio over all recorded instances.
    pub fn average_tasks_per_worker(&self) -> Option<f64> {
        (self.instances > 0).then(|| self.summed_tasks_per_worker / self.instances as f64)
    }
}

impl<'a> FromIterator<&'a InstanceSummary> for RunTotals {
    fn from_iter<I: IntoIterator<Item = &'a InstanceSummary>>(iter: I) -> Self {
        let mut totals = RunTotals::default();
        for summary in iter {
            totals.record(summary);
        }
        totals
    }
}
