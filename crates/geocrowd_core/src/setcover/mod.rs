//! Greedy minimum set cover over a coverage relation.
//!
//! One selection loop serves every variant; a [`CoverStrategy`] decides which
//! worker goes next. Each round credits the chosen worker with its uncovered
//! tasks and retires it. The loop stops once every task is covered or no
//! remaining worker covers an uncovered task.

pub mod strategy;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::coverage::CoverageRelation;
use crate::model::{TaskId, WorkerId};

pub use strategy::{CoverStrategy, Score};

/// One round of the greedy loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverSelection {
    pub worker: WorkerId,
    /// Uncovered tasks the worker was credited with this round.
    pub tasks: Vec<TaskId>,
    /// Winning weight; `None` when the worker was forced in.
    pub weight: Option<f64>,
}

/// Result of one greedy set-cover run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverOutcome {
    selections: Vec<CoverSelection>,
    covered: BTreeSet<TaskId>,
}

impl CoverOutcome {
    /// Rounds in selection order.
    pub fn selections(&self) -> &[CoverSelection] {
        &self.selections
    }

    pub fn selected_workers(&self) -> impl Iterator<Item = WorkerId> + '_ {
        self.selections.iter().map(|s| s.worker)
    }

    /// Tasks that reached their required number of credited workers.
    pub fn covered_tasks(&self) -> &BTreeSet<TaskId> {
        &self.covered
    }

    pub fn selected_count(&self) -> usize {
        self.selections.len()
    }

    pub fn covered_count(&self) -> usize {
        self.covered.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CoverState {
    Selecting,
    Done,
}

/// Run the greedy loop with `strategy`.
///
/// Ties go to the worker registered first.
pub fn min_set_cover(relation: &CoverageRelation, strategy: CoverStrategy) -> CoverOutcome {
    let current = relation.current();
    let workers = relation.workers();
    let total_tasks = relation.task_count();

    let mut retired = vec![false; workers.len()];
    let mut credits: BTreeMap<TaskId, u32> = BTreeMap::new();
    let mut outcome = CoverOutcome::default();
    let mut state = CoverState::Selecting;

    while state == CoverState::Selecting {
        if outcome.covered.len() >= total_tasks {
            state = CoverState::Done;
            continue;
        }

        let mut best: Option<(usize, Option<f64>)> = None;
        for (idx, worker) in workers.iter().enumerate() {
            if retired[idx] {
                continue;
            }
            match strategy.score(worker, current, &outcome.covered) {
                None => {}
                Some(Score::Force) => {
                    best = Some((idx, None));
                    break;
                }
                Some(Score::Weight(weight)) => {
                    let better = match best {
                        None => true,
                        Some((_, Some(best_weight))) => weight < best_weight,
                        Some((_, None)) => false,
                    };
                    if better {
                        best = Some((idx, Some(weight)));
                    }
                }
            }
        }

        let Some((idx, weight)) = best else {
            state = CoverState::Done;
            continue;
        };

        retired[idx] = true;
        let worker = &workers[idx];
        let tasks: Vec<TaskId> = worker
            .tasks()
            .keys()
            .filter(|t| !outcome.covered.contains(t))
            .copied()
            .collect();
        for task in &tasks {
            let credit = credits.entry(*task).or_insert(0);
            *credit += 1;
            let required = relation.task(*task).map_or(1, |t| t.required_workers);
            if *credit >= required {
                outcome.covered.insert(*task);
            }
        }
        debug!(
            worker = %worker.id,
            credited = tasks.len(),
            covered = outcome.covered.len(),
            ?weight,
            "set cover selection"
        );
        outcome.selections.push(CoverSelection {
            worker: worker.id,
            tasks,
            weight,
        });
    }

    debug!(
        ?strategy,
        selected = outcome.selected_count(),
        covered = outcome.covered_count(),
        tasks = total_tasks,
        "set cover finished"
    );
    outcome
}
