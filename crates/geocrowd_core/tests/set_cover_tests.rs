use std::collections::BTreeSet;

use geocrowd_core::config::{AlgorithmKind, CombinedWeights};
use geocrowd_core::setcover::{min_set_cover, CoverStrategy};
use geocrowd_core::test_helpers::{
    random_relation, relation_from_sets, relation_with_entropy, test_task, test_worker,
    InstanceShape,
};
use geocrowd_core::{AssignmentError, CoverageRelation, TaskId, WorkerId};

fn strategies(relation: &CoverageRelation) -> Vec<CoverStrategy> {
    let weights = CombinedWeights::default();
    AlgorithmKind::ALL
        .into_iter()
        .filter_map(|kind| CoverStrategy::for_kind(kind, &weights, relation))
        .collect()
}

#[test]
fn every_strategy_credits_disjoint_tasks_and_covers_all_coverable() {
    for seed in 0..30 {
        let relation = random_relation(seed, 4, InstanceShape::default());
        for strategy in strategies(&relation) {
            let outcome = min_set_cover(&relation, strategy);

            let mut seen = BTreeSet::new();
            let mut workers = BTreeSet::new();
            for selection in outcome.selections() {
                assert!(!selection.tasks.is_empty(), "{strategy:?}: empty selection");
                assert!(workers.insert(selection.worker), "{strategy:?}: worker picked twice");
                for task in &selection.tasks {
                    assert!(relation.worker(selection.worker).unwrap().covers(*task));
                    assert!(seen.insert(*task), "{strategy:?}: {task} credited twice");
                }
            }
            assert_eq!(seen.len(), outcome.covered_count());
            assert_eq!(
                outcome.covered_count(),
                relation.coverable_task_count(),
                "seed {seed}, {strategy:?}"
            );
        }
    }
}

/// Two rows A and B of 30 tasks each, plus four trap workers of sizes 4, 8,
/// 16 and 32 that each take half of their tasks from either row.
fn greedy_trap_relation() -> CoverageRelation {
    let row_a: Vec<u32> = (0..60).filter(|t| t % 2 == 0).collect();
    let row_b: Vec<u32> = (0..60).filter(|t| t % 2 == 1).collect();
    let traps: Vec<Vec<u32>> = [(0, 4), (4, 12), (12, 28), (28, 60)]
        .into_iter()
        .map(|(start, end)| (start..end).collect())
        .collect();

    let mut sets: Vec<(u32, &[u32])> = vec![(0, row_a.as_slice()), (1, row_b.as_slice())];
    for (i, trap) in traps.iter().enumerate() {
        sets.push((2 + i as u32, trap.as_slice()));
    }
    relation_from_sets(0, &sets)
}

#[test]
fn plain_greedy_falls_for_trap_but_stays_within_log_bound() {
    let relation = greedy_trap_relation();
    let outcome = min_set_cover(&relation, CoverStrategy::MostUncovered);

    let order: Vec<WorkerId> = outcome.selected_workers().collect();
    assert_eq!(order, vec![WorkerId(5), WorkerId(4), WorkerId(3), WorkerId(2)]);
    assert_eq!(outcome.covered_count(), 60);

    let optimum = 2.0;
    let bound = (60f64).ln().ceil() * optimum;
    assert!(outcome.selected_count() as f64 <= bound);
}

#[test]
fn urgent_task_forces_first_selection() {
    let shape = InstanceShape {
        max_remaining: 3,
        ..InstanceShape::default()
    };
    let mut checked = 0;
    for seed in 0..40 {
        let current = 7;
        let relation = random_relation(seed, current, shape);
        let urgent: BTreeSet<TaskId> = relation
            .tasks()
            .filter(|t| t.deadline <= current + 1 && !t.workers().is_empty())
            .map(|t| t.id)
            .collect();
        if urgent.is_empty() {
            continue;
        }
        checked += 1;

        let outcome = min_set_cover(&relation, CoverStrategy::WaitTillDeadline);
        let first = &outcome.selections()[0];
        assert_eq!(first.weight, None, "seed {seed}: urgent worker not forced");
        assert!(first.tasks.iter().any(|t| urgent.contains(t)));
        assert!(urgent.is_subset(outcome.covered_tasks()));
    }
    assert!(checked > 0, "no instance had an urgent task");
}

#[test]
fn combined_score_trades_deadline_against_entropy() {
    // Worker 1 holds a distant task in a busy region, worker 2 a near task in
    // a quiet region.
    let relation = relation_with_entropy(0, &[(1, 4.0, &[(1, 5)]), (2, 0.5, &[(2, 2)])]);
    let weights = CombinedWeights::default();

    let deadline_only = CoverStrategy::CombinedDeadline {
        alpha: 1.0,
        deadline_horizon: weights.deadline_horizon,
        entropy_scale: weights.entropy_scale(&relation),
    };
    let outcome = min_set_cover(&relation, deadline_only);
    assert_eq!(outcome.selections()[0].worker, WorkerId(2));

    let entropy_only = CoverStrategy::CombinedDeadline {
        alpha: 0.0,
        deadline_horizon: weights.deadline_horizon,
        entropy_scale: weights.entropy_scale(&relation),
    };
    let outcome = min_set_cover(&relation, entropy_only);
    assert_eq!(outcome.selections()[0].worker, WorkerId(2));
    assert_eq!(outcome.selected_count(), 2);

    let relation = relation_with_entropy(0, &[(1, 0.2, &[(1, 5)]), (2, 4.0, &[(2, 2)])]);
    let entropy_only = CoverStrategy::CombinedDeadline {
        alpha: 0.0,
        deadline_horizon: weights.deadline_horizon,
        entropy_scale: weights.entropy_scale(&relation),
    };
    let outcome = min_set_cover(&relation, entropy_only);
    assert_eq!(outcome.selections()[0].worker, WorkerId(1));
}

#[test]
fn non_real_entropy_never_reaches_the_greedy_loop() {
    let infinite = test_worker(1).with_region_entropy(f64::INFINITY);
    let mut not_a_number = test_worker(1);
    not_a_number.region_entropy = Some(f64::NAN);

    for worker in [infinite, not_a_number] {
        let quiet = test_worker(2).with_region_entropy(0.1);
        let result = CoverageRelation::new(
            0,
            vec![worker, quiet],
            vec![test_task(1, 0, 5), test_task(2, 0, 2)],
        );
        assert!(matches!(
            result,
            Err(AssignmentError::InvalidEntropy {
                worker: WorkerId(1),
                ..
            })
        ));
    }
}
