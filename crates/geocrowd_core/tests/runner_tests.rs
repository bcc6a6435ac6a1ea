use geocrowd_core::config::DEFAULT_TASK_DURATION;
use geocrowd_core::matching::CostPolicy;
use geocrowd_core::test_helpers::{random_relation, test_position, test_worker, InstanceShape};
use geocrowd_core::{
    run_instance, run_instances_parallel, AlgorithmKind, AssignmentConfig, AssignmentError,
    CoverageRelation, EntropyNormalization, InstanceResult, RunTotals, Task, TaskId, WorkerId,
};

#[test]
fn config_round_trips_through_json() {
    let config = AssignmentConfig::default()
        .with_algorithm(AlgorithmKind::CombinedDeadline)
        .with_task_duration(8)
        .with_alpha(0.3)
        .with_entropy_normalization(EntropyNormalization::Fixed(2.5))
        .with_cost_policy(CostPolicy::Unit)
        .with_seed(42);

    let json = serde_json::to_string(&config).unwrap();
    let parsed: AssignmentConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn partial_json_falls_back_to_defaults() {
    let parsed: AssignmentConfig = serde_json::from_str(
        r#"{ "algorithm": "wait_till_deadline", "combined": { "alpha": 0.25 } }"#,
    )
    .unwrap();

    assert_eq!(parsed.algorithm, AlgorithmKind::WaitTillDeadline);
    assert_eq!(parsed.task_duration, DEFAULT_TASK_DURATION);
    assert_eq!(parsed.combined.alpha, 0.25);
    assert_eq!(parsed.combined.deadline_horizon, DEFAULT_TASK_DURATION as f64);
    assert_eq!(parsed.combined.entropy_normalization, EntropyNormalization::InstanceMax);
    assert_eq!(parsed.seed, 0);
}

#[test]
fn every_algorithm_runs_on_random_instances() {
    for seed in 0..10 {
        let relation = random_relation(seed, 2, InstanceShape::default());
        for kind in AlgorithmKind::ALL {
            let config = AssignmentConfig::default().with_algorithm(kind).with_seed(seed);
            let outcome = run_instance(&relation, &config).unwrap();

            assert_eq!(outcome.summary.algorithm, kind);
            assert_eq!(outcome.summary.tasks, relation.task_count());
            assert_eq!(outcome.summary.workers, relation.worker_count());
            match (&outcome.result, kind.is_set_cover()) {
                (InstanceResult::Matching(assignment), false) => {
                    assert!(assignment.is_partial_injection());
                    assert_eq!(outcome.summary.assigned_tasks, assignment.len());
                }
                (InstanceResult::Cover(cover), true) => {
                    assert_eq!(outcome.summary.assigned_workers, cover.selected_count());
                    assert_eq!(outcome.summary.assigned_tasks, relation.coverable_task_count());
                }
                (result, _) => panic!("{kind:?} produced {result:?}"),
            }
        }
    }
}

#[test]
fn parallel_run_matches_sequential_run() {
    let relations: Vec<CoverageRelation> = (0..8)
        .map(|t| random_relation(100 + u64::from(t), t, InstanceShape::default()))
        .collect();

    for kind in [AlgorithmKind::Exact, AlgorithmKind::Online, AlgorithmKind::CombinedDeadline] {
        let config = AssignmentConfig::default().with_algorithm(kind).with_seed(9);
        let sequential: Vec<_> = relations
            .iter()
            .map(|r| run_instance(r, &config).unwrap())
            .collect();
        let parallel = run_instances_parallel(&relations, &config).unwrap();
        assert_eq!(parallel, sequential, "{kind:?}");
    }
}

#[test]
fn invalid_config_surfaces_as_error() {
    let relation = random_relation(1, 0, InstanceShape::default());
    let config = AssignmentConfig::default().with_task_duration(0);
    assert!(matches!(
        run_instances_parallel(&[relation], &config),
        Err(AssignmentError::InvalidConfig(_))
    ));
}

#[test]
fn totals_follow_a_run_of_instances() {
    // Tasks live for two instances: 1 and 2 arrive at 0, task 3 at 1. Worker 1
    // covers everything, worker 2 nothing.
    let config = AssignmentConfig::default()
        .with_algorithm(AlgorithmKind::GreedySetCover)
        .with_task_duration(2);
    let tasks: Vec<Task> = [(1, 0), (2, 0), (3, 1)]
        .into_iter()
        .map(|(id, created_at)| config.new_task(TaskId(id), test_position(), created_at))
        .collect();

    let relations: Vec<CoverageRelation> = (0..3)
        .map(|current| {
            let created: Vec<Task> = tasks
                .iter()
                .filter(|t| t.created_at <= current)
                .cloned()
                .collect();
            let ids: Vec<TaskId> = created.iter().map(|t| t.id).collect();
            CoverageRelation::new(current, (1..=2).map(test_worker), created)
                .and_then(|r| r.with_edges(ids.into_iter().map(|t| (WorkerId(1), t))))
                .unwrap()
        })
        .collect();

    assert_eq!(relations[0].task_count(), 2);
    assert_eq!(relations[1].task_count(), 3);
    assert_eq!(relations[2].task_count(), 1);
    assert!(relations[2].expired_tasks().contains(&TaskId(1)));

    let outcomes = run_instances_parallel(&relations, &config).unwrap();
    let totals: RunTotals = outcomes.iter().map(|o| &o.summary).collect();

    assert_eq!(totals.instances, 3);
    assert_eq!(totals.total_assigned_workers, 3);
    assert_eq!(totals.total_tasks_assigned, 6);
    assert_eq!(totals.average_tasks_per_worker(), Some(2.0));
    assert_eq!(totals.total_travel_distance_km, 0.0, "everyone shares one position");
}
