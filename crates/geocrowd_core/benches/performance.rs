//! Performance benchmarks for geocrowd_core using Criterion.rs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use geocrowd_core::config::{AlgorithmKind, CombinedWeights};
use geocrowd_core::cost::CostMatrix;
use geocrowd_core::matching::{ExactMatcher, MatchingAlgorithm, OnlineMatcher};
use geocrowd_core::setcover::{min_set_cover, CoverStrategy};
use geocrowd_core::test_helpers::{
    lcg_matrix, random_relation, triangular_relation, InstanceShape,
};
use geocrowd_core::CoverageRelation;

fn scattered_relation(workers: u32, tasks: u32, edge_probability: f64) -> CoverageRelation {
    let shape = InstanceShape {
        workers,
        tasks,
        edge_probability,
        max_remaining: 5,
    };
    random_relation(42, 0, shape)
}

fn bench_hungarian(c: &mut Criterion) {
    let mut group = c.benchmark_group("hungarian");
    for dim in [10, 50, 100, 200] {
        let matrix = CostMatrix::new(lcg_matrix(dim, 7, 1000)).expect("square matrix");
        group.bench_with_input(BenchmarkId::from_parameter(dim), &matrix, |b, matrix| {
            b.iter(|| black_box(ExactMatcher::solve(matrix)));
        });
    }
    group.finish();
}

fn bench_exact_relation(c: &mut Criterion) {
    let relation = scattered_relation(100, 120, 0.05);
    c.bench_function("exact_relation_100x120", |b| {
        b.iter(|| {
            let mut matcher = ExactMatcher::default();
            black_box(matcher.match_relation(&relation).expect("valid relation"))
        });
    });
}

fn bench_set_cover(c: &mut Criterion) {
    let relation = scattered_relation(200, 400, 0.02);
    let weights = CombinedWeights::default();

    let mut group = c.benchmark_group("set_cover");
    for kind in AlgorithmKind::ALL.into_iter().filter(|k| k.is_set_cover()) {
        let Some(strategy) = CoverStrategy::for_kind(kind, &weights, &relation) else {
            continue;
        };
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{kind:?}")),
            &strategy,
            |b, strategy| {
                b.iter(|| black_box(min_set_cover(&relation, *strategy)));
            },
        );
    }
    group.finish();
}

fn bench_online(c: &mut Criterion) {
    let scenarios = vec![
        ("triangular_200", triangular_relation(200)),
        ("scattered_500", scattered_relation(500, 500, 0.01)),
    ];

    let mut group = c.benchmark_group("online_ranking");
    for (name, relation) in &scenarios {
        group.bench_with_input(BenchmarkId::from_parameter(name), relation, |b, relation| {
            let mut seed = 0u64;
            b.iter(|| {
                seed += 1;
                let mut matcher =
                    OnlineMatcher::from_seed(relation.workers().iter().map(|w| w.id), seed);
                black_box(matcher.match_relation(relation).expect("valid relation"))
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_hungarian,
    bench_exact_relation,
    bench_set_cover,
    bench_online
);
criterion_main!(benches);
