//! Test helpers for building coverage relations and cost matrices.
//!
//! Shared by unit tests, integration tests and benches so fixtures stay
//! consistent.

use std::collections::BTreeMap;

use h3o::LatLng;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::coverage::CoverageRelation;
use crate::model::{Task, TaskId, TimeInstance, Worker, WorkerId};

/// Coordinates used for every fixture entity (USC campus, Los Angeles).
pub const TEST_LAT: f64 = 34.0205;
pub const TEST_LNG: f64 = -118.2856;

/// Default lifetime of fixture tasks in time instances.
pub const TEST_TASK_DURATION: u32 = 5;

/// Get the fixture position.
///
/// # Panics
///
/// Panics if the fixture coordinates are invalid (should never happen).
pub fn test_position() -> LatLng {
    LatLng::new(TEST_LAT, TEST_LNG).expect("fixture coordinates should be valid")
}

/// Position offset from the fixture position by the given degrees.
pub fn offset_position(dlat: f64, dlng: f64) -> LatLng {
    LatLng::new(TEST_LAT + dlat, TEST_LNG + dlng).expect("offset coordinates should be valid")
}

/// Worker with capacity 1 at the fixture position.
pub fn test_worker(id: u32) -> Worker {
    Worker::new(WorkerId(id), test_position(), 1)
}

/// Task at the fixture position.
pub fn test_task(id: u32, created_at: TimeInstance, duration: u32) -> Task {
    Task::new(TaskId(id), test_position(), created_at, duration)
}

/// Build a relation at `current` from `(worker, [task, ...])` sets.
///
/// Every task is created at `current` with [`TEST_TASK_DURATION`].
pub fn relation_from_sets(current: TimeInstance, sets: &[(u32, &[u32])]) -> CoverageRelation {
    let deadline = current + TEST_TASK_DURATION;
    let with_deadlines: Vec<(u32, Vec<(u32, TimeInstance)>)> = sets
        .iter()
        .map(|(w, tasks)| (*w, tasks.iter().map(|t| (*t, deadline)).collect()))
        .collect();
    build_relation(current, &with_deadlines, &BTreeMap::new())
}

/// Build a relation at `current` from `(worker, [(task, deadline), ...])` sets.
///
/// A task appearing under several workers must carry the same deadline.
pub fn relation_with_deadlines(
    current: TimeInstance,
    sets: &[(u32, &[(u32, TimeInstance)])],
) -> CoverageRelation {
    let owned: Vec<(u32, Vec<(u32, TimeInstance)>)> =
        sets.iter().map(|(w, tasks)| (*w, tasks.to_vec())).collect();
    build_relation(current, &owned, &BTreeMap::new())
}

/// Same as [`relation_with_deadlines`] with a region entropy per worker.
pub fn relation_with_entropy(
    current: TimeInstance,
    sets: &[(u32, f64, &[(u32, TimeInstance)])],
) -> CoverageRelation {
    let owned: Vec<(u32, Vec<(u32, TimeInstance)>)> = sets
        .iter()
        .map(|(w, _, tasks)| (*w, tasks.to_vec()))
        .collect();
    let entropies: BTreeMap<u32, f64> = sets.iter().map(|(w, e, _)| (*w, *e)).collect();
    build_relation(current, &owned, &entropies)
}

fn build_relation(
    current: TimeInstance,
    sets: &[(u32, Vec<(u32, TimeInstance)>)],
    entropies: &BTreeMap<u32, f64>,
) -> CoverageRelation {
    let mut deadlines: BTreeMap<u32, TimeInstance> = BTreeMap::new();
    for (_, tasks) in sets {
        for (task, deadline) in tasks {
            let previous = deadlines.insert(*task, *deadline);
            assert!(
                previous.map_or(true, |d| d == *deadline),
                "task {task} given two deadlines"
            );
        }
    }

    let workers: Vec<Worker> = sets
        .iter()
        .map(|(w, _)| match entropies.get(w) {
            Some(e) => test_worker(*w).with_region_entropy(*e),
            None => test_worker(*w),
        })
        .collect();
    let tasks: Vec<Task> = deadlines
        .iter()
        .map(|(t, deadline)| {
            assert!(*deadline > current, "fixture task {t} is already expired");
            test_task(*t, current, deadline - current)
        })
        .collect();
    let edges = sets.iter().flat_map(|(w, tasks)| {
        tasks
            .iter()
            .map(move |(t, _)| (WorkerId(*w), TaskId(*t)))
    });

    CoverageRelation::new(current, workers, tasks)
        .and_then(|r| r.with_edges(edges))
        .expect("fixture relation should be valid")
}

/// Upper-triangular instance: task `t` is eligible for workers `t..n`.
///
/// A perfect matching exists; it is the classic hard case for online ranking.
pub fn triangular_relation(n: u32) -> CoverageRelation {
    let sets: Vec<(u32, Vec<(u32, TimeInstance)>)> = (0..n)
        .map(|w| (w, (0..=w).map(|t| (t, TEST_TASK_DURATION)).collect()))
        .collect();
    build_relation(0, &sets, &BTreeMap::new())
}

/// Deterministic pseudo-random square matrix with entries in `0..modulus`.
pub fn lcg_matrix(dim: usize, seed: u64, modulus: u64) -> Vec<Vec<f64>> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..dim)
        .map(|_| {
            (0..dim)
                .map(|_| {
                    state = state
                        .wrapping_mul(6364136223846793005)
                        .wrapping_add(1442695040888963407);
                    ((state >> 33) % modulus) as f64
                })
                .collect()
        })
        .collect()
}

/// Shape of a randomly generated time instance.
#[derive(Debug, Clone, Copy)]
pub struct InstanceShape {
    pub workers: u32,
    pub tasks: u32,
    /// Probability that a given worker covers a given task.
    pub edge_probability: f64,
    /// Deadlines fall in `current + 1 ..= current + max_remaining`.
    pub max_remaining: u32,
}

impl Default for InstanceShape {
    fn default() -> Self {
        Self {
            workers: 12,
            tasks: 16,
            edge_probability: 0.2,
            max_remaining: 4,
        }
    }
}

/// Seeded random relation with scattered positions, deadlines and entropies.
///
/// Positions fall within about 5 km of the fixture position.
pub fn random_relation(
    seed: u64,
    current: TimeInstance,
    shape: InstanceShape,
) -> CoverageRelation {
    let mut rng = StdRng::seed_from_u64(seed);
    let scatter = |rng: &mut StdRng| {
        offset_position(rng.gen_range(-0.05..0.05), rng.gen_range(-0.05..0.05))
    };

    let workers: Vec<Worker> = (0..shape.workers)
        .map(|id| {
            let position = scatter(&mut rng);
            Worker::new(WorkerId(id), position, 1).with_region_entropy(rng.gen_range(0.0..3.0))
        })
        .collect();
    let tasks: Vec<Task> = (0..shape.tasks)
        .map(|id| {
            let duration = rng.gen_range(1..=shape.max_remaining.max(1));
            let position = scatter(&mut rng);
            Task::new(TaskId(id), position, current, duration)
        })
        .collect();

    let mut edges = Vec::new();
    for w in 0..shape.workers {
        for t in 0..shape.tasks {
            if rng.gen_bool(shape.edge_probability) {
                edges.push((WorkerId(w), TaskId(t)));
            }
        }
    }

    CoverageRelation::new(current, workers, tasks)
        .and_then(|r| r.with_edges(edges))
        .expect("random relation should be valid")
}
