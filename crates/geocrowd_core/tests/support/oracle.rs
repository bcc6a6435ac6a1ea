#![allow(dead_code)]

use geocrowd_core::CoverageRelation;
use pathfinding::kuhn_munkres::{kuhn_munkres, kuhn_munkres_min};
use pathfinding::matrix::Matrix;

/// Minimum total cost of an integer-valued square matrix, computed by
/// pathfinding's Kuhn-Munkres implementation.
pub fn min_cost(rows: &[Vec<f64>]) -> i64 {
    if rows.is_empty() {
        return 0;
    }
    let weights = Matrix::from_rows(
        rows.iter()
            .map(|row| row.iter().map(|c| c.round() as i64).collect::<Vec<_>>()),
    )
    .expect("oracle matrix should be rectangular");
    kuhn_munkres_min(&weights).0
}

/// Size of a maximum matching in `relation`.
pub fn max_matching_size(relation: &CoverageRelation) -> usize {
    let workers = relation.workers();
    let tasks: Vec<_> = relation.tasks().collect();
    let dim = workers.len().max(tasks.len());
    if dim == 0 {
        return 0;
    }
    let rows = (0..dim).map(|w| {
        (0..dim)
            .map(|t| match (workers.get(w), tasks.get(t)) {
                (Some(worker), Some(task)) if worker.covers(task.id) => 1_i64,
                _ => 0,
            })
            .collect::<Vec<_>>()
    });
    let weights = Matrix::from_rows(rows).expect("oracle matrix should be square");
    kuhn_munkres(&weights).0 as usize
}
