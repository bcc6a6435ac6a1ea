//! Square cost matrices for the exact matcher.

use crate::coverage::{CoverageRelation, TaskCoverage, WorkerCoverage};
use crate::error::{AssignmentError, Result};
use crate::model::{distance_km, TaskId, WorkerId};

/// Cost used for padded rows and columns.
pub const NEUTRAL_PADDING: f64 = 0.0;

/// Square matrix of finite costs, `cost[worker][job]`, smaller is better.
///
/// Rows beyond `workers` and columns beyond `jobs` are padding.
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    dim: usize,
    workers: usize,
    jobs: usize,
    data: Vec<f64>,
}

impl CostMatrix {
    /// Build from square rows. Non-square or non-finite input is rejected.
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self> {
        let dim = rows.len();
        for (row, values) in rows.iter().enumerate() {
            if values.len() != dim {
                return Err(AssignmentError::NonSquareMatrix {
                    rows: dim,
                    row,
                    len: values.len(),
                });
            }
        }
        Self::from_rows(rows, dim, dim, dim, NEUTRAL_PADDING)
    }

    /// Build from rectangular rows, padding to square with `padding`.
    pub fn padded(rows: Vec<Vec<f64>>, padding: f64) -> Result<Self> {
        let workers = rows.len();
        let jobs = rows.first().map_or(0, Vec::len);
        for (row, values) in rows.iter().enumerate() {
            if values.len() != jobs {
                return Err(AssignmentError::RaggedMatrix {
                    row,
                    len: values.len(),
                    expected: jobs,
                });
            }
        }
        if !padding.is_finite() {
            return Err(AssignmentError::NonFiniteCost {
                row: workers,
                col: jobs,
                value: padding,
            });
        }
        Self::from_rows(rows, workers.max(jobs), workers, jobs, padding)
    }

    fn from_rows(
        rows: Vec<Vec<f64>>,
        dim: usize,
        workers: usize,
        jobs: usize,
        padding: f64,
    ) -> Result<Self> {
        let mut data = vec![padding; dim * dim];
        for (row, values) in rows.into_iter().enumerate() {
            for (col, value) in values.into_iter().enumerate() {
                if !value.is_finite() {
                    return Err(AssignmentError::NonFiniteCost { row, col, value });
                }
                data[row * dim + col] = value;
            }
        }
        Ok(Self {
            dim,
            workers,
            jobs,
            data,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Rows holding real workers.
    pub fn worker_count(&self) -> usize {
        self.workers
    }

    /// Columns holding real jobs.
    pub fn job_count(&self) -> usize {
        self.jobs
    }

    pub fn is_empty(&self) -> bool {
        self.dim == 0
    }

    pub fn at(&self, worker: usize, job: usize) -> f64 {
        self.data[worker * self.dim + job]
    }

    pub fn row(&self, worker: usize) -> &[f64] {
        &self.data[worker * self.dim..(worker + 1) * self.dim]
    }
}

/// Cost matrix derived from a coverage relation, with the ids of its rows and
/// columns.
///
/// Eligible pairs cost the travel distance in km. Ineligible pairs cost more
/// than any complete eligible assignment, so a minimum-cost solution first
/// maximizes the number of eligible pairs and only then the distance.
#[derive(Debug, Clone)]
pub struct CoverageCostMatrix {
    pub matrix: CostMatrix,
    pub workers: Vec<WorkerId>,
    pub tasks: Vec<TaskId>,
    ineligible_cost: f64,
}

impl CoverageCostMatrix {
    /// Travel-distance costs for the relation's covering workers and live tasks.
    pub fn travel_distance(relation: &CoverageRelation) -> Result<Self> {
        Self::build(relation, |worker, task| {
            distance_km(worker.position, task.position)
        })
    }

    /// Unit costs: every eligible pair is equally good, so the solution is a
    /// maximum-cardinality matching.
    pub fn unit(relation: &CoverageRelation) -> Result<Self> {
        Self::build(relation, |_, _| 0.0)
    }

    /// Costs from an arbitrary non-negative function of an eligible pair.
    pub fn build(
        relation: &CoverageRelation,
        cost: impl Fn(&WorkerCoverage, &TaskCoverage) -> f64,
    ) -> Result<Self> {
        let workers: Vec<_> = relation.covering_workers().collect();
        let tasks: Vec<_> = relation
            .tasks()
            .filter(|t| !t.workers().is_empty())
            .collect();

        let mut eligible: Vec<Vec<Option<f64>>> = Vec::with_capacity(workers.len());
        let mut max_cost: f64 = 0.0;
        for worker in &workers {
            let mut row = Vec::with_capacity(tasks.len());
            for task in &tasks {
                if worker.covers(task.id) {
                    let value = cost(worker, task);
                    if !value.is_finite() {
                        return Err(AssignmentError::NonFiniteCost {
                            row: eligible.len(),
                            col: row.len(),
                            value,
                        });
                    }
                    max_cost = max_cost.max(value.abs());
                    row.push(Some(value));
                } else {
                    row.push(None);
                }
            }
            eligible.push(row);
        }

        let pairs = workers.len().min(tasks.len()) as f64;
        let ineligible_cost = 1.0 + 2.0 * max_cost * (pairs + 1.0);
        let rows = eligible
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|c| c.unwrap_or(ineligible_cost))
                    .collect()
            })
            .collect();

        Ok(Self {
            matrix: CostMatrix::padded(rows, NEUTRAL_PADDING)?,
            workers: workers.iter().map(|w| w.id).collect(),
            tasks: tasks.iter().map(|t| t.id).collect(),
            ineligible_cost,
        })
    }

    /// Whether `(row, col)` is a real, eligible pair.
    pub fn is_eligible(&self, row: usize, col: usize) -> bool {
        row < self.workers.len()
            && col < self.tasks.len()
            && self.matrix.at(row, col) < self.ineligible_cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::relation_from_sets;

    #[test]
    fn rejects_non_square_rows() {
        let err = CostMatrix::new(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert_eq!(
            err,
            AssignmentError::NonSquareMatrix {
                rows: 2,
                row: 1,
                len: 1
            }
        );
    }

    #[test]
    fn rejects_non_finite_entries() {
        let err = CostMatrix::new(vec![vec![1.0, f64::NAN], vec![0.0, 0.0]]).unwrap_err();
        assert!(matches!(
            err,
            AssignmentError::NonFiniteCost { row: 0, col: 1, .. }
        ));
    }

    #[test]
    fn pads_wide_matrix_with_neutral_rows() {
        let matrix = CostMatrix::padded(vec![vec![1.0, 2.0, 3.0]], NEUTRAL_PADDING).unwrap();
        assert_eq!(matrix.dim(), 3);
        assert_eq!(matrix.worker_count(), 1);
        assert_eq!(matrix.job_count(), 3);
        assert_eq!(matrix.row(0), &[1.0, 2.0, 3.0]);
        assert_eq!(matrix.row(2), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn padding_rejects_ragged_rows() {
        let err = CostMatrix::padded(vec![vec![1.0, 2.0], vec![1.0]], 0.0).unwrap_err();
        assert!(matches!(err, AssignmentError::RaggedMatrix { row: 1, .. }));
    }

    #[test]
    fn coverage_matrix_marks_ineligible_pairs() {
        let relation = relation_from_sets(0, &[(1, &[10, 11]), (2, &[11]), (3, &[])]);
        let costs = CoverageCostMatrix::unit(&relation).unwrap();
        assert_eq!(costs.workers, vec![WorkerId(1), WorkerId(2)]);
        assert_eq!(costs.tasks, vec![TaskId(10), TaskId(11)]);
        assert!(costs.is_eligible(0, 0));
        assert!(costs.is_eligible(0, 1));
        assert!(!costs.is_eligible(1, 0));
        assert!(costs.is_eligible(1, 1));
    }
}
