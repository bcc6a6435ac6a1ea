//! Errors surfaced to callers of the assignment engine.

use thiserror::Error;

use crate::model::{TaskId, WorkerId};

/// Malformed input rejected by the assignment engine.
///
/// Empty instances are not errors: every algorithm returns an empty result for
/// them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssignmentError {
    /// Cost matrix row count and row length disagree.
    #[error("cost matrix is not square: {rows} rows but row {row} has {len} columns")]
    NonSquareMatrix { rows: usize, row: usize, len: usize },

    /// Rows of a matrix handed in for padding have different lengths.
    #[error("cost matrix is ragged: row {row} has {len} columns, expected {expected}")]
    RaggedMatrix {
        row: usize,
        len: usize,
        expected: usize,
    },

    /// A cost entry is NaN or infinite.
    #[error("cost matrix entry ({row}, {col}) is not finite: {value}")]
    NonFiniteCost { row: usize, col: usize, value: f64 },

    /// A coverage edge or online decision names a worker that was never registered.
    #[error("unknown worker: {0}")]
    UnknownWorker(WorkerId),

    /// A coverage edge names a task that was never registered.
    #[error("unknown task: {0}")]
    UnknownTask(TaskId),

    /// A worker's region entropy is negative, NaN or infinite.
    #[error("worker {worker} has invalid region entropy {value}")]
    InvalidEntropy { worker: WorkerId, value: f64 },

    /// The same id was registered twice.
    #[error("duplicate id: {0}")]
    DuplicateId(String),

    /// Configuration values outside their valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, AssignmentError>;
