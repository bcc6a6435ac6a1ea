//! Assignment engine for spatial crowdsourcing.
//!
//! Workers are assigned to spatial tasks once per time instance. The caller
//! decides geometric eligibility and hands over a [`CoverageRelation`]; the
//! engine then runs one of:
//!
//! - **Exact matching**: Hungarian algorithm over a square cost matrix
//!   ([`matching::ExactMatcher`]).
//! - **Greedy set cover**: four selection strategies sharing one loop
//!   ([`setcover::min_set_cover`]).
//! - **Online matching**: randomized ranking over a task stream
//!   ([`matching::OnlineMatcher`]).
//!
//! [`runner::run_instance`] picks the algorithm from an [`AssignmentConfig`]
//! and reports per-instance metrics.

pub mod config;
pub mod cost;
pub mod coverage;
pub mod error;
pub mod matching;
pub mod model;
pub mod runner;
pub mod setcover;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use config::{AlgorithmKind, AssignmentConfig, CombinedWeights, EntropyNormalization};
pub use cost::{CostMatrix, CoverageCostMatrix};
pub use coverage::{CoverageRelation, TaskCoverage, WorkerCoverage};
pub use error::{AssignmentError, Result};
pub use model::{Task, TaskId, TimeInstance, Worker, WorkerId};
pub use runner::{
    run_instance, run_instances_parallel, InstanceOutcome, InstanceResult, InstanceSummary,
    RunTotals,
};
