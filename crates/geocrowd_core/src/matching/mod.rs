pub mod algorithm;
pub mod hungarian;
pub mod online;
pub mod types;

pub use algorithm::MatchingAlgorithm;
pub use hungarian::{CostPolicy, ExactMatcher};
pub use online::OnlineMatcher;
pub use types::{Assignment, MatchResult, MatrixAssignment};
