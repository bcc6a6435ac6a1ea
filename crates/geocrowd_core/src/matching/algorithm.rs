use crate::coverage::CoverageRelation;
use crate::error::Result;

use super::types::Assignment;

/// Trait for algorithms that pair workers with tasks one-to-one.
pub trait MatchingAlgorithm {
    /// Match the relation's workers to its live tasks.
    ///
    /// Every returned pair is an edge of `relation`, and the result is a
    /// partial injection. An empty relation yields an empty assignment.
    fn match_relation(&mut self, relation: &CoverageRelation) -> Result<Assignment>;
}
