use h3o::LatLng;
use serde::{Deserialize, Serialize};

use crate::coverage::CoverageRelation;
use crate::error::{AssignmentError, Result};
use crate::matching::CostPolicy;
use crate::model::{Task, TaskId, TimeInstance};

/// Default task lifetime in time instances.
pub const DEFAULT_TASK_DURATION: u32 = 5;

/// Default weight of urgency in the combined deadline/entropy score.
pub const DEFAULT_COMBINED_ALPHA: f64 = 0.5;

/// Algorithm run for a time instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmKind {
    /// Hungarian minimum-cost matching.
    #[default]
    Exact,
    /// Randomized ranking over the task stream.
    Online,
    /// Greedy set cover: most uncovered tasks first.
    GreedySetCover,
    /// Greedy set cover: smallest coverage set first.
    SmallestAssociatedSet,
    /// Greedy set cover: most urgent deadline first.
    WaitTillDeadline,
    /// Greedy set cover: linear mix of deadline urgency and region entropy.
    CombinedDeadline,
}

impl AlgorithmKind {
    pub const ALL: [AlgorithmKind; 6] = [
        AlgorithmKind::Exact,
        AlgorithmKind::Online,
        AlgorithmKind::GreedySetCover,
        AlgorithmKind::SmallestAssociatedSet,
        AlgorithmKind::WaitTillDeadline,
        AlgorithmKind::CombinedDeadline,
    ];

    /// Whether the algorithm produces a set cover rather than a matching.
    pub fn is_set_cover(self) -> bool {
        !matches!(self, AlgorithmKind::Exact | AlgorithmKind::Online)
    }
}

/// Where the entropy term of the combined score gets its denominator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntropyNormalization {
    /// A run-wide constant supplied by the caller.
    Fixed(f64),
    /// The largest region entropy among the instance's covering workers.
    InstanceMax,
}

/// Parameters of the combined deadline/entropy score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombinedWeights {
    /// Weight of the deadline term; the entropy term gets `1 - alpha`.
    pub alpha: f64,
    /// Normalization `T` of the average time-to-deadline.
    pub deadline_horizon: f64,
    pub entropy_normalization: EntropyNormalization,
}

impl Default for CombinedWeights {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_COMBINED_ALPHA,
            deadline_horizon: DEFAULT_TASK_DURATION as f64,
            entropy_normalization: EntropyNormalization::InstanceMax,
        }
    }
}

impl CombinedWeights {
    /// Denominator of the entropy term for `relation`. Zero disables the term.
    pub fn entropy_scale(&self, relation: &CoverageRelation) -> f64 {
        match self.entropy_normalization {
            EntropyNormalization::Fixed(value) => value,
            EntropyNormalization::InstanceMax => relation.max_region_entropy(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(AssignmentError::InvalidConfig(format!(
                "alpha must be within [0, 1], got {}",
                self.alpha
            )));
        }
        if !self.deadline_horizon.is_finite() || self.deadline_horizon <= 0.0 {
            return Err(AssignmentError::InvalidConfig(format!(
                "deadline horizon must be positive, got {}",
                self.deadline_horizon
            )));
        }
        if let EntropyNormalization::Fixed(value) = self.entropy_normalization {
            if !value.is_finite() || value <= 0.0 {
                return Err(AssignmentError::InvalidConfig(format!(
                    "fixed entropy normalization must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Per-run settings of the assignment engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignmentConfig {
    pub algorithm: AlgorithmKind,
    /// Lifetime of new tasks in time instances.
    pub task_duration: u32,
    pub combined: CombinedWeights,
    /// Pricing of eligible pairs for the exact matcher.
    pub cost_policy: CostPolicy,
    /// Seed for the online ranking (for reproducibility).
    pub seed: u64,
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self {
            algorithm: AlgorithmKind::default(),
            task_duration: DEFAULT_TASK_DURATION,
            combined: CombinedWeights::default(),
            cost_policy: CostPolicy::default(),
            seed: 0,
        }
    }
}

impl AssignmentConfig {
    pub fn with_algorithm(mut self, algorithm: AlgorithmKind) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the task lifetime. The combined score's deadline horizon follows it.
    pub fn with_task_duration(mut self, duration: u32) -> Self {
        self.task_duration = duration;
        self.combined.deadline_horizon = duration as f64;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.combined.alpha = alpha;
        self
    }

    pub fn with_deadline_horizon(mut self, horizon: f64) -> Self {
        self.combined.deadline_horizon = horizon;
        self
    }

    pub fn with_entropy_normalization(mut self, normalization: EntropyNormalization) -> Self {
        self.combined.entropy_normalization = normalization;
        self
    }

    pub fn with_cost_policy(mut self, policy: CostPolicy) -> Self {
        self.cost_policy = policy;
        self
    }

    /// Create a task arriving at `created_at` with the configured lifetime.
    pub fn new_task(&self, id: TaskId, position: LatLng, created_at: TimeInstance) -> Task {
        Task::new(id, position, created_at, self.task_duration)
    }

    pub fn validate(&self) -> Result<()> {
        if self.task_duration == 0 {
            return Err(AssignmentError::InvalidConfig(
                "task duration must be at least one time instance".to_string(),
            ));
        }
        self.combined.validate()
    }
}
