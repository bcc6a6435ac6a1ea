//! Worker-task coverage for one time instance.
//!
//! The relation is the single input shared by every assignment algorithm. It
//! keeps one record per worker (its coverage set with deadlines) and one record
//! per task (its eligible workers), so both directions stay in sync by
//! construction. Eligibility itself is decided by the caller's spatial layer;
//! nothing here looks at geometry beyond carrying positions through for cost
//! construction.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use h3o::LatLng;
use tracing::{debug, warn};

use crate::error::{AssignmentError, Result};
use crate::model::{Task, TaskId, TimeInstance, Worker, WorkerId};

/// Coverage record of one worker.
#[derive(Debug, Clone)]
pub struct WorkerCoverage {
    pub id: WorkerId,
    pub position: LatLng,
    pub capacity: u32,
    /// Region entropy, zero when the worker carries none.
    pub region_entropy: f64,
    /// Covered tasks and their deadlines.
    tasks: BTreeMap<TaskId, TimeInstance>,
}

impl WorkerCoverage {
    fn from_worker(worker: Worker) -> Self {
        Self {
            id: worker.id,
            position: worker.position,
            capacity: worker.capacity,
            region_entropy: worker.region_entropy.unwrap_or(0.0),
            tasks: BTreeMap::new(),
        }
    }

    /// Covered tasks keyed by id, valued by deadline.
    pub fn tasks(&self) -> &BTreeMap<TaskId, TimeInstance> {
        &self.tasks
    }

    pub fn covers(&self, task: TaskId) -> bool {
        self.tasks.contains_key(&task)
    }

    pub fn deadline_of(&self, task: TaskId) -> Option<TimeInstance> {
        self.tasks.get(&task).copied()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Reverse-index record of one live task.
#[derive(Debug, Clone)]
pub struct TaskCoverage {
    pub id: TaskId,
    pub position: LatLng,
    pub deadline: TimeInstance,
    pub required_workers: u32,
    /// Eligible workers in the order their edges were added.
    workers: Vec<WorkerId>,
}

impl TaskCoverage {
    fn from_task(task: &Task) -> Self {
        Self {
            id: task.id,
            position: task.position,
            deadline: task.deadline(),
            required_workers: task.required_workers.max(1),
            workers: Vec::new(),
        }
    }

    pub fn workers(&self) -> &[WorkerId] {
        &self.workers
    }
}

/// Bipartite eligibility between workers and live tasks at one time instance.
#[derive(Debug, Clone)]
pub struct CoverageRelation {
    current: TimeInstance,
    workers: Vec<WorkerCoverage>,
    worker_index: HashMap<WorkerId, usize>,
    tasks: BTreeMap<TaskId, TaskCoverage>,
    expired: BTreeSet<TaskId>,
}

impl CoverageRelation {
    /// Register the instance's workers and tasks. Expired tasks are dropped
    /// here and any later edge to them is ignored.
    pub fn new(
        current: TimeInstance,
        workers: impl IntoIterator<Item = Worker>,
        tasks: impl IntoIterator<Item = Task>,
    ) -> Result<Self> {
        let mut relation = Self {
            current,
            workers: Vec::new(),
            worker_index: HashMap::new(),
            tasks: BTreeMap::new(),
            expired: BTreeSet::new(),
        };

        for worker in workers {
            if relation.worker_index.contains_key(&worker.id) {
                return Err(AssignmentError::DuplicateId(worker.id.to_string()));
            }
            if let Some(value) = worker.region_entropy {
                if !value.is_finite() || value < 0.0 {
                    return Err(AssignmentError::InvalidEntropy {
                        worker: worker.id,
                        value,
                    });
                }
            }
            relation
                .worker_index
                .insert(worker.id, relation.workers.len());
            relation.workers.push(WorkerCoverage::from_worker(worker));
        }

        for task in tasks {
            if relation.tasks.contains_key(&task.id) || relation.expired.contains(&task.id) {
                return Err(AssignmentError::DuplicateId(task.id.to_string()));
            }
            if task.is_expired(current) {
                relation.expired.insert(task.id);
                continue;
            }
            relation.tasks.insert(task.id, TaskCoverage::from_task(&task));
        }

        if !relation.expired.is_empty() {
            debug!(
                current,
                expired = relation.expired.len(),
                live = relation.tasks.len(),
                "pruned expired tasks"
            );
        }
        Ok(relation)
    }

    /// Add all edges, failing on the first unknown id.
    pub fn with_edges(
        mut self,
        edges: impl IntoIterator<Item = (WorkerId, TaskId)>,
    ) -> Result<Self> {
        for (worker, task) in edges {
            self.add_edge(worker, task)?;
        }
        Ok(self)
    }

    /// Record that `worker` can serve `task`.
    ///
    /// Returns `Ok(false)` when the edge is dropped: the task expired, the
    /// worker has no capacity, or the edge already exists.
    pub fn add_edge(&mut self, worker: WorkerId, task: TaskId) -> Result<bool> {
        let idx = *self
            .worker_index
            .get(&worker)
            .ok_or(AssignmentError::UnknownWorker(worker))?;
        if self.expired.contains(&task) {
            return Ok(false);
        }
        let task_entry = self
            .tasks
            .get_mut(&task)
            .ok_or(AssignmentError::UnknownTask(task))?;

        let record = &mut self.workers[idx];
        if record.capacity == 0 {
            warn!(%worker, %task, "ignoring edge for worker without capacity");
            return Ok(false);
        }
        if record.tasks.contains_key(&task) {
            return Ok(false);
        }
        record.tasks.insert(task, task_entry.deadline);
        task_entry.workers.push(worker);
        Ok(true)
    }

    pub fn current(&self) -> TimeInstance {
        self.current
    }

    /// Worker records in registration order.
    pub fn workers(&self) -> &[WorkerCoverage] {
        &self.workers
    }

    pub fn worker(&self, id: WorkerId) -> Option<&WorkerCoverage> {
        self.worker_index.get(&id).map(|&idx| &self.workers[idx])
    }

    /// Live tasks in ascending id order.
    pub fn tasks(&self) -> impl Iterator<Item = &TaskCoverage> {
        self.tasks.values()
    }

    pub fn task(&self, id: TaskId) -> Option<&TaskCoverage> {
        self.tasks.get(&id)
    }

    /// Workers eligible for `task`; empty for unknown or uncovered tasks.
    pub fn eligible_workers(&self, task: TaskId) -> &[WorkerId] {
        self.tasks.get(&task).map_or(&[], |t| t.workers())
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn edge_count(&self) -> usize {
        self.workers.iter().map(WorkerCoverage::len).sum()
    }

    /// Tasks dropped at registration because they had expired.
    pub fn expired_tasks(&self) -> &BTreeSet<TaskId> {
        &self.expired
    }

    /// Workers covering at least one task.
    pub fn covering_workers(&self) -> impl Iterator<Item = &WorkerCoverage> {
        self.workers.iter().filter(|w| !w.is_empty())
    }

    /// Largest region entropy among covering workers, zero if none.
    pub fn max_region_entropy(&self) -> f64 {
        self.covering_workers()
            .map(|w| w.region_entropy)
            .fold(0.0, f64::max)
    }

    /// Live tasks at least one worker covers.
    pub fn coverable_task_count(&self) -> usize {
        self.tasks.values().filter(|t| !t.workers.is_empty()).count()
    }
}
