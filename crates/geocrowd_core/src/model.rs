//! Workers, tasks and the time axis they live on.
//!
//! All entities are rebuilt for every time instance; nothing here outlives one
//! round of assignment.

use std::fmt;

use h3o::LatLng;
use serde::{Deserialize, Serialize};

/// Discrete time instance index.
pub type TimeInstance = u32;

/// Mean Earth radius used for great-circle distances.
const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorkerId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(pub u32);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// A mobile worker available during one time instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Worker {
    pub id: WorkerId,
    pub position: LatLng,
    /// Maximum number of tasks this worker may perform in the instance. Zero
    /// means the worker is present but cannot be assigned.
    pub capacity: u32,
    /// Quality signal of the worker's region. Must be a finite, non-negative
    /// value; checked when the worker joins a relation.
    pub region_entropy: Option<f64>,
}

impl Worker {
    pub fn new(id: WorkerId, position: LatLng, capacity: u32) -> Self {
        Self {
            id,
            position,
            capacity,
            region_entropy: None,
        }
    }

    pub fn with_region_entropy(mut self, entropy: f64) -> Self {
        self.region_entropy = Some(entropy);
        self
    }
}

/// A spatial task with a fixed lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub position: LatLng,
    /// Time instance in which the task was created.
    pub created_at: TimeInstance,
    /// Number of time instances the task stays open.
    pub duration: u32,
    /// Workers that must be credited with the task before it counts as covered.
    pub required_workers: u32,
}

impl Task {
    pub fn new(id: TaskId, position: LatLng, created_at: TimeInstance, duration: u32) -> Self {
        Self {
            id,
            position,
            created_at,
            duration,
            required_workers: 1,
        }
    }

    pub fn with_required_workers(mut self, k: u32) -> Self {
        self.required_workers = k.max(1);
        self
    }

    /// First time instance at which the task is no longer served.
    pub fn deadline(&self) -> TimeInstance {
        self.created_at.saturating_add(self.duration)
    }

    /// A task is expired once `now - created_at >= duration`.
    ///
    /// Tasks from the future (`now < created_at`) are not expired.
    pub fn is_expired(&self, now: TimeInstance) -> bool {
        now.checked_sub(self.created_at)
            .is_some_and(|age| age >= self.duration)
    }
}

/// Haversine distance between two positions in kilometers.
pub fn distance_km(a: LatLng, b: LatLng) -> f64 {
    let (lat1, lon1) = (a.lat().to_radians(), a.lng().to_radians());
    let (lat2, lon2) = (b.lat().to_radians(), b.lng().to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlon = (dlon * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}
