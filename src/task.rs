use std::collections::HashSet;

use crate::resource::Resource;

pub type TaskId = u64;
pub type VehicleId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl TaskState {
    pub fn all() -> [TaskState; 4] {
        [
            TaskState::Pending,
            TaskState::InProgress,
            TaskState::Completed,
            TaskState::Failed,
        ]
    }
}

/// A unit of compute work owned by a vehicle.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: TaskId,
    pub owner: VehicleId,
    pub resource: Resource,
    pub remaining_time: i64,
    pub initial_remaining_time: i64,
    pub cost: i64,
    pub deadline: Option<i64>,
    pub state: TaskState,
    /// Cached at assignment time; `None` until the task is first hosted.
    pub distance_to_vehicle: Option<f64>,
}

impl Task {
    pub fn new(
        id: TaskId,
        owner: VehicleId,
        resource: Resource,
        remaining_time: i64,
        cost: i64,
        deadline: Option<i64>,
    ) -> Self {
        Self {
            id,
            owner,
            resource,
            remaining_time,
            initial_remaining_time: remaining_time,
            cost: cost.max(1),
            deadline,
            state: TaskState::Pending,
            distance_to_vehicle: None,
        }
    }

    /// Bandwidth consumed on a link when this task is migrated.
    pub fn bandwidth_charge(&self, k_bandwidth_charge: f64) -> i64 {
        (k_bandwidth_charge * self.initial_remaining_time as f64).floor() as i64
    }

    /// Decrement `remaining_time` by `dt` seconds, transitioning the task to
    /// `Completed` once it reaches zero or below, `InProgress` otherwise.
    /// `progress(0)` is how a freshly-accepted task moves Pending -> InProgress.
    pub fn progress(&mut self, dt: i64) -> TaskState {
        self.remaining_time -= dt;
        self.state = if self.remaining_time <= 0 {
            TaskState::Completed
        } else {
            TaskState::InProgress
        };
        self.state
    }
}

/// A process-wide (here: simulation-wide) ledger partitioning every task id
/// into exactly one of the four state buckets.
#[derive(Debug, Default)]
pub struct TaskLedger {
    buckets: [HashSet<TaskId>; 4],
}

impl TaskLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn index(state: TaskState) -> usize {
        match state {
            TaskState::Pending => 0,
            TaskState::InProgress => 1,
            TaskState::Completed => 2,
            TaskState::Failed => 3,
        }
    }

    pub fn enroll(&mut self, id: TaskId, state: TaskState) {
        self.buckets[Self::index(state)].insert(id);
    }

    /// Move `id` from `old` to `new`. No-op (but still atomic) if `old == new`.
    pub fn move_bucket(&mut self, id: TaskId, old: TaskState, new: TaskState) {
        if old == new {
            return;
        }
        self.buckets[Self::index(old)].remove(&id);
        self.buckets[Self::index(new)].insert(id);
    }

    pub fn count(&self, state: TaskState) -> usize {
        self.buckets[Self::index(state)].len()
    }

    pub fn total(&self) -> usize {
        self.buckets.iter().map(|b| b.len()).sum()
    }
}
