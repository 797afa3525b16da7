use std::collections::HashMap;

use crate::fog::FogId;
use crate::task::{TaskId, VehicleId};

/// Task producer, distance cache, assignment driver.
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub vehicle_id: VehicleId,
    /// Every task generated for this vehicle across the run (owner == this
    /// vehicle), regardless of current state.
    pub tasks: Vec<TaskId>,
    pub not_finished_tasks: usize,
    /// Refreshed once per tick, before assignment, by `set_distance_to_fogs`.
    pub distance_to_fogs: HashMap<FogId, f64>,
}

impl Vehicle {
    pub fn new(vehicle_id: VehicleId) -> Self {
        Self {
            vehicle_id,
            tasks: Vec::new(),
            not_finished_tasks: 0,
            distance_to_fogs: HashMap::new(),
        }
    }

    pub fn nearest_fog(&self) -> Option<FogId> {
        self.distance_to_fogs
            .iter()
            .min_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(id, _)| *id)
    }

    /// A completed or failed task no longer counts against the vehicle.
    pub fn receive_task_result(&mut self) {
        self.not_finished_tasks = self.not_finished_tasks.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn nearest_fog_picks_the_minimum_distance() {
        let mut fogs: SlotMap<FogId, ()> = SlotMap::with_key();
        let a = fogs.insert(());
        let b = fogs.insert(());
        let mut v = Vehicle::new("v0".into());
        v.distance_to_fogs.insert(a, 10.0);
        v.distance_to_fogs.insert(b, 2.0);
        assert_eq!(v.nearest_fog(), Some(b));
    }

    #[test]
    fn receive_task_result_decrements_not_finished() {
        let mut v = Vehicle::new("v0".into());
        v.not_finished_tasks = 2;
        v.receive_task_result();
        assert_eq!(v.not_finished_tasks, 1);
    }
}
