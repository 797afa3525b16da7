use std::collections::HashMap;

use rand::Rng;
use slotmap::{new_key_type, SlotMap};

use crate::error::{Result, SimError};
use crate::link::FogLink;
use crate::range::StepRange;
use crate::resource::Resource;
use crate::task::{Task, TaskId};

new_key_type! {
    /// Arena index for a fog node. Links store this, never a `&FogNode`,
    /// avoiding the ownership cycle a direct fog-to-fog reference would need.
    pub struct FogId;
}

pub type Shape = Vec<(f64, f64)>;
pub type Colour = (u8, u8, u8, u8);

/// Capacity owner, task host, neighbour list, admission entry point.
#[derive(Debug, Clone)]
pub struct FogNode {
    pub fog_id: String,
    pub position: (f64, f64),
    pub shape: Shape,
    pub colour: Colour,
    pub capacity: Resource,
    pub used: Resource,
    pub usage: f64,
    pub assigned: Vec<TaskId>,
    pub links: Vec<FogLink>,
    /// `Σ √(dist_to_vehicle) · cost` over hosted tasks.
    pub task_distances: f64,
}

impl FogNode {
    pub fn new(fog_id: String, position: (f64, f64), shape: Shape, colour: Colour, capacity: Resource) -> Self {
        Self {
            fog_id,
            position,
            shape,
            colour,
            capacity,
            used: Resource::zero(),
            usage: 0.0,
            assigned: Vec::new(),
            links: Vec::new(),
            task_distances: 0.0,
        }
    }

    pub fn has_enough_resources(&self, demand: &Resource) -> bool {
        demand.fits_within(&self.used, &self.capacity)
    }

    fn recompute_usage(&mut self) {
        self.usage = self.used.max_component(&self.capacity);
    }

    /// Commit `resource` into `used`/`usage` and record the task as hosted.
    /// Does not touch the task's own state or the global ledger/distance
    /// accumulator — those are the caller's (`Simulation`'s) responsibility,
    /// since they are shared across fogs.
    pub fn commit_resource(&mut self, task_id: TaskId, resource: Resource) {
        self.used = self.used + resource;
        self.recompute_usage();
        self.assigned.push(task_id);
    }

    /// Exact undo of `commit_resource`. `is_last` allows an O(1) pop when the
    /// caller knows the task was the most recently committed one (the
    /// `assign ; revert` law of spec §8). `Err(SimError::CapacityViolation)`
    /// if `resource` exceeds `used` — an internal bug, per spec §7, not a
    /// condition a caller can recover from.
    pub fn revert_resource(&mut self, task_id: TaskId, resource: Resource, is_last: bool) -> Result<()> {
        self.used = self.used.checked_sub(&resource).ok_or_else(|| {
            SimError::CapacityViolation(format!(
                "fog {} used {} would go negative reverting task {task_id}'s {resource}",
                self.fog_id, self.used
            ))
        })?;
        self.recompute_usage();
        if is_last && self.assigned.last() == Some(&task_id) {
            self.assigned.pop();
        } else {
            self.assigned.retain(|id| *id != task_id);
        }
        Ok(())
    }

    /// Sum of `link.usage()` over this fog's outbound links.
    pub fn links_load(&self) -> f64 {
        self.links.iter().map(|l| l.usage()).sum()
    }

    /// Hosted tasks that cost strictly less than `incoming` and whose
    /// displacement would free enough room for `incoming`, ascending by cost.
    pub fn replaceable_tasks(
        &self,
        incoming_cost: i64,
        incoming_resource: Resource,
        tasks: &HashMap<TaskId, Task>,
    ) -> Vec<TaskId> {
        let mut candidates: Vec<(i64, TaskId)> = self
            .assigned
            .iter()
            .filter_map(|id| {
                let t = tasks.get(id)?;
                if t.cost >= incoming_cost {
                    return None;
                }
                let freed = self.used.checked_sub(&t.resource)?;
                if incoming_resource.fits_within(&freed, &self.capacity) {
                    Some((t.cost, *id))
                } else {
                    None
                }
            })
            .collect();
        candidates.sort_by_key(|(cost, _)| *cost);
        candidates.into_iter().map(|(_, id)| id).collect()
    }

    pub fn reset_link_charges(&mut self) {
        for link in &mut self.links {
            link.reset_charge();
        }
    }

    /// Subtract `resource` from `used` without touching `assigned` — used
    /// when the caller rebuilds the assigned list itself (task completion).
    /// `Err(SimError::CapacityViolation)` under the same condition as
    /// `revert_resource`.
    pub fn subtract_used(&mut self, resource: Resource) -> Result<()> {
        self.used = self.used.checked_sub(&resource).ok_or_else(|| {
            SimError::CapacityViolation(format!(
                "fog {} used {} would go negative subtracting {resource}",
                self.fog_id, self.used
            ))
        })?;
        self.recompute_usage();
        Ok(())
    }
}

/// Sample bandwidth over a stepped range and wire each fog to its nearest
/// `max_neighbours` peers, ascending by Euclidean distance. Must be called
/// once, after every fog has been inserted into the arena.
pub fn wire_neighbours(
    fogs: &mut SlotMap<FogId, FogNode>,
    max_neighbours: usize,
    bandwidth_range: StepRange,
    rng: &mut impl Rng,
) {
    let positions: Vec<(FogId, (f64, f64))> = fogs.iter().map(|(id, f)| (id, f.position)).collect();

    for (id, position) in &positions {
        let mut neighbours: Vec<(f64, FogId)> = positions
            .iter()
            .filter(|(other_id, _)| other_id != id)
            .map(|(other_id, other_pos)| (euclidean(*position, *other_pos), *other_id))
            .collect();
        neighbours.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        neighbours.truncate(max_neighbours);

        let links: Vec<FogLink> = neighbours
            .into_iter()
            .map(|(distance, target)| {
                let bandwidth = bandwidth_range.sample(rng);
                FogLink::new(target, distance.floor() as i64, bandwidth)
            })
            .collect();

        fogs[*id].links = links;
    }
}

pub fn euclidean(a: (f64, f64), b: (f64, f64)) -> f64 {
    squared_distance(a, b).sqrt()
}

/// Squared Euclidean distance. Used for nearest-fog comparisons (the
/// ordering is identical to the unsquared distance, without the `sqrt` call)
/// and as the cached `distance_to_vehicle` value — `task_distances`
/// contributions take its square root at the point of accumulation, per
/// spec §4.5/§4.9.
pub fn squared_distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)
}

/// Linear interpolation between a "low usage" and "high usage" colour,
/// matching the original `FogNode.color_usage` recolouring.
pub fn usage_colour(usage: f64) -> Colour {
    const LOW: (f64, f64, f64) = (0.0, 255.0, 0.0);
    const HIGH: (f64, f64, f64) = (255.0, 0.0, 0.0);
    let u = usage.clamp(0.0, 1.0);
    (
        (LOW.0 + (HIGH.0 - LOW.0) * u) as u8,
        (LOW.1 + (HIGH.1 - LOW.1) * u) as u8,
        (LOW.2 + (HIGH.2 - LOW.2) * u) as u8,
        255,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fog(capacity: Resource) -> FogNode {
        FogNode::new("fog0".into(), (0.0, 0.0), vec![], (255, 0, 0, 255), capacity)
    }

    #[test]
    fn commit_then_revert_restores_state() {
        let mut f = fog(Resource::new(10, 10, 10));
        let before = (f.used, f.usage, f.assigned.clone());
        f.commit_resource(1, Resource::new(2, 2, 2));
        assert_ne!(f.used, before.0);
        f.revert_resource(1, Resource::new(2, 2, 2), true).unwrap();
        assert_eq!((f.used, f.usage, f.assigned.clone()), before);
    }

    #[test]
    fn revert_resource_reports_capacity_violation_instead_of_panicking() {
        let mut f = fog(Resource::new(10, 10, 10));
        assert!(matches!(
            f.revert_resource(1, Resource::new(1, 1, 1), true),
            Err(SimError::CapacityViolation(_))
        ));
    }

    #[test]
    fn replaceable_tasks_sorted_ascending_by_cost() {
        let mut f = fog(Resource::new(1, 1, 1));
        let mut tasks = HashMap::new();
        tasks.insert(
            1,
            Task::new(1, "v".into(), Resource::new(1, 1, 1), 5, 3, None),
        );
        f.commit_resource(1, Resource::new(1, 1, 1));

        let candidates = f.replaceable_tasks(5, Resource::new(1, 1, 1), &tasks);
        assert_eq!(candidates, vec![1]);

        // incoming with lower cost than the hosted task is never a candidate.
        let none = f.replaceable_tasks(2, Resource::new(1, 1, 1), &tasks);
        assert!(none.is_empty());
    }

    #[test]
    fn zero_max_neighbours_leaves_every_fog_without_links() {
        let mut fogs: SlotMap<FogId, FogNode> = SlotMap::with_key();
        fogs.insert(FogNode::new("a".into(), (0.0, 0.0), vec![], (0, 0, 0, 0), Resource::zero()));
        fogs.insert(FogNode::new("b".into(), (1.0, 0.0), vec![], (0, 0, 0, 0), Resource::zero()));
        let range = StepRange::new(100, 1000, 10).unwrap();
        use rand::SeedableRng;
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        wire_neighbours(&mut fogs, 0, range, &mut rng);
        assert!(fogs.values().all(|f| f.links.is_empty()));
    }

    #[test]
    fn wire_neighbours_respects_max_and_order() {
        let mut fogs: SlotMap<FogId, FogNode> = SlotMap::with_key();
        let a = fogs.insert(FogNode::new("a".into(), (0.0, 0.0), vec![], (0, 0, 0, 0), Resource::zero()));
        let b = fogs.insert(FogNode::new("b".into(), (1.0, 0.0), vec![], (0, 0, 0, 0), Resource::zero()));
        let c = fogs.insert(FogNode::new("c".into(), (5.0, 0.0), vec![], (0, 0, 0, 0), Resource::zero()));
        let range = StepRange::new(100, 1000, 10).unwrap();
        use rand::SeedableRng;
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        wire_neighbours(&mut fogs, 1, range, &mut rng);
        assert_eq!(fogs[a].links.len(), 1);
        assert_eq!(fogs[a].links[0].target, b);
        assert_eq!(fogs[c].links[0].target, b);
    }
}
