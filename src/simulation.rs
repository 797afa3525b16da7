use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use slotmap::SlotMap;

use crate::config::Config;
use crate::error::Result;
use crate::fog::{squared_distance, usage_colour, FogId, FogNode};
use crate::mode::AssignMode;
use crate::oracle::MobilityOracle;
use crate::qos::{self, EvalParameters};
use crate::task::{Task, TaskId, TaskLedger, TaskState, VehicleId};
use crate::vehicle::Vehicle;

/// Everything recorded at the end of a tick: the scalar QoS plus the raw
/// counters/terms it was computed from (`get_eval_parameters` in the spec).
#[derive(Debug, Clone, Copy)]
pub struct TickReport {
    pub qos: f64,
    pub params: EvalParameters,
}

/// The owned simulation context: fog arena, vehicle map, task ledger, the
/// single seeded RNG, and configuration. Every operation the spec describes
/// as a class-level/static accessor is a method here instead (design note
/// §9), which is what makes running several simulations in the same process
/// (e.g. a parameter sweep) trivially safe — nothing is shared across
/// `Simulation` instances.
pub struct Simulation<O: MobilityOracle> {
    oracle: O,
    fogs: SlotMap<FogId, FogNode>,
    vehicles: HashMap<VehicleId, Vehicle>,
    tasks: HashMap<TaskId, Task>,
    ledger: TaskLedger,
    all_task_distances: f64,
    next_task_id: TaskId,
    rng: StdRng,
    config: Config,
    tick_count: u64,
}

impl<O: MobilityOracle> Simulation<O> {
    pub fn new(config: Config, mut oracle: O) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let ((min_x, min_y), (max_x, max_y)) = oracle.net_boundary();
        let offset_x = (max_x - min_x) / 2.0;
        let offset_y = (max_y - min_y) / 2.0;

        let mut fogs: SlotMap<FogId, FogNode> = SlotMap::with_key();
        for i in 0..config.topology.nb_fog_nodes {
            let x = rng.gen_range(-offset_x..=offset_x) / config.topology.random_divider as f64
                + config.topology.centre.0;
            let y = rng.gen_range(-offset_y..=offset_y) / config.topology.random_divider as f64
                + config.topology.centre.1;
            let capacity = crate::resource::Resource::new(
                config.fog_resources.cpu.sample(&mut rng),
                config.fog_resources.ram.sample(&mut rng),
                config.fog_resources.storage.sample(&mut rng),
            );
            let fog = FogNode::new(
                format!("fog{i}"),
                (x, y),
                config.topology.fog_shape.clone(),
                config.topology.fog_colour,
                capacity,
            );
            oracle.polygon_add(&fog.fog_id, &fog.shape, fog.colour);
            log::info!(
                "created {} at ({:.2}, {:.2}) with capacity {}",
                fog.fog_id,
                x,
                y,
                fog.capacity
            );
            fogs.insert(fog);
        }
        crate::fog::wire_neighbours(&mut fogs, config.topology.max_neighbours, config.link_bandwidth, &mut rng);

        Ok(Self {
            oracle,
            fogs,
            vehicles: HashMap::new(),
            tasks: HashMap::new(),
            ledger: TaskLedger::new(),
            all_task_distances: 0.0,
            next_task_id: 0,
            rng,
            config,
            tick_count: 0,
        })
    }

    pub fn fog_by_id(&self, fog_id: &str) -> Option<&FogNode> {
        self.fogs.values().find(|f| f.fog_id == fog_id)
    }

    pub fn vehicle_by_id(&self, vehicle_id: &str) -> Option<&Vehicle> {
        self.vehicles.get(vehicle_id)
    }

    pub fn task_by_id(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.get(&task_id)
    }

    pub fn fogs(&self) -> impl Iterator<Item = &FogNode> {
        self.fogs.values()
    }

    pub fn all_task_distances(&self) -> f64 {
        self.all_task_distances
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Runs one per-tick orchestration pass (spec §4.10): advances the
    /// oracle by one step, then reconciles vehicles, generates and assigns
    /// tasks, recolours fog nodes, and progresses every hosted task.
    pub fn tick(&mut self) -> Result<TickReport> {
        self.oracle.step();

        for fog in self.fogs.values_mut() {
            fog.reset_link_charges();
        }

        self.reconcile_vehicles();

        let vehicle_ids: Vec<VehicleId> = self.vehicles.keys().cloned().collect();
        for vid in &vehicle_ids {
            let not_finished = match self.vehicles.get(vid) {
                Some(v) => v.not_finished_tasks,
                None => continue,
            };
            if not_finished == 0 {
                self.generate_tasks(vid);
            }
            let has_pending = self.vehicles[vid]
                .tasks
                .iter()
                .any(|tid| self.tasks[tid].state == TaskState::Pending);
            if has_pending {
                match self.oracle.vehicle_position(vid) {
                    Ok(position) => {
                        self.set_distance_to_fogs(vid, position);
                        self.assign_tasks(vid)?;
                    }
                    Err(e) => {
                        log::warn!("oracle failure querying position of vehicle {vid}: {e}");
                    }
                }
            }
        }

        self.recolour_fogs();
        self.progress_tasks()?;

        self.tick_count += 1;
        let params = self.eval_parameters();
        let qos = self.qos_from_params(&params);
        log::debug!(
            "tick {} mode={} qos={:.3} allocated={} pending={}",
            self.tick_count,
            self.config.mode,
            qos,
            params.allocated_tasks,
            params.pending_tasks
        );
        Ok(TickReport { qos, params })
    }

    fn reconcile_vehicles(&mut self) {
        let oracle_ids = self.oracle.vehicle_ids();
        let known: Vec<VehicleId> = self.vehicles.keys().cloned().collect();
        for id in known {
            if !oracle_ids.contains(&id) {
                self.destroy_vehicle(&id);
            }
        }
        for id in oracle_ids {
            self.vehicles.entry(id.clone()).or_insert_with(|| Vehicle::new(id));
        }
    }

    /// Fails every still-PENDING task of a departing vehicle; IN_PROGRESS
    /// tasks are left exactly where they are hosted and keep progressing.
    fn destroy_vehicle(&mut self, vehicle_id: &VehicleId) {
        if let Some(vehicle) = self.vehicles.get(vehicle_id) {
            let pending: Vec<TaskId> = vehicle
                .tasks
                .iter()
                .filter(|tid| self.tasks[tid].state == TaskState::Pending)
                .copied()
                .collect();
            for tid in pending {
                self.tasks.get_mut(&tid).unwrap().state = TaskState::Failed;
                self.ledger.move_bucket(tid, TaskState::Pending, TaskState::Failed);
            }
            log::info!("vehicle {vehicle_id} departed");
        }
        self.vehicles.remove(vehicle_id);
    }

    fn generate_tasks(&mut self, vehicle_id: &VehicleId) {
        let nb = self.config.tasks.nb_tasks.sample(&mut self.rng);
        for _ in 0..nb {
            let resource = crate::resource::Resource::new(
                self.config.tasks.task_resource.cpu.sample(&mut self.rng),
                self.config.tasks.task_resource.ram.sample(&mut self.rng),
                self.config.tasks.task_resource.storage.sample(&mut self.rng),
            );
            let duration = self.config.tasks.duration.sample(&mut self.rng);
            let cost = self.config.tasks.cost.sample(&mut self.rng);
            let id = self.next_task_id;
            self.next_task_id += 1;
            let task = Task::new(id, vehicle_id.clone(), resource, duration, cost, None);
            self.ledger.enroll(id, TaskState::Pending);
            self.tasks.insert(id, task);
            let vehicle = self.vehicles.get_mut(vehicle_id).unwrap();
            vehicle.tasks.push(id);
            vehicle.not_finished_tasks += 1;
        }
    }

    fn set_distance_to_fogs(&mut self, vehicle_id: &VehicleId, position: (f64, f64)) {
        let distances: Vec<(FogId, f64)> = self
            .fogs
            .iter()
            .map(|(id, fog)| (id, squared_distance(position, fog.position)))
            .collect();
        let vehicle = self.vehicles.get_mut(vehicle_id).unwrap();
        vehicle.distance_to_fogs.clear();
        vehicle.distance_to_fogs.extend(distances);
    }

    fn assign_tasks(&mut self, vehicle_id: &VehicleId) -> Result<()> {
        let nearest = match self.vehicles[vehicle_id].nearest_fog() {
            Some(id) => id,
            None => return Ok(()),
        };
        let mode = self.config.mode;
        let pending: Vec<TaskId> = self.vehicles[vehicle_id]
            .tasks
            .iter()
            .filter(|tid| self.tasks[tid].state == TaskState::Pending)
            .copied()
            .collect();
        for tid in pending {
            if self.tasks[&tid].state != TaskState::Pending {
                continue;
            }
            self.ask_assign(nearest, tid, mode, true)?;
        }
        Ok(())
    }

    /// The placement decision procedure of spec §4.6.
    fn ask_assign(&mut self, fog_id: FogId, task_id: TaskId, mode: AssignMode, from_vehicle: bool) -> Result<bool> {
        let demand = self.tasks[&task_id].resource;
        if self.fogs[fog_id].has_enough_resources(&demand) {
            if mode.qos {
                let q0 = self.global_qos();
                let old_state = self.commit_assign(fog_id, task_id);
                let q1 = self.global_qos();
                if q1 >= q0 {
                    return Ok(true);
                }
                self.commit_revert(fog_id, task_id, Some(old_state), true, None)?;
                // fall through to forwarding below.
            } else {
                self.commit_assign(fog_id, task_id);
                return Ok(true);
            }
        }

        if !from_vehicle {
            return Ok(false);
        }

        let k_bw = self.config.tasks.k_bandwidth_charge;

        if mode.cost {
            let incoming_cost = self.tasks[&task_id].cost;
            let incoming_resource = self.tasks[&task_id].resource;
            let candidates = self.fogs[fog_id].replaceable_tasks(incoming_cost, incoming_resource, &self.tasks);
            for displaced_id in candidates {
                let displaced_charge = self.tasks[&displaced_id].bandwidth_charge(k_bw);
                // Snapshot the A-side distance contribution before the recursive
                // ask_assign below can overwrite `distance_to_vehicle` with the
                // target fog's distance (commit_assign on the neighbour mutates
                // the same field) — commit_revert must undo A's own contribution,
                // not whatever the task's distance happens to be afterwards.
                let displaced_distance = self.tasks[&displaced_id].distance_to_vehicle;
                let links = self.fogs[fog_id].links.clone();
                for (idx, link) in links.iter().enumerate() {
                    if link.can_handle(displaced_charge) && self.ask_assign(link.target, displaced_id, mode, false)? {
                        self.commit_revert(fog_id, displaced_id, None, false, Some(displaced_distance))?;
                        self.commit_assign(fog_id, task_id);
                        self.fogs[fog_id].links[idx].charge += displaced_charge;
                        return Ok(true);
                    }
                }
            }
        } else if mode.neighbours {
            let bandwidth_charge = self.tasks[&task_id].bandwidth_charge(k_bw);
            let links = self.fogs[fog_id].links.clone();
            for (idx, link) in links.iter().enumerate() {
                if link.can_handle(bandwidth_charge) && self.ask_assign(link.target, task_id, mode, false)? {
                    self.fogs[fog_id].links[idx].charge += bandwidth_charge;
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }

    /// Unconditional commit: hosts `task_id` on `fog_id`, moving its ledger
    /// bucket and distance contribution. Returns the task's state before the
    /// commit, for an exact `commit_revert`.
    fn commit_assign(&mut self, fog_id: FogId, task_id: TaskId) -> TaskState {
        let old_state = self.tasks[&task_id].state;
        let resource = self.tasks[&task_id].resource;
        let cost = self.tasks[&task_id].cost;
        let owner = self.tasks[&task_id].owner.clone();

        let distance_sq = self
            .vehicles
            .get(&owner)
            .and_then(|v| v.distance_to_fogs.get(&fog_id).copied())
            .unwrap_or_else(|| self.tasks[&task_id].distance_to_vehicle.unwrap_or(0.0));

        let new_state = {
            let task = self.tasks.get_mut(&task_id).unwrap();
            task.distance_to_vehicle = Some(distance_sq);
            task.progress(0)
        };
        self.ledger.move_bucket(task_id, old_state, new_state);

        let contribution = distance_sq.sqrt() * cost as f64;
        let fog = &mut self.fogs[fog_id];
        fog.commit_resource(task_id, resource);
        fog.task_distances += contribution;
        self.all_task_distances += contribution;

        old_state
    }

    /// Exact undo of `commit_assign`. `old_state = None` means only the host
    /// changes (a displaced task being re-homed), not the task's lifecycle
    /// state. `distance_override`, when given, is the distance contribution
    /// to undo instead of the task's *current* `distance_to_vehicle` — needed
    /// when a recursive `ask_assign` has already re-homed (and so
    /// overwritten the distance of) the same task onto another fog before
    /// this revert runs, per spec §4.6's cost-displacement branch.
    fn commit_revert(
        &mut self,
        fog_id: FogId,
        task_id: TaskId,
        old_state: Option<TaskState>,
        is_last: bool,
        distance_override: Option<Option<f64>>,
    ) -> Result<()> {
        let resource = self.tasks[&task_id].resource;
        let cost = self.tasks[&task_id].cost;
        let distance_sq = distance_override
            .unwrap_or_else(|| self.tasks[&task_id].distance_to_vehicle)
            .unwrap_or(0.0);
        let contribution = distance_sq.sqrt() * cost as f64;

        let fog = &mut self.fogs[fog_id];
        fog.revert_resource(task_id, resource, is_last)?;
        fog.task_distances -= contribution;
        self.all_task_distances -= contribution;

        if let Some(old) = old_state {
            let current = self.tasks[&task_id].state;
            self.tasks.get_mut(&task_id).unwrap().state = old;
            self.ledger.move_bucket(task_id, current, old);
        }
        Ok(())
    }

    /// Spec §4.7: advance every hosted task by one second, reclaiming
    /// capacity and notifying the owning vehicle for each completion.
    fn progress_tasks(&mut self) -> Result<()> {
        let fog_ids: Vec<FogId> = self.fogs.keys().collect();
        for fid in fog_ids {
            let assigned = self.fogs[fid].assigned.clone();
            let mut still_in_progress = Vec::with_capacity(assigned.len());
            for tid in assigned {
                let (new_state, resource, cost, owner, distance_sq) = {
                    let task = self.tasks.get_mut(&tid).unwrap();
                    let new_state = task.progress(1);
                    (
                        new_state,
                        task.resource,
                        task.cost,
                        task.owner.clone(),
                        task.distance_to_vehicle.unwrap_or(0.0),
                    )
                };
                if new_state == TaskState::Completed {
                    self.ledger.move_bucket(tid, TaskState::InProgress, TaskState::Completed);
                    match self.vehicles.get_mut(&owner) {
                        Some(vehicle) => vehicle.receive_task_result(),
                        None => log::warn!("task {tid} completed for vanished vehicle {owner}"),
                    }
                    let contribution = distance_sq.sqrt() * cost as f64;
                    let fog = &mut self.fogs[fid];
                    fog.subtract_used(resource)?;
                    fog.task_distances -= contribution;
                    self.all_task_distances -= contribution;
                } else {
                    still_in_progress.push(tid);
                }
            }
            self.fogs[fid].assigned = still_in_progress;
        }
        Ok(())
    }

    fn recolour_fogs(&mut self) {
        let ids: Vec<FogId> = self.fogs.keys().collect();
        for fid in ids {
            let colour = usage_colour(self.fogs[fid].usage);
            self.fogs[fid].colour = colour;
            let name = self.fogs[fid].fog_id.clone();
            self.oracle.polygon_set_colour(&name, colour);
        }
    }

    fn nodes_usage(&self) -> Vec<f64> {
        self.fogs.values().map(|f| f.usage).collect()
    }

    fn links_load(&self) -> Vec<f64> {
        self.fogs.values().map(|f| f.links_load()).collect()
    }

    fn global_qos(&self) -> f64 {
        qos::evaluate(
            self.ledger.count(TaskState::InProgress),
            &self.nodes_usage(),
            &self.links_load(),
            self.all_task_distances,
            &self.config.qos,
        )
    }

    fn qos_from_params(&self, params: &EvalParameters) -> f64 {
        qos::evaluate(
            params.allocated_tasks,
            &self.nodes_usage(),
            &self.links_load(),
            params.all_task_distances,
            &self.config.qos,
        )
    }

    pub fn eval_parameters(&self) -> EvalParameters {
        EvalParameters {
            allocated_tasks: self.ledger.count(TaskState::InProgress),
            pending_tasks: self.ledger.count(TaskState::Pending),
            completed_tasks: self.ledger.count(TaskState::Completed),
            failed_tasks: self.ledger.count(TaskState::Failed),
            total_tasks: self.ledger.total(),
            nodes_usage_var: qos::population_variance(&self.nodes_usage()),
            links_load_var: qos::population_variance(&self.links_load()),
            all_task_distances: self.all_task_distances,
        }
    }
}
