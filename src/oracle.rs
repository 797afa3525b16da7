use std::collections::HashSet;

use crate::error::Result;
use crate::task::VehicleId;

/// The boundary to the external traffic microsimulator (spec §6). The core
/// never implements this itself beyond trivial test/demo adapters — a real
/// run supplies one backed by the actual simulator.
pub trait MobilityOracle {
    /// `((min_x, min_y), (max_x, max_y))` of the simulated map.
    fn net_boundary(&self) -> ((f64, f64), (f64, f64));

    /// Advance the oracle by one tick.
    fn step(&mut self);

    /// Number of vehicles the oracle still expects to produce, including
    /// those already present.
    fn expected_remaining(&self) -> i64;

    /// Identities of every vehicle currently known to the oracle.
    fn vehicle_ids(&self) -> HashSet<VehicleId>;

    /// Position of a vehicle. `Err(SimError::OracleFailure)` if the vehicle
    /// has already vanished between the id listing and this query.
    fn vehicle_position(&self, id: &VehicleId) -> Result<(f64, f64)>;

    /// Optional visualisation sink; no-op by default so the core runs
    /// without any rendering backend.
    fn set_vehicle_colour(&mut self, _id: &VehicleId, _rgba: (u8, u8, u8, u8)) {}

    /// Optional visualisation sink for fog-node polygons; no-op by default.
    fn polygon_add(&mut self, _id: &str, _shape: &[(f64, f64)], _rgba: (u8, u8, u8, u8)) {}

    /// Optional visualisation sink for fog-node polygons; no-op by default.
    fn polygon_set_colour(&mut self, _id: &str, _rgba: (u8, u8, u8, u8)) {}
}
