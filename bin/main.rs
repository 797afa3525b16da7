use std::collections::HashSet;

use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use fog_sim::config::Config;
use fog_sim::oracle::MobilityOracle;
use fog_sim::simulation::Simulation;

#[derive(Debug, clap::Parser)]
#[command(long_about = None)]
struct Args {
    /// Duration of the simulation, in ticks (s)
    #[arg(long, default_value_t = 600)]
    duration: u64,
    /// Number of fog nodes in the topology
    #[arg(long, default_value_t = 10)]
    nb_fog_nodes: usize,
    /// Maximum number of neighbours wired per fog node
    #[arg(long, default_value_t = 3)]
    max_neighbours: usize,
    /// Number of synthetic vehicles driven by the built-in random-walk oracle
    #[arg(long, default_value_t = 20)]
    nb_vehicles: usize,
    /// Assignment mode: nearest, with-neighbours, with-neighbours-and-qos, cost-priority
    #[arg(long, default_value_t = String::from("nearest"))]
    mode: String,
    /// Seed to initialize the pseudo-random number generators
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn parse_mode(name: &str) -> anyhow::Result<fog_sim::mode::AssignMode> {
    match name {
        "nearest" => Ok(fog_sim::mode::AssignMode::NEAREST),
        "with-neighbours" => Ok(fog_sim::mode::AssignMode::WITH_NEIGHBOURS),
        "with-neighbours-and-qos" => Ok(fog_sim::mode::AssignMode::WITH_NEIGHBOURS_AND_QOS),
        "cost-priority" => Ok(fog_sim::mode::AssignMode::COST_PRIORITY),
        other => Err(anyhow::anyhow!("unknown assignment mode: {other}")),
    }
}

/// A bounded random walk confined to the net boundary: enough to drive the
/// core end to end without pulling in the real traffic microsimulator,
/// which the core deliberately treats as an external collaborator (spec §6).
struct RandomWalkOracle {
    boundary: ((f64, f64), (f64, f64)),
    positions: std::collections::HashMap<String, (f64, f64)>,
    rng: StdRng,
}

impl RandomWalkOracle {
    fn new(boundary: ((f64, f64), (f64, f64)), nb_vehicles: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let ((min_x, min_y), (max_x, max_y)) = boundary;
        let positions = (0..nb_vehicles)
            .map(|i| {
                let x = rng.gen_range(min_x..=max_x);
                let y = rng.gen_range(min_y..=max_y);
                (format!("vehicle{i}"), (x, y))
            })
            .collect();
        Self { boundary, positions, rng }
    }
}

impl MobilityOracle for RandomWalkOracle {
    fn net_boundary(&self) -> ((f64, f64), (f64, f64)) {
        self.boundary
    }

    fn step(&mut self) {
        let ((min_x, min_y), (max_x, max_y)) = self.boundary;
        for position in self.positions.values_mut() {
            let dx = self.rng.gen_range(-5.0..=5.0);
            let dy = self.rng.gen_range(-5.0..=5.0);
            position.0 = (position.0 + dx).clamp(min_x, max_x);
            position.1 = (position.1 + dy).clamp(min_y, max_y);
        }
    }

    fn expected_remaining(&self) -> i64 {
        self.positions.len() as i64
    }

    fn vehicle_ids(&self) -> HashSet<String> {
        self.positions.keys().cloned().collect()
    }

    fn vehicle_position(&self, id: &String) -> fog_sim::error::Result<(f64, f64)> {
        self.positions
            .get(id)
            .copied()
            .ok_or_else(|| fog_sim::error::SimError::OracleFailure(format!("unknown vehicle: {id}")))
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let mode = parse_mode(&args.mode)?;

    let mut config = Config::default_with_seed(args.seed)?;
    config.topology.nb_fog_nodes = args.nb_fog_nodes;
    config.topology.max_neighbours = args.max_neighbours;
    config.mode = mode;

    let oracle = RandomWalkOracle::new(((0.0, 0.0), (1000.0, 1000.0)), args.nb_vehicles, args.seed);
    let mut sim = Simulation::new(config, oracle)?;

    for t in 0..args.duration {
        let report = sim.tick()?;
        if t % 60 == 0 || t == args.duration - 1 {
            log::info!(
                "t={t} qos={:.3} allocated={} pending={} completed={} failed={}",
                report.qos,
                report.params.allocated_tasks,
                report.params.pending_tasks,
                report.params.completed_tasks,
                report.params.failed_tasks,
            );
        }
    }

    let params = sim.eval_parameters();
    println!("seed,mode,allocated,pending,completed,failed,total,all_task_distances");
    println!(
        "{},{},{},{},{},{},{},{}",
        args.seed,
        mode,
        params.allocated_tasks,
        params.pending_tasks,
        params.completed_tasks,
        params.failed_tasks,
        params.total_tasks,
        params.all_task_distances,
    );

    Ok(())
}
