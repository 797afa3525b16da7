use crate::error::{Result, SimError};
use crate::fog::{Colour, Shape};
use crate::mode::AssignMode;
use crate::qos::QosConstants;
use crate::range::StepRange;

/// A plain `[min, max]` count range (step is implicitly 1): unlike
/// `StepRange`, `min == max` is a legitimate "always exactly N" config, so it
/// does not carry the stepped-range degeneracy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountRange {
    min: i64,
    max: i64,
}

impl CountRange {
    pub fn new(min: i64, max: i64) -> Result<Self> {
        if min > max {
            return Err(SimError::InvalidRange { min, max, step: 1 });
        }
        Ok(Self { min, max })
    }

    pub fn sample(&self, rng: &mut impl rand::Rng) -> i64 {
        rng.gen_range(self.min..=self.max)
    }
}

/// `(cpu, ram, storage)` stepped ranges for one resource sizing preset.
#[derive(Debug, Clone, Copy)]
pub struct ResourcePreset {
    pub cpu: StepRange,
    pub ram: StepRange,
    pub storage: StepRange,
}

impl ResourcePreset {
    pub fn new(cpu: StepRange, ram: StepRange, storage: StepRange) -> Self {
        Self { cpu, ram, storage }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceTier {
    Low,
    Medium,
    High,
    Extreme,
}

#[derive(Debug, Clone)]
pub struct TopologyConfig {
    pub nb_fog_nodes: usize,
    pub max_neighbours: usize,
    pub random_divider: i64,
    pub centre: (f64, f64),
    pub fog_shape: Shape,
    pub fog_colour: Colour,
}

#[derive(Debug, Clone)]
pub struct TaskConfig {
    pub nb_tasks: CountRange,
    /// Resource demand of a generated task is drawn from this preset —
    /// distinct from `Config::fog_resources`, which sizes node capacity.
    pub task_resource: ResourcePreset,
    pub duration: StepRange,
    pub cost: StepRange,
    pub k_bandwidth_charge: f64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub topology: TopologyConfig,
    pub fog_resources: ResourcePreset,
    /// Fog node resources are sampled from `fog_resources` on topology
    /// initialisation; `resource_tier` is retained for diagnostics/logging.
    pub resource_tier: ResourceTier,
    pub link_bandwidth: StepRange,
    pub tasks: TaskConfig,
    pub qos: QosConstants,
    pub mode: AssignMode,
    pub seed: u64,
}

impl Config {
    /// Derive a default link-bandwidth range as `cpu_range // divisor`, per
    /// spec §6 ("Link bandwidth... derived by default as `(cpu_range // k)`").
    pub fn derive_link_bandwidth(cpu: &StepRange, divisor: i64) -> Result<StepRange> {
        StepRange::new(cpu.min() / divisor, cpu.max() / divisor, (cpu.step() / divisor).max(1))
    }

    pub fn resource_preset(tier: ResourceTier) -> Result<ResourcePreset> {
        let (cpu, ram, storage) = match tier {
            ResourceTier::Low => (
                StepRange::new(100, 400, 50)?,
                StepRange::new(256, 1024, 256)?,
                StepRange::new(1, 10, 1)?,
            ),
            ResourceTier::Medium => (
                StepRange::new(400, 800, 50)?,
                StepRange::new(1024, 4096, 256)?,
                StepRange::new(10, 50, 5)?,
            ),
            ResourceTier::High => (
                StepRange::new(800, 1600, 100)?,
                StepRange::new(4096, 16384, 512)?,
                StepRange::new(50, 200, 10)?,
            ),
            ResourceTier::Extreme => (
                StepRange::new(1600, 3200, 100)?,
                StepRange::new(16384, 65536, 1024)?,
                StepRange::new(200, 1000, 50)?,
            ),
        };
        Ok(ResourcePreset::new(cpu, ram, storage))
    }

    /// A small, fully-specified default suitable for tests and the CLI's
    /// fallback.
    pub fn default_with_seed(seed: u64) -> Result<Self> {
        let fog_resources = Self::resource_preset(ResourceTier::Medium)?;
        let link_bandwidth = Self::derive_link_bandwidth(&fog_resources.cpu, 4)?;
        Ok(Self {
            topology: TopologyConfig {
                nb_fog_nodes: 10,
                max_neighbours: 3,
                random_divider: 3,
                centre: (0.0, 0.0),
                fog_shape: vec![(0.0, 0.0), (0.0, 50.0), (50.0, 50.0), (50.0, 0.0)],
                fog_colour: (255, 0, 0, 255),
            },
            fog_resources,
            resource_tier: ResourceTier::Medium,
            link_bandwidth,
            tasks: TaskConfig {
                nb_tasks: CountRange::new(1, 3)?,
                task_resource: Self::resource_preset(ResourceTier::Low)?,
                duration: StepRange::new(10, 60, 5)?,
                cost: StepRange::new(1, 10, 1)?,
                k_bandwidth_charge: 0.5,
            },
            qos: QosConstants::default(),
            mode: AssignMode::NEAREST,
            seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_link_bandwidth_from_cpu_range() {
        let cpu = StepRange::new(400, 800, 40).unwrap();
        let link = Config::derive_link_bandwidth(&cpu, 4).unwrap();
        assert_eq!(link.min(), 100);
        assert_eq!(link.max(), 200);
    }

    #[test]
    fn count_range_allows_min_equals_max() {
        let r = CountRange::new(2, 2).unwrap();
        let mut rng = rand::thread_rng();
        assert_eq!(r.sample(&mut rng), 2);
    }

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default_with_seed(0).is_ok());
    }
}
