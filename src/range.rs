use rand::Rng;

use crate::error::{Result, SimError};

/// A stepped uniform range `[min, max]` with a fixed granularity.
///
/// Sampling draws a uniform integer divisor in `[min/step, max/step]` and
/// rescales it by `step`, mirroring the original `random_step`/`Task.random`
/// sampling technique: divide the bounds down, draw, then multiply back up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepRange {
    min: i64,
    max: i64,
    step: i64,
}

impl StepRange {
    pub fn new(min: i64, max: i64, step: i64) -> Result<Self> {
        if min > max || step <= 0 || min / step == max / step {
            return Err(SimError::InvalidRange { min, max, step });
        }
        Ok(Self { min, max, step })
    }

    pub fn min(&self) -> i64 {
        self.min
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    pub fn step(&self) -> i64 {
        self.step
    }

    /// Draw a value uniformly from the range using `rng`.
    pub fn sample(&self, rng: &mut impl Rng) -> i64 {
        let lo = self.min / self.step;
        let hi = self.max / self.step;
        rng.gen_range(lo..=hi) * self.step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn rejects_degenerate_ranges() {
        assert!(matches!(
            StepRange::new(10, 5, 1),
            Err(SimError::InvalidRange { .. })
        ));
        assert!(matches!(
            StepRange::new(0, 10, 0),
            Err(SimError::InvalidRange { .. })
        ));
        assert!(matches!(
            StepRange::new(0, 4, 10),
            Err(SimError::InvalidRange { .. })
        ));
    }

    #[test]
    fn samples_within_bounds_and_on_step() {
        let range = StepRange::new(10, 60, 5).unwrap();
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        for _ in 0..1000 {
            let v = range.sample(&mut rng);
            assert!(v >= 10 && v <= 60);
            assert_eq!(v % 5, 0);
        }
    }
}
