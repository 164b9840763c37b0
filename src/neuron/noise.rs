//! Stochastic drive of the membrane potential.
//!
//! Each step draws two independent normal variables `r0` and `r1`, centered and with standard
//! deviations `intensity dt` and `dt`. Stage `i` adds `(r0 + r1 / √3) B[i]` to the potential it
//! produces, and the combination adds `(r0 - √3 r1) / 4` to the new accepted potential. Fresh
//! variables are drawn after every combination.
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::integrator::RK_B;

/// Default intensity of the potential noise (mV/ms).
pub const DEFAULT_INTENSITY: f64 = 5E-3;

/// Configuration of the noise sources.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Whether every neuron receives a noise source.
    pub enabled: bool,
    /// Standard deviation per unit of time of the potential increments.
    pub intensity: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        NoiseConfig {
            enabled: false,
            intensity: DEFAULT_INTENSITY,
        }
    }
}

/// A per-neuron noise source with its own random number generator.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseSource {
    rng: ChaCha8Rng,
    increment_std: f64,
    time_std: f64,
    draws: [f64; 2],
}

impl NoiseSource {
    /// Create a noise source for a given step size, seeded for reproducibility.
    pub fn new(intensity: f64, dt: f64, seed: u64) -> Self {
        let mut source = NoiseSource {
            rng: ChaCha8Rng::seed_from_u64(seed),
            increment_std: intensity * dt,
            time_std: dt,
            draws: [0.0; 2],
        };
        source.redraw();
        source
    }

    /// Draw the random variables of the next step.
    pub fn redraw(&mut self) {
        let r0: f64 = self.rng.sample(StandardNormal);
        let r1: f64 = self.rng.sample(StandardNormal);
        self.draws = [r0 * self.increment_std, r1 * self.time_std];
    }

    /// The potential increment of a stage.
    pub fn stage_increment(&self, stage: usize) -> f64 {
        (self.draws[0] + self.draws[1] / 3.0_f64.sqrt()) * RK_B[stage]
    }

    /// The potential increment of the combination.
    pub fn combine_increment(&self) -> f64 {
        (self.draws[0] - self.draws[1] * 3.0_f64.sqrt()) / 4.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_increments() {
        let source = NoiseSource::new(DEFAULT_INTENSITY, 0.02, 42);
        assert_ne!(source.stage_increment(0), 0.0);
        assert_eq!(source.stage_increment(0), source.stage_increment(1));
        assert_eq!(source.stage_increment(2), 0.0);
        assert_eq!(source.stage_increment(3), 0.0);
        assert_ne!(source.combine_increment(), 0.0);
    }

    #[test]
    fn test_noise_reproducibility() {
        let mut a = NoiseSource::new(DEFAULT_INTENSITY, 0.02, 7);
        let mut b = NoiseSource::new(DEFAULT_INTENSITY, 0.02, 7);
        let mut c = NoiseSource::new(DEFAULT_INTENSITY, 0.02, 8);
        for _ in 0..10 {
            assert_eq!(a.combine_increment(), b.combine_increment());
            assert_ne!(a.combine_increment(), c.combine_increment());
            a.redraw();
            b.redraw();
            c.redraw();
        }
    }

    #[test]
    fn test_noise_variance() {
        const NUM_DRAWS: usize = 50_000;
        let dt = 0.02;
        let mut source = NoiseSource::new(1.0, dt, 3);
        let mut sum_sq = 0.0;
        for _ in 0..NUM_DRAWS {
            // (r0 - √3 r1) / 4 has variance (dt² + 3 dt²) / 16 = dt² / 4 when the intensity is one
            sum_sq += source.combine_increment().powi(2);
            source.redraw();
        }
        let var = sum_sq / NUM_DRAWS as f64;
        assert!((var - dt * dt / 4.0).abs() < 0.05 * dt * dt / 4.0);
    }
}
