//! Module with the configuration of a simulation.
//!
//! A [`SimulationConfig`] gathers everything needed to build and run a network: the clock, the
//! population sizes, the worker pool, the random seed, the projection plan, the parameter
//! distributions and the biophysical constants of every population. The default configuration
//! reproduces the reference run of the thalamocortical model: 10 s at 50,000 steps per second, one
//! frame every 10 steps, 128/32/128/32 neurons and 7 worker threads.
//!
//! Configurations can be stored as and loaded from JSON files.
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::connectivity::Projection;
use crate::error::CortexError;
use crate::neuron::inhibitory::InhibitoryConstants;
use crate::neuron::noise::NoiseConfig;
use crate::neuron::principal::PrincipalConstants;
use crate::neuron::relay::RelayConstants;
use crate::neuron::reticular::ReticularConstants;
use crate::population::PopulationSizes;
use crate::sampler::ParameterSampler;

/// The biophysical constants of all four populations.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct Biophysics {
    pub principal: PrincipalConstants,
    pub inhibitory: InhibitoryConstants,
    pub relay: RelayConstants,
    pub reticular: ReticularConstants,
}

/// The configuration of a simulation.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Simulated time (s).
    pub duration: f64,
    /// Number of steps per second of simulated time.
    pub resolution: usize,
    /// A frame is recorded every `decimation` steps.
    pub decimation: usize,
    /// Number of neurons per population.
    pub sizes: PopulationSizes,
    /// Number of worker threads.
    pub num_threads: usize,
    /// Seed of the random number generator; drawn from the system entropy if missing.
    pub seed: Option<u64>,
    pub noise: NoiseConfig,
    /// The projections to sample, see [`Projection::default_plan`].
    pub plan: Vec<Projection>,
    pub sampler: ParameterSampler,
    pub biophysics: Biophysics,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            duration: 10.0,
            resolution: 50_000,
            decimation: 10,
            sizes: PopulationSizes::default(),
            num_threads: 7,
            seed: None,
            noise: NoiseConfig::default(),
            plan: Projection::default_plan(),
            sampler: ParameterSampler::default(),
            biophysics: Biophysics::default(),
        }
    }
}

impl SimulationConfig {
    /// The step size (ms).
    pub fn dt(&self) -> f64 {
        1E3 / self.resolution as f64
    }

    /// The total number of steps.
    pub fn num_steps(&self) -> usize {
        (self.duration * self.resolution as f64).round() as usize
    }

    /// The number of recorded frames, i.e., the number of steps `t` with `t % decimation == 0`.
    pub fn num_frames(&self) -> usize {
        self.num_steps().div_ceil(self.decimation)
    }

    /// Check the configuration for consistency.
    pub fn validate(&self) -> Result<(), CortexError> {
        if !(self.duration.is_finite() && self.duration >= 0.0) {
            return Err(CortexError::InvalidParameters(format!(
                "The duration must be finite and non-negative, got {}",
                self.duration
            )));
        }
        if self.resolution == 0 {
            return Err(CortexError::InvalidParameters(
                "The resolution must be positive".to_string(),
            ));
        }
        if self.decimation == 0 {
            return Err(CortexError::InvalidParameters(
                "The decimation must be positive".to_string(),
            ));
        }
        if self.num_threads == 0 {
            return Err(CortexError::InvalidParameters(
                "The number of threads must be positive".to_string(),
            ));
        }
        if !(self.noise.intensity.is_finite() && self.noise.intensity >= 0.0) {
            return Err(CortexError::InvalidParameters(format!(
                "The noise intensity must be finite and non-negative, got {}",
                self.noise.intensity
            )));
        }
        if let Some(projection) = self
            .plan
            .iter()
            .find(|projection| !(projection.width.is_finite() && projection.width > 0.0))
        {
            return Err(CortexError::InvalidParameters(format!(
                "The projection {} -> {} has an invalid width {}",
                projection.source, projection.target, projection.width
            )));
        }
        if self.sizes.principal == 0 {
            if let Some(projection) = self.plan.iter().find(|projection| {
                self.sizes.get(projection.source) > 0 && self.sizes.get(projection.target) > 0
            }) {
                return Err(CortexError::InvalidParameters(format!(
                    "The projection {} -> {} needs the ring, whose length is set by the principal \
                     population, but there is no principal neuron",
                    projection.source, projection.target
                )));
            }
        }
        self.sampler.validate()
    }

    /// Save the configuration to a JSON file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), CortexError> {
        let file = File::create(path).map_err(|e| CortexError::IOError(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| CortexError::IOError(e.to_string()))?;
        writer.flush().map_err(|e| CortexError::IOError(e.to_string()))
    }

    /// Load a configuration from a JSON file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, CortexError> {
        let file = File::open(path).map_err(|e| CortexError::IOError(e.to_string()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| CortexError::IOError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    use crate::population::Population;
    use crate::sampler::ParameterDistribution;

    #[test]
    fn test_default_clock() {
        let config = SimulationConfig::default();
        assert_eq!(config.dt(), 0.02);
        assert_eq!(config.num_steps(), 500_000);
        assert_eq!(config.num_frames(), 50_000);
        assert_eq!(config.sizes.total(), 320);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_num_frames() {
        let config = SimulationConfig {
            duration: 0.0003,
            resolution: 50_000,
            decimation: 4,
            ..Default::default()
        };
        // steps 0, 4, 8, 12 out of 15
        assert_eq!(config.num_steps(), 15);
        assert_eq!(config.num_frames(), 4);

        let config = SimulationConfig {
            duration: 0.0,
            ..Default::default()
        };
        assert_eq!(config.num_frames(), 0);
    }

    #[test]
    fn test_validate() {
        let invalid = [
            SimulationConfig {
                resolution: 0,
                ..Default::default()
            },
            SimulationConfig {
                decimation: 0,
                ..Default::default()
            },
            SimulationConfig {
                num_threads: 0,
                ..Default::default()
            },
            SimulationConfig {
                duration: f64::NAN,
                ..Default::default()
            },
            SimulationConfig {
                plan: vec![Projection::new(Population::Relay, Population::Reticular, -1.0)],
                ..Default::default()
            },
        ];
        for config in invalid.iter() {
            assert!(matches!(config.validate(), Err(CortexError::InvalidParameters(_))));
        }

        let mut config = SimulationConfig::default();
        config.sampler.reticular = ParameterDistribution::new(vec![-63.8], vec![0.15]);
        assert_eq!(
            config.validate(),
            Err(CortexError::ParameterLength {
                population: Population::Reticular,
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_thalamus_without_cortex() {
        let config = SimulationConfig {
            sizes: PopulationSizes::new(0, 0, 8, 8),
            ..Default::default()
        };
        match config.validate() {
            Err(CortexError::InvalidParameters(msg)) => {
                assert!(msg.contains("no principal neuron"))
            }
            other => panic!("unexpected result {:?}", other),
        }

        // without projections there is no ring to lay out
        let config = SimulationConfig {
            plan: vec![],
            ..config
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_load() {
        let mut config = SimulationConfig::default();
        config.seed = Some(42);
        config.sizes = PopulationSizes::new(8, 2, 0, 0);
        config.noise.enabled = true;
        config.biophysics.principal.g_kna = 0.0;

        let file = NamedTempFile::new().unwrap();
        config.save_to(file.path()).unwrap();
        let loaded = SimulationConfig::load_from(file.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_save_to_full_device() {
        assert!(matches!(
            SimulationConfig::default().save_to("/dev/full"),
            Err(CortexError::IOError(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            SimulationConfig::load_from("does/not/exist.json"),
            Err(CortexError::IOError(_))
        ));
    }
}
