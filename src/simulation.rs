//! Module implementing the simulation clock.
//!
//! A run advances the network by `duration * resolution` steps of `1000 / resolution` ms. After
//! every step `t` with `t % decimation == 0`, frame `t / decimation` is handed to a [`Recorder`],
//! which must copy out whatever it needs before the next step mutates the network.
//!
//! # Examples
//!
//! ```rust
//! use rusty_cortex::config::SimulationConfig;
//! use rusty_cortex::population::PopulationSizes;
//! use rusty_cortex::simulation::{Simulation, Trace};
//!
//! let config = SimulationConfig {
//!     duration: 0.002,
//!     decimation: 10,
//!     sizes: PopulationSizes::new(8, 2, 4, 2),
//!     num_threads: 2,
//!     seed: Some(42),
//!     ..Default::default()
//! };
//!
//! let mut simulation = Simulation::new(config).unwrap();
//! let mut trace = Trace::default();
//! simulation.run(&mut trace);
//!
//! assert_eq!(trace.len(), 10);
//! assert_eq!(trace.frames()[0].principal_soma.len(), 8);
//! ```
use log;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::config::SimulationConfig;
use crate::error::CortexError;
use crate::network::Network;
use crate::neuron::Neuron;
use crate::population::Population;
use crate::stepper::Stepper;

/// A snapshot collaborator, called with the frame index and read-only access to the whole network.
pub trait Recorder {
    fn record(&mut self, frame: usize, network: &Network);
}

impl<F: FnMut(usize, &Network)> Recorder for F {
    fn record(&mut self, frame: usize, network: &Network) {
        self(frame, network)
    }
}

/// The observables of the network at a given frame.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub index: usize,
    /// Somatic potentials of the principal neurons (mV).
    pub principal_soma: Vec<f64>,
    /// Potentials of the inhibitory neurons (mV).
    pub inhibitory: Vec<f64>,
    /// Calcium concentrations of the principal neurons (µM).
    pub principal_calcium: Vec<f64>,
    pub relay: Vec<f64>,
    pub reticular: Vec<f64>,
}

impl Frame {
    /// Copy the observables out of a network.
    pub fn capture(index: usize, network: &Network) -> Self {
        Frame {
            index,
            principal_soma: network.potentials(Population::Principal),
            inhibitory: network.potentials(Population::Inhibitory),
            principal_calcium: network
                .principal()
                .neurons()
                .iter()
                .map(|neuron| neuron.state().ca)
                .collect(),
            relay: network.potentials(Population::Relay),
            reticular: network.potentials(Population::Reticular),
        }
    }
}

/// A recorder keeping every frame in memory.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct Trace {
    frames: Vec<Frame>,
}

impl Trace {
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Save the trace to a JSON file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), CortexError> {
        let file = File::create(path).map_err(|e| CortexError::IOError(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self)
            .map_err(|e| CortexError::IOError(e.to_string()))?;
        writer.flush().map_err(|e| CortexError::IOError(e.to_string()))
    }

    /// Load a trace from a JSON file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, CortexError> {
        let file = File::open(path).map_err(|e| CortexError::IOError(e.to_string()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| CortexError::IOError(e.to_string()))
    }
}

impl Recorder for Trace {
    fn record(&mut self, frame: usize, network: &Network) {
        self.frames.push(Frame::capture(frame, network));
    }
}

/// A simulation, i.e., a network, its stepper and the clock.
#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    network: Network,
    stepper: Stepper,
    step: usize,
}

impl Simulation {
    /// Create a simulation with a random network drawn from the configuration.
    pub fn new(config: SimulationConfig) -> Result<Self, CortexError> {
        let network = Network::build(&config)?;
        Simulation::from_network(config, network)
    }

    /// Create a simulation of a given network; the configuration only provides the clock and the
    /// worker pool.
    pub fn from_network(config: SimulationConfig, network: Network) -> Result<Self, CortexError> {
        config.validate()?;
        let stepper = Stepper::new(config.dt(), config.num_threads)?;
        Ok(Simulation {
            config,
            network,
            stepper,
            step: 0,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Mutable access to the network, e.g., to set input currents between two steps.
    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.network
    }

    /// Returns the number of completed steps.
    pub fn num_completed_steps(&self) -> usize {
        self.step
    }

    /// Returns the simulated time (ms).
    pub fn time(&self) -> f64 {
        self.step as f64 * self.config.dt()
    }

    /// Advance the network by one step, then record a frame if the step is a multiple of the
    /// decimation.
    pub fn step<R: Recorder + ?Sized>(&mut self, recorder: &mut R) {
        let t = self.step;
        self.stepper.step(&mut self.network);
        self.step += 1;
        if t % self.config.decimation == 0 {
            recorder.record(t / self.config.decimation, &self.network);
        }
    }

    /// Run the remaining steps of the simulation.
    pub fn run<R: Recorder + ?Sized>(&mut self, recorder: &mut R) {
        let num_steps = self.config.num_steps();
        let report_every = (num_steps / 100).max(1);

        log::info!(
            "Simulation of {} ms with {} neurons, {} steps of {} ms on {} threads",
            self.config.duration * 1E3,
            self.network.num_neurons(),
            num_steps,
            self.config.dt(),
            self.stepper.num_threads()
        );

        while self.step < num_steps {
            self.step(recorder);
            if self.step % report_every == 0 {
                log::debug!(
                    "Simulation progress: {:.0}% ({} ms)",
                    100.0 * self.step as f64 / num_steps as f64,
                    self.time()
                );
            }
        }

        log::info!("Simulation completed after {} steps", self.step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::NamedTempFile;

    use crate::population::PopulationSizes;

    fn config() -> SimulationConfig {
        SimulationConfig {
            duration: 0.0003,
            decimation: 4,
            sizes: PopulationSizes::new(4, 2, 2, 2),
            num_threads: 2,
            seed: Some(7),
            ..Default::default()
        }
    }

    #[test]
    fn test_frames_follow_decimation() {
        let mut simulation = Simulation::new(config()).unwrap();
        let mut frames = vec![];
        simulation.run(&mut |frame: usize, _: &Network| frames.push(frame));
        assert_eq!(frames, vec![0, 1, 2, 3]);
        assert_eq!(simulation.num_completed_steps(), 15);
        assert_relative_eq!(simulation.time(), 0.3, epsilon = 1e-12);

        // the run is over
        simulation.run(&mut |_: usize, _: &Network| panic!("no more frames"));
    }

    #[test]
    fn test_trace_captures_observables() {
        let mut simulation = Simulation::new(config()).unwrap();
        let mut trace = Trace::default();
        simulation.run(&mut trace);

        assert_eq!(trace.len(), simulation.config().num_frames());
        let last = trace.frames().last().unwrap();
        assert_eq!(last.index, 3);
        assert_eq!(last.principal_soma.len(), 4);
        assert_eq!(last.principal_calcium.len(), 4);
        assert_eq!(last.inhibitory.len(), 2);
        assert_eq!(last.relay.len(), 2);
        assert_eq!(last.reticular.len(), 2);
        assert!(last.principal_soma.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_trace_save_load() {
        let mut simulation = Simulation::new(config()).unwrap();
        let mut trace = Trace::default();
        simulation.run(&mut trace);

        let file = NamedTempFile::new().unwrap();
        trace.save_to(file.path()).unwrap();
        assert_eq!(Trace::load_from(file.path()).unwrap(), trace);
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_trace_save_to_full_device() {
        let mut simulation = Simulation::new(config()).unwrap();
        let mut trace = Trace::default();
        simulation.run(&mut trace);
        assert!(matches!(
            trace.save_to("/dev/full"),
            Err(CortexError::IOError(_))
        ));
        assert!(matches!(
            Trace::default().save_to("/dev/full"),
            Err(CortexError::IOError(_))
        ));
    }

    #[test]
    fn test_invalid_config() {
        let config = SimulationConfig {
            decimation: 0,
            ..config()
        };
        assert!(matches!(
            Simulation::new(config),
            Err(CortexError::InvalidParameters(_))
        ));
    }
}
