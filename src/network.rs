//! Module implementing the thalamocortical network, i.e., the four neuron populations and their
//! connectivity.
//!
//! Neurons only refer to their afferents by index, so the network owns all of them in flat
//! per-population vectors. A stage of the integration is evaluated in two phases: all neurons first
//! compute their next value from the current slots (in parallel for large populations), then all of
//! them store it. The end of the second phase acts as a barrier between stages.
//!
//! # Examples
//!
//! ```rust
//! use rusty_cortex::config::SimulationConfig;
//! use rusty_cortex::network::Network;
//! use rusty_cortex::population::{Population, PopulationSizes};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut config = SimulationConfig::default();
//! config.sizes = PopulationSizes::new(16, 4, 16, 4);
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let mut network = Network::rand(&config, &mut rng).unwrap();
//! network.set_input(Population::Principal, 3, 0.5).unwrap();
//!
//! assert_eq!(network.num_neurons(), 40);
//! assert!(network.set_input(Population::Relay, 16, 0.5).is_err());
//! ```
use itertools::Itertools;
use log;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::config::{Biophysics, SimulationConfig};
use crate::connectivity::{Afferents, Connectivity};
use crate::error::CortexError;
use crate::neuron::inhibitory::InhibitoryNeuron;
use crate::neuron::principal::{PrincipalNeuron, PrincipalState};
use crate::neuron::relay::RelayNeuron;
use crate::neuron::reticular::ReticularNeuron;
use crate::neuron::{NoiseSource, Neuron, Receptor, SynapticDrive};
use crate::population::{Population, PopulationSizes};
use crate::sampler::NetworkParameters;
use crate::MIN_PARALLEL_NEURONS;

/// The neurons of a population together with their shared constants.
#[derive(Debug, Clone)]
pub struct Ensemble<N: Neuron> {
    constants: N::Constants,
    neurons: Vec<N>,
}

impl<N: Neuron> Ensemble<N> {
    /// Build the neurons of a population from their parameters and afferents.
    pub fn build(
        constants: N::Constants,
        parameters: &[Vec<f64>],
        afferents: &[Afferents],
    ) -> Result<Self, CortexError> {
        if parameters.len() != afferents.len() {
            return Err(CortexError::IncompatibleTopology(format!(
                "{} parameter vectors for {} {} afferent lists",
                parameters.len(),
                afferents.len(),
                N::POPULATION
            )));
        }
        let neurons = parameters
            .iter()
            .zip(afferents.iter())
            .map(|(params, afferents)| N::build(params, &constants, afferents.clone()))
            .collect::<Result<Vec<N>, CortexError>>()?;
        Ok(Ensemble { constants, neurons })
    }

    pub fn constants(&self) -> &N::Constants {
        &self.constants
    }

    pub fn neurons(&self) -> &[N] {
        &self.neurons
    }

    pub fn len(&self) -> usize {
        self.neurons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neurons.is_empty()
    }

    fn neuron_mut(&mut self, id: usize) -> Result<&mut N, CortexError> {
        let len = self.neurons.len();
        self.neurons.get_mut(id).ok_or_else(|| {
            CortexError::OutOfBounds(format!(
                "{} neuron {} does not exist, the population has {} neurons",
                N::POPULATION,
                id,
                len
            ))
        })
    }

    fn neuron(&self, id: usize) -> Result<&N, CortexError> {
        self.neurons.get(id).ok_or_else(|| {
            CortexError::OutOfBounds(format!(
                "{} neuron {} does not exist, the population has {} neurons",
                N::POPULATION,
                id,
                self.neurons.len()
            ))
        })
    }

    /// Sum of the gating fractions of a receptor over a list of presynaptic neurons, at a given
    /// stage.
    fn gating_sum(&self, ids: &[usize], receptor: Receptor, stage: usize) -> f64 {
        ids.iter()
            .map(|&id| self.neurons[id].synaptic_gating(receptor, stage))
            .sum()
    }

    /// Store the results of a stage, one value per neuron.
    fn commit(&mut self, stage: usize, values: Vec<N::State>) {
        if self.neurons.len() >= MIN_PARALLEL_NEURONS {
            self.neurons
                .par_iter_mut()
                .zip(values.into_par_iter())
                .for_each(|(neuron, value)| neuron.store_stage(stage, value));
        } else {
            self.neurons
                .iter_mut()
                .zip_eq(values)
                .for_each(|(neuron, value)| neuron.store_stage(stage, value));
        }
    }

    fn combine(&mut self) {
        if self.neurons.len() >= MIN_PARALLEL_NEURONS {
            self.neurons.par_iter_mut().for_each(|neuron| neuron.combine());
        } else {
            self.neurons.iter_mut().for_each(|neuron| neuron.combine());
        }
    }
}

/// A thalamocortical network.
#[derive(Debug, Clone)]
pub struct Network {
    principal: Ensemble<PrincipalNeuron>,
    inhibitory: Ensemble<InhibitoryNeuron>,
    relay: Ensemble<RelayNeuron>,
    reticular: Ensemble<ReticularNeuron>,
}

impl Network {
    /// Create a network from explicit parameters and connectivity. Returns an error if the
    /// parameters and the connectivity do not describe the same populations.
    pub fn build_from(
        biophysics: &Biophysics,
        parameters: &NetworkParameters,
        connectivity: &Connectivity,
    ) -> Result<Self, CortexError> {
        connectivity.validate(&parameters.sizes())?;

        let network = Network {
            principal: Ensemble::build(
                biophysics.principal.clone(),
                &parameters.principal,
                &connectivity.principal,
            )?,
            inhibitory: Ensemble::build(
                biophysics.inhibitory.clone(),
                &parameters.inhibitory,
                &connectivity.inhibitory,
            )?,
            relay: Ensemble::build(
                biophysics.relay.clone(),
                &parameters.relay,
                &connectivity.relay,
            )?,
            reticular: Ensemble::build(
                biophysics.reticular.clone(),
                &parameters.reticular,
                &connectivity.reticular,
            )?,
        };

        log::info!(
            "Network built with {} neurons and {} connections",
            network.num_neurons(),
            connectivity.num_connections()
        );

        Ok(network)
    }

    /// Create a random network: sample the parameters of every neuron, then the connectivity, then
    /// the seeds of the noise sources if noise is enabled.
    pub fn rand<R: Rng + ?Sized>(
        config: &SimulationConfig,
        rng: &mut R,
    ) -> Result<Self, CortexError> {
        config.validate()?;
        let parameters = config.sampler.sample_network(&config.sizes, rng)?;
        let connectivity = Connectivity::sample(&config.sizes, &config.plan, rng)?;
        let mut network = Network::build_from(&config.biophysics, &parameters, &connectivity)?;

        if config.noise.enabled {
            network.attach_noise(config.noise.intensity, config.dt(), rng.gen());
        }

        Ok(network)
    }

    /// Create a random network seeded from the configuration, or from the system entropy if no seed
    /// is set.
    pub fn build(config: &SimulationConfig) -> Result<Self, CortexError> {
        let mut rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Network::rand(config, &mut rng)
    }

    /// Attach a noise source to every neuron.
    /// The neuron with global index `k` (populations taken in order) is seeded with `seed + k`.
    pub fn attach_noise(&mut self, intensity: f64, dt: f64, seed: u64) {
        fn attach<N: Neuron>(
            ensemble: &mut Ensemble<N>,
            intensity: f64,
            dt: f64,
            seed: u64,
        ) -> u64 {
            let mut seed = seed;
            for neuron in ensemble.neurons.iter_mut() {
                neuron.attach_noise(NoiseSource::new(intensity, dt, seed));
                seed = seed.wrapping_add(1);
            }
            seed
        }

        let seed = attach(&mut self.principal, intensity, dt, seed);
        let seed = attach(&mut self.inhibitory, intensity, dt, seed);
        let seed = attach(&mut self.relay, intensity, dt, seed);
        attach(&mut self.reticular, intensity, dt, seed);
    }

    pub fn principal(&self) -> &Ensemble<PrincipalNeuron> {
        &self.principal
    }

    pub fn inhibitory(&self) -> &Ensemble<InhibitoryNeuron> {
        &self.inhibitory
    }

    pub fn relay(&self) -> &Ensemble<RelayNeuron> {
        &self.relay
    }

    pub fn reticular(&self) -> &Ensemble<ReticularNeuron> {
        &self.reticular
    }

    /// Returns the number of neurons per population.
    pub fn sizes(&self) -> PopulationSizes {
        PopulationSizes::new(
            self.principal.len(),
            self.inhibitory.len(),
            self.relay.len(),
            self.reticular.len(),
        )
    }

    /// Returns the total number of neurons in the network.
    pub fn num_neurons(&self) -> usize {
        self.sizes().total()
    }

    /// Set the external input current (µA/cm²) of a neuron.
    pub fn set_input(
        &mut self,
        population: Population,
        id: usize,
        input: f64,
    ) -> Result<(), CortexError> {
        match population {
            Population::Principal => self.principal.neuron_mut(id)?.set_input(input),
            Population::Inhibitory => self.inhibitory.neuron_mut(id)?.set_input(input),
            Population::Relay => self.relay.neuron_mut(id)?.set_input(input),
            Population::Reticular => self.reticular.neuron_mut(id)?.set_input(input),
        }
        Ok(())
    }

    /// Set the membrane potential (mV) of a neuron, in all its compartments.
    /// Meant to set the initial condition of a run.
    pub fn set_potential(
        &mut self,
        population: Population,
        id: usize,
        v: f64,
    ) -> Result<(), CortexError> {
        match population {
            Population::Principal => self.principal.neuron_mut(id)?.reset_potential(v),
            Population::Inhibitory => self.inhibitory.neuron_mut(id)?.reset_potential(v),
            Population::Relay => self.relay.neuron_mut(id)?.reset_potential(v),
            Population::Reticular => self.reticular.neuron_mut(id)?.reset_potential(v),
        }
        Ok(())
    }

    /// Returns the (somatic) membrane potentials of a population.
    pub fn potentials(&self, population: Population) -> Vec<f64> {
        fn collect<N: Neuron>(ensemble: &Ensemble<N>) -> Vec<f64> {
            ensemble.neurons.iter().map(|n| N::potential(n.state())).collect()
        }

        match population {
            Population::Principal => collect(&self.principal),
            Population::Inhibitory => collect(&self.inhibitory),
            Population::Relay => collect(&self.relay),
            Population::Reticular => collect(&self.reticular),
        }
    }

    /// Returns the gating fractions of every neuron of a population.
    pub fn gating_fractions(&self, population: Population) -> Vec<Vec<f64>> {
        fn collect<N: Neuron>(ensemble: &Ensemble<N>) -> Vec<Vec<f64>> {
            ensemble.neurons.iter().map(|n| N::gating_fractions(n.state())).collect()
        }

        match population {
            Population::Principal => collect(&self.principal),
            Population::Inhibitory => collect(&self.inhibitory),
            Population::Relay => collect(&self.relay),
            Population::Reticular => collect(&self.reticular),
        }
    }

    /// Returns the accepted states of the principal neurons.
    pub fn principal_states(&self) -> Vec<PrincipalState> {
        self.principal.neurons.iter().map(|n| *n.state()).collect()
    }

    /// The synaptic drive of a neuron at a given stage, read from the slots of its afferents.
    pub fn synaptic_drive(&self, afferents: &Afferents, stage: usize) -> SynapticDrive {
        SynapticDrive {
            ampa: self.principal.gating_sum(&afferents.principal, Receptor::Ampa, stage)
                + self.relay.gating_sum(&afferents.relay, Receptor::Ampa, stage),
            nmda: self.principal.gating_sum(&afferents.principal, Receptor::Nmda, stage)
                + self.relay.gating_sum(&afferents.relay, Receptor::Nmda, stage),
            gaba: self.inhibitory.gating_sum(&afferents.inhibitory, Receptor::Gaba, stage)
                + self.reticular.gating_sum(&afferents.reticular, Receptor::Gaba, stage),
        }
    }

    /// The synaptic currents (AMPA, NMDA, GABA) of a neuron at its accepted state.
    pub fn synaptic_currents(
        &self,
        population: Population,
        id: usize,
    ) -> Result<[f64; 3], CortexError> {
        Ok(match population {
            Population::Principal => {
                let neuron = self.principal.neuron(id)?;
                let drive = self.synaptic_drive(neuron.afferents(), 0);
                PrincipalNeuron::synaptic_currents(
                    &self.principal.constants,
                    neuron.state(),
                    &drive,
                )
            }
            Population::Inhibitory => {
                let neuron = self.inhibitory.neuron(id)?;
                let drive = self.synaptic_drive(neuron.afferents(), 0);
                InhibitoryNeuron::synaptic_currents(
                    &self.inhibitory.constants,
                    neuron.state(),
                    &drive,
                )
            }
            Population::Relay => {
                let neuron = self.relay.neuron(id)?;
                let drive = self.synaptic_drive(neuron.afferents(), 0);
                RelayNeuron::synaptic_currents(&self.relay.constants, neuron.state(), &drive)
            }
            Population::Reticular => {
                let neuron = self.reticular.neuron(id)?;
                let drive = self.synaptic_drive(neuron.afferents(), 0);
                ReticularNeuron::synaptic_currents(
                    &self.reticular.constants,
                    neuron.state(),
                    &drive,
                )
            }
        })
    }

    /// Compute the results of a stage for all neurons of a population, without storing them.
    fn substeps<N: Neuron>(&self, ensemble: &Ensemble<N>, stage: usize, dt: f64) -> Vec<N::State> {
        let substep = |neuron: &N| {
            let drive = self.synaptic_drive(neuron.afferents(), stage);
            neuron.substep(&ensemble.constants, stage, dt, &drive)
        };

        if ensemble.neurons.len() >= MIN_PARALLEL_NEURONS {
            ensemble.neurons.par_iter().map(substep).collect()
        } else {
            ensemble.neurons.iter().map(substep).collect()
        }
    }

    /// Evaluate a stage for every neuron of the network.
    /// All neurons read the slots of the stage before any of them writes the next slot.
    pub(crate) fn evaluate_stage(&mut self, stage: usize, dt: f64) {
        let principal = self.substeps(&self.principal, stage, dt);
        let inhibitory = self.substeps(&self.inhibitory, stage, dt);
        let relay = self.substeps(&self.relay, stage, dt);
        let reticular = self.substeps(&self.reticular, stage, dt);

        self.principal.commit(stage, principal);
        self.inhibitory.commit(stage, inhibitory);
        self.relay.commit(stage, relay);
        self.reticular.commit(stage, reticular);
    }

    /// Combine the stages of every neuron of the network.
    pub(crate) fn combine(&mut self) {
        self.principal.combine();
        self.inhibitory.combine();
        self.relay.combine();
        self.reticular.combine();
    }
}
