//! Module defining the conductance-based neuron models.
//!
//! The four cell types share the same machinery: a [`History`] of their state over the current
//! step, the receives-from lists of their afferents, an external input current and an optional
//! noise source. They only differ by their state variables and by the currents entering their
//! derivative, which is what the [`Neuron`] trait asks for.
pub mod inhibitory;
pub mod noise;
pub mod principal;
pub mod relay;
pub mod reticular;

use serde::{Deserialize, Serialize};

use crate::connectivity::Afferents;
use crate::error::CortexError;
use crate::integrator::{euler_substep, History, StateVector};
use crate::population::Population;

pub use inhibitory::InhibitoryNeuron;
pub use noise::NoiseSource;
pub use principal::PrincipalNeuron;
pub use relay::RelayNeuron;
pub use reticular::ReticularNeuron;

/// Postsynaptic receptor types.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum Receptor {
    Ampa,
    Nmda,
    Gaba,
}

/// Total synaptic gating seen by a neuron at a given stage, summed over all its afferents.
#[derive(Debug, PartialEq, Clone, Copy, Default)]
pub struct SynapticDrive {
    /// Sum of the AMPA gating fractions of the excitatory afferents.
    pub ampa: f64,
    /// Sum of the NMDA gating fractions of the excitatory afferents.
    pub nmda: f64,
    /// Sum of the GABA gating fractions of the inhibitory afferents.
    pub gaba: f64,
}

/// The per-neuron data shared by all cell types.
#[derive(Debug, Clone)]
pub struct NeuronCore<S> {
    history: History<S>,
    afferents: Afferents,
    input: f64,
    noise: Option<NoiseSource>,
}

impl<S: StateVector> NeuronCore<S> {
    pub fn new(initial: S, afferents: Afferents) -> Self {
        NeuronCore {
            history: History::new(initial),
            afferents,
            input: 0.0,
            noise: None,
        }
    }
}

/// Check that a parameter vector has the arity of a population.
pub(crate) fn check_arity(population: Population, parameters: &[f64]) -> Result<(), CortexError> {
    if parameters.len() != population.arity() {
        return Err(CortexError::ParameterLength {
            population,
            expected: population.arity(),
            found: parameters.len(),
        });
    }
    Ok(())
}

/// A conductance-based neuron model.
pub trait Neuron: Send + Sync + Sized + Clone + std::fmt::Debug {
    /// The state variables of the model.
    type State: StateVector;
    /// The biophysical constants shared by the whole population.
    type Constants: Send + Sync + Clone + std::fmt::Debug;

    /// The population the model belongs to.
    const POPULATION: Population;

    /// Create a neuron from its heterogeneous parameters (see [`crate::sampler`]) and its
    /// afferents. Returns an error if the parameter vector does not have the arity of the
    /// population.
    fn build(
        parameters: &[f64],
        constants: &Self::Constants,
        afferents: Afferents,
    ) -> Result<Self, CortexError>;

    fn core(&self) -> &NeuronCore<Self::State>;

    fn core_mut(&mut self) -> &mut NeuronCore<Self::State>;

    /// The time derivative of the state, given the synaptic drive of the afferents.
    fn derivative(
        &self,
        constants: &Self::Constants,
        state: &Self::State,
        drive: &SynapticDrive,
    ) -> Self::State;

    /// The gating fraction of a receptor type released by the neuron; zero for receptors it does
    /// not target.
    fn release(state: &Self::State, receptor: Receptor) -> f64;

    /// The (somatic) membrane potential.
    fn potential(state: &Self::State) -> f64;

    /// Set the membrane potential of all compartments.
    fn set_potential(state: &mut Self::State, v: f64);

    /// The gating fractions of the state, i.e., the variables which should remain in [0, 1].
    fn gating_fractions(state: &Self::State) -> Vec<f64>;

    /// Returns the accepted state.
    fn state(&self) -> &Self::State {
        self.core().history.accepted()
    }

    /// Returns the history of the state over the current step.
    fn history(&self) -> &History<Self::State> {
        &self.core().history
    }

    /// Returns the receives-from lists of the neuron.
    fn afferents(&self) -> &Afferents {
        &self.core().afferents
    }

    /// Returns the external input current (µA/cm²).
    fn input(&self) -> f64 {
        self.core().input
    }

    /// Set the external input current (µA/cm²).
    fn set_input(&mut self, input: f64) {
        self.core_mut().input = input;
    }

    /// Returns the noise source of the neuron, if any.
    fn noise(&self) -> Option<&NoiseSource> {
        self.core().noise.as_ref()
    }

    /// Attach a noise source driving the membrane potential.
    fn attach_noise(&mut self, noise: NoiseSource) {
        self.core_mut().noise = Some(noise);
    }

    /// Reset the membrane potential, e.g., to set the initial condition of a run.
    fn reset_potential(&mut self, v: f64) {
        self.core_mut()
            .history
            .update_accepted(|state| Self::set_potential(state, v));
    }

    /// The gating fraction of a receptor at a given stage, as read by the postsynaptic neurons.
    fn synaptic_gating(&self, receptor: Receptor, stage: usize) -> f64 {
        Self::release(self.core().history.staged(stage), receptor)
    }

    /// Evaluate a stage, i.e., the Euler sub-step from the accepted state along the derivative at
    /// the staged state. The result is meant to be stored in slot `stage + 1`, once all neurons
    /// have evaluated the stage.
    fn substep(
        &self,
        constants: &Self::Constants,
        stage: usize,
        dt: f64,
        drive: &SynapticDrive,
    ) -> Self::State {
        let history = &self.core().history;
        let derivative = self.derivative(constants, history.staged(stage), drive);
        let mut next = euler_substep(history.accepted(), &derivative, stage, dt);
        if let Some(noise) = self.noise() {
            let v = Self::potential(&next) + noise.stage_increment(stage);
            Self::set_potential_of_soma(&mut next, v);
        }
        next
    }

    /// Store the result of a stage.
    fn store_stage(&mut self, stage: usize, value: Self::State) {
        self.core_mut().history.store_stage(stage, value);
    }

    /// Combine the stages into the new accepted state and advance the noise source.
    fn combine(&mut self) {
        let core = self.core_mut();
        core.history.combine();
        if let Some(noise) = core.noise.as_mut() {
            let increment = noise.combine_increment();
            noise.redraw();
            core.history.update_accepted(|state| {
                let v = Self::potential(state) + increment;
                Self::set_potential_of_soma(state, v);
            });
        }
    }

    /// Set the membrane potential of the compartment receiving the external input only.
    /// Defaults to [`Neuron::set_potential`] for single-compartment models.
    fn set_potential_of_soma(state: &mut Self::State, v: f64) {
        Self::set_potential(state, v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_arity() {
        assert!(check_arity(Population::Principal, &[-60.0, 0.1, 0.001]).is_ok());
        assert_eq!(
            check_arity(Population::Reticular, &[-60.0]),
            Err(CortexError::ParameterLength {
                population: Population::Reticular,
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_synaptic_drive_default() {
        let drive = SynapticDrive::default();
        assert_eq!(drive.ampa, 0.0);
        assert_eq!(drive.nmda, 0.0);
        assert_eq!(drive.gaba, 0.0);
    }
}
