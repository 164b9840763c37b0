//! Fast-spiking inhibitory interneuron, a single compartment with sodium and potassium spiking
//! currents.
use serde::{Deserialize, Serialize};

use super::{check_arity, Neuron, NeuronCore, Receptor, SynapticDrive};
use crate::channels::{
    exponential, instantaneous, linoid, ohmic, rate_kinetics, sigmoid, transmitter_release,
};
use crate::connectivity::Afferents;
use crate::error::CortexError;
use crate::population::Population;

crate::state_vector! {
    /// State of an inhibitory neuron.
    pub struct InhibitoryState {
        /// Membrane potential (mV).
        v,
        /// Sodium inactivation.
        h_na,
        /// Potassium activation.
        n_k,
        /// Fraction of open GABA receptors of the efferent synapses.
        s_gaba,
    }
}

/// Biophysical constants of the inhibitory population.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct InhibitoryConstants {
    /// Membrane capacitance (µF/cm²).
    pub c_m: f64,
    /// Membrane area (cm²).
    pub area: f64,
    pub e_k: f64,
    pub e_na: f64,
    pub e_ampa: f64,
    pub e_nmda: f64,
    pub e_gaba: f64,
    pub g_na: f64,
    pub g_k: f64,
    /// Maximal synaptic conductances (mS).
    pub g_ampa: f64,
    pub g_nmda: f64,
    pub g_gaba: f64,
    /// Decay time constant of the GABA gating (ms).
    pub tau_gaba: f64,
    /// Maximal transmitter release rate.
    pub release_gain: f64,
}

impl Default for InhibitoryConstants {
    fn default() -> Self {
        InhibitoryConstants {
            c_m: 1.0,
            area: 20E-5,
            e_k: -90.0,
            e_na: 55.0,
            e_ampa: 0.0,
            e_nmda: 0.0,
            e_gaba: -70.0,
            g_na: 35.0,
            g_k: 9.0,
            g_ampa: 2.25E-6,
            g_nmda: 0.5E-6,
            g_gaba: 0.165E-6,
            tau_gaba: 10.0,
            release_gain: 1.0,
        }
    }
}

/// An inhibitory interneuron.
#[derive(Debug, Clone)]
pub struct InhibitoryNeuron {
    e_l: f64,
    g_l: f64,
    core: NeuronCore<InhibitoryState>,
}

impl InhibitoryNeuron {
    /// Leak reversal potential (mV).
    pub fn e_l(&self) -> f64 {
        self.e_l
    }

    /// Leak conductance (mS/cm²).
    pub fn g_l(&self) -> f64 {
        self.g_l
    }

    pub fn i_l(&self, state: &InhibitoryState) -> f64 {
        ohmic(self.g_l, 1.0, state.v, self.e_l)
    }

    pub fn i_na(constants: &InhibitoryConstants, state: &InhibitoryState) -> f64 {
        let alpha = linoid(state.v, 0.5, 35.0, 10.0);
        let beta = exponential(state.v, 20.0, 60.0, 18.0);
        let m = instantaneous(alpha, beta);
        ohmic(constants.g_na, m * m * m * state.h_na, state.v, constants.e_na)
    }

    pub fn i_k(constants: &InhibitoryConstants, state: &InhibitoryState) -> f64 {
        let n2 = state.n_k * state.n_k;
        ohmic(constants.g_k, n2 * n2, state.v, constants.e_k)
    }

    /// Synaptic currents (AMPA, NMDA, GABA) in µA, i.e., not normalized by the membrane area.
    pub fn synaptic_currents(
        constants: &InhibitoryConstants,
        state: &InhibitoryState,
        drive: &SynapticDrive,
    ) -> [f64; 3] {
        [
            ohmic(constants.g_ampa, drive.ampa, state.v, constants.e_ampa),
            ohmic(constants.g_nmda, drive.nmda, state.v, constants.e_nmda),
            ohmic(constants.g_gaba, drive.gaba, state.v, constants.e_gaba),
        ]
    }
}

impl Neuron for InhibitoryNeuron {
    type State = InhibitoryState;
    type Constants = InhibitoryConstants;

    const POPULATION: Population = Population::Inhibitory;

    /// Build an inhibitory neuron from `[E_L, g_L]`, at rest with all gates closed.
    fn build(
        parameters: &[f64],
        _constants: &InhibitoryConstants,
        afferents: Afferents,
    ) -> Result<Self, CortexError> {
        check_arity(Self::POPULATION, parameters)?;
        let (e_l, g_l) = (parameters[0], parameters[1]);
        let initial = InhibitoryState {
            v: e_l,
            ..Default::default()
        };
        Ok(InhibitoryNeuron {
            e_l,
            g_l,
            core: NeuronCore::new(initial, afferents),
        })
    }

    fn core(&self) -> &NeuronCore<InhibitoryState> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NeuronCore<InhibitoryState> {
        &mut self.core
    }

    fn derivative(
        &self,
        constants: &InhibitoryConstants,
        state: &InhibitoryState,
        drive: &SynapticDrive,
    ) -> InhibitoryState {
        let v = state.v;
        let ionic = self.i_l(state) + Self::i_na(constants, state) + Self::i_k(constants, state);
        let [i_ampa, i_nmda, i_gaba] = Self::synaptic_currents(constants, state, drive);

        InhibitoryState {
            v: 1.0 / constants.c_m
                * (-ionic - (i_ampa + i_nmda + i_gaba) / constants.area + self.input()),
            h_na: rate_kinetics(
                state.h_na,
                exponential(v, 0.35, 58.0, 20.0),
                5.0 * sigmoid(v, 28.0, 10.0),
            ),
            n_k: rate_kinetics(
                state.n_k,
                linoid(v, 0.05, 34.0, 10.0),
                exponential(v, 0.625, 44.0, 80.0),
            ),
            s_gaba: transmitter_release(v, constants.release_gain) * (1.0 - state.s_gaba)
                - state.s_gaba / constants.tau_gaba,
        }
    }

    fn release(state: &InhibitoryState, receptor: Receptor) -> f64 {
        match receptor {
            Receptor::Gaba => state.s_gaba,
            Receptor::Ampa | Receptor::Nmda => 0.0,
        }
    }

    fn potential(state: &InhibitoryState) -> f64 {
        state.v
    }

    fn set_potential(state: &mut InhibitoryState, v: f64) {
        state.v = v;
    }

    fn gating_fractions(state: &InhibitoryState) -> Vec<f64> {
        vec![state.h_na, state.n_k, state.s_gaba]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn neuron() -> InhibitoryNeuron {
        InhibitoryNeuron::build(
            &[-63.8, 102.5E-3],
            &InhibitoryConstants::default(),
            Afferents::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_build() {
        let neuron = neuron();
        assert_eq!(neuron.state().v, -63.8);
        assert_eq!(neuron.state().h_na, 0.0);
        assert_eq!(neuron.input(), 0.0);
        assert!(neuron.noise().is_none());

        assert_eq!(
            InhibitoryNeuron::build(&[-63.8], &InhibitoryConstants::default(), Afferents::default())
                .err(),
            Some(CortexError::ParameterLength {
                population: Population::Inhibitory,
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_rest_with_closed_gates() {
        // at the leak reversal with all gates closed, only the gates move
        let constants = InhibitoryConstants::default();
        let neuron = neuron();
        let derivative = neuron.derivative(&constants, neuron.state(), &SynapticDrive::default());
        assert_eq!(derivative.v, 0.0);
        assert!(derivative.h_na > 0.0);
        assert!(derivative.n_k > 0.0);
        assert!(derivative.s_gaba > 0.0);
    }

    #[test]
    fn test_input_depolarizes() {
        let constants = InhibitoryConstants::default();
        let mut neuron = neuron();
        neuron.set_input(1.5);
        let derivative = neuron.derivative(&constants, neuron.state(), &SynapticDrive::default());
        assert_relative_eq!(derivative.v, 1.5);
    }

    #[test]
    fn test_synaptic_currents() {
        let constants = InhibitoryConstants::default();
        let state = InhibitoryState {
            v: -60.0,
            ..Default::default()
        };
        assert_eq!(
            InhibitoryNeuron::synaptic_currents(&constants, &state, &SynapticDrive::default()),
            [0.0, 0.0, 0.0]
        );

        let drive = SynapticDrive { ampa: 2.0, nmda: 1.0, gaba: 3.0 };
        let [i_ampa, i_nmda, i_gaba] =
            InhibitoryNeuron::synaptic_currents(&constants, &state, &drive);
        assert_relative_eq!(i_ampa, 2.25E-6 * 2.0 * -60.0);
        assert_relative_eq!(i_nmda, 0.5E-6 * -60.0);
        assert_relative_eq!(i_gaba, 0.165E-6 * 3.0 * 10.0);
    }

    #[test]
    fn test_release() {
        let state = InhibitoryState {
            s_gaba: 0.3,
            ..Default::default()
        };
        assert_eq!(InhibitoryNeuron::release(&state, Receptor::Gaba), 0.3);
        assert_eq!(InhibitoryNeuron::release(&state, Receptor::Ampa), 0.0);
    }
}
