//! Thalamic reticular cell, the inhibitory counterpart of the relay cell.
use serde::{Deserialize, Serialize};

use super::{check_arity, Neuron, NeuronCore, Receptor, SynapticDrive};
use crate::channels::{
    exponential, instantaneous, linoid, ohmic, rate_kinetics, relaxation, sigmoid, thalamic,
    transmitter_release,
};
use crate::connectivity::Afferents;
use crate::error::CortexError;
use crate::population::Population;

crate::state_vector! {
    /// State of a reticular neuron.
    pub struct ReticularState {
        /// Membrane potential (mV).
        v,
        h_na,
        m_na,
        n_k,
        /// T-type calcium inactivation.
        h_ca,
        /// T-type calcium activation.
        m_ca,
        /// Fraction of open GABA receptors of the efferent synapses.
        s_gaba,
    }
}

/// Biophysical constants of the reticular population.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ReticularConstants {
    /// Membrane capacitance (µF/cm²).
    pub c_m: f64,
    pub e_k: f64,
    pub e_na: f64,
    pub e_ca: f64,
    pub e_ampa: f64,
    pub e_nmda: f64,
    pub e_gaba: f64,
    /// Potassium leak conductance (mS/cm²).
    pub g_lk: f64,
    pub g_na: f64,
    pub g_k: f64,
    pub g_ca: f64,
    pub g_ampa: f64,
    pub g_nmda: f64,
    pub g_gaba: f64,
    pub tau_gaba: f64,
    /// Maximal transmitter release rate.
    pub release_gain: f64,
}

impl Default for ReticularConstants {
    fn default() -> Self {
        ReticularConstants {
            c_m: 1.0,
            e_k: -90.0,
            e_na: 55.0,
            e_ca: 55.0,
            e_ampa: 0.0,
            e_nmda: 0.0,
            e_gaba: -70.0,
            g_lk: 102.5E-3,
            g_na: 35.0,
            g_k: 9.0,
            g_ca: 35.0,
            g_ampa: 2.25E-6,
            g_nmda: 0.5E-6,
            g_gaba: 0.165E-6,
            tau_gaba: 10.0,
            release_gain: 1.0,
        }
    }
}

/// A thalamic reticular neuron.
#[derive(Debug, Clone)]
pub struct ReticularNeuron {
    e_l: f64,
    g_l: f64,
    core: NeuronCore<ReticularState>,
}

impl ReticularNeuron {
    /// Leak reversal potential (mV).
    pub fn e_l(&self) -> f64 {
        self.e_l
    }

    /// Leak conductance (mS/cm²).
    pub fn g_l(&self) -> f64 {
        self.g_l
    }

    /// Sum of the ionic currents (µA/cm²).
    pub fn ionic_current(&self, constants: &ReticularConstants, state: &ReticularState) -> f64 {
        let v = state.v;
        let m_na = instantaneous(linoid(v, 0.1, 33.0, 10.0), exponential(v, 4.0, 53.7, 12.0));
        let m_ca = sigmoid(v, 20.0, 9.0);
        let n2 = state.n_k * state.n_k;

        ohmic(self.g_l, 1.0, v, self.e_l)
            + ohmic(constants.g_lk, 1.0, v, constants.e_k)
            + ohmic(constants.g_na, m_na * m_na * m_na * state.h_na, v, constants.e_na)
            + ohmic(constants.g_k, n2 * n2, v, constants.e_k)
            + ohmic(constants.g_ca, m_ca * m_ca, v, constants.e_ca)
    }

    /// Synaptic currents (AMPA, NMDA, GABA).
    pub fn synaptic_currents(
        constants: &ReticularConstants,
        state: &ReticularState,
        drive: &SynapticDrive,
    ) -> [f64; 3] {
        [
            ohmic(constants.g_ampa, drive.ampa, state.v, constants.e_ampa),
            ohmic(constants.g_nmda, drive.nmda, state.v, constants.e_nmda),
            ohmic(constants.g_gaba, drive.gaba, state.v, constants.e_gaba),
        ]
    }
}

impl Neuron for ReticularNeuron {
    type State = ReticularState;
    type Constants = ReticularConstants;

    const POPULATION: Population = Population::Reticular;

    /// Build a reticular neuron from `[E_L, g_L]`, at rest with all gates closed.
    fn build(
        parameters: &[f64],
        _constants: &ReticularConstants,
        afferents: Afferents,
    ) -> Result<Self, CortexError> {
        check_arity(Self::POPULATION, parameters)?;
        let (e_l, g_l) = (parameters[0], parameters[1]);
        let initial = ReticularState {
            v: e_l,
            ..Default::default()
        };
        Ok(ReticularNeuron {
            e_l,
            g_l,
            core: NeuronCore::new(initial, afferents),
        })
    }

    fn core(&self) -> &NeuronCore<ReticularState> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NeuronCore<ReticularState> {
        &mut self.core
    }

    fn derivative(
        &self,
        constants: &ReticularConstants,
        state: &ReticularState,
        drive: &SynapticDrive,
    ) -> ReticularState {
        let v = state.v;
        let [i_ampa, i_nmda, i_gaba] = Self::synaptic_currents(constants, state, drive);
        let tau_m_ca = (3.0 + 1.0 / (((v + 27.0) / 10.0).exp() + (-(v + 102.0) / 15.0).exp()))
            / 5.0_f64.powf(1.2);
        let tau_h_ca = (85.0 + 1.0 / (((v + 48.0) / 4.0).exp() + (-(v + 407.0) / 50.0).exp()))
            / 3.0_f64.powf(1.2);

        ReticularState {
            v: 1.0 / constants.c_m
                * (-self.ionic_current(constants, state) - (i_ampa + i_nmda + i_gaba)
                    + self.input()),
            h_na: rate_kinetics(state.h_na, thalamic::alpha_h_na(v), thalamic::beta_h_na(v)),
            m_na: rate_kinetics(state.m_na, thalamic::alpha_m_na(v), thalamic::beta_m_na(v)),
            n_k: rate_kinetics(state.n_k, thalamic::alpha_n_k(v), thalamic::beta_n_k(v)),
            h_ca: relaxation(state.h_ca, sigmoid(v, 80.0, -5.0), tau_h_ca),
            m_ca: relaxation(state.m_ca, sigmoid(v, 52.0, 7.4), tau_m_ca),
            s_gaba: transmitter_release(v, constants.release_gain) * (1.0 - state.s_gaba)
                - state.s_gaba / constants.tau_gaba,
        }
    }

    fn release(state: &ReticularState, receptor: Receptor) -> f64 {
        match receptor {
            Receptor::Gaba => state.s_gaba,
            Receptor::Ampa | Receptor::Nmda => 0.0,
        }
    }

    fn potential(state: &ReticularState) -> f64 {
        state.v
    }

    fn set_potential(state: &mut ReticularState, v: f64) {
        state.v = v;
    }

    fn gating_fractions(state: &ReticularState) -> Vec<f64> {
        vec![
            state.h_na,
            state.m_na,
            state.n_k,
            state.h_ca,
            state.m_ca,
            state.s_gaba,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn neuron() -> ReticularNeuron {
        ReticularNeuron::build(
            &[-63.8, 102.5E-3],
            &ReticularConstants::default(),
            Afferents::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_potassium_leak_at_rest() {
        // at the leak reversal with closed gates, only the potassium leak and the calcium current
        // remain
        let constants = ReticularConstants::default();
        let neuron = neuron();
        let state = *neuron.state();
        let m_ca = sigmoid(-63.8, 20.0, 9.0);
        assert_relative_eq!(
            neuron.ionic_current(&constants, &state),
            102.5E-3 * (-63.8 + 90.0) + 35.0 * m_ca * m_ca * (-63.8 - 55.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_gaba_release() {
        let constants = ReticularConstants::default();
        let neuron = neuron();
        let mut state = *neuron.state();
        state.v = 20.0;
        let derivative = neuron.derivative(&constants, &state, &SynapticDrive::default());
        assert_relative_eq!(derivative.s_gaba, 0.5);
        assert_eq!(ReticularNeuron::release(&state, Receptor::Nmda), 0.0);
    }

    #[test]
    fn test_inhibition_hyperpolarizes() {
        // the leak reversal lies above the GABA reversal
        let constants = ReticularConstants::default();
        let neuron = neuron();
        let state = *neuron.state();
        let free = neuron.derivative(&constants, &state, &SynapticDrive::default());
        let inhibited = neuron.derivative(
            &constants,
            &state,
            &SynapticDrive { ampa: 0.0, nmda: 0.0, gaba: 1E4 },
        );
        assert!(inhibited.v < free.v);
        assert_relative_eq!(free.v - inhibited.v, 0.165E-6 * 1E4 * 6.2, epsilon = 1e-9);
    }
}
