//! Thalamocortical relay cell.
//!
//! A single compartment with leak, potassium leak, fast sodium, delayed rectifier and
//! high-threshold calcium currents. The kinetics of the low-threshold calcium (T-type), A-type and
//! hyperpolarization-activated channels are integrated and exposed as gating fractions, but they do
//! not enter the membrane equation. Synaptic currents are not normalized by a membrane area.
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
    /// State of a relay neuron.
    pub struct RelayState {
        /// Membrane potential (mV).
        v,
        h_na,
        m_na,
        n_k,
        /// T-type calcium inactivation.
        h_ca,
        /// T-type calcium activation.
        m_ca,
        /// A-type potassium inactivation.
        h_a,
        /// A-type potassium activation.
        m_a,
        /// Hyperpolarization-activated cation channel activation.
        m_h,
        /// Protein-bound hyperpolarization-activated channel activation.
        m_h2,
        s_ampa,
        s_nmda,
        x_nmda,
    }
}

/// Biophysical constants of the relay population.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct RelayConstants {
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
    pub tau_ampa: f64,
    pub tau_nmda: f64,
    pub tau_x: f64,
    /// Maximal transmitter release rate.
    pub release_gain: f64,
    /// Rate of the NMDA gating driven by the auxiliary variable.
    pub nmda_gain: f64,
}

impl Default for RelayConstants {
    fn default() -> Self {
        RelayConstants {
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
            tau_ampa: 10.0,
            tau_nmda: 100.0,
            tau_x: 2.0,
            release_gain: 3.48,
            nmda_gain: 0.5,
        }
    }
}

/// Steady states and time constants of the slow thalamic channels.
fn slow_kinetics(v: f64) -> [(f64, f64); 5] {
    let tau_m_ca = (1.0 / ((-(v + 131.6) / 16.7).exp() + ((v + 16.8) / 18.2).exp()) + 0.612)
        / 3.55_f64.powf(1.2);
    let tau_h_ca = (30.8
        + (211.4 + ((v + 2.0 + 113.2) / 5.0).exp()) / (1.0 + ((v + 2.0 + 84.0) / 3.2).exp()))
        / 3.0_f64.powf(1.2);
    let tau_m_a = (1.0 / (((v + 35.82) / 19.69).exp() + (-(v + 79.69) / 12.7).exp()) + 0.37)
        / 3.0_f64.powf(1.25);
    let tau_h_a = if v >= -63.0 {
        19.0 / 3.0_f64.powf(1.25)
    } else {
        1.0 / (((v + 46.05) / 5.0).exp() + (-(v + 238.4) / 37.45).exp()) / 3.0_f64.powf(1.25)
    };
    let tau_m_h = 20.0 + 1000.0 / (((v + 71.5) / 14.2).exp() + (-(v + 89.0) / 11.6).exp());

    [
        (sigmoid(v, 59.0, 6.2), tau_m_ca),
        (sigmoid(v, 83.0, -4.0), tau_h_ca),
        (sigmoid(v, 60.0, 8.5), tau_m_a),
        (sigmoid(v, 78.0, -6.0), tau_h_a),
        (sigmoid(v, 75.0, -5.5), tau_m_h),
    ]
}

/// A thalamocortical relay neuron.
#[derive(Debug, Clone)]
pub struct RelayNeuron {
    e_l: f64,
    g_l: f64,
    core: NeuronCore<RelayState>,
}

impl RelayNeuron {
    /// Leak reversal potential (mV).
    pub fn e_l(&self) -> f64 {
        self.e_l
    }

    /// Leak conductance (mS/cm²).
    pub fn g_l(&self) -> f64 {
        self.g_l
    }

    pub fn i_l(&self, state: &RelayState) -> f64 {
        ohmic(self.g_l, 1.0, state.v, self.e_l)
    }

    pub fn i_lk(constants: &RelayConstants, state: &RelayState) -> f64 {
        ohmic(constants.g_lk, 1.0, state.v, constants.e_k)
    }

    /// Fast sodium current, with instantaneous activation.
    pub fn i_na(constants: &RelayConstants, state: &RelayState) -> f64 {
        let alpha = linoid(state.v, 0.1, 33.0, 10.0);
        let beta = exponential(state.v, 4.0, 53.7, 12.0);
        let m = instantaneous(alpha, beta);
        ohmic(constants.g_na, m * m * m * state.h_na, state.v, constants.e_na)
    }

    pub fn i_k(constants: &RelayConstants, state: &RelayState) -> f64 {
        let n2 = state.n_k * state.n_k;
        ohmic(constants.g_k, n2 * n2, state.v, constants.e_k)
    }

    /// High-threshold calcium current, with instantaneous activation.
    pub fn i_ca(constants: &RelayConstants, state: &RelayState) -> f64 {
        let m = sigmoid(state.v, 20.0, 9.0);
        ohmic(constants.g_ca, m * m, state.v, constants.e_ca)
    }

    /// Synaptic currents (AMPA, NMDA, GABA).
    pub fn synaptic_currents(
        constants: &RelayConstants,
        state: &RelayState,
        drive: &SynapticDrive,
    ) -> [f64; 3] {
        [
            ohmic(constants.g_ampa, drive.ampa, state.v, constants.e_ampa),
            ohmic(constants.g_nmda, drive.nmda, state.v, constants.e_nmda),
            ohmic(constants.g_gaba, drive.gaba, state.v, constants.e_gaba),
        ]
    }
}

impl Neuron for RelayNeuron {
    type State = RelayState;
    type Constants = RelayConstants;

    const POPULATION: Population = Population::Relay;

    /// Build a relay neuron from `[E_L, g_L]`, at rest with all gates closed.
    fn build(
        parameters: &[f64],
        _constants: &RelayConstants,
        afferents: Afferents,
    ) -> Result<Self, CortexError> {
        check_arity(Self::POPULATION, parameters)?;
        let (e_l, g_l) = (parameters[0], parameters[1]);
        let initial = RelayState {
            v: e_l,
            ..Default::default()
        };
        Ok(RelayNeuron {
            e_l,
            g_l,
            core: NeuronCore::new(initial, afferents),
        })
    }

    fn core(&self) -> &NeuronCore<RelayState> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NeuronCore<RelayState> {
        &mut self.core
    }

    fn derivative(
        &self,
        constants: &RelayConstants,
        state: &RelayState,
        drive: &SynapticDrive,
    ) -> RelayState {
        let v = state.v;
        let ionic = self.i_l(state)
            + Self::i_lk(constants, state)
            + Self::i_na(constants, state)
            + Self::i_k(constants, state)
            + Self::i_ca(constants, state);
        let [i_ampa, i_nmda, i_gaba] = Self::synaptic_currents(constants, state, drive);
        let [m_ca, h_ca, m_a, h_a, m_h] = slow_kinetics(v);
        let release = transmitter_release(v, constants.release_gain);

        RelayState {
            v: 1.0 / constants.c_m * (-ionic - (i_ampa + i_nmda + i_gaba) + self.input()),
            h_na: rate_kinetics(state.h_na, thalamic::alpha_h_na(v), thalamic::beta_h_na(v)),
            m_na: rate_kinetics(state.m_na, thalamic::alpha_m_na(v), thalamic::beta_m_na(v)),
            n_k: rate_kinetics(state.n_k, thalamic::alpha_n_k(v), thalamic::beta_n_k(v)),
            h_ca: relaxation(state.h_ca, h_ca.0, h_ca.1),
            m_ca: relaxation(state.m_ca, m_ca.0, m_ca.1),
            h_a: relaxation(state.h_a, h_a.0, h_a.1),
            m_a: relaxation(state.m_a, m_a.0, m_a.1),
            m_h: relaxation(state.m_h, m_h.0, m_h.1),
            m_h2: relaxation(state.m_h2, m_h.0, m_h.1),
            s_ampa: release * (1.0 - state.s_ampa) - state.s_ampa / constants.tau_ampa,
            s_nmda: constants.nmda_gain * state.x_nmda * (1.0 - state.s_nmda)
                - state.s_nmda / constants.tau_nmda,
            x_nmda: release - state.x_nmda / constants.tau_x,
        }
    }

    fn release(state: &RelayState, receptor: Receptor) -> f64 {
        match receptor {
            Receptor::Ampa => state.s_ampa,
            Receptor::Nmda => state.s_nmda,
            Receptor::Gaba => 0.0,
        }
    }

    fn potential(state: &RelayState) -> f64 {
        state.v
    }

    fn set_potential(state: &mut RelayState, v: f64) {
        state.v = v;
    }

    fn gating_fractions(state: &RelayState) -> Vec<f64> {
        vec![
            state.h_na,
            state.m_na,
            state.n_k,
            state.h_ca,
            state.m_ca,
            state.h_a,
            state.m_a,
            state.m_h,
            state.m_h2,
            state.s_ampa,
            state.s_nmda,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_slow_kinetics() {
        for v in [-100.0, -80.0, -63.0, -62.9, -40.0, 0.0, 30.0] {
            for (x_inf, tau) in slow_kinetics(v) {
                assert!((0.0..=1.0).contains(&x_inf));
                assert!(tau > 0.0 && tau.is_finite());
            }
        }
        // the A-type inactivation time constant is constant above -63 mV
        assert_eq!(slow_kinetics(-63.0)[3].1, slow_kinetics(0.0)[3].1);
        assert_relative_eq!(slow_kinetics(-75.0)[4].0, 0.5);
    }

    #[test]
    fn test_leak_currents() {
        let constants = RelayConstants::default();
        let neuron =
            RelayNeuron::build(&[-65.0, 0.1], &constants, Afferents::default()).unwrap();
        let state = RelayState {
            v: -90.0,
            ..Default::default()
        };
        assert_eq!(RelayNeuron::i_lk(&constants, &state), 0.0);
        assert_relative_eq!(neuron.i_l(&state), 0.1 * -25.0);
    }

    #[test]
    fn test_unscaled_synaptic_currents() {
        let constants = RelayConstants {
            g_na: 0.0,
            g_k: 0.0,
            g_ca: 0.0,
            g_lk: 0.0,
            ..RelayConstants::default()
        };
        let neuron =
            RelayNeuron::build(&[-70.0, 0.0], &constants, Afferents::default()).unwrap();
        let drive = SynapticDrive { ampa: 1E5, nmda: 0.0, gaba: 0.0 };
        let derivative = neuron.derivative(&constants, neuron.state(), &drive);
        assert_relative_eq!(derivative.v, -(2.25E-6 * 1E5 * -70.0));
    }

    #[test]
    fn test_build_rejects_principal_parameters() {
        assert!(RelayNeuron::build(
            &[-63.8, 0.1, 1E-3],
            &RelayConstants::default(),
            Afferents::default()
        )
        .is_err());
    }
}
