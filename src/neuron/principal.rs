//! Two-compartment principal (pyramidal) cell.
//!
//! The soma carries the spiking currents (fast sodium, delayed rectifier, A-type, slow and
//! sodium-dependent potassium), the dendrite carries the slow currents (high-threshold calcium,
//! calcium-dependent potassium, persistent sodium, anomalous rectifier). Both compartments are
//! coupled by a somato-dendritic conductance. Excitatory synapses target the dendrite, inhibitory
//! synapses target the soma.
use serde::{Deserialize, Serialize};

use super::{check_arity, Neuron, NeuronCore, Receptor, SynapticDrive};
use crate::channels::{
    exponential, instantaneous, linoid, ohmic, rate_kinetics, relaxation, sigmoid,
    sodium_dependent_activation, sodium_pump, transmitter_release,
};
use crate::connectivity::Afferents;
use crate::error::CortexError;
use crate::population::Population;

crate::state_vector! {
    /// State of a principal neuron.
    pub struct PrincipalState {
        /// Somatic membrane potential (mV).
        vs,
        /// Dendritic membrane potential (mV).
        vd,
        /// Intracellular calcium concentration (µM).
        ca,
        /// Intracellular sodium concentration (mM).
        na,
        /// Sodium inactivation.
        h_na,
        /// Potassium activation.
        n_k,
        /// A-type potassium inactivation.
        h_a,
        /// Slow potassium activation.
        m_ks,
        /// Fraction of open AMPA receptors of the efferent synapses.
        s_ampa,
        /// Fraction of open NMDA receptors of the efferent synapses.
        s_nmda,
        /// Auxiliary NMDA gating variable.
        x_nmda,
    }
}

/// Biophysical constants of the principal population.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct PrincipalConstants {
    /// Membrane capacitance (µF/cm²).
    pub c_m: f64,
    /// Somatic area (cm²).
    pub area_soma: f64,
    /// Dendritic area (cm²).
    pub area_dendrite: f64,
    pub e_na: f64,
    pub e_k: f64,
    pub e_ca: f64,
    pub e_ampa: f64,
    pub e_nmda: f64,
    pub e_gaba: f64,
    pub g_na: f64,
    pub g_k: f64,
    pub g_a: f64,
    pub g_ks: f64,
    pub g_kna: f64,
    pub g_ca: f64,
    pub g_kca: f64,
    pub g_nap: f64,
    pub g_ar: f64,
    /// Maximal synaptic conductances (mS).
    pub g_ampa: f64,
    pub g_nmda: f64,
    pub g_gaba: f64,
    /// Time constant of the A-type inactivation (ms).
    pub tau_a: f64,
    pub tau_ampa: f64,
    pub tau_nmda: f64,
    pub tau_x: f64,
    /// Calcium removal time constant (ms).
    pub tau_ca: f64,
    /// Calcium influx per unit of calcium current.
    pub alpha_ca: f64,
    /// Sodium influx per unit of sodium current.
    pub alpha_na: f64,
    /// Maximal sodium pump rate (mM/ms).
    pub r_pump: f64,
    /// Resting sodium concentration (mM).
    pub na_0: f64,
    /// Calcium dissociation constant of the calcium-dependent potassium channel (µM).
    pub k_d: f64,
    /// Maximal transmitter release rate.
    pub release_gain: f64,
    /// Rate of the NMDA gating driven by the auxiliary variable.
    pub nmda_gain: f64,
}

impl Default for PrincipalConstants {
    fn default() -> Self {
        PrincipalConstants {
            c_m: 1.0,
            area_soma: 15E-5,
            area_dendrite: 35E-5,
            e_na: 55.0,
            e_k: -100.0,
            e_ca: 120.0,
            e_ampa: 0.0,
            e_nmda: 0.0,
            e_gaba: -70.0,
            g_na: 50.0,
            g_k: 10.5,
            g_a: 1.0,
            g_ks: 0.576,
            g_kna: 1.33,
            g_ca: 0.43,
            g_kca: 0.57,
            g_nap: 0.0686,
            g_ar: 0.0257,
            g_ampa: 5.4E-6,
            g_nmda: 0.9E-6,
            g_gaba: 4.15E-6,
            tau_a: 15.0,
            tau_ampa: 2.0,
            tau_nmda: 100.0,
            tau_x: 2.0,
            tau_ca: 150.0,
            alpha_ca: 0.005,
            alpha_na: 0.01,
            r_pump: 0.018,
            na_0: 9.5,
            k_d: 30.0,
            release_gain: 3.48,
            nmda_gain: 0.5,
        }
    }
}

/// A principal neuron.
#[derive(Debug, Clone)]
pub struct PrincipalNeuron {
    e_l: f64,
    g_l: f64,
    g_sd: f64,
    core: NeuronCore<PrincipalState>,
}

impl PrincipalNeuron {
    /// Leak reversal potential (mV).
    pub fn e_l(&self) -> f64 {
        self.e_l
    }

    /// Leak conductance (mS/cm²).
    pub fn g_l(&self) -> f64 {
        self.g_l
    }

    /// Somato-dendritic coupling conductance (mS).
    pub fn g_sd(&self) -> f64 {
        self.g_sd
    }

    pub fn i_l(&self, state: &PrincipalState) -> f64 {
        ohmic(self.g_l, 1.0, state.vs, self.e_l)
    }

    pub fn i_sd(&self, state: &PrincipalState) -> f64 {
        ohmic(self.g_sd, 1.0, state.vs, state.vd)
    }

    pub fn i_na(constants: &PrincipalConstants, state: &PrincipalState) -> f64 {
        let alpha = linoid(state.vs, 0.1, 33.0, 10.0);
        let beta = exponential(state.vs, 4.0, 53.7, 12.0);
        let m = instantaneous(alpha, beta);
        ohmic(constants.g_na, m * m * m * state.h_na, state.vs, constants.e_na)
    }

    pub fn i_k(constants: &PrincipalConstants, state: &PrincipalState) -> f64 {
        let n2 = state.n_k * state.n_k;
        ohmic(constants.g_k, n2 * n2, state.vs, constants.e_k)
    }

    pub fn i_a(constants: &PrincipalConstants, state: &PrincipalState) -> f64 {
        let m = sigmoid(state.vs, 50.0, 20.0);
        ohmic(constants.g_a, m * m * m * state.h_a, state.vs, constants.e_k)
    }

    pub fn i_ks(constants: &PrincipalConstants, state: &PrincipalState) -> f64 {
        ohmic(constants.g_ks, state.m_ks, state.vs, constants.e_k)
    }

    pub fn i_kna(constants: &PrincipalConstants, state: &PrincipalState) -> f64 {
        ohmic(
            constants.g_kna,
            sodium_dependent_activation(state.na),
            state.vs,
            constants.e_k,
        )
    }

    pub fn i_ca(constants: &PrincipalConstants, state: &PrincipalState) -> f64 {
        let m = sigmoid(state.vd, 20.0, 9.0);
        ohmic(constants.g_ca, m * m, state.vd, constants.e_ca)
    }

    pub fn i_kca(constants: &PrincipalConstants, state: &PrincipalState) -> f64 {
        let m = state.ca / (state.ca + constants.k_d);
        ohmic(constants.g_kca, m, state.vd, constants.e_k)
    }

    pub fn i_nap(constants: &PrincipalConstants, state: &PrincipalState) -> f64 {
        let m = sigmoid(state.vd, 55.7, 7.7);
        ohmic(constants.g_nap, m * m * m, state.vd, constants.e_na)
    }

    pub fn i_ar(constants: &PrincipalConstants, state: &PrincipalState) -> f64 {
        let h = sigmoid(state.vd, 75.0, -4.0);
        ohmic(constants.g_ar, h, state.vd, constants.e_k)
    }

    /// Synaptic currents (AMPA, NMDA, GABA) in µA, i.e., not normalized by the compartment areas.
    /// AMPA and NMDA are driven by the dendritic potential, GABA by the somatic potential.
    pub fn synaptic_currents(
        constants: &PrincipalConstants,
        state: &PrincipalState,
        drive: &SynapticDrive,
    ) -> [f64; 3] {
        [
            ohmic(constants.g_ampa, drive.ampa, state.vd, constants.e_ampa),
            ohmic(constants.g_nmda, drive.nmda, state.vd, constants.e_nmda),
            ohmic(constants.g_gaba, drive.gaba, state.vs, constants.e_gaba),
        ]
    }
}

impl Neuron for PrincipalNeuron {
    type State = PrincipalState;
    type Constants = PrincipalConstants;

    const POPULATION: Population = Population::Principal;

    /// Build a principal neuron from `[E_L, g_L, g_sd]`, with both compartments at rest, no
    /// calcium, resting sodium and all gates closed.
    fn build(
        parameters: &[f64],
        constants: &PrincipalConstants,
        afferents: Afferents,
    ) -> Result<Self, CortexError> {
        check_arity(Self::POPULATION, parameters)?;
        let (e_l, g_l, g_sd) = (parameters[0], parameters[1], parameters[2]);
        let initial = PrincipalState {
            vs: e_l,
            vd: e_l,
            na: constants.na_0,
            ..Default::default()
        };
        Ok(PrincipalNeuron {
            e_l,
            g_l,
            g_sd,
            core: NeuronCore::new(initial, afferents),
        })
    }

    fn core(&self) -> &NeuronCore<PrincipalState> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NeuronCore<PrincipalState> {
        &mut self.core
    }

    fn derivative(
        &self,
        constants: &PrincipalConstants,
        state: &PrincipalState,
        drive: &SynapticDrive,
    ) -> PrincipalState {
        let vs = state.vs;
        let i_sd = self.i_sd(state);
        let i_na = Self::i_na(constants, state);
        let i_ca = Self::i_ca(constants, state);
        let i_nap = Self::i_nap(constants, state);
        let [i_ampa, i_nmda, i_gaba] = Self::synaptic_currents(constants, state, drive);

        let somatic = self.i_l(state)
            + i_na
            + Self::i_k(constants, state)
            + Self::i_a(constants, state)
            + Self::i_ks(constants, state)
            + Self::i_kna(constants, state);
        let dendritic =
            i_ca + Self::i_kca(constants, state) + i_nap + Self::i_ar(constants, state);
        let release = transmitter_release(vs, constants.release_gain);
        let tau_ks = 8.0 / (((vs + 55.0) / 30.0).exp() + (-(vs + 55.0) / 30.0).exp());

        PrincipalState {
            vs: 1.0 / constants.c_m
                * (-somatic - (i_gaba + i_sd) / constants.area_soma + self.input()),
            vd: 1.0 / constants.c_m
                * (-dendritic - (i_ampa + i_nmda - i_sd) / constants.area_dendrite),
            ca: -constants.alpha_ca * constants.area_dendrite * i_ca - state.ca / constants.tau_ca,
            na: -constants.alpha_na
                * (constants.area_soma * i_na + constants.area_dendrite * i_nap)
                - sodium_pump(constants.r_pump, state.na, constants.na_0),
            h_na: rate_kinetics(
                state.h_na,
                exponential(vs, 0.28, 50.0, 10.0),
                4.0 * sigmoid(vs, 20.0, 10.0),
            ),
            n_k: rate_kinetics(
                state.n_k,
                linoid(vs, 0.04, 34.0, 10.0),
                exponential(vs, 0.5, 44.0, 25.0),
            ),
            h_a: relaxation(state.h_a, sigmoid(vs, 80.0, -6.0), constants.tau_a),
            m_ks: relaxation(state.m_ks, sigmoid(vs, 34.0, 6.5), tau_ks),
            s_ampa: release * (1.0 - state.s_ampa) - state.s_ampa / constants.tau_ampa,
            s_nmda: constants.nmda_gain * state.x_nmda * (1.0 - state.s_nmda)
                - state.s_nmda / constants.tau_nmda,
            x_nmda: release - state.x_nmda / constants.tau_x,
        }
    }

    fn release(state: &PrincipalState, receptor: Receptor) -> f64 {
        match receptor {
            Receptor::Ampa => state.s_ampa,
            Receptor::Nmda => state.s_nmda,
            Receptor::Gaba => 0.0,
        }
    }

    fn potential(state: &PrincipalState) -> f64 {
        state.vs
    }

    fn set_potential(state: &mut PrincipalState, v: f64) {
        state.vs = v;
        state.vd = v;
    }

    fn set_potential_of_soma(state: &mut PrincipalState, v: f64) {
        state.vs = v;
    }

    fn gating_fractions(state: &PrincipalState) -> Vec<f64> {
        vec![
            state.h_na,
            state.n_k,
            state.h_a,
            state.m_ks,
            state.s_ampa,
            state.s_nmda,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn neuron(g_sd: f64) -> PrincipalNeuron {
        PrincipalNeuron::build(
            &[-60.95, 66.7E-3, g_sd],
            &PrincipalConstants::default(),
            Afferents::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_build() {
        let neuron = neuron(1.75E-3);
        let state = neuron.state();
        assert_eq!(state.vs, -60.95);
        assert_eq!(state.vd, -60.95);
        assert_eq!(state.na, 9.5);
        assert_eq!(state.ca, 0.0);
        assert_eq!(neuron.g_sd(), 1.75E-3);

        assert!(matches!(
            PrincipalNeuron::build(
                &[-60.0, 0.1],
                &PrincipalConstants::default(),
                Afferents::default()
            ),
            Err(CortexError::ParameterLength { expected: 3, found: 2, .. })
        ));
    }

    #[test]
    fn test_resting_concentrations() {
        // the sodium pump is balanced at the resting concentration and there is no calcium to
        // remove
        let constants = PrincipalConstants::default();
        let state = PrincipalState {
            na: constants.na_0,
            ..Default::default()
        };
        assert_eq!(sodium_pump(constants.r_pump, state.na, constants.na_0), 0.0);
        assert_eq!(PrincipalNeuron::i_kca(&constants, &state), 0.0);
    }

    #[test]
    fn test_coupling_current() {
        let constants = PrincipalConstants::default();
        let neuron = neuron(2E-3);
        let state = PrincipalState {
            vs: -50.0,
            vd: -60.0,
            na: constants.na_0,
            ..Default::default()
        };
        assert_relative_eq!(neuron.i_sd(&state), 2E-3 * 10.0);

        // the coupling current leaves the soma and enters the dendrite
        let leak_only = PrincipalConstants {
            g_na: 0.0,
            g_k: 0.0,
            g_a: 0.0,
            g_ks: 0.0,
            g_kna: 0.0,
            g_ca: 0.0,
            g_kca: 0.0,
            g_nap: 0.0,
            g_ar: 0.0,
            ..constants
        };
        let derivative = neuron.derivative(&leak_only, &state, &SynapticDrive::default());
        assert!(derivative.vs < 0.0);
        assert!(derivative.vd > 0.0);
    }

    #[test]
    fn test_synaptic_currents() {
        let constants = PrincipalConstants::default();
        let state = PrincipalState {
            vs: -70.0,
            vd: -50.0,
            ..Default::default()
        };
        assert_eq!(
            PrincipalNeuron::synaptic_currents(&constants, &state, &SynapticDrive::default()),
            [0.0, 0.0, 0.0]
        );

        // GABA is at its reversal on the soma while AMPA is driven by the dendrite
        let drive = SynapticDrive { ampa: 1.0, nmda: 0.0, gaba: 4.0 };
        let [i_ampa, i_nmda, i_gaba] =
            PrincipalNeuron::synaptic_currents(&constants, &state, &drive);
        assert_relative_eq!(i_ampa, 5.4E-6 * -50.0);
        assert_eq!(i_nmda, 0.0);
        assert_eq!(i_gaba, 0.0);
    }

    #[test]
    fn test_release_kinetics() {
        let constants = PrincipalConstants::default();
        let neuron = neuron(1.75E-3);
        let spiking = PrincipalState {
            vs: 20.0,
            vd: 20.0,
            na: constants.na_0,
            ..Default::default()
        };
        let derivative = neuron.derivative(&constants, &spiking, &SynapticDrive::default());
        assert_relative_eq!(derivative.s_ampa, 1.74);
        assert_relative_eq!(derivative.x_nmda, 1.74);
        // the NMDA gating only opens once the auxiliary variable is driven
        assert_eq!(derivative.s_nmda, 0.0);

        assert_eq!(PrincipalNeuron::release(&spiking, Receptor::Gaba), 0.0);
    }

    #[test]
    fn test_soma_noise_target() {
        let mut state = PrincipalState {
            vs: -60.0,
            vd: -65.0,
            ..Default::default()
        };
        PrincipalNeuron::set_potential_of_soma(&mut state, -59.0);
        assert_eq!((state.vs, state.vd), (-59.0, -65.0));
        PrincipalNeuron::set_potential(&mut state, -70.0);
        assert_eq!((state.vs, state.vd), (-70.0, -70.0));
    }
}
