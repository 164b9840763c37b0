//! Building blocks of the current model: gating kinetics, ohmic currents and ion pumps.
//!
//! Voltages are in mV, times in ms, conductances in mS/cm² and currents in µA/cm².
//! All functions are pure.

/// Cube of the half-saturation sodium concentration of the sodium pump, i.e., 15³ (mM³).
pub const SODIUM_PUMP_K3: f64 = 3375.0;

/// Steady-state sigmoid `1 / (1 + exp(-(v + shift) / slope))`.
/// A negative slope gives a decreasing (inactivation) curve.
#[inline]
pub fn sigmoid(v: f64, shift: f64, slope: f64) -> f64 {
    1.0 / (1.0 + (-(v + shift) / slope).exp())
}

/// Linear-over-exponential rate `scale (v + shift) / (1 - exp(-(v + shift) / slope))`.
/// The rate is singular at `v = -shift`, where it evaluates to NaN.
#[inline]
pub fn linoid(v: f64, scale: f64, shift: f64, slope: f64) -> f64 {
    scale * (v + shift) / (1.0 - (-(v + shift) / slope).exp())
}

/// Exponential rate `scale exp(-(v + shift) / slope)`.
#[inline]
pub fn exponential(v: f64, scale: f64, shift: f64, slope: f64) -> f64 {
    scale * (-(v + shift) / slope).exp()
}

/// Time derivative of a gate with opening rate `alpha` and closing rate `beta`.
#[inline]
pub fn rate_kinetics(x: f64, alpha: f64, beta: f64) -> f64 {
    alpha * (1.0 - x) - beta * x
}

/// Time derivative of a gate relaxing towards `x_inf` with time constant `tau`.
#[inline]
pub fn relaxation(x: f64, x_inf: f64, tau: f64) -> f64 {
    (x_inf - x) / tau
}

/// Steady-state value `alpha / (alpha + beta)` of a gate with instantaneous kinetics.
#[inline]
pub fn instantaneous(alpha: f64, beta: f64) -> f64 {
    alpha / (alpha + beta)
}

/// Ohmic current `g · open · (v - e)` through channels whose open fraction is `open`.
#[inline]
pub fn ohmic(g: f64, open: f64, v: f64, e: f64) -> f64 {
    g * open * (v - e)
}

/// Fraction of open sodium-dependent potassium channels, `0.37 / (1 + (38.7 / Na)^3.5)`.
#[inline]
pub fn sodium_dependent_activation(na: f64) -> f64 {
    0.37 / (1.0 + (38.7 / na).powf(3.5))
}

/// Sodium pump extrusion relative to its resting rate, `R (Na³/(Na³+15³) - Na₀³/(Na₀³+15³))`.
#[inline]
pub fn sodium_pump(rate: f64, na: f64, na_0: f64) -> f64 {
    let na3 = na * na * na;
    let na_03 = na_0 * na_0 * na_0;
    rate * (na3 / (na3 + SODIUM_PUMP_K3) - na_03 / (na_03 + SODIUM_PUMP_K3))
}

/// Transmitter release of a presynaptic neuron, `gain / (1 + exp(-(v - 20) / 2))`.
#[inline]
pub fn transmitter_release(v: f64, gain: f64) -> f64 {
    gain / (1.0 + (-(v - 20.0) / 2.0).exp())
}

/// Spiking kinetics of the thalamic cells, in terms of the shifted potential `u = v + 50`.
pub mod thalamic {
    #[inline]
    pub fn alpha_h_na(v: f64) -> f64 {
        0.128 * ((17.0 - (v + 50.0)) / 18.0).exp()
    }

    #[inline]
    pub fn beta_h_na(v: f64) -> f64 {
        4.0 / (((40.0 - (v + 50.0)) / 5.0).exp() + 1.0)
    }

    #[inline]
    pub fn alpha_m_na(v: f64) -> f64 {
        0.32 * (13.0 - (v + 50.0)) / (((13.0 - (v + 50.0)) / 4.0).exp() - 1.0)
    }

    #[inline]
    pub fn beta_m_na(v: f64) -> f64 {
        0.28 * ((v + 50.0) - 40.0) / ((((v + 50.0) - 40.0) / 5.0).exp() - 1.0)
    }

    #[inline]
    pub fn alpha_n_k(v: f64) -> f64 {
        0.032 * (15.0 - (v + 50.0)) / (((15.0 - (v + 50.0)) / 5.0).exp() - 1.0)
    }

    #[inline]
    pub fn beta_n_k(v: f64) -> f64 {
        0.5 * ((10.0 - (v + 50.0)) / 40.0).exp()
    }
}
