//! Closed-form noise and attack model.
//!
//! Every function here is pure and deterministic: it turns physical
//! parameters into an event probability (or a theoretical expectation).
//! The stochastic draw against that probability happens in the
//! simulators.

use crate::core::errors::ParameterError;
use std::f64::consts::SQRT_2;

/// Upper bound on signals or pairs in a single run.
pub const MAX_SIGNALS: usize = 10_000_000;

/// Standard telecom fiber attenuation at 1550 nm, in dB/km.
pub const DEFAULT_ATTENUATION_DB_PER_KM: f64 = 0.2;

/// Classical (local hidden variable) bound on |S|.
pub const CLASSICAL_CHSH_BOUND: f64 = 2.0;

/// Tsirelson bound, the quantum maximum of |S|.
pub const TSIRELSON_BOUND: f64 = 2.0 * SQRT_2;

/// Ideal B92 conclusive fraction.
pub const B92_IDEAL_KEY_RATE: f64 = 0.25;

/// Validate probability parameter
pub fn validate_probability(name: &'static str, p: f64) -> Result<(), ParameterError> {
    if !(0.0..=1.0).contains(&p) {
        return Err(ParameterError::InvalidProbability { name, value: p });
    }
    Ok(())
}

/// Validate a physical quantity such as a length or an attenuation.
pub fn validate_quantity(name: &'static str, value: f64) -> Result<(), ParameterError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ParameterError::InvalidQuantity { name, value });
    }
    Ok(())
}

pub fn validate_count(count: usize) -> Result<(), ParameterError> {
    if count > MAX_SIGNALS {
        return Err(ParameterError::TooManySignals {
            count,
            limit: MAX_SIGNALS,
        });
    }
    Ok(())
}

/// Beer–Lambert photon loss over a fiber: $1 - 10^{-\alpha L / 10}$.
pub fn fiber_loss(attenuation_db_per_km: f64, fiber_length_km: f64) -> f64 {
    (1.0 - 10f64.powf(-(attenuation_db_per_km * fiber_length_km) / 10.0)).clamp(0.0, 1.0)
}

/// Total photon-loss probability: amplitude damping plus fiber loss,
/// saturating at 1.
pub fn photon_loss_probability(
    amplitude_damping: f64,
    fiber_length_km: f64,
    attenuation_db_per_km: f64,
) -> f64 {
    (amplitude_damping + fiber_loss(attenuation_db_per_km, fiber_length_km)).min(1.0)
}

/// Probability of an odd number of independent flips with probabilities
/// `p` and `q`.
pub fn combined_flip(p: f64, q: f64) -> f64 {
    p + q - 2.0 * p * q
}

/// BB84 expected QBER on the sifted key.
///
/// Depolarization hits every signal, phase damping only the diagonal half,
/// and an intercept-resend attack on a fraction `e` errs on a quarter of
/// the attacked signals.
pub fn bb84_expected_qber(depolarization: f64, phase_damping: f64, eavesdropping_rate: f64) -> f64 {
    let rectilinear = depolarization;
    let diagonal = combined_flip(depolarization, phase_damping);
    ((rectilinear + diagonal) / 2.0 + eavesdropping_rate / 4.0).clamp(0.0, 1.0)
}

/// BB84 expected sifted fraction: half the detected signals.
pub fn bb84_expected_key_rate(photon_loss: f64) -> f64 {
    0.5 * (1.0 - photon_loss)
}

/// Expected CHSH value of the depolarized, partially attacked singlet.
pub fn e91_expected_s_value(depolarization: f64, eavesdropping_rate: f64) -> f64 {
    TSIRELSON_BOUND * (1.0 - depolarization - eavesdropping_rate)
}

/// Expected QBER for E91 and B92: $(p + e)/2 + d$, saturating at 1.
pub fn expected_qber(depolarization: f64, eavesdropping_rate: f64, dark_count_rate: f64) -> f64 {
    ((depolarization + eavesdropping_rate) / 2.0 + dark_count_rate).min(1.0)
}

/// Expected B92 conclusive fraction after loss, depolarization and attack.
pub fn b92_expected_key_rate(channel_loss: f64, depolarization: f64, eavesdropping_rate: f64) -> f64 {
    (B92_IDEAL_KEY_RATE * (1.0 - channel_loss) * (1.0 - depolarization - eavesdropping_rate))
        .max(0.0)
}
