use crate::core::errors::{ParameterError, SimulationError};
use crate::core::{Detection, MeasurementOutcome};
use crate::noise;
use crate::protocols::qkd::sifting::{self, SiftedKeyPair};
use crate::random::RandomSource;
use crate::statistics::{self, KeyStatistics, Verdict};
use serde::{Deserialize, Serialize};

/// BB84 channel and attack parameters.
///
/// Bases are encoded as `false` for rectilinear and `true` for diagonal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bb84Params {
    pub n_bits: usize,
    pub seed: Option<u64>,
    pub depolarization: f64,
    /// Flip probability applied to diagonal-basis signals only.
    pub phase_damping: f64,
    pub amplitude_damping: f64,
    /// Fiber length in km.
    pub fiber_length: f64,
    /// Fiber attenuation in dB/km.
    pub attenuation_coeff: f64,
    pub eavesdropping_rate: f64,
}

impl Default for Bb84Params {
    fn default() -> Self {
        Self {
            n_bits: 4,
            seed: Some(0),
            depolarization: 0.0,
            phase_damping: 0.0,
            amplitude_damping: 0.0,
            fiber_length: 0.0,
            attenuation_coeff: noise::DEFAULT_ATTENUATION_DB_PER_KM,
            eavesdropping_rate: 0.0,
        }
    }
}

impl Bb84Params {
    pub fn validate(&self) -> Result<(), ParameterError> {
        noise::validate_count(self.n_bits)?;
        noise::validate_probability("depolarization", self.depolarization)?;
        noise::validate_probability("phase_damping", self.phase_damping)?;
        noise::validate_probability("amplitude_damping", self.amplitude_damping)?;
        noise::validate_quantity("fiber_length", self.fiber_length)?;
        noise::validate_quantity("attenuation_coeff", self.attenuation_coeff)?;
        noise::validate_probability("eavesdropping_rate", self.eavesdropping_rate)?;
        Ok(())
    }

    pub fn photon_loss_probability(&self) -> f64 {
        noise::photon_loss_probability(
            self.amplitude_damping,
            self.fiber_length,
            self.attenuation_coeff,
        )
    }
}

/// BB84 results
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Bb84Result {
    pub params: Bb84Params,
    pub seed: Option<u64>,
    /// Identifier of the simulated job, `sim_<seed>_<n_bits>`.
    pub job_id: String,
    pub alice_bits: Vec<bool>,
    pub alice_bases: Vec<bool>,
    pub bob_bases: Vec<bool>,
    /// Bob's detection per signal; lost photons are `NoDetection`.
    pub outcomes: Vec<MeasurementOutcome>,
    /// Whether each photon reached Bob.
    pub detected: Vec<bool>,
    pub sifted: SiftedKeyPair,
    #[serde(flatten)]
    pub statistics: KeyStatistics,
    pub keys_match: bool,
    pub photon_loss_probability: f64,
    pub detected_count: usize,
    pub eve_intercepted_count: usize,
    pub expected_qber: f64,
    pub expected_key_rate: f64,
    pub verdict: Verdict,
}

impl Bb84Result {
    /// Bob's per-signal detections in signal order.
    pub fn bob_results(&self) -> Vec<Detection> {
        self.outcomes.iter().map(|o| o.detection).collect()
    }
}

/// Runs BB84 protocol
pub fn run(params: &Bb84Params) -> Result<Bb84Result, SimulationError> {
    let mut rng = RandomSource::new(params.seed);
    run_with(params, &mut rng)
}

/// Runs BB84 protocol drawing every decision from `rng`.
pub fn run_with(params: &Bb84Params, rng: &mut RandomSource) -> Result<Bb84Result, SimulationError> {
    params.validate()?;

    let n_bits = params.n_bits;
    let photon_loss = params.photon_loss_probability();
    log::debug!(
        "BB84 run: {} signals, photon loss {:.4}, seed {:?}",
        n_bits,
        photon_loss,
        rng.seed()
    );

    let mut alice_bits = Vec::with_capacity(n_bits);
    let mut alice_bases = Vec::with_capacity(n_bits);
    let mut bob_bases = Vec::with_capacity(n_bits);
    let mut outcomes = Vec::with_capacity(n_bits);

    let mut detected_count = 0;
    let mut eve_intercepted_count = 0;

    for i in 0..n_bits {
        // Alice prepares, Bob picks his basis
        let a_bit = rng.coin();
        let a_basis = rng.coin();
        let b_basis = rng.coin();

        alice_bits.push(a_bit);
        alice_bases.push(a_basis);
        bob_bases.push(b_basis);

        // Photon lost in the channel
        if rng.bernoulli(photon_loss) {
            outcomes.push(MeasurementOutcome {
                index: i,
                detection: Detection::NoDetection,
                sifted: false,
            });
            continue;
        }
        detected_count += 1;

        let mut bit = a_bit;

        // Eavesdropper intercepts
        if params.eavesdropping_rate > 1e-12 && rng.bernoulli(params.eavesdropping_rate) {
            eve_intercepted_count += 1;
            let e_basis = rng.coin();
            if e_basis != a_basis {
                bit = rng.coin();
            }
        }

        // Channel noise
        if rng.bernoulli(params.depolarization) {
            bit = !bit;
        }
        if a_basis && rng.bernoulli(params.phase_damping) {
            bit = !bit;
        }

        // Bob measures
        let matched = a_basis == b_basis;
        let b_val = if matched { bit } else { rng.coin() };

        outcomes.push(MeasurementOutcome {
            index: i,
            detection: Detection::Bit(b_val),
            sifted: matched,
        });
    }

    if n_bits > 0 && detected_count == 0 {
        log::warn!("BB84: all {} photons lost in the channel", n_bits);
    }

    // Sifting over detected signals with matching bases
    let bob_bits: Vec<bool> = outcomes
        .iter()
        .map(|o| o.detection.bit().unwrap_or(false))
        .collect();
    let detected: Vec<bool> = outcomes.iter().map(|o| o.detection.is_conclusive()).collect();
    let sifted =
        sifting::sift_by_basis(&alice_bases, &bob_bases, &alice_bits, &bob_bits, |i| detected[i]);

    let statistics = KeyStatistics::from_key(&sifted, n_bits);
    let verdict = statistics::bb84_verdict(statistics.qber);
    let seed = rng.seed();
    let job_id = match seed {
        Some(s) => format!("sim_{}_{}", s, n_bits),
        None => format!("sim_unseeded_{}", n_bits),
    };

    log::info!(
        "BB84 finished: {} detected, key {} bits, QBER {:.4}",
        detected_count,
        statistics.sifted_length,
        statistics.qber
    );

    Ok(Bb84Result {
        params: params.clone(),
        seed,
        job_id,
        alice_bits,
        alice_bases,
        bob_bases,
        outcomes,
        detected,
        keys_match: sifted.keys_match(),
        sifted,
        statistics,
        photon_loss_probability: photon_loss,
        detected_count,
        eve_intercepted_count,
        expected_qber: noise::bb84_expected_qber(
            params.depolarization,
            params.phase_damping,
            params.eavesdropping_rate,
        ),
        expected_key_rate: noise::bb84_expected_key_rate(photon_loss),
        verdict,
    })
}
