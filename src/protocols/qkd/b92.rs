//! B92 Quantum Key Distribution Protocol.
//!
//! B92 is a simplified version of BB84 proposed by Charles Bennett in 1992.
//! It uses only two non-orthogonal quantum states (e.g., |0> and |+>).

use crate::core::errors::{ParameterError, SimulationError};
use crate::core::{Detection, MeasurementOutcome, Povm, QubitState};
use crate::noise;
use crate::protocols::qkd::sifting::SiftedKeyPair;
use crate::random::RandomSource;
use crate::statistics::{self, KeyStatistics, Verdict};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct B92Params {
    pub n_signals: usize,
    pub seed: Option<u64>,
    /// Probability that a photon never reaches Bob.
    pub channel_loss: f64,
    /// Probability that the received state is replaced by the orthogonal
    /// partner of Alice's prepared state.
    pub depolarization: f64,
    /// Probability of an intercept-resend attack on a signal.
    pub eavesdropping_rate: f64,
    /// Detector dark-count probability, per conclusive branch.
    pub dark_count_rate: f64,
}

impl Default for B92Params {
    fn default() -> Self {
        Self {
            n_signals: 1000,
            seed: None,
            channel_loss: 0.0,
            depolarization: 0.0,
            eavesdropping_rate: 0.0,
            dark_count_rate: 0.0,
        }
    }
}

impl B92Params {
    pub fn validate(&self) -> Result<(), ParameterError> {
        noise::validate_count(self.n_signals)?;
        noise::validate_probability("channel_loss", self.channel_loss)?;
        noise::validate_probability("depolarization", self.depolarization)?;
        noise::validate_probability("eavesdropping_rate", self.eavesdropping_rate)?;
        noise::validate_probability("dark_count_rate", self.dark_count_rate)?;
        Ok(())
    }
}

/// The result of the B92 protocol execution.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct B92Result {
    pub params: B92Params,
    pub seed: Option<u64>,
    /// Alice's original bits.
    pub alice_bits: Vec<bool>,
    /// Prepared state per bit: `"0"` for bit 0, `"+"` for bit 1.
    pub alice_states: Vec<&'static str>,
    /// Bob's detection per signal.
    pub outcomes: Vec<MeasurementOutcome>,
    pub conclusive_indices: Vec<usize>,
    pub inconclusive_indices: Vec<usize>,
    /// Signals that never reached Bob.
    pub lost_indices: Vec<usize>,
    pub conclusive_count: usize,
    pub inconclusive_count: usize,
    pub lost_count: usize,
    /// Alice's bits and Bob's conclusive values.
    pub sifted: SiftedKeyPair,
    #[serde(flatten)]
    pub statistics: KeyStatistics,
    pub eve_intercepted_count: usize,
    pub expected_qber: f64,
    pub expected_key_rate: f64,
    pub verdict: Verdict,
}

/// Eve measures in a random basis and resends the state she observed.
fn intercept_resend(state: &QubitState, rng: &mut RandomSource) -> QubitState {
    let (first, second) = if rng.coin() {
        (QubitState::plus(), QubitState::minus())
    } else {
        (QubitState::zero(), QubitState::one())
    };

    if rng.bernoulli(state.overlap(&first)) {
        first
    } else {
        second
    }
}

/// Bob's USD measurement including the dark-count approximation.
///
/// Each conclusive branch independently registers a dark count with
/// probability `dark_count_rate`; a registered dark count adds
/// `dark_count_rate` to that branch before the three outcome
/// probabilities are renormalized. This is an approximation, not a
/// detector model.
fn measure(
    povm: &Povm,
    state: &QubitState,
    dark_count_rate: f64,
    rng: &mut RandomSource,
) -> Detection {
    let mut probs = povm.probabilities(state);

    if rng.bernoulli(dark_count_rate) {
        probs[0] += dark_count_rate;
    }
    if rng.bernoulli(dark_count_rate) {
        probs[1] += dark_count_rate;
    }

    let total: f64 = probs.iter().sum();
    if total > 0.0 {
        for p in &mut probs {
            *p /= total;
        }
    }

    let idx = rng.pick_outcome(&probs);
    povm.values[idx]
}

/// Executes the B92 QKD protocol with a fresh random source.
pub fn run(params: &B92Params) -> Result<B92Result, SimulationError> {
    let mut rng = RandomSource::new(params.seed);
    run_with(params, &mut rng)
}

/// Executes the B92 QKD protocol.
///
/// In B92, Alice sends one of two non-orthogonal states:
/// - Bit 0 -> $|0\rangle$
/// - Bit 1 -> $|+\rangle$
///
/// Bob measures using a POVM that can conclusively identify the bit or return an inconclusive result.
/// Per signal the pipeline is: channel loss, intercept-resend, depolarization, measurement.
///
/// # Returns
///
/// A `B92Result` with the simulation statistics and keys.
pub fn run_with(params: &B92Params, rng: &mut RandomSource) -> Result<B92Result, SimulationError> {
    params.validate()?;

    let n_signals = params.n_signals;
    log::debug!("B92 run: {} signals, seed {:?}", n_signals, rng.seed());

    let state_zero = QubitState::zero();
    let state_plus = QubitState::plus();

    // Bob's POVM
    let bob_device = Povm::unambiguous(&state_zero, &state_plus)?;

    let mut alice_bits = Vec::with_capacity(n_signals);
    let mut alice_states = Vec::with_capacity(n_signals);
    let mut outcomes = Vec::with_capacity(n_signals);
    let mut conclusive_indices = Vec::new();
    let mut inconclusive_indices = Vec::new();
    let mut lost_indices = Vec::new();
    let mut sifted = SiftedKeyPair::default();
    let mut eve_intercepted_count = 0;

    for i in 0..n_signals {
        // Alice prepares qubit
        let a_bit = rng.coin();
        alice_bits.push(a_bit);
        alice_states.push(if a_bit { "+" } else { "0" });

        // Photon lost in the channel
        if rng.bernoulli(params.channel_loss) {
            lost_indices.push(i);
            outcomes.push(MeasurementOutcome {
                index: i,
                detection: Detection::NoDetection,
                sifted: false,
            });
            continue;
        }

        let prepared = if a_bit { &state_plus } else { &state_zero };
        let mut state = prepared.clone();

        // Eavesdropper intercepts
        if rng.bernoulli(params.eavesdropping_rate) {
            eve_intercepted_count += 1;
            state = intercept_resend(&state, rng);
        }

        // Channel noise replaces whatever arrives with the partner of the prepared state
        if rng.bernoulli(params.depolarization) {
            state = prepared.orthogonal();
        }

        // Bob measures using his POVM
        let detection = measure(&bob_device, &state, params.dark_count_rate, rng);

        match detection.bit() {
            Some(b_val) => {
                conclusive_indices.push(i);
                sifted.push(i, a_bit, b_val);
            }
            None => inconclusive_indices.push(i),
        }
        outcomes.push(MeasurementOutcome {
            index: i,
            detection,
            sifted: detection.is_conclusive(),
        });
    }

    if n_signals > 0 && lost_indices.len() == n_signals {
        log::warn!("B92: all {} signals lost in the channel", n_signals);
    }

    let statistics = KeyStatistics::from_key(&sifted, n_signals);
    let verdict = statistics::b92_verdict(statistics.qber);

    log::info!(
        "B92 finished: {} conclusive of {}, QBER {:.4}",
        conclusive_indices.len(),
        n_signals,
        statistics.qber
    );

    Ok(B92Result {
        params: params.clone(),
        seed: rng.seed(),
        alice_bits,
        alice_states,
        outcomes,
        conclusive_count: conclusive_indices.len(),
        inconclusive_count: inconclusive_indices.len(),
        lost_count: lost_indices.len(),
        conclusive_indices,
        inconclusive_indices,
        lost_indices,
        sifted,
        statistics,
        eve_intercepted_count,
        expected_qber: noise::expected_qber(
            params.depolarization,
            params.eavesdropping_rate,
            params.dark_count_rate,
        ),
        expected_key_rate: noise::b92_expected_key_rate(
            params.channel_loss,
            params.depolarization,
            params.eavesdropping_rate,
        ),
        verdict,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(n_signals: usize, seed: u64) -> B92Params {
        B92Params {
            n_signals,
            seed: Some(seed),
            ..B92Params::default()
        }
    }

    #[test]
    fn noiseless_conclusive_results_are_always_correct() {
        let result = run(&seeded(4000, 3)).unwrap();
        assert_eq!(result.statistics.errors, 0);
        assert_eq!(result.statistics.qber, 0.0);
        assert_eq!(result.lost_count, 0);
        assert_eq!(
            result.conclusive_count + result.inconclusive_count + result.lost_count,
            4000
        );
    }

    #[test]
    fn total_channel_loss_yields_empty_key() {
        let params = B92Params {
            channel_loss: 1.0,
            ..seeded(300, 1)
        };
        let result = run(&params).unwrap();
        assert_eq!(result.lost_count, 300);
        assert!(result.sifted.is_empty());
        assert_eq!(result.statistics.key_rate, 0.0);
        assert_eq!(result.statistics.qber, 0.0);
    }

    #[test]
    fn intercept_resend_always_returns_a_basis_state() {
        let mut rng = RandomSource::seeded(12);
        let basis_states = [
            QubitState::zero(),
            QubitState::one(),
            QubitState::plus(),
            QubitState::minus(),
        ];
        for _ in 0..50 {
            let resent = intercept_resend(&QubitState::plus(), &mut rng);
            assert!(basis_states.contains(&resent));
        }
    }

    #[test]
    fn flipped_zero_state_is_read_as_bit_one_more_often() {
        // |1> is the depolarized |0>: the bit-1 branch fires half the time.
        let povm = Povm::unambiguous(&QubitState::zero(), &QubitState::plus()).unwrap();
        let probs = povm.probabilities(&QubitState::one());
        assert!((probs[0] - 0.25).abs() < 1e-9);
        assert!((probs[1] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn dark_counts_only_add_to_conclusive_branches() {
        let povm = Povm::unambiguous(&QubitState::zero(), &QubitState::plus()).unwrap();
        let mut rng = RandomSource::seeded(4);
        let detections: Vec<Detection> = (0..2000)
            .map(|_| measure(&povm, &QubitState::zero(), 1.0, &mut rng))
            .collect();
        // With both branches boosted by 1.0: p = (1.25, 1.0, 0.75) / 3.
        let ones = detections.iter().filter(|d| **d == Detection::Bit(true)).count();
        assert!((ones as f64 / 2000.0 - 1.0 / 3.0).abs() < 0.05);
    }

    #[test]
    fn depolarization_overrides_the_resent_state() {
        // Every signal reaches Bob as |1> or |->, whatever Eve resent:
        // yield 3/4 and two wrong conclusive results for every right one.
        let params = B92Params {
            depolarization: 1.0,
            eavesdropping_rate: 1.0,
            ..seeded(20000, 13)
        };
        let result = run(&params).unwrap();
        assert_eq!(result.eve_intercepted_count, 20000);
        let yield_fraction = result.conclusive_count as f64 / 20000.0;
        assert!((yield_fraction - 0.75).abs() < 0.02, "yield {}", yield_fraction);
        assert!(
            (result.statistics.qber - 2.0 / 3.0).abs() < 0.02,
            "QBER {}",
            result.statistics.qber
        );
    }

    #[test]
    fn invalid_parameters_leave_the_stream_untouched() {
        let params = B92Params {
            channel_loss: 1.2,
            ..B92Params::default()
        };
        let mut rng = RandomSource::seeded(4);
        assert!(run_with(&params, &mut rng).is_err());
        assert_eq!(rng.uniform(), RandomSource::seeded(4).uniform());
    }

    #[test]
    fn states_follow_bits() {
        let result = run(&seeded(50, 21)).unwrap();
        for (bit, label) in result.alice_bits.iter().zip(&result.alice_states) {
            assert_eq!(*label, if *bit { "+" } else { "0" });
        }
    }
}
