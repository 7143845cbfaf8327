//! E91 Quantum Key Distribution Protocol.
//!
//! E91 was proposed by Artur Ekert in 1991. A source distributes entangled
//! pairs; each party measures its half along one of three analyzer axes.
//! Pairs measured along the same axis become key material, and pairs
//! measured along different axes feed a CHSH Bell test that certifies the
//! entanglement (and so the absence of an eavesdropper).

use crate::core::errors::{ParameterError, SimulationError};
use crate::core::{
    BellState, Detection, MeasurementOutcome, QuantumState, same_outcome_probability,
};
use crate::noise;
use crate::protocols::qkd::sifting::SiftedKeyPair;
use crate::random::RandomSource;
use crate::statistics::{self, BellTestPair, CorrelationSet, KeyStatistics, Verdict};
use serde::{Deserialize, Serialize};

/// One of the three analyzer settings available to each party.
///
/// Serialized as the basis index used in reports: 0, 1 or 2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u8")]
pub enum AnalyzerBasis {
    /// 0°, the computational basis.
    Z,
    /// 90°, the Hadamard basis.
    X,
    /// 45°, the intermediate basis.
    D,
}

impl AnalyzerBasis {
    pub const ALL: [AnalyzerBasis; 3] = [AnalyzerBasis::Z, AnalyzerBasis::X, AnalyzerBasis::D];

    pub fn index(self) -> usize {
        match self {
            AnalyzerBasis::Z => 0,
            AnalyzerBasis::X => 1,
            AnalyzerBasis::D => 2,
        }
    }

    pub fn angle_degrees(self) -> f64 {
        match self {
            AnalyzerBasis::Z => 0.0,
            AnalyzerBasis::X => 90.0,
            AnalyzerBasis::D => 45.0,
        }
    }

    /// Analyzer axis as a Bloch angle in the x-z plane.
    pub fn bloch_angle(self) -> f64 {
        self.angle_degrees().to_radians()
    }

    /// Bob's analyzer axis when his setting differs from Alice's.
    ///
    /// With Alice at 0° and 90°, the axes -135° (for 45°) and -45°
    /// (for 0° and 90°) give the Tsirelson bound on
    /// `E(0°,45°) - E(0°,90°) + E(90°,45°) + E(90°,0°)`.
    pub fn chsh_frame_angle(self) -> f64 {
        match self {
            AnalyzerBasis::D => (-135.0_f64).to_radians(),
            AnalyzerBasis::Z | AnalyzerBasis::X => (-45.0_f64).to_radians(),
        }
    }
}

impl From<AnalyzerBasis> for u8 {
    fn from(basis: AnalyzerBasis) -> u8 {
        basis.index() as u8
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct E91Params {
    /// Number of entangled pairs to distribute.
    pub n_pairs: usize,
    pub seed: Option<u64>,
    /// White-noise weight mixed into the Bell state.
    pub depolarization: f64,
    /// Probability of an intercept-resend attack on a pair.
    pub eavesdropping_rate: f64,
    /// Independent per-detector flip probability.
    pub dark_count_rate: f64,
    pub bell_state: BellState,
}

impl Default for E91Params {
    fn default() -> Self {
        Self {
            n_pairs: 1000,
            seed: None,
            depolarization: 0.0,
            eavesdropping_rate: 0.0,
            dark_count_rate: 0.0,
            bell_state: BellState::PsiMinus,
        }
    }
}

impl E91Params {
    pub fn validate(&self) -> Result<(), ParameterError> {
        noise::validate_count(self.n_pairs)?;
        noise::validate_probability("depolarization", self.depolarization)?;
        noise::validate_probability("eavesdropping_rate", self.eavesdropping_rate)?;
        noise::validate_probability("dark_count_rate", self.dark_count_rate)?;
        Ok(())
    }
}

/// Anti-correlation statistics for one class of pairs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct AgreementSummary {
    pub count: usize,
    /// Pairs whose outcomes differ.
    pub anticorrelated: usize,
    pub anticorrelation: f64,
}

impl AgreementSummary {
    fn record(&mut self, alice: bool, bob: bool) {
        self.count += 1;
        if alice != bob {
            self.anticorrelated += 1;
        }
    }

    fn finish(mut self) -> Self {
        self.anticorrelation = statistics::ratio(self.anticorrelated, self.count);
        self
    }
}

/// The result of the E91 protocol execution.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct E91Result {
    pub params: E91Params,
    /// Seed actually used, `None` for a non-reproducible run.
    pub seed: Option<u64>,
    pub alice_bases: Vec<AnalyzerBasis>,
    pub bob_bases: Vec<AnalyzerBasis>,
    pub alice_outcomes: Vec<bool>,
    pub bob_outcomes: Vec<bool>,
    /// Bob's detection per pair; `sifted` marks the key-generation subset.
    pub outcomes: Vec<MeasurementOutcome>,
    /// Pairs measured along different axes.
    pub bell_test_indices: Vec<usize>,
    /// Pairs measured along the same axis.
    pub key_gen_indices: Vec<usize>,
    pub bell_test_count: usize,
    pub key_gen_count: usize,
    /// Key-generation subset before Bob's correction.
    pub sifted: SiftedKeyPair,
    /// Bob's key after undoing the Bell state's anti-correlation.
    pub bob_corrected_key: Vec<bool>,
    /// Error statistics of Alice's key against `bob_corrected_key`.
    #[serde(flatten)]
    pub statistics: KeyStatistics,
    pub chsh_s_value: f64,
    pub bell_violated: bool,
    pub correlations: CorrelationSet,
    pub same_basis: AgreementSummary,
    pub different_basis: AgreementSummary,
    pub eve_intercepted_count: usize,
    pub expected_s_value: f64,
    pub expected_qber: f64,
    pub verdict: Verdict,
}

/// Closed-form outcome model of one run, computed before any draw.
struct CorrelationModel {
    /// P(Bob's bit equals Alice's), by basis index.
    same_outcome: [[f64; 3]; 3],
    /// Whether Bob must flip his key bit for the given basis.
    anticorrelated: [bool; 3],
}

impl CorrelationModel {
    fn new(bell_state: BellState, depolarization: f64) -> Self {
        let pure = QuantumState::bell(bell_state);
        let mut noisy = pure.clone();
        noisy.depolarize(depolarization);

        let mut same_outcome = [[0.0; 3]; 3];
        let mut anticorrelated = [false; 3];

        for alice in AnalyzerBasis::ALL {
            for bob in AnalyzerBasis::ALL {
                let bob_theta = if alice == bob {
                    bob.bloch_angle()
                } else {
                    bob.chsh_frame_angle()
                };
                same_outcome[alice.index()][bob.index()] =
                    same_outcome_probability(&noisy, alice.bloch_angle(), bob_theta);
            }

            let theta = alice.bloch_angle();
            anticorrelated[alice.index()] = same_outcome_probability(&pure, theta, theta) < 0.5;
        }

        Self {
            same_outcome,
            anticorrelated,
        }
    }

    fn same_outcome(&self, alice: AnalyzerBasis, bob: AnalyzerBasis) -> f64 {
        self.same_outcome[alice.index()][bob.index()]
    }

    fn anticorrelated(&self, basis: AnalyzerBasis) -> bool {
        self.anticorrelated[basis.index()]
    }
}

/// Executes the E91 QKD protocol with a fresh random source.
///
/// The source is seeded from `params.seed` when present.
pub fn run(params: &E91Params) -> Result<E91Result, SimulationError> {
    let mut rng = RandomSource::new(params.seed);
    run_with(params, &mut rng)
}

/// Executes the E91 QKD protocol drawing from `rng`.
///
/// Both parties' outcomes come from the one stream, which is what keeps
/// them correlated.
///
/// # Errors
///
/// Returns `SimulationError::InvalidParameters` before any draw if a
/// probability lies outside [0, 1] or the pair count exceeds the cap.
pub fn run_with(params: &E91Params, rng: &mut RandomSource) -> Result<E91Result, SimulationError> {
    params.validate()?;

    let n_pairs = params.n_pairs;
    log::debug!(
        "E91 run: {} pairs, state {}, seed {:?}",
        n_pairs,
        params.bell_state,
        rng.seed()
    );

    let model = CorrelationModel::new(params.bell_state, params.depolarization);
    log::trace!("E91 same-outcome table: {:?}", model.same_outcome);

    let mut alice_bases = Vec::with_capacity(n_pairs);
    let mut bob_bases = Vec::with_capacity(n_pairs);
    let mut alice_outcomes = Vec::with_capacity(n_pairs);
    let mut bob_outcomes = Vec::with_capacity(n_pairs);
    let mut outcomes = Vec::with_capacity(n_pairs);
    let mut bell_test_indices = Vec::new();
    let mut key_gen_indices = Vec::new();
    let mut sifted = SiftedKeyPair::default();
    let mut correlations = CorrelationSet::default();
    let mut same_basis = AgreementSummary::default();
    let mut different_basis = AgreementSummary::default();
    let mut eve_intercepted_count = 0;

    for i in 0..n_pairs {
        // Each party picks an analyzer
        let a_basis = rng.choose(&AnalyzerBasis::ALL);
        let b_basis = rng.choose(&AnalyzerBasis::ALL);

        // Source emits the pair; Eve may intercept and resend
        let (mut a_bit, mut b_bit) = if rng.bernoulli(params.eavesdropping_rate) {
            eve_intercepted_count += 1;
            (rng.coin(), rng.coin())
        } else {
            let a_bit = rng.coin();
            let same = rng.bernoulli(model.same_outcome(a_basis, b_basis));
            (a_bit, if same { a_bit } else { !a_bit })
        };

        // Dark counts
        if rng.bernoulli(params.dark_count_rate) {
            a_bit = !a_bit;
        }
        if rng.bernoulli(params.dark_count_rate) {
            b_bit = !b_bit;
        }

        let key_gen = match BellTestPair::from_bases(a_basis, b_basis) {
            Some(pair) => {
                bell_test_indices.push(i);
                correlations.record(pair, a_bit, b_bit);
                different_basis.record(a_bit, b_bit);
                false
            }
            None => {
                key_gen_indices.push(i);
                sifted.push(i, a_bit, b_bit);
                same_basis.record(a_bit, b_bit);
                true
            }
        };
        outcomes.push(MeasurementOutcome {
            index: i,
            detection: Detection::Bit(b_bit),
            sifted: key_gen,
        });

        alice_bases.push(a_basis);
        bob_bases.push(b_basis);
        alice_outcomes.push(a_bit);
        bob_outcomes.push(b_bit);
    }

    let corrected = sifted.corrected(|i| model.anticorrelated(alice_bases[i]));
    let statistics = KeyStatistics::from_key(&corrected, n_pairs);

    let chsh_s_value = correlations.s_value();
    let bell_violated = statistics::bell_violated(chsh_s_value);
    let verdict = statistics::e91_verdict(bell_violated, statistics.qber);

    log::info!(
        "E91 finished: S = {:.4}, key {} bits, QBER {:.4}",
        chsh_s_value,
        statistics.sifted_length,
        statistics.qber
    );

    Ok(E91Result {
        params: params.clone(),
        seed: rng.seed(),
        alice_bases,
        bob_bases,
        alice_outcomes,
        bob_outcomes,
        outcomes,
        bell_test_count: bell_test_indices.len(),
        key_gen_count: key_gen_indices.len(),
        bell_test_indices,
        key_gen_indices,
        bob_corrected_key: corrected.bob,
        sifted,
        statistics,
        chsh_s_value,
        bell_violated,
        correlations,
        same_basis: same_basis.finish(),
        different_basis: different_basis.finish(),
        eve_intercepted_count,
        expected_s_value: noise::e91_expected_s_value(
            params.depolarization,
            params.eavesdropping_rate,
        ),
        expected_qber: noise::expected_qber(
            params.depolarization,
            params.eavesdropping_rate,
            params.dark_count_rate,
        ),
        verdict,
    })
}
