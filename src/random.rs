use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Per-run pseudo-random stream.
///
/// Every stochastic decision of a simulator is drawn from one
/// `RandomSource`, so the same seed and the same draw order always
/// reproduce the same run. Sources are never shared between runs.
#[derive(Debug, Clone)]
pub struct RandomSource {
    rng: StdRng,
    seed: Option<u64>,
}

impl RandomSource {
    /// Creates a reproducible source.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    /// Creates a non-reproducible source from operating system entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            seed: None,
        }
    }

    /// Seeded when `seed` is given, OS entropy otherwise.
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => {
                log::warn!("no seed supplied; run will not be reproducible");
                Self::from_entropy()
            }
        }
    }

    /// Deterministically re-initializes the stream.
    pub fn reseed(&mut self, seed: u64) {
        *self = Self::seeded(seed);
    }

    /// The seed in use, or `None` for an entropy-backed stream.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Uniform float in `[0, 1)`.
    pub fn uniform(&mut self) -> f64 {
        self.rng.random()
    }

    /// Fair coin.
    pub fn coin(&mut self) -> bool {
        self.uniform() < 0.5
    }

    /// `true` with probability `p`. Always consumes exactly one draw.
    pub fn bernoulli(&mut self, p: f64) -> bool {
        self.uniform() < p
    }

    /// Uniform integer in `0..n`. `n` must be non-zero.
    pub fn index(&mut self, n: usize) -> usize {
        self.rng.random_range(0..n)
    }

    /// Uniform choice over a fixed, non-empty set.
    pub fn choose<T: Copy, const N: usize>(&mut self, items: &[T; N]) -> T {
        items[self.index(N)]
    }

    /// Randomly selects an outcome index weighted by `probs`.
    ///
    /// `probs` should sum to one; any shortfall from rounding falls on the
    /// last outcome.
    pub fn pick_outcome(&mut self, probs: &[f64]) -> usize {
        let roll = self.uniform();

        let mut cumulative = 0.0;
        for (i, &p) in probs.iter().enumerate() {
            cumulative += p;
            if roll < cumulative {
                return i;
            }
        }
        probs.len().saturating_sub(1)
    }
}
