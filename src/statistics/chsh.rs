//! CHSH correlations over the Bell-test subset.

use crate::core::utils::spin;
use crate::protocols::qkd::e91::AnalyzerBasis;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// An ordered pair of different analyzer bases.
///
/// Only mismatched bases enter the Bell test, so the six variants cover
/// every combination a correlation can be recorded for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BellTestPair {
    ZX,
    ZD,
    XZ,
    XD,
    DZ,
    DX,
}

impl BellTestPair {
    pub const ALL: [BellTestPair; 6] = [
        BellTestPair::ZX,
        BellTestPair::ZD,
        BellTestPair::XZ,
        BellTestPair::XD,
        BellTestPair::DZ,
        BellTestPair::DX,
    ];

    /// `None` when both parties chose the same basis.
    pub fn from_bases(alice: AnalyzerBasis, bob: AnalyzerBasis) -> Option<Self> {
        use AnalyzerBasis::{D, X, Z};
        match (alice, bob) {
            (Z, X) => Some(BellTestPair::ZX),
            (Z, D) => Some(BellTestPair::ZD),
            (X, Z) => Some(BellTestPair::XZ),
            (X, D) => Some(BellTestPair::XD),
            (D, Z) => Some(BellTestPair::DZ),
            (D, X) => Some(BellTestPair::DX),
            _ => None,
        }
    }

    pub fn bases(self) -> (AnalyzerBasis, AnalyzerBasis) {
        use AnalyzerBasis::{D, X, Z};
        match self {
            BellTestPair::ZX => (Z, X),
            BellTestPair::ZD => (Z, D),
            BellTestPair::XZ => (X, Z),
            BellTestPair::XD => (X, D),
            BellTestPair::DZ => (D, Z),
            BellTestPair::DX => (D, X),
        }
    }

    /// `E_ab` with basis indices, e.g. `E_02` for (0°, 45°).
    pub fn label(self) -> &'static str {
        match self {
            BellTestPair::ZX => "E_01",
            BellTestPair::ZD => "E_02",
            BellTestPair::XZ => "E_10",
            BellTestPair::XD => "E_12",
            BellTestPair::DZ => "E_20",
            BellTestPair::DX => "E_21",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Running means of ±1-encoded outcome products per basis pair.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CorrelationSet {
    sums: [i64; 6],
    counts: [usize; 6],
}

impl CorrelationSet {
    pub fn record(&mut self, pair: BellTestPair, alice: bool, bob: bool) {
        self.sums[pair.slot()] += spin(alice) * spin(bob);
        self.counts[pair.slot()] += 1;
    }

    pub fn count(&self, pair: BellTestPair) -> usize {
        self.counts[pair.slot()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Mean outcome product for `pair`, or zero if no event hit it.
    pub fn correlation(&self, pair: BellTestPair) -> f64 {
        let n = self.counts[pair.slot()];
        if n == 0 {
            0.0
        } else {
            self.sums[pair.slot()] as f64 / n as f64
        }
    }

    /// $S = E(0°,45°) - E(0°,90°) + E(90°,45°) + E(90°,0°)$
    pub fn s_value(&self) -> f64 {
        self.correlation(BellTestPair::ZD) - self.correlation(BellTestPair::ZX)
            + self.correlation(BellTestPair::XD)
            + self.correlation(BellTestPair::XZ)
    }

    pub fn iter(&self) -> impl Iterator<Item = (BellTestPair, f64)> + '_ {
        BellTestPair::ALL
            .into_iter()
            .map(|pair| (pair, self.correlation(pair)))
    }
}

impl Serialize for CorrelationSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(BellTestPair::ALL.len()))?;
        for (pair, value) in self.iter() {
            map.serialize_entry(pair.label(), &value)?;
        }
        map.end()
    }
}
