use crate::core::errors::ParameterError;
use crate::core::utils::outer_product;
use ndarray::{Array1, Array2, array};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_1_SQRT_2;
use std::fmt;
use std::str::FromStr;

/// A pure single-qubit state $\alpha|0\rangle + \beta|1\rangle$.
#[derive(Clone, Debug, PartialEq)]
pub struct QubitState {
    pub amplitudes: Array1<Complex64>,
}

impl QubitState {
    fn real(alpha: f64, beta: f64) -> Self {
        Self {
            amplitudes: array![Complex64::new(alpha, 0.0), Complex64::new(beta, 0.0)],
        }
    }

    /// $|0\rangle$
    pub fn zero() -> Self {
        Self::real(1.0, 0.0)
    }

    /// $|1\rangle$
    pub fn one() -> Self {
        Self::real(0.0, 1.0)
    }

    /// $|+\rangle = (|0\rangle + |1\rangle)/\sqrt{2}$
    pub fn plus() -> Self {
        Self::real(FRAC_1_SQRT_2, FRAC_1_SQRT_2)
    }

    /// $|-\rangle = (|0\rangle - |1\rangle)/\sqrt{2}$
    pub fn minus() -> Self {
        Self::real(FRAC_1_SQRT_2, -FRAC_1_SQRT_2)
    }

    /// The state orthogonal to this one, $(-\beta^*, \alpha^*)$.
    pub fn orthogonal(&self) -> Self {
        let alpha = self.amplitudes[0];
        let beta = self.amplitudes[1];
        Self {
            amplitudes: array![-beta.conj(), alpha.conj()],
        }
    }

    /// $|\langle\phi|\psi\rangle|^2$
    pub fn overlap(&self, other: &QubitState) -> f64 {
        self.amplitudes
            .iter()
            .zip(other.amplitudes.iter())
            .map(|(a, b)| b.conj() * a)
            .sum::<Complex64>()
            .norm_sqr()
    }

    /// Density matrix $|\psi\rangle\langle\psi|$.
    pub fn projector(&self) -> Array2<Complex64> {
        outer_product(&self.amplitudes, &self.amplitudes)
    }
}

/// The four maximally entangled two-qubit states.
///
/// Qubit order is (Alice, Bob): index `2a + b` holds the amplitude of `|ab⟩`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BellState {
    /// $(|01\rangle - |10\rangle)/\sqrt{2}$, the singlet.
    #[default]
    PsiMinus,
    /// $(|01\rangle + |10\rangle)/\sqrt{2}$
    PsiPlus,
    /// $(|00\rangle - |11\rangle)/\sqrt{2}$
    PhiMinus,
    /// $(|00\rangle + |11\rangle)/\sqrt{2}$
    PhiPlus,
}

impl BellState {
    pub const ALL: [BellState; 4] = [
        BellState::PsiMinus,
        BellState::PsiPlus,
        BellState::PhiMinus,
        BellState::PhiPlus,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BellState::PsiMinus => "psi_minus",
            BellState::PsiPlus => "psi_plus",
            BellState::PhiMinus => "phi_minus",
            BellState::PhiPlus => "phi_plus",
        }
    }

    /// Ket notation used in reports, e.g. `|ψ⁻⟩`.
    pub fn ket(self) -> &'static str {
        match self {
            BellState::PsiMinus => "|ψ⁻⟩",
            BellState::PsiPlus => "|ψ⁺⟩",
            BellState::PhiMinus => "|φ⁻⟩",
            BellState::PhiPlus => "|φ⁺⟩",
        }
    }

    pub fn amplitudes(self) -> Array1<Complex64> {
        let h = FRAC_1_SQRT_2;
        let (a00, a01, a10, a11) = match self {
            BellState::PsiMinus => (0.0, h, -h, 0.0),
            BellState::PsiPlus => (0.0, h, h, 0.0),
            BellState::PhiMinus => (h, 0.0, 0.0, -h),
            BellState::PhiPlus => (h, 0.0, 0.0, h),
        };
        array![a00, a01, a10, a11].mapv(|x| Complex64::new(x, 0.0))
    }
}

impl fmt::Display for BellState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BellState {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        BellState::ALL
            .into_iter()
            .find(|state| state.name() == normalized)
            .ok_or_else(|| ParameterError::UnknownBellState(s.to_string()))
    }
}

/// A two-qubit mixed state shared by Alice and Bob.
#[derive(Clone, Debug, PartialEq)]
pub struct QuantumState {
    pub density_matrix: Array2<Complex64>,
    pub num_qubits: usize,
}

impl QuantumState {
    /// Pure Bell state $|\beta\rangle\langle\beta|$.
    pub fn bell(state: BellState) -> Self {
        let amplitudes = state.amplitudes();
        Self {
            density_matrix: outer_product(&amplitudes, &amplitudes),
            num_qubits: 2,
        }
    }

    /// Depolarizing channel on the pair: $\rho' = (1-p)\rho + p\,I/4$.
    ///
    /// `p` must already be validated to lie in [0, 1].
    pub fn depolarize(&mut self, p: f64) {
        let dim = 1 << self.num_qubits;
        let white = Array2::<Complex64>::eye(dim).mapv(|x| x * (p / dim as f64));
        self.density_matrix = self.density_matrix.mapv(|x| x * (1.0 - p)) + white;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::utils::{TOLERANCE, trace};

    #[test]
    fn b92_states_overlap_by_one_half() {
        let overlap = QubitState::zero().overlap(&QubitState::plus());
        assert!((overlap - 0.5).abs() < TOLERANCE);
    }

    #[test]
    fn orthogonal_states_have_zero_overlap() {
        for state in [QubitState::zero(), QubitState::plus(), QubitState::minus()] {
            assert!(state.overlap(&state.orthogonal()) < TOLERANCE);
        }
        let flipped = QubitState::zero().orthogonal();
        assert!((flipped.overlap(&QubitState::one()) - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn bell_state_names_round_trip() {
        for state in BellState::ALL {
            assert_eq!(state.name().parse::<BellState>(), Ok(state));
        }
        assert_eq!("Psi-Minus".parse::<BellState>(), Ok(BellState::PsiMinus));
        assert!(matches!(
            "ghz".parse::<BellState>(),
            Err(ParameterError::UnknownBellState(_))
        ));
    }

    #[test]
    fn depolarized_state_keeps_unit_trace() {
        let mut state = QuantumState::bell(BellState::PhiPlus);
        state.depolarize(0.3);
        assert!((trace(&state.density_matrix).re - 1.0).abs() < TOLERANCE);
        // Diagonal weight of |01> is the white-noise share p/4.
        assert!((state.density_matrix[[1, 1]].re - 0.075).abs() < TOLERANCE);
    }
}
