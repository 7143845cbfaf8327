use crate::core::errors::MeasurementError;
use crate::core::state::{QuantumState, QubitState};
use crate::core::utils::{self, TOLERANCE};
use ndarray::{Array2, array};
use num_complex::Complex64;
use serde::Serialize;

/// What a detector reported for a single signal.
///
/// Serialized as an integer: `0`, `1`, `-1` for inconclusive and `-2`
/// when no photon arrived.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "i8")]
pub enum Detection {
    Bit(bool),
    Inconclusive,
    NoDetection,
}

impl Detection {
    /// The measured bit, if the detection was conclusive.
    pub fn bit(self) -> Option<bool> {
        match self {
            Detection::Bit(b) => Some(b),
            _ => None,
        }
    }

    pub fn is_conclusive(self) -> bool {
        matches!(self, Detection::Bit(_))
    }
}

impl From<Detection> for i8 {
    fn from(detection: Detection) -> i8 {
        match detection {
            Detection::Bit(false) => 0,
            Detection::Bit(true) => 1,
            Detection::Inconclusive => -1,
            Detection::NoDetection => -2,
        }
    }
}

/// Per-event record produced during a simulator's single pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MeasurementOutcome {
    pub index: usize,
    pub detection: Detection,
    /// Whether the event contributes to the sifted key.
    pub sifted: bool,
}

/// A positive operator-valued measure on one qubit.
#[derive(Clone, Debug)]
pub struct Povm {
    /// POVM elements $E_k$, summing to identity.
    pub elements: Vec<Array2<Complex64>>,
    /// Detection reported for each element.
    pub values: Vec<Detection>,
}

impl Povm {
    pub fn new(
        elements: Vec<Array2<Complex64>>,
        values: Vec<Detection>,
    ) -> Result<Self, MeasurementError> {
        if elements.len() != values.len() {
            return Err(MeasurementError::CountMismatch {
                ops: elements.len(),
                vals: values.len(),
            });
        }

        if elements.is_empty() {
            return Err(MeasurementError::InvalidDimensions);
        }

        for (i, op) in elements.iter().enumerate() {
            if op.dim() != (2, 2) {
                return Err(MeasurementError::InvalidDimensions);
            }
            if !utils::is_hermitian(op, TOLERANCE) {
                return Err(MeasurementError::NonHermitian(i));
            }
        }

        if !utils::check_povm_completeness(&elements, 2) {
            return Err(MeasurementError::NotComplete);
        }

        Ok(Self { elements, values })
    }

    /// Unambiguous state discrimination between two non-orthogonal states.
    ///
    /// - $E_0 = \frac{1}{2}(I - |s_1\rangle\langle s_1|)$: never fires on $s_1$, so a click means $s_0$.
    /// - $E_1 = \frac{1}{2}(I - |s_0\rangle\langle s_0|)$: never fires on $s_0$, so a click means $s_1$.
    /// - $E_? = I - E_0 - E_1$: inconclusive.
    ///
    /// For $|0\rangle$ and $|+\rangle$ each conclusive branch succeeds with
    /// probability 1/4, the textbook B92 yield.
    pub fn unambiguous(s0: &QubitState, s1: &QubitState) -> Result<Self, MeasurementError> {
        let identity = Array2::<Complex64>::eye(2);
        let half = Complex64::new(0.5, 0.0);

        let e0 = (&identity - &s1.projector()).mapv(|x| x * half);
        let e1 = (&identity - &s0.projector()).mapv(|x| x * half);
        let e_inconclusive = &identity - &e0 - &e1;

        Povm::new(
            vec![e0, e1, e_inconclusive],
            vec![
                Detection::Bit(false),
                Detection::Bit(true),
                Detection::Inconclusive,
            ],
        )
    }

    /// Born-rule outcome probabilities for a pure input state.
    pub fn probabilities(&self, state: &QubitState) -> Vec<f64> {
        self.elements
            .iter()
            .map(|e| utils::expectation(&state.amplitudes, e).max(0.0))
            .collect()
    }
}

/// Projective single-qubit measurement along the axis at Bloch angle
/// `theta` (radians) in the x-z plane.
///
/// Returns $\Pi_b = \frac{1}{2}(I \pm (\cos\theta\,Z + \sin\theta\,X))$,
/// with `+` for bit `false`.
pub fn analyzer_projector(theta: f64, bit: bool) -> Array2<Complex64> {
    let sign = if bit { -1.0 } else { 1.0 };
    let (s, c) = theta.sin_cos();
    let m = array![[1.0 + sign * c, sign * s], [sign * s, 1.0 - sign * c]];
    m.mapv(|x| Complex64::new(0.5 * x, 0.0))
}

/// Probability that both parties' analyzers report the same bit on a
/// shared two-qubit state.
pub fn same_outcome_probability(state: &QuantumState, alice_theta: f64, bob_theta: f64) -> f64 {
    [false, true]
        .into_iter()
        .map(|bit| {
            let joint = utils::kronecker_product(
                &analyzer_projector(alice_theta, bit),
                &analyzer_projector(bob_theta, bit),
            );
            utils::probability(&joint, &state.density_matrix)
        })
        .sum::<f64>()
        .clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::BellState;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn b92_povm_is_complete_and_unambiguous() {
        let povm = Povm::unambiguous(&QubitState::zero(), &QubitState::plus()).unwrap();

        let p_zero = povm.probabilities(&QubitState::zero());
        assert!((p_zero[0] - 0.25).abs() < TOLERANCE);
        assert!(p_zero[1].abs() < TOLERANCE);
        assert!((p_zero[2] - 0.75).abs() < TOLERANCE);

        let p_plus = povm.probabilities(&QubitState::plus());
        assert!(p_plus[0].abs() < TOLERANCE);
        assert!((p_plus[1] - 0.25).abs() < TOLERANCE);
    }

    #[test]
    fn povm_rejects_incomplete_elements() {
        let half = Array2::<Complex64>::eye(2).mapv(|x| x * 0.5);
        let err = Povm::new(vec![half], vec![Detection::Inconclusive]).unwrap_err();
        assert_eq!(err, MeasurementError::NotComplete);
    }

    #[test]
    fn povm_rejects_count_mismatch() {
        let eye = Array2::<Complex64>::eye(2);
        let err = Povm::new(vec![eye], vec![]).unwrap_err();
        assert_eq!(err, MeasurementError::CountMismatch { ops: 1, vals: 0 });
    }

    #[test]
    fn analyzer_projectors_sum_to_identity() {
        for theta in [0.0, 0.3, FRAC_PI_2, 2.0] {
            let sum = analyzer_projector(theta, false) + analyzer_projector(theta, true);
            assert!(utils::check_povm_completeness(&[sum], 2));
        }
    }

    #[test]
    fn singlet_is_anticorrelated_on_equal_axes() {
        let singlet = QuantumState::bell(BellState::PsiMinus);
        for theta in [0.0, 0.7, FRAC_PI_2] {
            assert!(same_outcome_probability(&singlet, theta, theta) < TOLERANCE);
        }
        let orthogonal_axes = same_outcome_probability(&singlet, 0.0, FRAC_PI_2);
        assert!((orthogonal_axes - 0.5).abs() < TOLERANCE);
    }

    #[test]
    fn detection_codes() {
        assert_eq!(i8::from(Detection::Bit(false)), 0);
        assert_eq!(i8::from(Detection::Bit(true)), 1);
        assert_eq!(i8::from(Detection::Inconclusive), -1);
        assert_eq!(i8::from(Detection::NoDetection), -2);
        assert_eq!(Detection::Bit(true).bit(), Some(true));
        assert!(!Detection::NoDetection.is_conclusive());
    }
}
