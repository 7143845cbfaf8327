//! Utility functions for the closed-form quantum models.
//!
//! This module contains helper functions for:
//! - Matrix operations (Kronecker product, trace, outer product).
//! - Born-rule expectation values of pure states.
//! - Completeness and Hermiticity checks for POVMs.
//! - Encoding of measurement bits as ±1 spin values.

use ndarray::{Array1, Array2};
use num_complex::Complex64;

/// Tolerance used by every operator check in the crate.
pub const TOLERANCE: f64 = 1e-9;

/// Computes the Kronecker (Tensor) product of two matrices.
///
/// If `A` is an $m \times n$ matrix and `B` is a $p \times q$ matrix,
/// the result is an $mp \times nq$ matrix. The first factor is the most
/// significant index, so `kronecker_product(alice, bob)` acts on `|ab⟩`.
pub fn kronecker_product(a: &Array2<Complex64>, b: &Array2<Complex64>) -> Array2<Complex64> {
    let (m, n) = a.dim();
    let (p, q) = b.dim();

    Array2::from_shape_fn((m * p, n * q), |(row, col)| {
        a[[row / p, col / q]] * b[[row % p, col % q]]
    })
}

/// Computes the trace of a matrix (sum of diagonal elements).
pub fn trace(matrix: &Array2<Complex64>) -> Complex64 {
    matrix.diag().sum()
}

/// Computes the outer product of two vectors $|a\rangle\langle b|$.
pub fn outer_product(a: &Array1<Complex64>, b: &Array1<Complex64>) -> Array2<Complex64> {
    let n = a.len();
    let m = b.len();
    let mut res = Array2::zeros((n, m));

    for i in 0..n {
        for j in 0..m {
            res[[i, j]] = a[i] * b[j].conj();
        }
    }
    res
}

/// Born-rule expectation $\langle\psi|E|\psi\rangle$ of a pure state.
///
/// Only the real part is returned; for a Hermitian `E` the imaginary
/// part vanishes up to rounding.
pub fn expectation(state: &Array1<Complex64>, operator: &Array2<Complex64>) -> f64 {
    let applied = operator.dot(state);
    state
        .iter()
        .zip(applied.iter())
        .map(|(s, a)| s.conj() * a)
        .sum::<Complex64>()
        .re
}

/// Real part of $\mathrm{Tr}[O\rho]$, clamped at zero.
///
/// Used for outcome probabilities, where tiny negative values only come
/// from floating point rounding.
pub fn probability(operator: &Array2<Complex64>, rho: &Array2<Complex64>) -> f64 {
    trace(&operator.dot(rho)).re.max(0.0)
}

/// Checks POVM completeness relation.
///
/// Verifies if $\sum E_k = I$.
pub fn check_povm_completeness(ops: &[Array2<Complex64>], dim: usize) -> bool {
    let mut sum = Array2::<Complex64>::zeros((dim, dim));
    for op in ops {
        sum += op;
    }
    let identity = Array2::<Complex64>::eye(dim);
    (sum - identity).iter().all(|x| x.norm() < TOLERANCE)
}

/// Checks if a matrix is Hermitian
pub fn is_hermitian(mat: &Array2<Complex64>, tol: f64) -> bool {
    mat.iter()
        .zip(mat.t().iter())
        .all(|(a, b)| (a - b.conj()).norm() < tol)
}

/// Maps a measurement bit to its spin value: `false -> +1`, `true -> -1`.
pub fn spin(bit: bool) -> i64 {
    if bit { -1 } else { 1 }
}
