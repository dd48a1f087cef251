// src/validation/mod.rs

//! Numeric invariant checks for states and gate matrices.

use crate::core::{NORM_TOLERANCE, SearchError, SearchResult, StateVector, UNITARY_TOLERANCE};
use num_complex::Complex64;

/// Checks that the state vector is normalized (sum of squared amplitudes ≈ 1.0).
///
/// # Arguments
/// * `state` - The `StateVector` to check.
/// * `tolerance` - Allowed deviation from 1.0. Defaults to `NORM_TOLERANCE` (1e-9).
///
/// # Returns
/// * `Ok(())` if normalized within tolerance.
/// * `Err(SearchError::SimulationDrift)` otherwise. Drift is never corrected silently.
pub fn check_normalization(state: &StateVector, tolerance: Option<f64>) -> SearchResult<()> {
    let tolerance = tolerance.unwrap_or(NORM_TOLERANCE);
    let norm = state.norm_sqr();
    if (norm - 1.0).abs() > tolerance || !norm.is_finite() {
        Err(SearchError::SimulationDrift { norm, tolerance })
    } else {
        Ok(())
    }
}

/// Checks that a row-major `dim x dim` matrix is unitary (`U†U = I` element-wise
/// within `UNITARY_TOLERANCE`).
pub fn check_unitary(matrix: &[Complex64], dim: usize) -> SearchResult<()> {
    if matrix.len() != dim * dim {
        return Err(SearchError::invalid_op(format!(
            "Matrix has {} entries, expected {}x{}",
            matrix.len(),
            dim,
            dim
        )));
    }
    for row in 0..dim {
        for col in 0..dim {
            // (U†U)[row][col] = Σ_k conj(U[k][row]) * U[k][col]
            let entry: Complex64 = (0..dim)
                .map(|k| matrix[k * dim + row].conj() * matrix[k * dim + col])
                .sum();
            let expected = if row == col { 1.0 } else { 0.0 };
            if (entry - Complex64::new(expected, 0.0)).norm() > UNITARY_TOLERANCE {
                return Err(SearchError::invalid_op(format!(
                    "Matrix is not unitary: (U†U)[{}][{}] = {}",
                    row, col, entry
                )));
            }
        }
    }
    Ok(())
}

/// Whether two states agree component-wise within `tolerance`.
pub fn states_approx_equal(a: &StateVector, b: &StateVector, tolerance: f64) -> bool {
    a.dim() == b.dim()
        && a
            .vector()
            .iter()
            .zip(b.vector())
            .all(|(x, y)| (x - y).norm_sqr() < tolerance * tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_1_SQRT_2;

    #[test]
    fn drifted_state_is_reported() -> SearchResult<()> {
        let state = StateVector::from_amplitudes(vec![
            Complex64::new(0.8, 0.0),
            Complex64::new(0.8, 0.0),
        ])?;
        match check_normalization(&state, None) {
            Err(SearchError::SimulationDrift { norm, .. }) => assert!((norm - 1.28).abs() < 1e-12),
            other => panic!("expected drift, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn hadamard_matrix_is_unitary() {
        let h = FRAC_1_SQRT_2;
        let matrix = [
            Complex64::new(h, 0.0),
            Complex64::new(h, 0.0),
            Complex64::new(h, 0.0),
            Complex64::new(-h, 0.0),
        ];
        assert!(check_unitary(&matrix, 2).is_ok());
    }

    #[test]
    fn scaled_identity_is_rejected() {
        let matrix = [
            Complex64::new(2.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(2.0, 0.0),
        ];
        assert!(matches!(check_unitary(&matrix, 2), Err(SearchError::InvalidOperation { .. })));
    }
}
