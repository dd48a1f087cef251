// src/core/state.rs

use num_complex::Complex64;
use num_traits::Zero;
use std::fmt;

use super::constants::qsearch_constants::AMPLITUDE_TOLERANCE;
use super::error::{SearchError, SearchResult};

/// Amplitude vector of an `n`-qubit register.
///
/// Holds `2^n` complex amplitudes. Qubit `q` corresponds to bit position
/// `n - 1 - q` of a basis index, so qubit 0 is the most significant bit.
/// A state is owned by exactly one simulation run and is recreated per attempt.
#[derive(Debug, Clone, PartialEq)] // Avoid Eq for floating-point complex numbers
pub struct StateVector {
    amplitudes: Vec<Complex64>,
    num_qubits: usize,
}

impl StateVector {
    /// Creates the all-zero basis state `|0...0>` on `num_qubits` qubits.
    pub fn new(num_qubits: usize) -> SearchResult<Self> {
        let dim = dimension(num_qubits)?;
        let mut amplitudes = vec![Complex64::zero(); dim];
        amplitudes[0] = Complex64::new(1.0, 0.0);
        Ok(Self { amplitudes, num_qubits })
    }

    /// Wraps an explicit amplitude vector. The length must be a power of two.
    /// Normalization is not enforced here; validation happens during simulation.
    pub fn from_amplitudes(amplitudes: Vec<Complex64>) -> SearchResult<Self> {
        let dim = amplitudes.len();
        if dim == 0 || !dim.is_power_of_two() {
            return Err(SearchError::invalid_op(format!(
                "State vector length {} is not a power of two",
                dim
            )));
        }
        let num_qubits = dim.trailing_zeros() as usize;
        Ok(Self { amplitudes, num_qubits })
    }

    /// Provides read-only access to the amplitudes.
    pub fn vector(&self) -> &[Complex64] {
        &self.amplitudes
    }

    pub(crate) fn vector_mut(&mut self) -> &mut [Complex64] {
        &mut self.amplitudes
    }

    /// Number of basis states (`2^n`).
    pub fn dim(&self) -> usize {
        self.amplitudes.len()
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Sum of squared amplitude magnitudes.
    pub fn norm_sqr(&self) -> f64 {
        self.amplitudes.iter().map(|c| c.norm_sqr()).sum()
    }

    /// Measurement probability of every basis index.
    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(|c| c.norm_sqr()).collect()
    }

    /// Probability of observing `index`; zero when out of range.
    pub fn probability(&self, index: usize) -> f64 {
        self.amplitudes.get(index).map_or(0.0, |c| c.norm_sqr())
    }

    /// Multiplies every amplitude by `factor` (a global phase when `|factor| = 1`).
    pub fn scale(&mut self, factor: Complex64) {
        for amp in &mut self.amplitudes {
            *amp *= factor;
        }
    }

    /// Bit mask selecting `qubit` inside a basis index.
    pub(crate) fn qubit_mask(&self, qubit: usize) -> usize {
        1 << (self.num_qubits - 1 - qubit)
    }
}

/// `2^num_qubits`, failing instead of overflowing.
pub(crate) fn dimension(num_qubits: usize) -> SearchResult<usize> {
    u32::try_from(num_qubits)
        .ok()
        .and_then(|n| 1usize.checked_shl(n))
        .ok_or_else(|| {
            SearchError::config(format!(
                "{} qubits overflow the addressable state vector dimension",
                num_qubits
            ))
        })
}

impl fmt::Display for StateVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Only basis states with non-negligible weight are listed.
        write!(f, "State[{} qubits:", self.num_qubits)?;
        for (i, c) in self.amplitudes.iter().enumerate() {
            if c.norm_sqr() >= AMPLITUDE_TOLERANCE {
                write!(f, " |{:0width$b}>: {:.4}", i, c, width = self.num_qubits.max(1))?;
            }
        }
        write!(f, "]")
    }
}
