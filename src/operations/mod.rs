// src/operations/mod.rs

//! Gates and the circuit operations that apply them.
//!
//! A [`Gate`] is a dense unitary on `k` qubits; an [`Operation`] binds a gate to
//! concrete target (and optionally control) qubits of a register.

use crate::core::{PI, SearchError, SearchResult};
use crate::validation::check_unitary;
use num_complex::Complex64;
use num_traits::{One, Zero};
use std::f64::consts::FRAC_1_SQRT_2;
use std::fmt;

/// A unitary acting on `arity` qubits, stored as a row-major `2^k x 2^k` matrix.
///
/// Row/column index bit `k - 1 - i` corresponds to the `i`-th target qubit, so the
/// first target is the most significant bit of the local index.
#[derive(Debug, Clone, PartialEq)]
pub struct Gate {
    name: String,
    arity: usize,
    matrix: Vec<Complex64>,
}

impl Gate {
    /// Builds a gate from an explicit matrix, validating its size and unitarity.
    pub fn from_matrix(name: impl Into<String>, arity: usize, matrix: Vec<Complex64>) -> SearchResult<Self> {
        if arity == 0 {
            return Err(SearchError::invalid_op("Gate must act on at least one qubit"));
        }
        let dim = 1usize << arity;
        check_unitary(&matrix, dim)?;
        Ok(Self { name: name.into(), arity, matrix })
    }

    // Constructors below build known-unitary matrices and skip validation.
    fn known(name: &str, arity: usize, matrix: Vec<Complex64>) -> Self {
        Self { name: name.to_string(), arity, matrix }
    }

    pub fn hadamard() -> Self {
        let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
        Self::known("H", 1, vec![h, h, h, -h])
    }

    pub fn pauli_x() -> Self {
        Self::known("X", 1, vec![Complex64::zero(), Complex64::one(), Complex64::one(), Complex64::zero()])
    }

    pub fn pauli_z() -> Self {
        Self::known("Z", 1, vec![Complex64::one(), Complex64::zero(), Complex64::zero(), -Complex64::one()])
    }

    /// `diag(1, e^(iθ))`
    pub fn phase(theta: f64) -> Self {
        Self::known(
            "P",
            1,
            vec![Complex64::one(), Complex64::zero(), Complex64::zero(), Complex64::from_polar(1.0, theta)],
        )
    }

    pub fn swap() -> Self {
        let (o, i) = (Complex64::zero(), Complex64::one());
        #[rustfmt::skip]
        let matrix = vec![
            i, o, o, o,
            o, o, i, o,
            o, i, o, o,
            o, o, o, i,
        ];
        Self::known("SWAP", 2, matrix)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of qubits the gate acts on.
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Local dimension `2^arity`.
    pub fn dim(&self) -> usize {
        1 << self.arity
    }

    pub fn matrix(&self) -> &[Complex64] {
        &self.matrix
    }

    pub(crate) fn entry(&self, row: usize, col: usize) -> Complex64 {
        self.matrix[row * self.dim() + col]
    }

    /// True when only the diagonal is populated.
    pub fn is_diagonal(&self) -> bool {
        let dim = self.dim();
        (0..dim).all(|r| (0..dim).all(|c| r == c || self.matrix[r * dim + c].is_zero()))
    }

    /// Conjugate transpose.
    pub fn adjoint(&self) -> Self {
        let dim = self.dim();
        let mut matrix = vec![Complex64::zero(); dim * dim];
        for r in 0..dim {
            for c in 0..dim {
                matrix[c * dim + r] = self.matrix[r * dim + c].conj();
            }
        }
        Self { name: format!("{}†", self.name), arity: self.arity, matrix }
    }
}

/// Angle of the controlled-phase rotation `R_k` used in the quantum Fourier transform.
pub fn qft_rotation(distance: usize) -> f64 {
    PI / (1u64 << distance) as f64
}

/// One step of a circuit.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Apply `gate` to `targets`.
    Gate {
        gate: Gate,
        targets: Vec<usize>,
    },
    /// Apply `gate` to `targets` only on basis states where every control qubit is 1.
    Controlled {
        gate: Gate,
        controls: Vec<usize>,
        targets: Vec<usize>,
    },
}

impl Operation {
    pub fn gate(gate: Gate, targets: Vec<usize>) -> Self {
        Operation::Gate { gate, targets }
    }

    pub fn controlled(gate: Gate, controls: Vec<usize>, targets: Vec<usize>) -> Self {
        if controls.is_empty() {
            Operation::Gate { gate, targets }
        } else {
            Operation::Controlled { gate, controls, targets }
        }
    }

    /// All qubits referenced by the operation.
    pub fn involved_qubits(&self) -> Vec<usize> {
        match self {
            Operation::Gate { targets, .. } => targets.clone(),
            Operation::Controlled { controls, targets, .. } => {
                controls.iter().chain(targets).copied().collect()
            }
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Gate { gate, targets } => write!(f, "{} {:?}", gate.name(), targets),
            Operation::Controlled { gate, controls, targets } => {
                write!(f, "C{} {:?} -> {:?}", gate.name(), controls, targets)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_gates_are_unitary() {
        for gate in [Gate::hadamard(), Gate::pauli_x(), Gate::pauli_z(), Gate::phase(0.3), Gate::swap()] {
            assert!(check_unitary(gate.matrix(), gate.dim()).is_ok(), "{} not unitary", gate.name());
        }
    }

    #[test]
    fn from_matrix_rejects_wrong_size() {
        let err = Gate::from_matrix("bad", 1, vec![Complex64::one(); 3]);
        assert!(matches!(err, Err(SearchError::InvalidOperation { .. })));
    }

    #[test]
    fn phase_adjoint_negates_angle() {
        let p = Gate::phase(0.7).adjoint();
        let expected = Gate::phase(-0.7);
        assert!((p.entry(1, 1) - expected.entry(1, 1)).norm() < 1e-12);
        assert!(p.is_diagonal());
        assert!(!Gate::hadamard().is_diagonal());
    }

    #[test]
    fn controlled_without_controls_collapses_to_gate() {
        let op = Operation::controlled(Gate::pauli_x(), vec![], vec![1]);
        assert!(matches!(op, Operation::Gate { .. }));
        let op = Operation::controlled(Gate::pauli_z(), vec![0, 2], vec![1]);
        assert_eq!(op.involved_qubits(), vec![0, 2, 1]);
    }
}
