// src/simulation/mod.rs

//! Executes circuits against a [`StateVector`] and samples measurement outcomes.
//!
//! [`Simulator`] is the checked entry point: it runs whole circuits and verifies
//! normalization afterwards. The raw primitives live in [`engine`].

mod results;
pub mod engine;

pub use results::SimulationResult;

use crate::circuits::Circuit;
use crate::core::{NORM_TOLERANCE, SearchError, SearchResult, StateVector};
use crate::operations::Operation;
use crate::validation::check_normalization;

/// Runs circuits on state vectors, enforcing the normalization invariant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Simulator {
    tolerance: f64,
}

impl Default for Simulator {
    fn default() -> Self {
        Self { tolerance: NORM_TOLERANCE }
    }
}

impl Simulator {
    /// Creates a new Simulator with the default drift tolerance (1e-9).
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the allowed deviation of the squared norm from 1.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Applies every operation of `circuit` to `state`, then checks normalization.
    ///
    /// # Returns
    /// * `Err(SearchError::InvalidOperation)` if the circuit addresses qubits the
    ///   state does not have.
    /// * `Err(SearchError::SimulationDrift)` if the result is no longer normalized.
    pub fn run(&self, circuit: &Circuit, state: &mut StateVector) -> SearchResult<()> {
        if circuit.is_empty() {
            return Ok(());
        }
        if circuit.width() > state.num_qubits() {
            return Err(SearchError::invalid_op(format!(
                "Circuit spans {} qubits but the state has {}",
                circuit.width(),
                state.num_qubits()
            )));
        }
        for op in circuit.operations() {
            match op {
                Operation::Gate { gate, targets } => engine::apply_gate(state, gate, targets)?,
                Operation::Controlled { gate, controls, targets } => {
                    engine::apply_controlled_gate(state, gate, controls, targets)?
                }
            }
        }
        self.check(state)
    }

    /// Checks the normalization invariant with this simulator's tolerance.
    pub fn check(&self, state: &StateVector) -> SearchResult<()> {
        check_normalization(state, Some(self.tolerance))
    }

    /// Single-shot measurement; consumes the state.
    pub fn measure(&self, state: StateVector, seed: u64) -> SearchResult<usize> {
        self.check(&state)?;
        engine::measure(state, seed)
    }

    /// Samples `shots` outcomes, keeping only the bits above `drop_low_bits`
    /// (i.e. the marginal distribution of the leading qubits).
    pub fn sample(
        &self,
        state: &StateVector,
        shots: usize,
        drop_low_bits: usize,
        seed: u64,
    ) -> SearchResult<SimulationResult> {
        self.check(state)?;
        let outcomes = engine::sample_shots(state, shots, seed)?;
        Ok(outcomes.into_iter().map(|index| (index >> drop_low_bits) as u64).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuits::CircuitBuilder;
    use crate::operations::Gate;
    use num_complex::Complex64;

    #[test]
    fn test_empty_circuit_is_noop() -> SearchResult<()> {
        let mut state = StateVector::new(2)?;
        Simulator::new().run(&Circuit::new(), &mut state)?;
        assert_eq!(state.probability(0), 1.0);
        Ok(())
    }

    #[test]
    fn test_bell_pair_sampling() -> SearchResult<()> {
        let circuit = CircuitBuilder::new()
            .add_op(Operation::gate(Gate::hadamard(), vec![0]))
            .add_op(Operation::controlled(Gate::pauli_x(), vec![0], vec![1]))
            .build();
        let mut state = StateVector::new(2)?;
        let sim = Simulator::new();
        sim.run(&circuit, &mut state)?;

        let result = sim.sample(&state, 500, 0, 11)?;
        assert_eq!(result.shots(), 500);
        assert_eq!(result.count(0b01) + result.count(0b10), 0, "{}", result);
        assert!(result.count(0b00) > 150 && result.count(0b11) > 150, "{}", result);
        Ok(())
    }

    #[test]
    fn test_marginal_sampling_drops_low_bits() -> SearchResult<()> {
        let circuit = CircuitBuilder::new()
            .add_op(Operation::gate(Gate::pauli_x(), vec![0]))
            .add_op(Operation::gate(Gate::hadamard(), vec![2]))
            .build();
        let mut state = StateVector::new(3)?;
        let sim = Simulator::new();
        sim.run(&circuit, &mut state)?;
        let result = sim.sample(&state, 100, 1, 5)?;
        assert_eq!(result.count(0b10), 100);
        assert_eq!(result.most_frequent(), Some(0b10));
        Ok(())
    }

    #[test]
    fn test_circuit_wider_than_state_is_rejected() -> SearchResult<()> {
        let circuit = CircuitBuilder::new()
            .add_op(Operation::gate(Gate::hadamard(), vec![3]))
            .build();
        let mut state = StateVector::new(2)?;
        let err = Simulator::new().run(&circuit, &mut state);
        assert!(matches!(err, Err(SearchError::InvalidOperation { .. })));
        Ok(())
    }

    #[test]
    fn test_unnormalized_state_is_drift() -> SearchResult<()> {
        let state = StateVector::from_amplitudes(vec![Complex64::new(0.5, 0.0), Complex64::new(0.5, 0.0)])?;
        let err = Simulator::new().measure(state, 1);
        assert!(matches!(err, Err(SearchError::SimulationDrift { .. })));
        Ok(())
    }

    #[test]
    fn test_outcome_statistics() {
        let result: SimulationResult = [1u64, 1, 3, 3, 3, 5].into_iter().collect();
        assert_eq!(result.most_frequent(), Some(3));
        assert!((result.mean() - 16.0 / 6.0).abs() < 1e-12);
        let expected_var = [1.0f64, 1.0, 3.0, 3.0, 3.0, 5.0]
            .iter()
            .map(|x| (x - 16.0 / 6.0).powi(2))
            .sum::<f64>()
            / 6.0;
        assert!((result.variance() - expected_var).abs() < 1e-12);
    }
}
