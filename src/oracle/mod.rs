// src/oracle/mod.rs

//! Phase-flip oracle marking candidate positions in the search register.

use crate::circuits::Circuit;
use crate::core::{Layout, SearchError, SearchResult, StateVector, register_qubits};
use crate::indexer::CandidateSet;
use crate::operations::{Gate, Operation};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Diagonal operator multiplying the amplitude of every marked index by -1.
///
/// Marked indices are always below the search space size `N`; padding indices
/// `N..2^n` are never marked. The operator is its own inverse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseOracle {
    marked: BTreeSet<usize>,
    search_space: usize,
    num_qubits: usize,
}

impl PhaseOracle {
    /// Builds the oracle for `positions` over a search space of `search_space`
    /// windows, dropping any position that falls into the padding region.
    pub fn new(positions: impl IntoIterator<Item = usize>, search_space: usize) -> SearchResult<Self> {
        if search_space == 0 {
            return Err(SearchError::config("Search space must contain at least one position"));
        }
        let (marked, padding): (BTreeSet<usize>, BTreeSet<usize>) =
            positions.into_iter().partition(|&p| p < search_space);
        if !padding.is_empty() {
            warn!(excluded = padding.len(), search_space, "Ignoring candidate positions in the padding region");
        }
        let num_qubits = register_qubits(search_space);
        debug!(marked = marked.len(), search_space, num_qubits, "Built phase oracle");
        Ok(Self { marked, search_space, num_qubits })
    }

    pub fn from_candidates(candidates: &CandidateSet) -> SearchResult<Self> {
        Self::new(candidates.positions().iter().copied(), candidates.search_space())
    }

    /// The same oracle with `position` no longer marked.
    #[must_use]
    pub fn without(&self, position: usize) -> Self {
        let mut marked = self.marked.clone();
        marked.remove(&position);
        Self { marked, ..*self }
    }

    pub fn marked(&self) -> &BTreeSet<usize> {
        &self.marked
    }

    pub fn marked_count(&self) -> usize {
        self.marked.len()
    }

    pub fn is_marked(&self, index: usize) -> bool {
        self.marked.contains(&index)
    }

    pub fn search_space(&self) -> usize {
        self.search_space
    }

    /// Search register size `n`.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Register dimension `2^n`, including padding.
    pub fn dim(&self) -> usize {
        1 << self.num_qubits
    }

    /// Applies the phase flip by direct diagonal multiplication to a state whose
    /// low `n` bits hold the search register (see [`Layout`]). When `control` is
    /// set, only basis states with that qubit at 1 are affected.
    pub fn apply(&self, state: &mut StateVector, layout: Layout, control: Option<usize>) -> SearchResult<()> {
        if layout.search != self.num_qubits || layout.total() != state.num_qubits() {
            return Err(SearchError::invalid_op(format!(
                "Oracle for {} qubits cannot act on layout {:?} of a {}-qubit state",
                self.num_qubits,
                layout,
                state.num_qubits()
            )));
        }
        let control_mask = match control {
            Some(q) if q < layout.counting => state.qubit_mask(q),
            Some(q) => {
                return Err(SearchError::invalid_op(format!(
                    "Oracle control qubit {} is not a counting qubit",
                    q
                )));
            }
            None => 0,
        };
        let n = self.num_qubits;
        let amps = state.vector_mut();
        for high in 0..(1usize << layout.counting) {
            let base = high << n;
            if base & control_mask != control_mask {
                continue;
            }
            for &m in &self.marked {
                amps[base | m] = -amps[base | m];
            }
        }
        Ok(())
    }

    /// Phase flip conditioned on counting qubit `control`.
    pub fn apply_controlled(&self, state: &mut StateVector, layout: Layout, control: usize) -> SearchResult<()> {
        self.apply(state, layout, Some(control))
    }

    /// The equivalent gate sequence on `search_qubits`: for each marked index,
    /// X on the qubits whose bit is 0, a multi-controlled Z, then the X gates again.
    pub fn circuit(&self, search_qubits: &[usize], controls: &[usize]) -> SearchResult<Circuit> {
        if search_qubits.len() != self.num_qubits {
            return Err(SearchError::invalid_op(format!(
                "Oracle needs {} search qubits, got {}",
                self.num_qubits,
                search_qubits.len()
            )));
        }
        let n = self.num_qubits;
        let mut circuit = Circuit::new();
        for &m in &self.marked {
            let flips: Vec<Operation> = search_qubits
                .iter()
                .enumerate()
                .filter(|(i, _)| (m >> (n - 1 - i)) & 1 == 0)
                .map(|(_, &q)| Operation::gate(Gate::pauli_x(), vec![q]))
                .collect();
            circuit.add_operations(flips.clone());
            let (&last, rest) = search_qubits
                .split_last()
                .ok_or_else(|| SearchError::invalid_op("Oracle has no search qubits"))?;
            let mcz_controls = controls.iter().chain(rest).copied().collect();
            circuit.add_operation(Operation::controlled(Gate::pauli_z(), mcz_controls, vec![last]));
            circuit.add_operations(flips);
        }
        Ok(circuit)
    }
}
