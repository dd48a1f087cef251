// src/grover/mod.rs

//! Amplitude amplification: oracle phase flip followed by diffusion.
//!
//! With `M` marked indices in a register of dimension `D = 2^n`, the uniform
//! superposition starts at angle `θ = asin(sqrt(M/D))` from the unmarked
//! subspace and every round rotates it by `2θ`. After `k` rounds a measurement
//! lands on a marked index with probability `sin²((2k+1)θ)`, so running past
//! the optimum rotates back out again.

use crate::circuits::{Circuit, CircuitMetrics, MetricsTracker};
use crate::core::{Layout, PI, SearchError, SearchResult, StateVector};
use crate::operations::{Gate, Operation};
use crate::oracle::PhaseOracle;
use crate::simulation::{Simulator, engine};
use tracing::trace;

fn rotation_angle(marked: usize, dim: usize) -> Option<f64> {
    if marked == 0 || dim == 0 || marked >= dim {
        return None;
    }
    Some((marked as f64 / dim as f64).sqrt().asin())
}

/// Iteration count maximizing the success probability for `marked` of `dim`
/// indices: the integer nearest `π/(4θ) - 1/2`, which is
/// `(π/4)·sqrt(dim/marked) - 1/2` for small ratios. Zero when nothing is marked
/// or everything is.
pub fn optimal_iterations(marked: usize, dim: usize) -> usize {
    match rotation_angle(marked, dim) {
        Some(theta) => (PI / (4.0 * theta) - 0.5).round().max(0.0) as usize,
        None => 0,
    }
}

/// Probability that a measurement after `k` rounds yields a marked index.
pub fn success_probability(marked: usize, dim: usize, k: usize) -> f64 {
    if marked == 0 || dim == 0 {
        return 0.0;
    }
    match rotation_angle(marked, dim) {
        Some(theta) => ((2 * k + 1) as f64 * theta).sin().powi(2),
        None => 1.0,
    }
}

/// Largest iteration count the controller may use: `cap · max(k*, 1)`, floored.
pub fn iteration_cap(k_star: usize, over_rotation_cap: f64) -> usize {
    (over_rotation_cap * k_star.max(1) as f64).floor() as usize
}

/// Applies Grover rounds for one oracle.
#[derive(Debug, Clone, Copy)]
pub struct GroverIterator<'a> {
    oracle: &'a PhaseOracle,
    simulator: Simulator,
}

impl<'a> GroverIterator<'a> {
    pub fn new(oracle: &'a PhaseOracle, simulator: Simulator) -> Self {
        Self { oracle, simulator }
    }

    pub fn oracle(&self) -> &PhaseOracle {
        self.oracle
    }

    /// Uniform superposition over the whole search register, padding included.
    pub fn prepare_uniform(&self) -> SearchResult<StateVector> {
        let layout = Layout::search_only(self.oracle.num_qubits());
        let mut state = StateVector::new(layout.total())?;
        engine::apply_hadamard_layer(&mut state, &layout.search_qubits())?;
        Ok(state)
    }

    /// One round: oracle, then diffusion over the search qubits of `layout`.
    /// With `control` set, the whole round is conditioned on that qubit.
    pub fn apply_round(&self, state: &mut StateVector, layout: Layout, control: Option<usize>) -> SearchResult<()> {
        self.oracle.apply(state, layout, control)?;
        let controls: Vec<usize> = control.into_iter().collect();
        engine::apply_diffusion(state, &layout.search_qubits(), &controls)
    }

    /// Prepares the uniform state and applies `k` rounds, checking
    /// normalization after each one.
    pub fn run(&self, k: usize) -> SearchResult<StateVector> {
        let layout = Layout::search_only(self.oracle.num_qubits());
        let mut state = self.prepare_uniform()?;
        for round in 0..k {
            self.apply_round(&mut state, layout, None)?;
            self.simulator.check(&state)?;
            trace!(round, "Applied Grover round");
        }
        Ok(state)
    }

    /// Runs `k` rounds and measures once.
    pub fn sample(&self, k: usize, seed: u64) -> SearchResult<usize> {
        let state = self.run(k)?;
        self.simulator.measure(state, seed)
    }

    /// Share of `shots` measurements after `k` rounds that land on a marked index.
    pub fn valid_fraction(&self, k: usize, shots: usize, seed: u64) -> SearchResult<f64> {
        if shots == 0 {
            return Ok(1.0);
        }
        let histogram = self.simulator.sample(&self.run(k)?, shots, 0, seed)?;
        let valid: usize = histogram
            .counts()
            .iter()
            .filter(|&(&index, _)| self.oracle.is_marked(index as usize))
            .map(|(_, &count)| count)
            .sum();
        Ok(valid as f64 / shots as f64)
    }

    /// Gate-level form of one round: the oracle circuit, then
    /// `H X (multi-controlled Z) X H` over the search qubits.
    ///
    /// That diffusion sequence is `-(2|s><s| - I)`. With `control` set, a Z on
    /// the control qubit cancels the sign, so the controlled round is exact.
    /// Without one the circuit matches [`apply_round`](Self::apply_round) up to
    /// a global phase of -1.
    pub fn round_circuit(&self, layout: Layout, control: Option<usize>) -> SearchResult<Circuit> {
        let search = layout.search_qubits();
        let controls: Vec<usize> = control.into_iter().collect();
        let mut circuit = self.oracle.circuit(&search, &controls)?;

        let (&last, rest) = search
            .split_last()
            .ok_or_else(|| SearchError::invalid_op("Grover round has no search qubits"))?;
        circuit.add_operations(single_qubit_layer(Gate::hadamard, &search));
        circuit.add_operations(single_qubit_layer(Gate::pauli_x, &search));
        let mcz_controls = controls.iter().chain(rest).copied().collect();
        circuit.add_operation(Operation::controlled(Gate::pauli_z(), mcz_controls, vec![last]));
        circuit.add_operations(single_qubit_layer(Gate::pauli_x, &search));
        circuit.add_operations(single_qubit_layer(Gate::hadamard, &search));
        if let Some(c) = control {
            circuit.add_operation(Operation::gate(Gate::pauli_z(), vec![c]));
        }
        Ok(circuit)
    }

    /// Full gate-level search circuit: Hadamards, then `k` rounds.
    pub fn circuit(&self, k: usize) -> SearchResult<Circuit> {
        let layout = Layout::search_only(self.oracle.num_qubits());
        let round = self.round_circuit(layout, None)?;
        let mut circuit = hadamard_layer(&layout.search_qubits());
        for _ in 0..k {
            circuit.append(round.clone());
        }
        Ok(circuit)
    }

    /// Metrics of [`circuit`](Self::circuit) without building it.
    pub fn circuit_metrics(&self, k: usize) -> SearchResult<CircuitMetrics> {
        let layout = Layout::search_only(self.oracle.num_qubits());
        let mut tracker = MetricsTracker::new();
        tracker.extend(&hadamard_layer(&layout.search_qubits()));
        tracker.repeat(&self.round_circuit(layout, None)?, k);
        Ok(tracker.finish())
    }
}

fn single_qubit_layer(gate: fn() -> Gate, qubits: &[usize]) -> impl Iterator<Item = Operation> + '_ {
    qubits.iter().map(move |&q| Operation::gate(gate(), vec![q]))
}

pub(crate) fn hadamard_layer(qubits: &[usize]) -> Circuit {
    let mut circuit = Circuit::new();
    circuit.add_operations(single_qubit_layer(Gate::hadamard, qubits));
    circuit
}
