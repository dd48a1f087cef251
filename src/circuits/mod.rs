// src/circuits/mod.rs

//! Ordered sequences of [`Operation`]s and the circuit constructors the search
//! pipeline needs (quantum Fourier transform and its inverse).

use crate::operations::{Gate, Operation, qft_rotation};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// An ordered list of operations over a set of qubits.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Circuit {
    /// Every qubit referenced by at least one operation.
    qubits: BTreeSet<usize>,
    operations: Vec<Operation>,
}

impl Circuit {
    /// Creates a new, empty circuit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an operation, registering the qubits it touches.
    pub fn add_operation(&mut self, op: Operation) {
        self.qubits.extend(op.involved_qubits());
        self.operations.push(op);
    }

    /// Appends every operation from `ops`.
    pub fn add_operations<I>(&mut self, ops: I)
    where
        I: IntoIterator<Item = Operation>,
    {
        for op in ops {
            self.add_operation(op);
        }
    }

    /// Appends all operations of `other` after this circuit's.
    pub fn append(&mut self, other: Circuit) {
        self.add_operations(other.operations);
    }

    pub fn qubits(&self) -> &BTreeSet<usize> {
        &self.qubits
    }

    /// Smallest register size that can host this circuit.
    pub fn width(&self) -> usize {
        self.qubits.last().map_or(0, |q| q + 1)
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Number of layers when every operation is scheduled as early as the
    /// qubits it touches allow.
    pub fn depth(&self) -> usize {
        self.metrics().depth
    }

    pub fn metrics(&self) -> CircuitMetrics {
        let mut tracker = MetricsTracker::new();
        tracker.extend(self);
        tracker.finish()
    }
}

/// Gate count and depth of a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CircuitMetrics {
    pub gates: usize,
    pub depth: usize,
}

impl fmt::Display for CircuitMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} gates, depth {}", self.gates, self.depth)
    }
}

/// Accumulates [`CircuitMetrics`] operation by operation, so repeated
/// sub-circuits can be measured without materializing the full sequence.
#[derive(Debug, Clone, Default)]
pub struct MetricsTracker {
    /// First free layer per qubit.
    levels: Vec<usize>,
    metrics: CircuitMetrics,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: &Operation) {
        let qubits = op.involved_qubits();
        if let Some(&top) = qubits.iter().max() {
            if top >= self.levels.len() {
                self.levels.resize(top + 1, 0);
            }
        }
        let layer = qubits.iter().map(|&q| self.levels[q]).max().unwrap_or(0) + 1;
        for q in qubits {
            self.levels[q] = layer;
        }
        self.metrics.gates += 1;
        self.metrics.depth = self.metrics.depth.max(layer);
    }

    pub fn extend(&mut self, circuit: &Circuit) {
        for op in circuit.operations() {
            self.push(op);
        }
    }

    /// Appends `circuit` `times` times in a row.
    pub fn repeat(&mut self, circuit: &Circuit, times: usize) {
        for _ in 0..times {
            self.extend(circuit);
        }
    }

    pub fn finish(self) -> CircuitMetrics {
        self.metrics
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Circuit[{} ops on {} qubits]:", self.len(), self.qubits.len())?;
        for (i, op) in self.operations.iter().enumerate() {
            writeln!(f, "  {:>4}: {}", i, op)?;
        }
        Ok(())
    }
}

/// Method-chaining helper for constructing a [`Circuit`].
#[derive(Debug, Default)]
pub struct CircuitBuilder {
    circuit: Circuit,
}

impl CircuitBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_op(mut self, op: Operation) -> Self {
        self.circuit.add_operation(op);
        self
    }

    pub fn add_ops<I>(mut self, ops: I) -> Self
    where
        I: IntoIterator<Item = Operation>,
    {
        self.circuit.add_operations(ops);
        self
    }

    pub fn build(self) -> Circuit {
        self.circuit
    }
}

/// Quantum Fourier transform on `qubits` (first qubit most significant):
/// `|j> -> 2^(-t/2) Σ_r e^(2πi j r / 2^t) |r>`.
pub fn qft(qubits: &[usize]) -> Circuit {
    let mut circuit = Circuit::new();
    for (i, &target) in qubits.iter().enumerate() {
        circuit.add_operation(Operation::gate(Gate::hadamard(), vec![target]));
        for (j, &control) in qubits.iter().enumerate().skip(i + 1) {
            circuit.add_operation(Operation::controlled(
                Gate::phase(qft_rotation(j - i)),
                vec![control],
                vec![target],
            ));
        }
    }
    circuit.add_operations(bit_reversal(qubits));
    circuit
}

/// Inverse quantum Fourier transform on `qubits`, the exact adjoint of [`qft`].
pub fn inverse_qft(qubits: &[usize]) -> Circuit {
    let mut circuit = Circuit::new();
    circuit.add_operations(bit_reversal(qubits));
    for (i, &target) in qubits.iter().enumerate().rev() {
        for (j, &control) in qubits.iter().enumerate().skip(i + 1).rev() {
            circuit.add_operation(Operation::controlled(
                Gate::phase(-qft_rotation(j - i)),
                vec![control],
                vec![target],
            ));
        }
        circuit.add_operation(Operation::gate(Gate::hadamard(), vec![target]));
    }
    circuit
}

fn bit_reversal(qubits: &[usize]) -> Vec<Operation> {
    let t = qubits.len();
    (0..t / 2)
        .map(|i| Operation::gate(Gate::swap(), vec![qubits[i], qubits[t - 1 - i]]))
        .collect()
}
