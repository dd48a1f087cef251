// src/simulation/engine.rs

//! State-vector primitives.
//!
//! Everything the higher layers do to a register goes through
//! [`apply_controlled_gate`] (gate application by tensor contraction restricted
//! to the control subspace) and [`measure`] / [`sample_shots`]. Swapping the
//! backend means reimplementing this module, not the controller.

use crate::core::{PI, SearchError, SearchResult, StateVector};
use crate::operations::Gate;
use num_complex::Complex64;
use num_traits::Zero;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// Applies `gate` to `targets` on every basis state whose `controls` are all 1.
///
/// The first target is the most significant bit of the gate's local index.
/// Diagonal gates skip the gather/scatter and scale amplitudes in place.
pub fn apply_controlled_gate(
    state: &mut StateVector,
    gate: &Gate,
    controls: &[usize],
    targets: &[usize],
) -> SearchResult<()> {
    check_qubits(state, controls, targets)?;
    if gate.arity() != targets.len() {
        return Err(SearchError::invalid_op(format!(
            "Gate {} acts on {} qubits but {} targets were given",
            gate.name(),
            gate.arity(),
            targets.len()
        )));
    }

    let control_mask = controls.iter().fold(0, |acc, &q| acc | state.qubit_mask(q));
    let target_mask = targets.iter().fold(0, |acc, &q| acc | state.qubit_mask(q));
    let arity = gate.arity();
    let local_dim = gate.dim();
    // offsets[local] = basis-index bits contributed by the local index `local`
    let offsets: Vec<usize> = (0..local_dim)
        .map(|local| {
            targets
                .iter()
                .enumerate()
                .filter(|(i, _)| (local >> (arity - 1 - i)) & 1 == 1)
                .fold(0, |acc, (_, &q)| acc | state.qubit_mask(q))
        })
        .collect();
    let diagonal = gate.is_diagonal();

    let dim = state.dim();
    let amps = state.vector_mut();
    let mut gathered = vec![Complex64::zero(); local_dim];
    for base in 0..dim {
        if base & target_mask != 0 || base & control_mask != control_mask {
            continue;
        }
        if diagonal {
            for (local, offset) in offsets.iter().enumerate() {
                amps[base | offset] *= gate.entry(local, local);
            }
            continue;
        }
        for (slot, offset) in gathered.iter_mut().zip(&offsets) {
            *slot = amps[base | offset];
        }
        for (row, offset) in offsets.iter().enumerate() {
            amps[base | offset] = gathered
                .iter()
                .enumerate()
                .map(|(col, psi)| gate.entry(row, col) * psi)
                .sum();
        }
    }
    Ok(())
}

/// Applies `gate` to `targets` unconditionally.
pub fn apply_gate(state: &mut StateVector, gate: &Gate, targets: &[usize]) -> SearchResult<()> {
    apply_controlled_gate(state, gate, &[], targets)
}

/// Multiplies by `e^(iθ)` every basis state where `target` and all `controls` are 1.
pub fn apply_controlled_phase(
    state: &mut StateVector,
    controls: &[usize],
    target: usize,
    theta: f64,
) -> SearchResult<()> {
    apply_controlled_gate(state, &Gate::phase(theta), controls, &[target])
}

/// Hadamard on each qubit of `qubits`.
pub fn apply_hadamard_layer(state: &mut StateVector, qubits: &[usize]) -> SearchResult<()> {
    let h = Gate::hadamard();
    for &q in qubits {
        apply_gate(state, &h, &[q])?;
    }
    Ok(())
}

/// Reflection about the uniform superposition of `qubits`: `2|s><s| - I`,
/// applied only where every qubit in `controls` is 1.
///
/// Built as `H X (multi-controlled Z) X H`, which yields `I - 2|s><s|`; the
/// sign is then restored on the controlled subspace so the controlled form is
/// the exact operator rather than one up to a global phase.
pub fn apply_diffusion(state: &mut StateVector, qubits: &[usize], controls: &[usize]) -> SearchResult<()> {
    let Some((&last, rest)) = qubits.split_last() else {
        return Err(SearchError::invalid_op("Diffusion needs at least one qubit"));
    };
    let x = Gate::pauli_x();

    apply_hadamard_layer(state, qubits)?;
    for &q in qubits {
        apply_gate(state, &x, &[q])?;
    }
    let mcz_controls: Vec<usize> = controls.iter().chain(rest).copied().collect();
    apply_controlled_gate(state, &Gate::pauli_z(), &mcz_controls, &[last])?;
    for &q in qubits {
        apply_gate(state, &x, &[q])?;
    }
    apply_hadamard_layer(state, qubits)?;

    match controls.split_last() {
        None => state.scale(Complex64::new(-1.0, 0.0)),
        Some((&target, rest)) => apply_controlled_phase(state, rest, target, PI)?,
    }
    Ok(())
}

/// Samples one basis index with probability `|amp|^2` and consumes the state.
///
/// Deterministic for a given `seed`. The post-measurement state is discarded.
pub fn measure(state: StateVector, seed: u64) -> SearchResult<usize> {
    let cumulative = Cumulative::new(&state)?;
    let mut rng = StdRng::seed_from_u64(seed);
    Ok(cumulative.sample(&mut rng))
}

/// Draws `shots` independent samples from `state` without disturbing it.
///
/// Shots run on the rayon pool; shot `i` uses its own generator seeded with
/// `derive_seed(seed, i)`, so the result does not depend on thread scheduling.
pub fn sample_shots(state: &StateVector, shots: usize, seed: u64) -> SearchResult<Vec<usize>> {
    let cumulative = Cumulative::new(state)?;
    Ok((0..shots)
        .into_par_iter()
        .map(|shot| {
            let mut rng = StdRng::seed_from_u64(derive_seed(seed, shot as u64));
            cumulative.sample(&mut rng)
        })
        .collect())
}

/// Mixes a base seed with a stream number (splitmix64 finalizer).
pub fn derive_seed(seed: u64, stream: u64) -> u64 {
    let mut z = seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Cumulative distribution over basis indices.
struct Cumulative {
    sums: Vec<f64>,
    last_nonzero: usize,
}

impl Cumulative {
    fn new(state: &StateVector) -> SearchResult<Self> {
        let mut total = 0.0;
        let mut last_nonzero = None;
        let sums = state
            .vector()
            .iter()
            .enumerate()
            .map(|(i, amp)| {
                let p = amp.norm_sqr();
                if p > 0.0 {
                    last_nonzero = Some(i);
                }
                total += p;
                total
            })
            .collect();
        let last_nonzero = last_nonzero.ok_or(SearchError::SimulationDrift {
            norm: 0.0,
            tolerance: crate::core::NORM_TOLERANCE,
        })?;
        Ok(Self { sums, last_nonzero })
    }

    fn sample<R: Rng>(&self, rng: &mut R) -> usize {
        let total = self.sums[self.sums.len() - 1];
        let target = rng.random::<f64>() * total;
        // First index whose cumulative weight exceeds the target; never a zero-probability index.
        self.sums
            .partition_point(|&c| c <= target)
            .min(self.last_nonzero)
    }
}

fn check_qubits(state: &StateVector, controls: &[usize], targets: &[usize]) -> SearchResult<()> {
    if targets.is_empty() {
        return Err(SearchError::invalid_op("Operation has no target qubits"));
    }
    let mut seen = 0usize;
    for &q in controls.iter().chain(targets) {
        if q >= state.num_qubits() {
            return Err(SearchError::invalid_op(format!(
                "Qubit {} out of range for a {}-qubit register",
                q,
                state.num_qubits()
            )));
        }
        let mask = state.qubit_mask(q);
        if seen & mask != 0 {
            return Err(SearchError::invalid_op(format!("Qubit {} used more than once", q)));
        }
        seen |= mask;
    }
    Ok(())
}
