// src/counting/mod.rs

//! Quantum counting: phase estimation over the Grover operator.
//!
//! The Grover operator `G` acts on the uniform superposition as a rotation by
//! `2θ` with `sin²θ = M / 2^n`, so its eigenphases are `±2θ`. With `t` counting
//! qubits the inverse QFT concentrates the counting register near
//! `r ≈ θ·2^t/π` (or the mirrored `2^t - r`). Both read back the same count.

use crate::circuits::{Circuit, CircuitMetrics, MetricsTracker, inverse_qft};
use crate::core::{Layout, PI, SearchError, SearchResult, StateVector};
use crate::grover::{GroverIterator, hadamard_layer};
use crate::oracle::PhaseOracle;
use crate::simulation::{SimulationResult, Simulator, engine};
use serde::Serialize;
use tracing::debug;

/// Result of one counting run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountEstimate {
    /// Rounded count, clipped to `[0, N]`.
    pub estimate: usize,
    /// Unrounded `2^n · sin²(π r / 2^t)`.
    pub raw: f64,
    /// Estimated rotation angle `θ = π r / 2^t`.
    pub phase: f64,
    /// Most frequent counting-register outcome `r`.
    pub outcome: u64,
    /// Approximate additive error of `estimate` for this precision.
    pub error_bound: f64,
    /// Every sampled counting-register outcome.
    pub histogram: SimulationResult,
    precision: usize,
    dim: usize,
}

impl CountEstimate {
    /// Builds an estimate from sampled counting-register outcomes. The mode of
    /// the histogram is taken as `r`.
    ///
    /// # Errors
    /// `SearchError::Configuration` when `precision` is outside `1..63`.
    pub fn from_histogram(
        histogram: SimulationResult,
        precision: usize,
        dim: usize,
        search_space: usize,
    ) -> SearchResult<Self> {
        check_precision(precision)?;
        let outcome = histogram
            .most_frequent()
            .ok_or_else(|| SearchError::invalid_op("Counting produced no samples"))?;
        let phase = PI * outcome as f64 / register_scale(precision);
        let raw = dim as f64 * phase.sin().powi(2);
        let estimate = (raw.round().max(0.0) as usize).min(search_space);
        let error_bound = error_bound(estimate, dim, precision);
        Ok(Self { estimate, raw, phase, outcome, error_bound, histogram, precision, dim })
    }

    /// Shot-weighted mean of the counting-register outcomes.
    pub fn mean_outcome(&self) -> f64 {
        self.histogram.mean()
    }

    pub fn outcome_variance(&self) -> f64 {
        self.histogram.variance()
    }

    /// `(absolute, relative)` error against a known count. The relative error
    /// is 0 when `true_m` is 0.
    pub fn errors_against(&self, true_m: usize) -> (f64, f64) {
        let absolute = (self.estimate as f64 - true_m as f64).abs();
        let relative = if true_m == 0 { 0.0 } else { absolute / true_m as f64 };
        (absolute, relative)
    }

    /// Ideal `θ = asin(sqrt(M / 2^n))` for a known count, `None` when
    /// `true_m` is 0.
    pub fn expected_phase(&self, true_m: usize) -> Option<f64> {
        (true_m > 0).then(|| (true_m.min(self.dim) as f64 / self.dim as f64).sqrt().asin())
    }

    /// Distance between the estimated and the ideal phase. The mirrored
    /// outcome `2^t - r` reads back as `π - θ`, so it is folded first.
    pub fn phase_error(&self, true_m: usize) -> Option<f64> {
        let folded = self.phase.min(PI - self.phase);
        self.expected_phase(true_m).map(|expected| (folded - expected).abs())
    }

    /// True when every sampled outcome, not only the mode, reads back as zero.
    pub fn is_confident_zero(&self) -> bool {
        self.histogram
            .counts()
            .keys()
            .all(|&r| raw_count(r, self.precision, self.dim) < 0.5)
    }
}

fn check_precision(precision: usize) -> SearchResult<()> {
    if precision == 0 || precision >= 63 {
        return Err(SearchError::config(format!(
            "Counting precision must be in 1..63, got {}",
            precision
        )));
    }
    Ok(())
}

// 2^t as a float; no shift, so any precision is safe here.
fn register_scale(precision: usize) -> f64 {
    (precision as f64).exp2()
}

fn raw_count(outcome: u64, precision: usize, dim: usize) -> f64 {
    let phase = PI * outcome as f64 / register_scale(precision);
    dim as f64 * phase.sin().powi(2)
}

/// Additive error bound of phase-estimation counting:
/// `2π·sqrt(M·D)/2^t + π²·D/2^(2t)` for register dimension `D`.
pub fn error_bound(marked: usize, dim: usize, precision: usize) -> f64 {
    let scale = register_scale(precision);
    2.0 * PI * ((marked * dim) as f64).sqrt() / scale + PI * PI * dim as f64 / (scale * scale)
}

/// Estimates the number of marked indices of an oracle.
#[derive(Debug, Clone, Copy)]
pub struct QuantumCounter {
    precision: usize,
    shots: usize,
    simulator: Simulator,
}

impl QuantumCounter {
    /// `precision` counting qubits, `shots` samples of the counting register.
    pub fn new(precision: usize, shots: usize) -> SearchResult<Self> {
        check_precision(precision)?;
        if shots == 0 {
            return Err(SearchError::config("Counting needs at least one shot"));
        }
        Ok(Self { precision, shots, simulator: Simulator::new() })
    }

    #[must_use]
    pub fn with_simulator(mut self, simulator: Simulator) -> Self {
        self.simulator = simulator;
        self
    }

    pub fn precision(&self) -> usize {
        self.precision
    }

    pub fn shots(&self) -> usize {
        self.shots
    }

    /// Runs phase estimation for `oracle` and samples the counting register.
    pub fn estimate(&self, oracle: &PhaseOracle, seed: u64) -> SearchResult<CountEstimate> {
        let layout = self.layout(oracle);
        let state = self.prepare(oracle, layout)?;
        let histogram = self.simulator.sample(&state, self.shots, layout.search, seed)?;
        let estimate = CountEstimate::from_histogram(histogram, self.precision, oracle.dim(), oracle.search_space())?;
        debug!(
            outcome = estimate.outcome,
            raw = estimate.raw,
            estimate = estimate.estimate,
            error_bound = estimate.error_bound,
            "Counting estimate"
        );
        Ok(estimate)
    }

    /// The full counting state before measurement: uniform superposition on
    /// both registers, controlled `G^(2^j)` from counting qubit `j`, then the
    /// inverse QFT on the counting register.
    pub fn prepare(&self, oracle: &PhaseOracle, layout: Layout) -> SearchResult<StateVector> {
        let mut state = StateVector::new(layout.total())?;
        let all: Vec<usize> = (0..layout.total()).collect();
        engine::apply_hadamard_layer(&mut state, &all)?;

        let grover = GroverIterator::new(oracle, self.simulator);
        for j in 0..layout.counting {
            let control = layout.counting_qubit_for_power(j);
            for _ in 0..(1usize << j) {
                grover.apply_round(&mut state, layout, Some(control))?;
            }
            self.simulator.check(&state)?;
        }

        self.simulator.run(&inverse_qft(&layout.counting_qubits()), &mut state)?;
        Ok(state)
    }

    fn layout(&self, oracle: &PhaseOracle) -> Layout {
        Layout { counting: self.precision, search: oracle.num_qubits() }
    }

    /// Gate-level counting circuit: Hadamards on both registers, the
    /// controlled rounds of [`GroverIterator::round_circuit`] repeated `2^j`
    /// times from counting qubit `j`, then the inverse QFT. Its size grows with
    /// `2^t`; [`circuit_metrics`](Self::circuit_metrics) measures it without
    /// building it.
    pub fn circuit(&self, oracle: &PhaseOracle) -> SearchResult<Circuit> {
        let layout = self.layout(oracle);
        let grover = GroverIterator::new(oracle, self.simulator);
        let all: Vec<usize> = (0..layout.total()).collect();
        let mut circuit = hadamard_layer(&all);
        for j in 0..layout.counting {
            let round = grover.round_circuit(layout, Some(layout.counting_qubit_for_power(j)))?;
            for _ in 0..(1usize << j) {
                circuit.append(round.clone());
            }
        }
        circuit.append(inverse_qft(&layout.counting_qubits()));
        Ok(circuit)
    }

    pub fn circuit_metrics(&self, oracle: &PhaseOracle) -> SearchResult<CircuitMetrics> {
        let layout = self.layout(oracle);
        let grover = GroverIterator::new(oracle, self.simulator);
        let all: Vec<usize> = (0..layout.total()).collect();
        let mut tracker = MetricsTracker::new();
        tracker.extend(&hadamard_layer(&all));
        for j in 0..layout.counting {
            let round = grover.round_circuit(layout, Some(layout.counting_qubit_for_power(j)))?;
            tracker.repeat(&round, 1usize << j);
        }
        tracker.extend(&inverse_qft(&layout.counting_qubits()));
        Ok(tracker.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_pattern_counts_zero() -> SearchResult<()> {
        let oracle = PhaseOracle::new(Vec::<usize>::new(), 12)?;
        let estimate = QuantumCounter::new(5, 32)?.estimate(&oracle, 3)?;
        assert_eq!(estimate.outcome, 0);
        assert_eq!(estimate.estimate, 0);
        assert!(estimate.is_confident_zero());
        assert_eq!(estimate.histogram.count(0), 32);
        Ok(())
    }

    #[test]
    fn absent_pattern_counts_zero_across_seeds() -> SearchResult<()> {
        let oracle = PhaseOracle::new(Vec::<usize>::new(), 12)?;
        let counter = QuantumCounter::new(4, 16)?;
        let mut zeros = 0;
        for seed in 0..100 {
            if counter.estimate(&oracle, seed)?.estimate == 0 {
                zeros += 1;
            }
        }
        assert!(zeros > 95, "only {} of 100 runs estimated zero", zeros);
        Ok(())
    }

    #[test]
    fn full_register_counts_everything() -> SearchResult<()> {
        let oracle = PhaseOracle::new(0..4, 4)?;
        let estimate = QuantumCounter::new(4, 16)?.estimate(&oracle, 1)?;
        assert_eq!(estimate.outcome, 8);
        assert_eq!(estimate.estimate, 4);
        Ok(())
    }

    #[test]
    fn partial_marking_is_estimated() -> SearchResult<()> {
        let oracle = PhaseOracle::new([1, 6, 13], 16)?;
        let counter = QuantumCounter::new(6, 64)?;
        let estimate = counter.estimate(&oracle, 42)?;
        assert_eq!(estimate.estimate, 3, "histogram: {}", estimate.histogram);
        assert!(estimate.error_bound > 0.0);
        assert_eq!(estimate.errors_against(3), (0.0, 0.0));
        assert!(!estimate.is_confident_zero());

        let expected = estimate.expected_phase(3).unwrap();
        assert!((expected - (3.0f64 / 16.0).sqrt().asin()).abs() < 1e-12);
        // Within one counting-register step of the ideal phase.
        assert!(estimate.phase_error(3).unwrap() <= PI / 64.0);
        assert_eq!(estimate.expected_phase(0), None);
        Ok(())
    }

    #[test]
    fn gate_level_circuit_matches_prepared_state() -> SearchResult<()> {
        let oracle = PhaseOracle::new([1, 2], 3)?;
        let counter = QuantumCounter::new(3, 8)?;
        let layout = Layout { counting: 3, search: 2 };
        let circuit = counter.circuit(&oracle)?;

        let mut state = StateVector::new(layout.total())?;
        Simulator::new().run(&circuit, &mut state)?;
        assert!(crate::validation::states_approx_equal(&state, &counter.prepare(&oracle, layout)?, 1e-9));
        assert_eq!(counter.circuit_metrics(&oracle)?, circuit.metrics());
        Ok(())
    }

    #[test]
    fn estimate_is_clipped_to_search_space() -> SearchResult<()> {
        // Five windows in an eight-state register, all marked.
        let oracle = PhaseOracle::new(0..5, 5)?;
        let estimate = QuantumCounter::new(6, 64)?.estimate(&oracle, 9)?;
        assert!(estimate.estimate <= 5);
        assert_eq!(estimate.estimate, 5, "histogram: {}", estimate.histogram);
        Ok(())
    }

    #[test]
    fn counting_state_stays_normalized() -> SearchResult<()> {
        let oracle = PhaseOracle::new([0, 2], 3)?;
        let counter = QuantumCounter::new(3, 8)?;
        let state = counter.prepare(&oracle, Layout { counting: 3, search: 2 })?;
        assert!((state.norm_sqr() - 1.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn statistics_and_errors() -> SearchResult<()> {
        let histogram: SimulationResult = [0u64, 0, 2, 2].into_iter().collect();
        let estimate = CountEstimate::from_histogram(histogram, 3, 4, 4)?;
        assert_eq!(estimate.outcome, 0);
        assert!(!estimate.is_confident_zero());
        assert!((estimate.mean_outcome() - 1.0).abs() < 1e-12);
        assert!((estimate.outcome_variance() - 1.0).abs() < 1e-12);
        assert_eq!(estimate.errors_against(0), (0.0, 0.0));
        assert_eq!(estimate.errors_against(2), (2.0, 1.0));
        Ok(())
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(QuantumCounter::new(0, 8).is_err());
        assert!(QuantumCounter::new(4, 0).is_err());
        let histogram: SimulationResult = [1u64].into_iter().collect();
        assert!(matches!(
            CountEstimate::from_histogram(histogram, 64, 4, 4),
            Err(SearchError::Configuration { .. })
        ));
        assert!(error_bound(1, 16, 64).is_finite());
    }
}
