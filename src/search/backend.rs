// src/search/backend.rs

//! The narrow interface between the controller and whatever executes the
//! quantum subroutines.

use crate::core::SearchResult;
use crate::counting::{CountEstimate, QuantumCounter};
use crate::grover::GroverIterator;
use crate::oracle::PhaseOracle;
use crate::simulation::Simulator;

/// Executes counting and amplification for the adaptive controller.
pub trait SearchBackend {
    /// Estimates how many indices `oracle` marks.
    fn count(&self, oracle: &PhaseOracle, seed: u64) -> SearchResult<CountEstimate>;

    /// Runs `k` Grover rounds and returns one measured index.
    fn amplify(&self, oracle: &PhaseOracle, k: usize, seed: u64) -> SearchResult<usize>;
}

/// Dense state-vector simulation of both subroutines.
#[derive(Debug, Clone, Copy)]
pub struct StateVectorBackend {
    counter: QuantumCounter,
    simulator: Simulator,
}

impl StateVectorBackend {
    pub fn new(counter: QuantumCounter, simulator: Simulator) -> Self {
        Self { counter: counter.with_simulator(simulator), simulator }
    }

    pub fn counter(&self) -> &QuantumCounter {
        &self.counter
    }
}

impl SearchBackend for StateVectorBackend {
    fn count(&self, oracle: &PhaseOracle, seed: u64) -> SearchResult<CountEstimate> {
        self.counter.estimate(oracle, seed)
    }

    fn amplify(&self, oracle: &PhaseOracle, k: usize, seed: u64) -> SearchResult<usize> {
        GroverIterator::new(oracle, self.simulator).sample(k, seed)
    }
}

impl<B: SearchBackend + ?Sized> SearchBackend for &B {
    fn count(&self, oracle: &PhaseOracle, seed: u64) -> SearchResult<CountEstimate> {
        (**self).count(oracle, seed)
    }

    fn amplify(&self, oracle: &PhaseOracle, k: usize, seed: u64) -> SearchResult<usize> {
        (**self).amplify(oracle, k, seed)
    }
}
