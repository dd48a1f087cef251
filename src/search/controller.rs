// src/search/controller.rs

//! Adaptive feedback loop tying counting, amplification and verification
//! together as an explicit state machine.
//!
//! ```text
//! Counting ──M̂>0──▶ Amplifying ──▶ Verifying ──match──▶ Done / Counting (verify_all)
//!    │ M̂=0                              │ miss
//!    ▼                                  ▼
//!  Counting (recount) / Done        Retrying ──▶ Counting / Amplifying / Done
//! ```

use super::backend::SearchBackend;
use super::config::{RetryPolicy, SearchConfig};
use super::{MatchResult, SearchDiagnostics, SearchOutcome};
use crate::core::{SearchResult, register_qubits};
use crate::counting::{CountEstimate, QuantumCounter};
use crate::grover::{GroverIterator, iteration_cap, optimal_iterations};
use crate::indexer::CandidateSet;
use crate::oracle::PhaseOracle;
use crate::simulation::Simulator;
use crate::simulation::engine::derive_seed;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Controller state. Each variant carries the inputs of its next step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Counting,
    /// `randomized` draws `k` from `[0, cap]` instead of using `k*`.
    Amplifying { estimate: usize, randomized: bool },
    Verifying { position: usize },
    /// `collision` is set when the rejected position was a hash collision.
    Retrying { collision: bool },
    Done(SearchOutcome),
}

/// Drives one search to completion over a [`SearchBackend`].
#[derive(Debug)]
pub struct AdaptiveController<'a, B: SearchBackend> {
    text: &'a [char],
    pattern: &'a [char],
    config: &'a SearchConfig,
    backend: B,
    oracle: PhaseOracle,
    phase: Phase,
    stream: u64,
    found: BTreeSet<usize>,
    retries: usize,
    total_retries: usize,
    zero_recounts_left: usize,
    first_estimate: Option<CountEstimate>,
    last_estimate: usize,
    iterations_used: Vec<usize>,
    collisions_rejected: usize,
    candidates: usize,
    started: Instant,
    diagnostics: SearchDiagnostics,
    verified_samples: usize,
    marked_samples: usize,
}

impl<'a, B: SearchBackend> AdaptiveController<'a, B> {
    pub fn new(
        text: &'a [char],
        pattern: &'a [char],
        candidates: &CandidateSet,
        config: &'a SearchConfig,
        backend: B,
    ) -> SearchResult<Self> {
        config.validate()?;
        config.check_register(register_qubits(candidates.search_space()))?;
        Self::with_checked_config(text, pattern, candidates, config, backend)
    }

    /// [`new`](Self::new) for a `config` already validated against this
    /// candidate set's register size.
    pub(super) fn with_checked_config(
        text: &'a [char],
        pattern: &'a [char],
        candidates: &CandidateSet,
        config: &'a SearchConfig,
        backend: B,
    ) -> SearchResult<Self> {
        let oracle = PhaseOracle::from_candidates(candidates)?;
        Ok(Self {
            text,
            pattern,
            config,
            backend,
            oracle,
            phase: Phase::Counting,
            stream: 0,
            found: BTreeSet::new(),
            retries: 0,
            total_retries: 0,
            zero_recounts_left: config.zero_recounts,
            first_estimate: None,
            last_estimate: 0,
            iterations_used: Vec::new(),
            collisions_rejected: 0,
            candidates: candidates.len(),
            started: Instant::now(),
            diagnostics: SearchDiagnostics::default(),
            verified_samples: 0,
            marked_samples: 0,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn oracle(&self) -> &PhaseOracle {
        &self.oracle
    }

    pub fn found(&self) -> &BTreeSet<usize> {
        &self.found
    }

    pub fn is_done(&self) -> bool {
        matches!(self.phase, Phase::Done(_))
    }

    /// Performs one transition and returns the new phase.
    ///
    /// A [`SearchError::SimulationDrift`](crate::core::SearchError::SimulationDrift)
    /// from the backend consumes one retry and leaves the phase unchanged, so
    /// the next step repeats it with a fresh seed. Once the retry budget is
    /// spent the error is returned.
    pub fn step(&mut self) -> SearchResult<Phase> {
        if self.is_done() {
            return Ok(self.phase);
        }
        if let Some(outcome) = self.budget_exhausted() {
            self.phase = self.finish(outcome);
            return Ok(self.phase);
        }
        let next = match self.phase {
            Phase::Counting => self.count(),
            Phase::Amplifying { estimate, randomized } => self.amplify(estimate, randomized),
            Phase::Verifying { position } => Ok(self.verify(position)),
            Phase::Retrying { collision } => Ok(self.retry(collision)),
            Phase::Done(_) => Ok(self.phase),
        };
        match next {
            Ok(phase) => {
                debug!(from = ?self.phase, to = ?phase, "Controller transition");
                self.phase = phase;
            }
            Err(err) if err.is_retryable() && self.retries < self.config.max_retries => {
                self.retries += 1;
                self.total_retries += 1;
                warn!(error = %err, retries = self.retries, phase = ?self.phase, "Retrying after simulation drift");
            }
            Err(err) => return Err(err),
        }
        Ok(self.phase)
    }

    /// Steps until [`Phase::Done`] and returns the result.
    pub fn run(mut self) -> SearchResult<MatchResult> {
        while !self.is_done() {
            self.step()?;
        }
        Ok(self.into_result())
    }

    pub fn into_result(self) -> MatchResult {
        let outcome = match self.phase {
            Phase::Done(outcome) => outcome,
            _ if !self.found.is_empty() => SearchOutcome::Found,
            _ => SearchOutcome::LowConfidence,
        };
        let (estimated_m, error_bound) = self
            .first_estimate
            .as_ref()
            .map_or((0, 0.0), |e| (e.estimate, e.error_bound));
        let mut diagnostics = self.diagnostics;
        if self.verified_samples > 0 {
            diagnostics.valid_fraction = Some(self.marked_samples as f64 / self.verified_samples as f64);
        }
        MatchResult {
            found: !self.found.is_empty(),
            positions: self.found.into_iter().collect(),
            estimated_m,
            rounds: self.iterations_used.len(),
            iterations_used: self.iterations_used,
            outcome,
            candidates: self.candidates,
            collisions_rejected: self.collisions_rejected,
            retries: self.total_retries,
            error_bound,
            diagnostics,
        }
    }

    fn next_seed(&mut self) -> u64 {
        let seed = derive_seed(self.config.seed, self.stream);
        self.stream += 1;
        seed
    }

    fn budget_exhausted(&self) -> Option<SearchOutcome> {
        let rounds_spent = self
            .config
            .round_budget
            .is_some_and(|budget| self.iterations_used.len() >= budget && matches!(self.phase, Phase::Amplifying { .. }));
        let out_of_time = self.config.time_budget.is_some_and(|budget| self.started.elapsed() >= budget);
        if rounds_spent || out_of_time {
            warn!(rounds_spent, out_of_time, "Search budget exhausted");
            Some(self.unresolved_outcome())
        } else {
            None
        }
    }

    fn unresolved_outcome(&self) -> SearchOutcome {
        if self.found.is_empty() { SearchOutcome::LowConfidence } else { SearchOutcome::Found }
    }

    fn finish(&self, outcome: SearchOutcome) -> Phase {
        info!(?outcome, found = self.found.len(), rounds = self.iterations_used.len(), "Search finished");
        Phase::Done(outcome)
    }

    fn count(&mut self) -> SearchResult<Phase> {
        let seed = self.next_seed();
        let started = Instant::now();
        let estimate = self.backend.count(&self.oracle, seed)?;
        self.diagnostics.counting_time += started.elapsed();
        info!(
            estimate = estimate.estimate,
            raw = estimate.raw,
            marked = self.oracle.marked_count(),
            "Counted marked positions"
        );
        let m_hat = estimate.estimate;
        let confident_zero = estimate.is_confident_zero();
        if self.first_estimate.is_none() {
            self.diagnostics.estimated_phase = Some(estimate.phase);
            self.diagnostics.expected_phase = estimate.expected_phase(self.oracle.marked_count());
            if self.config.circuit_metrics {
                let counter = QuantumCounter::new(self.config.counting_qubits, self.config.shots)?;
                self.diagnostics.counting_circuit = Some(counter.circuit_metrics(&self.oracle)?);
            }
            self.first_estimate = Some(estimate);
        }

        if m_hat > 0 {
            self.last_estimate = m_hat;
            return Ok(Phase::Amplifying { estimate: m_hat, randomized: false });
        }
        if self.zero_recounts_left > 0 {
            self.zero_recounts_left -= 1;
            debug!(left = self.zero_recounts_left, "Zero estimate, recounting");
            return Ok(Phase::Counting);
        }
        let outcome = if !self.found.is_empty() {
            SearchOutcome::Found
        } else if confident_zero {
            SearchOutcome::NotFound
        } else {
            SearchOutcome::LowConfidence
        };
        Ok(self.finish(outcome))
    }

    fn amplify(&mut self, estimate: usize, randomized: bool) -> SearchResult<Phase> {
        let k_star = optimal_iterations(estimate, self.oracle.dim());
        let cap = iteration_cap(k_star, self.config.over_rotation_cap);
        // The draw of k and the measurement use separate streams.
        let k = if randomized {
            StdRng::seed_from_u64(self.next_seed()).random_range(0..=cap)
        } else {
            k_star.min(cap)
        };
        let seed = self.next_seed();
        let started = Instant::now();
        let position = self.backend.amplify(&self.oracle, k, seed)?;
        self.diagnostics.amplification_time += started.elapsed();
        if self.iterations_used.is_empty() && self.config.circuit_metrics {
            let grover = GroverIterator::new(&self.oracle, Simulator::new());
            self.diagnostics.search_circuit = Some(grover.circuit_metrics(k)?);
        }
        self.iterations_used.push(k);
        debug!(estimate, k, k_star, cap, position, "Amplified and measured");
        Ok(Phase::Verifying { position })
    }

    fn verify(&mut self, position: usize) -> Phase {
        let started = Instant::now();
        let next = self.check_sample(position);
        self.diagnostics.verification_time += started.elapsed();
        next
    }

    fn check_sample(&mut self, position: usize) -> Phase {
        self.verified_samples += 1;
        if self.oracle.is_marked(position) {
            self.marked_samples += 1;
        }
        let m = self.pattern.len();
        let in_range = position + m <= self.text.len();
        let matches = in_range && &self.text[position..position + m] == self.pattern;

        if matches && !self.found.contains(&position) {
            info!(position, "Verified occurrence");
            self.found.insert(position);
            if !self.config.verify_all {
                return self.finish(SearchOutcome::Found);
            }
            self.oracle = self.oracle.without(position);
            self.retries = 0;
            self.zero_recounts_left = self.config.zero_recounts;
            return Phase::Counting;
        }

        let collision = !matches && self.oracle.is_marked(position);
        if collision {
            debug!(position, "Rejected hash collision");
            self.oracle = self.oracle.without(position);
            self.collisions_rejected += 1;
        } else {
            debug!(position, "Sampled position is not a new match");
        }
        Phase::Retrying { collision }
    }

    fn retry(&mut self, collision: bool) -> Phase {
        self.retries += 1;
        self.total_retries += 1;
        if self.retries >= self.config.max_retries {
            warn!(retries = self.retries, "Retry budget exhausted");
            return self.finish(self.unresolved_outcome());
        }
        match self.config.retry_policy {
            RetryPolicy::Reamplify if !collision && self.last_estimate > 0 => {
                Phase::Amplifying { estimate: self.last_estimate, randomized: true }
            }
            _ => Phase::Counting,
        }
    }
}
