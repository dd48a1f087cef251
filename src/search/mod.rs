// src/search/mod.rs

//! Top-level pattern search.
//!
//! [`search`] indexes the text classically, then hands the candidate set to an
//! [`AdaptiveController`] running on the [`StateVectorBackend`]. Use
//! [`search_with_backend`] to drive the same controller over another backend.

mod backend;
mod config;
mod controller;

pub use backend::{SearchBackend, StateVectorBackend};
pub use config::{RetryPolicy, SearchConfig};
pub use controller::{AdaptiveController, Phase};

use crate::circuits::CircuitMetrics;
use crate::core::{SearchResult, register_qubits};
use crate::counting::QuantumCounter;
use crate::indexer::{WindowHash, index_candidates};
use crate::simulation::Simulator;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{info, instrument};

/// How a search ended. None of these is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchOutcome {
    /// At least one position was verified against the pattern.
    Found,
    /// Counting confidently estimated zero matches.
    NotFound,
    /// No match was verified, but the evidence for absence is weak: a budget
    /// ran out or the final zero estimate was ambiguous.
    LowConfidence,
}

impl fmt::Display for SearchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchOutcome::Found => write!(f, "found"),
            SearchOutcome::NotFound => write!(f, "not found"),
            SearchOutcome::LowConfidence => write!(f, "not found (low confidence)"),
        }
    }
}

/// Cost and quality figures of one search.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SearchDiagnostics {
    /// Gate count and depth of the first counting circuit.
    pub counting_circuit: Option<CircuitMetrics>,
    /// Gate count and depth of the first amplification circuit.
    pub search_circuit: Option<CircuitMetrics>,
    pub counting_time: Duration,
    pub amplification_time: Duration,
    pub verification_time: Duration,
    /// Share of sampled positions that were marked when sampled.
    pub valid_fraction: Option<f64>,
    /// `θ` read back by the first counting run.
    pub estimated_phase: Option<f64>,
    /// Ideal `θ` for the number of candidates that run counted.
    pub expected_phase: Option<f64>,
}

/// Verified positions plus diagnostics of the run that produced them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub found: bool,
    /// Verified occurrences, ascending.
    pub positions: Vec<usize>,
    /// First counting estimate of the number of candidates.
    pub estimated_m: usize,
    /// Grover iteration count of each amplification round.
    pub iterations_used: Vec<usize>,
    pub rounds: usize,
    pub outcome: SearchOutcome,
    /// Size of the classical candidate set.
    pub candidates: usize,
    /// Candidates sampled, verified and found not to match.
    pub collisions_rejected: usize,
    pub retries: usize,
    /// Additive error bound of `estimated_m`.
    pub error_bound: f64,
    pub diagnostics: SearchDiagnostics,
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Outcome: {}", self.outcome)?;
        writeln!(f, "  positions: {:?}", self.positions)?;
        writeln!(
            f,
            "  candidates: {}, estimated M: {} (± {:.2})",
            self.candidates, self.estimated_m, self.error_bound
        )?;
        writeln!(f, "  rounds: {}, iterations: {:?}", self.rounds, self.iterations_used)?;
        writeln!(f, "  retries: {}, collisions rejected: {}", self.retries, self.collisions_rejected)?;
        let d = &self.diagnostics;
        write!(
            f,
            "  time: counting {:?}, amplification {:?}, verification {:?}",
            d.counting_time, d.amplification_time, d.verification_time
        )?;
        if let Some(fraction) = d.valid_fraction {
            write!(f, "\n  valid samples: {:.1}%", fraction * 100.0)?;
        }
        if let (Some(counting), Some(search)) = (d.counting_circuit, d.search_circuit) {
            write!(f, "\n  circuits: counting {}, search {}", counting, search)?;
        }
        Ok(())
    }
}

/// Finds `pattern` in `text`.
///
/// # Errors
/// * `SearchError::Configuration` for an empty pattern, a pattern longer than
///   the text, invalid `config` values, or a register above `max_qubits`.
/// * `SearchError::SimulationDrift` when drift persists past the retry budget.
#[instrument(skip_all, fields(text_len = text.len(), pattern_len = pattern.len()))]
pub fn search<H>(text: &str, pattern: &str, hasher: &H, config: &SearchConfig) -> SearchResult<MatchResult>
where
    H: WindowHash + ?Sized,
{
    let simulator = Simulator::new();
    let counter = QuantumCounter::new(config.counting_qubits, config.shots)?;
    search_with_backend(text, pattern, hasher, config, StateVectorBackend::new(counter, simulator))
}

/// [`search`] over a caller-supplied backend.
pub fn search_with_backend<H, B>(
    text: &str,
    pattern: &str,
    hasher: &H,
    config: &SearchConfig,
    backend: B,
) -> SearchResult<MatchResult>
where
    H: WindowHash + ?Sized,
    B: SearchBackend,
{
    config.validate()?;
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    let candidates = index_candidates(&text, &pattern, hasher)?;
    config.check_register(register_qubits(candidates.search_space()))?;

    if candidates.search_space() == 1 {
        // One window: nothing to amplify, check it directly.
        let found = text == pattern;
        info!(found, "Single-window search space");
        return Ok(MatchResult {
            found,
            positions: if found { vec![0] } else { Vec::new() },
            estimated_m: candidates.len(),
            iterations_used: vec![0],
            rounds: 1,
            outcome: if found { SearchOutcome::Found } else { SearchOutcome::NotFound },
            candidates: candidates.len(),
            collisions_rejected: usize::from(!found && !candidates.is_empty()),
            retries: 0,
            error_bound: 0.0,
            diagnostics: SearchDiagnostics::default(),
        });
    }

    let result = AdaptiveController::with_checked_config(&text, &pattern, &candidates, config, backend)?.run()?;
    info!(
        outcome = %result.outcome,
        positions = ?result.positions,
        rounds = result.rounds,
        "Search complete"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SearchError;
    use crate::indexer::RabinKarp;

    #[test]
    fn single_window_short_circuits() -> SearchResult<()> {
        let result = search("x", "x", &RabinKarp::default(), &SearchConfig::default())?;
        assert_eq!(result.positions, vec![0]);
        assert_eq!(result.iterations_used, vec![0]);
        assert_eq!(result.rounds, 1);

        let miss = search("xy", "ab", &RabinKarp::default(), &SearchConfig::default())?;
        assert!(!miss.found);
        assert_eq!(miss.outcome, SearchOutcome::NotFound);
        Ok(())
    }

    #[test]
    fn oversized_register_is_rejected() {
        let config = SearchConfig::default().with_counting_qubits(6).with_max_qubits(8);
        let text = "a".repeat(40);
        let err = search(&text, "a", &RabinKarp::default(), &config);
        assert!(matches!(err, Err(SearchError::Configuration { .. })));
    }

    #[test]
    fn diagnostics_report_circuits_phase_and_timing() -> SearchResult<()> {
        let config = SearchConfig::default().with_seed(3);
        let result = search("xxxxxxxxxxxabxxx", "ab", &RabinKarp::default(), &config)?;
        let d = &result.diagnostics;

        let counting = d.counting_circuit.ok_or_else(|| SearchError::invalid_op("no counting metrics"))?;
        let search_circuit = d.search_circuit.ok_or_else(|| SearchError::invalid_op("no search metrics"))?;
        assert!(counting.gates > search_circuit.gates);
        assert!(counting.depth >= search_circuit.depth);
        assert!(d.counting_time > Duration::ZERO);
        assert!(d.valid_fraction.is_some_and(|f| (0.0..=1.0).contains(&f)));

        let (estimated, expected) = (d.estimated_phase.unwrap_or(-1.0), d.expected_phase.unwrap_or(-1.0));
        assert!((expected - (1.0f64 / 16.0).sqrt().asin()).abs() < 1e-12);
        assert!(estimated >= 0.0);

        let bare = search("xxxxxxxxxxxabxxx", "ab", &RabinKarp::default(), &config.with_circuit_metrics(false))?;
        assert_eq!(bare.diagnostics.counting_circuit, None);
        assert_eq!(bare.positions, result.positions);
        Ok(())
    }

    #[test]
    fn result_display_leads_with_outcome() -> SearchResult<()> {
        let result = search("x", "x", &RabinKarp::default(), &SearchConfig::default())?;
        let text = format!("{}", result);
        assert!(text.starts_with("Outcome: found"));
        Ok(())
    }
}
