// src/search/config.rs
use crate::core::{SearchError, SearchResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where the controller goes after a sampled position fails verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPolicy {
    /// Re-estimate the count with a fresh seed, then amplify again.
    #[default]
    Recount,
    /// Keep the last estimate and amplify with an iteration count drawn
    /// uniformly from `[0, cap]`. A rejected hash collision still recounts,
    /// since the marked set changed.
    Reamplify,
}

/// Numeric configuration of a search.
///
/// Missing fields deserialize to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Counting register size `t`.
    pub counting_qubits: usize,
    /// Samples of the counting register per counting run.
    pub shots: usize,
    /// Failed verifications tolerated per occurrence.
    pub max_retries: usize,
    /// Amplification never exceeds `over_rotation_cap · max(k*, 1)` rounds.
    pub over_rotation_cap: f64,
    pub seed: u64,
    /// Enumerate every occurrence instead of stopping at the first.
    pub verify_all: bool,
    /// Extra counting runs after a zero estimate before giving up.
    pub zero_recounts: usize,
    pub retry_policy: RetryPolicy,
    /// Upper bound on `n + t`; the state vector holds `2^(n+t)` amplitudes.
    pub max_qubits: usize,
    /// Total amplification rounds allowed across the whole search.
    pub round_budget: Option<usize>,
    /// Wall-clock deadline, checked between controller steps.
    pub time_budget: Option<Duration>,
    /// Report gate count and depth of the counting and search circuits.
    pub circuit_metrics: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            counting_qubits: 6,
            shots: 64,
            max_retries: 5,
            over_rotation_cap: 2.0,
            seed: 0x5EED_0F_C0DE,
            verify_all: false,
            zero_recounts: 1,
            retry_policy: RetryPolicy::Recount,
            max_qubits: 22,
            round_budget: None,
            time_budget: None,
            circuit_metrics: true,
        }
    }
}

impl SearchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_counting_qubits(mut self, counting_qubits: usize) -> Self {
        self.counting_qubits = counting_qubits;
        self
    }

    #[must_use]
    pub fn with_shots(mut self, shots: usize) -> Self {
        self.shots = shots;
        self
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn with_over_rotation_cap(mut self, cap: f64) -> Self {
        self.over_rotation_cap = cap;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_verify_all(mut self, verify_all: bool) -> Self {
        self.verify_all = verify_all;
        self
    }

    #[must_use]
    pub fn with_zero_recounts(mut self, zero_recounts: usize) -> Self {
        self.zero_recounts = zero_recounts;
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    #[must_use]
    pub fn with_max_qubits(mut self, max_qubits: usize) -> Self {
        self.max_qubits = max_qubits;
        self
    }

    #[must_use]
    pub fn with_round_budget(mut self, rounds: usize) -> Self {
        self.round_budget = Some(rounds);
        self
    }

    #[must_use]
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    #[must_use]
    pub fn with_circuit_metrics(mut self, enabled: bool) -> Self {
        self.circuit_metrics = enabled;
        self
    }

    /// Checks the fields that do not depend on the input text.
    pub fn validate(&self) -> SearchResult<()> {
        if self.counting_qubits == 0 {
            return Err(SearchError::config("counting_qubits must be positive"));
        }
        if self.shots == 0 {
            return Err(SearchError::config("shots must be positive"));
        }
        if !self.over_rotation_cap.is_finite() || self.over_rotation_cap < 1.0 {
            return Err(SearchError::config(format!(
                "over_rotation_cap must be a finite value >= 1.0, got {}",
                self.over_rotation_cap
            )));
        }
        if self.max_qubits == 0 {
            return Err(SearchError::config("max_qubits must be positive"));
        }
        if self.counting_qubits >= self.max_qubits {
            return Err(SearchError::config(format!(
                "counting_qubits ({}) leaves no room for a search register under max_qubits ({})",
                self.counting_qubits, self.max_qubits
            )));
        }
        Ok(())
    }

    /// Rejects registers whose total size `n + t` exceeds `max_qubits`.
    pub fn check_register(&self, search_qubits: usize) -> SearchResult<()> {
        let total = search_qubits + self.counting_qubits;
        if total > self.max_qubits {
            return Err(SearchError::config(format!(
                "Search needs {} search + {} counting qubits, above the limit of {}",
                search_qubits, self.counting_qubits, self.max_qubits
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SearchConfig::default().validate().is_ok());
        assert_eq!(SearchConfig::new().retry_policy, RetryPolicy::Recount);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let cases = [
            SearchConfig::new().with_counting_qubits(0),
            SearchConfig::new().with_shots(0),
            SearchConfig::new().with_over_rotation_cap(0.5),
            SearchConfig::new().with_over_rotation_cap(f64::NAN),
            SearchConfig::new().with_max_qubits(0),
            SearchConfig::new().with_counting_qubits(8).with_max_qubits(8),
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(SearchError::Configuration { .. })),
                "{:?} should be rejected",
                config
            );
        }
    }

    #[test]
    fn register_limit_includes_counting_qubits() {
        let config = SearchConfig::new().with_counting_qubits(4).with_max_qubits(10);
        assert!(config.check_register(6).is_ok());
        assert!(config.check_register(7).is_err());
    }
}
