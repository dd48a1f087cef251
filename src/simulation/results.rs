// src/simulation/results.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Histogram of sampled measurement outcomes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Maps each observed outcome to the number of shots that produced it.
    counts: BTreeMap<u64, usize>,
    shots: usize,
}

impl SimulationResult {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records one shot.
    pub(crate) fn record(&mut self, outcome: u64) {
        *self.counts.entry(outcome).or_insert(0) += 1;
        self.shots += 1;
    }

    pub fn counts(&self) -> &BTreeMap<u64, usize> {
        &self.counts
    }

    pub fn shots(&self) -> usize {
        self.shots
    }

    pub fn count(&self, outcome: u64) -> usize {
        self.counts.get(&outcome).copied().unwrap_or(0)
    }

    /// The outcome seen most often; ties go to the smallest outcome.
    pub fn most_frequent(&self) -> Option<u64> {
        self.counts
            .iter()
            .max_by(|(a_out, a_n), (b_out, b_n)| a_n.cmp(b_n).then(b_out.cmp(a_out)))
            .map(|(outcome, _)| *outcome)
    }

    /// Shot-weighted mean outcome value.
    pub fn mean(&self) -> f64 {
        if self.shots == 0 {
            return 0.0;
        }
        let sum: f64 = self.counts.iter().map(|(k, v)| *k as f64 * *v as f64).sum();
        sum / self.shots as f64
    }

    /// Shot-weighted variance of the outcome value.
    pub fn variance(&self) -> f64 {
        if self.shots == 0 {
            return 0.0;
        }
        let mean = self.mean();
        let sum: f64 = self
            .counts
            .iter()
            .map(|(k, v)| (*k as f64 - mean).powi(2) * *v as f64)
            .sum();
        sum / self.shots as f64
    }
}

impl FromIterator<u64> for SimulationResult {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        let mut result = SimulationResult::new();
        for outcome in iter {
            result.record(outcome);
        }
        result
    }
}

impl fmt::Display for SimulationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Simulation Results ({} shots):", self.shots)?;
        if self.counts.is_empty() {
            writeln!(f, "  No outcomes recorded.")?;
        } else {
            for (outcome, n) in &self.counts {
                writeln!(f, "    {}: {}", outcome, n)?;
            }
        }
        Ok(())
    }
}
