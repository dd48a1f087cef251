//! Error handling logic

use thiserror::Error;

/// Hard failures of a search or simulation run.
///
/// Statistical misses and "pattern absent" are not errors: they surface as
/// [`SearchOutcome`](crate::search::SearchOutcome) values on a successful result.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum SearchError {
    /// Invalid inputs or configuration. Never retried.
    #[error("Configuration Error: {message}")]
    Configuration {
        /// Configuration failure message
        message: String,
    },

    /// The state vector norm left the allowed band around 1.
    /// Fatal for the current run; the controller may start a freshly seeded attempt.
    #[error("Simulation Drift: squared norm {norm} deviates from 1 by more than {tolerance}")]
    SimulationDrift {
        /// Observed sum of squared amplitude magnitudes.
        norm: f64,
        /// Allowed absolute deviation from 1.
        tolerance: f64,
    },

    /// A gate or operation is inconsistent with the register it is applied to.
    #[error("Invalid Operation: {message}")]
    InvalidOperation {
        /// InvalidOperation failure message
        message: String,
    },
}

impl SearchError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        SearchError::Configuration { message: message.into() }
    }

    pub(crate) fn invalid_op(message: impl Into<String>) -> Self {
        SearchError::InvalidOperation { message: message.into() }
    }

    /// Whether a fresh, independently seeded attempt may recover from this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SearchError::SimulationDrift { .. })
    }
}

/// Result type used throughout the crate.
pub type SearchResult<T> = Result<T, SearchError>;
