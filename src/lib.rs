// src/lib.rs

//! `qsearch` - Hybrid classical/quantum pattern search on a simulated register
//!
//! A rolling-hash pre-pass collects candidate windows of the text. A phase
//! oracle marks those candidates in a state-vector simulation, quantum counting
//! estimates how many there are, and Grover amplification with an iteration
//! count derived from that estimate samples a position that is then verified
//! classically. An adaptive controller ties the steps together and retries on
//! statistical misses and hash collisions.
//!
//! ```
//! use qsearch::{RabinKarp, SearchConfig, SearchError, search};
//!
//! let config = SearchConfig::default().with_verify_all(true);
//! let result = search("abcxabcxabc", "abc", &RabinKarp::default(), &config)?;
//! assert!(result.found);
//! assert_eq!(result.positions, vec![0, 4, 8]);
//! # Ok::<(), SearchError>(())
//! ```

pub mod core;
pub mod operations;
pub mod circuits;
pub mod simulation;
pub mod validation;
pub mod indexer;
pub mod oracle;
pub mod grover;
pub mod counting;
pub mod search;

// Re-export the most common types for easier top-level use
pub use core::{Layout, SearchError, SearchResult, StateVector};
pub use operations::{Gate, Operation};
pub use circuits::{Circuit, CircuitBuilder, CircuitMetrics};
pub use simulation::{SimulationResult, Simulator};
pub use validation::{check_normalization, check_unitary};
pub use indexer::{CandidateSet, PrimeHash, RabinKarp, WindowHash, index_candidates};
pub use oracle::PhaseOracle;
pub use grover::{GroverIterator, optimal_iterations};
pub use counting::{CountEstimate, QuantumCounter};
pub use search::{
    AdaptiveController, MatchResult, Phase, RetryPolicy, SearchBackend, SearchConfig, SearchDiagnostics,
    SearchOutcome, StateVectorBackend, search, search_with_backend,
};

// Collision-heavy hashing still never reports a false positive: every sampled
// position is checked against the pattern before it is returned.
/// ```
/// use qsearch::{PrimeHash, SearchConfig, SearchError, search};
///
/// // With two hash bits 'a', 'e' and 'q' all hash alike.
/// let hasher = PrimeHash::new(2, 1)?;
/// let config = SearchConfig::default().with_max_retries(20).with_seed(7);
/// let result = search("aeaeqeae", "q", &hasher, &config)?;
/// assert_eq!(result.candidates, 8);
/// for &p in &result.positions {
///     assert_eq!(&"aeaeqeae"[p..p + 1], "q");
/// }
/// # Ok::<(), SearchError>(())
/// ```
#[doc(hidden)]
const _: () = ();
