// src/core/mod.rs

//! Core data structures and types

pub mod error;
pub mod register;
pub mod state;

pub use error::{SearchError, SearchResult};
pub use register::{Layout, register_qubits};
pub use state::StateVector;

pub mod constants;
pub use constants::qsearch_constants::{AMPLITUDE_TOLERANCE, NORM_TOLERANCE, PI, UNITARY_TOLERANCE};
