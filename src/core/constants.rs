//! Numeric tolerances shared by the simulator and validation code.

/// Tolerances and numeric constants used by the simulation.
pub mod qsearch_constants {
    /// Allowed deviation of the squared norm from 1 before a run is declared drifted.
    pub const NORM_TOLERANCE: f64 = 1e-9;
    /// Allowed element-wise deviation of `U†U` from the identity.
    pub const UNITARY_TOLERANCE: f64 = 1e-10;
    /// Amplitudes with squared magnitude below this are treated as zero.
    pub const AMPLITUDE_TOLERANCE: f64 = 1e-12;
    /// Used for phase angles (`e^(iθ)`)
    pub const PI: f64 = std::f64::consts::PI;
}
