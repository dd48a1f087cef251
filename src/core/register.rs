//! Register sizing and the qubit layout used by counting.

/// Qubits needed to index `search_space` positions: `ceil(log2 N)`, at least one.
///
/// Indices `>= search_space` in the resulting register are padding states.
pub fn register_qubits(search_space: usize) -> usize {
    if search_space <= 2 {
        1
    } else {
        (usize::BITS - (search_space - 1).leading_zeros()) as usize
    }
}

/// Qubit layout of a register made of `counting` control qubits followed by
/// `search` index qubits. The search register occupies the low bits, so a basis
/// index decomposes as `counting_value * 2^search + search_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub counting: usize,
    pub search: usize,
}

impl Layout {
    /// A layout with only a search register.
    pub fn search_only(search: usize) -> Self {
        Self { counting: 0, search }
    }

    pub fn total(&self) -> usize {
        self.counting + self.search
    }

    /// Qubit indices of the search register.
    pub fn search_qubits(&self) -> Vec<usize> {
        (self.counting..self.total()).collect()
    }

    /// Qubit indices of the counting register, most significant first.
    pub fn counting_qubits(&self) -> Vec<usize> {
        (0..self.counting).collect()
    }

    /// Counting qubit carrying weight `2^j` in the counting value.
    pub fn counting_qubit_for_power(&self, j: usize) -> usize {
        self.counting - 1 - j
    }
}
