// src/indexer/mod.rs

//! Classical pre-pass: hash every length-`m` window of the text and keep the
//! positions whose hash equals the pattern's.
//!
//! The hash is a black box supplied by the caller through [`WindowHash`]. Hashers
//! that can update a window hash in O(1) provide a [`Roller`]; any other hasher
//! (including plain closures) falls back to rehashing each window, which costs
//! O(L·m) instead of O(L).

use crate::core::{SearchError, SearchResult};
use std::collections::BTreeSet;
use tracing::debug;

/// O(1) window update: `(previous_hash, outgoing_char, incoming_char) -> next_hash`.
pub type Roller<'a> = Box<dyn Fn(u64, char, char) -> u64 + 'a>;

/// A hash over text windows. Must be deterministic and must give equal windows
/// equal hashes (no false negatives); collisions are allowed.
pub trait WindowHash {
    fn hash(&self, window: &[char]) -> u64;

    /// Rolling update for windows of `width` characters, if the hash supports one.
    fn roller(&self, _width: usize) -> Option<Roller<'_>> {
        None
    }
}

impl<F> WindowHash for F
where
    F: Fn(&str) -> u64,
{
    fn hash(&self, window: &[char]) -> u64 {
        let s: String = window.iter().collect();
        self(&s)
    }
}

/// Polynomial rolling hash modulo the Mersenne prime `2^61 - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RabinKarp {
    base: u64,
}

const MERSENNE_61: u64 = (1 << 61) - 1;

impl RabinKarp {
    pub fn new(base: u64) -> Self {
        Self { base: base % MERSENNE_61 }
    }

    fn mul(a: u64, b: u64) -> u64 {
        ((a as u128 * b as u128) % MERSENNE_61 as u128) as u64
    }

    fn pow(&self, mut exp: usize) -> u64 {
        let (mut acc, mut base) = (1, self.base);
        while exp > 0 {
            if exp & 1 == 1 {
                acc = Self::mul(acc, base);
            }
            base = Self::mul(base, base);
            exp >>= 1;
        }
        acc
    }
}

impl Default for RabinKarp {
    fn default() -> Self {
        Self::new(1_000_003)
    }
}

impl WindowHash for RabinKarp {
    fn hash(&self, window: &[char]) -> u64 {
        window
            .iter()
            .fold(0, |h, &c| (Self::mul(h, self.base) + c as u64) % MERSENNE_61)
    }

    fn roller(&self, width: usize) -> Option<Roller<'_>> {
        let lead = self.pow(width.saturating_sub(1));
        Some(Box::new(move |h, outgoing, incoming| {
            let without = (h + MERSENNE_61 - Self::mul(outgoing as u64, lead)) % MERSENNE_61;
            (Self::mul(without, self.base) + incoming as u64) % MERSENNE_61
        }))
    }
}

/// Deliberately small hash: the window's UTF-8 bytes read as a big-endian
/// integer, times a small prime, reduced modulo `2^hash_bits`.
///
/// With few bits it collides often, which makes it useful for exercising the
/// verification path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimeHash {
    prime: u64,
    hash_bits: u32,
}

impl PrimeHash {
    pub const PRIMES: [u64; 9] = [17, 19, 23, 29, 31, 37, 41, 43, 47];

    /// `prime_index` is 1-based into [`PrimeHash::PRIMES`]; `hash_bits` in `1..=64`.
    pub fn new(hash_bits: u32, prime_index: usize) -> SearchResult<Self> {
        if !(1..=64).contains(&hash_bits) {
            return Err(SearchError::config(format!("hash_bits must be in 1..=64, got {}", hash_bits)));
        }
        let prime = prime_index
            .checked_sub(1)
            .and_then(|i| Self::PRIMES.get(i))
            .copied()
            .ok_or_else(|| {
                SearchError::config(format!(
                    "prime_index must be in 1..={}, got {}",
                    Self::PRIMES.len(),
                    prime_index
                ))
            })?;
        Ok(Self { prime, hash_bits })
    }
}

impl Default for PrimeHash {
    fn default() -> Self {
        Self { prime: 17, hash_bits: 8 }
    }
}

impl WindowHash for PrimeHash {
    fn hash(&self, window: &[char]) -> u64 {
        // Only the low 64 bits of the integer survive the final reduction.
        let mut buf = [0u8; 4];
        let low = window
            .iter()
            .flat_map(|c| c.encode_utf8(&mut buf).as_bytes().to_vec())
            .fold(0u64, |acc, b| (acc << 8) | b as u64);
        let product = low.wrapping_mul(self.prime);
        if self.hash_bits == 64 { product } else { product & ((1u64 << self.hash_bits) - 1) }
    }
}

/// Positions whose window hash equals the pattern hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSet {
    positions: BTreeSet<usize>,
    search_space: usize,
}

impl CandidateSet {
    pub fn new(positions: BTreeSet<usize>, search_space: usize) -> Self {
        Self { positions, search_space }
    }

    pub fn positions(&self) -> &BTreeSet<usize> {
        &self.positions
    }

    /// Number of windows `N = L - m + 1`.
    pub fn search_space(&self) -> usize {
        self.search_space
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn contains(&self, position: usize) -> bool {
        self.positions.contains(&position)
    }
}

/// Validates the text/pattern relationship and returns `N = L - m + 1`.
pub fn search_space(text_len: usize, pattern_len: usize) -> SearchResult<usize> {
    if pattern_len == 0 {
        return Err(SearchError::config("Pattern must not be empty"));
    }
    if pattern_len > text_len {
        return Err(SearchError::config(format!(
            "Pattern length {} exceeds text length {}",
            pattern_len, text_len
        )));
    }
    Ok(text_len - pattern_len + 1)
}

/// Scans every window of `text` and collects those hashing like `pattern`.
pub fn index_candidates<H>(text: &[char], pattern: &[char], hasher: &H) -> SearchResult<CandidateSet>
where
    H: WindowHash + ?Sized,
{
    let m = pattern.len();
    let n = search_space(text.len(), m)?;
    let target = hasher.hash(pattern);

    let mut positions = BTreeSet::new();
    let rolling = hasher.roller(m);
    match &rolling {
        Some(roll) => {
            let mut h = hasher.hash(&text[..m]);
            for p in 0..n {
                if p > 0 {
                    h = roll(h, text[p - 1], text[p + m - 1]);
                }
                if h == target {
                    positions.insert(p);
                }
            }
        }
        None => {
            for p in 0..n {
                if hasher.hash(&text[p..p + m]) == target {
                    positions.insert(p);
                }
            }
        }
    }

    debug!(
        windows = n,
        candidates = positions.len(),
        rolling = rolling.is_some(),
        "Indexed candidate windows"
    );
    Ok(CandidateSet::new(positions, n))
}
