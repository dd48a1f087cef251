//! Property-based tests for the oracle, the simulator and end-to-end search.

use num_complex::Complex64;
use proptest::prelude::*;
use qsearch::{
    GroverIterator, Layout, PhaseOracle, RabinKarp, SearchConfig, Simulator, StateVector, index_candidates,
    search, validation::states_approx_equal,
};

/// Random normalized state on 1-5 qubits.
fn arb_state() -> impl Strategy<Value = StateVector> {
    (1_usize..=5).prop_flat_map(|n| {
        prop::collection::vec((-1.0_f64..1.0, -1.0_f64..1.0), 1 << n).prop_filter_map(
            "zero vector",
            |parts| {
                let norm = parts.iter().map(|(re, im)| re * re + im * im).sum::<f64>().sqrt();
                if norm < 1e-6 {
                    return None;
                }
                let amps = parts.into_iter().map(|(re, im)| Complex64::new(re / norm, im / norm)).collect();
                StateVector::from_amplitudes(amps).ok()
            },
        )
    })
}

/// Short texts over a small alphabet so patterns actually occur.
fn arb_text_and_pattern() -> impl Strategy<Value = (String, String)> {
    ("[ab]{2,12}", "[ab]{1,3}").prop_filter("pattern longer than text", |(t, p)| p.len() <= t.len())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn oracle_is_self_inverse(state in arb_state(), marks in prop::collection::btree_set(0_usize..32, 0..8)) {
        let n = state.num_qubits();
        let search_space = (1 << n) - usize::from(n > 1);
        let oracle = PhaseOracle::new(marks, search_space).unwrap();
        prop_assume!(oracle.num_qubits() == n);

        let mut twice = state.clone();
        oracle.apply(&mut twice, Layout::search_only(n), None).unwrap();
        oracle.apply(&mut twice, Layout::search_only(n), None).unwrap();
        prop_assert!(states_approx_equal(&twice, &state, 1e-12));
    }

    #[test]
    fn grover_rounds_preserve_normalization(
        search_space in 2_usize..40,
        marks in prop::collection::btree_set(0_usize..40, 0..6),
        k in 0_usize..8,
    ) {
        let oracle = PhaseOracle::new(marks, search_space).unwrap();
        let state = GroverIterator::new(&oracle, Simulator::new()).run(k).unwrap();
        prop_assert!((state.norm_sqr() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn indexer_never_misses_an_occurrence((text, pattern) in arb_text_and_pattern()) {
        let t: Vec<char> = text.chars().collect();
        let p: Vec<char> = pattern.chars().collect();
        let candidates = index_candidates(&t, &p, &RabinKarp::default()).unwrap();
        for start in 0..=t.len() - p.len() {
            if t[start..start + p.len()] == p[..] {
                prop_assert!(candidates.contains(start));
            }
        }
    }

    #[test]
    fn reported_positions_always_match((text, pattern) in arb_text_and_pattern(), seed in any::<u64>()) {
        // A weak hash keeps collisions in play.
        let weak = |s: &str| (s.len() + s.bytes().filter(|&b| b == b'a').count() % 2) as u64;
        let config = SearchConfig::default().with_seed(seed).with_counting_qubits(4).with_verify_all(true);
        let result = search(&text, &pattern, &weak, &config).unwrap();
        let t: Vec<char> = text.chars().collect();
        let p: Vec<char> = pattern.chars().collect();
        for &pos in &result.positions {
            prop_assert_eq!(&t[pos..pos + p.len()], &p[..]);
        }
        prop_assert_eq!(result.found, !result.positions.is_empty());
    }
}
