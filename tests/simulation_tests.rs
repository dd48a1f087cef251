// tests/simulation_tests.rs

use num_complex::Complex64;
use qsearch::{
    CircuitBuilder, Gate, Layout, Operation, SearchError, Simulator, StateVector,
    circuits::inverse_qft,
    simulation::engine,
    validation::states_approx_equal,
};

use std::f64::consts::PI;

// Helper: |value> on `num_qubits` qubits
fn basis(num_qubits: usize, value: usize) -> Result<StateVector, SearchError> {
    let mut amps = vec![Complex64::new(0.0, 0.0); 1 << num_qubits];
    amps[value] = Complex64::new(1.0, 0.0);
    StateVector::from_amplitudes(amps)
}

// Helper: probability of `value` must be (close to) 1
fn check_deterministic(state: &StateVector, value: usize) {
    assert!(
        (state.probability(value) - 1.0).abs() < 1e-9,
        "expected |{}> with certainty, got {}",
        value,
        state
    );
}

#[test]
fn test_initial_state_measures_zero() -> Result<(), SearchError> {
    let state = StateVector::new(3)?;
    assert_eq!(Simulator::new().measure(state, 99)?, 0);
    Ok(())
}

#[test]
fn test_pauli_x_flips_selected_qubit() -> Result<(), SearchError> {
    // q1 is the middle bit of a 3-qubit index
    let circuit = CircuitBuilder::new()
        .add_op(Operation::gate(Gate::pauli_x(), vec![1]))
        .build();
    let mut state = StateVector::new(3)?;
    Simulator::new().run(&circuit, &mut state)?;
    check_deterministic(&state, 0b010);
    Ok(())
}

#[test]
fn test_phase_gate_only_touches_one_component() -> Result<(), SearchError> {
    let circuit = CircuitBuilder::new()
        .add_op(Operation::gate(Gate::hadamard(), vec![0]))
        .add_op(Operation::gate(Gate::phase(PI / 2.0), vec![0]))
        .build();
    let mut state = StateVector::new(1)?;
    Simulator::new().run(&circuit, &mut state)?;

    let s = 1.0 / 2.0f64.sqrt();
    assert!((state.vector()[0] - Complex64::new(s, 0.0)).norm() < 1e-12);
    assert!((state.vector()[1] - Complex64::new(0.0, s)).norm() < 1e-12);
    Ok(())
}

#[test]
fn test_controlled_x_respects_control() -> Result<(), SearchError> {
    let sim = Simulator::new();
    let cx = CircuitBuilder::new()
        .add_op(Operation::controlled(Gate::pauli_x(), vec![0], vec![1]))
        .build();

    // control 0: nothing happens
    let mut off = basis(2, 0b00)?;
    sim.run(&cx, &mut off)?;
    check_deterministic(&off, 0b00);

    // control 1: target flips
    let mut on = basis(2, 0b10)?;
    sim.run(&cx, &mut on)?;
    check_deterministic(&on, 0b11);
    Ok(())
}

#[test]
fn test_swap_exchanges_qubits() -> Result<(), SearchError> {
    let circuit = CircuitBuilder::new()
        .add_op(Operation::gate(Gate::swap(), vec![0, 2]))
        .build();
    let mut state = basis(3, 0b100)?;
    Simulator::new().run(&circuit, &mut state)?;
    check_deterministic(&state, 0b001);
    Ok(())
}

#[test]
fn test_diffusion_inverts_about_mean() -> Result<(), SearchError> {
    // On |0>, 2|s><s| - I gives 2/D - 1 on index 0 and 2/D elsewhere.
    let mut state = StateVector::new(3)?;
    engine::apply_diffusion(&mut state, &[0, 1, 2], &[])?;
    assert!((state.vector()[0].re - (2.0 / 8.0 - 1.0)).abs() < 1e-12);
    for i in 1..8 {
        assert!((state.vector()[i].re - 2.0 / 8.0).abs() < 1e-12, "index {}", i);
    }
    Ok(())
}

#[test]
fn test_controlled_diffusion_is_exact_on_both_branches() -> Result<(), SearchError> {
    let layout = Layout { counting: 1, search: 2 };
    let mut state = StateVector::new(3)?;
    engine::apply_hadamard_layer(&mut state, &[0])?;
    let before = state.clone();
    engine::apply_diffusion(&mut state, &layout.search_qubits(), &[0])?;

    // control 0 branch untouched; control 1 branch: |00> -> (2/4 - 1)|00> + (2/4)(|01>+|10>+|11>)
    let s = 1.0 / 2.0f64.sqrt();
    assert!((state.vector()[0] - before.vector()[0]).norm() < 1e-12);
    assert!((state.vector()[4].re - s * (0.5 - 1.0)).abs() < 1e-12);
    for i in 5..8 {
        assert!((state.vector()[i].re - s * 0.5).abs() < 1e-12, "index {}", i);
    }
    Ok(())
}

#[test]
fn test_inverse_qft_reads_phase() -> Result<(), SearchError> {
    // Phase kickback 2πi·5/8 per counting unit must read back as 5.
    let t = 3;
    let dim = 1usize << t;
    let amps = (0..dim)
        .map(|c| Complex64::from_polar(1.0 / (dim as f64).sqrt(), 2.0 * PI * 5.0 * c as f64 / dim as f64))
        .collect();
    let mut state = StateVector::from_amplitudes(amps)?;
    Simulator::new().run(&inverse_qft(&[0, 1, 2]), &mut state)?;
    check_deterministic(&state, 5);
    assert!(states_approx_equal(&state, &basis(3, 5)?, 1e-9));
    Ok(())
}

#[test]
fn test_sampling_is_reproducible() -> Result<(), SearchError> {
    let circuit = CircuitBuilder::new()
        .add_ops((0..4).map(|q| Operation::gate(Gate::hadamard(), vec![q])))
        .build();
    let mut state = StateVector::new(4)?;
    let sim = Simulator::new();
    sim.run(&circuit, &mut state)?;

    let first = sim.sample(&state, 256, 0, 1234)?;
    let second = sim.sample(&state, 256, 0, 1234)?;
    assert_eq!(first, second);
    assert_eq!(first.shots(), 256);
    assert!(first.counts().len() > 8, "uniform sampling should spread: {}", first);
    Ok(())
}

#[test]
fn test_non_unitary_gate_is_rejected() {
    let matrix = vec![
        Complex64::new(1.0, 0.0),
        Complex64::new(1.0, 0.0),
        Complex64::new(0.0, 0.0),
        Complex64::new(1.0, 0.0),
    ];
    let result = Gate::from_matrix("Shear", 1, matrix);
    assert!(matches!(result, Err(SearchError::InvalidOperation { .. })));
}

#[test]
fn test_out_of_range_target_is_rejected() -> Result<(), SearchError> {
    let mut state = StateVector::new(2)?;
    let result = engine::apply_gate(&mut state, &Gate::hadamard(), &[2]);
    assert!(matches!(result, Err(SearchError::InvalidOperation { .. })));
    Ok(())
}
