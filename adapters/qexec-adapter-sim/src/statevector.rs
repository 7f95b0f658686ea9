//! Statevector simulation engine.
//!
//! Basis index bit `q` holds the value of qubit `q`.

use num_complex::Complex64;
use rand::Rng;
use std::f64::consts::PI;

use qexec_hal::{HalError, HalResult, Primitive};
use qexec_ir::StandardGate;

const ZERO: Complex64 = Complex64::new(0.0, 0.0);

/// A statevector representing a quantum state.
#[derive(Debug, Clone)]
pub struct Statevector {
    /// The state amplitudes (2^n complex numbers).
    amplitudes: Vec<Complex64>,
    /// Number of qubits.
    num_qubits: usize,
}

impl Statevector {
    /// Create a new statevector initialized to |0...0⟩.
    pub fn new(num_qubits: usize) -> Self {
        let size = 1 << num_qubits;
        let mut amplitudes = vec![ZERO; size];
        amplitudes[0] = Complex64::new(1.0, 0.0);
        Self {
            amplitudes,
            num_qubits,
        }
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Get the amplitudes.
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    /// Apply one primitive, recording measurement results into `clbits`.
    pub fn apply<R: Rng>(
        &mut self,
        op: &Primitive,
        clbits: &mut [bool],
        rng: &mut R,
    ) -> HalResult<()> {
        match op {
            Primitive::Gate { gate, qubits } => {
                let qubits: Vec<_> = qubits.iter().map(|q| q.index()).collect();
                self.apply_standard_gate(gate, &qubits)
            }
            Primitive::Measure { qubit, clbit } => {
                let slot = clbits.get_mut(*clbit as usize).ok_or_else(|| {
                    HalError::InvalidProgram(format!("classical bit {clbit} out of range"))
                })?;
                *slot = self.measure(qubit.index(), rng);
                Ok(())
            }
            Primitive::Reset { qubit } => {
                self.reset(qubit.index(), rng);
                Ok(())
            }
            Primitive::Barrier => Ok(()),
        }
    }

    /// Apply a standard gate.
    fn apply_standard_gate(&mut self, gate: &StandardGate, qubits: &[usize]) -> HalResult<()> {
        match *gate {
            StandardGate::X => self.apply_x(qubits[0]),
            StandardGate::Y => self.apply_y(qubits[0]),
            StandardGate::Z => self.apply_z(qubits[0]),
            StandardGate::H => self.apply_h(qubits[0]),
            StandardGate::S => self.apply_phase(qubits[0], PI / 2.0),
            StandardGate::T => self.apply_phase(qubits[0], PI / 4.0),
            StandardGate::Tdg => self.apply_phase(qubits[0], -PI / 4.0),
            StandardGate::SX => self.apply_rx(qubits[0], PI / 2.0),
            StandardGate::Rx(t) => self.apply_rx(qubits[0], t),
            StandardGate::Ry(t) => self.apply_ry(qubits[0], t),
            StandardGate::Rz(t) => self.apply_rz(qubits[0], t),
            StandardGate::P(t) => self.apply_phase(qubits[0], t),
            StandardGate::U(t, p, l) => self.apply_u(qubits[0], t, p, l),

            StandardGate::CX => self.apply_cx(qubits[0], qubits[1]),
            StandardGate::CZ => self.apply_cz(qubits[0], qubits[1]),
            StandardGate::Swap => self.apply_swap(qubits[0], qubits[1]),

            StandardGate::CCX => self.apply_ccx(qubits[0], qubits[1], qubits[2]),

            StandardGate::RZZ(_) => {
                return Err(HalError::Unsupported(format!(
                    "gate '{}' is not native to the statevector engine",
                    gate.name()
                )));
            }
        }
        Ok(())
    }

    // =========================================================================
    // Single-qubit gate implementations
    // =========================================================================

    fn apply_x(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        for i in 0..self.amplitudes.len() {
            if i & mask == 0 {
                self.amplitudes.swap(i, i | mask);
            }
        }
    }

    fn apply_y(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        let i_val = Complex64::new(0.0, 1.0);
        for i in 0..self.amplitudes.len() {
            if i & mask == 0 {
                let j = i | mask;
                let tmp = self.amplitudes[i];
                self.amplitudes[i] = -i_val * self.amplitudes[j];
                self.amplitudes[j] = i_val * tmp;
            }
        }
    }

    fn apply_z(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if i & mask != 0 {
                *amp = -*amp;
            }
        }
    }

    fn apply_h(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        let sqrt2_inv = 1.0 / 2.0_f64.sqrt();
        for i in 0..self.amplitudes.len() {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = sqrt2_inv * (a + b);
                self.amplitudes[j] = sqrt2_inv * (a - b);
            }
        }
    }

    fn apply_phase(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let phase = Complex64::from_polar(1.0, theta);
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if i & mask != 0 {
                *amp *= phase;
            }
        }
    }

    fn apply_rx(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let c = (theta / 2.0).cos();
        let neg_i_s = Complex64::new(0.0, -(theta / 2.0).sin());
        for i in 0..self.amplitudes.len() {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = c * a + neg_i_s * b;
                self.amplitudes[j] = neg_i_s * a + c * b;
            }
        }
    }

    fn apply_ry(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        for i in 0..self.amplitudes.len() {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = c * a - s * b;
                self.amplitudes[j] = s * a + c * b;
            }
        }
    }

    fn apply_rz(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let phase_0 = Complex64::from_polar(1.0, -theta / 2.0);
        let phase_1 = Complex64::from_polar(1.0, theta / 2.0);
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if i & mask == 0 {
                *amp *= phase_0;
            } else {
                *amp *= phase_1;
            }
        }
    }

    fn apply_u(&mut self, qubit: usize, theta: f64, phi: f64, lambda: f64) {
        let mask = 1 << qubit;
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        let e_il = Complex64::from_polar(1.0, lambda);
        let e_ip = Complex64::from_polar(1.0, phi);
        let e_ipl = Complex64::from_polar(1.0, phi + lambda);

        for i in 0..self.amplitudes.len() {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = c * a - e_il * s * b;
                self.amplitudes[j] = e_ip * s * a + e_ipl * c * b;
            }
        }
    }

    // =========================================================================
    // Two-qubit gate implementations
    // =========================================================================

    fn apply_cx(&mut self, control: usize, target: usize) {
        let ctrl_mask = 1 << control;
        let tgt_mask = 1 << target;
        for i in 0..self.amplitudes.len() {
            if (i & ctrl_mask != 0) && (i & tgt_mask == 0) {
                self.amplitudes.swap(i, i | tgt_mask);
            }
        }
    }

    fn apply_cz(&mut self, control: usize, target: usize) {
        let both = (1 << control) | (1 << target);
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if i & both == both {
                *amp = -*amp;
            }
        }
    }

    fn apply_swap(&mut self, q1: usize, q2: usize) {
        let mask1 = 1 << q1;
        let mask2 = 1 << q2;
        for i in 0..self.amplitudes.len() {
            if (i & mask1 != 0) && (i & mask2 == 0) {
                let j = (i & !mask1) | mask2;
                self.amplitudes.swap(i, j);
            }
        }
    }

    // =========================================================================
    // Three-qubit gate implementations
    // =========================================================================

    fn apply_ccx(&mut self, c1: usize, c2: usize, target: usize) {
        let controls = (1 << c1) | (1 << c2);
        let tgt_mask = 1 << target;
        for i in 0..self.amplitudes.len() {
            if (i & controls == controls) && (i & tgt_mask == 0) {
                self.amplitudes.swap(i, i | tgt_mask);
            }
        }
    }

    // =========================================================================
    // Non-unitary operations
    // =========================================================================

    /// Probability of reading `1` on `qubit`.
    fn probability_one(&self, qubit: usize) -> f64 {
        let mask = 1 << qubit;
        self.amplitudes
            .iter()
            .enumerate()
            .filter(|(i, _)| i & mask != 0)
            .map(|(_, amp)| amp.norm_sqr())
            .sum()
    }

    /// Projectively measure `qubit`, collapsing the state.
    pub fn measure<R: Rng>(&mut self, qubit: usize, rng: &mut R) -> bool {
        let p1 = self.probability_one(qubit).clamp(0.0, 1.0);
        let outcome = rng.gen_bool(p1);
        let mask = 1 << qubit;
        let norm = if outcome { p1 } else { 1.0 - p1 }.sqrt();
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if (i & mask != 0) == outcome {
                if norm > 0.0 {
                    *amp /= norm;
                }
            } else {
                *amp = ZERO;
            }
        }
        outcome
    }

    /// Reset `qubit` to |0⟩: measure, then flip if the result was `1`.
    pub fn reset<R: Rng>(&mut self, qubit: usize, rng: &mut R) {
        if self.measure(qubit, rng) {
            self.apply_x(qubit);
        }
    }

    // =========================================================================
    // State extraction
    // =========================================================================

    /// Amplitudes with qubit `order[k]` moved to bit `k` of the index.
    ///
    /// `order` must be a permutation of `0..num_qubits`.
    pub fn permuted(&self, order: &[usize]) -> Vec<Complex64> {
        let mut out = vec![ZERO; self.amplitudes.len()];
        for (i, amp) in self.amplitudes.iter().enumerate() {
            let mut j = 0usize;
            for (k, &q) in order.iter().enumerate() {
                if i & (1 << q) != 0 {
                    j |= 1 << k;
                }
            }
            out[j] = *amp;
        }
        out
    }

    /// Row-major reduced density matrix over `keep`, tracing out every
    /// other qubit. Qubit `keep[k]` becomes bit `k` of the reduced index.
    pub fn reduced_density_matrix(&self, keep: &[usize]) -> Vec<Complex64> {
        let dim = 1usize << keep.len();
        let keep_mask: usize = keep.iter().map(|q| 1usize << q).sum();
        let spread = |a: usize| -> usize {
            keep.iter()
                .enumerate()
                .filter(|(k, _)| a & (1 << k) != 0)
                .map(|(_, q)| 1usize << q)
                .sum()
        };
        let offsets: Vec<usize> = (0..dim).map(spread).collect();

        let mut rho = vec![ZERO; dim * dim];
        for env in (0..self.amplitudes.len()).filter(|e| e & keep_mask == 0) {
            for (row, &ra) in offsets.iter().enumerate() {
                let a = self.amplitudes[env | ra];
                if a == ZERO {
                    continue;
                }
                for (col, &cb) in offsets.iter().enumerate() {
                    rho[row * dim + col] += a * self.amplitudes[env | cb].conj();
                }
            }
        }
        rho
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qexec_ir::QubitId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn approx_eq(a: Complex64, b: Complex64) -> bool {
        (a - b).norm() < 1e-10
    }

    #[test]
    fn test_initial_state() {
        let sv = Statevector::new(2);
        assert!(approx_eq(sv.amplitudes[0], Complex64::new(1.0, 0.0)));
        assert!(sv.amplitudes[1..].iter().all(|a| approx_eq(*a, ZERO)));
        assert_eq!(sv.num_qubits(), 2);
    }

    #[test]
    fn test_bell_state() {
        let mut sv = Statevector::new(2);
        sv.apply_h(0);
        sv.apply_cx(0, 1);

        let sqrt2_inv = 1.0 / 2.0_f64.sqrt();
        assert!(approx_eq(sv.amplitudes[0], Complex64::new(sqrt2_inv, 0.0)));
        assert!(approx_eq(sv.amplitudes[1], ZERO));
        assert!(approx_eq(sv.amplitudes[2], ZERO));
        assert!(approx_eq(sv.amplitudes[3], Complex64::new(sqrt2_inv, 0.0)));
    }

    #[test]
    fn test_measure_deterministic_records_clbit() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut sv = Statevector::new(2);
        let mut clbits = [false; 2];
        sv.apply(
            &Primitive::Gate {
                gate: StandardGate::X,
                qubits: vec![QubitId(1)],
            },
            &mut clbits,
            &mut rng,
        )
        .unwrap();
        sv.apply(
            &Primitive::Measure {
                qubit: QubitId(1),
                clbit: 0,
            },
            &mut clbits,
            &mut rng,
        )
        .unwrap();
        assert_eq!(clbits, [true, false]);
    }

    #[test]
    fn test_measure_collapses_bell_state() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let mut sv = Statevector::new(2);
            sv.apply_h(0);
            sv.apply_cx(0, 1);
            let first = sv.measure(0, &mut rng);
            let second = sv.measure(1, &mut rng);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_reset_returns_to_zero() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut sv = Statevector::new(1);
        sv.apply_h(0);
        sv.reset(0, &mut rng);
        assert!((sv.amplitudes[0].norm() - 1.0).abs() < 1e-10);
        assert!(approx_eq(sv.amplitudes[1], ZERO));
    }

    #[test]
    fn test_measure_out_of_range_clbit() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut sv = Statevector::new(1);
        let result = sv.apply(
            &Primitive::Measure {
                qubit: QubitId(0),
                clbit: 3,
            },
            &mut [false],
            &mut rng,
        );
        assert!(matches!(result, Err(HalError::InvalidProgram(_))));
    }

    #[test]
    fn test_non_native_gate_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut sv = Statevector::new(2);
        let result = sv.apply(
            &Primitive::Gate {
                gate: StandardGate::RZZ(0.3),
                qubits: vec![QubitId(0), QubitId(1)],
            },
            &mut [],
            &mut rng,
        );
        assert!(matches!(result, Err(HalError::Unsupported(_))));
    }

    #[test]
    fn test_permuted_swaps_qubit_order() {
        let mut sv = Statevector::new(2);
        sv.apply_x(0);
        // |01⟩ in natural order (index 1) becomes index 2 with qubits reversed.
        let out = sv.permuted(&[1, 0]);
        assert!(approx_eq(out[2], Complex64::new(1.0, 0.0)));
        assert!(approx_eq(out[1], ZERO));
    }

    #[test]
    fn test_reduced_density_matrix_of_bell_pair() {
        let mut sv = Statevector::new(2);
        sv.apply_h(0);
        sv.apply_cx(0, 1);

        let full = sv.reduced_density_matrix(&[0, 1]);
        assert_eq!(full.len(), 16);
        assert!(approx_eq(full[0], Complex64::new(0.5, 0.0)));
        assert!(approx_eq(full[3], Complex64::new(0.5, 0.0)));
        assert!(approx_eq(full[15], Complex64::new(0.5, 0.0)));

        // Tracing out one half of a Bell pair leaves the maximally mixed state.
        let reduced = sv.reduced_density_matrix(&[0]);
        assert_eq!(reduced.len(), 4);
        assert!(approx_eq(reduced[0], Complex64::new(0.5, 0.0)));
        assert!(approx_eq(reduced[1], ZERO));
        assert!(approx_eq(reduced[2], ZERO));
        assert!(approx_eq(reduced[3], Complex64::new(0.5, 0.0)));
    }
}
