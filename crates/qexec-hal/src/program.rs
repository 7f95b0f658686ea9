//! Engine-level programs and output requests.
//!
//! A [`Program`] is what a backend actually runs: a flat list of
//! [`Primitive`] operations over numbered qubits and numbered classical
//! bits. Classical bits are grouped (one group per bit register of the
//! source circuit) so that engines can format sampled outcomes per group.
//!
//! # Classical bit string convention
//!
//! Sampled outcomes are reported one character per classical bit, `'0'` or
//! `'1'`. Groups appear in `clbit_groups` order, separated by a single
//! space. Inside a group the rightmost character is the lowest classical
//! bit of that group (OpenQASM 3 convention). For groups of widths `[1, 2]`
//! the outcome `clbits = [1, 0, 1]` is reported as `"1 10"`.

use serde::{Deserialize, Serialize};

use qexec_ir::{QubitId, StandardGate};

/// One engine-level operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Primitive {
    /// Apply a gate the backend supports natively.
    Gate {
        /// The gate.
        gate: StandardGate,
        /// Operand qubits.
        qubits: Vec<QubitId>,
    },
    /// Measure `qubit` into classical bit `clbit`.
    Measure {
        /// Measured qubit.
        qubit: QubitId,
        /// Flat classical bit index.
        clbit: u32,
    },
    /// Reset `qubit` to |0⟩.
    Reset {
        /// Qubit to reset.
        qubit: QubitId,
    },
    /// Synchronization point; no effect on simulated state.
    Barrier,
}

impl Primitive {
    /// Get the name of this primitive.
    pub fn name(&self) -> &str {
        match self {
            Primitive::Gate { gate, .. } => gate.name(),
            Primitive::Measure { .. } => "measure",
            Primitive::Reset { .. } => "reset",
            Primitive::Barrier => "barrier",
        }
    }
}

/// A translated program ready for a backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Number of qubits the engine must allocate.
    pub num_qubits: u32,
    /// Widths of the classical bit groups, in output order.
    pub clbit_groups: Vec<u32>,
    /// Operations in program order.
    pub ops: Vec<Primitive>,
}

impl Program {
    /// Create an empty program over `num_qubits` qubits.
    pub fn new(num_qubits: u32) -> Self {
        Self {
            num_qubits,
            clbit_groups: vec![],
            ops: vec![],
        }
    }

    /// Set the classical bit groups.
    #[must_use]
    pub fn with_clbit_groups(mut self, groups: Vec<u32>) -> Self {
        self.clbit_groups = groups;
        self
    }

    /// Total number of classical bits.
    pub fn num_clbits(&self) -> u32 {
        self.clbit_groups.iter().sum()
    }

    /// Number of gate primitives.
    pub fn gate_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, Primitive::Gate { .. }))
            .count()
    }

    /// Format classical bit values according to the group convention.
    ///
    /// `clbits[i]` is the value of flat classical bit `i`.
    pub fn format_outcome(&self, clbits: &[bool]) -> String {
        let mut out = String::with_capacity(clbits.len() + self.clbit_groups.len());
        let mut start = 0usize;
        for (i, &width) in self.clbit_groups.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            let end = start + width as usize;
            for bit in clbits[start..end].iter().rev() {
                out.push(if *bit { '1' } else { '0' });
            }
            start = end;
        }
        out
    }
}

/// The kind of output requested from a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputRequest {
    /// Sample `shots` times and return an outcome histogram.
    Counts {
        /// Number of shots.
        shots: u32,
    },
    /// Sample `shots` times and return every outcome in shot order.
    Memory {
        /// Number of shots.
        shots: u32,
    },
    /// Return the final state vector (one run, no sampling).
    ///
    /// A non-empty `qubits` list permutes the output so that `qubits[k]`
    /// becomes bit `k` of the amplitude index; it must cover every qubit.
    StateVector {
        /// Output qubit order. Empty means natural order.
        qubits: Vec<QubitId>,
    },
    /// Return the flattened (row-major) density matrix.
    ///
    /// A non-empty `qubits` list traces out every other qubit; `qubits[k]`
    /// becomes bit `k` of the reduced index.
    DensityMatrix {
        /// Kept qubits. Empty means all qubits in natural order.
        qubits: Vec<QubitId>,
    },
}

impl OutputRequest {
    /// Number of shots requested, if this is a sampling request.
    pub fn shots(&self) -> Option<u32> {
        match self {
            OutputRequest::Counts { shots } | OutputRequest::Memory { shots } => Some(*shots),
            OutputRequest::StateVector { .. } | OutputRequest::DensityMatrix { .. } => None,
        }
    }

    /// Capability feature required to serve this request.
    pub fn required_feature(&self) -> &'static str {
        match self {
            OutputRequest::Counts { .. } => crate::capability::FEATURE_SAMPLING,
            OutputRequest::Memory { .. } => crate::capability::FEATURE_MEMORY,
            OutputRequest::StateVector { .. } => crate::capability::FEATURE_STATEVECTOR,
            OutputRequest::DensityMatrix { .. } => crate::capability::FEATURE_DENSITY_MATRIX,
        }
    }
}
