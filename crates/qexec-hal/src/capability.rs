//! Backend capability introspection.
//!
//! [`Capabilities`] describe what a backend can do: how many qubits it
//! holds, which gates it executes without translation, how many shots it
//! accepts and which kinds of output it can produce. The runner checks the
//! `sampling` feature when it is handed a backend, and the translator
//! targets the backend's [`GateSet`].

use serde::{Deserialize, Serialize};

/// Backend can sample outcome histograms.
pub const FEATURE_SAMPLING: &str = "sampling";
/// Backend can return per-shot outcome lists.
pub const FEATURE_MEMORY: &str = "memory";
/// Backend can return exact state vectors.
pub const FEATURE_STATEVECTOR: &str = "statevector";
/// Backend can return (reduced) density matrices.
pub const FEATURE_DENSITY_MATRIX: &str = "density_matrix";

/// Hardware capabilities of a backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    /// Name of the backend.
    pub name: String,
    /// Number of qubits available.
    pub num_qubits: u32,
    /// Supported gate set (OpenQASM 3 naming convention).
    pub gate_set: GateSet,
    /// Maximum number of shots per execution.
    pub max_shots: u32,
    /// Whether this is a simulator (`true`) or real hardware (`false`).
    pub is_simulator: bool,
    /// Output features: `"sampling"`, `"memory"`, `"statevector"`,
    /// `"density_matrix"`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

impl Capabilities {
    /// Create capabilities for the statevector simulator.
    pub fn simulator(num_qubits: u32) -> Self {
        Self {
            name: "simulator".into(),
            num_qubits,
            gate_set: GateSet::statevector(),
            max_shots: 100_000,
            is_simulator: true,
            features: vec![
                FEATURE_SAMPLING.into(),
                FEATURE_MEMORY.into(),
                FEATURE_STATEVECTOR.into(),
                FEATURE_DENSITY_MATRIX.into(),
            ],
        }
    }

    /// Set the feature list.
    #[must_use]
    pub fn with_features(mut self, features: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.features = features.into_iter().map(Into::into).collect();
        self
    }

    /// Set the gate set.
    #[must_use]
    pub fn with_gate_set(mut self, gate_set: GateSet) -> Self {
        self.gate_set = gate_set;
        self
    }

    /// Check whether a feature flag is advertised.
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }
}

/// Set of gates a backend executes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GateSet {
    /// Single-qubit gates supported.
    pub single_qubit: Vec<String>,
    /// Two-qubit gates supported.
    pub two_qubit: Vec<String>,
    /// Three-qubit gates supported.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub three_qubit: Vec<String>,
}

impl GateSet {
    /// Gates applied directly by the statevector engine.
    pub fn statevector() -> Self {
        Self {
            single_qubit: [
                "x", "y", "z", "h", "s", "t", "tdg", "sx", "rx", "ry", "rz", "p", "u",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            two_qubit: ["cx", "cz", "swap"]
                .into_iter()
                .map(String::from)
                .collect(),
            three_qubit: vec!["ccx".into()],
        }
    }

    /// IBM-style basis: `rz`, `sx`, `x`, `cx`.
    pub fn ibm() -> Self {
        Self {
            single_qubit: vec!["rz".into(), "sx".into(), "x".into()],
            two_qubit: vec!["cx".into()],
            three_qubit: vec![],
        }
    }

    /// Check if a gate is supported.
    pub fn contains(&self, gate: &str) -> bool {
        self.single_qubit.iter().any(|g| g == gate)
            || self.two_qubit.iter().any(|g| g == gate)
            || self.three_qubit.iter().any(|g| g == gate)
    }
}
