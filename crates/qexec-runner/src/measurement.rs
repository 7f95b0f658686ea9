//! Measurements: sets of circuits plus post-processing.
//!
//! A [`Measurement`] bundles the circuits whose registers are collected by
//! [`QuantumRunner::run_measurement_registers`] and the step that turns
//! those registers into named expectation values.
//!
//! [`QuantumRunner::run_measurement_registers`]: crate::QuantumRunner::run_measurement_registers

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use qexec_ir::Circuit;

use crate::error::{RunnerError, RunnerResult};
use crate::result::ExecutionResult;

/// Circuits to run and how to post-process their registers.
pub trait Measurement {
    /// Circuit prepended to every circuit of the measurement.
    fn constant_circuit(&self) -> Option<&Circuit>;

    /// Circuits to run, in order.
    fn circuits(&self) -> &[Circuit];

    /// Turn merged registers into named expectation values.
    ///
    /// Register-only measurements return `Ok(None)`.
    fn evaluate(&self, registers: &ExecutionResult)
    -> RunnerResult<Option<FxHashMap<String, f64>>>;
}

/// Collects registers without post-processing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassicalRegister {
    /// Circuit prepended to every circuit.
    pub constant_circuit: Option<Circuit>,
    /// Circuits to run.
    pub circuits: Vec<Circuit>,
}

impl ClassicalRegister {
    /// Create a register-only measurement.
    pub fn new(constant_circuit: Option<Circuit>, circuits: Vec<Circuit>) -> Self {
        Self {
            constant_circuit,
            circuits,
        }
    }
}

impl Measurement for ClassicalRegister {
    fn constant_circuit(&self) -> Option<&Circuit> {
        self.constant_circuit.as_ref()
    }

    fn circuits(&self) -> &[Circuit] {
        &self.circuits
    }

    fn evaluate(
        &self,
        _registers: &ExecutionResult,
    ) -> RunnerResult<Option<FxHashMap<String, f64>>> {
        Ok(None)
    }
}

/// Which Pauli-Z products to read from which registers, and how to combine
/// them into expectation values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PauliZProductInput {
    /// Number of qubits the products may refer to.
    pub number_qubits: usize,
    /// Also read `<readout>_flipped` registers, measured after flipping
    /// every qubit, and average them in.
    pub use_flipped_measurement: bool,
    /// readout register → product index → qubits in the product.
    pub pauli_product_qubit_masks: FxHashMap<String, FxHashMap<usize, Vec<usize>>>,
    /// Number of products registered so far.
    pub number_pauli_products: usize,
    /// Expectation value name → product index → coefficient.
    pub measured_exp_vals: FxHashMap<String, FxHashMap<usize, f64>>,
}

impl PauliZProductInput {
    /// Create an empty input.
    pub fn new(number_qubits: usize, use_flipped_measurement: bool) -> Self {
        Self {
            number_qubits,
            use_flipped_measurement,
            ..Self::default()
        }
    }

    /// Register the product of Z on `qubits`, read from `readout`.
    ///
    /// Returns the index of the new product.
    pub fn add_pauliz_product(
        &mut self,
        readout: impl Into<String>,
        qubits: Vec<usize>,
    ) -> RunnerResult<usize> {
        if let Some(&q) = qubits.iter().find(|&&q| q >= self.number_qubits) {
            return Err(RunnerError::Evaluation(format!(
                "qubit {q} outside 0..{}",
                self.number_qubits
            )));
        }
        let index = self.number_pauli_products;
        self.pauli_product_qubit_masks
            .entry(readout.into())
            .or_default()
            .insert(index, qubits);
        self.number_pauli_products += 1;
        Ok(index)
    }

    /// Define `name` as a linear combination of registered products.
    pub fn add_linear_exp_val(
        &mut self,
        name: impl Into<String>,
        linear: FxHashMap<usize, f64>,
    ) -> RunnerResult<()> {
        let name = name.into();
        if self.measured_exp_vals.contains_key(&name) {
            return Err(RunnerError::Evaluation(format!(
                "expectation value '{name}' already defined"
            )));
        }
        if let Some(index) = linear.keys().find(|&&i| i >= self.number_pauli_products) {
            return Err(RunnerError::Evaluation(format!(
                "'{name}' refers to product {index}, only {} registered",
                self.number_pauli_products
            )));
        }
        self.measured_exp_vals.insert(name, linear);
        Ok(())
    }
}

/// Expectation values of Pauli-Z products from sampled bit registers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PauliZProduct {
    /// Circuit prepended to every circuit.
    pub constant_circuit: Option<Circuit>,
    /// Circuits to run.
    pub circuits: Vec<Circuit>,
    /// Products and expectation values to compute.
    pub input: PauliZProductInput,
}

impl PauliZProduct {
    /// Create a Pauli-Z product measurement.
    pub fn new(
        constant_circuit: Option<Circuit>,
        circuits: Vec<Circuit>,
        input: PauliZProductInput,
    ) -> Self {
        Self {
            constant_circuit,
            circuits,
            input,
        }
    }
}

impl Measurement for PauliZProduct {
    fn constant_circuit(&self) -> Option<&Circuit> {
        self.constant_circuit.as_ref()
    }

    fn circuits(&self) -> &[Circuit] {
        &self.circuits
    }

    fn evaluate(
        &self,
        registers: &ExecutionResult,
    ) -> RunnerResult<Option<FxHashMap<String, f64>>> {
        let input = &self.input;
        let mut products = vec![0.0; input.number_pauli_products];

        for (readout, masks) in &input.pauli_product_qubit_masks {
            let shots = registers.bits(readout).ok_or_else(|| {
                RunnerError::Evaluation(format!("no bit register '{readout}' in results"))
            })?;
            let flipped = if input.use_flipped_measurement {
                let name = format!("{readout}_flipped");
                let shots = registers.bits(&name).ok_or_else(|| {
                    RunnerError::Evaluation(format!("no bit register '{name}' in results"))
                })?;
                Some(shots)
            } else {
                None
            };

            for (&index, qubits) in masks {
                let mut value = mean_parity(readout, shots, qubits, false)?;
                if let Some(flipped) = flipped {
                    value = (value + mean_parity(readout, flipped, qubits, true)?) / 2.0;
                }
                products[index] = value;
            }
        }

        let exp_vals = input
            .measured_exp_vals
            .iter()
            .map(|(name, linear)| {
                let value = linear
                    .iter()
                    .map(|(&index, coefficient)| coefficient * products[index])
                    .sum();
                (name.clone(), value)
            })
            .collect();
        Ok(Some(exp_vals))
    }
}

/// Mean of `(-1)^(number of ones on qubits)` over all shots.
///
/// `inverted` reads every bit negated.
fn mean_parity(
    readout: &str,
    shots: &[Vec<bool>],
    qubits: &[usize],
    inverted: bool,
) -> RunnerResult<f64> {
    if shots.is_empty() {
        return Err(RunnerError::Evaluation(format!(
            "register '{readout}' holds no shots"
        )));
    }
    let mut total = 0.0;
    for shot in shots {
        let mut odd = false;
        for &q in qubits {
            let bit = shot.get(q).copied().ok_or_else(|| {
                RunnerError::Evaluation(format!(
                    "register '{readout}' has {} bits, product needs qubit {q}",
                    shot.len()
                ))
            })?;
            odd ^= bit != inverted;
        }
        total += if odd { -1.0 } else { 1.0 };
    }
    Ok(total / shots.len() as f64)
}
