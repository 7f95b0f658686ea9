//! High-level circuit builder API.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::IrResult;
use crate::gate::StandardGate;
use crate::instruction::{Instruction, InstructionKind};
use crate::qubit::QubitId;
use crate::register::RegisterDeclaration;

/// A quantum circuit: an ordered list of instructions.
///
/// Qubits are addressed by index and never declared. Classical registers
/// are declared inline with [`Circuit::declare`] and friends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Name of the circuit.
    name: String,
    /// Instructions in program order.
    instructions: Vec<Instruction>,
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: vec![],
        }
    }

    /// Create a circuit from an existing instruction list.
    pub fn from_instructions(
        name: impl Into<String>,
        instructions: impl IntoIterator<Item = Instruction>,
    ) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into_iter().collect(),
        }
    }

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append an instruction.
    pub fn push(&mut self, instruction: Instruction) -> &mut Self {
        self.instructions.push(instruction);
        self
    }

    /// Append every instruction of `other`.
    pub fn append(&mut self, other: &Circuit) -> &mut Self {
        self.instructions.extend(other.instructions.iter().cloned());
        self
    }

    /// Return a new circuit with `self` followed by `other`.
    #[must_use]
    pub fn concat(&self, other: &Circuit) -> Circuit {
        let mut combined = self.clone();
        combined.append(other);
        combined
    }

    /// Get the instructions in program order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Iterate over the instructions in program order.
    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Check whether the circuit has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Qubits referenced explicitly by any instruction.
    pub fn involved_qubits(&self) -> BTreeSet<QubitId> {
        self.instructions
            .iter()
            .flat_map(|inst| inst.qubits.iter().copied())
            .collect()
    }

    /// Number of qubits: largest explicitly referenced index plus one.
    pub fn num_qubits(&self) -> usize {
        self.involved_qubits()
            .last()
            .map_or(0, |q| q.index() + 1)
    }

    /// Count instructions with the given name.
    pub fn count_ops(&self, name: &str) -> usize {
        self.instructions
            .iter()
            .filter(|inst| inst.name() == name)
            .count()
    }

    /// Register declarations in program order, duplicates included.
    pub fn declarations(&self) -> impl Iterator<Item = &RegisterDeclaration> {
        self.instructions.iter().filter_map(|inst| match &inst.kind {
            InstructionKind::Declare(decl) => Some(decl),
            _ => None,
        })
    }

    // =========================================================================
    // Register declarations
    // =========================================================================

    /// Declare a classical register.
    pub fn declare(&mut self, declaration: RegisterDeclaration) -> IrResult<&mut Self> {
        self.instructions.push(Instruction::declare(declaration)?);
        Ok(self)
    }

    /// Declare a bit register.
    pub fn declare_bit(
        &mut self,
        name: impl Into<String>,
        width: u32,
        is_output: bool,
    ) -> IrResult<&mut Self> {
        self.declare(RegisterDeclaration::bit(name, width, is_output))
    }

    /// Declare a float register.
    pub fn declare_float(
        &mut self,
        name: impl Into<String>,
        width: u32,
        is_output: bool,
    ) -> IrResult<&mut Self> {
        self.declare(RegisterDeclaration::float(name, width, is_output))
    }

    /// Declare a complex register.
    pub fn declare_complex(
        &mut self,
        name: impl Into<String>,
        width: u32,
        is_output: bool,
    ) -> IrResult<&mut Self> {
        self.declare(RegisterDeclaration::complex(name, width, is_output))
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply a gate to the given qubits.
    pub fn gate(
        &mut self,
        gate: StandardGate,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.instructions.push(Instruction::gate(gate, qubits)?);
        Ok(self)
    }

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::H, [qubit])
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::X, [qubit])
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::Y, [qubit])
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::Z, [qubit])
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::S, [qubit])
    }

    /// Apply T gate.
    pub fn t(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::T, [qubit])
    }

    /// Apply sqrt(X) gate.
    pub fn sx(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::SX, [qubit])
    }

    /// Apply Rx rotation gate.
    pub fn rx(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::Rx(theta), [qubit])
    }

    /// Apply Ry rotation gate.
    pub fn ry(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::Ry(theta), [qubit])
    }

    /// Apply Rz rotation gate.
    pub fn rz(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::Rz(theta), [qubit])
    }

    /// Apply phase gate.
    pub fn p(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::P(theta), [qubit])
    }

    // =========================================================================
    // Two- and three-qubit gates
    // =========================================================================

    /// Apply CNOT (CX) gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::CX, [control, target])
    }

    /// Apply CZ gate.
    pub fn cz(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::CZ, [control, target])
    }

    /// Apply SWAP gate.
    pub fn swap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::Swap, [q1, q2])
    }

    /// Apply RZZ (ZZ rotation) gate.
    pub fn rzz(&mut self, theta: f64, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::RZZ(theta), [q1, q2])
    }

    /// Apply Toffoli (CCX) gate.
    pub fn ccx(&mut self, c1: QubitId, c2: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::CCX, [c1, c2, target])
    }

    // =========================================================================
    // Measurement and other operations
    // =========================================================================

    /// Measure a qubit into `readout[offset]`.
    pub fn measure(
        &mut self,
        qubit: QubitId,
        readout: impl Into<String>,
        offset: u32,
    ) -> IrResult<&mut Self> {
        self.instructions
            .push(Instruction::measure(qubit, readout, offset));
        Ok(self)
    }

    /// Measure all qubits into `readout`, `shots` times.
    pub fn repeated_measurement(
        &mut self,
        readout: impl Into<String>,
        shots: u32,
    ) -> IrResult<&mut Self> {
        self.instructions
            .push(Instruction::repeated_measurement(readout, shots)?);
        Ok(self)
    }

    /// Override the shot count used for explicit measurements.
    pub fn set_shot_count(
        &mut self,
        shots: u32,
        readout: impl Into<String>,
    ) -> IrResult<&mut Self> {
        self.instructions
            .push(Instruction::set_shot_count(shots, readout)?);
        Ok(self)
    }

    /// Request the state vector into `readout`.
    pub fn get_state_vector(&mut self, readout: impl Into<String>) -> IrResult<&mut Self> {
        self.instructions.push(Instruction::state_vector(readout));
        Ok(self)
    }

    /// Request the density matrix into `readout`.
    pub fn get_density_matrix(&mut self, readout: impl Into<String>) -> IrResult<&mut Self> {
        self.instructions.push(Instruction::density_matrix(readout));
        Ok(self)
    }

    /// Reset a qubit to |0⟩.
    pub fn reset(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.instructions.push(Instruction::reset(qubit));
        Ok(self)
    }

    /// Apply a barrier to specified qubits.
    pub fn barrier(&mut self, qubits: impl IntoIterator<Item = QubitId>) -> IrResult<&mut Self> {
        self.instructions.push(Instruction::barrier(qubits));
        Ok(self)
    }
}

impl Extend<Instruction> for Circuit {
    fn extend<T: IntoIterator<Item = Instruction>>(&mut self, iter: T) {
        self.instructions.extend(iter);
    }
}

impl<'a> IntoIterator for &'a Circuit {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}
