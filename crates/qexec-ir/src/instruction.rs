//! Circuit instructions.
//!
//! An [`Instruction`] pairs an [`InstructionKind`] with the qubits it
//! touches. For gates those are the operands, for `MeasureQubit` the single
//! measured qubit, and for state extraction the optional qubit subset
//! (empty meaning "every qubit of the circuit").

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{IrError, IrResult};
use crate::gate::StandardGate;
use crate::qubit::QubitId;
use crate::register::RegisterDeclaration;

/// The kind of instruction in a circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InstructionKind {
    /// A quantum gate operation.
    Gate(StandardGate),
    /// Declaration of a classical register.
    Declare(RegisterDeclaration),
    /// Measure one qubit into `readout[offset]`.
    MeasureQubit {
        /// Destination register.
        readout: String,
        /// Element index within the register.
        offset: u32,
    },
    /// Measure every mapped qubit into `readout`, repeated `shots` times.
    RepeatedMeasurement {
        /// Destination register.
        readout: String,
        /// Number of repetitions.
        shots: u32,
        /// Qubit to register offset mapping. `None` maps qubit i to offset i.
        qubit_mapping: Option<BTreeMap<QubitId, u32>>,
    },
    /// Override the number of shots for explicit single-qubit measurements.
    SetShotCount {
        /// Number of shots.
        shots: u32,
        /// Register the override applies to.
        readout: String,
    },
    /// Store the full state vector in a complex register.
    GetStateVector {
        /// Destination register.
        readout: String,
    },
    /// Store the flattened density matrix in a complex register.
    GetDensityMatrix {
        /// Destination register.
        readout: String,
    },
    /// Reset qubit to |0⟩.
    Reset,
    /// Barrier (synchronization point).
    Barrier,
}

/// A complete instruction with operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// The kind of instruction.
    pub kind: InstructionKind,
    /// Qubits this instruction operates on.
    pub qubits: Vec<QubitId>,
}

impl Instruction {
    /// Create a gate instruction, checking arity and operand uniqueness.
    pub fn gate(gate: StandardGate, qubits: impl IntoIterator<Item = QubitId>) -> IrResult<Self> {
        let inst = Self {
            kind: InstructionKind::Gate(gate),
            qubits: qubits.into_iter().collect(),
        };
        inst.validate()?;
        Ok(inst)
    }

    /// Check gate arity and operand uniqueness.
    ///
    /// Non-gate instructions always pass.
    pub fn validate(&self) -> IrResult<()> {
        let InstructionKind::Gate(gate) = &self.kind else {
            return Ok(());
        };
        let expected = gate.num_qubits();
        if self.qubits.len() != expected as usize {
            return Err(IrError::QubitCountMismatch {
                gate_name: gate.name().to_string(),
                expected,
                got: self.qubits.len() as u32,
            });
        }
        for (i, q) in self.qubits.iter().enumerate() {
            if self.qubits[..i].contains(q) {
                return Err(IrError::DuplicateQubit {
                    qubit: *q,
                    gate_name: Some(gate.name().to_string()),
                });
            }
        }
        Ok(())
    }

    /// Create a single-qubit gate instruction.
    pub fn single_qubit_gate(gate: StandardGate, qubit: QubitId) -> IrResult<Self> {
        Self::gate(gate, [qubit])
    }

    /// Create a two-qubit gate instruction.
    pub fn two_qubit_gate(gate: StandardGate, q1: QubitId, q2: QubitId) -> IrResult<Self> {
        Self::gate(gate, [q1, q2])
    }

    /// Create a register declaration.
    pub fn declare(declaration: RegisterDeclaration) -> IrResult<Self> {
        if declaration.name.is_empty() {
            return Err(IrError::EmptyRegisterName);
        }
        if declaration.width == 0 {
            return Err(IrError::ZeroWidthRegister(declaration.name));
        }
        Ok(Self {
            kind: InstructionKind::Declare(declaration),
            qubits: vec![],
        })
    }

    /// Create a single-qubit measurement into `readout[offset]`.
    pub fn measure(qubit: QubitId, readout: impl Into<String>, offset: u32) -> Self {
        Self {
            kind: InstructionKind::MeasureQubit {
                readout: readout.into(),
                offset,
            },
            qubits: vec![qubit],
        }
    }

    /// Create a repeated measurement of all qubits into `readout`.
    pub fn repeated_measurement(readout: impl Into<String>, shots: u32) -> IrResult<Self> {
        let readout = readout.into();
        if shots == 0 {
            return Err(IrError::ZeroShots(readout));
        }
        Ok(Self {
            kind: InstructionKind::RepeatedMeasurement {
                readout,
                shots,
                qubit_mapping: None,
            },
            qubits: vec![],
        })
    }

    /// Create a repeated measurement with an explicit qubit to offset mapping.
    pub fn repeated_measurement_with_mapping(
        readout: impl Into<String>,
        shots: u32,
        mapping: BTreeMap<QubitId, u32>,
    ) -> IrResult<Self> {
        let readout = readout.into();
        if shots == 0 {
            return Err(IrError::ZeroShots(readout));
        }
        let qubits = mapping.keys().copied().collect();
        Ok(Self {
            kind: InstructionKind::RepeatedMeasurement {
                readout,
                shots,
                qubit_mapping: Some(mapping),
            },
            qubits,
        })
    }

    /// Create a shot-count override.
    pub fn set_shot_count(shots: u32, readout: impl Into<String>) -> IrResult<Self> {
        let readout = readout.into();
        if shots == 0 {
            return Err(IrError::ZeroShots(readout));
        }
        Ok(Self {
            kind: InstructionKind::SetShotCount { shots, readout },
            qubits: vec![],
        })
    }

    /// Request the full state vector.
    pub fn state_vector(readout: impl Into<String>) -> Self {
        Self {
            kind: InstructionKind::GetStateVector {
                readout: readout.into(),
            },
            qubits: vec![],
        }
    }

    /// Request the state vector with an explicit qubit ordering.
    pub fn state_vector_of(
        readout: impl Into<String>,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> Self {
        Self {
            kind: InstructionKind::GetStateVector {
                readout: readout.into(),
            },
            qubits: qubits.into_iter().collect(),
        }
    }

    /// Request the full density matrix.
    pub fn density_matrix(readout: impl Into<String>) -> Self {
        Self {
            kind: InstructionKind::GetDensityMatrix {
                readout: readout.into(),
            },
            qubits: vec![],
        }
    }

    /// Request the reduced density matrix of a qubit subset.
    pub fn density_matrix_of(
        readout: impl Into<String>,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> Self {
        Self {
            kind: InstructionKind::GetDensityMatrix {
                readout: readout.into(),
            },
            qubits: qubits.into_iter().collect(),
        }
    }

    /// Create a reset instruction.
    pub fn reset(qubit: QubitId) -> Self {
        Self {
            kind: InstructionKind::Reset,
            qubits: vec![qubit],
        }
    }

    /// Create a barrier instruction.
    pub fn barrier(qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            kind: InstructionKind::Barrier,
            qubits: qubits.into_iter().collect(),
        }
    }

    /// Check if this is a gate instruction.
    pub fn is_gate(&self) -> bool {
        matches!(self.kind, InstructionKind::Gate(_))
    }

    /// Check if this is a single-qubit measurement.
    pub fn is_measure(&self) -> bool {
        matches!(self.kind, InstructionKind::MeasureQubit { .. })
    }

    /// Check if this is a register declaration.
    pub fn is_declaration(&self) -> bool {
        matches!(self.kind, InstructionKind::Declare(_))
    }

    /// Get the gate if this is a gate instruction.
    pub fn as_gate(&self) -> Option<&StandardGate> {
        match &self.kind {
            InstructionKind::Gate(g) => Some(g),
            _ => None,
        }
    }

    /// Get the register this instruction writes to or refers to, if any.
    pub fn readout(&self) -> Option<&str> {
        match &self.kind {
            InstructionKind::Declare(decl) => Some(&decl.name),
            InstructionKind::MeasureQubit { readout, .. }
            | InstructionKind::RepeatedMeasurement { readout, .. }
            | InstructionKind::SetShotCount { readout, .. }
            | InstructionKind::GetStateVector { readout }
            | InstructionKind::GetDensityMatrix { readout } => Some(readout),
            InstructionKind::Gate(_) | InstructionKind::Reset | InstructionKind::Barrier => None,
        }
    }

    /// Get the name of the instruction.
    pub fn name(&self) -> &str {
        match &self.kind {
            InstructionKind::Gate(g) => g.name(),
            InstructionKind::Declare(_) => "declare",
            InstructionKind::MeasureQubit { .. } => "measure",
            InstructionKind::RepeatedMeasurement { .. } => "repeated_measurement",
            InstructionKind::SetShotCount { .. } => "set_shot_count",
            InstructionKind::GetStateVector { .. } => "get_state_vector",
            InstructionKind::GetDensityMatrix { .. } => "get_density_matrix",
            InstructionKind::Reset => "reset",
            InstructionKind::Barrier => "barrier",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register::RegisterKind;

    #[test]
    fn test_gate_instruction() {
        let inst = Instruction::single_qubit_gate(StandardGate::H, QubitId(0)).unwrap();
        assert!(inst.is_gate());
        assert_eq!(inst.qubits.len(), 1);
        assert_eq!(inst.name(), "h");
        assert!(inst.readout().is_none());
    }

    #[test]
    fn test_gate_arity_checked() {
        let err = Instruction::gate(StandardGate::CX, [QubitId(0)]).unwrap_err();
        assert!(matches!(
            err,
            IrError::QubitCountMismatch {
                expected: 2,
                got: 1,
                ..
            }
        ));

        let err = Instruction::two_qubit_gate(StandardGate::CZ, QubitId(1), QubitId(1)).unwrap_err();
        assert!(matches!(err, IrError::DuplicateQubit { qubit: QubitId(1), .. }));
    }

    #[test]
    fn test_validate_hand_built_gate() {
        let short = Instruction {
            kind: InstructionKind::Gate(StandardGate::CX),
            qubits: vec![QubitId(0)],
        };
        assert!(matches!(
            short.validate(),
            Err(IrError::QubitCountMismatch { expected: 2, got: 1, .. })
        ));

        let json = r#"{"kind":{"Gate":"CCX"},"qubits":[0,1,0]}"#;
        let parsed: Instruction = serde_json::from_str(json).unwrap();
        assert!(matches!(parsed.validate(), Err(IrError::DuplicateQubit { .. })));

        assert!(Instruction::measure(QubitId(0), "ro", 0).validate().is_ok());
    }

    #[test]
    fn test_measure_instruction() {
        let inst = Instruction::measure(QubitId(2), "ro", 1);
        assert!(inst.is_measure());
        assert_eq!(inst.qubits, vec![QubitId(2)]);
        assert_eq!(inst.readout(), Some("ro"));
    }

    #[test]
    fn test_declaration_validation() {
        let decl = Instruction::declare(RegisterDeclaration::bit("ro", 2, true)).unwrap();
        assert!(decl.is_declaration());
        match &decl.kind {
            InstructionKind::Declare(d) => assert_eq!(d.kind, RegisterKind::Bit),
            _ => panic!("Expected Declare"),
        }

        assert!(matches!(
            Instruction::declare(RegisterDeclaration::bit("ro", 0, true)),
            Err(IrError::ZeroWidthRegister(_))
        ));
        assert!(matches!(
            Instruction::declare(RegisterDeclaration::bit("", 1, true)),
            Err(IrError::EmptyRegisterName)
        ));
    }

    #[test]
    fn test_repeated_measurement_mapping_sets_qubits() {
        let mapping = BTreeMap::from([(QubitId(3), 0), (QubitId(1), 1)]);
        let inst = Instruction::repeated_measurement_with_mapping("ro", 10, mapping).unwrap();
        assert_eq!(inst.qubits, vec![QubitId(1), QubitId(3)]);
        assert!(matches!(
            Instruction::repeated_measurement("ro", 0),
            Err(IrError::ZeroShots(_))
        ));
    }

    #[test]
    fn test_extraction_subset() {
        let full = Instruction::density_matrix("rho");
        assert!(full.qubits.is_empty());
        let sub = Instruction::density_matrix_of("rho", [QubitId(0), QubitId(2)]);
        assert_eq!(sub.qubits.len(), 2);
        assert_eq!(sub.name(), "get_density_matrix");
    }
}
