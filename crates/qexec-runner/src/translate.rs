//! Circuit to engine-program translation.
//!
//! The translator owns the index conventions of the engine boundary:
//!
//! - qubit `i` of the circuit is qubit `i` of the program;
//! - `readout[offset]` of a bit register is flat classical bit
//!   `sum(width of earlier bit registers) + offset`, and every bit register
//!   becomes one classical bit group, in declaration order.
//!
//! Gates outside the backend's [`GateSet`] are rewritten recursively into
//! gates inside it. Rewrites are exact up to global phase.

use std::f64::consts::PI;

use tracing::{debug, instrument};

use qexec_hal::{GateSet, Primitive, Program};
use qexec_ir::{Circuit, InstructionKind, QubitId, StandardGate};

use crate::catalog::RegisterCatalog;
use crate::classify::{Classification, MeasurementMode};
use crate::error::{RunnerError, RunnerResult};

/// Deepest chain of rewrites tried before a gate is declared untranslatable.
const MAX_DECOMPOSITION_DEPTH: usize = 16;

type GateOp = (StandardGate, Vec<QubitId>);

/// Maps circuit instructions to engine primitives.
#[derive(Debug, Clone)]
pub struct GateTranslator {
    gate_set: GateSet,
}

impl GateTranslator {
    /// Create a translator targeting `gate_set`.
    pub fn new(gate_set: GateSet) -> Self {
        Self { gate_set }
    }

    /// Translate a classified circuit into a program.
    ///
    /// In the state modes measurements are not emitted: the engine returns
    /// the state reached by the gates alone.
    #[instrument(skip(self, circuit, classification), fields(mode = %classification.mode))]
    pub fn translate(
        &self,
        circuit: &Circuit,
        classification: &Classification,
    ) -> RunnerResult<Program> {
        let catalog = &classification.catalog;
        let sampling = classification.mode == MeasurementMode::Sampling;
        let groups = catalog.bit_registers().map(|d| d.width).collect();
        let mut program = Program::new(classification.qubit_count).with_clbit_groups(groups);

        for inst in circuit {
            match &inst.kind {
                InstructionKind::Gate(gate) => {
                    inst.validate()?;
                    self.lower_gate(*gate, &inst.qubits, 0, &mut program.ops)?;
                }
                InstructionKind::MeasureQubit { readout, offset } if sampling => {
                    let clbit = flat_clbit(catalog, readout, *offset)?;
                    program.ops.extend(inst.qubits.iter().map(|&qubit| {
                        Primitive::Measure { qubit, clbit }
                    }));
                }
                InstructionKind::RepeatedMeasurement { readout, .. } if sampling => {
                    if let Some(repeated) = &classification.repeated {
                        for &(qubit, offset) in &repeated.measured {
                            let clbit = flat_clbit(catalog, readout, offset)?;
                            program.ops.push(Primitive::Measure { qubit, clbit });
                        }
                    }
                }
                InstructionKind::Reset => {
                    program
                        .ops
                        .extend(inst.qubits.iter().map(|&qubit| Primitive::Reset { qubit }));
                }
                InstructionKind::Barrier => program.ops.push(Primitive::Barrier),
                InstructionKind::MeasureQubit { .. }
                | InstructionKind::RepeatedMeasurement { .. }
                | InstructionKind::Declare(_)
                | InstructionKind::SetShotCount { .. }
                | InstructionKind::GetStateVector { .. }
                | InstructionKind::GetDensityMatrix { .. } => {}
            }
        }

        debug!(
            "translated {} instructions into {} primitives ({} gates)",
            circuit.len(),
            program.ops.len(),
            program.gate_count()
        );
        Ok(program)
    }

    /// Emit `gate` on `qubits`, rewriting it until every piece is native.
    fn lower_gate(
        &self,
        gate: StandardGate,
        qubits: &[QubitId],
        depth: usize,
        out: &mut Vec<Primitive>,
    ) -> RunnerResult<()> {
        if self.gate_set.contains(gate.name()) {
            out.push(Primitive::Gate {
                gate,
                qubits: qubits.to_vec(),
            });
            return Ok(());
        }
        if depth >= MAX_DECOMPOSITION_DEPTH {
            return Err(RunnerError::UnsupportedGate {
                gate: gate.name().to_string(),
            });
        }
        let replacement = self.decompose(gate, qubits);
        for (g, qs) in replacement {
            self.lower_gate(g, &qs, depth + 1, out)
                .map_err(|_| RunnerError::UnsupportedGate {
                    gate: gate.name().to_string(),
                })?;
        }
        Ok(())
    }

    /// One rewrite step for a gate that is not in the gate set.
    fn decompose(&self, gate: StandardGate, qubits: &[QubitId]) -> Vec<GateOp> {
        use StandardGate as G;

        let one = |g: G, q: QubitId| (g, vec![q]);
        let two = |g: G, a: QubitId, b: QubitId| (g, vec![a, b]);

        match gate {
            G::X => vec![one(G::U(PI, 0.0, PI), qubits[0])],
            G::Y => vec![one(G::U(PI, PI / 2.0, PI / 2.0), qubits[0])],
            G::Z => vec![one(G::P(PI), qubits[0])],
            G::H => vec![one(G::U(PI / 2.0, 0.0, PI), qubits[0])],
            G::S => vec![one(G::P(PI / 2.0), qubits[0])],
            G::T => vec![one(G::P(PI / 4.0), qubits[0])],
            G::Tdg => vec![one(G::P(-PI / 4.0), qubits[0])],
            G::SX => vec![one(G::Rx(PI / 2.0), qubits[0])],
            G::Rx(theta) => vec![one(G::U(theta, -PI / 2.0, PI / 2.0), qubits[0])],
            G::Ry(theta) => vec![one(G::U(theta, 0.0, 0.0), qubits[0])],
            G::Rz(theta) => vec![one(G::P(theta), qubits[0])],
            G::P(lambda) => vec![one(G::Rz(lambda), qubits[0])],
            G::U(theta, phi, lambda) => {
                let q = qubits[0];
                if self.gate_set.contains("ry") {
                    vec![
                        one(G::Rz(lambda), q),
                        one(G::Ry(theta), q),
                        one(G::Rz(phi), q),
                    ]
                } else {
                    vec![
                        one(G::Rz(lambda), q),
                        one(G::SX, q),
                        one(G::Rz(theta + PI), q),
                        one(G::SX, q),
                        one(G::Rz(phi + PI), q),
                    ]
                }
            }

            G::CX => {
                let (c, t) = (qubits[0], qubits[1]);
                vec![one(G::H, t), two(G::CZ, c, t), one(G::H, t)]
            }
            G::CZ => {
                let (c, t) = (qubits[0], qubits[1]);
                vec![one(G::H, t), two(G::CX, c, t), one(G::H, t)]
            }
            G::Swap => {
                let (a, b) = (qubits[0], qubits[1]);
                vec![two(G::CX, a, b), two(G::CX, b, a), two(G::CX, a, b)]
            }
            G::RZZ(theta) => {
                let (a, b) = (qubits[0], qubits[1]);
                vec![two(G::CX, a, b), one(G::Rz(theta), b), two(G::CX, a, b)]
            }

            G::CCX => {
                let (a, b, c) = (qubits[0], qubits[1], qubits[2]);
                vec![
                    one(G::H, c),
                    two(G::CX, b, c),
                    one(G::Tdg, c),
                    two(G::CX, a, c),
                    one(G::T, c),
                    two(G::CX, b, c),
                    one(G::Tdg, c),
                    two(G::CX, a, c),
                    one(G::T, b),
                    one(G::T, c),
                    one(G::H, c),
                    two(G::CX, a, b),
                    one(G::T, a),
                    one(G::Tdg, b),
                    two(G::CX, a, b),
                ]
            }
        }
    }
}

/// Flat classical bit index of `readout[offset]`.
fn flat_clbit(catalog: &RegisterCatalog, readout: &str, offset: u32) -> RunnerResult<u32> {
    catalog
        .clbit_start(readout)
        .map(|start| start + offset)
        .ok_or_else(|| RunnerError::unknown_register(readout, "not a declared bit register"))
}
