//! qexec Circuit Representation
//!
//! This crate provides the data structures for circuits handed to the
//! qexec execution pipeline: an ordered list of typed instructions over
//! implicitly numbered qubits and explicitly declared classical registers.
//!
//! # Core Components
//!
//! - **Qubits**: [`QubitId`] addresses a qubit by index
//! - **Gates**: [`StandardGate`] for built-in gates with concrete angles
//! - **Registers**: [`RegisterDeclaration`] / [`RegisterKind`] for bit, float
//!   and complex readout registers
//! - **Instructions**: [`Instruction`] combining an [`InstructionKind`] with
//!   its qubit operands
//! - **Circuit**: [`Circuit`] builder API
//!
//! # Example: Sampling a Bell State
//!
//! ```rust
//! use qexec_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::new("bell_state");
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.declare_bit("ro", 2, true).unwrap();
//! circuit.repeated_measurement("ro", 1000).unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! ```
//!
//! # Measurement Instructions
//!
//! | Instruction | Effect |
//! |-------------|--------|
//! | `MeasureQubit` | Measure one qubit into `register[offset]` |
//! | `RepeatedMeasurement` | Measure all (mapped) qubits, `shots` times |
//! | `SetShotCount` | Shot count for explicit `MeasureQubit` sampling |
//! | `GetStateVector` | Exact amplitudes into a complex register |
//! | `GetDensityMatrix` | Flattened (reduced) density matrix into a complex register |

pub mod circuit;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod qubit;
pub mod register;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::StandardGate;
pub use instruction::{Instruction, InstructionKind};
pub use qubit::QubitId;
pub use register::{RegisterDeclaration, RegisterKind};
