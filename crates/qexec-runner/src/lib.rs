//! qexec Circuit Runner
//!
//! This crate validates circuits, decides how their output is measured,
//! runs them on a [`qexec_hal::Backend`] and decodes the raw output into
//! named registers.
//!
//! # Overview
//!
//! Running a circuit goes through four stages:
//! 1. **Classification**: build the [`RegisterCatalog`], check register
//!    references and choose a [`MeasurementMode`] plus a shot count
//! 2. **Translation**: lower every gate to the backend's native gate set
//! 3. **Execution**: one backend call per circuit, never retried
//! 4. **Decoding**: split sampled bit strings or dense output into the
//!    output registers of an [`ExecutionResult`]
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use qexec_adapter_sim::SimulatorBackend;
//! use qexec_ir::{Circuit, QubitId};
//! use qexec_runner::{QuantumRunner, RunnerConfig};
//!
//! let mut circuit = Circuit::new("bell");
//! circuit
//!     .declare_bit("ro", 2, true)?
//!     .h(QubitId(0))?
//!     .cx(QubitId(0), QubitId(1))?
//!     .repeated_measurement("ro", 1000)?;
//!
//! let runner = QuantumRunner::new(Arc::new(SimulatorBackend::new()), RunnerConfig::default())?;
//! let result = runner.run_circuit(&circuit).await?;
//! assert_eq!(result.bits("ro").unwrap().len(), 1000);
//! ```

pub mod catalog;
pub mod classify;
pub mod config;
pub mod decode;
pub mod driver;
pub mod error;
pub mod measurement;
pub mod result;
pub mod runner;
pub mod translate;

pub use catalog::RegisterCatalog;
pub use classify::{Classification, Extraction, MeasurementMode, RepeatedReadout, classify};
pub use config::RunnerConfig;
pub use decode::{ResultDecoder, canonicalize, decode_shot};
pub use driver::{ExecutionDriver, SamplingOutput};
pub use error::{RunnerError, RunnerResult};
pub use measurement::{ClassicalRegister, Measurement, PauliZProduct, PauliZProductInput};
pub use result::{BitRegisters, ComplexRegisters, ExecutionResult, FloatRegisters};
pub use runner::QuantumRunner;
pub use translate::GateTranslator;
