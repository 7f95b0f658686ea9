//! qexec Local Statevector Simulator
//!
//! This crate provides the reference engine behind the qexec pipeline. It
//! keeps an exact statevector and serves every [`OutputRequest`] kind:
//!
//! - **Counts / Memory**: per-shot sampling with projective measurement
//!   collapse, formatted with the program's classical bit groups.
//! - **StateVector**: the final amplitudes, optionally re-ordered.
//! - **DensityMatrix**: the final (reduced) density matrix, row-major.
//!
//! # Performance
//!
//! | Qubits | Memory | Simulation Speed |
//! |--------|--------|------------------|
//! | 10 | ~16 KB | Instant |
//! | 15 | ~512 KB | Fast |
//! | 20 | ~16 MB | Moderate |
//! | 25 | ~512 MB | Slow |
//!
//! Density matrices cost the square of the kept dimension on top.
//!
//! # Example
//!
//! ```ignore
//! use qexec_adapter_sim::SimulatorBackend;
//! use qexec_hal::{Backend, OutputRequest, Program};
//!
//! let backend = SimulatorBackend::new().with_seed(7);
//! let output = backend
//!     .execute(&program, &OutputRequest::Counts { shots: 1000 })
//!     .await?;
//! ```
//!
//! [`OutputRequest`]: qexec_hal::OutputRequest

mod simulator;
mod statevector;

pub use simulator::SimulatorBackend;
pub use statevector::Statevector;
