//! qexec Hardware Abstraction Layer
//!
//! This crate is the boundary between circuit handling and the engines that
//! actually run programs.
//!
//! # Overview
//!
//! - A [`Program`] is a flat list of [`Primitive`] operations the engine
//!   supports natively, plus the classical bit grouping used to format
//!   sampled outcomes.
//! - An [`OutputRequest`] says what to return: an outcome histogram, one
//!   outcome per shot, a state vector, or a density matrix.
//! - The [`Backend`] trait runs one program for one request and returns a
//!   [`RawOutput`].
//! - [`Capabilities`] advertise qubit count, native [`GateSet`] and output
//!   features; the [`BackendRegistry`] creates backends by name.
//!
//! # Implementing a Custom Backend
//!
//! ```ignore
//! use qexec_hal::{Backend, Capabilities, HalResult, OutputRequest, Program, RawOutput};
//! use async_trait::async_trait;
//!
//! struct MyBackend {
//!     capabilities: Capabilities,
//! }
//!
//! #[async_trait]
//! impl Backend for MyBackend {
//!     fn name(&self) -> &str { "my_backend" }
//!
//!     fn capabilities(&self) -> &Capabilities {
//!         &self.capabilities
//!     }
//!
//!     async fn execute(&self, program: &Program, request: &OutputRequest) -> HalResult<RawOutput> {
//!         // Run the program on the engine
//!         # todo!()
//!     }
//! }
//! ```

pub mod backend;
pub mod capability;
pub mod error;
pub mod program;
pub mod registry;
pub mod result;

pub use backend::{Backend, BackendConfig, BackendFactory, ValidationResult};
pub use capability::{
    Capabilities, FEATURE_DENSITY_MATRIX, FEATURE_MEMORY, FEATURE_SAMPLING, FEATURE_STATEVECTOR,
    GateSet,
};
pub use error::{HalError, HalResult};
pub use program::{OutputRequest, Primitive, Program};
pub use registry::BackendRegistry;
pub use result::{Counts, RawOutput};
