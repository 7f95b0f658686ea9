//! Backend trait and configuration.
//!
//! The [`Backend`] trait is the engine boundary of qexec:
//!
//! ```text
//!   capabilities() ──→ validate() ──→ execute()
//!    (sync, &ref)       (async)       (async, one call per circuit)
//! ```
//!
//! - **Async-native**: the single engine call is awaited.
//! - **Thread-safe**: `Send + Sync` so one handle can be shared behind `Arc`.
//! - **Infallible introspection**: `capabilities()` is synchronous and
//!   cached at construction.
//! - **One shot of I/O**: `execute()` runs a whole sampling batch or one
//!   state extraction; callers never retry it.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::capability::Capabilities;
use crate::error::HalResult;
use crate::program::{OutputRequest, Primitive, Program};
use crate::result::RawOutput;

/// Configuration for a backend instance.
#[derive(Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Name of the backend.
    pub name: String,
    /// Additional configuration.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl BackendConfig {
    /// Create a new backend configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extra: serde_json::Map::new(),
        }
    }

    /// Add extra configuration.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Read an unsigned integer from the extra configuration.
    pub fn extra_u64(&self, key: &str) -> Option<u64> {
        self.extra.get(key).and_then(serde_json::Value::as_u64)
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("name", &self.name)
            .field("extra", &self.extra)
            .finish()
    }
}

/// Trait for execution backends.
///
/// # Contract
///
/// - `capabilities()` MUST be synchronous and infallible.
/// - `execute()` MUST honour the [`OutputRequest`] variant: `Counts` yields
///   [`RawOutput::Counts`], `Memory` yields [`RawOutput::Memory`], and the
///   state requests yield [`RawOutput::Dense`].
/// - `execute()` failures are reported once; callers do not retry.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Get the name of this backend.
    fn name(&self) -> &str;

    /// Get the capabilities of this backend.
    fn capabilities(&self) -> &Capabilities;

    /// Validate a program against backend constraints.
    ///
    /// The default checks qubit count, gate support, shot limit and the
    /// feature needed for `request`.
    async fn validate(
        &self,
        program: &Program,
        request: &OutputRequest,
    ) -> HalResult<ValidationResult> {
        let caps = self.capabilities();
        let mut reasons = vec![];

        if program.num_qubits > caps.num_qubits {
            reasons.push(format!(
                "program uses {} qubits but backend '{}' supports {}",
                program.num_qubits,
                self.name(),
                caps.num_qubits
            ));
        }
        for op in &program.ops {
            if let Primitive::Gate { gate, .. } = op {
                if !caps.gate_set.contains(gate.name()) {
                    reasons.push(format!("gate '{}' is not supported", gate.name()));
                }
            }
        }
        if let Some(shots) = request.shots() {
            if shots == 0 || shots > caps.max_shots {
                reasons.push(format!(
                    "shot count {shots} outside 1..={}",
                    caps.max_shots
                ));
            }
        }
        let feature = request.required_feature();
        if !caps.has_feature(feature) {
            reasons.push(format!("backend does not provide '{feature}' output"));
        }

        if reasons.is_empty() {
            Ok(ValidationResult::Valid)
        } else {
            Ok(ValidationResult::Invalid { reasons })
        }
    }

    /// Run a program once and return its raw output.
    async fn execute(&self, program: &Program, request: &OutputRequest) -> HalResult<RawOutput>;
}

/// Result of program validation against backend constraints.
#[derive(Debug, Clone)]
pub enum ValidationResult {
    /// Program can be executed as-is.
    Valid,
    /// Program cannot run on this backend.
    Invalid {
        /// Reasons the program is invalid.
        reasons: Vec<String>,
    },
}

impl ValidationResult {
    /// Check if the program is valid.
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }
}

/// Trait for creating backends from configuration.
pub trait BackendFactory: Backend + Sized {
    /// Create a backend from configuration.
    fn from_config(config: BackendConfig) -> HalResult<Self>;
}
