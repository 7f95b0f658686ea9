//! Error types for the runner crate.

use qexec_hal::HalError;
use qexec_ir::IrError;
use thiserror::Error;

/// Errors raised while validating, running or decoding a circuit.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunnerError {
    /// The circuit asks for no output at all.
    #[error(
        "the circuit contains no measurement, state-vector, or density-matrix request; \
         simulation is impossible"
    )]
    NoMeasurementPresent,

    /// State-vector and density-matrix extraction requested together.
    #[error("the circuit requests both a state vector and a density matrix")]
    ConflictingStateExtraction,

    /// More than one sampling or extraction construct drives the run.
    #[error("the circuit mixes measurement kinds: {0}")]
    MultipleMeasurementKinds(String),

    /// Output length does not match the declared dimension.
    #[error("dimension mismatch for register '{register}': expected {expected}, got {got}")]
    DimensionMismatch {
        /// Register being filled.
        register: String,
        /// Expected length.
        expected: usize,
        /// Actual length.
        got: usize,
    },

    /// An instruction refers to a register that was not declared with the
    /// required element kind.
    #[error("unknown register '{name}': {reason}")]
    UnknownRegister {
        /// Register name.
        name: String,
        /// What was expected of it.
        reason: String,
    },

    /// A register name was re-declared with a different width, kind or
    /// output flag.
    #[error("register '{name}' re-declared as {new}, previously {previous}")]
    ConflictingDeclaration {
        /// Register name.
        name: String,
        /// First declaration.
        previous: String,
        /// Conflicting declaration.
        new: String,
    },

    /// A raw shot string cannot be split into the declared bit registers.
    #[error("malformed shot string '{shot}': {reason}")]
    MalformedShotString {
        /// The offending shot, whitespace removed.
        shot: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The backend failed to run the program.
    #[error("backend execution failed: {0}")]
    BackendExecution(#[from] HalError),

    /// The backend handle does not satisfy the capability contract.
    #[error("invalid backend handle: {0}")]
    InvalidBackendHandle(String),

    /// A gate cannot be expressed in the backend's gate set.
    #[error("gate '{gate}' cannot be translated to the backend gate set")]
    UnsupportedGate {
        /// Gate name.
        gate: String,
    },

    /// Invalid runner configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A measurement could not be set up or post-processed.
    #[error("measurement evaluation failed: {0}")]
    Evaluation(String),

    /// Circuit construction error.
    #[error("circuit error: {0}")]
    Ir(#[from] IrError),
}

impl RunnerError {
    pub(crate) fn unknown_register(name: impl Into<String>, reason: impl Into<String>) -> Self {
        RunnerError::UnknownRegister {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;
