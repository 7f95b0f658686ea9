//! The circuit runner.
//!
//! [`QuantumRunner`] chains the pipeline for each circuit:
//!
//! ```text
//!   classify ──→ translate ──→ execute ──→ decode
//!   (catalog,     (backend      (one call,   (named
//!    mode, shots)  gate set)     no retry)    registers)
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, info, instrument};

use qexec_hal::{Backend, BackendConfig, BackendRegistry, FEATURE_MEMORY, FEATURE_SAMPLING};
use qexec_ir::Circuit;

use crate::classify::classify;
use crate::config::RunnerConfig;
use crate::decode::ResultDecoder;
use crate::driver::{ExecutionDriver, SamplingOutput};
use crate::error::{RunnerError, RunnerResult};
use crate::measurement::Measurement;
use crate::result::ExecutionResult;
use crate::translate::GateTranslator;

/// Runs circuits and measurements on one backend.
pub struct QuantumRunner {
    backend: Arc<dyn Backend>,
    config: RunnerConfig,
}

impl QuantumRunner {
    /// Wrap a backend handle.
    ///
    /// Fails with [`RunnerError::InvalidBackendHandle`] when the backend
    /// cannot sample, or cannot return per-shot outcomes while
    /// `config.memory` is set.
    pub fn new(backend: Arc<dyn Backend>, config: RunnerConfig) -> RunnerResult<Self> {
        config.validate()?;
        let caps = backend.capabilities();
        if !caps.has_feature(FEATURE_SAMPLING) {
            return Err(RunnerError::InvalidBackendHandle(format!(
                "backend '{}' does not support {FEATURE_SAMPLING}",
                backend.name()
            )));
        }
        if config.memory && !caps.has_feature(FEATURE_MEMORY) {
            return Err(RunnerError::InvalidBackendHandle(format!(
                "backend '{}' does not support {FEATURE_MEMORY}",
                backend.name()
            )));
        }
        info!(
            "runner on backend '{}' ({} qubits)",
            backend.name(),
            caps.num_qubits
        );
        Ok(Self { backend, config })
    }

    /// Create the backend named by `config.backend` from a registry.
    pub fn from_registry(registry: &BackendRegistry, config: RunnerConfig) -> RunnerResult<Self> {
        if !registry.has_backend(&config.backend) {
            return Err(RunnerError::InvalidBackendHandle(format!(
                "no backend named '{}' (available: {})",
                config.backend,
                registry.available_backends().join(", ")
            )));
        }
        let mut backend_config = BackendConfig::new(config.backend.clone());
        if let Some(max_qubits) = config.max_qubits {
            backend_config = backend_config.with_extra("max_qubits", max_qubits.into());
        }
        let backend = registry.create(&config.backend, backend_config)?;
        Self::new(backend, config)
    }

    /// Backend handle in use.
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Active configuration.
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Validate, run and decode one circuit.
    #[instrument(skip(self, circuit), fields(circuit = circuit.name(), backend = self.backend.name()))]
    pub async fn run_circuit(&self, circuit: &Circuit) -> RunnerResult<ExecutionResult> {
        let classification = classify(circuit, self.config.default_shots)?;
        debug!(
            "classified as {} on {} qubits, {} shots",
            classification.mode, classification.qubit_count, classification.shots
        );

        let translator = GateTranslator::new(self.backend.capabilities().gate_set.clone());
        let program = translator.translate(circuit, &classification)?;

        let raw = ExecutionDriver::new(Arc::clone(&self.backend), self.sampling_output())
            .run(&program, &classification)
            .await?;
        ResultDecoder.decode(raw, &classification)
    }

    /// Run every circuit of a measurement, prefixed by its constant
    /// circuit, and merge the registers.
    #[instrument(skip_all, fields(circuits = measurement.circuits().len()))]
    pub async fn run_measurement_registers(
        &self,
        measurement: &impl Measurement,
    ) -> RunnerResult<ExecutionResult> {
        let mut merged = ExecutionResult::new();
        for circuit in measurement.circuits() {
            let full = match measurement.constant_circuit() {
                Some(constant) => Cow::Owned(constant.concat(circuit)),
                None => Cow::Borrowed(circuit),
            };
            merged.merge(self.run_circuit(&full).await?);
        }
        Ok(merged)
    }

    /// Run a measurement and evaluate its expectation values.
    pub async fn run_measurement(
        &self,
        measurement: &impl Measurement,
    ) -> RunnerResult<Option<FxHashMap<String, f64>>> {
        let registers = self.run_measurement_registers(measurement).await?;
        measurement.evaluate(&registers)
    }

    fn sampling_output(&self) -> SamplingOutput {
        if self.config.memory {
            SamplingOutput::Memory
        } else {
            SamplingOutput::Aggregate
        }
    }
}

impl std::fmt::Debug for QuantumRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuantumRunner")
            .field("backend", &self.backend.name())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use qexec_hal::{Capabilities, Counts, HalResult, OutputRequest, Program, RawOutput};
    use qexec_ir::QubitId;

    /// Returns every shot as all-ones.
    struct OnesBackend {
        caps: Capabilities,
    }

    #[async_trait]
    impl Backend for OnesBackend {
        fn name(&self) -> &str {
            "ones"
        }

        fn capabilities(&self) -> &Capabilities {
            &self.caps
        }

        async fn execute(
            &self,
            program: &Program,
            request: &OutputRequest,
        ) -> HalResult<RawOutput> {
            let outcome = program.format_outcome(&vec![true; program.num_clbits() as usize]);
            Ok(match request {
                OutputRequest::Memory { shots } => RawOutput::Memory(vec![outcome; *shots as usize]),
                _ => RawOutput::Counts(Counts::from_pairs([(
                    outcome,
                    request.shots().map(u64::from).unwrap_or(0),
                )])),
            })
        }
    }

    fn ones(features: &[&str]) -> Arc<dyn Backend> {
        Arc::new(OnesBackend {
            caps: Capabilities::simulator(4).with_features(features.iter().copied()),
        })
    }

    fn sampled(shots: u32) -> Circuit {
        let mut circuit = Circuit::new("sampled");
        circuit
            .declare_bit("ro", 2, true)
            .unwrap()
            .x(QubitId(0))
            .unwrap()
            .repeated_measurement("ro", shots)
            .unwrap();
        circuit
    }

    #[test]
    fn test_backend_without_sampling_rejected() {
        let err = QuantumRunner::new(ones(&["statevector"]), RunnerConfig::default()).unwrap_err();
        assert!(matches!(err, RunnerError::InvalidBackendHandle(_)));
    }

    #[test]
    fn test_memory_requires_feature() {
        let config = RunnerConfig {
            memory: true,
            ..RunnerConfig::default()
        };
        assert!(matches!(
            QuantumRunner::new(ones(&["sampling"]), config.clone()),
            Err(RunnerError::InvalidBackendHandle(_))
        ));
        assert!(QuantumRunner::new(ones(&["sampling", "memory"]), config).is_ok());
    }

    #[test]
    fn test_unknown_registry_name() {
        let config = RunnerConfig {
            backend: "nowhere".into(),
            ..RunnerConfig::default()
        };
        let err = QuantumRunner::from_registry(&BackendRegistry::new(), config).unwrap_err();
        assert!(matches!(err, RunnerError::InvalidBackendHandle(_)));
    }

    #[tokio::test]
    async fn test_run_circuit_aggregate_and_memory() {
        let runner = QuantumRunner::new(ones(&["sampling"]), RunnerConfig::default()).unwrap();
        let result = runner.run_circuit(&sampled(5)).await.unwrap();
        assert_eq!(result.bits("ro").unwrap(), vec![vec![true, true]; 5].as_slice());

        let config = RunnerConfig {
            memory: true,
            ..RunnerConfig::default()
        };
        let runner = QuantumRunner::new(ones(&["sampling", "memory"]), config).unwrap();
        let result = runner.run_circuit(&sampled(3)).await.unwrap();
        assert_eq!(result.bits("ro").unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_measurement_registers_merge() {
        use crate::measurement::ClassicalRegister;

        let mut constant = Circuit::new("constant");
        constant.declare_bit("ro", 2, true).unwrap();
        let mut body = Circuit::new("body");
        body.x(QubitId(1)).unwrap().repeated_measurement("ro", 4).unwrap();

        let measurement = ClassicalRegister::new(Some(constant), vec![body.clone(), body]);
        let runner = QuantumRunner::new(ones(&["sampling"]), RunnerConfig::default()).unwrap();

        let merged = runner.run_measurement_registers(&measurement).await.unwrap();
        assert_eq!(merged.bits("ro").unwrap().len(), 8);
        assert_eq!(runner.run_measurement(&measurement).await.unwrap(), None);
    }
}
