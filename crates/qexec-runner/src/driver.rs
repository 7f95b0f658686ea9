//! Execution driver: one backend call per circuit.

use std::sync::Arc;

use tracing::{debug, instrument};

use qexec_hal::{Backend, HalError, OutputRequest, Program, RawOutput, ValidationResult};

use crate::classify::{Classification, MeasurementMode};
use crate::error::RunnerResult;

/// Sampling output shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingOutput {
    /// One histogram for all shots.
    Aggregate,
    /// One outcome per shot.
    Memory,
}

/// Invokes the backend for a translated program.
pub struct ExecutionDriver {
    backend: Arc<dyn Backend>,
    sampling: SamplingOutput,
}

impl ExecutionDriver {
    /// Create a driver around a backend handle.
    pub fn new(backend: Arc<dyn Backend>, sampling: SamplingOutput) -> Self {
        Self { backend, sampling }
    }

    /// Build the backend request for a classified circuit.
    pub fn request_for(&self, classification: &Classification) -> OutputRequest {
        match classification.mode {
            MeasurementMode::Sampling => match self.sampling {
                SamplingOutput::Aggregate => OutputRequest::Counts {
                    shots: classification.shots,
                },
                SamplingOutput::Memory => OutputRequest::Memory {
                    shots: classification.shots,
                },
            },
            MeasurementMode::StateVector => OutputRequest::StateVector {
                qubits: extraction_qubits(classification),
            },
            MeasurementMode::DensityMatrix => OutputRequest::DensityMatrix {
                qubits: extraction_qubits(classification),
            },
        }
    }

    /// Validate and run `program` once. Failures are not retried.
    #[instrument(skip(self, program, classification), fields(backend = self.backend.name()))]
    pub async fn run(
        &self,
        program: &Program,
        classification: &Classification,
    ) -> RunnerResult<RawOutput> {
        let request = self.request_for(classification);

        if let ValidationResult::Invalid { reasons } =
            self.backend.validate(program, &request).await?
        {
            return Err(HalError::InvalidProgram(reasons.join("; ")).into());
        }

        debug!(
            "executing {} primitives on {} qubits ({:?})",
            program.ops.len(),
            program.num_qubits,
            request
        );
        let raw = self.backend.execute(program, &request).await?;
        debug!("backend returned {} output", raw.kind());
        Ok(raw)
    }
}

fn extraction_qubits(classification: &Classification) -> Vec<qexec_ir::QubitId> {
    classification
        .extraction
        .as_ref()
        .map(|e| e.qubits.clone())
        .unwrap_or_default()
}

impl std::fmt::Debug for ExecutionDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionDriver")
            .field("backend", &self.backend.name())
            .field("sampling", &self.sampling)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RegisterCatalog;
    use crate::error::RunnerError;
    use async_trait::async_trait;
    use qexec_hal::{Capabilities, Counts, HalResult};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingBackend {
        caps: Capabilities,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Backend for FailingBackend {
        fn name(&self) -> &str {
            "failing"
        }

        fn capabilities(&self) -> &Capabilities {
            &self.caps
        }

        async fn execute(
            &self,
            _program: &Program,
            _request: &OutputRequest,
        ) -> HalResult<RawOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(HalError::ExecutionFailed("engine crashed".into()))
        }
    }

    struct EchoBackend {
        caps: Capabilities,
    }

    #[async_trait]
    impl Backend for EchoBackend {
        fn name(&self) -> &str {
            "echo"
        }

        fn capabilities(&self) -> &Capabilities {
            &self.caps
        }

        async fn execute(
            &self,
            _program: &Program,
            request: &OutputRequest,
        ) -> HalResult<RawOutput> {
            match request {
                OutputRequest::Counts { shots } => {
                    Ok(RawOutput::Counts(Counts::from_pairs([("0", u64::from(*shots))])))
                }
                _ => Ok(RawOutput::Memory(vec![])),
            }
        }
    }

    fn sampling(shots: u32) -> Classification {
        Classification {
            mode: MeasurementMode::Sampling,
            catalog: RegisterCatalog::new(),
            qubit_count: 1,
            shots,
            repeated: None,
            extraction: None,
        }
    }

    #[test]
    fn test_request_for_sampling() {
        let backend = Arc::new(EchoBackend {
            caps: Capabilities::simulator(2),
        });
        let aggregate = ExecutionDriver::new(backend.clone(), SamplingOutput::Aggregate);
        assert_eq!(
            aggregate.request_for(&sampling(7)),
            OutputRequest::Counts { shots: 7 }
        );
        let memory = ExecutionDriver::new(backend, SamplingOutput::Memory);
        assert_eq!(
            memory.request_for(&sampling(7)),
            OutputRequest::Memory { shots: 7 }
        );
    }

    #[tokio::test]
    async fn test_backend_failure_is_not_retried() {
        let backend = Arc::new(FailingBackend {
            caps: Capabilities::simulator(2),
            calls: AtomicUsize::new(0),
        });
        let driver = ExecutionDriver::new(backend.clone(), SamplingOutput::Aggregate);

        let err = driver
            .run(&Program::new(1), &sampling(10))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RunnerError::BackendExecution(HalError::ExecutionFailed(_))
        ));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_program_rejected_before_execution() {
        let backend = Arc::new(FailingBackend {
            caps: Capabilities::simulator(1),
            calls: AtomicUsize::new(0),
        });
        let driver = ExecutionDriver::new(backend.clone(), SamplingOutput::Aggregate);

        let err = driver
            .run(&Program::new(4), &sampling(10))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RunnerError::BackendExecution(HalError::InvalidProgram(_))
        ));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_single_call_returns_raw_output() {
        let driver = ExecutionDriver::new(
            Arc::new(EchoBackend {
                caps: Capabilities::simulator(2),
            }),
            SamplingOutput::Aggregate,
        );
        let raw = driver.run(&Program::new(1), &sampling(12)).await.unwrap();
        assert_eq!(raw.shots(), Some(12));
    }
}
