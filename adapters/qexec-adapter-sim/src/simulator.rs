//! Simulator backend implementation.

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Instant;
use tracing::{debug, instrument};

use qexec_hal::{
    Backend, BackendConfig, BackendFactory, Capabilities, Counts, HalError, HalResult,
    OutputRequest, Primitive, Program, RawOutput,
};
use qexec_ir::QubitId;

use crate::statevector::Statevector;

/// Default maximum number of qubits.
const DEFAULT_MAX_QUBITS: u32 = 20;

/// Local simulator backend.
///
/// Runs programs on an exact statevector. Sampling requests re-run every
/// operation after the first measurement or reset once per shot, so
/// mid-circuit measurements collapse the state the way hardware would.
pub struct SimulatorBackend {
    /// Backend configuration.
    config: BackendConfig,
    /// Cached capabilities.
    capabilities: Capabilities,
    /// Fixed RNG seed; `None` draws from entropy.
    seed: Option<u64>,
}

impl SimulatorBackend {
    /// Create a new simulator backend with default settings.
    pub fn new() -> Self {
        Self::with_max_qubits(DEFAULT_MAX_QUBITS)
    }

    /// Create a simulator with custom max qubits.
    pub fn with_max_qubits(max_qubits: u32) -> Self {
        Self {
            config: BackendConfig::new("simulator"),
            capabilities: Capabilities::simulator(max_qubits),
            seed: None,
        }
    }

    /// Fix the RNG seed so sampling is reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Restrict the advertised output features.
    #[must_use]
    pub fn with_features(mut self, features: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.capabilities = self.capabilities.with_features(features);
        self
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    fn check_program(&self, program: &Program) -> HalResult<()> {
        if program.num_qubits > self.capabilities.num_qubits {
            return Err(HalError::CircuitTooLarge(format!(
                "Program has {} qubits but simulator only supports {}",
                program.num_qubits, self.capabilities.num_qubits
            )));
        }
        for op in &program.ops {
            if let Primitive::Gate { gate, qubits } = op {
                if qubits.len() != gate.num_qubits() as usize {
                    return Err(HalError::InvalidProgram(format!(
                        "'{}' expects {} qubits, got {}",
                        gate.name(),
                        gate.num_qubits(),
                        qubits.len()
                    )));
                }
                if (1..qubits.len()).any(|i| qubits[..i].contains(&qubits[i])) {
                    return Err(HalError::InvalidProgram(format!(
                        "'{}' repeats an operand",
                        gate.name()
                    )));
                }
            }
            let out_of_range = match op {
                Primitive::Gate { qubits, .. } => {
                    qubits.iter().any(|q| q.0 >= program.num_qubits)
                }
                Primitive::Measure { qubit, .. } | Primitive::Reset { qubit } => {
                    qubit.0 >= program.num_qubits
                }
                Primitive::Barrier => false,
            };
            if out_of_range {
                return Err(HalError::InvalidProgram(format!(
                    "'{}' addresses a qubit outside 0..{}",
                    op.name(),
                    program.num_qubits
                )));
            }
        }
        Ok(())
    }

    /// Run `shots` samples and return one formatted outcome per shot.
    #[instrument(skip(self, program), fields(qubits = program.num_qubits))]
    fn run_shots(&self, program: &Program, shots: u32) -> HalResult<Vec<String>> {
        let start = Instant::now();
        let mut rng = self.rng();
        let num_clbits = program.num_clbits() as usize;

        // Everything before the first non-unitary op is shared by all shots.
        let split = program
            .ops
            .iter()
            .position(|op| matches!(op, Primitive::Measure { .. } | Primitive::Reset { .. }))
            .unwrap_or(program.ops.len());
        let (prefix, suffix) = program.ops.split_at(split);

        let mut base = Statevector::new(program.num_qubits as usize);
        let mut scratch = vec![false; num_clbits];
        for op in prefix {
            base.apply(op, &mut scratch, &mut rng)?;
        }

        let mut outcomes = Vec::with_capacity(shots as usize);
        for shot in 0..shots {
            let mut sv = base.clone();
            let mut clbits = vec![false; num_clbits];
            for op in suffix {
                sv.apply(op, &mut clbits, &mut rng)?;
            }
            outcomes.push(program.format_outcome(&clbits));

            if shot > 0 && shot % 1000 == 0 {
                debug!("Completed {} shots", shot);
            }
        }

        debug!("Sampling completed in {:?}", start.elapsed());
        Ok(outcomes)
    }

    /// Run the program once and return the final state.
    fn run_once(&self, program: &Program) -> HalResult<Statevector> {
        let mut rng = self.rng();
        let mut sv = Statevector::new(program.num_qubits as usize);
        let mut clbits = vec![false; program.num_clbits() as usize];
        for op in &program.ops {
            sv.apply(op, &mut clbits, &mut rng)?;
        }
        Ok(sv)
    }

    fn resolve_qubits(qubits: &[QubitId], num_qubits: u32) -> HalResult<Vec<usize>> {
        if qubits.is_empty() {
            return Ok((0..num_qubits as usize).collect());
        }
        let mut seen = vec![false; num_qubits as usize];
        let mut out = Vec::with_capacity(qubits.len());
        for q in qubits {
            match seen.get_mut(q.index()) {
                Some(slot) if !*slot => *slot = true,
                Some(_) => {
                    return Err(HalError::InvalidProgram(format!(
                        "qubit {q} listed twice in extraction subset"
                    )));
                }
                None => {
                    return Err(HalError::InvalidProgram(format!(
                        "extraction subset references {q} outside 0..{num_qubits}"
                    )));
                }
            }
            out.push(q.index());
        }
        Ok(out)
    }
}

impl Default for SimulatorBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for SimulatorBackend {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    #[instrument(skip(self, program), fields(ops = program.ops.len()))]
    async fn execute(&self, program: &Program, request: &OutputRequest) -> HalResult<RawOutput> {
        self.check_program(program)?;

        let feature = request.required_feature();
        if !self.capabilities.has_feature(feature) {
            return Err(HalError::Unsupported(format!(
                "backend '{}' does not provide '{feature}' output",
                self.name()
            )));
        }
        if let Some(shots) = request.shots() {
            if shots == 0 || shots > self.capabilities.max_shots {
                return Err(HalError::InvalidShots(format!(
                    "{shots} shots requested, simulator accepts 1..={}",
                    self.capabilities.max_shots
                )));
            }
        }

        match request {
            OutputRequest::Counts { shots } => {
                let outcomes = self.run_shots(program, *shots)?;
                let counts: Counts = outcomes.into_iter().map(|o| (o, 1)).collect();
                Ok(RawOutput::Counts(counts))
            }
            OutputRequest::Memory { shots } => {
                Ok(RawOutput::Memory(self.run_shots(program, *shots)?))
            }
            OutputRequest::StateVector { qubits } => {
                let order = Self::resolve_qubits(qubits, program.num_qubits)?;
                if order.len() != program.num_qubits as usize {
                    return Err(HalError::Unsupported(format!(
                        "state vector of {} out of {} qubits requires a partial trace",
                        order.len(),
                        program.num_qubits
                    )));
                }
                let sv = self.run_once(program)?;
                if qubits.is_empty() {
                    Ok(RawOutput::Dense(sv.amplitudes().to_vec()))
                } else {
                    Ok(RawOutput::Dense(sv.permuted(&order)))
                }
            }
            OutputRequest::DensityMatrix { qubits } => {
                let keep = Self::resolve_qubits(qubits, program.num_qubits)?;
                let sv = self.run_once(program)?;
                Ok(RawOutput::Dense(sv.reduced_density_matrix(&keep)))
            }
        }
    }
}

impl BackendFactory for SimulatorBackend {
    fn from_config(config: BackendConfig) -> HalResult<Self> {
        let max_qubits = match config.extra_u64("max_qubits") {
            Some(v) => u32::try_from(v).map_err(|_| {
                HalError::Configuration(format!("max_qubits {v} does not fit in u32"))
            })?,
            None => DEFAULT_MAX_QUBITS,
        };
        let seed = config.extra_u64("seed");

        let mut capabilities = Capabilities::simulator(max_qubits);
        if let Some(features) = config.extra.get("features") {
            let features: Vec<String> = serde_json::from_value(features.clone())?;
            capabilities = capabilities.with_features(features);
        }

        Ok(Self {
            config,
            capabilities,
            seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qexec_ir::StandardGate;

    fn bell_program() -> Program {
        let mut program = Program::new(2).with_clbit_groups(vec![2]);
        program.ops = vec![
            Primitive::Gate {
                gate: StandardGate::H,
                qubits: vec![QubitId(0)],
            },
            Primitive::Gate {
                gate: StandardGate::CX,
                qubits: vec![QubitId(0), QubitId(1)],
            },
            Primitive::Measure {
                qubit: QubitId(0),
                clbit: 0,
            },
            Primitive::Measure {
                qubit: QubitId(1),
                clbit: 1,
            },
        ];
        program
    }

    #[test]
    fn test_simulator_capabilities() {
        let backend = SimulatorBackend::new();
        let caps = backend.capabilities();

        assert!(caps.is_simulator);
        assert_eq!(caps.num_qubits, 20);
        assert!(caps.has_feature("sampling"));
    }

    #[tokio::test]
    async fn test_simulator_bell_state() {
        let backend = SimulatorBackend::new().with_seed(42);

        let output = backend
            .execute(&bell_program(), &OutputRequest::Counts { shots: 1000 })
            .await
            .unwrap();
        let RawOutput::Counts(counts) = output else {
            panic!("expected counts");
        };

        assert_eq!(counts.get("00") + counts.get("11"), 1000);
        assert_eq!(counts.get("01") + counts.get("10"), 0);
    }

    #[tokio::test]
    async fn test_simulator_memory_has_one_entry_per_shot() {
        let backend = SimulatorBackend::new();
        let output = backend
            .execute(&bell_program(), &OutputRequest::Memory { shots: 25 })
            .await
            .unwrap();
        let RawOutput::Memory(memory) = output else {
            panic!("expected memory");
        };
        assert_eq!(memory.len(), 25);
        assert!(memory.iter().all(|m| m == "00" || m == "11"));
    }

    #[tokio::test]
    async fn test_simulator_too_many_qubits() {
        let backend = SimulatorBackend::with_max_qubits(5);
        let program = Program::new(10);
        let result = backend
            .execute(&program, &OutputRequest::Counts { shots: 100 })
            .await;

        assert!(matches!(result, Err(HalError::CircuitTooLarge(_))));
    }

    #[tokio::test]
    async fn test_malformed_gate_operands() {
        let backend = SimulatorBackend::new();
        for qubits in [vec![QubitId(0)], vec![QubitId(1), QubitId(1)]] {
            let mut program = Program::new(2);
            program.ops = vec![Primitive::Gate {
                gate: StandardGate::CX,
                qubits,
            }];
            let result = backend
                .execute(&program, &OutputRequest::StateVector { qubits: vec![] })
                .await;
            assert!(matches!(result, Err(HalError::InvalidProgram(_))));
        }
    }

    #[tokio::test]
    async fn test_statevector_subset_must_be_permutation() {
        let backend = SimulatorBackend::new();
        let result = backend
            .execute(
                &Program::new(2),
                &OutputRequest::StateVector {
                    qubits: vec![QubitId(0)],
                },
            )
            .await;
        assert!(matches!(result, Err(HalError::Unsupported(_))));
    }

    #[tokio::test]
    async fn test_missing_feature_is_unsupported() {
        let backend = SimulatorBackend::new().with_features(["sampling"]);
        let result = backend
            .execute(&Program::new(1), &OutputRequest::Memory { shots: 1 })
            .await;
        assert!(matches!(result, Err(HalError::Unsupported(_))));
    }

    #[test]
    fn test_from_config() {
        let config = BackendConfig::new("sim")
            .with_extra("max_qubits", serde_json::json!(8))
            .with_extra("seed", serde_json::json!(5))
            .with_extra("features", serde_json::json!(["sampling", "statevector"]));
        let backend = SimulatorBackend::from_config(config).unwrap();

        assert_eq!(backend.name(), "sim");
        assert_eq!(backend.capabilities().num_qubits, 8);
        assert!(!backend.capabilities().has_feature("memory"));
        assert_eq!(backend.seed, Some(5));
    }
}
