//! Measurement-mode classification.
//!
//! A circuit runs in exactly one [`MeasurementMode`]. The classifier scans
//! the instruction list once, counting the constructs that drive a run,
//! and resolves the mode with a fixed priority table:
//!
//! | # | Condition | Outcome |
//! |---|-----------|---------|
//! | 1 | state vector and density matrix both requested | `ConflictingStateExtraction` |
//! | 2 | two driving constructs of the same family | `MultipleMeasurementKinds` |
//! | 3 | one state-vector request | `StateVector` |
//! | 4 | one density-matrix request | `DensityMatrix` |
//! | 5 | repeated or single-qubit measurement | `Sampling` |
//! | 6 | nothing | `NoMeasurementPresent` |
//!
//! Register references are checked against the catalog afterwards.
//!
//! Row 2 is deliberately lenient in one case: a single-qubit measurement
//! into the repeated measurement's *own* register is accepted, and those
//! measurements define which qubit lands at which offset. A stricter reading
//! would reject any single-qubit measurement next to a repeated one; only
//! measurements into a *different* register are rejected here.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, instrument, warn};

use qexec_ir::{Circuit, InstructionKind, QubitId, RegisterKind};

use crate::catalog::RegisterCatalog;
use crate::error::{RunnerError, RunnerResult};

/// How a circuit is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasurementMode {
    /// Repeated sampling of classical bit registers.
    Sampling,
    /// One run returning the exact state vector.
    StateVector,
    /// One run returning the (reduced) density matrix.
    DensityMatrix,
}

impl fmt::Display for MeasurementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasurementMode::Sampling => write!(f, "sampling"),
            MeasurementMode::StateVector => write!(f, "state vector"),
            MeasurementMode::DensityMatrix => write!(f, "density matrix"),
        }
    }
}

/// The repeated measurement that drives a sampling run.
#[derive(Debug, Clone, PartialEq)]
pub struct RepeatedReadout {
    /// Destination bit register.
    pub readout: String,
    /// Measurements to insert where the repeated measurement sits, as
    /// `(qubit, offset)` pairs. Empty when single-qubit measurements into
    /// the same register already define the mapping.
    pub measured: Vec<(QubitId, u32)>,
}

/// The state requested by an extraction instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Destination complex register.
    pub readout: String,
    /// Requested qubit subset; empty means every qubit.
    pub qubits: Vec<QubitId>,
}

/// Outcome of classifying a circuit.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Selected execution mode.
    pub mode: MeasurementMode,
    /// Registers declared by the circuit.
    pub catalog: RegisterCatalog,
    /// Number of qubits the engine must allocate.
    pub qubit_count: u32,
    /// Number of shots; only meaningful in [`MeasurementMode::Sampling`].
    pub shots: u32,
    /// Driving repeated measurement, if any.
    pub repeated: Option<RepeatedReadout>,
    /// Extraction request in the state modes.
    pub extraction: Option<Extraction>,
}

/// Everything counted during the scan.
#[derive(Default)]
struct Scan<'a> {
    repeated: Vec<(&'a str, u32, Option<&'a BTreeMap<QubitId, u32>>)>,
    measures: Vec<(&'a str, u32)>,
    state_vectors: Vec<Extraction>,
    density_matrices: Vec<Extraction>,
    shot_overrides: Vec<(&'a str, u32)>,
    max_qubit: Option<u32>,
}

/// Classify a circuit's measurement intent.
///
/// `default_shots` is used when a sampling circuit names no shot count.
#[instrument(skip(circuit), fields(circuit = circuit.name(), instructions = circuit.len()))]
pub fn classify(circuit: &Circuit, default_shots: u32) -> RunnerResult<Classification> {
    let catalog = RegisterCatalog::from_circuit(circuit)?;
    let scan = scan(circuit)?;

    // 1 + 2
    if !scan.state_vectors.is_empty() && !scan.density_matrices.is_empty() {
        return Err(RunnerError::ConflictingStateExtraction);
    }
    if scan.repeated.len() > 1 {
        return Err(RunnerError::MultipleMeasurementKinds(format!(
            "{} repeated measurements",
            scan.repeated.len()
        )));
    }
    if scan.state_vectors.len() > 1 || scan.density_matrices.len() > 1 {
        return Err(RunnerError::MultipleMeasurementKinds(
            "more than one state extraction of the same kind".into(),
        ));
    }
    if let Some(&(rm_readout, _, _)) = scan.repeated.first() {
        if let Some(&(other, _)) = scan.measures.iter().find(|(r, _)| *r != rm_readout) {
            return Err(RunnerError::MultipleMeasurementKinds(format!(
                "repeated measurement into '{rm_readout}' alongside single-qubit \
                 measurement into '{other}'"
            )));
        }
    }

    check_references(&scan, &catalog)?;

    // 3..6
    let (mode, extraction) = if let Some(sv) = scan.state_vectors.first() {
        (MeasurementMode::StateVector, Some(sv.clone()))
    } else if let Some(dm) = scan.density_matrices.first() {
        (MeasurementMode::DensityMatrix, Some(dm.clone()))
    } else if !scan.repeated.is_empty() || !scan.measures.is_empty() {
        (MeasurementMode::Sampling, None)
    } else {
        return Err(RunnerError::NoMeasurementPresent);
    };

    if mode != MeasurementMode::Sampling
        && (!scan.repeated.is_empty() || !scan.measures.is_empty())
    {
        warn!(
            "circuit '{}' requests a {mode}; its measurements are not executed",
            circuit.name()
        );
    }

    let repeated = scan.repeated.first().map(|&(readout, _, mapping)| {
        let measured = match mapping {
            Some(mapping) => mapping.iter().map(|(q, o)| (*q, *o)).collect(),
            None if scan.measures.iter().any(|(r, _)| *r == readout) => vec![],
            None => {
                let width = catalog.get(readout).map_or(0, |d| d.width);
                (0..width).map(|i| (QubitId(i), i)).collect()
            }
        };
        RepeatedReadout {
            readout: readout.to_string(),
            measured,
        }
    });

    let implicit_max = repeated
        .as_ref()
        .and_then(|r| r.measured.iter().map(|(q, _)| q.0).max());
    let qubit_count = scan.max_qubit.max(implicit_max).map_or(0, |q| q + 1);

    let shots = resolve_shots(&scan, default_shots);

    debug!(
        "classified as {mode}: {qubit_count} qubits, {} registers, {shots} shots",
        catalog.len()
    );

    Ok(Classification {
        mode,
        catalog,
        qubit_count,
        shots,
        repeated,
        extraction,
    })
}

fn scan(circuit: &Circuit) -> RunnerResult<Scan<'_>> {
    let mut scan = Scan::default();
    for inst in circuit {
        inst.validate()?;
        if let Some(max) = inst.qubits.iter().map(|q| q.0).max() {
            scan.max_qubit = scan.max_qubit.max(Some(max));
        }
        match &inst.kind {
            InstructionKind::RepeatedMeasurement {
                readout,
                shots,
                qubit_mapping,
            } => scan
                .repeated
                .push((readout.as_str(), *shots, qubit_mapping.as_ref())),
            InstructionKind::MeasureQubit { readout, offset } => {
                scan.measures.push((readout.as_str(), *offset));
            }
            InstructionKind::GetStateVector { readout } => scan.state_vectors.push(Extraction {
                readout: readout.clone(),
                qubits: inst.qubits.clone(),
            }),
            InstructionKind::GetDensityMatrix { readout } => {
                scan.density_matrices.push(Extraction {
                    readout: readout.clone(),
                    qubits: inst.qubits.clone(),
                });
            }
            InstructionKind::SetShotCount { shots, readout } => {
                scan.shot_overrides.push((readout.as_str(), *shots));
            }
            InstructionKind::Gate(_)
            | InstructionKind::Declare(_)
            | InstructionKind::Reset
            | InstructionKind::Barrier => {}
        }
    }
    Ok(scan)
}

fn check_references(scan: &Scan<'_>, catalog: &RegisterCatalog) -> RunnerResult<()> {
    for &(readout, offset) in &scan.measures {
        let decl = catalog.require(readout, RegisterKind::Bit)?;
        check_offset(readout, offset, decl.width)?;
    }
    for &(readout, _, mapping) in &scan.repeated {
        let decl = catalog.require(readout, RegisterKind::Bit)?;
        for &offset in mapping.into_iter().flat_map(BTreeMap::values) {
            check_offset(readout, offset, decl.width)?;
        }
    }
    for &(readout, _) in &scan.shot_overrides {
        catalog.require(readout, RegisterKind::Bit)?;
    }
    for extraction in scan.state_vectors.iter().chain(&scan.density_matrices) {
        catalog.require(&extraction.readout, RegisterKind::Complex)?;
    }
    Ok(())
}

fn check_offset(readout: &str, offset: u32, width: u32) -> RunnerResult<()> {
    if offset >= width {
        return Err(RunnerError::DimensionMismatch {
            register: readout.to_string(),
            expected: width as usize,
            got: offset as usize + 1,
        });
    }
    Ok(())
}

fn resolve_shots(scan: &Scan<'_>, default_shots: u32) -> u32 {
    if let Some(&(readout, shots, _)) = scan.repeated.first() {
        if !scan.shot_overrides.is_empty() {
            warn!("shot count override ignored next to repeated measurement into '{readout}'");
        }
        return shots;
    }
    match scan.shot_overrides.as_slice() {
        [] => default_shots,
        [(_, shots)] => *shots,
        [.., (readout, shots)] => {
            warn!("several shot count overrides; using {shots} from '{readout}'");
            *shots
        }
    }
}
