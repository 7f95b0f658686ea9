//! Raw output decoding.
//!
//! Sampled outcomes are first canonicalised (all whitespace removed) and
//! then split across the bit registers in declaration order. Inside a
//! register slice the rightmost character is offset 0, so `"01 1"` against
//! registers `ro[1]`, `ri[2]` gives `ro = [false]`, `ri = [true, true]`.

use std::borrow::Cow;

use num_complex::Complex64;
use tracing::{debug, instrument};

use qexec_hal::RawOutput;

use crate::catalog::RegisterCatalog;
use crate::classify::{Classification, MeasurementMode};
use crate::error::{RunnerError, RunnerResult};
use crate::result::ExecutionResult;

/// Remove every whitespace character from a raw shot string.
pub fn canonicalize(shot: &str) -> Cow<'_, str> {
    if shot.chars().any(char::is_whitespace) {
        Cow::Owned(shot.chars().filter(|c| !c.is_whitespace()).collect())
    } else {
        Cow::Borrowed(shot)
    }
}

/// Turns raw backend output into named registers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultDecoder;

impl ResultDecoder {
    /// Decode `raw` for a classified circuit.
    #[instrument(skip(self, raw, classification), fields(kind = raw.kind()))]
    pub fn decode(
        &self,
        raw: RawOutput,
        classification: &Classification,
    ) -> RunnerResult<ExecutionResult> {
        let catalog = &classification.catalog;
        let mut result = ExecutionResult::with_outputs(catalog);

        match (classification.mode, raw) {
            (MeasurementMode::Sampling, RawOutput::Counts(counts)) => {
                // Expand in outcome order so repeated decodes agree.
                for (outcome, &count) in counts.sorted_by_outcome() {
                    let shot = decode_shot(outcome, catalog)?;
                    for _ in 0..count {
                        push_shot(&mut result, catalog, &shot);
                    }
                }
            }
            (MeasurementMode::Sampling, RawOutput::Memory(memory)) => {
                for outcome in &memory {
                    let shot = decode_shot(outcome, catalog)?;
                    push_shot(&mut result, catalog, &shot);
                }
            }
            (MeasurementMode::StateVector, RawOutput::Dense(amplitudes)) => {
                let expected = 1usize << classification.qubit_count;
                store_dense(&mut result, classification, amplitudes, expected)?;
            }
            (MeasurementMode::DensityMatrix, RawOutput::Dense(entries)) => {
                let k = match &classification.extraction {
                    Some(e) if !e.qubits.is_empty() => e.qubits.len(),
                    _ => classification.qubit_count as usize,
                };
                let dim = 1usize << k;
                store_dense(&mut result, classification, entries, dim * dim)?;
            }
            (mode, raw) => {
                return Err(RunnerError::BackendExecution(qexec_hal::HalError::Backend(
                    format!("backend returned {} output for a {mode} run", raw.kind()),
                )));
            }
        }

        debug!(
            "decoded {} bit, {} complex registers",
            result.bit_registers.len(),
            result.complex_registers.len()
        );
        Ok(result)
    }
}

/// Split one raw outcome into per-register bit vectors, in declaration
/// order of the bit registers.
pub fn decode_shot(raw: &str, catalog: &RegisterCatalog) -> RunnerResult<Vec<Vec<bool>>> {
    let shot = canonicalize(raw);
    let total = catalog.total_bit_width() as usize;
    let malformed = |reason: String| RunnerError::MalformedShotString {
        shot: shot.to_string(),
        reason,
    };

    let bits = shot
        .chars()
        .map(|c| match c {
            '0' => Ok(false),
            '1' => Ok(true),
            other => Err(malformed(format!("non-binary character '{other}'"))),
        })
        .collect::<RunnerResult<Vec<bool>>>()?;
    if bits.len() != total {
        return Err(malformed(format!(
            "{} bits for registers totalling {total}",
            bits.len()
        )));
    }

    let mut registers = Vec::new();
    let mut start = 0;
    for decl in catalog.bit_registers() {
        let end = start + decl.width as usize;
        registers.push(bits[start..end].iter().rev().copied().collect());
        start = end;
    }
    Ok(registers)
}

fn push_shot(result: &mut ExecutionResult, catalog: &RegisterCatalog, shot: &[Vec<bool>]) {
    for (decl, bits) in catalog.bit_registers().zip(shot) {
        if decl.is_output {
            result
                .bit_registers
                .entry(decl.name.clone())
                .or_default()
                .push(bits.clone());
        }
    }
}

fn store_dense(
    result: &mut ExecutionResult,
    classification: &Classification,
    values: Vec<Complex64>,
    expected: usize,
) -> RunnerResult<()> {
    let readout = classification
        .extraction
        .as_ref()
        .map(|e| e.readout.as_str())
        .ok_or_else(|| RunnerError::unknown_register("", "state run without extraction register"))?;
    if values.len() != expected {
        return Err(RunnerError::DimensionMismatch {
            register: readout.to_string(),
            expected,
            got: values.len(),
        });
    }
    if classification
        .catalog
        .get(readout)
        .is_some_and(|d| d.is_output)
    {
        result
            .complex_registers
            .entry(readout.to_string())
            .or_default()
            .push(values);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Extraction;
    use qexec_hal::Counts;
    use qexec_ir::{QubitId, RegisterDeclaration};

    fn ro_ri_catalog() -> RegisterCatalog {
        let mut catalog = RegisterCatalog::new();
        catalog.declare(RegisterDeclaration::bit("ro", 1, true)).unwrap();
        catalog.declare(RegisterDeclaration::bit("ri", 2, true)).unwrap();
        catalog
    }

    fn sampling(catalog: RegisterCatalog) -> Classification {
        Classification {
            mode: MeasurementMode::Sampling,
            catalog,
            qubit_count: 3,
            shots: 1,
            repeated: None,
            extraction: None,
        }
    }

    fn extraction(mode: MeasurementMode, qubit_count: u32, qubits: Vec<QubitId>) -> Classification {
        let mut catalog = RegisterCatalog::new();
        catalog.declare(RegisterDeclaration::complex("out", 1, true)).unwrap();
        Classification {
            mode,
            catalog,
            qubit_count,
            shots: 1,
            repeated: None,
            extraction: Some(Extraction {
                readout: "out".into(),
                qubits,
            }),
        }
    }

    #[test]
    fn test_canonicalize() {
        assert_eq!(canonicalize("01 1"), "011");
        assert_eq!(canonicalize(" 0\t1\n"), "01");
        assert!(matches!(canonicalize("011"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_separator_is_optional() {
        let catalog = ro_ri_catalog();
        let spaced = decode_shot("01 1", &catalog).unwrap();
        let packed = decode_shot("011", &catalog).unwrap();

        assert_eq!(spaced, packed);
        assert_eq!(spaced, vec![vec![false], vec![true, true]]);
    }

    #[test]
    fn test_rightmost_character_is_offset_zero() {
        let catalog = ro_ri_catalog();
        let shot = decode_shot("1 10", &catalog).unwrap();
        assert_eq!(shot, vec![vec![true], vec![false, true]]);
    }

    #[test]
    fn test_malformed_shots() {
        let catalog = ro_ri_catalog();
        assert!(matches!(
            decode_shot("01", &catalog),
            Err(RunnerError::MalformedShotString { .. })
        ));
        assert!(matches!(
            decode_shot("0x1", &catalog),
            Err(RunnerError::MalformedShotString { .. })
        ));
    }

    #[test]
    fn test_counts_expand_into_shots() {
        let classification = sampling(ro_ri_catalog());
        let counts = Counts::from_pairs([("1 10", 2), ("0 00", 1)]);
        let result = ResultDecoder
            .decode(RawOutput::Counts(counts), &classification)
            .unwrap();

        let ro = result.bits("ro").unwrap();
        assert_eq!(ro, &[vec![false], vec![true], vec![true]]);
        assert_eq!(result.bits("ri").unwrap().len(), 3);
    }

    #[test]
    fn test_non_output_register_consumed_but_hidden() {
        let mut catalog = RegisterCatalog::new();
        catalog.declare(RegisterDeclaration::bit("hidden", 2, false)).unwrap();
        catalog.declare(RegisterDeclaration::bit("ro", 1, true)).unwrap();
        let result = ResultDecoder
            .decode(RawOutput::Memory(vec!["10 1".into()]), &sampling(catalog))
            .unwrap();

        assert!(result.bits("hidden").is_none());
        assert_eq!(result.bits("ro").unwrap(), &[vec![true]]);
    }

    #[test]
    fn test_state_vector_length_checked() {
        let classification = extraction(MeasurementMode::StateVector, 2, vec![]);
        let ok = ResultDecoder
            .decode(RawOutput::Dense(vec![Complex64::new(0.5, 0.0); 4]), &classification)
            .unwrap();
        assert_eq!(ok.complex("out").unwrap()[0].len(), 4);

        let err = ResultDecoder
            .decode(RawOutput::Dense(vec![Complex64::new(0.5, 0.0); 3]), &classification)
            .unwrap_err();
        assert!(matches!(
            err,
            RunnerError::DimensionMismatch {
                expected: 4,
                got: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_density_matrix_subset_length() {
        let classification = extraction(MeasurementMode::DensityMatrix, 3, vec![QubitId(2)]);
        let result = ResultDecoder
            .decode(RawOutput::Dense(vec![Complex64::new(0.0, 0.0); 4]), &classification)
            .unwrap();
        assert_eq!(result.complex("out").unwrap().len(), 1);

        let full = extraction(MeasurementMode::DensityMatrix, 3, vec![]);
        assert!(matches!(
            ResultDecoder.decode(RawOutput::Dense(vec![Complex64::new(0.0, 0.0); 4]), &full),
            Err(RunnerError::DimensionMismatch { expected: 64, .. })
        ));
    }

    #[test]
    fn test_output_kind_mismatch() {
        let classification = sampling(ro_ri_catalog());
        let err = ResultDecoder
            .decode(RawOutput::Dense(vec![]), &classification)
            .unwrap_err();
        assert!(matches!(err, RunnerError::BackendExecution(_)));
    }
}
