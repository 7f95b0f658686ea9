//! Property-based tests for shot decoding.
//!
//! Tests that separators in raw outcomes never change the decoded bits, and
//! that histogram and per-shot output decode to the same multiset of shots.

use proptest::prelude::*;

use qexec_hal::{Counts, RawOutput};
use qexec_ir::RegisterDeclaration;
use qexec_runner::{
    Classification, ExecutionResult, MeasurementMode, RegisterCatalog, ResultDecoder,
    canonicalize, decode_shot,
};

/// Register widths for one to three bit registers.
fn arb_widths() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(1_u32..=4, 1..=3)
}

fn catalog(widths: &[u32]) -> RegisterCatalog {
    let mut catalog = RegisterCatalog::new();
    for (i, &width) in widths.iter().enumerate() {
        catalog
            .declare(RegisterDeclaration::bit(format!("r{i}"), width, true))
            .unwrap();
    }
    catalog
}

/// Widths plus a list of shots, each a flat bit vector of the total width.
fn arb_shots() -> impl Strategy<Value = (Vec<u32>, Vec<Vec<bool>>)> {
    arb_widths().prop_flat_map(|widths| {
        let total: u32 = widths.iter().sum();
        (
            Just(widths),
            prop::collection::vec(prop::collection::vec(any::<bool>(), total as usize), 1..=20),
        )
    })
}

fn render(bits: &[bool]) -> String {
    bits.iter().map(|&b| if b { '1' } else { '0' }).collect()
}

/// Render a flat shot with a space between register groups.
fn render_grouped(widths: &[u32], bits: &[bool]) -> String {
    let mut groups = Vec::new();
    let mut start = 0;
    for &w in widths {
        let end = start + w as usize;
        groups.push(render(&bits[start..end]));
        start = end;
    }
    groups.join(" ")
}

fn sampling(widths: &[u32]) -> Classification {
    Classification {
        mode: MeasurementMode::Sampling,
        catalog: catalog(widths),
        qubit_count: widths.iter().sum(),
        shots: 1,
        repeated: None,
        extraction: None,
    }
}

/// Per-shot tuples `(r0[i], r1[i], ...)`, sorted.
fn sorted_shots(
    result: &ExecutionResult,
    registers: usize,
    shots: usize,
) -> Vec<Vec<Vec<bool>>> {
    let columns: Vec<&[Vec<bool>]> = (0..registers)
        .map(|i| result.bits(&format!("r{i}")).unwrap())
        .collect();
    let mut rows: Vec<Vec<Vec<bool>>> = (0..shots)
        .map(|shot| columns.iter().map(|c| c[shot].clone()).collect())
        .collect();
    rows.sort();
    rows
}

proptest! {
    #[test]
    fn separators_do_not_change_decoding((widths, shots) in arb_shots()) {
        let catalog = catalog(&widths);
        for bits in &shots {
            let packed = render(bits);
            let grouped = render_grouped(&widths, bits);
            let padded = format!("  {}\t", grouped.replace(' ', "  "));

            prop_assert_eq!(canonicalize(&padded).into_owned(), packed.clone());
            let expected = decode_shot(&packed, &catalog).unwrap();
            prop_assert_eq!(&decode_shot(&grouped, &catalog).unwrap(), &expected);
            prop_assert_eq!(&decode_shot(&padded, &catalog).unwrap(), &expected);
        }
    }

    #[test]
    fn register_slices_are_reversed((widths, shots) in arb_shots()) {
        let catalog = catalog(&widths);
        for bits in &shots {
            let decoded = decode_shot(&render(bits), &catalog).unwrap();
            prop_assert_eq!(decoded.len(), widths.len());

            let mut start = 0;
            for (register, &w) in decoded.iter().zip(&widths) {
                let slice = &bits[start..start + w as usize];
                // Offset 0 is the rightmost character of the group.
                prop_assert_eq!(register.first(), slice.last());
                prop_assert_eq!(register.len(), w as usize);
                start += w as usize;
            }
        }
    }

    #[test]
    fn counts_and_memory_agree((widths, shots) in arb_shots()) {
        let classification = sampling(&widths);
        let memory: Vec<String> = shots.iter().map(|b| render_grouped(&widths, b)).collect();
        let counts: Counts = memory.iter().map(|s| (s.clone(), 1)).collect();

        let from_memory = ResultDecoder
            .decode(RawOutput::Memory(memory), &classification)
            .unwrap();
        let from_counts = ResultDecoder
            .decode(RawOutput::Counts(counts), &classification)
            .unwrap();

        for i in 0..widths.len() {
            prop_assert_eq!(from_memory.bits(&format!("r{i}")).unwrap().len(), shots.len());
            prop_assert_eq!(from_counts.bits(&format!("r{i}")).unwrap().len(), shots.len());
        }
        // Whole shots across registers, not each column on its own.
        prop_assert_eq!(
            sorted_shots(&from_memory, widths.len(), shots.len()),
            sorted_shots(&from_counts, widths.len(), shots.len())
        );
    }
}
