//! Decoded execution results.

use num_complex::Complex64;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use qexec_ir::RegisterKind;

use crate::catalog::RegisterCatalog;

/// Bit registers: one `Vec<bool>` per shot.
pub type BitRegisters = FxHashMap<String, Vec<Vec<bool>>>;
/// Float registers: one `Vec<f64>` per entry.
pub type FloatRegisters = FxHashMap<String, Vec<Vec<f64>>>;
/// Complex registers: one `Vec<Complex64>` per extraction.
pub type ComplexRegisters = FxHashMap<String, Vec<Vec<Complex64>>>;

/// Named, typed output of one or more circuit runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Bit registers keyed by name.
    pub bit_registers: BitRegisters,
    /// Float registers keyed by name.
    pub float_registers: FloatRegisters,
    /// Complex registers keyed by name.
    pub complex_registers: ComplexRegisters,
}

impl ExecutionResult {
    /// Create an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a result holding an empty entry for every output register.
    pub fn with_outputs(catalog: &RegisterCatalog) -> Self {
        let mut result = Self::new();
        for decl in catalog.outputs() {
            let name = decl.name.clone();
            match decl.kind {
                RegisterKind::Bit => {
                    result.bit_registers.entry(name).or_default();
                }
                RegisterKind::Float => {
                    result.float_registers.entry(name).or_default();
                }
                RegisterKind::Complex => {
                    result.complex_registers.entry(name).or_default();
                }
            }
        }
        result
    }

    /// Shots recorded in a bit register.
    pub fn bits(&self, name: &str) -> Option<&[Vec<bool>]> {
        self.bit_registers.get(name).map(Vec::as_slice)
    }

    /// Entries recorded in a complex register.
    pub fn complex(&self, name: &str) -> Option<&[Vec<Complex64>]> {
        self.complex_registers.get(name).map(Vec::as_slice)
    }

    /// Append every register of `other` to this result.
    ///
    /// Entries of registers present in both are concatenated in order, so
    /// merging two runs into the same register keeps all of their shots.
    pub fn merge(&mut self, other: ExecutionResult) {
        for (name, shots) in other.bit_registers {
            self.bit_registers.entry(name).or_default().extend(shots);
        }
        for (name, values) in other.float_registers {
            self.float_registers.entry(name).or_default().extend(values);
        }
        for (name, values) in other.complex_registers {
            self.complex_registers.entry(name).or_default().extend(values);
        }
    }

    /// Check if no register is present.
    pub fn is_empty(&self) -> bool {
        self.bit_registers.is_empty()
            && self.float_registers.is_empty()
            && self.complex_registers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qexec_ir::RegisterDeclaration;

    #[test]
    fn test_with_outputs_skips_internal_registers() {
        let mut catalog = RegisterCatalog::new();
        catalog.declare(RegisterDeclaration::bit("ro", 1, true)).unwrap();
        catalog.declare(RegisterDeclaration::bit("scratch", 1, false)).unwrap();
        catalog.declare(RegisterDeclaration::float("f", 2, true)).unwrap();
        catalog.declare(RegisterDeclaration::complex("sv", 4, true)).unwrap();

        let result = ExecutionResult::with_outputs(&catalog);
        assert_eq!(result.bits("ro"), Some(&[][..]));
        assert!(result.bits("scratch").is_none());
        assert!(result.float_registers["f"].is_empty());
        assert!(result.complex("sv").unwrap().is_empty());
    }

    #[test]
    fn test_merge_appends_shots() {
        let mut a = ExecutionResult::new();
        a.bit_registers
            .insert("ro".into(), vec![vec![true], vec![false]]);
        let mut b = ExecutionResult::new();
        b.bit_registers.insert("ro".into(), vec![vec![true]]);
        b.bit_registers.insert("ri".into(), vec![vec![false, true]]);

        a.merge(b);
        assert_eq!(a.bits("ro").unwrap().len(), 3);
        assert_eq!(a.bits("ri").unwrap(), &[vec![false, true]]);
    }
}
