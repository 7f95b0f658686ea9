//! Classical register catalog.
//!
//! The catalog records every register declared in a circuit, in the order
//! it was first declared. That order fixes the layout of the flat
//! classical bit space: bit register `k` occupies the flat indices right
//! after the bit registers declared before it.

use rustc_hash::FxHashMap;

use qexec_ir::{Circuit, InstructionKind, RegisterDeclaration, RegisterKind};

use crate::error::{RunnerError, RunnerResult};

/// Declared classical registers, in first-declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegisterCatalog {
    entries: Vec<RegisterDeclaration>,
    index: FxHashMap<String, usize>,
}

impl RegisterCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every declaration of a circuit.
    pub fn from_circuit(circuit: &Circuit) -> RunnerResult<Self> {
        let mut catalog = Self::new();
        for inst in circuit {
            if let InstructionKind::Declare(decl) = &inst.kind {
                catalog.declare(decl.clone())?;
            }
        }
        Ok(catalog)
    }

    /// Record a declaration.
    ///
    /// Re-declaring a name with the same width, kind and output flag is a
    /// no-op; anything else is a [`RunnerError::ConflictingDeclaration`].
    pub fn declare(&mut self, declaration: RegisterDeclaration) -> RunnerResult<()> {
        if let Some(&i) = self.index.get(&declaration.name) {
            let previous = &self.entries[i];
            if *previous == declaration {
                return Ok(());
            }
            return Err(RunnerError::ConflictingDeclaration {
                name: declaration.name.clone(),
                previous: describe(previous),
                new: describe(&declaration),
            });
        }
        self.index
            .insert(declaration.name.clone(), self.entries.len());
        self.entries.push(declaration);
        Ok(())
    }

    /// Look up a register.
    pub fn get(&self, name: &str) -> Option<&RegisterDeclaration> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    /// Look up a register that must exist with the given kind.
    pub fn require(&self, name: &str, kind: RegisterKind) -> RunnerResult<&RegisterDeclaration> {
        match self.get(name) {
            Some(decl) if decl.kind == kind => Ok(decl),
            Some(decl) => Err(RunnerError::unknown_register(
                name,
                format!("declared as {} but used as a {kind} register", decl.kind),
            )),
            None => Err(RunnerError::unknown_register(
                name,
                format!("no {kind} register with this name was declared"),
            )),
        }
    }

    /// Check whether a register is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterate over declarations in first-declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, RegisterDeclaration> {
        self.entries.iter()
    }

    /// Bit registers in first-declaration order.
    pub fn bit_registers(&self) -> impl Iterator<Item = &RegisterDeclaration> {
        self.entries.iter().filter(|d| d.kind == RegisterKind::Bit)
    }

    /// Registers returned to the caller.
    pub fn outputs(&self) -> impl Iterator<Item = &RegisterDeclaration> {
        self.entries.iter().filter(|d| d.is_output)
    }

    /// Sum of all bit register widths.
    pub fn total_bit_width(&self) -> u32 {
        self.bit_registers().map(|d| d.width).sum()
    }

    /// Flat classical bit index of the first element of a bit register.
    pub fn clbit_start(&self, name: &str) -> Option<u32> {
        let mut start = 0;
        for decl in self.bit_registers() {
            if decl.name == name {
                return Some(start);
            }
            start += decl.width;
        }
        None
    }

    /// Number of declared registers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no register has been declared.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn describe(decl: &RegisterDeclaration) -> String {
    let visibility = if decl.is_output { "output" } else { "internal" };
    format!("{decl} ({visibility})")
}

impl<'a> IntoIterator for &'a RegisterCatalog {
    type Item = &'a RegisterDeclaration;
    type IntoIter = std::slice::Iter<'a, RegisterDeclaration>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
