//! Classical register declarations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Element type stored in a classical register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegisterKind {
    /// One boolean per element (measurement readout).
    Bit,
    /// One real number per element.
    Float,
    /// One complex number per element (state extraction).
    Complex,
}

impl fmt::Display for RegisterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterKind::Bit => write!(f, "bit"),
            RegisterKind::Float => write!(f, "float"),
            RegisterKind::Complex => write!(f, "complex"),
        }
    }
}

/// Declaration of a named classical register.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegisterDeclaration {
    /// Register name.
    pub name: String,
    /// Number of elements.
    pub width: u32,
    /// Element type.
    pub kind: RegisterKind,
    /// Whether the register is returned to the caller.
    pub is_output: bool,
}

impl RegisterDeclaration {
    /// Create a new register declaration.
    pub fn new(name: impl Into<String>, width: u32, kind: RegisterKind, is_output: bool) -> Self {
        Self {
            name: name.into(),
            width,
            kind,
            is_output,
        }
    }

    /// Declare a bit register.
    pub fn bit(name: impl Into<String>, width: u32, is_output: bool) -> Self {
        Self::new(name, width, RegisterKind::Bit, is_output)
    }

    /// Declare a float register.
    pub fn float(name: impl Into<String>, width: u32, is_output: bool) -> Self {
        Self::new(name, width, RegisterKind::Float, is_output)
    }

    /// Declare a complex register.
    pub fn complex(name: impl Into<String>, width: u32, is_output: bool) -> Self {
        Self::new(name, width, RegisterKind::Complex, is_output)
    }
}

impl fmt::Display for RegisterDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}] {}", self.kind, self.width, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_display() {
        assert_eq!(RegisterDeclaration::bit("ro", 3, true).to_string(), "bit[3] ro");
        assert_eq!(
            RegisterDeclaration::complex("psi", 2, false).to_string(),
            "complex[2] psi"
        );
    }

    #[test]
    fn test_register_equality() {
        let a = RegisterDeclaration::bit("ro", 2, true);
        let b = RegisterDeclaration::new("ro", 2, RegisterKind::Bit, true);
        assert_eq!(a, b);
        assert_ne!(a, RegisterDeclaration::float("ro", 2, true));
    }
}
