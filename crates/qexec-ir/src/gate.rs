//! Gate vocabulary of a circuit.
//!
//! [`StandardGate`] is closed: a backend either applies a gate directly or
//! the runner rewrites it into gates the backend does apply. Every angle is
//! already bound to a number of radians.

use serde::{Deserialize, Serialize};

/// A gate the runner knows how to execute or rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StandardGate {
    /// Bit flip.
    X,
    /// Bit and phase flip.
    Y,
    /// Phase flip.
    Z,
    /// Hadamard.
    H,
    /// Quarter turn about Z.
    S,
    /// Eighth turn about Z.
    T,
    /// Inverse of [`StandardGate::T`].
    Tdg,
    /// Square root of X.
    SX,
    /// `exp(-i θ X / 2)`.
    Rx(f64),
    /// `exp(-i θ Y / 2)`.
    Ry(f64),
    /// `exp(-i θ Z / 2)`.
    Rz(f64),
    /// `diag(1, e^{iλ})`.
    P(f64),
    /// Arbitrary single-qubit rotation, angles `(θ, φ, λ)`.
    U(f64, f64, f64),

    /// Controlled X; operands are `[control, target]`.
    CX,
    /// Controlled Z.
    CZ,
    /// Exchange of two qubits.
    Swap,
    /// `exp(-i θ Z⊗Z / 2)`.
    RZZ(f64),

    /// Doubly controlled X; operands are `[control, control, target]`.
    CCX,
}

impl StandardGate {
    /// Lower-case name, as listed in a backend's gate set.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
            Self::H => "h",
            Self::S => "s",
            Self::T => "t",
            Self::Tdg => "tdg",
            Self::SX => "sx",
            Self::Rx(_) => "rx",
            Self::Ry(_) => "ry",
            Self::Rz(_) => "rz",
            Self::P(_) => "p",
            Self::U(..) => "u",
            Self::CX => "cx",
            Self::CZ => "cz",
            Self::Swap => "swap",
            Self::RZZ(_) => "rzz",
            Self::CCX => "ccx",
        }
    }

    /// How many operands the gate takes.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            Self::CX | Self::CZ | Self::Swap | Self::RZZ(_) => 2,
            Self::CCX => 3,
            _ => 1,
        }
    }

    /// Bound angles, in the order they appear in the variant.
    pub fn parameters(&self) -> Vec<f64> {
        match *self {
            Self::Rx(a) | Self::Ry(a) | Self::Rz(a) | Self::P(a) | Self::RZZ(a) => vec![a],
            Self::U(theta, phi, lambda) => vec![theta, phi, lambda],
            _ => vec![],
        }
    }

    /// Whether the gate carries any angle.
    pub fn is_parametrized(&self) -> bool {
        !self.parameters().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_arity() {
        assert_eq!(StandardGate::H.num_qubits(), 1);
        assert_eq!(StandardGate::U(0.1, 0.2, 0.3).num_qubits(), 1);
        assert_eq!(StandardGate::CX.num_qubits(), 2);
        assert_eq!(StandardGate::RZZ(0.3).num_qubits(), 2);
        assert_eq!(StandardGate::CCX.num_qubits(), 3);
    }

    #[test]
    fn test_parameters() {
        assert!(!StandardGate::Swap.is_parametrized());
        assert_eq!(StandardGate::Rx(PI).parameters(), vec![PI]);
        assert_eq!(
            StandardGate::U(0.1, 0.2, 0.3).parameters(),
            vec![0.1, 0.2, 0.3]
        );
    }

    #[test]
    fn test_names_match_gate_set_entries() {
        assert_eq!(StandardGate::Tdg.name(), "tdg");
        assert_eq!(StandardGate::RZZ(1.0).name(), "rzz");
        assert_eq!(StandardGate::CCX.name(), "ccx");
    }
}
